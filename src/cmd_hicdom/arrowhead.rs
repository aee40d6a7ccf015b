use clap::*;
use hicdom::libs::domain::GenomeWideCaller;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("arrowhead")
        .about("Calls contact domains")
        .after_help(
            r###"
Contact records are whitespace separated: `chrom1 pos1 chrom2 pos2 [count]`.
Several inputs joined with `+` are summed into one dataset.

Each chromosome is binned at <resolution>, cut into overlapping windows and
every window is scanned for the corners of domains. A shuffled copy of each
window, with every diagonal permuted, gives the control score.

Outputs, tab separated `chr1 x1 x2 chr2 y1 y2 ...`:
* <outprefix>_<resolution>_blocks          domains with score, control, u_var, l_var, u_sign, l_sign
* <outprefix>_<resolution>_list_scores     observed score of every candidate
* <outprefix>_<resolution>_control_scores  control score of every candidate

Notes:
* Supports both plain text and gzipped (.gz) files
* KR needs --norm-vectors, chromosomes without vectors are skipped

Examples:
1. Domains at 10 kb:
   hicdom arrowhead contacts.txt.gz out/gm12878 10000

2. Two replicates, VC normalized, chr1 and chrX only:
   hicdom arrowhead rep1.txt+rep2.txt out/merged 25000 -k VC -c 1,X

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .index(1)
                .help("Contact records, join several with `+`"),
        )
        .arg(
            Arg::new("outprefix")
                .required(true)
                .index(2)
                .help("Prefix of the output files"),
        )
        .arg(
            Arg::new("resolution")
                .required(true)
                .index(3)
                .value_parser(value_parser!(u32).range(1..))
                .help("Bin size in bp"),
        );

    super::calling_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infiles = args.get_one::<String>("infiles").unwrap();
    let outprefix = args.get_one::<String>("outprefix").unwrap();
    let resolution = *args.get_one::<u32>("resolution").unwrap();

    let config = super::run_config(args, outprefix, resolution)?;
    let (dataset, catalog) = super::load_dataset(args, infiles)?;

    let summary = GenomeWideCaller::new(&dataset, &catalog, config).run()?;
    if !summary.skipped.is_empty() {
        log::warn!("Skipped: {}", summary.skipped.join(","));
    }

    Ok(())
}
