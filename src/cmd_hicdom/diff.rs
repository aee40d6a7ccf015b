use clap::*;
use hicdom::libs::domain::GenomeWideCaller;
use std::path::Path;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("diff")
        .about("Calls contact domains of two datasets")
        .after_help(
            r###"
Runs `hicdom arrowhead` on <first> and on <second> with the same settings.
Results go to <outdir>/file1_<resolution>_* and <outdir>/file2_<resolution>_*.

Examples:
1. Compare two cell lines at 10 kb:
   hicdom diff gm12878.txt.gz k562.txt.gz out 10000

"###,
        )
        .arg(
            Arg::new("first")
                .required(true)
                .index(1)
                .help("Contact records of the first dataset"),
        )
        .arg(
            Arg::new("second")
                .required(true)
                .index(2)
                .help("Contact records of the second dataset"),
        )
        .arg(
            Arg::new("outdir")
                .required(true)
                .index(3)
                .help("Output directory"),
        )
        .arg(
            Arg::new("resolution")
                .required(true)
                .index(4)
                .value_parser(value_parser!(u32).range(1..))
                .help("Bin size in bp"),
        );

    super::calling_args(cmd)
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let outdir = args.get_one::<String>("outdir").unwrap();
    let resolution = *args.get_one::<u32>("resolution").unwrap();

    let mut jobs = vec![];
    for (key, name) in [("first", "file1"), ("second", "file2")] {
        let outprefix = Path::new(outdir).join(name).to_string_lossy().to_string();
        let config = super::run_config(args, &outprefix, resolution)?;
        let infiles = args.get_one::<String>(key).unwrap();
        let (dataset, catalog) = super::load_dataset(args, infiles)?;
        jobs.push((infiles, dataset, catalog, config));
    }

    // both runs must be valid before anything is written
    let callers = jobs
        .iter()
        .map(|(infiles, dataset, catalog, config)| {
            let caller = GenomeWideCaller::new(dataset, catalog, config.clone());
            caller.chromosomes().map(|_| (*infiles, caller))
        })
        .collect::<Result<Vec<_>, _>>()?;

    std::fs::create_dir_all(outdir)?;
    for (infiles, caller) in callers {
        log::info!("{} -> {}", infiles, caller.config().outprefix);
        caller.run()?;
    }

    Ok(())
}
