//! Subcommand modules for the `hicdom` binary.

pub mod arrowhead;
pub mod diff;

use clap::*;
use hicdom::libs::domain::{DomainConfig, RunConfig};
use hicdom::libs::genome::ChromosomeCatalog;
use hicdom::libs::hic::{ContactDataset, NormalizationType};

/// Options shared by `arrowhead` and `diff`
pub fn calling_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("norm")
            .long("norm")
            .short('k')
            .num_args(1)
            .default_value("NONE")
            .value_parser(builder::PossibleValuesParser::new(["NONE", "VC", "VC_SQRT", "KR"]))
            .ignore_case(true)
            .help("Normalization applied to the matrices"),
    )
    .arg(
        Arg::new("chr")
            .long("chr")
            .short('c')
            .num_args(1)
            .value_delimiter(',')
            .help("Only these chromosomes, comma separated"),
    )
    .arg(
        Arg::new("matrix_size")
            .long("matrix-size")
            .short('m')
            .num_args(1)
            .value_parser(value_parser!(usize))
            .help("Processing window in bins [default: 2000]"),
    )
    .arg(
        Arg::new("genome")
            .long("genome")
            .short('g')
            .num_args(1)
            .help("chrom.sizes file, otherwise lengths come from the contacts"),
    )
    .arg(
        Arg::new("norm_vectors")
            .long("norm-vectors")
            .num_args(1)
            .help("Normalization vectors, lines of `norm chrom resolution bin factor`"),
    )
    .arg(
        Arg::new("sign")
            .long("sign")
            .num_args(1)
            .default_value("0.4")
            .value_parser(value_parser!(f64))
            .help("Minimum sign component of a candidate corner"),
    )
    .arg(
        Arg::new("max_var")
            .long("max-var")
            .num_args(1)
            .value_parser(value_parser!(f64))
            .help("Ignore corners with var(U) + var(L) above this"),
    )
    .arg(
        Arg::new("seed")
            .long("seed")
            .num_args(1)
            .default_value("42")
            .value_parser(value_parser!(u64))
            .help("Seed of the control shuffle"),
    )
    .arg(
        Arg::new("header")
            .long("header")
            .action(ArgAction::SetTrue)
            .help("Write a header line into the output files"),
    )
    .arg(
        Arg::new("parallel")
            .long("parallel")
            .short('p')
            .num_args(1)
            .default_value("1")
            .value_parser(value_parser!(usize))
            .help("Number of threads"),
    )
}

/// Run settings from the shared options
pub fn run_config(args: &ArgMatches, outprefix: &str, resolution: u32) -> anyhow::Result<RunConfig> {
    let norm: NormalizationType = args.get_one::<String>("norm").unwrap().parse()?;

    let domain = DomainConfig {
        sign_threshold: *args.get_one::<f64>("sign").unwrap(),
        max_variance: args.get_one::<f64>("max_var").copied(),
        seed: *args.get_one::<u64>("seed").unwrap(),
        ..DomainConfig::default()
    }
    .with_window(args.get_one::<usize>("matrix_size").copied());

    Ok(RunConfig {
        norm,
        chromosomes: args
            .get_many::<String>("chr")
            .map(|names| names.cloned().collect()),
        parallel: *args.get_one::<usize>("parallel").unwrap(),
        with_header: args.get_flag("header"),
        domain,
        ..RunConfig::new(outprefix, resolution)
    })
}

/// Contacts of `infiles`, `+`-joined, and the chromosomes they live on
pub fn load_dataset(args: &ArgMatches, infiles: &str) -> anyhow::Result<(ContactDataset, ChromosomeCatalog)> {
    let mut dataset = ContactDataset::load(infiles)?;
    if let Some(vectors) = args.get_one::<String>("norm_vectors") {
        dataset.load_vectors(vectors)?;
    }
    if dataset.inter_count() > 0 {
        log::info!("{} inter-chromosomal records ignored", dataset.inter_count());
    }

    let catalog = match args.get_one::<String>("genome") {
        Some(genome) => ChromosomeCatalog::load(genome)?,
        None => dataset.catalog(),
    };

    Ok((dataset, catalog))
}
