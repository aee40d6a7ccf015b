extern crate clap;
use clap::*;

mod cmd_hicdom;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let app = Command::new("hicdom")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`hicdom` - Contact domains of Hi-C maps")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_hicdom::arrowhead::make_subcommand())
        .subcommand(cmd_hicdom::diff::make_subcommand())
        .after_help(
            r###"Subcommands:

* arrowhead - Call contact domains of one dataset
* diff      - Call contact domains of two datasets side by side

Logging goes to stderr, set RUST_LOG=debug for per-window details.

"###,
        );

    // Check which subcommand the user ran...
    match app.get_matches().subcommand() {
        Some(("arrowhead", sub_matches)) => cmd_hicdom::arrowhead::execute(sub_matches),
        Some(("diff", sub_matches)) => cmd_hicdom::diff::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
