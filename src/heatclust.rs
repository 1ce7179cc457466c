extern crate clap;
use clap::*;

mod cmd_heatclust;

fn main() -> anyhow::Result<()> {
    let app = Command::new("heatclust")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`heatclust` - Hierarchical clustering for expression heatmaps")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log more; repeat for debug output. RUST_LOG takes precedence"),
        )
        .subcommand(cmd_heatclust::cluster::make_subcommand())
        .subcommand(cmd_heatclust::scale::make_subcommand())
        .subcommand(cmd_heatclust::dist::make_subcommand())
        .subcommand(cmd_heatclust::serve::make_subcommand())
        .after_help(
            r###"Subcommand groups:

* Pipeline:
    * cluster - Scale, cluster and reorder a matrix
    * serve   - JSON-lines worker, one request in flight

* Steps:
    * scale - Rescale a matrix
    * dist  - Pairwise distances between rows or columns

"###,
        );

    let matches = app.get_matches();

    let level = match matches.get_count("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    // Check which subcomamnd the user ran...
    match matches.subcommand() {
        Some(("cluster", sub_matches)) => cmd_heatclust::cluster::execute(sub_matches),
        Some(("scale", sub_matches)) => cmd_heatclust::scale::execute(sub_matches),
        Some(("dist", sub_matches)) => cmd_heatclust::dist::execute(sub_matches),
        Some(("serve", sub_matches)) => cmd_heatclust::serve::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
