use clap::*;
use heatclust::libs::axis::{Axis, ClusterConfig};
use heatclust::libs::dendro::LeafOrder;

pub mod cluster;
pub mod dist;
pub mod scale;
pub mod serve;

pub fn arg_infile() -> Arg {
    Arg::new("infile")
        .required(true)
        .num_args(1)
        .index(1)
        .help("Input TSV matrix. [stdin] for standard input")
}

pub fn arg_outfile() -> Arg {
    Arg::new("outfile")
        .short('o')
        .long("outfile")
        .num_args(1)
        .default_value("stdout")
        .help("Output filename. [stdout] for screen")
}

pub fn arg_axis(default: &'static str) -> Arg {
    Arg::new("axis")
        .long("axis")
        .short('a')
        .num_args(1)
        .value_parser(["row", "column", "col", "both", "none"])
        .default_value(default)
        .help("Which axis to cluster")
}

pub fn arg_linkage() -> Arg {
    Arg::new("linkage")
        .long("linkage")
        .short('l')
        .num_args(1)
        .value_parser(["average", "ward", "single", "complete"])
        .default_value("average")
        .help("Linkage rule")
}

pub fn arg_distance() -> Arg {
    Arg::new("distance")
        .long("distance")
        .short('d')
        .num_args(1)
        .value_parser(["euclidean", "chebyshev", "manhattan"])
        .default_value("euclidean")
        .help("Distance metric")
}

pub fn arg_scale() -> Arg {
    Arg::new("scale")
        .long("scale")
        .short('s')
        .num_args(1)
        .value_parser(["none", "row", "col", "zscore", "zscore_col", "log2"])
        .default_value("none")
        .help("Scaling applied before clustering")
}

pub fn arg_parallel() -> Arg {
    Arg::new("parallel")
        .long("parallel")
        .short('p')
        .num_args(1)
        .default_value("1")
        .value_parser(value_parser!(usize))
        .help("Number of threads for parallel processing")
}

/// Collect the clustering options shared by subcommands.
pub fn cluster_config(args: &ArgMatches) -> anyhow::Result<ClusterConfig> {
    let mut config = ClusterConfig::default();
    if let Some(axis) = args.try_get_one::<String>("axis").ok().flatten() {
        config.axis = axis.parse::<Axis>()?;
    }
    if let Some(linkage) = args.try_get_one::<String>("linkage").ok().flatten() {
        config.linkage = linkage.parse()?;
    }
    if let Some(distance) = args.try_get_one::<String>("distance").ok().flatten() {
        config.distance = distance.parse()?;
    }
    if let Some(scale) = args.try_get_one::<String>("scale").ok().flatten() {
        config.scaling = scale.parse()?;
    }
    if args.try_get_one::<bool>("ladderize").ok().flatten() == Some(&true) {
        config.leaf_order = LeafOrder::Ladderize;
    }
    Ok(config)
}

/// Size the global rayon pool.
pub fn init_threads(args: &ArgMatches) -> anyhow::Result<()> {
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;
    Ok(())
}

/// Format a value the way matrices are written: `NA` for missing cells.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        format!("{}", v)
    }
}
