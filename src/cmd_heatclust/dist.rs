use clap::*;
use heatclust::libs::distance::{DistanceMetric, PairwiseDistances};
use heatclust::libs::matrix::LabelledMatrix;
use heatclust::libs::scale::{self, Scaling};
use std::io::Write;

use super::format_value;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("dist")
        .about("Pairwise distances between rows or columns")
        .after_help(
            r###"
Writes a relaxed PHYLIP distance matrix: the number of entries on the first
line, then one line per row (or column) with its name and distances.

Distances touching a missing value are written as `NA`.

Examples:
1. Euclidean distances between genes:
   heatclust dist tests/heatmap/small.tsv

2. Chebyshev distances between samples after row scaling:
   heatclust dist tests/heatmap/small.tsv --axis column --distance chebyshev --scale row

"###,
        )
        .arg(super::arg_infile())
        .arg(
            Arg::new("axis")
                .long("axis")
                .short('a')
                .num_args(1)
                .value_parser(["row", "column", "col"])
                .default_value("row")
                .help("Compare rows or columns"),
        )
        .arg(super::arg_distance())
        .arg(super::arg_scale())
        .arg(super::arg_parallel())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let is_col = args.get_one::<String>("axis").unwrap() != "row";
    let metric = args
        .get_one::<String>("distance")
        .unwrap()
        .parse::<DistanceMetric>()?;
    let method = args.get_one::<String>("scale").unwrap().parse::<Scaling>()?;
    super::init_threads(args)?;

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());

    let input = LabelledMatrix::from_tsv(infile)?;
    let scaled = scale::scale(&input.matrix, method);
    let (names, vectors) = if is_col {
        (&input.col_names, scaled.column_vectors())
    } else {
        (&input.row_names, scaled.row_vectors())
    };
    let dist = PairwiseDistances::from_vectors(&vectors, &metric)?;

    writer.write_fmt(format_args!("{}\n", dist.size()))?;
    for (i, name) in names.iter().enumerate() {
        let fields: Vec<String> = (0..dist.size())
            .map(|j| format_value(dist.get(i, j)))
            .collect();
        writer.write_fmt(format_args!("{}\t{}\n", name, fields.join("\t")))?;
    }

    Ok(())
}
