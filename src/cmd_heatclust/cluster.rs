use clap::*;
use heatclust::libs::axis;
use heatclust::libs::matrix::LabelledMatrix;
use heatclust::libs::worker::{ClusterResponse, Response};
use std::io::Write;

use super::format_value;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("cluster")
        .about("Scale, cluster and reorder a matrix")
        .after_help(
            r###"
Scales a gene-by-sample matrix, clusters its rows and/or columns, and writes
the resulting orders.

Notes:
* Input: TSV with sample names on the first line and a gene id in the first
  column. `NA`, `nan` and empty cells are missing values.
* Missing values propagate: a distance touching one is NaN, and NaN
  distances merge after every finite one.
* Axes that are not clustered keep their input order.
* Children are ordered by their smallest input index; `--ladderize` puts
  larger subtrees first instead.
* Output formats:
    * order  - two lines, `rows` and `cols`, with labels in display order
    * matrix - the scaled matrix, reordered, with labels
    * json   - a worker `result` message

Examples:
1. Cluster genes with average linkage:
   heatclust cluster tests/heatmap/small.tsv

2. Cluster both axes with Ward linkage on row-scaled values:
   heatclust cluster tests/heatmap/small.tsv --axis both --linkage ward --scale row

3. Write the reordered matrix and the gene tree:
   heatclust cluster tests/heatmap/small.tsv --format matrix --row-tree genes.nwk

"###,
        )
        .arg(super::arg_infile())
        .arg(super::arg_axis("row"))
        .arg(super::arg_linkage())
        .arg(super::arg_distance())
        .arg(super::arg_scale())
        .arg(
            Arg::new("ladderize")
                .long("ladderize")
                .action(ArgAction::SetTrue)
                .help("Put larger subtrees first"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .num_args(1)
                .value_parser(["order", "matrix", "json"])
                .default_value("order")
                .help("Output format"),
        )
        .arg(
            Arg::new("row-tree")
                .long("row-tree")
                .num_args(1)
                .help("Write the row dendrogram in Newick format"),
        )
        .arg(
            Arg::new("col-tree")
                .long("col-tree")
                .num_args(1)
                .help("Write the column dendrogram in Newick format"),
        )
        .arg(super::arg_parallel())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let opt_format = args.get_one::<String>("format").unwrap();
    let config = super::cluster_config(args)?;
    super::init_threads(args)?;

    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Ops
    //----------------------------
    let input = LabelledMatrix::from_tsv(infile)?;
    let (result, trees) = axis::run_with_trees(&input.matrix, &config)?;

    if let Some(tree_file) = args.get_one::<String>("row-tree") {
        if let Some(tree) = &trees.rows {
            let mut tree_writer = intspan::writer(tree_file);
            let newick = tree.to_newick(Some(input.row_names.as_slice()));
            tree_writer.write_fmt(format_args!("{}\n", newick))?;
        } else {
            log::warn!("--row-tree ignored: rows are not clustered");
        }
    }
    if let Some(tree_file) = args.get_one::<String>("col-tree") {
        if let Some(tree) = &trees.cols {
            let mut tree_writer = intspan::writer(tree_file);
            let newick = tree.to_newick(Some(input.col_names.as_slice()));
            tree_writer.write_fmt(format_args!("{}\n", newick))?;
        } else {
            log::warn!("--col-tree ignored: columns are not clustered");
        }
    }

    //----------------------------
    // Output
    //----------------------------
    match opt_format.as_str() {
        "order" => {
            let rows: Vec<&str> = result
                .row_order
                .iter()
                .map(|&i| input.row_names[i].as_str())
                .collect();
            let cols: Vec<&str> = result
                .col_order
                .iter()
                .map(|&i| input.col_names[i].as_str())
                .collect();
            writer.write_fmt(format_args!("rows\t{}\n", rows.join("\t")))?;
            writer.write_fmt(format_args!("cols\t{}\n", cols.join("\t")))?;
        }
        "matrix" => {
            let remap = result.remapper();
            let reordered = remap.materialize(&result.values);

            let mut header = vec![String::new()];
            header.extend(result.col_order.iter().map(|&c| input.col_names[c].clone()));
            writer.write_fmt(format_args!("{}\n", header.join("\t")))?;

            for (p, &r) in result.row_order.iter().enumerate() {
                let mut fields = vec![input.row_names[r].clone()];
                fields.extend(
                    reordered[p * result.ncols..(p + 1) * result.ncols]
                        .iter()
                        .map(|&v| format_value(v)),
                );
                writer.write_fmt(format_args!("{}\n", fields.join("\t")))?;
            }
        }
        "json" => {
            let response = Response::Result(ClusterResponse::from(result));
            writer.write_fmt(format_args!("{}\n", serde_json::to_string(&response)?))?;
        }
        _ => unreachable!(),
    }

    Ok(())
}
