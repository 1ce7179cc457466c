use clap::*;
use heatclust::libs::matrix::LabelledMatrix;
use heatclust::libs::scale::{self, Scaling};
use std::io::Write;

use super::format_value;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("scale")
        .about("Rescale a matrix")
        .after_help(
            r###"
Methods:
* none       - unchanged
* row        - min-max to [0, 1] within each row; constant rows become 0
* col        - min-max to [0, 1] within each column
* zscore     - (v - mean) / sd within each row, population sd
* zscore_col - the same within each column
* log2       - log2(v + 1); negative values become NA

Statistics skip missing cells, which stay `NA` in the output.

Examples:
1. Row-wise min-max:
   heatclust scale tests/heatmap/small.tsv --scale row

"###,
        )
        .arg(super::arg_infile())
        .arg(super::arg_scale())
        .arg(super::arg_outfile())
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let method = args.get_one::<String>("scale").unwrap().parse::<Scaling>()?;
    let mut writer = intspan::writer(args.get_one::<String>("outfile").unwrap());

    let input = LabelledMatrix::from_tsv(infile)?;
    let scaled = scale::scale(&input.matrix, method);

    writer.write_fmt(format_args!("\t{}\n", input.col_names.join("\t")))?;
    for (r, name) in input.row_names.iter().enumerate() {
        let fields: Vec<String> = scaled.row(r).iter().map(|&v| format_value(v)).collect();
        writer.write_fmt(format_args!("{}\t{}\n", name, fields.join("\t")))?;
    }

    Ok(())
}
