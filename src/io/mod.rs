//! File collaborators of the pipelines: reading labelled CSV tables with
//! polars, discovering the files of a keyed dataset series, and writing the
//! result tables with `csv`.

mod discovery;
mod export;
mod table;

use std::path::PathBuf;

use itertools::Itertools;
use log::*;

pub use discovery::{
    discover_files,
    key_from_filename,
    sort_by_keys,
};
pub use export::{
    write_aggregated,
    write_dnb_result,
    write_ews,
    write_matrix,
    EWS_COLUMN,
};
pub use table::{
    frame_to_matrix,
    read_and_split,
    read_series,
    read_table,
    table_read_options,
};

use crate::config_bail;
use crate::data_structs::{
    GroupSplit,
    ObservationMatrix,
    TimeKey,
};
use crate::error::Result;

/// Top-left corner of a matrix as text, for log output.
pub fn matrix_summary(
    matrix: &ObservationMatrix,
    n: usize,
) -> String {
    let cols = matrix.ncols().min(n);
    let mut lines = vec![std::iter::once("")
        .chain(matrix.col_labels()[..cols].iter().map(String::as_str))
        .join("\t")];
    for i in 0..matrix.nrows().min(n) {
        lines.push(
            std::iter::once(matrix.row_labels()[i].clone())
                .chain((0..cols).map(|j| format!("{:.4}", matrix.values()[[i, j]])))
                .join("\t"),
        );
    }
    lines.join("\n")
}

/// Reads and splits every input file up front, so that a malformed file
/// stops the analysis before any computation.
pub fn check_inputs(
    files: &[(TimeKey, PathBuf)],
    key_control: &str,
    key_experimental: &str,
    ignore_extra_columns: bool,
) -> Result<Vec<(TimeKey, GroupSplit)>> {
    let Some((_, first)) = files.first()
    else {
        config_bail!("No input files");
    };
    info!(
        "Input files: {}",
        files.iter().map(|(_, p)| p.display()).join(", ")
    );
    info!(
        "First input table ({}):\n{}",
        first.display(),
        matrix_summary(&read_table(first)?, 5)
    );

    let mut splits = Vec::with_capacity(files.len());
    for (idx, (key, path)) in files.iter().enumerate() {
        let split = read_and_split(path, key_control, key_experimental, ignore_extra_columns)?;
        if idx == 0 {
            info!(
                "Control group (key=\"{key_control}\"):\n{}",
                matrix_summary(split.control(), 5)
            );
            info!(
                "Experimental group (key=\"{key_experimental}\"):\n{}",
                matrix_summary(split.experimental(), 5)
            );
        }
        splits.push((key.clone(), split));
    }
    Ok(splits)
}
