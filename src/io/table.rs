use std::path::Path;

use log::*;
use ndarray::Array2;
use polars::prelude::*;

use crate::data_structs::{
    GroupSplit,
    ObservationMatrix,
};
use crate::error::{
    DnbError,
    Result,
};
use crate::{
    config_bail,
    ensure_data,
};

/// CSV read options for labelled tables: a header row, every column's type
/// inferred from the whole file.
pub fn table_read_options() -> CsvReadOptions {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_parse_options(
            CsvParseOptions::default()
                .with_separator(b',')
                .with_try_parse_dates(false),
        )
}

/// Converts a data frame whose first column holds the row labels.
///
/// Label columns of any type are rendered as text. Value columns must be
/// numeric; missing values become NaN.
pub fn frame_to_matrix(df: &DataFrame) -> Result<ObservationMatrix> {
    let columns = df.get_columns();
    let Some((index, data)) = columns.split_first()
    else {
        config_bail!("table has no columns");
    };

    let row_labels = index
        .as_materialized_series()
        .cast(&DataType::String)?
        .str()?
        .into_iter()
        .enumerate()
        .map(|(i, label)| label.map(str::to_string).unwrap_or_else(|| i.to_string()))
        .collect::<Vec<_>>();
    let col_labels = data
        .iter()
        .map(|c| c.name().to_string())
        .collect::<Vec<_>>();

    let mut values = Array2::<f64>::zeros((df.height(), data.len()));
    for (j, column) in data.iter().enumerate() {
        let series = column.as_materialized_series();
        let casted = series.strict_cast(&DataType::Float64).map_err(|_| {
            DnbError::configuration(format!(
                "column \"{}\" is not numeric ({})",
                series.name(),
                series.dtype()
            ))
        })?;
        for (i, v) in casted.f64()?.into_iter().enumerate() {
            values[[i, j]] = v.unwrap_or(f64::NAN);
        }
    }
    ObservationMatrix::try_new(row_labels, col_labels, values)
}

/// Reads a CSV file whose first column holds the row labels.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<ObservationMatrix> {
    let path = path.as_ref();
    let df = table_read_options()
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    debug!("Read {} ({} x {})", path.display(), df.height(), df.width());
    frame_to_matrix(&df)
}

/// Reads a table and splits its columns into control and experimental
/// groups.
pub fn read_and_split<P: AsRef<Path>>(
    path: P,
    key_control: &str,
    key_experimental: &str,
    ignore_extra_columns: bool,
) -> Result<GroupSplit> {
    read_table(path)?.split_groups(key_control, key_experimental, ignore_extra_columns)
}

/// Reads a time series: first column the step label, second column the
/// time, then one column per variable. The time column is dropped.
pub fn read_series<P: AsRef<Path>>(path: P) -> Result<ObservationMatrix> {
    let table = read_table(path)?;
    ensure_data!(
        table.ncols() >= 2,
        "a time series needs a time column and at least one variable, got {} columns",
        table.ncols()
    );
    let variables = (1..table.ncols()).collect::<Vec<_>>();
    Ok(table.select_columns(&variables))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_with_text_index() {
        let df = df! {
            "" => ["g1", "g2"],
            "ctrl_1" => [1.0, 2.0],
            "expr_1" => [3i64, 4],
        }
        .unwrap();
        let m = frame_to_matrix(&df).unwrap();
        assert_eq!(m.row_labels(), &vec!["g1".to_string(), "g2".to_string()]);
        assert_eq!(m.col_labels(), &vec!["ctrl_1".to_string(), "expr_1".to_string()]);
        assert_eq!(m.row(1).to_vec(), vec![2.0, 4.0]);
    }

    #[test]
    fn numeric_index_becomes_text() {
        let df = df! {
            "step" => [0i64, 1, 2],
            "x" => [0.5, 0.25, 0.125],
        }
        .unwrap();
        let m = frame_to_matrix(&df).unwrap();
        assert_eq!(m.row_labels()[2], "2");
    }

    #[test]
    fn text_values_are_rejected() {
        let df = df! {
            "" => ["g1"],
            "a" => ["high"],
        }
        .unwrap();
        assert!(frame_to_matrix(&df).unwrap_err().is_configuration());
    }
}
