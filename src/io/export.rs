use std::io::Write;

use serde::Serialize;

use crate::data_structs::{
    AggregatedResult,
    DnbRecord,
    DnbResult,
    ObservationMatrix,
    TimeKey,
};
use crate::error::Result;

/// Name of the single column of an exported early-warning signal.
pub const EWS_COLUMN: &str = "EWS_DNB";

#[derive(Serialize)]
struct LabelRow<'a> {
    dnb: &'a str,
}

#[derive(Serialize)]
struct LabelTimeRow<'a> {
    dnb:        &'a str,
    time_point: &'a TimeKey,
}

// csv does not support serde(flatten), so the time point gets its own row
#[derive(Serialize)]
struct MetricsTimeRow<'a> {
    dnb:         &'a str,
    cluster:     usize,
    clustersize: usize,
    dev_expr:    f64,
    dev_ctrl:    f64,
    cor_mean:    Option<f64>,
    time_point:  &'a TimeKey,
}

impl<'a> MetricsTimeRow<'a> {
    fn new(
        record: &'a DnbRecord,
        time_point: &'a TimeKey,
    ) -> Self {
        Self {
            dnb: &record.dnb,
            cluster: record.cluster,
            clustersize: record.clustersize,
            dev_expr: record.dev_expr,
            dev_ctrl: record.dev_ctrl,
            cor_mean: record.cor_mean,
            time_point,
        }
    }
}

static METRIC_COLUMNS: [&str; 7] = [
    "dnb",
    "cluster",
    "clustersize",
    "dev_expr",
    "dev_ctrl",
    "cor_mean",
    "time_point",
];

/// Columns of a table without rows; otherwise the header comes from the
/// serialized rows.
fn header(
    output_metrics: bool,
    time_point: bool,
) -> &'static [&'static str] {
    match (output_metrics, time_point) {
        (true, true) => &METRIC_COLUMNS,
        (true, false) => &METRIC_COLUMNS[..6],
        (false, true) => &["dnb", "time_point"],
        (false, false) => &METRIC_COLUMNS[..1],
    }
}

fn write_header<W: Write>(
    csv_writer: &mut csv::Writer<W>,
    columns: &[&str],
) -> Result<()> {
    csv_writer.write_record(columns)?;
    Ok(())
}

/// Writes one result table. Only the `dnb` column is written when the
/// result was produced without metrics.
pub fn write_dnb_result<W: Write>(
    result: &DnbResult,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if result.is_empty() {
        write_header(&mut csv_writer, header(result.output_metrics(), false))?;
    }
    for record in result.iter() {
        if result.output_metrics() {
            csv_writer.serialize(record)?;
        }
        else {
            csv_writer.serialize(LabelRow { dnb: &record.dnb })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes the rows of several runs with a trailing `time_point` column.
pub fn write_aggregated<W: Write>(
    aggregated: &AggregatedResult,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if aggregated.is_empty() {
        write_header(&mut csv_writer, header(aggregated.output_metrics(), true))?;
    }
    for (key, record) in aggregated.rows() {
        if aggregated.output_metrics() {
            csv_writer.serialize(MetricsTimeRow::new(record, key))?;
        }
        else {
            csv_writer.serialize(LabelTimeRow {
                dnb:        &record.dnb,
                time_point: key,
            })?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes an early-warning signal as an indexed single-column table.
pub fn write_ews<W: Write>(
    ews: &[f64],
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["", EWS_COLUMN])?;
    for (step, value) in ews.iter().enumerate() {
        csv_writer.write_record([step.to_string(), value.to_string()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Writes a labelled matrix: a header of column labels after an empty
/// corner cell, then one line per row starting with its label.
pub fn write_matrix<W: Write>(
    matrix: &ObservationMatrix,
    writer: W,
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(std::iter::once("").chain(matrix.col_labels().iter().map(String::as_str)))?;
    for (label, row) in matrix.row_labels().iter().zip(matrix.values().rows()) {
        csv_writer.write_record(
            std::iter::once(label.clone()).chain(row.iter().map(|v| v.to_string())),
        )?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    fn records() -> Vec<DnbRecord> {
        vec![
            DnbRecord {
                dnb:         "g1".into(),
                cluster:     1,
                clustersize: 2,
                dev_expr:    1.5,
                dev_ctrl:    0.5,
                cor_mean:    Some(0.75),
            },
            DnbRecord {
                dnb:         "g7".into(),
                cluster:     3,
                clustersize: 1,
                dev_expr:    2.0,
                dev_ctrl:    0.25,
                cor_mean:    None,
            },
        ]
    }

    fn written<F: FnOnce(&mut Vec<u8>) -> Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn result_with_and_without_metrics() {
        let full = written(|w| write_dnb_result(&DnbResult::new(records(), true), w));
        assert_eq!(
            full,
            "dnb,cluster,clustersize,dev_expr,dev_ctrl,cor_mean\ng1,1,2,1.5,0.5,0.75\ng7,3,1,2.0,0.25,\n"
        );
        let labels = written(|w| write_dnb_result(&DnbResult::new(records(), false), w));
        assert_eq!(labels, "dnb\ng1\ng7\n");
    }

    #[test]
    fn aggregated_has_time_point() {
        let mut agg = AggregatedResult::new(false);
        agg.push_run(TimeKey::Int(4), DnbResult::new(records(), false));
        agg.push_run(TimeKey::Str("late".into()), DnbResult::new(records()[..1].to_vec(), false));
        let out = written(|w| write_aggregated(&agg, w));
        assert_eq!(out, "dnb,time_point\ng1,4\ng7,4\ng1,late\n");

        let mut agg = AggregatedResult::new(true);
        agg.push_run(TimeKey::Int(2), DnbResult::new(records()[1..].to_vec(), true));
        let out = written(|w| write_aggregated(&agg, w));
        assert_eq!(
            out,
            "dnb,cluster,clustersize,dev_expr,dev_ctrl,cor_mean,time_point\ng7,3,1,2.0,0.25,,2\n"
        );
    }

    #[test]
    fn empty_tables_keep_their_header() {
        let out = written(|w| write_dnb_result(&DnbResult::empty(true), w));
        assert_eq!(out, "dnb,cluster,clustersize,dev_expr,dev_ctrl,cor_mean\n");
        let out = written(|w| write_aggregated(&AggregatedResult::new(false), w));
        assert_eq!(out, "dnb,time_point\n");
    }

    #[test]
    fn ews_and_matrix_layout() {
        let out = written(|w| write_ews(&[0.5, 2.0], w));
        assert_eq!(out, ",EWS_DNB\n0,0.5\n1,2\n");

        let m = ObservationMatrix::try_new(
            vec!["x".into()],
            vec!["ctrl_000000".into(), "expr_000000".into()],
            array![[1.0, 2.5]],
        )
        .unwrap();
        let out = written(|w| write_matrix(&m, w));
        assert_eq!(out, ",ctrl_000000,expr_000000\nx,1,2.5\n");
    }
}
