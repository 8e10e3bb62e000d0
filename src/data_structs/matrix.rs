use itertools::Itertools;
use log::*;
use ndarray::{
    Array2,
    ArrayView1,
    ArrayView2,
    Axis,
};

use crate::config_bail;
use crate::error::{
    DnbError,
    Result,
};

/// Labelled variables x samples matrix.
///
/// Row labels identify variables (genes, features) and are unique. Column
/// labels identify samples and carry the group markers matched by
/// [`ObservationMatrix::split_groups`].
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values:     Array2<f64>,
}

impl ObservationMatrix {
    crate::getter_fn!(row_labels, Vec<String>);

    crate::getter_fn!(col_labels, Vec<String>);

    crate::getter_fn!(values, Array2<f64>);

    pub fn try_new(
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        values: Array2<f64>,
    ) -> Result<Self> {
        if values.nrows() != row_labels.len() || values.ncols() != col_labels.len() {
            config_bail!(
                "matrix shape {:?} does not match {} row labels and {} column labels",
                values.shape(),
                row_labels.len(),
                col_labels.len()
            );
        }
        if !row_labels.iter().all_unique() {
            let duplicate = row_labels
                .iter()
                .duplicates()
                .next()
                .cloned()
                .unwrap_or_default();
            config_bail!("row label \"{duplicate}\" is not unique");
        }
        Ok(Self {
            row_labels,
            col_labels,
            values,
        })
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn row(
        &self,
        idx: usize,
    ) -> ArrayView1<'_, f64> {
        self.values.row(idx)
    }

    /// Swaps rows and columns, labels included.
    pub fn transposed(&self) -> Result<Self> {
        Self::try_new(
            self.col_labels.clone(),
            self.row_labels.clone(),
            self.values.t().to_owned(),
        )
    }

    /// Keeps the given columns, in the given order.
    pub fn select_columns(
        &self,
        indices: &[usize],
    ) -> Self {
        Self {
            row_labels: self.row_labels.clone(),
            col_labels: indices
                .iter()
                .map(|&i| self.col_labels[i].clone())
                .collect(),
            values:     self.values.select(Axis(1), indices),
        }
    }

    /// Keeps the given rows, in the given order.
    pub fn select_rows(
        &self,
        indices: &[usize],
    ) -> Self {
        Self {
            row_labels: indices
                .iter()
                .map(|&i| self.row_labels[i].clone())
                .collect(),
            col_labels: self.col_labels.clone(),
            values:     self.values.select(Axis(0), indices),
        }
    }

    /// Classifies columns into control and experimental groups by substring
    /// containment of the markers in the column labels.
    ///
    /// The normal orientation is tried first; if it does not produce a valid
    /// split the transposed matrix is tried. A split is valid when both groups
    /// are non-empty, no column matches both markers and, unless
    /// `ignore_extra_columns` is set, every column belongs to a group.
    ///
    /// When neither orientation is valid: with `ignore_extra_columns` the
    /// normal-orientation split is returned as is (the pipeline rejects empty
    /// groups later), otherwise a configuration error is raised.
    pub fn split_groups(
        &self,
        key_control: &str,
        key_experimental: &str,
        ignore_extra_columns: bool,
    ) -> Result<GroupSplit> {
        let normal = ColumnClassification::classify(
            &self.col_labels,
            key_control,
            key_experimental,
        );
        if normal.is_valid(ignore_extra_columns) {
            return Ok(normal.apply(self));
        }

        let transposed = self.transposed()?;
        let flipped = ColumnClassification::classify(
            &transposed.col_labels,
            key_control,
            key_experimental,
        );
        if flipped.is_valid(ignore_extra_columns) {
            info!("Columns could not be classified, using the transposed table");
            return Ok(flipped.apply(&transposed));
        }

        if ignore_extra_columns && normal.ambiguous.is_empty() {
            warn!(
                "Neither orientation yields two non-empty groups (control: {}, \
                 experimental: {})",
                normal.control.len(),
                normal.experimental.len()
            );
            return Ok(normal.apply(self));
        }
        Err(DnbError::configuration(format!(
            "Data is not correctly classified as control (key=\"{key_control}\") or \
             experimental (key=\"{key_experimental}\"). Check the key settings or the \
             ignore_extra_columns setting."
        )))
    }
}

struct ColumnClassification {
    control:      Vec<usize>,
    experimental: Vec<usize>,
    ambiguous:    Vec<usize>,
    total:        usize,
}

impl ColumnClassification {
    fn classify(
        labels: &[String],
        key_control: &str,
        key_experimental: &str,
    ) -> Self {
        let mut out = Self {
            control:      Vec::new(),
            experimental: Vec::new(),
            ambiguous:    Vec::new(),
            total:        labels.len(),
        };
        for (idx, label) in labels.iter().enumerate() {
            match (label.contains(key_control), label.contains(key_experimental)) {
                (true, true) => out.ambiguous.push(idx),
                (true, false) => out.control.push(idx),
                (false, true) => out.experimental.push(idx),
                (false, false) => {},
            }
        }
        out
    }

    fn is_valid(
        &self,
        ignore_extra_columns: bool,
    ) -> bool {
        let non_empty = !self.control.is_empty() && !self.experimental.is_empty();
        let partition = self.control.len() + self.experimental.len() == self.total;
        non_empty && self.ambiguous.is_empty() && (ignore_extra_columns || partition)
    }

    fn apply(
        &self,
        matrix: &ObservationMatrix,
    ) -> GroupSplit {
        GroupSplit {
            control:      matrix.select_columns(&self.control),
            experimental: matrix.select_columns(&self.experimental),
        }
    }
}

/// Control and experimental sub-matrices sharing one row index.
#[derive(Debug, Clone)]
pub struct GroupSplit {
    control:      ObservationMatrix,
    experimental: ObservationMatrix,
}

impl GroupSplit {
    crate::getter_fn!(control, ObservationMatrix);

    crate::getter_fn!(experimental, ObservationMatrix);

    pub fn try_new(
        control: ObservationMatrix,
        experimental: ObservationMatrix,
    ) -> Result<Self> {
        if control.row_labels() != experimental.row_labels() {
            config_bail!("control and experimental groups must share the same row index");
        }
        Ok(Self {
            control,
            experimental,
        })
    }

    pub fn row_labels(&self) -> &[String] {
        self.control.row_labels()
    }

    pub fn into_parts(self) -> (ObservationMatrix, ObservationMatrix) {
        (self.control, self.experimental)
    }
}
