//! Early-warning signal and change-point detection for multivariate time
//! series.
//!
//! The early-warning signal (EWS) of a window is the largest eigenvalue of
//! the sample covariance of the observations it covers ([`ews`]). The change
//! point is searched in the part of the signal leading up to its maximum by
//! one of the [`ChangePointEstimator`]s of [`cpd`]. [`analyse`] runs both and
//! [`EwsAnalysis::windowed_dataset`] cuts the series into a control and a
//! transition window for the tabular pipeline.

pub mod cpd;
pub mod dynp;
pub mod ews;
pub mod pca;

use std::time::Instant;

use itertools::Itertools;
use log::*;
use ndarray::{
    concatenate,
    Array1,
    ArrayView2,
    Axis,
};
use serde::{
    Deserialize,
    Serialize,
};

pub use cpd::{
    detect_change_point,
    AutoregressiveSegmentation,
    ChangePointEstimator,
    LinearSegmentation,
    Otsu,
    Peak,
};

use crate::data_structs::{
    CpdStrategy,
    Normalization,
    ObservationMatrix,
    Padding,
};
use crate::error::Result;
use crate::{
    config_bail,
    ensure_data,
    with_field_fn,
};

/// Settings of the sliding-window early-warning signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EwsConfig {
    pub window_size:   usize,
    pub padding:       Padding,
    pub normalization: Normalization,
}

impl Default for EwsConfig {
    fn default() -> Self {
        Self {
            window_size:   100,
            padding:       Padding::Online,
            normalization: Normalization::Straight,
        }
    }
}

impl EwsConfig {
    with_field_fn!(window_size, usize);

    with_field_fn!(padding, Padding);

    with_field_fn!(normalization, Normalization);

    /// EWS of a steps x variables series, aligned according to the padding
    /// policy.
    pub fn compute(
        &self,
        series: ArrayView2<f64>,
    ) -> Result<Array1<f64>> {
        let (n_steps, n_vars) = series.dim();
        if self.window_size < 2 {
            config_bail!("window_size must be at least 2, got {}", self.window_size);
        }
        ensure_data!(n_vars > 0, "the time series has no variables");
        ensure_data!(
            n_steps >= self.window_size,
            "the time series has {n_steps} steps, fewer than the window size {}",
            self.window_size
        );

        let start = Instant::now();
        let normalized = self.normalization.apply(series)?;
        let statistics = ews::window_statistics(normalized.view(), self.window_size);
        let signal = self
            .padding
            .apply(statistics, n_steps, self.window_size);
        info!(
            "EWS over {n_steps} steps x {} variables (window {}, {} normalization, {} \
             padding) computed in {:.2?}",
            normalized.ncols(),
            self.window_size,
            self.normalization,
            self.padding,
            start.elapsed()
        );
        Ok(Array1::from(signal))
    }
}

/// Settings of the change-point search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpdConfig {
    pub strategy:    CpdStrategy,
    /// Maximum number of steps, ending at the EWS maximum, searched.
    pub scope_range: usize,
}

impl Default for CpdConfig {
    fn default() -> Self {
        Self {
            strategy:    CpdStrategy::default(),
            scope_range: 1000,
        }
    }
}

impl CpdConfig {
    with_field_fn!(strategy, CpdStrategy);

    with_field_fn!(scope_range, usize);

    pub fn detect(
        &self,
        ews: &[f64],
    ) -> Result<usize> {
        let start = Instant::now();
        let cp = detect_change_point(ews, self.strategy.estimator().as_ref(), self.scope_range)?;
        info!(
            "Change point {cp} ({} strategy, scope {}) found in {:.2?}",
            self.strategy,
            self.scope_range,
            start.elapsed()
        );
        Ok(cp)
    }
}

/// EWS of a series with its change point and the matching control point.
#[derive(Debug, Clone, PartialEq)]
pub struct EwsAnalysis {
    pub ews:           Array1<f64>,
    pub change_point:  usize,
    /// Half of the change point, taken as a step well before the transition.
    pub control_point: usize,
}

/// Computes the EWS of a steps x variables series and locates its change
/// point.
pub fn analyse(
    series: ArrayView2<f64>,
    ews_config: &EwsConfig,
    cpd_config: &CpdConfig,
) -> Result<EwsAnalysis> {
    let ews = ews_config.compute(series)?;
    let change_point = match ews.as_slice() {
        Some(slice) => cpd_config.detect(slice)?,
        None => cpd_config.detect(&ews.to_vec())?,
    };
    Ok(EwsAnalysis {
        ews,
        change_point,
        control_point: change_point / 2,
    })
}

impl EwsAnalysis {
    /// Variables x samples matrix of two windows of the series: the
    /// `window_size` steps before the control point (`ctrl_000000`, ...)
    /// and the `window_size` steps before the change point (`expr_000000`,
    /// ...). Neither window includes its end point.
    ///
    /// `series` holds steps as rows and variables as columns; its column
    /// labels become the row labels of the result.
    pub fn windowed_dataset(
        &self,
        series: &ObservationMatrix,
        window_size: usize,
    ) -> Result<ObservationMatrix> {
        let window = |end: usize, name: &str| {
            ensure_data!(
                end >= window_size && end <= series.nrows(),
                "the {name} window of {window_size} steps ending at step {end} does not fit \
                 in a series of {} steps",
                series.nrows()
            );
            Ok(series.view().slice(ndarray::s![end - window_size..end, ..]).t().to_owned())
        };
        let control = window(self.control_point, "control")?;
        let transition = window(self.change_point, "transition")?;
        let values = concatenate(Axis(1), &[control.view(), transition.view()])?;

        let col_labels = (0..window_size)
            .map(|i| format!("ctrl_{i:06}"))
            .chain((0..window_size).map(|i| format!("expr_{i:06}")))
            .collect_vec();
        ObservationMatrix::try_new(series.col_labels().clone(), col_labels, values)
    }
}
