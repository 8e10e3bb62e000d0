use log::*;

use super::dynp::{
    best_single_break,
    CostAutoregressive,
    CostLinear,
};
use crate::data_structs::CpdStrategy;
use crate::error::{
    DnbError,
    Result,
};
use crate::utils::{
    argmax,
    population_std,
};
use crate::{
    config_bail,
    ensure_data,
};

/// Number of thresholds swept by [`Otsu`].
pub const OTSU_RESOLUTION: usize = 10_000;

/// Locates a regime change inside the part of an early-warning signal that
/// leads up to its maximum.
///
/// `sub_series` ends at the maximum of the signal and is standardized. The
/// returned offset is an index into `sub_series`.
pub trait ChangePointEstimator {
    fn estimate(
        &self,
        sub_series: &[f64],
    ) -> usize;
}

/// The maximum itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Peak;

/// Onset of the high-value class found by Otsu's two-class thresholding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Otsu;

/// Best single break of a piecewise linear trend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearSegmentation;

/// Best single break of a piecewise autoregressive model.
#[derive(Debug, Clone, Copy)]
pub struct AutoregressiveSegmentation {
    pub order: usize,
}

impl ChangePointEstimator for Peak {
    fn estimate(
        &self,
        sub_series: &[f64],
    ) -> usize {
        argmax(sub_series).unwrap_or(0)
    }
}

/// Between-class variance of splitting `values` at `threshold` (classes
/// `<= threshold` and `> threshold`). Zero when a class is empty.
pub fn otsu_score(
    values: &[f64],
    threshold: f64,
) -> f64 {
    let n = values.len() as f64;
    let (mut n0, mut s0, mut n1, mut s1) = (0.0, 0.0, 0.0, 0.0);
    for &v in values {
        if v <= threshold {
            n0 += 1.0;
            s0 += v;
        }
        else {
            n1 += 1.0;
            s1 += v;
        }
    }
    if n0 == 0.0 || n1 == 0.0 {
        return 0.0;
    }
    let mean_all = (s0 + s1) / n;
    let (m0, m1) = (s0 / n0, s1 / n1);
    n0 / n * (m0 - mean_all).powi(2) + n1 / n * (m1 - mean_all).powi(2)
}

/// Threshold with the highest between-class variance among
/// [`OTSU_RESOLUTION`] evenly spaced values from the minimum (inclusive) to
/// the maximum (exclusive).
pub fn otsu_threshold(values: &[f64]) -> f64 {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let mut best = (min, 0.0);
    for k in 0..OTSU_RESOLUTION {
        let threshold = min + (max - min) * k as f64 / OTSU_RESOLUTION as f64;
        let score = otsu_score(values, threshold);
        if score > best.1 {
            best = (threshold, score);
        }
    }
    best.0
}

impl ChangePointEstimator for Otsu {
    /// Binarizes at the Otsu threshold and walks back from the maximum over
    /// the run of high values preceding it; the change point is the first
    /// step of that run.
    fn estimate(
        &self,
        sub_series: &[f64],
    ) -> usize {
        let threshold = otsu_threshold(sub_series);
        let peak = argmax(sub_series).unwrap_or(0);
        let mut onset = peak;
        while onset > 0 && sub_series[onset - 1] > threshold {
            onset -= 1;
        }
        debug!("Otsu threshold {threshold:.4}, onset {onset} of {peak}");
        onset
    }
}

fn break_or_peak(
    sub_series: &[f64],
    found: Option<usize>,
) -> usize {
    found.unwrap_or_else(|| {
        warn!(
            "No admissible breakpoint in a sub-series of {} steps, using the peak",
            sub_series.len()
        );
        sub_series.len().saturating_sub(1)
    })
}

impl ChangePointEstimator for LinearSegmentation {
    fn estimate(
        &self,
        sub_series: &[f64],
    ) -> usize {
        let cost = CostLinear::new(sub_series);
        break_or_peak(sub_series, best_single_break(&cost, sub_series.len(), 1, 1))
    }
}

impl ChangePointEstimator for AutoregressiveSegmentation {
    fn estimate(
        &self,
        sub_series: &[f64],
    ) -> usize {
        let cost = CostAutoregressive::new(sub_series, self.order);
        break_or_peak(sub_series, best_single_break(&cost, sub_series.len(), 2, 5))
    }
}

impl CpdStrategy {
    pub fn estimator(&self) -> Box<dyn ChangePointEstimator + Send + Sync> {
        match *self {
            CpdStrategy::Peak => Box::new(Peak),
            CpdStrategy::Otsu => Box::new(Otsu),
            CpdStrategy::LinearSegmentation => Box::new(LinearSegmentation),
            CpdStrategy::AutoregressiveSegmentation { order } => {
                Box::new(AutoregressiveSegmentation { order })
            },
        }
    }
}

/// Change point of an early-warning signal.
///
/// The search is restricted to the last `scope_range` steps up to and
/// including the first global maximum, divided by their standard deviation.
/// The result lies in `[argmax + 1 - scope_range, argmax]` (clamped at 0).
pub fn detect_change_point(
    ews: &[f64],
    estimator: &dyn ChangePointEstimator,
    scope_range: usize,
) -> Result<usize> {
    if scope_range == 0 {
        config_bail!("scope_range must be at least 1");
    }
    ensure_data!(
        !ews.is_empty(),
        "cannot detect a change point in an empty signal"
    );
    let peak = match argmax(ews) {
        Some(idx) if !ews[idx].is_nan() => idx,
        _ => {
            return Err(DnbError::insufficient_data(
                "the early-warning signal has no finite values",
            ))
        },
    };

    let len = scope_range.min(peak + 1);
    let start = peak + 1 - len;
    let mut sub_series = ews[start..=peak].to_vec();
    let std = population_std(&sub_series);
    if std > 0.0 && std.is_finite() {
        sub_series.iter_mut().for_each(|v| *v /= std);
    }
    else {
        warn!("Sub-series [{start}, {peak}] has zero variance, not standardized");
    }

    let offset = estimator.estimate(&sub_series).min(len - 1);
    debug!("Peak at {peak}, search window starts at {start}, offset {offset}");
    Ok(start + offset)
}
