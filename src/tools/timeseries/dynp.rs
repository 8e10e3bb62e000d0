//! Exact single-breakpoint segmentation of a univariate signal.
//!
//! A cost model assigns a goodness-of-fit cost to every segment `[start,
//! end)`; the breakpoint minimises the sum of the costs of the two segments
//! it creates. Candidate breakpoints are multiples of `jump` and both
//! segments must hold at least `min_size` samples.

use log::*;
use nalgebra::{
    DMatrix,
    DVector,
};

/// Cost of fitting a model to a contiguous segment of the signal the cost was
/// built from.
pub trait SegmentCost {
    /// Smallest segment the model can be fitted on.
    fn min_size(&self) -> usize;

    /// Cost of `[start, end)`; `start < end`.
    fn cost(
        &self,
        start: usize,
        end: usize,
    ) -> f64;
}

/// Piecewise linear trend: residual sum of squares of `y ~ a + b * t` fitted
/// by least squares on each segment.
#[derive(Debug, Clone)]
pub struct CostLinear {
    // prefix sums of t, t^2, y, y^2, t*y
    s_t:  Vec<f64>,
    s_tt: Vec<f64>,
    s_y:  Vec<f64>,
    s_yy: Vec<f64>,
    s_ty: Vec<f64>,
}

impl CostLinear {
    pub fn new(signal: &[f64]) -> Self {
        let n = signal.len();
        let mut out = Self {
            s_t:  vec![0.0; n + 1],
            s_tt: vec![0.0; n + 1],
            s_y:  vec![0.0; n + 1],
            s_yy: vec![0.0; n + 1],
            s_ty: vec![0.0; n + 1],
        };
        for (i, &y) in signal.iter().enumerate() {
            let t = i as f64;
            out.s_t[i + 1] = out.s_t[i] + t;
            out.s_tt[i + 1] = out.s_tt[i] + t * t;
            out.s_y[i + 1] = out.s_y[i] + y;
            out.s_yy[i + 1] = out.s_yy[i] + y * y;
            out.s_ty[i + 1] = out.s_ty[i] + t * y;
        }
        out
    }
}

impl SegmentCost for CostLinear {
    fn min_size(&self) -> usize {
        2
    }

    fn cost(
        &self,
        start: usize,
        end: usize,
    ) -> f64 {
        let range = |s: &[f64]| s[end] - s[start];
        let n = (end - start) as f64;
        let (st, stt, sy, syy, sty) = (
            range(&self.s_t),
            range(&self.s_tt),
            range(&self.s_y),
            range(&self.s_yy),
            range(&self.s_ty),
        );
        let c_tt = stt - st * st / n;
        let c_yy = syy - sy * sy / n;
        let c_ty = sty - st * sy / n;
        let rss = if c_tt > 0.0 {
            c_yy - c_ty * c_ty / c_tt
        }
        else {
            c_yy
        };
        rss.max(0.0)
    }
}

/// Autoregressive model of order `p` with intercept, fitted by least squares
/// on each segment.
///
/// Lagged covariates are taken from the whole signal. The first `p` steps
/// have no full history; they reuse the covariates of step `p` and their
/// response is replaced by the value at step `p`.
#[derive(Debug, Clone)]
pub struct CostAutoregressive {
    order:     usize,
    response:  Vec<f64>,
    covariate: DMatrix<f64>,
}

impl CostAutoregressive {
    pub fn new(
        signal: &[f64],
        order: usize,
    ) -> Self {
        let n = signal.len();
        let mut response = signal.to_vec();
        if n > order {
            let edge = signal[order];
            response[..order].iter_mut().for_each(|v| *v = edge);
        }
        // row t holds signal[t - order..t], the first rows repeat row `order`
        let covariate = DMatrix::from_fn(n, order + 1, |t, k| {
            if k == order {
                1.0
            }
            else {
                signal
                    .get(t.max(order) - order + k)
                    .copied()
                    .unwrap_or(0.0)
            }
        });
        Self {
            order,
            response,
            covariate,
        }
    }

    pub fn order(&self) -> usize {
        self.order
    }
}

impl SegmentCost for CostAutoregressive {
    fn min_size(&self) -> usize {
        (self.order + 1).max(5)
    }

    fn cost(
        &self,
        start: usize,
        end: usize,
    ) -> f64 {
        let len = end - start;
        let x = self.covariate.rows(start, len).into_owned();
        let y = DVector::from_column_slice(&self.response[start..end]);
        match x.clone().svd(true, true).solve(&y, 1e-12) {
            Ok(beta) => (y - x * beta).norm_squared(),
            Err(e) => {
                trace!("least squares failed on [{start}, {end}): {e}");
                let mean = y.mean();
                y.iter().map(|v| (v - mean).powi(2)).sum()
            },
        }
    }
}

/// Breakpoint of the best two-segment split of a signal of length `n`, as
/// the start index of the second segment. `None` when no admissible
/// breakpoint exists.
pub fn best_single_break<C: SegmentCost>(
    cost: &C,
    n: usize,
    min_size: usize,
    jump: usize,
) -> Option<usize> {
    let min_size = min_size.max(cost.min_size()).max(1);
    let jump = jump.max(1);
    if n < 2 * min_size {
        return None;
    }
    let mut best: Option<(usize, f64)> = None;
    for k in (min_size..=n - min_size).filter(|k| k % jump == 0) {
        let total = cost.cost(0, k) + cost.cost(k, n);
        match best {
            Some((_, b)) if b <= total => {},
            _ => best = Some((k, total)),
        }
    }
    best.map(|(k, _)| k)
}
