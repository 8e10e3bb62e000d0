use ndarray::{
    Array1,
    ArrayView2,
    Axis,
};

use crate::data_structs::DeviationMetric;
use crate::utils::{
    median_abs_deviation,
    population_std,
};

impl DeviationMetric {
    /// Dispersion of a single variable.
    pub fn of(
        &self,
        values: &[f64],
    ) -> f64 {
        match self {
            DeviationMetric::Mad => median_abs_deviation(values),
            DeviationMetric::Std => population_std(values),
        }
    }
}

/// One dispersion value per row of a variables x samples matrix.
pub fn row_deviation(
    matrix: ArrayView2<f64>,
    metric: DeviationMetric,
) -> Array1<f64> {
    matrix
        .axis_iter(Axis(0))
        .map(|row| metric.of(&row.to_vec()))
        .collect()
}

/// Indices (in row order) of variables whose experimental deviation exceeds
/// `threshold` times the control deviation.
pub fn fluctuating_rows(
    dev_expr: &Array1<f64>,
    dev_ctrl: &Array1<f64>,
    threshold: f64,
) -> Vec<usize> {
    debug_assert_eq!(dev_expr.len(), dev_ctrl.len());
    dev_expr
        .iter()
        .zip(dev_ctrl.iter())
        .enumerate()
        .filter(|(_, (e, c))| **e > threshold * **c)
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use ndarray::{
        array,
        Array2,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{
        Distribution,
        Normal,
    };
    use rstest::rstest;

    use super::*;

    fn random_matrix(seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        Array2::from_shape_fn((30, 12), |_| normal.sample(&mut rng))
    }

    #[test]
    fn mad_and_std_per_row() {
        let m = array![[1.0, 2.0, 3.0, 4.0, 9.0], [2.0, 2.0, 2.0, 2.0, 2.0]];
        assert_eq!(row_deviation(m.view(), DeviationMetric::Mad), array![1.0, 0.0]);
        let std = row_deviation(m.view(), DeviationMetric::Std);
        assert_approx_eq!(std[0], 7.76f64.sqrt());
        assert_eq!(std[1], 0.0);
    }

    #[rstest]
    #[case(DeviationMetric::Mad)]
    #[case(DeviationMetric::Std)]
    fn shift_invariant_and_scale_equivariant(#[case] metric: DeviationMetric) {
        let m = random_matrix(7);
        let base = row_deviation(m.view(), metric);
        let shifted = row_deviation((&m + 13.5).view(), metric);
        let scaled = row_deviation((&m * 4.0).view(), metric);
        for i in 0..base.len() {
            assert_approx_eq!(shifted[i], base[i], 1e-9);
            assert_approx_eq!(scaled[i], 4.0 * base[i], 1e-9);
        }
    }

    #[test]
    fn candidate_set_shrinks_with_threshold() {
        let expr = row_deviation((random_matrix(1) * 2.0).view(), DeviationMetric::Mad);
        let ctrl = row_deviation(random_matrix(2).view(), DeviationMetric::Mad);
        let mut last = usize::MAX;
        for theta in [0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 5.0] {
            let n = fluctuating_rows(&expr, &ctrl, theta).len();
            assert!(n <= last, "theta={theta}: {n} > {last}");
            last = n;
        }
    }

    #[test]
    fn strict_inequality() {
        let expr = array![2.0, 2.1, 0.0];
        let ctrl = array![1.0, 1.0, 0.0];
        assert_eq!(fluctuating_rows(&expr, &ctrl, 2.0), vec![1]);
    }
}
