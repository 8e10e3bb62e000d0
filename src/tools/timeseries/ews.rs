use log::*;
use nalgebra::{
    DMatrix,
    SymmetricEigen,
};
use ndarray::{
    Array1,
    Array2,
    ArrayView2,
    Axis,
};
use rayon::prelude::*;

use super::pca::{
    principal_components,
    PCA_COMPONENTS,
};
use crate::data_structs::{
    Normalization,
    Padding,
};
use crate::error::Result;
use crate::utils::{
    population_std,
    THREAD_POOL,
};

fn rescale_columns<F>(
    series: ArrayView2<f64>,
    scale: F,
) -> Array2<f64>
where
    F: Fn(&[f64]) -> f64, {
    let mut out = series.to_owned();
    let mut n_constant = 0;
    for mut column in out.axis_iter_mut(Axis(1)) {
        let s = scale(&column.to_vec());
        if s > 0.0 && s.is_finite() {
            column.mapv_inplace(|v| v / s);
        }
        else {
            n_constant += 1;
        }
    }
    if n_constant > 0 {
        warn!("{n_constant} constant variables were not rescaled");
    }
    out
}

impl Normalization {
    /// Rescales a steps x variables series before windowing.
    ///
    /// `Std` divides every variable by its population standard deviation and
    /// `MinMax` by its range; neither centres the data. Constant variables
    /// are left as they are.
    pub fn apply(
        &self,
        series: ArrayView2<f64>,
    ) -> Result<Array2<f64>> {
        match self {
            Normalization::Straight => Ok(series.to_owned()),
            Normalization::Std => Ok(rescale_columns(series, population_std)),
            Normalization::MinMax => {
                Ok(rescale_columns(series, |column| {
                    let (min, max) = column
                        .iter()
                        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                            (lo.min(v), hi.max(v))
                        });
                    max - min
                }))
            },
            Normalization::Pca => principal_components(series, PCA_COMPONENTS),
        }
    }
}

/// Largest eigenvalue of the sample covariance (divisor `W - 1`) of one
/// window of `W` steps. With more variables than steps the `W x W` Gram
/// matrix is decomposed instead, it has the same non-zero spectrum.
pub fn dominant_covariance_eigenvalue(window: ArrayView2<f64>) -> f64 {
    let (w, p) = window.dim();
    if w < 2 {
        return 0.0;
    }
    let mean = window
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(p));
    let x = DMatrix::from_fn(w, p, |i, j| window[[i, j]] - mean[j]);
    let scatter = if p <= w {
        x.transpose() * &x
    }
    else {
        &x * x.transpose()
    };
    let cov = scatter / (w - 1) as f64;
    SymmetricEigen::new(cov)
        .eigenvalues
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Statistic of each complete window, one value per window end.
///
/// A single variable yields the windowed population standard deviation.
pub fn window_statistics(
    series: ArrayView2<f64>,
    window_size: usize,
) -> Vec<f64> {
    let (n_steps, n_vars) = series.dim();
    if n_steps < window_size {
        return Vec::new();
    }
    let n_windows = n_steps - window_size + 1;
    THREAD_POOL.install(|| {
        (0..n_windows)
            .into_par_iter()
            .map(|start| {
                let window = series.slice(ndarray::s![start..start + window_size, ..]);
                if n_vars == 1 {
                    population_std(&window.column(0).to_vec())
                }
                else {
                    dominant_covariance_eigenvalue(window)
                }
            })
            .collect()
    })
}

impl Padding {
    /// Aligns the per-window statistics with the input steps.
    pub fn apply(
        &self,
        statistics: Vec<f64>,
        n_steps: usize,
        window_size: usize,
    ) -> Vec<f64> {
        let (first, last) = match (statistics.first(), statistics.last()) {
            (Some(&f), Some(&l)) => (f, l),
            _ => return statistics,
        };
        match self {
            Padding::Valid => statistics,
            Padding::Online => {
                let mut out = vec![first; window_size - 1];
                out.extend(statistics);
                out
            },
            Padding::Same => {
                let left = window_size / 2;
                let right = n_steps - left - statistics.len();
                let mut out = vec![first; left];
                out.extend(statistics);
                out.extend(std::iter::repeat(last).take(right));
                out
            },
        }
    }

    /// Output length for a series of `n_steps`.
    pub fn output_len(
        &self,
        n_steps: usize,
        window_size: usize,
    ) -> usize {
        match self {
            Padding::Valid => n_steps + 1 - window_size,
            Padding::Online | Padding::Same => n_steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use ndarray::array;
    use rstest::rstest;

    use super::*;

    #[test]
    fn eigenvalue_of_perfectly_correlated_pair() {
        // Both variables equal [0, 1, 2, 3]: sample variance 5/3 each, the
        // covariance matrix has eigenvalues 10/3 and 0.
        let window = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        assert_approx_eq!(dominant_covariance_eigenvalue(window.view()), 10.0 / 3.0);
    }

    #[test]
    fn gram_matrix_matches_covariance() {
        let wide = Array2::from_shape_fn((4, 9), |(i, j)| ((i * 5 + j * 3) % 7) as f64);
        let tall = wide.t().to_owned();
        // Spectrum of the wide window through the 4x4 Gram matrix.
        let via_gram = dominant_covariance_eigenvalue(wide.view());
        let mean = wide.mean_axis(Axis(0)).unwrap();
        let centred = &wide - &mean;
        let cov = centred.t().dot(&centred) / 3.0;
        let direct = SymmetricEigen::new(DMatrix::from_fn(9, 9, |i, j| cov[[i, j]]))
            .eigenvalues
            .max();
        assert_approx_eq!(via_gram, direct, 1e-9);
        assert!(dominant_covariance_eigenvalue(tall.view()).is_finite());
    }

    #[test]
    fn single_variable_is_windowed_std() {
        let series = array![[1.0], [3.0], [1.0], [3.0], [10.0]];
        let stats = window_statistics(series.view(), 2);
        assert_eq!(stats, vec![1.0, 1.0, 1.0, 3.5]);
    }

    #[rstest]
    #[case(Padding::Valid, 10, 4, 7)]
    #[case(Padding::Online, 10, 4, 10)]
    #[case(Padding::Same, 10, 4, 10)]
    #[case(Padding::Same, 10, 5, 10)]
    fn padded_lengths(
        #[case] padding: Padding,
        #[case] n_steps: usize,
        #[case] window: usize,
        #[case] expected: usize,
    ) {
        let stats = (0..n_steps + 1 - window).map(|v| v as f64).collect::<Vec<_>>();
        let out = padding.apply(stats, n_steps, window);
        assert_eq!(out.len(), expected);
        assert_eq!(padding.output_len(n_steps, window), expected);
    }

    #[test]
    fn same_padding_is_centred() {
        let out = Padding::Same.apply(vec![1.0, 2.0, 3.0], 6, 4);
        assert_eq!(out, vec![1.0, 1.0, 1.0, 2.0, 3.0, 3.0]);
        let out = Padding::Same.apply(vec![1.0, 2.0], 6, 5);
        assert_eq!(out, vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn online_repeats_first_value() {
        let out = Padding::Online.apply(vec![4.0, 5.0], 5, 4);
        assert_eq!(out, vec![4.0, 4.0, 4.0, 4.0, 5.0]);
    }

    #[test]
    fn normalizations_rescale_columns() {
        let series = array![[1.0, 5.0], [3.0, 5.0], [5.0, 5.0]];
        let minmax = Normalization::MinMax.apply(series.view()).unwrap();
        assert_eq!(minmax.column(0).to_vec(), vec![0.25, 0.75, 1.25]);
        assert_eq!(minmax.column(1).to_vec(), vec![5.0, 5.0, 5.0]);
        let std = Normalization::Std.apply(series.view()).unwrap();
        assert_approx_eq!(population_std(&std.column(0).to_vec()), 1.0);
        assert_eq!(Normalization::Straight.apply(series.view()).unwrap(), series);
    }
}
