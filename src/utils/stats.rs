use log::*;
use ndarray::{
    Array2,
    ArrayView1,
    ArrayView2,
    Axis,
};
use rayon::prelude::*;
use statrs::statistics::{
    Data,
    Median,
    OrderStatistics,
    RankTieBreaker,
    Statistics,
};

use super::THREAD_POOL;

fn present(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .collect()
}

/// Median of a sample. Even-sized samples average the two middle values.
/// Missing values (NaN) are skipped; returns NaN when nothing is left.
pub fn median(values: &[f64]) -> f64 {
    let values = present(values);
    if values.is_empty() {
        return f64::NAN;
    }
    Data::new(values).median()
}

/// Median absolute deviation around the median (unscaled). Missing values
/// are skipped.
pub fn median_abs_deviation(values: &[f64]) -> f64 {
    let center = median(values);
    let deviations = values
        .iter()
        .map(|v| (v - center).abs())
        .collect::<Vec<_>>();
    median(&deviations)
}

/// Standard deviation with divisor `n`. Missing values are skipped.
pub fn population_std(values: &[f64]) -> f64 {
    let values = present(values);
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().population_std_dev()
}

/// Index of the first maximum. NaN values are never selected unless the
/// slice contains nothing else.
pub fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, &v)| {
            match best {
                None => Some((idx, v)),
                Some((_, b)) if b.is_nan() && !v.is_nan() => Some((idx, v)),
                Some((_, b)) if v > b => Some((idx, v)),
                keep => keep,
            }
        })
        .map(|(idx, _)| idx)
}

/// Ranks starting from 1, ties share the average of the ranks they span.
/// Missing values (NaN) get a NaN rank and do not count towards the ranks
/// of the others.
pub fn average_ranks(values: ArrayView1<f64>) -> Vec<f64> {
    let (present_idx, present_values): (Vec<usize>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_nan())
        .map(|(idx, v)| (idx, *v))
        .unzip();

    let mut ranks = vec![f64::NAN; values.len()];
    if present_values.is_empty() {
        return ranks;
    }
    let present_ranks = Data::new(present_values).ranks(RankTieBreaker::Average);
    for (idx, rank) in present_idx.into_iter().zip(present_ranks) {
        ranks[idx] = rank;
    }
    ranks
}

/// Replaces every row by its within-row average ranks.
pub fn rank_rows(matrix: ArrayView2<f64>) -> Array2<f64> {
    let mut ranked = Array2::<f64>::zeros(matrix.raw_dim());
    for (row, mut out) in matrix
        .axis_iter(Axis(0))
        .zip(ranked.axis_iter_mut(Axis(0)))
    {
        for (dst, src) in out.iter_mut().zip(average_ranks(row)) {
            *dst = src;
        }
    }
    ranked
}

/// Calculates Pearson correlation coefficient between two variables.
///
/// Returns NaN when either variable is constant, mirroring the usual
/// correlation-matrix convention.
pub fn pearson_r(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
) -> f64 {
    if x.len() != y.len() {
        warn!(
            "Cannot calculate Pearson's r: x length ({}) doesn't match y \
             length ({})",
            x.len(),
            y.len()
        );
        return f64::NAN;
    }

    if x.is_empty() {
        warn!("Cannot calculate Pearson's r: empty arrays");
        return f64::NAN;
    }

    let x_mean = x.iter().mean();
    let y_mean = y.iter().mean();

    // Calculate numerator (covariance)
    let numerator = x
        .iter()
        .zip(y.iter())
        .map(|(valx, valy)| (valx - x_mean) * (valy - y_mean))
        .sum::<f64>();

    // Calculate denominator (product of standard deviations)
    let denominator = {
        let x_dev: f64 = x.iter().map(|valx| (valx - x_mean).powi(2)).sum();
        let y_dev: f64 = y.iter().map(|valy| (valy - y_mean).powi(2)).sum();
        (x_dev * y_dev).sqrt()
    };

    if denominator == 0.0 {
        trace!("Denominator is zero, returning NaN");
        return f64::NAN;
    }

    (numerator / denominator).clamp(-1.0, 1.0)
}

/// Pearson correlation between every pair of rows. The diagonal is 1 for
/// non-constant rows and NaN for constant ones.
pub fn row_correlation_matrix(matrix: ArrayView2<f64>) -> Array2<f64> {
    let n = matrix.nrows();
    let upper = THREAD_POOL.install(|| {
        (0..n)
            .into_par_iter()
            .map(|i| {
                (i..n)
                    .map(|j| pearson_r(matrix.row(i), matrix.row(j)))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    });

    let mut corr = Array2::<f64>::zeros((n, n));
    for (i, row) in upper.into_iter().enumerate() {
        for (offset, r) in row.into_iter().enumerate() {
            corr[[i, i + offset]] = r;
            corr[[i + offset, i]] = r;
        }
    }
    corr
}

/// Mean of the strictly upper triangle of a square matrix. NaN when the
/// matrix has fewer than two rows.
pub fn upper_triangle_mean(matrix: ArrayView2<f64>) -> f64 {
    let n = matrix.nrows();
    if n < 2 {
        return f64::NAN;
    }
    let values = (0..n - 1)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .map(|(i, j)| matrix[[i, j]])
        .collect::<Vec<_>>();
    values.iter().mean()
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use ndarray::{
        array,
        Array1,
        Array2,
    };

    use super::*;

    #[test]
    fn median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn missing_values_are_skipped() {
        assert_eq!(median(&[f64::NAN, 3.0, 1.0, 2.0]), 2.0);
        assert_eq!(
            median_abs_deviation(&[1.0, f64::NAN, 2.0, 3.0, 4.0, 9.0]),
            1.0
        );
        assert_approx_eq!(population_std(&[2.0, 4.0, f64::NAN]), 1.0);
        assert!(median(&[f64::NAN, f64::NAN]).is_nan());
    }

    #[test]
    fn mad_matches_hand_computation() {
        // median = 3, |x - 3| = [2, 1, 0, 1, 6] -> median 1
        assert_eq!(median_abs_deviation(&[1.0, 2.0, 3.0, 4.0, 9.0]), 1.0);
    }

    #[test]
    fn population_std_uses_n() {
        assert_approx_eq!(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
    }

    #[test]
    fn argmax_first_occurrence() {
        assert_eq!(argmax(&[1.0, 5.0, 2.0, 5.0]), Some(1));
        assert_eq!(argmax(&[f64::NAN, 0.5]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn ranks_average_ties() {
        let row = array![10.0, 20.0, 10.0, 30.0];
        assert_eq!(average_ranks(row.view()), vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn missing_cells_get_nan_rank() {
        let row = array![10.0, f64::NAN, 20.0, 10.0, f64::NAN];
        let ranks = average_ranks(row.view());
        assert_eq!(ranks[0], 1.5);
        assert_eq!(ranks[2], 3.0);
        assert_eq!(ranks[3], 1.5);
        assert!(ranks[1].is_nan() && ranks[4].is_nan());
        assert!(average_ranks(array![f64::NAN, f64::NAN].view())
            .iter()
            .all(|r| r.is_nan()));
    }

    #[test]
    fn ranking_rows_with_many_gaps() {
        let values = (0..64)
            .map(|i| if i % 5 == 0 { f64::NAN } else { ((i * 37) % 11) as f64 })
            .collect::<Vec<_>>();
        let matrix = Array2::from_shape_fn((200, 64), |(r, c)| values[(c + r) % 64]);
        let ranked = rank_rows(matrix.view());
        for (row, ranks) in matrix.rows().into_iter().zip(ranked.rows()) {
            let n_present = row.iter().filter(|v| !v.is_nan()).count() as f64;
            let total = ranks.iter().filter(|r| !r.is_nan()).sum::<f64>();
            assert_approx_eq!(total, n_present * (n_present + 1.0) / 2.0);
        }
    }

    #[test]
    fn pearson_r_test() {
        let x = Array1::from(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = Array1::from(vec![6.0, 7.0, 8.0, 9.0, 10.0, 11.0]);
        assert_approx_eq!(pearson_r(x.view(), y.view()), 1f64);
        let flat = Array1::from(vec![1.0; 6]);
        assert!(pearson_r(x.view(), flat.view()).is_nan());
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let m = array![
            [1.0, 2.0, 3.0, 4.0],
            [2.0, 4.0, 6.0, 8.5],
            [4.0, 3.0, 2.0, 1.0]
        ];
        let corr = row_correlation_matrix(m.view());
        for i in 0..3 {
            assert_approx_eq!(corr[[i, i]], 1.0);
            for j in 0..3 {
                assert_eq!(corr[[i, j]], corr[[j, i]]);
            }
        }
        assert_approx_eq!(corr[[0, 2]], -1.0);
    }

    #[test]
    fn upper_triangle_mean_counts_pairs_once() {
        let m = array![[1.0, 0.2, 0.4], [0.2, 1.0, 0.6], [0.4, 0.6, 1.0]];
        assert_approx_eq!(upper_triangle_mean(m.view()), 0.4);
        assert!(upper_triangle_mean(array![[1.0]].view()).is_nan());
    }
}
