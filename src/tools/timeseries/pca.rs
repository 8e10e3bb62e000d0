use log::*;
use nalgebra::{
    DMatrix,
    SymmetricEigen,
};
use ndarray::{
    Array2,
    ArrayView2,
    Axis,
};

use crate::config_bail;
use crate::ensure_data;
use crate::error::Result;

/// Number of principal components kept by the PCA normalization.
pub const PCA_COMPONENTS: usize = 10;

/// Projects the centred series (steps x variables) onto its leading
/// principal axes.
///
/// Components are ordered by decreasing explained variance. Their sign is
/// arbitrary, which does not affect covariance eigenvalues downstream.
pub fn principal_components(
    series: ArrayView2<f64>,
    n_components: usize,
) -> Result<Array2<f64>> {
    let (n_steps, n_vars) = series.dim();
    if n_vars < n_components {
        config_bail!(
            "PCA normalization needs at least {n_components} variables, got {n_vars}"
        );
    }
    ensure_data!(
        n_steps >= n_components,
        "PCA normalization needs at least {n_components} time steps, got {n_steps}"
    );

    let mean = series
        .mean_axis(Axis(0))
        .unwrap_or_else(|| ndarray::Array1::zeros(n_vars));
    let centred = &series - &mean;

    let x = DMatrix::from_fn(n_steps, n_vars, |i, j| centred[[i, j]]);
    let cov = (x.transpose() * &x) / (n_steps.saturating_sub(1).max(1) as f64);
    let eigen = SymmetricEigen::new(cov);

    let mut order = (0..n_vars).collect::<Vec<_>>();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

    let total = eigen.eigenvalues.iter().sum::<f64>();
    let kept = order
        .iter()
        .take(n_components)
        .map(|&k| eigen.eigenvalues[k])
        .sum::<f64>();
    debug!(
        "PCA: {n_components} components explain {:.1}% of the variance",
        if total > 0.0 { 100.0 * kept / total } else { 0.0 }
    );

    let mut projected = Array2::<f64>::zeros((n_steps, n_components));
    for (c, &k) in order.iter().take(n_components).enumerate() {
        let axis = eigen.eigenvectors.column(k);
        for i in 0..n_steps {
            projected[[i, c]] = (0..n_vars).map(|j| centred[[i, j]] * axis[j]).sum();
        }
    }
    Ok(projected)
}
