#![allow(dead_code)]

use dnbtools::prelude::*;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{
    Distribution,
    Normal,
};

/// Values with a median absolute deviation of exactly 0.6 around 0.
pub const BASE_PATTERN: [f64; 10] = [-1.5, -1.0, -0.6, -0.3, -0.1, 0.1, 0.3, 0.6, 1.0, 1.5];

pub fn sample_labels(
    n_ctrl: usize,
    n_expr: usize,
) -> Vec<String> {
    (0..n_ctrl)
        .map(|i| format!("ctrl_{i}"))
        .chain((0..n_expr).map(|i| format!("expr_{i}")))
        .collect()
}

/// Variables x (10 control + 10 experimental) samples with two planted
/// blocks. In the experimental group the first `block_sizes.0` variables
/// follow one latent profile amplified 3x, the next `block_sizes.1` follow
/// the reversed profile, amplified the same way. Every other value is an
/// independent shuffle of [`BASE_PATTERN`]; all values carry a little noise.
pub fn planted_blocks(
    seed: u64,
    n_vars: usize,
    block_sizes: (usize, usize),
) -> ObservationMatrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Normal::new(0.0, 0.02).unwrap();
    let shuffled = |rng: &mut StdRng| {
        let mut v = BASE_PATTERN.to_vec();
        v.shuffle(rng);
        v
    };
    let latent = shuffled(&mut rng);
    let reversed = latent.iter().rev().copied().collect::<Vec<_>>();

    let mut values = Array2::<f64>::zeros((n_vars, 20));
    for i in 0..n_vars {
        let ctrl = shuffled(&mut rng);
        let expr = if i < block_sizes.0 {
            latent.iter().map(|v| 3.0 * v).collect()
        }
        else if i < block_sizes.0 + block_sizes.1 {
            reversed.iter().map(|v| 3.0 * v).collect()
        }
        else {
            shuffled(&mut rng)
        };
        for (j, v) in ctrl.into_iter().chain(expr).enumerate() {
            values[[i, j]] = 5.0 + v + jitter.sample(&mut rng);
        }
    }
    ObservationMatrix::try_new(
        (0..n_vars).map(|i| format!("gene_{i:03}")).collect(),
        sample_labels(10, 10),
        values,
    )
    .unwrap()
}

/// Variables x (10 control + 10 experimental) samples: the first 15
/// variables form one block whose experimental values follow a shared
/// latent profile with 3x the control deviation, the remaining ones are
/// independent normal noise in both groups.
pub fn block_and_noise(seed: u64) -> ObservationMatrix {
    let n_vars = 100;
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter = Normal::new(0.0, 0.02).unwrap();
    let noise = Normal::new(0.0, 0.9).unwrap();
    let mut latent = BASE_PATTERN.to_vec();
    latent.shuffle(&mut rng);

    let mut values = Array2::<f64>::zeros((n_vars, 20));
    for i in 0..n_vars {
        let row = if i < 15 {
            let mut ctrl = BASE_PATTERN.to_vec();
            ctrl.shuffle(&mut rng);
            ctrl.into_iter()
                .chain(latent.iter().map(|v| 3.0 * v))
                .map(|v| v + jitter.sample(&mut rng))
                .collect::<Vec<_>>()
        }
        else {
            (0..20).map(|_| noise.sample(&mut rng)).collect()
        };
        for (j, v) in row.into_iter().enumerate() {
            values[[i, j]] = 5.0 + v;
        }
    }
    ObservationMatrix::try_new(gene_labels(0..n_vars), sample_labels(10, 10), values)
        .unwrap()
}

pub fn gene_labels(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("gene_{i:03}")).collect()
}

/// Steps x variables series whose variables start co-fluctuating with a
/// large, slowly decaying amplitude at `transition`; before it they carry
/// only small independent noise.
pub fn regime_shift_series(
    seed: u64,
    n_steps: usize,
    n_vars: usize,
    transition: usize,
) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.05).unwrap();
    Array2::from_shape_fn((n_steps, n_vars), |(t, i)| {
        let common = if t >= transition {
            let amplitude = 3.0 * (-((t - transition) as f64) / 60.0).exp();
            let sign = if t % 2 == 0 { 1.0 } else { -1.0 };
            amplitude * sign * (1.0 + 0.1 * i as f64)
        }
        else {
            0.0
        };
        common + noise.sample(&mut rng)
    })
}

/// Wraps a steps x variables array with step and variable labels.
pub fn labelled_series(values: Array2<f64>) -> ObservationMatrix {
    let (n_steps, n_vars) = values.dim();
    ObservationMatrix::try_new(
        (0..n_steps).map(|t| t.to_string()).collect(),
        (0..n_vars).map(|i| format!("x{i}")).collect(),
        values,
    )
    .unwrap()
}
