use std::collections::BTreeMap;

use itertools::Itertools;
use log::*;
use ndarray::{
    Array2,
    ArrayView2,
};

use crate::data_structs::{
    LinkageMethod,
    LinkageMetric,
};
use crate::utils::{
    rank_rows,
    row_correlation_matrix,
};

/// One agglomeration step. Node ids follow the usual dendrogram convention:
/// leaves are `0..n`, the node created by step `k` is `n + k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left:     usize,
    pub right:    usize,
    pub distance: f64,
    pub size:     usize,
}

/// Agglomerative clustering tree over `n` observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Linkage {
    n:      usize,
    merges: Vec<Merge>,
}

impl LinkageMethod {
    /// Lance-Williams update: distance between the cluster formed by `x` and
    /// `y` and another cluster `k`.
    fn update(
        &self,
        d_xk: f64,
        d_yk: f64,
        d_xy: f64,
        s_x: f64,
        s_y: f64,
        s_k: f64,
    ) -> f64 {
        match self {
            LinkageMethod::Single => d_xk.min(d_yk),
            LinkageMethod::Complete => d_xk.max(d_yk),
            LinkageMethod::Average => (s_x * d_xk + s_y * d_yk) / (s_x + s_y),
            LinkageMethod::Weighted => 0.5 * (d_xk + d_yk),
            LinkageMethod::Centroid => {
                let s_xy = s_x + s_y;
                ((s_x * d_xk.powi(2) + s_y * d_yk.powi(2)) / s_xy
                    - s_x * s_y * d_xy.powi(2) / s_xy.powi(2))
                .max(0.0)
                .sqrt()
            },
            LinkageMethod::Median => {
                (0.5 * d_xk.powi(2) + 0.5 * d_yk.powi(2) - 0.25 * d_xy.powi(2))
                    .max(0.0)
                    .sqrt()
            },
            LinkageMethod::Ward => {
                let total = s_x + s_y + s_k;
                (((s_x + s_k) * d_xk.powi(2) + (s_y + s_k) * d_yk.powi(2)
                    - s_k * d_xy.powi(2))
                    / total)
                    .max(0.0)
                    .sqrt()
            },
        }
    }
}

/// Nearest active neighbour of `slot`, smallest index on ties.
fn nearest(
    dist: &Array2<f64>,
    active: &[bool],
    slot: usize,
) -> (usize, f64) {
    let mut best = (usize::MAX, f64::INFINITY);
    for (other, &alive) in active.iter().enumerate() {
        if !alive || other == slot {
            continue;
        }
        let d = dist[[slot, other]];
        if d < best.1 || best.0 == usize::MAX {
            best = (other, d);
        }
    }
    best
}

impl Linkage {
    crate::getter_fn!(merges, Vec<Merge>);

    pub fn n_observations(&self) -> usize {
        self.n
    }

    /// Builds the tree from a symmetric distance matrix.
    ///
    /// Each active cluster caches its nearest neighbour; after a merge only
    /// clusters whose neighbour disappeared are rescanned, and clusters that
    /// got closer to the merged cluster adopt it.
    pub fn from_distances(
        distances: ArrayView2<f64>,
        method: LinkageMethod,
    ) -> Self {
        let n = distances.nrows();
        let mut dist = distances.to_owned();
        let mut active = vec![true; n];
        let mut size = vec![1usize; n];
        let mut node_id = (0..n).collect_vec();
        let mut merges = Vec::with_capacity(n.saturating_sub(1));

        let mut nn = (0..n)
            .map(|slot| nearest(&dist, &active, slot))
            .collect_vec();

        for step in 0..n.saturating_sub(1) {
            let x = (0..n)
                .filter(|&slot| active[slot])
                .min_by(|&a, &b| nn[a].1.total_cmp(&nn[b].1).then(a.cmp(&b)))
                .unwrap_or(0);
            let y = nn[x].0;
            let d_xy = nn[x].1;
            let (keep, drop) = if x < y { (x, y) } else { (y, x) };

            let s_x = size[keep] as f64;
            let s_y = size[drop] as f64;
            active[drop] = false;

            for k in 0..n {
                if !active[k] || k == keep {
                    continue;
                }
                let d_new = method.update(
                    dist[[keep, k]],
                    dist[[drop, k]],
                    d_xy,
                    s_x,
                    s_y,
                    size[k] as f64,
                );
                dist[[keep, k]] = d_new;
                dist[[k, keep]] = d_new;
            }

            let (left, right) = (
                node_id[keep].min(node_id[drop]),
                node_id[keep].max(node_id[drop]),
            );
            size[keep] += size[drop];
            node_id[keep] = n + step;
            merges.push(Merge {
                left,
                right,
                distance: d_xy,
                size: size[keep],
            });
            trace!("merge #{step}: {left} + {right} at {d_xy:.4}");

            for k in 0..n {
                if !active[k] || k == keep {
                    continue;
                }
                if nn[k].0 == keep || nn[k].0 == drop {
                    nn[k] = nearest(&dist, &active, k);
                }
                else if dist[[k, keep]] < nn[k].1 {
                    nn[k] = (keep, dist[[k, keep]]);
                }
            }
            nn[keep] = nearest(&dist, &active, keep);
        }

        Self { n, merges }
    }

    /// Flat clusters such that no two observations of a cluster have a
    /// cophenetic distance above `t`.
    ///
    /// A subtree forms one cluster when the highest merge inside it is at
    /// most `t`, which also covers trees with inversions. Labels start at 1
    /// and are numbered by first appearance in observation order.
    pub fn flat_clusters(
        &self,
        t: f64,
    ) -> Vec<usize> {
        let n = self.n;
        if n == 0 {
            return Vec::new();
        }
        let mut max_dist = vec![0.0f64; self.merges.len()];
        for (k, merge) in self.merges.iter().enumerate() {
            let child_max = |id: usize| if id < n { 0.0 } else { max_dist[id - n] };
            let height = merge
                .distance
                .max(child_max(merge.left))
                .max(child_max(merge.right));
            max_dist[k] = height;
        }

        let mut raw = vec![usize::MAX; n];
        let mut next_label = 0;
        let mut stack = match self.merges.len() {
            0 => (0..n).collect_vec(),
            len => vec![n + len - 1],
        };
        while let Some(node) = stack.pop() {
            if node < n {
                raw[node] = next_label;
                next_label += 1;
                continue;
            }
            let k = node - n;
            if max_dist[k] <= t {
                let mut leaves = vec![node];
                while let Some(id) = leaves.pop() {
                    if id < n {
                        raw[id] = next_label;
                    }
                    else {
                        leaves.push(self.merges[id - n].left);
                        leaves.push(self.merges[id - n].right);
                    }
                }
                next_label += 1;
            }
            else {
                stack.push(self.merges[k].right);
                stack.push(self.merges[k].left);
            }
        }

        let mut renumber = BTreeMap::new();
        raw.into_iter()
            .map(|label| {
                let next = renumber.len() + 1;
                *renumber.entry(label).or_insert(next)
            })
            .collect()
    }
}

/// Correlation distances (`1 - r`) between rows. Undefined correlations
/// (constant rows, rows with missing values) are treated as uncorrelated.
pub fn correlation_distances(matrix: ArrayView2<f64>) -> Array2<f64> {
    let mut corr = row_correlation_matrix(matrix);
    let mut n_undefined = 0usize;
    for ((i, j), r) in corr.indexed_iter_mut() {
        if i == j {
            *r = 0.0;
        }
        else if r.is_nan() {
            n_undefined += 1;
            *r = 1.0;
        }
        else {
            *r = (1.0 - *r).clamp(0.0, 2.0);
        }
    }
    if n_undefined > 0 {
        warn!(
            "{} correlations are undefined (constant rows or missing values), using \
             distance 1",
            n_undefined / 2
        );
    }
    corr
}

/// Cluster labels of the candidate variables together with the matrix the
/// correlations were computed on.
#[derive(Debug, Clone)]
pub struct ClusterAssignment {
    labels:       Vec<usize>,
    sizes:        BTreeMap<usize, usize>,
    preprocessed: Array2<f64>,
    linkage:      Linkage,
}

impl ClusterAssignment {
    crate::getter_fn!(labels, Vec<usize>);

    crate::getter_fn!(sizes, BTreeMap<usize, usize>);

    crate::getter_fn!(preprocessed, Array2<f64>);

    crate::getter_fn!(linkage, Linkage);

    pub fn n_clusters(&self) -> usize {
        self.sizes.len()
    }

    pub fn size_of(
        &self,
        cluster: usize,
    ) -> usize {
        self.sizes.get(&cluster).copied().unwrap_or(0)
    }

    /// Largest cluster; ties go to the smallest id, i.e. the cluster whose
    /// first member comes first.
    pub fn largest(&self) -> Option<(usize, usize)> {
        self.sizes
            .iter()
            .map(|(&id, &size)| (id, size))
            .fold(None, |best, (id, size)| {
                match best {
                    Some((_, best_size)) if best_size >= size => best,
                    _ => Some((id, size)),
                }
            })
    }

    /// Cluster sizes in descending order.
    pub fn sizes_descending(&self) -> Vec<usize> {
        self.sizes
            .values()
            .copied()
            .sorted_by(|a, b| b.cmp(a))
            .collect()
    }
}

/// Correlation-based hierarchical clustering of variables.
#[derive(Debug, Clone, Copy)]
pub struct Clusterer {
    pub metric:    LinkageMetric,
    pub method:    LinkageMethod,
    /// Correlation level; the dendrogram is cut at `1 - threshold`.
    pub threshold: f64,
}

impl Clusterer {
    pub fn new(
        metric: LinkageMetric,
        method: LinkageMethod,
        threshold: f64,
    ) -> Self {
        Self {
            metric,
            method,
            threshold,
        }
    }

    pub fn preprocess(
        &self,
        matrix: ArrayView2<f64>,
    ) -> Array2<f64> {
        match self.metric {
            LinkageMetric::Spearman => rank_rows(matrix),
            LinkageMetric::Pearson => matrix.to_owned(),
        }
    }

    pub fn cluster(
        &self,
        matrix: ArrayView2<f64>,
    ) -> ClusterAssignment {
        let preprocessed = self.preprocess(matrix);
        let distances = correlation_distances(preprocessed.view());
        let linkage = Linkage::from_distances(distances.view(), self.method);
        let labels = linkage.flat_clusters(1.0 - self.threshold);

        let mut sizes = BTreeMap::new();
        for &label in &labels {
            *sizes.entry(label).or_insert(0) += 1;
        }
        debug!(
            "{} variables clustered into {} clusters ({} linkage, {} metric)",
            labels.len(),
            sizes.len(),
            self.method,
            self.metric
        );

        ClusterAssignment {
            labels,
            sizes,
            preprocessed,
            linkage,
        }
    }
}
