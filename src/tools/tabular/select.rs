use log::*;
use ndarray::{
    ArrayView2,
    Axis,
};

use super::cluster::ClusterAssignment;
use crate::utils::{
    row_correlation_matrix,
    upper_triangle_mean,
};

/// Size threshold `thres * max_cluster_size`.
pub fn size_threshold(
    assignment: &ClusterAssignment,
    thres: f64,
) -> f64 {
    let max_size = assignment
        .largest()
        .map(|(_, size)| size)
        .unwrap_or(0);
    thres * max_size as f64
}

/// Ids of the clusters strictly larger than the size threshold, ascending.
pub fn select_clusters(
    assignment: &ClusterAssignment,
    thres: f64,
) -> Vec<usize> {
    let tau = size_threshold(assignment, thres);
    let selected = assignment
        .sizes()
        .iter()
        .filter(|(_, &size)| size as f64 > tau)
        .map(|(&id, _)| id)
        .collect::<Vec<_>>();
    debug!(
        "Cluster size threshold {tau:.2}: {} of {} clusters retained",
        selected.len(),
        assignment.n_clusters()
    );
    selected
}

/// Mean pairwise correlation among `members` (row indices of
/// `preprocessed`). Each unordered pair is counted once; singletons have no
/// score.
pub fn intra_cluster_correlation(
    preprocessed: ArrayView2<f64>,
    members: &[usize],
) -> Option<f64> {
    if members.len() < 2 {
        return None;
    }
    let rows = preprocessed.select(Axis(0), members);
    Some(upper_triangle_mean(row_correlation_matrix(rows.view()).view()))
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;
    use itertools::Itertools;
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

    use super::*;
    use crate::data_structs::{
        LinkageMethod,
        LinkageMetric,
    };
    use crate::tools::tabular::cluster::Clusterer;
    use crate::utils::pearson_r;

    fn assignment(seed: u64) -> ClusterAssignment {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let base = Array2::from_shape_fn((3, 10), |_| normal.sample(&mut rng));
        // Three noisy families of different sizes plus free rows.
        let m = Array2::from_shape_fn((25, 10), |(i, j)| {
            let noise = 0.1 * normal.sample(&mut rng);
            match i {
                0..=9 => base[[0, j]] + noise,
                10..=15 => base[[1, j]] + noise,
                16..=18 => base[[2, j]] + noise,
                _ => normal.sample(&mut rng),
            }
        });
        Clusterer::new(LinkageMetric::Pearson, LinkageMethod::Average, 0.75).cluster(m.view())
    }

    #[test]
    fn retained_set_shrinks_with_threshold() {
        let assignment = assignment(11);
        let mut last = usize::MAX;
        for thres in [0.0, 0.1, 0.3, 0.5, 0.7, 0.9, 0.99] {
            let retained = select_clusters(&assignment, thres)
                .iter()
                .map(|&id| assignment.size_of(id))
                .sum::<usize>();
            assert!(retained <= last, "thres={thres}: {retained} > {last}");
            last = retained;
        }
    }

    #[test]
    fn largest_cluster_always_retained_below_one() {
        let assignment = assignment(3);
        let (largest, _) = assignment.largest().unwrap();
        assert!(select_clusters(&assignment, 0.99).contains(&largest));
        assert!(select_clusters(&assignment, 1.0).is_empty());
    }

    #[test]
    fn singleton_has_no_score() {
        let m = array![[1.0, 2.0, 3.0], [3.0, 1.0, 2.0]];
        assert_eq!(intra_cluster_correlation(m.view(), &[1]), None);
    }

    #[test]
    fn score_is_mean_of_unique_pairs() {
        let m = array![
            [1.0, 2.0, 3.0, 4.0, 5.0],
            [2.0, 1.0, 4.0, 3.0, 6.0],
            [5.0, 3.0, 4.0, 1.0, 2.0],
            [0.0, 0.0, 1.0, 0.0, 0.0]
        ];
        let members = [0, 1, 2, 3];
        let pairs = members
            .iter()
            .tuple_combinations()
            .map(|(&a, &b)| pearson_r(m.row(a), m.row(b)))
            .collect_vec();
        assert_eq!(pairs.len(), 6);
        let expected = pairs.iter().sum::<f64>() / 6.0;
        assert_approx_eq!(intra_cluster_correlation(m.view(), &members).unwrap(), expected);
    }
}
