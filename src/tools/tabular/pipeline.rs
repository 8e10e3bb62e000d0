use itertools::Itertools;
use log::*;
use ndarray::{
    Array1,
    Array2,
    Axis,
};

use super::cluster::{
    ClusterAssignment,
    Clusterer,
};
use super::config::DnbConfig;
use super::deviation::{
    fluctuating_rows,
    row_deviation,
};
use super::select::{
    intra_cluster_correlation,
    select_clusters,
    size_threshold,
};
use crate::data_structs::{
    DnbRecord,
    DnbResult,
    GroupSplit,
};
use crate::ensure_data;
use crate::error::Result;

/// Minimum number of samples in each group.
pub const MIN_GROUP_SAMPLES: usize = 4;

/// Outcome of one two-step run, together with the intermediate state the
/// run narrates.
#[derive(Debug, Clone)]
pub struct TwoStepReport {
    result:          DnbResult,
    n_candidates:    usize,
    cluster_sizes:   Vec<usize>,
    size_threshold:  f64,
    /// Labels of the candidates, in row order.
    candidates:      Vec<String>,
    /// Candidate rows of the experimental group as used for correlations.
    preprocessed:    Option<Array2<f64>>,
}

impl TwoStepReport {
    crate::getter_fn!(result, DnbResult);

    crate::getter_fn!(cluster_sizes, Vec<usize>);

    crate::getter_fn!(candidates, Vec<String>);

    crate::getter_fn!(preprocessed, Option<Array2<f64>>);

    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    pub fn size_threshold(&self) -> f64 {
        self.size_threshold
    }

    pub fn into_result(self) -> DnbResult {
        self.result
    }

    fn degenerate(
        candidates: Vec<String>,
        output_metrics: bool,
    ) -> Self {
        Self {
            result: DnbResult::empty(output_metrics),
            n_candidates: candidates.len(),
            cluster_sizes: Vec::new(),
            size_threshold: 0.0,
            candidates,
            preprocessed: None,
        }
    }
}

impl DnbConfig {
    /// Clusterer configured from the linkage settings.
    pub fn clusterer(&self) -> Clusterer {
        Clusterer::new(
            self.linkage_metric,
            self.linkage_method,
            self.linkage_threshold,
        )
    }

    /// Runs the two-step selection on one dataset.
    ///
    /// Fewer than two candidates after deviation filtering yields an empty
    /// result, not an error.
    pub fn run(
        &self,
        split: &GroupSplit,
    ) -> Result<TwoStepReport> {
        let ctrl = split.control();
        let expr = split.experimental();
        info!(
            "Control group: {} samples, experimental group: {} samples, {} variables",
            ctrl.ncols(),
            expr.ncols(),
            ctrl.nrows()
        );
        ensure_data!(
            ctrl.ncols() >= MIN_GROUP_SAMPLES && expr.ncols() >= MIN_GROUP_SAMPLES,
            "the number of samples in each group must be {MIN_GROUP_SAMPLES} or more \
             (control: {}, experimental: {})",
            ctrl.ncols(),
            expr.ncols()
        );

        let dev_ctrl = row_deviation(ctrl.view(), self.deviation_metric);
        let dev_expr = row_deviation(expr.view(), self.deviation_metric);
        let candidates = fluctuating_rows(&dev_expr, &dev_ctrl, self.thres_gene_filtering);
        let candidate_labels = candidates
            .iter()
            .map(|&i| split.row_labels()[i].clone())
            .collect_vec();
        info!(
            "{} DNB candidates (deviation ratio > {})",
            candidates.len(),
            self.thres_gene_filtering
        );
        if candidates.len() < 2 {
            warn!("Fewer than 2 DNB candidates, nothing to cluster");
            return Ok(TwoStepReport::degenerate(
                candidate_labels,
                self.output_metrics,
            ));
        }

        let candidate_rows = expr.values().select(Axis(0), &candidates);
        let assignment = self.clusterer().cluster(candidate_rows.view());
        let cluster_sizes = assignment.sizes_descending();
        info!(
            "{} clusters, largest sizes: {:?}",
            cluster_sizes.len(),
            cluster_sizes.iter().take(5).collect_vec()
        );

        let tau = size_threshold(&assignment, self.thres_cluster_selection);
        let selected = select_clusters(&assignment, self.thres_cluster_selection);
        info!(
            "Cluster size threshold: {tau:.2}, {} clusters selected",
            selected.len()
        );

        let records = self.score(
            &assignment,
            &selected,
            &candidates,
            &candidate_labels,
            &dev_expr,
            &dev_ctrl,
        );
        let result = DnbResult::new(records, self.output_metrics);
        info!("{} DNB variables selected", result.len());

        Ok(TwoStepReport {
            result,
            n_candidates: candidates.len(),
            cluster_sizes,
            size_threshold: tau,
            candidates: candidate_labels,
            preprocessed: Some(assignment.preprocessed().clone()),
        })
    }

    fn score(
        &self,
        assignment: &ClusterAssignment,
        selected: &[usize],
        candidates: &[usize],
        candidate_labels: &[String],
        dev_expr: &Array1<f64>,
        dev_ctrl: &Array1<f64>,
    ) -> Vec<DnbRecord> {
        let mut records = Vec::new();
        for &cluster in selected {
            let members = assignment
                .labels()
                .iter()
                .positions(|&label| label == cluster)
                .collect_vec();
            let cor_mean =
                intra_cluster_correlation(assignment.preprocessed().view(), &members);
            debug!(
                "cluster {cluster}: {} members, mean correlation {:?}",
                members.len(),
                cor_mean
            );
            for member in members {
                let row = candidates[member];
                records.push(DnbRecord {
                    dnb: candidate_labels[member].clone(),
                    cluster,
                    clustersize: assignment.size_of(cluster),
                    dev_expr: dev_expr[row],
                    dev_ctrl: dev_ctrl[row],
                    cor_mean,
                });
            }
        }
        records
    }
}
