//! Two-step DNB selection on cross-sectional data.
//!
//! 1. [`deviation`]: per-variable dispersion in each group and the
//!    deviation-ratio candidate filter.
//! 2. [`cluster`]: correlation-based agglomerative clustering of the
//!    candidates.
//! 3. [`select`]: cluster-size thresholding and intra-cluster correlation.
//!
//! [`DnbConfig::run`] chains the steps over one [`GroupSplit`] and
//! [`aggregate_runs`] repeats it over keyed datasets.
//!
//! [`GroupSplit`]: crate::data_structs::GroupSplit

mod aggregate;
pub mod cluster;
mod config;
pub mod deviation;
mod pipeline;
pub mod select;

pub use aggregate::aggregate_runs;
pub use cluster::{
    ClusterAssignment,
    Clusterer,
    Linkage,
};
pub use config::{
    DnbConfig,
    TabularRunConfig,
};
pub use pipeline::{
    TwoStepReport,
    MIN_GROUP_SAMPLES,
};
