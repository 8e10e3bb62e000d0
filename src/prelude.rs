pub use crate::data_structs::{
    AggregatedResult,
    CpdStrategy,
    DeviationMetric,
    DnbRecord,
    DnbResult,
    GroupSplit,
    LinkageMethod,
    LinkageMetric,
    Normalization,
    ObservationMatrix,
    Padding,
    TimeKey,
};
pub use crate::error::DnbError;
pub use crate::io::{
    check_inputs,
    discover_files,
    read_and_split,
    read_series,
    read_table,
    write_aggregated,
    write_dnb_result,
    write_ews,
    write_matrix,
};
pub use crate::tools::tabular::{
    aggregate_runs,
    ClusterAssignment,
    Clusterer,
    DnbConfig,
    TabularRunConfig,
    TwoStepReport,
};
pub use crate::tools::timeseries::{
    analyse,
    detect_change_point,
    ChangePointEstimator,
    CpdConfig,
    EwsAnalysis,
    EwsConfig,
};
