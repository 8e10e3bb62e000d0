//! # dnbtools
//!
//! `dnbtools` detects Dynamic Network Biomarkers (DNB): groups of variables
//! that fluctuate strongly and in concert as a system approaches a critical
//! transition. It works on two kinds of data.
//!
//! * **Tabular data**: a variables x samples matrix whose columns are split
//!   into a control and an experimental group. The two-step selection keeps
//!   variables whose deviation grows in the experimental group, clusters them
//!   by correlation and retains the dominant clusters.
//! * **Time series**: a steps x variables series. The early-warning signal is
//!   the largest eigenvalue of the sliding-window covariance; a change point
//!   is located in the part of the signal leading up to its maximum.
//!
//! Number of threads used for inner numerical loops can be configured with
//! the `DNB_NUM_THREADS` environment variable.
//!
//! ## Structure
//!
//! * [`data_structs`]: labelled matrices, group splits, result tables and the
//!   option enums selected by name in configurations.
//! * [`tools`]: the tabular pipeline ([`tools::tabular`]) and the time-series
//!   analysis ([`tools::timeseries`]).
//! * [`io`]: CSV reading, file discovery and result export.
//! * [`utils`]: statistics helpers and the thread pool.
//!
//! ## Usage
//!
//! ### Two-step selection over a series of files
//!
//! ```no_run
//! use dnbtools::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = discover_files("input", "sample_data")?;
//!     let datasets = check_inputs(&files, "ctrl", "expr", false)?;
//!
//!     let config = DnbConfig::default().with_output_metrics(true);
//!     let result = aggregate_runs(&config, datasets.iter().map(|(k, s)| (k, s)), |_| {})?;
//!
//!     write_aggregated(&result, std::fs::File::create("output.csv")?)?;
//!     Ok(())
//! }
//! ```
//!
//! ### Early-warning signal of a time series
//!
//! ```no_run
//! use dnbtools::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let series = read_series("series.csv")?;
//!     let ews_config = EwsConfig::default().with_window_size(50);
//!     let cpd_config = CpdConfig::default().with_strategy(CpdStrategy::Otsu);
//!
//!     let analysis = analyse(series.view(), &ews_config, &cpd_config)?;
//!     println!("change point at step {}", analysis.change_point);
//!
//!     let dataset = analysis.windowed_dataset(&series, ews_config.window_size)?;
//!     write_matrix(&dataset, std::fs::File::create("DNB_series.csv")?)?;
//!     Ok(())
//! }
//! ```

pub mod data_structs;
pub mod error;
pub mod io;
pub mod prelude;
pub mod tools;
pub mod utils;

pub use error::{
    DnbError,
    Result,
};
