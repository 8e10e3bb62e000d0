pub mod tabular;
pub mod timeseries;
