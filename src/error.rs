//! Error type shared by every stage of the crate.
//!
//! Two kinds are part of the analytical contract:
//!
//! - [`DnbError::Configuration`]: an option name that is not recognised, an
//!   unknown configuration key, or a dataset that cannot be classified into
//!   control/experimental groups.
//! - [`DnbError::InsufficientData`]: not enough samples (or time steps) to run
//!   the requested computation.
//!
//! The remaining variants wrap failures of the underlying crates.
//! Degenerate outcomes (too few candidates, singleton clusters) are values,
//! not errors.

use polars::error::PolarsError;

#[derive(Debug, thiserror::Error)]
pub enum DnbError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("insufficient data: {0}")]
    InsufficientData(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Polars(#[from] PolarsError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl DnbError {
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn insufficient_data<S: Into<String>>(msg: S) -> Self {
        Self::InsufficientData(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData(_))
    }
}

pub type Result<T, E = DnbError> = std::result::Result<T, E>;

/// Returns early with a [`DnbError::Configuration`], `anyhow::bail!` style.
#[macro_export]
macro_rules! config_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::DnbError::Configuration(format!($($arg)*)))
    };
}

/// Checks a condition and returns a [`DnbError::InsufficientData`] otherwise.
#[macro_export]
macro_rules! ensure_data {
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::error::DnbError::InsufficientData(format!($($arg)*)));
        }
    };
}
