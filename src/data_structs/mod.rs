//! This module contains the core data structures used throughout the
//! `dnbtools` crate.
//!
//! - [`ObservationMatrix`]: labelled variables x samples matrix, immutable
//!   once loaded, and [`GroupSplit`], its control/experimental column split.
//! - [`DnbResult`] and [`DnbRecord`]: the result table of one two-step run,
//!   and [`AggregatedResult`] for runs tagged with a [`TimeKey`].
//! - Closed option enums selected by name in configurations:
//!   [`DeviationMetric`], [`LinkageMetric`], [`LinkageMethod`],
//!   [`Normalization`], [`Padding`] and [`CpdStrategy`].

mod enums;
mod matrix;
mod result;

pub use enums::{
    CpdStrategy,
    DeviationMetric,
    LinkageMethod,
    LinkageMetric,
    Normalization,
    Padding,
};
pub use matrix::{
    GroupSplit,
    ObservationMatrix,
};
pub use result::{
    AggregatedResult,
    DnbRecord,
    DnbResult,
    TimeKey,
};
