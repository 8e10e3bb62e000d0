//! This module contains utility functions and helper macros used throughout
//! the dnbtools crate.
//!
//! Key functionalities include:
//!
//! - Statistical helpers: medians, median absolute deviation, population
//!   standard deviation, within-row average ranks, Pearson correlation and
//!   row-wise correlation matrices.
//! - The crate-wide rayon thread pool, sized by the `DNB_NUM_THREADS`
//!   environment variable.
//! - Macros for common struct operations (getter functions, builder-style
//!   `with_*` methods).

use once_cell::sync::Lazy;
use rayon::{
    ThreadPool,
    ThreadPoolBuilder,
};

mod stats;
pub use stats::*;

pub static THREAD_POOL: Lazy<ThreadPool> = Lazy::new(|| {
    let num_threads: Option<usize> = std::env::var("DNB_NUM_THREADS")
        .ok()
        .and_then(|str| str.parse::<usize>().ok());
    ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .expect("Failed to create thread pool")
});

pub fn n_threads() -> usize {
    THREAD_POOL.current_num_threads()
}

#[macro_export]
macro_rules! getter_fn {
    ($field_name: ident, $field_type: ty) => {
        pub fn $field_name(&self) -> &$field_type {
            &self.$field_name
        }
    };
}

#[macro_export]
macro_rules! with_field_fn {
    ($field_name: ident, $field_type: ty) => {
        paste::paste! {
            pub fn [<with_$field_name>](mut self, value: $field_type) -> Self {
            self.$field_name = value;
            self
            }
        }
    };
}
