//! Padded density grids and the evaluators that fill them.
#![forbid(unsafe_code)]

mod evaluator;
mod grid;

pub use evaluator::{CpuDensityEvaluator, DensityEvaluator};
pub use grid::{DensityGrid, SENTINEL_DENSITY};
