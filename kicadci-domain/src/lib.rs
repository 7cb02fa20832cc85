//! Domain logic: turn a build request into a deterministic pipeline.
//!
//! This crate owns *what* runs and in which order. It does not own *how* steps
//! are executed; that's the `kicadci-core` crate.

pub mod layers;
mod planner;

pub use layers::{Flag, Layer, LayerMask, LayerSelectionRule, WIRED_FLAGS, board_file};
pub use planner::{Planner, Toolchain};
