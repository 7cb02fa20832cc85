//! Embeddable core library for kicadci.
//!
//! Provides a clap-free entry point that plans a [`BuildRequest`] and runs the
//! resulting pipeline step by step, stopping at the first failure.
//!
//! # Port traits
//!
//! Step execution is abstracted behind [`StepRunner`](ports::StepRunner) in
//! [`ports`]. The [`adapters`] module provides the process-spawning default.
//!
//! # Entry points
//!
//! - [`run_pipeline`](pipeline::run_pipeline): execute an already planned pipeline
//! - [`run_request`](pipeline::run_request): plan a request, then execute it
//!
//! [`BuildRequest`]: kicadci_types::BuildRequest

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export so embedders don't need kicadci-domain / kicadci-types directly.
pub use kicadci_domain::{Planner, Toolchain};
pub use kicadci_types::{BuildRequest, ConfigurationError, Pipeline, Step};
