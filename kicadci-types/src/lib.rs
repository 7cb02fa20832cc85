//! Shared types for the kicadci workspace.
//!
//! # Design constraints
//! - Request types are immutable once built and consumed by a single run.
//! - `Pipeline` and `Step` are serialized by `kicadci plan --format json`;
//!   prefer adding variants over changing their wire shape.

pub mod error;
pub mod pipeline;
pub mod request;

pub use error::ConfigurationError;
pub use pipeline::{CommandDescriptor, Pipeline, Step};
pub use request::{BuildRequest, Client, LayerSelection, Project, RequestedArtifacts};
