//! Errors raised while turning raw inputs into a [`BuildRequest`](crate::BuildRequest).

use thiserror::Error;

/// Malformed input detected before any pipeline is built.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// The gerber layer specification is not a valid JSON object.
    #[error("invalid gerber layer specification {input:?}: {source}")]
    InvalidGerberLayers {
        /// The text exactly as it was supplied.
        input: String,
        #[source]
        source: serde_json::Error,
    },
}
