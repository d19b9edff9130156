use thiserror::Error;

use super::surface::Mount;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriftError {
    /// The host did not provide a render target the engine draws into.
    #[error("required mount point missing: {0}")]
    MissingMount(Mount),

    #[error("save storage failed: {0}")]
    Storage(String),

    #[error("could not encode save: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for DriftError {
    fn from(e: serde_json::Error) -> Self {
        DriftError::Encode(e.to_string())
    }
}
