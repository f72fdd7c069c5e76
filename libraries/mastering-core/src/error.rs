//! Error types for preset registration

use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, PresetError>;

/// Errors raised while building a preset catalog
///
/// Lookups never fail; these only surface when presets are registered at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PresetError {
    /// A preset field is out of range
    #[error("Invalid preset '{id}': {reason}")]
    Invalid { id: String, reason: String },

    /// The configured default preset id isn't registered
    #[error("Unknown default preset: {0}")]
    UnknownDefault(String),
}

impl PresetError {
    pub(crate) fn invalid(id: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}
