//! Pipeline error types

use crate::job::JobStatus;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, MasteringError>;

/// Failures of a single renderer invocation
#[derive(Error, Debug)]
pub enum RenderError {
    /// The renderer process couldn't be started
    #[error("Failed to start render engine: {0}")]
    Spawn(#[from] std::io::Error),

    /// The renderer exited unsuccessfully
    #[error("Render engine exited with {status}: {diagnostic}")]
    Failed { status: String, diagnostic: String },

    /// The renderer reported success but wrote nothing
    #[error("Render engine produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
}

impl RenderError {
    /// Diagnostic text from the renderer, if it produced any
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::Failed { diagnostic, .. } => Some(diagnostic),
            _ => None,
        }
    }
}

/// Fatal errors of a mastering job
#[derive(Error, Debug)]
pub enum MasteringError {
    /// The renderer failed; the job can't produce a verified master
    #[error("Render engine error during {stage}: {source}")]
    RenderEngine {
        stage: JobStatus,
        #[source]
        source: RenderError,
    },

    /// A render call didn't finish within the configured limit
    #[error("Render timed out during {stage} after {}s", .after.as_secs())]
    Timeout { stage: JobStatus, after: Duration },

    /// The caller cancelled the job
    #[error("Mastering cancelled during {stage}")]
    Cancelled { stage: JobStatus },

    /// The input file doesn't exist
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// Filesystem operation on a job artifact failed
    #[error("IO error during {stage}: {source}")]
    Io {
        stage: JobStatus,
        #[source]
        source: std::io::Error,
    },
}

/// Out-of-range pipeline settings
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Invalid mastering settings: {0}")]
pub struct SettingsError(pub String);

impl MasteringError {
    /// Stage the job was in when it failed
    pub fn stage(&self) -> Option<JobStatus> {
        match self {
            Self::RenderEngine { stage, .. }
            | Self::Timeout { stage, .. }
            | Self::Cancelled { stage }
            | Self::Io { stage, .. } => Some(*stage),
            Self::InputNotFound(_) => None,
        }
    }

    /// Renderer diagnostic text for operators
    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            Self::RenderEngine { source, .. } => source.diagnostic(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_error_carries_diagnostic() {
        let err = MasteringError::RenderEngine {
            stage: JobStatus::RenderPrimary,
            source: RenderError::Failed {
                status: "exit status: 1".to_string(),
                diagnostic: "input.wav: Invalid data found when processing input".to_string(),
            },
        };

        assert_eq!(err.stage(), Some(JobStatus::RenderPrimary));
        assert_eq!(
            err.diagnostic(),
            Some("input.wav: Invalid data found when processing input")
        );
        let message = err.to_string();
        assert!(message.contains("render_primary"));
        assert!(message.contains("Invalid data found"));
    }

    #[test]
    fn test_timeout_message() {
        let err = MasteringError::Timeout {
            stage: JobStatus::CorrectivePass,
            after: Duration::from_secs(600),
        };
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Render timed out during corrective_pass after 600s"
        );
    }
}
