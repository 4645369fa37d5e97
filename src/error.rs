//! Error types for the preview queue and batch loader.
//!
//! Neither subsystem surfaces these to its callers. They flow in from
//! collaborators (task bodies, fetch functions) and end up in the logs.

use thiserror::Error;

/// Failure reported by a preview task body.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("preview task failed: {0}")]
    Failed(String),

    #[error("preview task panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Failure reported by the external fetch collaborator for one key.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch failed for {key}: {reason}")]
    Failed { key: String, reason: String },

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    pub fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Label used for the fetch outcome metric.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "failed",
            Self::Other(_) => "other",
        }
    }
}

/// Errors loading configuration from a file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display_names_key() {
        let err = FetchError::failed("chan1", "404");
        assert_eq!(err.to_string(), "fetch failed for chan1: 404");
        assert_eq!(err.kind(), "failed");
    }

    #[test]
    fn boxed_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err: TaskError = TaskError::from(Box::new(io) as Box<dyn std::error::Error + Send + Sync>);
        assert_eq!(err.to_string(), "disk");
    }
}
