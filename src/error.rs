use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to the analytics service. None of these are retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("request to analytics service failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("analytics service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    Shape(String),
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("failed to write report to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to write console output: {0}")]
    Console(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid frontmatter schema: {0}")]
    Schema(String),

    #[error("failed to enumerate {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to write console output: {0}")]
    Console(#[from] std::io::Error),
}
