use reqwest::StatusCode;
use thiserror::Error;

/// Why a single upstream call produced nothing usable.
///
/// The variants exist for logging only. Aggregation code collapses all of
/// them into "no data" and never hands them to a caller.
#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("Upstream unreachable at {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Upstream returned {status} for {url}")]
    Status { url: String, status: StatusCode },

    #[error("Malformed upstream payload from {url}: {message}")]
    Decode { url: String, message: String },
}

impl UpstreamError {
    pub fn url(&self) -> &str {
        match self {
            UpstreamError::Unreachable { url, .. }
            | UpstreamError::Status { url, .. }
            | UpstreamError::Decode { url, .. } => url,
        }
    }
}

pub type UpstreamResult<T> = std::result::Result<T, UpstreamError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV export error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("HTTP client error: {0}")]
    ClientError(#[from] reqwest::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

impl AppError {
    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::ConfigError { .. }
            | AppError::InvalidConfigValueError { .. }
            | AppError::MissingConfigError { .. } => 2,
            AppError::IoError(_) | AppError::ClientError(_) => 3,
            AppError::SerializationError(_) | AppError::CsvError(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
