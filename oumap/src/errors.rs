use thiserror::Error;

/// Top-level error type returned by the oumap loaders, parsers and query builders.
///
/// The filter predicates themselves never produce errors; malformed location data
/// simply fails to match. Errors only surface at the boundaries where input is parsed.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Invalid input supplied to a query or filter builder.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// An opening-hours schedule could not be parsed.
    #[error("invalid opening hours '{input}': {reason}")]
    InvalidSchedule { input: String, reason: String },

    /// Reading a snapshot or config file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON payload could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML payload could not be decoded.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// CSV import or export failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl FilterError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn invalid_schedule(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchedule {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

pub type FilterResult<T> = Result<T, FilterError>;
