/// Errors raised by the data source collaborators and the configuration layer.
///
/// The aggregation pipeline itself is infallible: malformed fields are
/// absorbed by the normalizer and fetch failures by the yearly cache.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Data format error: {0}")]
    DataFormat(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalServiceError(format!("request failed: {}", err))
    }
}
