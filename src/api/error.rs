use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// Single line suitable for the error log.
    pub fn log_message(&self) -> String {
        match self {
            ServiceError::Http(e) if e.is_timeout() => "request timed out".to_string(),
            ServiceError::Http(e) if e.is_connect() => "server unreachable".to_string(),
            other => other.to_string(),
        }
    }
}
