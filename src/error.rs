use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Google Sheets API error{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Remote {
        /// HTTP status or API error code, when the failure carried one
        status: Option<u16>,
        message: String,
    },

    #[error("No rows returned for range {0}")]
    EmptyResult(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_display() {
        let with_status = AppError::Remote {
            status: Some(404),
            message: "Requested entity was not found.".to_string(),
        };
        assert_eq!(
            with_status.to_string(),
            "Google Sheets API error (404): Requested entity was not found."
        );

        let without_status = AppError::Remote {
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(
            without_status.to_string(),
            "Google Sheets API error: connection reset"
        );
    }
}
