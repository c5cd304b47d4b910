use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarTallyError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("No data returned: {0}")]
    NoData(String),

    #[error("JSON decoding error: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("GitHub API error ({status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<url::ParseError> for StarTallyError {
    fn from(err: url::ParseError) -> Self {
        StarTallyError::InvalidInput(format!("malformed URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, StarTallyError>;
