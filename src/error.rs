use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing credentials: {0}")]
    MissingCredential(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("OAuth2 authentication error: {0}")]
    Auth(String),

    #[error("Google API error: {0}")]
    Upstream(#[from] google_sheets4::Error),

    #[error("Google API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected API payload: {0}")]
    Payload(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
