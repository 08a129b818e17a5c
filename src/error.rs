use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("invalid search mode '{0}'")]
    InvalidSearchMode(String),

    #[error("invalid theme sort key '{0}'")]
    InvalidSortKey(String),

    #[error("invalid sort direction '{0}'")]
    InvalidSortDirection(String),

    #[error("invalid demographic filter '{0}': expected category:value")]
    InvalidDemoFilter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    // Fetch errors
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("malformed response body: {0}")]
    MalformedResponse(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("local store error: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return FeedError::MalformedResponse(err.to_string());
        }
        if let Some(status) = err.status() {
            return FeedError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        FeedError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
