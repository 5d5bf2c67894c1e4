use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchlistError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Market data error: {0}")]
    MarketDataError(String),

    #[error("Chart error: {0}")]
    ChartError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, WatchlistError>;

// 用于从字符串创建错误
impl From<String> for WatchlistError {
    fn from(s: String) -> Self {
        WatchlistError::Unknown(s)
    }
}

// 用于从&str创建错误
impl From<&str> for WatchlistError {
    fn from(s: &str) -> Self {
        WatchlistError::Unknown(s.to_string())
    }
}
