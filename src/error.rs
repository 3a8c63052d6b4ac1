use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid response format: no setResponse envelope found")]
    Format,

    #[error("Sheet API reported an error: {0}")]
    Api(String),

    #[error("HTTP {status} while fetching sheet '{sheet}'")]
    Http { sheet: String, status: u16 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "gviz")]
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
