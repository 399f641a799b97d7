use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0:?} were not found in the data source")]
    UnresolvedAssets(Vec<String>),

    #[error("Failed to build or send the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The API request for '{ticker}' returned HTTP {status}: {body}")]
    Http {
        ticker: String,
        status: u16,
        body: String,
    },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported interval '{0}'")]
    InvalidInterval(String),

    #[error("Failed to assemble the price table: {0}")]
    Frame(#[from] core_types::CoreError),
}
