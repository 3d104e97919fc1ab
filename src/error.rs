use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Error fetching data: {0}")]
    Status(u16),

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("could not decode search response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("refusing to run a statement that modifies the database: {0}")]
    ReadOnly(String),

    #[error("book {0} is already stored")]
    DuplicateBook(String),

    #[error("unknown analysis: {0}")]
    UnknownQuery(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("could not build HTTP client: {0}")]
    Client(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
