use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("A movie with id {0} already exists")]
    DuplicateId(i64),

    #[error("Storage quota exhausted")]
    QuotaExceeded,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Malformed import file: {0}")]
    ImportFormat(String),

    #[error("Malformed backup file: {0}")]
    BackupFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
