use thiserror::Error;

/// Validation failures raised by the entity setters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Missing value for {0}")]
    NullValue(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Identity already assigned: {0}")]
    IdentityAlreadyAssigned(i64),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Validation error: {0}")]
    Model(#[from] ModelError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Transaction with ID {0} not found")]
    NotFound(i64),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: Box<StoreError>,
    },
}
