#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A filter or query matched nothing and the operation needs at least one row.
    #[error("Empty result: {0}")]
    Empty(String),

    /// A row, timestamp, or JSON payload from the data store could not be interpreted.
    #[error("Malformed data: {0}")]
    Malformed(String),
}
