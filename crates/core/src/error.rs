use thiserror::Error;

#[derive(Debug, Error)]
#[error("row {row}: field '{field}': {reason}")]
pub struct SchemaError {
    pub row: usize,
    pub field: String,
    pub reason: String,
}

impl SchemaError {
    pub fn new(row: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid instance: {0}")]
    Msg(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("placement audit failed: {0}")]
    Invariant(String),
    #[error(transparent)]
    Solver(#[from] anyhow::Error),
}
