use thiserror::Error;

#[derive(Error, Debug)]
pub enum BPCError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unable to parse date: {0}")]
    DateParse(String),

    #[error("Timestamp out of range: {0}")]
    DateRange(String),

    #[error("Record is missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type BPCResult<T> = Result<T, BPCError>;
