use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("ingest error: {0}")]
    Ingest(String),
    #[error("shard plan error: {0}")]
    Plan(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
