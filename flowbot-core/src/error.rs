use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoalescerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sink error: {0}")]
    Sink(String),

    #[error("Final flush failed: {0}")]
    Teardown(String),

    #[error("Session task failed: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, CoalescerError>;
