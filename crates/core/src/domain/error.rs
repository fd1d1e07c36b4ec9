// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Interval is not a number: {0:?}")]
    IntervalNotANumber(String),

    #[error("Interval must be positive, got {0}")]
    IntervalNonPositive(i64),
}

impl DomainError {
    /// Text shown to a chat user whose command was rejected
    pub fn user_message(&self) -> String {
        match self {
            DomainError::IntervalNotANumber(_) => {
                "Please provide a valid number in minutes. Example: `/set_interval 10`".to_string()
            }
            DomainError::IntervalNonPositive(_) => "Interval must be a positive number.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
