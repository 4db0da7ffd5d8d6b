use thiserror::Error;

use adaptive_core_types::CoreError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("strategy registry is empty")]
    EmptyRegistry,
    #[error("invalid strategy '{id}': {reason}")]
    InvalidStrategy { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn invalid(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

impl From<EngineError> for CoreError {
    fn from(value: EngineError) -> Self {
        CoreError::new(value.to_string())
    }
}
