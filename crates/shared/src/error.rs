use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TodoId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Validation,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    #[error("todo {0} not found")]
    NotFound(TodoId),
    #[error("todo title must not be empty")]
    EmptyTitle,
}

impl TodoError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::EmptyTitle => ErrorCode::Validation,
        }
    }
}

/// Maps any error chain onto a coarse code, looking through `anyhow` wrapping.
pub fn classify(err: &(dyn std::error::Error + 'static)) -> ErrorCode {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(todo_err) = err.downcast_ref::<TodoError>() {
            return todo_err.code();
        }
        current = err.source();
    }
    ErrorCode::Internal
}
