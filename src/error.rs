//! Domain errors for the results view.

use thiserror::Error;

use crate::disclosure::Stage;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid stage transition: {from} -> {to}")]
    Transition { from: Stage, to: Stage },

    #[error("Confirmation is only accepted once the button is visible (stage: {stage})")]
    NotReady { stage: Stage },

    #[error("View already mounted")]
    AlreadyMounted,

    #[error("View torn down")]
    TornDown,
}

impl ViewError {
    pub fn validation(message: impl Into<String>) -> Self {
        ViewError::Validation {
            message: message.into(),
        }
    }
}
