use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{
        actions::ActionError, api::ApiError, bulk_import::WizardError,
        controller::ControllerError,
    },
    domain::{error::DomainError, roster::RosterError, uploads::UploadError},
    infra::error::InfraError,
};

/// Flattened error chain, one message per `source()` level.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, error: &dyn StdError) -> Self {
        let mut messages = Vec::new();
        messages.push(error.to_string());
        let mut current = error.source();
        while let Some(inner) = current {
            let message = inner.to_string();
            if messages.last() != Some(&message) {
                messages.push(message);
            }
            current = inner.source();
        }
        Self { source, messages }
    }

    pub fn joined(&self) -> String {
        self.messages.join(": ")
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Roster(#[from] RosterError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Short operator-facing category printed before the details.
    pub fn presentation_message(&self) -> &'static str {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => "Record not found",
            AppError::Api(ApiError::Rejected { .. })
            | AppError::Controller(ControllerError::Api(ApiError::Rejected { .. })) => {
                "The platform rejected the request"
            }
            AppError::Api(_) | AppError::Controller(ControllerError::Api(_)) => {
                "The platform could not be reached"
            }
            AppError::Controller(ControllerError::Resource(_)) => {
                "The platform rejected the request"
            }
            AppError::Domain(DomainError::Validation { .. })
            | AppError::Validation(_)
            | AppError::Action(_)
            | AppError::Roster(_)
            | AppError::Upload(_)
            | AppError::Controller(_)
            | AppError::Wizard(_) => "Request could not be processed",
            AppError::Infra(InfraError::Configuration { .. }) => "Console misconfigured",
            AppError::Infra(InfraError::Telemetry(_)) => "Logging subsystem could not start",
            AppError::Infra(InfraError::Io(_) | InfraError::InputFile { .. }) => "I/O failure",
            AppError::Infra(InfraError::Http { .. }) => "HTTP client could not be created",
            AppError::Domain(DomainError::Invariant { .. }) | AppError::Unexpected(_) => {
                "Unexpected error occurred"
            }
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self)
    }
}
