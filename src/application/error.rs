//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::GatewayError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("The requested resource could not be found: {0}")]
    FormNotFound(String),

    #[error("no form loaded")]
    NotLoaded,

    #[error("saving form {form_id} failed")]
    SaveFailed {
        form_id: String,
        #[source]
        source: GatewayError,
    },

    #[error("{0}")]
    Gateway(#[from] GatewayError),

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
