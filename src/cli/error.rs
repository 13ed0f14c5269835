//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("'{0}' is not set")]
    NotSet(String),

    #[error("'{0}' does not exist")]
    Absent(String),

    #[error("cannot render configuration: {0}")]
    Render(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Absent(_) => crate::exitcode::NOT_FOUND,
            CliError::NotSet(_) => crate::exitcode::UNAVAILABLE,
            CliError::Render(_) => crate::exitcode::DATAERR,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(ApplicationError::Config { .. }) => {
                    crate::exitcode::CONFIG
                }
                InfraError::Application(ApplicationError::Domain(DomainError::InvalidKey(_))) => {
                    crate::exitcode::USAGE
                }
                InfraError::Application(ApplicationError::Extract { .. }) => {
                    crate::exitcode::DATAERR
                }
                InfraError::Application(_) => crate::exitcode::SOFTWARE,
            },
        }
    }

    /// Errors that only carry an exit status; the command already printed its answer.
    pub fn is_silent(&self) -> bool {
        matches!(self, CliError::Absent(_))
    }
}
