use thiserror::Error;

use crate::codegen::{BytecodeError, DescriptorError};
use crate::inject::InjectionError;
use crate::rt::{ArgsError, InterpError};

/// Result type for argsplice operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for argsplice
#[derive(Error, Debug)]
pub enum Error {
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("Injection error: {0}")]
    Injection(#[from] InjectionError),

    #[error("Argument bundle error: {0}")]
    Args(#[from] ArgsError),

    #[error("Interpreter error: {0}")]
    Interp(#[from] InterpError),

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Whether this error is a misdeclared injection that must be fixed at its declaration
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Injection(_) | Error::Descriptor(_) | Error::Config { .. })
    }
}
