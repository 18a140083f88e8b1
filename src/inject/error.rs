//! Specific error types for injection

use thiserror::Error;

use crate::codegen::{BytecodeError, DescriptorError};

/// Misdeclared or misapplied injections, raised before the target is touched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InjectionError {
    #[error("{injector} targets a method invocation {name}{desc} with no arguments")]
    ZeroArity { injector: String, name: String, desc: String },

    #[error("{injector} has an invalid signature {found}, expected {short} or {long}")]
    InvalidSignature {
        injector: String,
        found: String,
        short: String,
        long: String,
    },

    #[error("{injector} is not static but targets static method {target}")]
    StaticMismatch { injector: String, target: String },

    #[error("{injector} call site {id} is not a method invocation: {insn}")]
    NotAnInvocation { injector: String, id: String, insn: String },

    #[error("Call site {id} is not part of {target}")]
    UnknownCallSite { id: String, target: String },

    #[error("{injector} already rewrote call site {id} in {target}")]
    AlreadyInjected { injector: String, id: String, target: String },

    #[error("{injector} needs max stack {required} in {target}, above the limit of {limit}")]
    StackLimit {
        injector: String,
        required: u32,
        limit: u16,
        target: String,
    },

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),
}

/// Generic result type for injection operations
pub type InjectionResult<T> = Result<T, InjectionError>;
