//! Specific error types for the runtime side: the argument bundle and the interpreter

use std::fmt;

use thiserror::Error;

use super::value::BundleRef;
use crate::codegen::{BytecodeError, DescriptorError};

/// Bundle operation that failed, as the handler wrote it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgsOp {
    Get,
    Set,
    SetAll,
}

impl fmt::Display for ArgsOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsOp::Get => write!(f, "get"),
            ArgsOp::Set => write!(f, "set"),
            ArgsOp::SetAll => write!(f, "setAll"),
        }
    }
}

/// Errors raised by argument bundle operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgsError {
    #[error("Args.{op}: argument index {index} is out of bounds for {size} arguments")]
    IndexOutOfBounds { op: ArgsOp, index: i32, size: usize },

    #[error("Args.setAll: {given} values supplied but {expected} are required{}", desc_suffix(.desc))]
    CountMismatch { given: usize, expected: usize, desc: Option<String> },

    #[error("Args.{op}: argument {index} is a primitive {expected} and cannot be null")]
    NullPrimitive { op: ArgsOp, index: usize, expected: String },

    #[error("Args.{op}: argument {index} expects {expected} but got {found}")]
    TypeMismatch { op: ArgsOp, index: usize, expected: String, found: String },

    #[error("Descriptor {desc} declares {arity} arguments but the bundle holds {size}")]
    DescriptorArity { desc: String, arity: usize, size: usize },

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

fn desc_suffix(desc: &Option<String>) -> String {
    match desc {
        Some(desc) => format!(" by {}", desc),
        None => String::new(),
    }
}

/// Errors raised while executing an instruction stream
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpError {
    #[error("Stack underflow at {insn}")]
    StackUnderflow { insn: String },

    #[error("{insn} would split a long or double value")]
    SplitWideValue { insn: String },

    #[error("Local {index} is read before it is written")]
    UninitialisedLocal { index: u16 },

    #[error("{insn} expects {expected} on the stack but found {found}")]
    TypeMismatch { insn: String, expected: String, found: String },

    #[error("{found} cannot be cast to {class}")]
    ClassCast { class: String, found: String },

    #[error("Null receiver for {call}")]
    NullReceiver { call: String },

    #[error("Unsupported instruction: {insn}")]
    Unsupported { insn: String },

    #[error("{insn} pushed more values than the bundle holds")]
    BundleOverflow { insn: String },

    #[error("No bundle allocated for {0}")]
    UnknownBundle(BundleRef),

    #[error("Host call {call} failed: {message}")]
    Host { call: String, message: String },

    #[error("Argument bundle error: {0}")]
    Args(#[from] ArgsError),

    #[error("Bytecode error: {0}")]
    Bytecode(#[from] BytecodeError),

    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

impl InterpError {
    /// Create a host failure for the given call
    pub fn host(call: impl fmt::Display, message: impl Into<String>) -> Self {
        Self::Host {
            call: call.to_string(),
            message: message.into(),
        }
    }
}

/// Generic result type for bundle operations
pub type ArgsResult<T> = Result<T, ArgsError>;

/// Generic result type for interpreter operations
pub type InterpResult<T> = Result<T, InterpError>;
