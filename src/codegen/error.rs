//! Specific error types for instruction model operations

use thiserror::Error;

/// Errors that can occur while parsing type and method descriptors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Invalid type descriptor: {descriptor}")]
    InvalidTypeDescriptor { descriptor: String },
    #[error("Invalid method descriptor {descriptor}: {reason}")]
    InvalidMethodDescriptor { descriptor: String, reason: String },
}

impl DescriptorError {
    pub(crate) fn method(descriptor: &str, reason: impl Into<String>) -> Self {
        Self::InvalidMethodDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while manipulating or simulating instruction streams
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BytecodeError {
    #[error("Stack underflow at {insn}: needs {needed} slots but only {available} are live")]
    StackUnderflow { insn: String, needed: u16, available: u16 },
    #[error("Stack overflow at {insn}: depth exceeds {limit}")]
    StackOverflow { insn: String, limit: u16 },
    #[error("Invalid opcode for {kind} instruction: {opcode:#04x}")]
    InvalidOpcode { kind: &'static str, opcode: u8 },
    #[error("Instruction {id} is not part of this instruction list")]
    UnknownInsn { id: String },
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),
}

/// Generic result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;

/// Generic result type for bytecode operations
pub type BytecodeResult<T> = Result<T, BytecodeError>;
