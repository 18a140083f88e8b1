//! Instruction stream model
//!
//! Method bodies are held as ordered lists of stack-machine instructions with static stack
//! effects. This module covers descriptors, the instructions themselves, the list they live
//! in, stack depth simulation and the target method an injector rewrites.

pub mod descriptor;
pub mod error;
pub mod insn;
pub mod insn_list;
pub mod opcodes;
pub mod stack;
pub mod target;

pub use descriptor::{resolve, ArgumentDescriptor, MethodDescriptor, Type};
pub use error::{BytecodeError, BytecodeResult, DescriptorError, DescriptorResult};
pub use insn::{Constant, Insn, MarkerKind, MethodInsn, StackEffect};
pub use insn_list::{InsnId, InsnList};
pub use stack::StackState;
pub use target::{StackExtension, Target};
