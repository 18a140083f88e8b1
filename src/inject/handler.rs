//! Handler methods and their calling conventions

use std::fmt;

use crate::codegen::descriptor::method_descriptor;
use crate::codegen::{opcodes, Insn, Target, Type};

/// The method an injector routes intercepted arguments through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerRef {
    /// Internal name of the class declaring the handler (the target class once merged)
    pub owner: String,
    pub name: String,
    pub desc: String,
    pub is_static: bool,
    pub is_private: bool,
}

impl HandlerRef {
    /// Public instance handler
    pub fn new(owner: &str, name: &str, desc: &str) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            is_static: false,
            is_private: false,
        }
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_private(mut self) -> Self {
        self.is_private = true;
        self
    }

    pub fn invoke_opcode(&self) -> u8 {
        if self.is_static {
            opcodes::INVOKESTATIC
        } else if self.is_private {
            opcodes::INVOKESPECIAL
        } else {
            opcodes::INVOKEVIRTUAL
        }
    }

    /// Instruction calling the handler
    pub fn invocation(&self) -> Insn {
        Insn::invoke(self.invoke_opcode(), &self.owner, &self.name, &self.desc)
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}{}", self.owner, self.name, self.desc)
    }
}

/// Calling convention of a handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerForm {
    /// `handler(Args)`
    Short,
    /// `handler(Args, <enclosing method arguments>)`
    Long,
}

impl fmt::Display for HandlerForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerForm::Short => write!(f, "short form"),
            HandlerForm::Long => write!(f, "long form"),
        }
    }
}

/// The two handler descriptors accepted for one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerShapes {
    pub short: String,
    pub long: String,
}

impl HandlerShapes {
    pub fn for_target(args_class: &str, target: &Target) -> Self {
        let bundle = Type::object(args_class);
        let mut long = Vec::with_capacity(target.arguments.len() + 1);
        long.push(bundle.clone());
        long.extend(target.arguments.iter().cloned());
        Self {
            short: method_descriptor(&[bundle], &Type::Void),
            long: method_descriptor(&long, &Type::Void),
        }
    }

    /// Classify a handler descriptor; the short form wins when both shapes coincide
    pub fn classify(&self, desc: &str) -> Option<HandlerForm> {
        if desc == self.short {
            Some(HandlerForm::Short)
        } else if desc == self.long {
            Some(HandlerForm::Long)
        } else {
            None
        }
    }
}
