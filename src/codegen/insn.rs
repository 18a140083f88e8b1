//! Instruction model
//!
//! A method body is a list of [`Insn`] values. Every instruction has a static stack effect
//! measured in slots (`long` and `double` take two, everything else one), which is what
//! the stack accounting in [`super::stack`] and the injectors rely on.

use std::fmt;

use super::descriptor::{MethodDescriptor, Type};
use super::error::{BytecodeError, BytecodeResult};
use super::opcodes;

/// Slots popped and pushed by one instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackEffect {
    pub pop: u16,
    pub push: u16,
}

impl StackEffect {
    pub const NONE: StackEffect = StackEffect { pop: 0, push: 0 };

    pub const fn new(pop: u16, push: u16) -> Self {
        Self { pop, push }
    }
}

/// Position markers carried in a body without emitting code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// End of the field initialisers in a constructor
    InitialiserTail,
    /// Start of the body proper in a constructor
    BodyStart,
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerKind::InitialiserTail => write!(f, "INITIALISER_TAIL"),
            MarkerKind::BodyStart => write!(f, "BODY_START"),
        }
    }
}

/// Constant loaded by LDC
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    String(String),
}

impl Constant {
    pub fn size(&self) -> u16 {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{}", v),
            Constant::Float(v) => write!(f, "{}F", v),
            Constant::Long(v) => write!(f, "{}L", v),
            Constant::Double(v) => write!(f, "{}D", v),
            Constant::String(v) => write!(f, "{:?}", v),
        }
    }
}

/// Method invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInsn {
    pub opcode: u8,
    pub owner: String,
    pub name: String,
    pub desc: String,
    /// Owner is an interface
    pub itf: bool,
}

impl MethodInsn {
    pub fn new(opcode: u8, owner: &str, name: &str, desc: &str) -> Self {
        Self {
            opcode,
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            itf: opcode == opcodes::INVOKEINTERFACE,
        }
    }

    /// Whether the invocation has no receiver
    pub fn is_static(&self) -> bool {
        self.opcode == opcodes::INVOKESTATIC
    }

    pub fn descriptor(&self) -> BytecodeResult<MethodDescriptor> {
        Ok(MethodDescriptor::parse(&self.desc)?)
    }
}

impl fmt::Display for MethodInsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{} {}", opcodes::mnemonic(self.opcode), self.owner, self.name, self.desc)?;
        if self.itf && self.opcode != opcodes::INVOKEINTERFACE {
            write!(f, " (itf)")?;
        }
        Ok(())
    }
}

/// One stack-machine instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    /// Zero-operand instruction
    Op(u8),
    /// BIPUSH / SIPUSH
    Int { opcode: u8, operand: i32 },
    /// Local variable load or store
    Var { opcode: u8, index: u16 },
    /// NEW, ANEWARRAY, CHECKCAST, INSTANCEOF
    Type { opcode: u8, desc: String },
    Field { opcode: u8, owner: String, name: String, desc: String },
    Method(MethodInsn),
    Ldc(Constant),
    Marker(MarkerKind),
}

impl Insn {
    pub fn op(opcode: u8) -> Self {
        Insn::Op(opcode)
    }

    /// Shortest instruction pushing an int constant
    pub fn push_int(value: i32) -> Self {
        match value {
            -1..=5 => Insn::Op((opcodes::ICONST_0 as i32 + value) as u8),
            v if i8::try_from(v).is_ok() => Insn::Int { opcode: opcodes::BIPUSH, operand: v },
            v if i16::try_from(v).is_ok() => Insn::Int { opcode: opcodes::SIPUSH, operand: v },
            v => Insn::Ldc(Constant::Int(v)),
        }
    }

    pub fn var(opcode: u8, index: u16) -> Self {
        Insn::Var { opcode, index }
    }

    /// Load a local of the given type, `None` for `void`
    pub fn load(ty: &Type, index: u16) -> Option<Self> {
        ty.load_opcode().map(|opcode| Insn::Var { opcode, index })
    }

    pub fn type_insn(opcode: u8, desc: &str) -> Self {
        Insn::Type { opcode, desc: desc.to_string() }
    }

    pub fn checkcast(internal_name: &str) -> Self {
        Self::type_insn(opcodes::CHECKCAST, internal_name)
    }

    pub fn invoke(opcode: u8, owner: &str, name: &str, desc: &str) -> Self {
        Insn::Method(MethodInsn::new(opcode, owner, name, desc))
    }

    pub fn invoke_static(owner: &str, name: &str, desc: &str) -> Self {
        Self::invoke(opcodes::INVOKESTATIC, owner, name, desc)
    }

    pub fn invoke_virtual(owner: &str, name: &str, desc: &str) -> Self {
        Self::invoke(opcodes::INVOKEVIRTUAL, owner, name, desc)
    }

    pub fn ldc(constant: Constant) -> Self {
        Insn::Ldc(constant)
    }

    pub fn as_method(&self) -> Option<&MethodInsn> {
        match self {
            Insn::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Static stack effect in slots
    pub fn stack_effect(&self) -> BytecodeResult<StackEffect> {
        let effect = match self {
            Insn::Op(opcode) => opcodes::zero_operand_effect(*opcode).ok_or(BytecodeError::InvalidOpcode {
                kind: "zero-operand",
                opcode: *opcode,
            })?,
            Insn::Int { opcode, .. } => match *opcode {
                opcodes::BIPUSH | opcodes::SIPUSH => StackEffect::new(0, 1),
                other => return Err(BytecodeError::InvalidOpcode { kind: "int", opcode: other }),
            },
            Insn::Var { opcode, .. } => match *opcode {
                opcodes::ILOAD | opcodes::FLOAD | opcodes::ALOAD => StackEffect::new(0, 1),
                opcodes::LLOAD | opcodes::DLOAD => StackEffect::new(0, 2),
                opcodes::ISTORE | opcodes::FSTORE | opcodes::ASTORE => StackEffect::new(1, 0),
                opcodes::LSTORE | opcodes::DSTORE => StackEffect::new(2, 0),
                other => return Err(BytecodeError::InvalidOpcode { kind: "local variable", opcode: other }),
            },
            Insn::Type { opcode, .. } => match *opcode {
                opcodes::NEW => StackEffect::new(0, 1),
                opcodes::ANEWARRAY | opcodes::CHECKCAST | opcodes::INSTANCEOF => StackEffect::new(1, 1),
                other => return Err(BytecodeError::InvalidOpcode { kind: "type", opcode: other }),
            },
            Insn::Field { opcode, desc, .. } => {
                let width = Type::parse(desc)?.size();
                match *opcode {
                    opcodes::GETSTATIC => StackEffect::new(0, width),
                    opcodes::PUTSTATIC => StackEffect::new(width, 0),
                    opcodes::GETFIELD => StackEffect::new(1, width),
                    opcodes::PUTFIELD => StackEffect::new(1 + width, 0),
                    other => return Err(BytecodeError::InvalidOpcode { kind: "field", opcode: other }),
                }
            }
            Insn::Method(method) => {
                if !matches!(method.opcode, opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE) {
                    return Err(BytecodeError::InvalidOpcode { kind: "method", opcode: method.opcode });
                }
                let desc = method.descriptor()?;
                let receiver = if method.is_static() { 0 } else { 1 };
                StackEffect::new(desc.arg_slots() + receiver, desc.ret.size())
            }
            Insn::Ldc(constant) => StackEffect::new(0, constant.size()),
            Insn::Marker(_) => StackEffect::NONE,
        };
        Ok(effect)
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Op(opcode) => write!(f, "{}", opcodes::mnemonic(*opcode)),
            Insn::Int { opcode, operand } => write!(f, "{} {}", opcodes::mnemonic(*opcode), operand),
            Insn::Var { opcode, index } => write!(f, "{} {}", opcodes::mnemonic(*opcode), index),
            Insn::Type { opcode, desc } => write!(f, "{} {}", opcodes::mnemonic(*opcode), desc),
            Insn::Field { opcode, owner, name, desc } => {
                write!(f, "{} {}.{} : {}", opcodes::mnemonic(*opcode), owner, name, desc)
            }
            Insn::Method(method) => write!(f, "{}", method),
            Insn::Ldc(constant) => {
                let opcode = if constant.size() == 2 { opcodes::LDC2_W } else { opcodes::LDC };
                write!(f, "{} {}", opcodes::mnemonic(opcode), constant)
            }
            Insn::Marker(kind) => write!(f, "// marker {}", kind),
        }
    }
}
