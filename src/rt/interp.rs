//! Reference interpreter for straight-line instruction streams
//!
//! Runs a method body slot by slot so rewritten code can be observed doing what it claims.
//! Long and double values take two slots; any raw stack instruction that would separate the
//! halves is rejected instead of silently corrupting the stack.
//!
//! Calls to the argument bundle class and to the wrapper `valueOf`/`xValue` methods are
//! executed directly. Every other call goes to a [`Host`], which plays the part of the rest
//! of the program (the intercepted method, the handler).

use super::args::Args;
use super::error::{InterpError, InterpResult};
use super::value::{Boxed, BundleRef, Value};
use crate::codegen::descriptor::method_descriptor;
use crate::codegen::{opcodes, Constant, Insn, InsnList, MethodInsn, Type};
use crate::config::Config;
use crate::consts;

/// Bundles allocated while running
#[derive(Debug, Default)]
pub struct Heap {
    bundles: Vec<Args>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, args: Args) -> BundleRef {
        self.bundles.push(args);
        BundleRef(self.bundles.len() - 1)
    }

    pub fn bundle(&self, bundle: BundleRef) -> InterpResult<&Args> {
        self.bundles.get(bundle.0).ok_or(InterpError::UnknownBundle(bundle))
    }

    pub fn bundle_mut(&mut self, bundle: BundleRef) -> InterpResult<&mut Args> {
        self.bundles.get_mut(bundle.0).ok_or(InterpError::UnknownBundle(bundle))
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Executes calls the interpreter does not handle itself
pub trait Host {
    /// `receiver` is `None` for static calls; `arguments` are in declared order
    fn invoke(
        &mut self,
        call: &MethodInsn,
        receiver: Option<Value>,
        arguments: Vec<Value>,
        heap: &mut Heap,
    ) -> InterpResult<Option<Value>>;
}

impl<F> Host for F
where
    F: FnMut(&MethodInsn, Option<Value>, Vec<Value>, &mut Heap) -> InterpResult<Option<Value>>,
{
    fn invoke(
        &mut self,
        call: &MethodInsn,
        receiver: Option<Value>,
        arguments: Vec<Value>,
        heap: &mut Heap,
    ) -> InterpResult<Option<Value>> {
        self(call, receiver, arguments, heap)
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Return(Option<Value>),
    /// Ran off the end of the list without returning
    FellThrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub completion: Completion,
    /// Operand stack left at completion, bottom first
    pub stack: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Value(Value),
    /// Second slot of a long or double
    Upper,
}

#[derive(Debug, Default)]
struct Frame {
    stack: Vec<Slot>,
    locals: Vec<Option<Value>>,
}

fn underflow(insn: &Insn) -> InterpError {
    InterpError::StackUnderflow { insn: insn.to_string() }
}

fn split(insn: &Insn) -> InterpError {
    InterpError::SplitWideValue { insn: insn.to_string() }
}

fn unsupported(insn: &Insn) -> InterpError {
    InterpError::Unsupported { insn: insn.to_string() }
}

fn mismatch(insn: &Insn, expected: impl ToString, found: &Value) -> InterpError {
    InterpError::TypeMismatch {
        insn: insn.to_string(),
        expected: expected.to_string(),
        found: found.type_name(),
    }
}

/// Whether a stack value has the computational type of `ty`
fn fits(value: &Value, ty: &Type) -> bool {
    match ty {
        Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => matches!(value, Value::Int(_)),
        Type::Long => matches!(value, Value::Long(_)),
        Type::Float => matches!(value, Value::Float(_)),
        Type::Double => matches!(value, Value::Double(_)),
        Type::Object(_) | Type::Array(_) => value.is_reference(),
        Type::Void => false,
    }
}

fn reference() -> Type {
    Type::object(consts::OBJECT_CLASS)
}

impl Frame {
    fn with_arguments(arguments: Vec<Value>) -> Self {
        let mut frame = Frame::default();
        for value in arguments {
            let wide = value.size() == 2;
            frame.locals.push(Some(value));
            if wide {
                frame.locals.push(None);
            }
        }
        frame
    }

    fn push(&mut self, value: Value) {
        let wide = value.size() == 2;
        self.stack.push(Slot::Value(value));
        if wide {
            self.stack.push(Slot::Upper);
        }
    }

    fn pop(&mut self, insn: &Insn) -> InterpResult<Value> {
        match self.stack.pop() {
            None => Err(underflow(insn)),
            Some(Slot::Upper) => match self.stack.pop() {
                Some(Slot::Value(value)) if value.size() == 2 => Ok(value),
                Some(_) => Err(split(insn)),
                None => Err(underflow(insn)),
            },
            Some(Slot::Value(value)) if value.size() == 1 => Ok(value),
            Some(Slot::Value(_)) => Err(split(insn)),
        }
    }

    fn pop_as(&mut self, insn: &Insn, ty: &Type) -> InterpResult<Value> {
        let value = self.pop(insn)?;
        if fits(&value, ty) {
            Ok(value)
        } else {
            Err(mismatch(insn, ty, &value))
        }
    }

    fn pop_int(&mut self, insn: &Insn) -> InterpResult<i32> {
        match self.pop(insn)? {
            Value::Int(v) => Ok(v),
            other => Err(mismatch(insn, Type::Int, &other)),
        }
    }

    fn pop_long(&mut self, insn: &Insn) -> InterpResult<i64> {
        match self.pop(insn)? {
            Value::Long(v) => Ok(v),
            other => Err(mismatch(insn, Type::Long, &other)),
        }
    }

    /// Pop `take` raw slots and push them back picked by `pattern` (0 is the deepest taken)
    fn shuffle(&mut self, insn: &Insn, take: usize, pattern: &[usize]) -> InterpResult<()> {
        if self.stack.len() < take {
            return Err(underflow(insn));
        }
        let taken = self.stack.split_off(self.stack.len() - take);
        self.stack.extend(pattern.iter().map(|index| taken[*index].clone()));
        self.check_integrity(insn)
    }

    /// Every wide value must sit directly under its upper slot
    fn check_integrity(&self, insn: &Insn) -> InterpResult<()> {
        let mut expect_upper = false;
        for slot in &self.stack {
            match slot {
                Slot::Upper if expect_upper => expect_upper = false,
                Slot::Value(value) if !expect_upper => expect_upper = value.size() == 2,
                _ => return Err(split(insn)),
            }
        }
        if expect_upper {
            return Err(split(insn));
        }
        Ok(())
    }

    fn load(&self, insn: &Insn, index: u16, ty: &Type) -> InterpResult<Value> {
        let value = self
            .locals
            .get(index as usize)
            .cloned()
            .flatten()
            .ok_or(InterpError::UninitialisedLocal { index })?;
        if fits(&value, ty) {
            Ok(value)
        } else {
            Err(mismatch(insn, ty, &value))
        }
    }

    fn store(&mut self, index: u16, value: Value) {
        let index = index as usize;
        let end = index + value.size() as usize;
        if self.locals.len() < end {
            self.locals.resize(end, None);
        }
        // Overwriting the upper half of a wide local kills it
        if index > 0 && matches!(&self.locals[index - 1], Some(prev) if prev.size() == 2) {
            self.locals[index - 1] = None;
        }
        if value.size() == 2 {
            self.locals[index + 1] = None;
        }
        self.locals[index] = Some(value);
    }

    fn into_values(self) -> Vec<Value> {
        self.stack
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Value(value) => Some(value),
                Slot::Upper => None,
            })
            .collect()
    }
}

/// Wrapper methods executed directly
#[derive(Debug, Clone, PartialEq)]
enum BoxingCall {
    /// `Wrapper.valueOf(prim)`
    ValueOf(Type),
    /// `wrapper.primValue()`
    Unbox(Type),
}

impl BoxingCall {
    fn of(method: &MethodInsn) -> Option<Self> {
        let primitive = Type::from_boxing_type(&method.owner)?;
        let wrapper = Type::object(method.owner.clone());
        if method.is_static()
            && method.name == consts::BOX_METHOD
            && method.desc == method_descriptor(std::slice::from_ref(&primitive), &wrapper)
        {
            return Some(BoxingCall::ValueOf(primitive));
        }
        if !method.is_static()
            && primitive.unboxing_method() == Some(method.name.as_str())
            && method.desc == method_descriptor(&[], &primitive)
        {
            return Some(BoxingCall::Unbox(primitive));
        }
        None
    }

    fn apply(&self, insn: &Insn, receiver: Option<Value>, arguments: &[Value]) -> InterpResult<Value> {
        match self {
            BoxingCall::ValueOf(primitive) => {
                let value = arguments.first().ok_or_else(|| underflow(insn))?;
                Boxed::from_stack(primitive, value)
                    .map(Value::Boxed)
                    .ok_or_else(|| mismatch(insn, primitive, value))
            }
            BoxingCall::Unbox(primitive) => match receiver {
                Some(Value::Boxed(boxed)) if boxed.primitive() == *primitive => Ok(boxed.to_stack()),
                Some(other) => Err(InterpError::ClassCast {
                    class: primitive.boxing_type().unwrap_or(consts::OBJECT_CLASS).replace('/', "."),
                    found: other.type_name(),
                }),
                None => Err(underflow(insn)),
            },
        }
    }
}

/// Interpreter over one [`Heap`]
pub struct Interpreter<'c> {
    config: &'c Config,
    heap: Heap,
}

impl<'c> Interpreter<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            heap: Heap::new(),
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Run `insns` with `arguments` in the leading locals (receiver first for instance methods)
    pub fn run(&mut self, insns: &InsnList, arguments: Vec<Value>, host: &mut dyn Host) -> InterpResult<Outcome> {
        let mut frame = Frame::with_arguments(arguments);
        for insn in insns.insns() {
            log::trace!("{:3} | {}", frame.stack.len(), insn);
            if let Some(completion) = self.step(&mut frame, insn, host)? {
                return Ok(Outcome {
                    completion,
                    stack: frame.into_values(),
                });
            }
        }
        Ok(Outcome {
            completion: Completion::FellThrough,
            stack: frame.into_values(),
        })
    }

    fn step(&mut self, frame: &mut Frame, insn: &Insn, host: &mut dyn Host) -> InterpResult<Option<Completion>> {
        match insn {
            Insn::Marker(_) => {}
            Insn::Op(opcode) => return self.op(frame, insn, *opcode),
            Insn::Int { opcode, operand } => match *opcode {
                opcodes::BIPUSH | opcodes::SIPUSH => frame.push(Value::Int(*operand)),
                _ => return Err(unsupported(insn)),
            },
            Insn::Ldc(constant) => frame.push(match constant {
                Constant::Int(v) => Value::Int(*v),
                Constant::Float(v) => Value::Float(*v),
                Constant::Long(v) => Value::Long(*v),
                Constant::Double(v) => Value::Double(*v),
                Constant::String(v) => Value::Str(v.clone()),
            }),
            Insn::Var { opcode, index } => {
                let (ty, is_load) = match *opcode {
                    opcodes::ILOAD => (Type::Int, true),
                    opcodes::LLOAD => (Type::Long, true),
                    opcodes::FLOAD => (Type::Float, true),
                    opcodes::DLOAD => (Type::Double, true),
                    opcodes::ALOAD => (reference(), true),
                    opcodes::ISTORE => (Type::Int, false),
                    opcodes::LSTORE => (Type::Long, false),
                    opcodes::FSTORE => (Type::Float, false),
                    opcodes::DSTORE => (Type::Double, false),
                    opcodes::ASTORE => (reference(), false),
                    _ => return Err(unsupported(insn)),
                };
                if is_load {
                    let value = frame.load(insn, *index, &ty)?;
                    frame.push(value);
                } else {
                    let value = frame.pop_as(insn, &ty)?;
                    frame.store(*index, value);
                }
            }
            Insn::Type { opcode, desc } => {
                let value = match *opcode {
                    opcodes::CHECKCAST | opcodes::INSTANCEOF => frame.pop_as(insn, &reference())?,
                    _ => return Err(unsupported(insn)),
                };
                let is_instance = value.is_instance_of(desc, &self.config.args_class);
                if *opcode == opcodes::INSTANCEOF {
                    frame.push(Value::Int(is_instance as i32));
                } else if is_instance || value == Value::Null {
                    frame.push(value);
                } else {
                    return Err(InterpError::ClassCast {
                        class: desc.replace('/', "."),
                        found: value.type_name(),
                    });
                }
            }
            Insn::Field { .. } => return Err(unsupported(insn)),
            Insn::Method(method) => self.invoke(frame, insn, method, host)?,
        }
        Ok(None)
    }

    fn op(&mut self, frame: &mut Frame, insn: &Insn, opcode: u8) -> InterpResult<Option<Completion>> {
        match opcode {
            opcodes::NOP => {}
            opcodes::ACONST_NULL => frame.push(Value::Null),
            opcodes::ICONST_M1..=opcodes::ICONST_5 => frame.push(Value::Int(opcode as i32 - opcodes::ICONST_0 as i32)),
            opcodes::LCONST_0 | opcodes::LCONST_1 => frame.push(Value::Long((opcode - opcodes::LCONST_0) as i64)),
            opcodes::FCONST_0..=opcodes::FCONST_2 => frame.push(Value::Float((opcode - opcodes::FCONST_0) as f32)),
            opcodes::DCONST_0 | opcodes::DCONST_1 => frame.push(Value::Double((opcode - opcodes::DCONST_0) as f64)),
            opcodes::POP => frame.shuffle(insn, 1, &[])?,
            opcodes::POP2 => frame.shuffle(insn, 2, &[])?,
            opcodes::DUP => frame.shuffle(insn, 1, &[0, 0])?,
            opcodes::DUP_X1 => frame.shuffle(insn, 2, &[1, 0, 1])?,
            opcodes::DUP_X2 => frame.shuffle(insn, 3, &[2, 0, 1, 2])?,
            opcodes::DUP2 => frame.shuffle(insn, 2, &[0, 1, 0, 1])?,
            opcodes::DUP2_X1 => frame.shuffle(insn, 3, &[1, 2, 0, 1, 2])?,
            opcodes::DUP2_X2 => frame.shuffle(insn, 4, &[2, 3, 0, 1, 2, 3])?,
            opcodes::SWAP => frame.shuffle(insn, 2, &[1, 0])?,
            opcodes::IADD | opcodes::LADD | opcodes::FADD | opcodes::DADD => {
                let ty = match opcode {
                    opcodes::IADD => Type::Int,
                    opcodes::LADD => Type::Long,
                    opcodes::FADD => Type::Float,
                    _ => Type::Double,
                };
                let rhs = frame.pop_as(insn, &ty)?;
                let lhs = frame.pop_as(insn, &ty)?;
                let sum = match (lhs, rhs) {
                    (Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(b)),
                    (Value::Long(a), Value::Long(b)) => Value::Long(a.wrapping_add(b)),
                    (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
                    (Value::Double(a), Value::Double(b)) => Value::Double(a + b),
                    (lhs, _) => return Err(mismatch(insn, ty, &lhs)),
                };
                frame.push(sum);
            }
            opcodes::I2L => {
                let value = frame.pop_int(insn)?;
                frame.push(Value::Long(value as i64));
            }
            opcodes::L2I => {
                let value = frame.pop_long(insn)?;
                frame.push(Value::Int(value as i32));
            }
            opcodes::IRETURN | opcodes::LRETURN | opcodes::FRETURN | opcodes::DRETURN | opcodes::ARETURN => {
                let ty = match opcode {
                    opcodes::IRETURN => Type::Int,
                    opcodes::LRETURN => Type::Long,
                    opcodes::FRETURN => Type::Float,
                    opcodes::DRETURN => Type::Double,
                    _ => reference(),
                };
                let value = frame.pop_as(insn, &ty)?;
                return Ok(Some(Completion::Return(Some(value))));
            }
            opcodes::RETURN => return Ok(Some(Completion::Return(None))),
            _ => return Err(unsupported(insn)),
        }
        Ok(None)
    }

    fn invoke(&mut self, frame: &mut Frame, insn: &Insn, method: &MethodInsn, host: &mut dyn Host) -> InterpResult<()> {
        let desc = method.descriptor()?;
        let mut arguments = Vec::with_capacity(desc.args.len());
        for ty in desc.args.iter().rev() {
            arguments.push(frame.pop_as(insn, ty)?);
        }
        arguments.reverse();
        let receiver = if method.is_static() {
            None
        } else {
            match frame.pop_as(insn, &reference())? {
                Value::Null => return Err(InterpError::NullReceiver { call: method.to_string() }),
                value => Some(value),
            }
        };

        let result = if method.owner == self.config.args_class {
            self.call_args(insn, method, receiver, &arguments)?
        } else if let Some(call) = BoxingCall::of(method) {
            Some(call.apply(insn, receiver, &arguments)?)
        } else {
            host.invoke(method, receiver, arguments, &mut self.heap)?
        };

        match (&desc.ret, result) {
            (Type::Void, None) => {}
            (Type::Void, Some(value)) => {
                return Err(InterpError::host(method, format!("void call returned {}", value)));
            }
            (ret, Some(value)) if fits(&value, ret) => frame.push(value),
            (ret, Some(value)) => return Err(mismatch(insn, ret, &value)),
            (_, None) => return Err(InterpError::host(method, "non-void call returned nothing")),
        }
        Ok(())
    }

    /// Bundle methods synthesized code calls
    fn call_args(
        &mut self,
        insn: &Insn,
        method: &MethodInsn,
        receiver: Option<Value>,
        arguments: &[Value],
    ) -> InterpResult<Option<Value>> {
        if method.is_static() {
            return match (method.name.as_str(), arguments) {
                (consts::ARGS_FACTORY, [Value::Int(size)]) => {
                    let size = usize::try_from(*size).map_err(|_| mismatch(insn, "non-negative size", &Value::Int(*size)))?;
                    Ok(Some(Value::Bundle(self.heap.alloc(Args::create(size).with_class(&self.config.args_class)))))
                }
                _ => Err(unsupported(insn)),
            };
        }

        let bundle = match receiver {
            Some(Value::Bundle(bundle)) => bundle,
            Some(other) => return Err(mismatch(insn, self.config.args_type(), &other)),
            None => return Err(underflow(insn)),
        };
        match (method.name.as_str(), arguments) {
            (consts::ARGS_SET_DESC, [Value::Str(desc)]) => {
                self.heap.bundle_mut(bundle)?.set_desc(desc)?;
                Ok(Some(Value::Bundle(bundle)))
            }
            (consts::ARGS_PUSH, [value]) => {
                let args = self.heap.bundle_mut(bundle)?;
                if args.remaining() == 0 {
                    return Err(InterpError::BundleOverflow { insn: insn.to_string() });
                }
                args.push(value.clone());
                Ok(Some(Value::Bundle(bundle)))
            }
            (consts::ARGS_GET, [Value::Int(index)]) => Ok(Some(self.heap.bundle(bundle)?.get(*index)?.clone())),
            (consts::ARGS_SET, [Value::Int(index), value]) => {
                self.heap.bundle_mut(bundle)?.set(*index, value.clone())?;
                Ok(None)
            }
            (consts::ARGS_SIZE, []) => Ok(Some(Value::Int(self.heap.bundle(bundle)?.size() as i32))),
            _ => Err(unsupported(insn)),
        }
    }
}
