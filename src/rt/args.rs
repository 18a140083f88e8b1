//! Argument bundle
//!
//! The runtime half of call-site argument interception. Synthesized code creates a bundle
//! sized to the intercepted call, fills it back to front with [`Args::push`] while the
//! arguments come off the operand stack, hands it to the handler, and reads it back with
//! [`Args::get`]. Handlers see a 0-based, contiguous view and edit it with [`Args::set`] and
//! [`Args::set_all`].
//!
//! Once the call's descriptor is attached, writes are checked against the declared argument
//! types: primitive slots take exactly their wrapper and never `null`, reference slots take
//! `null` or anything assignable.

use super::error::{ArgsError, ArgsOp, ArgsResult};
use super::value::Value;
use crate::codegen::{MethodDescriptor, Type};
use crate::consts;

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    /// Internal name of the bundle class, so bundles can be stored in slots of their own type
    class: String,
    desc: Option<String>,
    types: Option<Vec<Type>>,
    /// Values still to be pushed; the next push lands at `cursor - 1`
    cursor: usize,
    values: Vec<Value>,
}

impl Args {
    /// Bundle of `size` uninitialised (`null`) arguments, ready to be filled by pushes
    pub fn create(size: usize) -> Self {
        Self {
            class: consts::ARGS_CLASS.to_string(),
            desc: None,
            types: None,
            cursor: size,
            values: vec![Value::Null; size],
        }
    }

    /// Runtime ABI name for [`Args::create`]
    pub fn of(size: usize) -> Self {
        Self::create(size)
    }

    /// Bundle holding `values` already; pushes overwrite from the end
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            class: consts::ARGS_CLASS.to_string(),
            desc: None,
            types: None,
            cursor: values.len(),
            values,
        }
    }

    /// Relocated bundle class, as configured by [`Config::args_class`](crate::Config)
    pub fn with_class(mut self, class: &str) -> Self {
        self.class = class.to_string();
        self
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn with_desc(mut self, desc: &str) -> ArgsResult<Self> {
        self.set_desc(desc)?;
        Ok(self)
    }

    /// Attach the intercepted call's descriptor, enabling type checks on writes
    pub fn set_desc(&mut self, desc: &str) -> ArgsResult<()> {
        let parsed = MethodDescriptor::parse(desc)?;
        if parsed.args.len() != self.values.len() {
            return Err(ArgsError::DescriptorArity {
                desc: desc.to_string(),
                arity: parsed.args.len(),
                size: self.values.len(),
            });
        }
        self.desc = Some(desc.to_string());
        self.types = Some(parsed.args);
        Ok(())
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Declared type of an argument, once a descriptor is attached
    pub fn arg_type(&self, index: usize) -> Option<&Type> {
        self.types.as_ref().and_then(|types| types.get(index))
    }

    /// Store the next value while filling back to front
    ///
    /// # Panics
    ///
    /// Panics when every slot has already been pushed. Only synthesized code pushes, and it
    /// pushes exactly once per argument.
    pub fn push(&mut self, value: Value) {
        assert!(self.cursor > 0, "pushed more than {} arguments into bundle", self.values.len());
        self.cursor -= 1;
        self.values[self.cursor] = value;
    }

    /// Pushes left before the bundle is full
    pub fn remaining(&self) -> usize {
        self.cursor
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, index: i32) -> ArgsResult<&Value> {
        let slot = self.slot(ArgsOp::Get, index)?;
        Ok(&self.values[slot])
    }

    pub fn set(&mut self, index: i32, value: Value) -> ArgsResult<()> {
        let slot = self.slot(ArgsOp::Set, index)?;
        self.check(ArgsOp::Set, slot, &value)?;
        self.values[slot] = value;
        Ok(())
    }

    /// Replace every argument; nothing is written unless all values are accepted
    pub fn set_all(&mut self, values: Vec<Value>) -> ArgsResult<()> {
        if values.len() != self.values.len() {
            return Err(ArgsError::CountMismatch {
                given: values.len(),
                expected: self.values.len(),
                desc: self.desc.clone(),
            });
        }
        for (index, value) in values.iter().enumerate() {
            self.check(ArgsOp::SetAll, index, value)?;
        }
        self.values = values;
        Ok(())
    }

    fn slot(&self, op: ArgsOp, index: i32) -> ArgsResult<usize> {
        usize::try_from(index)
            .ok()
            .filter(|slot| *slot < self.values.len())
            .ok_or(ArgsError::IndexOutOfBounds {
                op,
                index,
                size: self.values.len(),
            })
    }

    fn check(&self, op: ArgsOp, index: usize, value: &Value) -> ArgsResult<()> {
        let mismatch = |expected: String| ArgsError::TypeMismatch {
            op,
            index,
            expected,
            found: value.type_name(),
        };
        match self.arg_type(index) {
            Some(ty) if ty.is_primitive() => match value {
                Value::Null => Err(ArgsError::NullPrimitive {
                    op,
                    index,
                    expected: ty.to_string(),
                }),
                Value::Boxed(boxed) if boxed.primitive() == *ty => Ok(()),
                _ => {
                    let wrapper = ty.boxing_type().unwrap_or(consts::OBJECT_CLASS);
                    Err(mismatch(Type::object(wrapper).to_string()))
                }
            },
            Some(ty) if value.is_assignable_to(ty, &self.class) => Ok(()),
            Some(ty) => Err(mismatch(ty.to_string())),
            None if value.is_reference() => Ok(()),
            None => Err(mismatch(Type::object(consts::OBJECT_CLASS).to_string())),
        }
    }
}
