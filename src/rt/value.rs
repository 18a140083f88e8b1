//! Runtime values seen by the interpreter and held by argument bundles

use std::fmt;

use crate::codegen::Type;
use crate::consts;

/// A primitive boxed in its wrapper class
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boxed {
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Boxed {
    /// Primitive type this wrapper boxes
    pub fn primitive(&self) -> Type {
        match self {
            Boxed::Boolean(_) => Type::Boolean,
            Boxed::Byte(_) => Type::Byte,
            Boxed::Char(_) => Type::Char,
            Boxed::Short(_) => Type::Short,
            Boxed::Integer(_) => Type::Int,
            Boxed::Long(_) => Type::Long,
            Boxed::Float(_) => Type::Float,
            Boxed::Double(_) => Type::Double,
        }
    }

    /// Internal name of the wrapper class
    pub fn class_name(&self) -> &'static str {
        self.primitive().boxing_type().unwrap_or(consts::OBJECT_CLASS)
    }

    /// Box a stack value as the given primitive type, as `Wrapper.valueOf` does
    pub fn from_stack(ty: &Type, value: &Value) -> Option<Boxed> {
        let boxed = match (ty, value) {
            (Type::Boolean, Value::Int(v)) => Boxed::Boolean(*v != 0),
            (Type::Byte, Value::Int(v)) => Boxed::Byte(*v as i8),
            (Type::Char, Value::Int(v)) => Boxed::Char(*v as u16),
            (Type::Short, Value::Int(v)) => Boxed::Short(*v as i16),
            (Type::Int, Value::Int(v)) => Boxed::Integer(*v),
            (Type::Long, Value::Long(v)) => Boxed::Long(*v),
            (Type::Float, Value::Float(v)) => Boxed::Float(*v),
            (Type::Double, Value::Double(v)) => Boxed::Double(*v),
            _ => return None,
        };
        Some(boxed)
    }

    /// Stack form of the boxed primitive, as `Wrapper.xValue()` returns it
    pub fn to_stack(&self) -> Value {
        match *self {
            Boxed::Boolean(v) => Value::Int(v as i32),
            Boxed::Byte(v) => Value::Int(v as i32),
            Boxed::Char(v) => Value::Int(v as i32),
            Boxed::Short(v) => Value::Int(v as i32),
            Boxed::Integer(v) => Value::Int(v),
            Boxed::Long(v) => Value::Long(v),
            Boxed::Float(v) => Value::Float(v),
            Boxed::Double(v) => Value::Double(v),
        }
    }

    /// Whether the wrapper extends `java/lang/Number`
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Boxed::Boolean(_) | Boxed::Char(_))
    }
}

impl fmt::Display for Boxed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boxed::Boolean(v) => write!(f, "{}", v),
            Boxed::Byte(v) => write!(f, "(byte) {}", v),
            Boxed::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "{:?}", c),
                None => write!(f, "(char) {}", v),
            },
            Boxed::Short(v) => write!(f, "(short) {}", v),
            Boxed::Integer(v) => write!(f, "{}", v),
            Boxed::Long(v) => write!(f, "{}L", v),
            Boxed::Float(v) => write!(f, "{}F", v),
            Boxed::Double(v) => write!(f, "{}D", v),
        }
    }
}

/// Opaque instance of a class the interpreter knows only by name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub class: String,
    pub id: u32,
}

impl ObjectRef {
    pub fn new(class: &str, id: u32) -> Self {
        Self {
            class: class.to_string(),
            id,
        }
    }
}

/// Handle to an argument bundle living on the interpreter heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BundleRef(pub usize);

impl fmt::Display for BundleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Args@{}", self.0)
    }
}

/// A value on the operand stack, in a local, or inside a bundle
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    Boxed(Boxed),
    Str(String),
    Object(ObjectRef),
    Bundle(BundleRef),
}

impl Value {
    /// Slots this value takes on the operand stack
    pub fn size(&self) -> u16 {
        match self {
            Value::Long(_) | Value::Double(_) => 2,
            _ => 1,
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Double(_))
    }

    pub fn integer(value: i32) -> Self {
        Value::Boxed(Boxed::Integer(value))
    }

    pub fn string(value: &str) -> Self {
        Value::Str(value.to_string())
    }

    pub fn object(class: &str, id: u32) -> Self {
        Value::Object(ObjectRef::new(class, id))
    }

    /// INSTANCEOF semantics; `null` is an instance of nothing
    ///
    /// Opaque objects only know their own class, so they match it and `java/lang/Object`.
    pub fn is_instance_of(&self, internal_name: &str, args_class: &str) -> bool {
        match self {
            Value::Boxed(boxed) => {
                boxed.class_name() == internal_name
                    || consts::BOXED_SUPERTYPES.contains(&internal_name)
                    || (boxed.is_numeric() && internal_name == consts::NUMBER_CLASS)
            }
            Value::Str(_) => consts::STRING_SUPERTYPES.contains(&internal_name),
            Value::Object(object) => object.class == internal_name || internal_name == consts::OBJECT_CLASS,
            Value::Bundle(_) => internal_name == args_class || internal_name == consts::OBJECT_CLASS,
            _ => false,
        }
    }

    /// Whether this value may be stored where `ty` is declared; `null` fits any reference
    pub fn is_assignable_to(&self, ty: &Type, args_class: &str) -> bool {
        match (self, ty) {
            (Value::Null, ty) => ty.is_reference(),
            (value, Type::Object(name)) => value.is_instance_of(name, args_class),
            _ => false,
        }
    }

    /// Name of the value's type for error messages
    pub fn type_name(&self) -> String {
        match self {
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Null => "null".to_string(),
            Value::Boxed(boxed) => boxed.class_name().replace('/', "."),
            Value::Str(_) => "java.lang.String".to_string(),
            Value::Object(object) => object.class.replace('/', "."),
            Value::Bundle(_) => "Args".to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}F", v),
            Value::Double(v) => write!(f, "{}D", v),
            Value::Null => write!(f, "null"),
            Value::Boxed(boxed) => write!(f, "{}", boxed),
            Value::Str(v) => write!(f, "{:?}", v),
            Value::Object(object) => write!(f, "{}@{}", object.class.replace('/', "."), object.id),
            Value::Bundle(bundle) => write!(f, "{}", bundle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boxing_narrows_like_value_of() {
        assert_eq!(Boxed::from_stack(&Type::Byte, &Value::Int(300)), Some(Boxed::Byte(44)));
        assert_eq!(Boxed::from_stack(&Type::Boolean, &Value::Int(2)), Some(Boxed::Boolean(true)));
        assert_eq!(Boxed::from_stack(&Type::Long, &Value::Int(1)), None);
        assert_eq!(Boxed::Char(65).to_stack(), Value::Int(65));
    }

    #[test]
    fn test_instance_checks() {
        let args = consts::ARGS_CLASS;
        assert!(Value::integer(1).is_instance_of("java/lang/Number", args));
        assert!(!Value::Boxed(Boxed::Boolean(true)).is_instance_of("java/lang/Number", args));
        assert!(Value::string("x").is_instance_of("java/lang/CharSequence", args));
        assert!(!Value::Null.is_instance_of("java/lang/Object", args));
        assert!(Value::Null.is_assignable_to(&Type::object("p/Foo"), args));
        assert!(!Value::Null.is_assignable_to(&Type::Int, args));
        assert!(!Value::object("p/Foo", 1).is_assignable_to(&Type::object("p/Bar"), args));
    }
}
