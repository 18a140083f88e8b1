//! Type and method descriptors
//!
//! Descriptors are tokenized with logos and parsed into [`Type`] values. [`resolve`] is the
//! argument descriptor resolver used by the injectors: it turns a call's method descriptor
//! into the ordered list of argument types, slot widths and primitive flags.

use std::fmt;

use logos::Logos;

use super::error::{DescriptorError, DescriptorResult};
use super::opcodes;

/// Descriptor tokens
#[derive(Logos, Debug, PartialEq, Clone, Copy)]
enum Token {
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    Array,
    #[token("V")]
    Void,
    #[token("Z")]
    Boolean,
    #[token("B")]
    Byte,
    #[token("C")]
    Char,
    #[token("S")]
    Short,
    #[token("I")]
    Int,
    #[token("F")]
    Float,
    #[token("J")]
    Long,
    #[token("D")]
    Double,
    #[regex(r"L[^;\[\(\)]+;")]
    Object,
}

/// Tokenize a descriptor, returning the byte offset of the first unrecognised input on failure
fn tokenize(descriptor: &str) -> Result<Vec<(Token, &str)>, usize> {
    let mut lexer = Token::lexer(descriptor);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(token) => tokens.push((token, lexer.slice())),
            Err(_) => return Err(lexer.span().start),
        }
    }
    Ok(tokens)
}

struct TypeParser<'a> {
    tokens: Vec<(Token, &'a str)>,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn new(tokens: Vec<(Token, &'a str)>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn next(&mut self) -> Option<(Token, &'a str)> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse one field type (anything but `V`)
    fn parse_field_type(&mut self) -> Option<Type> {
        let (token, slice) = self.next()?;
        let ty = match token {
            Token::Boolean => Type::Boolean,
            Token::Byte => Type::Byte,
            Token::Char => Type::Char,
            Token::Short => Type::Short,
            Token::Int => Type::Int,
            Token::Float => Type::Float,
            Token::Long => Type::Long,
            Token::Double => Type::Double,
            Token::Object => Type::Object(slice[1..slice.len() - 1].to_string()),
            Token::Array => Type::Array(Box::new(self.parse_field_type()?)),
            Token::Void | Token::LParen | Token::RParen => return None,
        };
        Some(ty)
    }

    fn parse_return_type(&mut self) -> Option<Type> {
        if self.peek() == Some(Token::Void) {
            self.next();
            return Some(Type::Void);
        }
        self.parse_field_type()
    }
}

/// A JVM type as it appears in descriptors
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Float,
    Long,
    Double,
    /// Class or interface, by internal name (`java/lang/String`)
    Object(String),
    Array(Box<Type>),
}

impl Type {
    /// Parse a field descriptor (or `V`)
    pub fn parse(descriptor: &str) -> DescriptorResult<Type> {
        let invalid = || DescriptorError::InvalidTypeDescriptor {
            descriptor: descriptor.to_string(),
        };
        let tokens = tokenize(descriptor).map_err(|_| invalid())?;
        let mut parser = TypeParser::new(tokens);
        let ty = parser.parse_return_type().ok_or_else(invalid)?;
        if !parser.at_end() {
            return Err(invalid());
        }
        Ok(ty)
    }

    pub fn object(internal_name: impl Into<String>) -> Self {
        Type::Object(internal_name.into())
    }

    pub fn descriptor(&self) -> String {
        match self {
            Type::Void => "V".to_string(),
            Type::Boolean => "Z".to_string(),
            Type::Byte => "B".to_string(),
            Type::Char => "C".to_string(),
            Type::Short => "S".to_string(),
            Type::Int => "I".to_string(),
            Type::Float => "F".to_string(),
            Type::Long => "J".to_string(),
            Type::Double => "D".to_string(),
            Type::Object(name) => format!("L{};", name),
            Type::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    /// Number of operand stack (and local variable) slots a value of this type occupies
    pub fn size(&self) -> u16 {
        match self {
            Type::Void => 0,
            Type::Long | Type::Double => 2,
            _ => 1,
        }
    }

    pub fn is_primitive(&self) -> bool {
        !matches!(self, Type::Void | Type::Object(_) | Type::Array(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Object(_) | Type::Array(_))
    }

    /// Name usable as a CHECKCAST operand: the internal name for classes, the descriptor
    /// for arrays and primitives
    pub fn internal_name(&self) -> String {
        match self {
            Type::Object(name) => name.clone(),
            other => other.descriptor(),
        }
    }

    /// Wrapper class for primitive types
    pub fn boxing_type(&self) -> Option<&'static str> {
        match self {
            Type::Boolean => Some("java/lang/Boolean"),
            Type::Byte => Some("java/lang/Byte"),
            Type::Char => Some("java/lang/Character"),
            Type::Short => Some("java/lang/Short"),
            Type::Int => Some("java/lang/Integer"),
            Type::Float => Some("java/lang/Float"),
            Type::Long => Some("java/lang/Long"),
            Type::Double => Some("java/lang/Double"),
            _ => None,
        }
    }

    /// Wrapper method that yields the primitive value back
    pub fn unboxing_method(&self) -> Option<&'static str> {
        match self {
            Type::Boolean => Some("booleanValue"),
            Type::Byte => Some("byteValue"),
            Type::Char => Some("charValue"),
            Type::Short => Some("shortValue"),
            Type::Int => Some("intValue"),
            Type::Float => Some("floatValue"),
            Type::Long => Some("longValue"),
            Type::Double => Some("doubleValue"),
            _ => None,
        }
    }

    /// Primitive type boxed by the given wrapper class
    pub fn from_boxing_type(internal_name: &str) -> Option<Type> {
        let ty = match internal_name {
            "java/lang/Boolean" => Type::Boolean,
            "java/lang/Byte" => Type::Byte,
            "java/lang/Character" => Type::Char,
            "java/lang/Short" => Type::Short,
            "java/lang/Integer" => Type::Int,
            "java/lang/Float" => Type::Float,
            "java/lang/Long" => Type::Long,
            "java/lang/Double" => Type::Double,
            _ => return None,
        };
        Some(ty)
    }

    /// Local variable load opcode for this type
    pub fn load_opcode(&self) -> Option<u8> {
        match self {
            Type::Void => None,
            Type::Boolean | Type::Byte | Type::Char | Type::Short | Type::Int => Some(opcodes::ILOAD),
            Type::Float => Some(opcodes::FLOAD),
            Type::Long => Some(opcodes::LLOAD),
            Type::Double => Some(opcodes::DLOAD),
            Type::Object(_) | Type::Array(_) => Some(opcodes::ALOAD),
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Boolean => write!(f, "boolean"),
            Type::Byte => write!(f, "byte"),
            Type::Char => write!(f, "char"),
            Type::Short => write!(f, "short"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Long => write!(f, "long"),
            Type::Double => write!(f, "double"),
            Type::Object(name) => write!(f, "{}", name.replace('/', ".")),
            Type::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Parsed method descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub args: Vec<Type>,
    pub ret: Type,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> DescriptorResult<MethodDescriptor> {
        let tokens = tokenize(descriptor).map_err(|offset| {
            DescriptorError::method(descriptor, format!("unexpected input at offset {}", offset))
        })?;
        let mut parser = TypeParser::new(tokens);

        if parser.next().map(|(token, _)| token) != Some(Token::LParen) {
            return Err(DescriptorError::method(descriptor, "missing '('"));
        }
        let mut args = Vec::new();
        loop {
            match parser.peek() {
                Some(Token::RParen) => {
                    parser.next();
                    break;
                }
                Some(_) => {
                    let arg = parser.parse_field_type().ok_or_else(|| {
                        DescriptorError::method(descriptor, format!("malformed argument {}", args.len()))
                    })?;
                    args.push(arg);
                }
                None => return Err(DescriptorError::method(descriptor, "missing ')'")),
            }
        }
        let ret = parser
            .parse_return_type()
            .ok_or_else(|| DescriptorError::method(descriptor, "malformed return type"))?;
        if !parser.at_end() {
            return Err(DescriptorError::method(descriptor, "trailing input after return type"));
        }

        Ok(MethodDescriptor { args, ret })
    }

    /// Total slots taken by the arguments (receiver excluded)
    pub fn arg_slots(&self) -> u16 {
        arg_slots(&self.args)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", method_descriptor(&self.args, &self.ret))
    }
}

/// One resolved call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentDescriptor {
    /// Declared position, 0 is the first parameter
    pub index: usize,
    pub ty: Type,
}

impl ArgumentDescriptor {
    pub fn width(&self) -> u16 {
        self.ty.size()
    }

    pub fn is_primitive(&self) -> bool {
        self.ty.is_primitive()
    }
}

/// Resolve the ordered argument descriptors of a call
pub fn resolve(call_descriptor: &str) -> DescriptorResult<Vec<ArgumentDescriptor>> {
    let parsed = MethodDescriptor::parse(call_descriptor)?;
    Ok(parsed
        .args
        .into_iter()
        .enumerate()
        .map(|(index, ty)| ArgumentDescriptor { index, ty })
        .collect())
}

pub fn arg_slots(args: &[Type]) -> u16 {
    args.iter().map(Type::size).sum()
}

pub fn method_descriptor(params: &[Type], ret: &Type) -> String {
    let mut d = String::new();
    d.push('(');
    for p in params {
        d.push_str(&p.descriptor());
    }
    d.push(')');
    d.push_str(&ret.descriptor());
    d
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mixed_arguments() {
        let args = resolve("(IJLjava/lang/String;[[DZ)V").unwrap();
        assert_eq!(args.len(), 5);
        assert_eq!(args[0].ty, Type::Int);
        assert_eq!(args[1].width(), 2);
        assert_eq!(args[2].ty, Type::object("java/lang/String"));
        assert!(!args[2].is_primitive());
        assert_eq!(
            args[3].ty,
            Type::Array(Box::new(Type::Array(Box::new(Type::Double))))
        );
        assert_eq!(args[3].width(), 1);
        assert_eq!(args[4].ty, Type::Boolean);
        assert_eq!(args[4].index, 4);
    }

    #[test]
    fn test_class_names_with_primitive_letters() {
        let parsed = MethodDescriptor::parse("(LIJ;LDouble;)LVoid;").unwrap();
        assert_eq!(parsed.args, vec![Type::object("IJ"), Type::object("Double")]);
        assert_eq!(parsed.ret, Type::object("Void"));
    }

    #[test]
    fn test_malformed_descriptors() {
        for bad in ["", "IJ)V", "(I", "(V)V", "(I)", "(I)VV", "(Ljava/lang/String)V", "([)V", "(Q)V"] {
            assert!(MethodDescriptor::parse(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_field_type_parse_and_display() {
        let ty = Type::parse("[Ljava/util/List;").unwrap();
        assert_eq!(ty.to_string(), "java.util.List[]");
        assert_eq!(ty.internal_name(), "[Ljava/util/List;");
        assert!(Type::parse("II").is_err());
    }
}
