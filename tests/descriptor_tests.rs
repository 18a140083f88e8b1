use argsplice::codegen::{opcodes, resolve, DescriptorError, Insn, MethodDescriptor, Type};

#[test]
fn test_resolve_orders_arguments_by_declaration() {
    let args = resolve("(ZBCSIFJDLjava/lang/Object;[I)V").unwrap();
    let types: Vec<Type> = args.iter().map(|arg| arg.ty.clone()).collect();
    assert_eq!(
        types,
        vec![
            Type::Boolean,
            Type::Byte,
            Type::Char,
            Type::Short,
            Type::Int,
            Type::Float,
            Type::Long,
            Type::Double,
            Type::object("java/lang/Object"),
            Type::Array(Box::new(Type::Int)),
        ]
    );
    for (position, arg) in args.iter().enumerate() {
        assert_eq!(arg.index, position);
    }
    let primitives = args.iter().filter(|arg| arg.is_primitive()).count();
    assert_eq!(primitives, 8);
}

#[test]
fn test_slot_widths_match_call_stack_effect() {
    for desc in ["(IJ)V", "(DDLjava/lang/String;)J", "([J[D)I", "(JJJ)D"] {
        let widths: u16 = resolve(desc).unwrap().iter().map(|arg| arg.width()).sum();
        let static_call = Insn::invoke_static("p/A", "f", desc).stack_effect().unwrap();
        let virtual_call = Insn::invoke_virtual("p/A", "f", desc).stack_effect().unwrap();
        assert_eq!(static_call.pop, widths, "{}", desc);
        assert_eq!(virtual_call.pop, widths + 1, "{}", desc);
    }
}

#[test]
fn test_no_argument_descriptor_resolves_empty() {
    assert!(resolve("()Ljava/lang/String;").unwrap().is_empty());
}

#[test]
fn test_malformed_descriptor_is_reported() {
    let err = resolve("(IX)V").unwrap_err();
    assert!(matches!(err, DescriptorError::InvalidMethodDescriptor { ref descriptor, .. } if descriptor == "(IX)V"));
    assert!(err.to_string().contains("(IX)V"));
}

#[test]
fn test_boxing_metadata() {
    assert_eq!(Type::Char.boxing_type(), Some("java/lang/Character"));
    assert_eq!(Type::Char.unboxing_method(), Some("charValue"));
    assert_eq!(Type::from_boxing_type("java/lang/Short"), Some(Type::Short));
    assert_eq!(Type::object("java/lang/String").boxing_type(), None);
    assert_eq!(Type::Double.load_opcode(), Some(opcodes::DLOAD));
    assert_eq!(Type::Array(Box::new(Type::Long)).load_opcode(), Some(opcodes::ALOAD));
}

#[test]
fn test_method_descriptor_display_round_trips() {
    let desc = "(Ljava/util/List;[[JZ)[Ljava/lang/String;";
    assert_eq!(MethodDescriptor::parse(desc).unwrap().to_string(), desc);
}
