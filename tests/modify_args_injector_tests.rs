mod common;

use argsplice::codegen::{opcodes, Insn, InsnList, StackState};
use argsplice::inject::{HandlerRef, HandlerShapes, InjectionError};
use argsplice::{Config, Error, ModifyArgsInjector};
use common::*;

fn handler(desc: &str) -> HandlerRef {
    HandlerRef::new("p/Target", "modify", desc)
}

fn long_desc(rest: &str) -> String {
    format!("(L{};{})V", args_class(), rest)
}

#[test]
fn test_region_is_stack_neutral() {
    init_logger();
    let (mut target, call) = target_with_call(
        "(Lp/Obj;JI)V",
        false,
        vec![
            Insn::var(opcodes::ALOAD, 1),
            Insn::var(opcodes::LLOAD, 2),
            Insn::var(opcodes::ILOAD, 4),
            Insn::ldc(argsplice::codegen::Constant::String("s".into())),
        ],
        Insn::invoke_virtual("p/Obj", "f", "(JILjava/lang/String;)V"),
        ret(),
    );
    let base = target.insns.stack_depth_before(call).unwrap();
    let injector = ModifyArgsInjector::with_default_config(handler(&short_desc()));
    let region = inject_region(&injector, &mut target, call);

    let after = StackState::simulate(base, &region).unwrap();
    assert_eq!(after.depth, base);
    assert_eq!(target.insns.stack_depth_before(call).unwrap(), base);
    assert!(target.is_injected(call));
}

#[test]
fn test_short_form_loads_only_the_handler_receiver() {
    let (mut target, call) = target_with_call(
        "(II)V",
        false,
        vec![Insn::var(opcodes::ILOAD, 1), Insn::var(opcodes::ILOAD, 2)],
        Insn::invoke_static("p/Callee", "f", "(II)V"),
        ret(),
    );
    let injector = ModifyArgsInjector::with_default_config(handler(&short_desc()));
    let region = inject_region(&injector, &mut target, call);

    let loads: Vec<&Insn> = region.iter().filter(|insn| matches!(insn, Insn::Var { .. })).collect();
    assert_eq!(loads, vec![&Insn::var(opcodes::ALOAD, 0)]);

    let h = region
        .iter()
        .position(|insn| insn.as_method().map_or(false, |m| m.name == "modify"))
        .unwrap();
    assert_eq!(
        region[h - 3..h],
        [Insn::op(opcodes::DUP), Insn::var(opcodes::ALOAD, 0), Insn::op(opcodes::SWAP)]
    );
    assert_eq!(region[h], Insn::invoke_virtual("p/Target", "modify", &short_desc()));
}

#[test]
fn test_long_form_loads_enclosing_arguments() {
    let (mut target, call) = target_with_call(
        "(Lp/Obj;JI)V",
        false,
        vec![Insn::var(opcodes::ALOAD, 1), Insn::op(opcodes::ICONST_5)],
        Insn::invoke_virtual("p/Obj", "f", "(I)V"),
        ret(),
    );
    let desc = long_desc("Lp/Obj;JI");
    let injector = ModifyArgsInjector::with_default_config(handler(&desc));
    let region = inject_region(&injector, &mut target, call);

    let h = region
        .iter()
        .position(|insn| insn.as_method().map_or(false, |m| m.name == "modify"))
        .unwrap();
    assert_eq!(
        region[h - 6..h],
        [
            Insn::op(opcodes::DUP),
            Insn::var(opcodes::ALOAD, 0),
            Insn::op(opcodes::SWAP),
            Insn::var(opcodes::ALOAD, 1),
            Insn::var(opcodes::LLOAD, 2),
            Insn::var(opcodes::ILOAD, 4),
        ]
    );
}

#[test]
fn test_static_long_form_starts_at_slot_zero() {
    let (mut target, call) = target_with_call(
        "(DI)V",
        true,
        vec![Insn::var(opcodes::ILOAD, 2)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let injector = ModifyArgsInjector::with_default_config(handler(&long_desc("DI")).as_static());
    let region = inject_region(&injector, &mut target, call);

    let h = region.iter().position(|insn| insn.as_method().map_or(false, |m| m.name == "modify")).unwrap();
    assert_eq!(region[h - 3..h], [Insn::op(opcodes::DUP), Insn::var(opcodes::DLOAD, 0), Insn::var(opcodes::ILOAD, 2)]);
    assert_eq!(region[h].as_method().unwrap().opcode, opcodes::INVOKESTATIC);
    assert!(!region.iter().any(|insn| *insn == Insn::var(opcodes::ALOAD, 0)));
}

#[test]
fn test_private_handler_uses_invokespecial() {
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let injector = ModifyArgsInjector::with_default_config(handler(&short_desc()).as_private());
    let region = inject_region(&injector, &mut target, call);
    assert!(region.contains(&Insn::invoke(opcodes::INVOKESPECIAL, "p/Target", "modify", &short_desc())));
}

#[test]
fn test_max_stack_is_raised_to_the_region_peak() {
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    assert_eq!(target.max_stack, 1);
    ModifyArgsInjector::with_default_config(handler(&short_desc())).inject(&mut target, call).unwrap();
    assert_eq!(target.max_stack, 3);
    assert_eq!(target.max_stack, target.insns.max_stack_depth().unwrap());

    let (mut target, call) = target_with_call(
        "()V",
        true,
        vec![Insn::op(opcodes::DCONST_1)],
        Insn::invoke_static("p/Callee", "f", "(D)V"),
        ret(),
    );
    ModifyArgsInjector::with_default_config(handler(&short_desc()).as_static()).inject(&mut target, call).unwrap();
    assert_eq!(target.max_stack, 4);
}

#[test]
fn test_max_stack_is_never_lowered() {
    let (target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let mut target = target.with_max_stack(50);
    ModifyArgsInjector::with_default_config(handler(&short_desc())).inject(&mut target, call).unwrap();
    assert_eq!(target.max_stack, 50);
}

#[test]
fn test_invalid_signature_names_both_shapes_and_leaves_target_untouched() {
    let (mut target, call) = target_with_call(
        "(I)V",
        false,
        vec![Insn::var(opcodes::ILOAD, 1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let before = target.insns.listing();
    let bad = format!("(L{};J)V", args_class());
    let err = ModifyArgsInjector::with_default_config(handler(&bad)).inject(&mut target, call).unwrap_err();

    let shapes = HandlerShapes::for_target(args_class(), &target);
    assert_eq!(
        err,
        InjectionError::InvalidSignature {
            injector: format!("@ModifyArgs injector p/Target::modify{}", bad),
            found: bad.clone(),
            short: shapes.short.clone(),
            long: shapes.long.clone(),
        }
    );
    let message = err.to_string();
    assert!(message.contains(&shapes.short) && message.contains(&shapes.long));
    assert_eq!(target.insns.listing(), before);
    assert_eq!(target.max_stack, 1);
    assert!(!target.is_injected(call));
}

#[test]
fn test_zero_arity_call_is_rejected() {
    let (mut target, call) = target_with_call("()V", false, vec![], Insn::invoke_static("p/Callee", "tick", "()V"), ret());
    let err = ModifyArgsInjector::with_default_config(handler(&short_desc())).inject(&mut target, call).unwrap_err();
    assert!(matches!(err, InjectionError::ZeroArity { ref name, .. } if name == "tick"));
    assert_eq!(target.insns.len(), 2);
}

#[test]
fn test_call_site_must_be_an_invocation_of_this_target() {
    let mut insns = InsnList::new();
    let constant = insns.add(Insn::op(opcodes::ICONST_1));
    insns.add(Insn::op(opcodes::POP));
    insns.add(Insn::op(opcodes::RETURN));
    let mut target = argsplice::Target::new("p/Target", "run", "()V", false, insns).unwrap();
    let injector = ModifyArgsInjector::with_default_config(handler(&short_desc()));

    let err = injector.inject(&mut target, constant).unwrap_err();
    assert!(matches!(err, InjectionError::NotAnInvocation { .. }));

    let mut other = InsnList::new();
    for _ in 0..10 {
        other.add(Insn::op(opcodes::NOP));
    }
    let foreign = other.id_at(9).unwrap();
    let err = injector.inject(&mut target, foreign).unwrap_err();
    assert!(matches!(err, InjectionError::UnknownCallSite { .. }));
    assert_eq!(target.insns.len(), 3);
}

#[test]
fn test_handle_from_another_list_is_unknown_even_when_in_range() {
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let mut other = InsnList::new();
    other.add(Insn::op(opcodes::NOP));
    let foreign = other.add(Insn::op(opcodes::NOP));
    assert_eq!(other.position(foreign), target.insns.position(call));
    let before = target.insns.listing();

    let err = ModifyArgsInjector::with_default_config(handler(&short_desc()))
        .inject(&mut target, foreign)
        .unwrap_err();
    assert!(matches!(err, InjectionError::UnknownCallSite { .. }));
    assert_eq!(target.insns.listing(), before);
    assert_eq!(target.max_stack, 1);
    assert!(!target.is_injected(call));
}

#[test]
fn test_call_site_is_rewritten_once() {
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let injector = ModifyArgsInjector::with_default_config(handler(&short_desc()));
    injector.inject(&mut target, call).unwrap();
    let len = target.insns.len();

    let err = injector.inject(&mut target, call).unwrap_err();
    assert!(matches!(err, InjectionError::AlreadyInjected { .. }));
    assert_eq!(target.insns.len(), len);
}

#[test]
fn test_instance_handler_on_static_target_is_rejected() {
    let (mut target, call) = target_with_call(
        "()V",
        true,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let err = ModifyArgsInjector::with_default_config(handler(&short_desc())).inject(&mut target, call).unwrap_err();
    assert_eq!(
        err,
        InjectionError::StaticMismatch {
            injector: format!("@ModifyArgs injector p/Target::modify{}", short_desc()),
            target: "p/Target::run()V".to_string(),
        }
    );
}

#[test]
fn test_stack_limit_is_checked_before_mutation() {
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let config = Config::default().with_max_stack_limit(2);
    let err = ModifyArgsInjector::new(handler(&short_desc()), &config).inject(&mut target, call).unwrap_err();
    assert!(matches!(err, InjectionError::StackLimit { required: 3, limit: 2, .. }));
    assert_eq!(target.insns.len(), 3);
    assert_eq!(target.max_stack, 1);
}

#[test]
fn test_relocated_bundle_class() {
    let config = Config::default().with_args_class("shaded/Args").with_trace_listing(true);
    let (mut target, call) = target_with_call(
        "()V",
        false,
        vec![Insn::op(opcodes::ICONST_1)],
        Insn::invoke_static("p/Callee", "f", "(I)V"),
        ret(),
    );
    let injector = ModifyArgsInjector::new(handler("(Lshaded/Args;)V"), &config);
    let region = inject_region(&injector, &mut target, call);
    assert_eq!(region[1], Insn::invoke_static("shaded/Args", "of", "(I)Lshaded/Args;"));
    assert!(!target.insns.listing().contains("spongepowered"));
}

#[test]
fn test_crate_level_entry_point_wraps_errors() {
    let (mut target, call) = target_with_call("()V", false, vec![], Insn::invoke_static("p/Callee", "tick", "()V"), ret());
    let err = argsplice::modify_args(&mut target, call, handler(&short_desc()), Config::global()).unwrap_err();
    assert!(matches!(err, Error::Injection(InjectionError::ZeroArity { .. })));
    assert!(err.is_configuration());
}
