// Common test utilities
#![allow(dead_code)]

use argsplice::codegen::{opcodes, Insn, InsnId, InsnList, Target};
use argsplice::rt::{BundleRef, Host, InterpResult, Interpreter, Outcome, Value};
use argsplice::{Config, ModifyArgsInjector};

pub fn init_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
}

/// Internal name of the default bundle class
pub fn args_class() -> &'static str {
    &Config::global().args_class
}

pub fn short_desc() -> String {
    format!("(L{};)V", args_class())
}

/// Target whose body is `loads`, `call`, `tail`
pub fn target_with_call(
    desc: &str,
    is_static: bool,
    loads: Vec<Insn>,
    call: Insn,
    tail: Vec<Insn>,
) -> (Target, InsnId) {
    let mut insns = InsnList::new();
    insns.add_all(loads);
    let call = insns.add(call);
    insns.add_all(tail);
    let target = Target::new("p/Target", "run", desc, is_static, insns).expect("valid target");
    (target, call)
}

/// Tail for a void method
pub fn ret() -> Vec<Insn> {
    vec![Insn::op(opcodes::RETURN)]
}

/// Inject and return the inserted region
pub fn inject_region(injector: &ModifyArgsInjector<'_>, target: &mut Target, call: InsnId) -> Vec<Insn> {
    let start = target.insns.position(call).expect("call site in target");
    injector.inject(target, call).expect("injection succeeds");
    let end = target.insns.position(call).expect("call site survives");
    target.insns.insns().skip(start).take(end - start).cloned().collect()
}

pub fn run(target: &Target, arguments: Vec<Value>, host: &mut dyn Host) -> InterpResult<Outcome> {
    init_logger();
    Interpreter::new(Config::global()).run(&target.insns, arguments, host)
}

pub fn bundle_arg(arguments: &[Value]) -> BundleRef {
    match arguments.first() {
        Some(Value::Bundle(bundle)) => *bundle,
        other => panic!("expected a bundle as first handler argument, got {:?}", other),
    }
}
