//! `@ModifyArgs` call-site rewriting
//!
//! The injector leaves the intercepted call in place and inserts a region right before it:
//!
//! 1. **pack**: the call's arguments, sitting on the operand stack, are moved one by one
//!    (last first) into a fresh argument bundle, boxing primitives on the way;
//! 2. **handler call**: the bundle is passed to the handler, together with the enclosing
//!    method's own arguments when the handler uses the long form;
//! 3. **unpack**: the bundle's values are read back (first first), unboxed or cast to the
//!    declared types, and left on the stack in the exact shape the call expects.
//!
//! Everything that can be wrong with the declaration is checked before the target is
//! touched. The region is built into a fresh buffer and spliced in with one insertion.

use super::error::{InjectionError, InjectionResult};
use super::handler::{HandlerForm, HandlerRef, HandlerShapes};
use crate::codegen::descriptor::method_descriptor;
use crate::codegen::{opcodes, resolve, ArgumentDescriptor, Constant, Insn, InsnId, MethodInsn, StackState, Target, Type};
use crate::config::Config;
use crate::consts;

/// Rewrites invocations so a handler can replace their arguments
#[derive(Debug, Clone)]
pub struct ModifyArgsInjector<'c> {
    config: &'c Config,
    handler: HandlerRef,
}

impl ModifyArgsInjector<'static> {
    pub fn with_default_config(handler: HandlerRef) -> Self {
        Self::new(handler, Config::global())
    }
}

impl<'c> ModifyArgsInjector<'c> {
    pub fn new(handler: HandlerRef, config: &'c Config) -> Self {
        Self { config, handler }
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// Rewrite `call_site` in `target`
    ///
    /// Either the whole region is inserted and the target's max stack raised, or an error is
    /// returned and the target is left exactly as it was. A call site is rewritten at most
    /// once per target.
    pub fn inject(&self, target: &mut Target, call_site: InsnId) -> InjectionResult<()> {
        let call = self.call_site(target, call_site)?;
        self.check_target(target)?;

        let args = resolve(&call.desc)?;
        if args.is_empty() {
            return Err(InjectionError::ZeroArity {
                injector: self.to_string(),
                name: call.name.clone(),
                desc: call.desc.clone(),
            });
        }
        let form = self.verify_target(target)?;
        log::debug!("{} intercepting {} in {} ({})", self, call, target, form);

        let mut insns = Vec::new();
        self.pack_args(&mut insns, &call.desc, &args);
        if form == HandlerForm::Long {
            self.load_target_args(&mut insns, target);
        }
        insns.push(self.handler.invocation());
        self.unpack_args(&mut insns, &args);

        let mut extension = target.extend_stack(call_site)?;
        let state = StackState::simulate(extension.base(), &insns)?;
        debug_assert_eq!(state.depth, extension.base(), "inserted region must be stack neutral");
        extension.reserve(state.peak_above(extension.base()));
        if extension.required() > self.config.max_stack_limit as u32 {
            return Err(InjectionError::StackLimit {
                injector: self.to_string(),
                required: extension.required(),
                limit: self.config.max_stack_limit,
                target: target.to_string(),
            });
        }

        if self.config.trace_listing {
            let listing: String = insns.iter().map(|insn| format!("    {}\n", insn)).collect();
            log::trace!("{} inserting before {}:\n{}", self, call_site, listing);
        }

        target.insns.insert_before(call_site, insns)?;
        target.mark_injected(call_site);
        let max_stack = extension.apply(target);
        log::debug!(
            "{} done, {} extra stack over {}, max stack now {}",
            self,
            extension.size(),
            extension.base(),
            max_stack
        );
        Ok(())
    }

    /// The located instruction, which must be an invocation not rewritten before
    fn call_site(&self, target: &Target, call_site: InsnId) -> InjectionResult<MethodInsn> {
        let insn = target.insns.get(call_site).ok_or_else(|| InjectionError::UnknownCallSite {
            id: call_site.to_string(),
            target: target.to_string(),
        })?;
        let call = insn.as_method().ok_or_else(|| InjectionError::NotAnInvocation {
            injector: self.to_string(),
            id: call_site.to_string(),
            insn: insn.to_string(),
        })?;
        if target.is_injected(call_site) {
            return Err(InjectionError::AlreadyInjected {
                injector: self.to_string(),
                id: call_site.to_string(),
                target: target.to_string(),
            });
        }
        Ok(call.clone())
    }

    /// An instance handler has no receiver to run on inside a static method
    fn check_target(&self, target: &Target) -> InjectionResult<()> {
        if target.is_static && !self.handler.is_static {
            return Err(InjectionError::StaticMismatch {
                injector: self.to_string(),
                target: target.to_string(),
            });
        }
        Ok(())
    }

    fn verify_target(&self, target: &Target) -> InjectionResult<HandlerForm> {
        let shapes = HandlerShapes::for_target(&self.config.args_class, target);
        shapes.classify(&self.handler.desc).ok_or_else(|| InjectionError::InvalidSignature {
            injector: self.to_string(),
            found: self.handler.desc.clone(),
            short: shapes.short.clone(),
            long: shapes.long.clone(),
        })
    }

    /// Replace the call's arguments on the stack with a bundle holding them
    ///
    /// Leaves `bundle, [receiver,] bundle` on the stack, ready for the handler call.
    fn pack_args(&self, insns: &mut Vec<Insn>, call_desc: &str, args: &[ArgumentDescriptor]) {
        let args_class = &self.config.args_class;
        insns.push(Insn::push_int(args.len() as i32));
        insns.push(Insn::invoke_static(args_class, consts::ARGS_FACTORY, &self.config.factory_desc()));
        insns.push(Insn::ldc(Constant::String(call_desc.to_string())));
        insns.push(Insn::invoke_virtual(args_class, consts::ARGS_SET_DESC, &self.config.set_desc_desc()));

        for arg in args.iter().rev() {
            // bring the value above the bundle
            if arg.width() == 2 {
                insns.push(Insn::op(opcodes::DUP_X2));
                insns.push(Insn::op(opcodes::POP));
            } else {
                insns.push(Insn::op(opcodes::SWAP));
            }
            if let Some(wrapper) = arg.ty.boxing_type() {
                let desc = method_descriptor(std::slice::from_ref(&arg.ty), &Type::object(wrapper));
                insns.push(Insn::invoke_static(wrapper, consts::BOX_METHOD, &desc));
            }
            insns.push(Insn::invoke_virtual(args_class, consts::ARGS_PUSH, &self.config.push_desc()));
        }

        insns.push(Insn::op(opcodes::DUP));
        if !self.handler.is_static {
            insns.push(Insn::var(opcodes::ALOAD, 0));
            insns.push(Insn::op(opcodes::SWAP));
        }
    }

    /// Long form: copies of the enclosing method's arguments, read from their locals
    fn load_target_args(&self, insns: &mut Vec<Insn>, target: &Target) {
        let mut slot = target.first_arg_slot();
        for ty in &target.arguments {
            insns.extend(Insn::load(ty, slot));
            slot += ty.size();
        }
    }

    /// Consume the bundle, leaving its values on the stack in declared order
    fn unpack_args(&self, insns: &mut Vec<Insn>, args: &[ArgumentDescriptor]) {
        let last = args.len() - 1;
        for arg in args {
            let more = arg.index < last;
            if more {
                insns.push(Insn::op(opcodes::DUP));
            }
            insns.push(Insn::push_int(arg.index as i32));
            insns.push(Insn::invoke_virtual(&self.config.args_class, consts::ARGS_GET, consts::ARGS_GET_DESC));
            match (arg.ty.boxing_type(), arg.ty.unboxing_method()) {
                (Some(wrapper), Some(unbox)) => {
                    insns.push(Insn::checkcast(wrapper));
                    insns.push(Insn::invoke_virtual(wrapper, unbox, &method_descriptor(&[], &arg.ty)));
                }
                _ => insns.push(Insn::checkcast(&arg.ty.internal_name())),
            }
            if more {
                // tuck the value under the bundle
                if arg.width() == 2 {
                    insns.push(Insn::op(opcodes::DUP2_X1));
                    insns.push(Insn::op(opcodes::POP2));
                } else {
                    insns.push(Insn::op(opcodes::SWAP));
                }
            }
        }
    }
}

impl std::fmt::Display for ModifyArgsInjector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} injector {}", consts::MODIFY_ARGS, self.handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::InsnList;

    fn target() -> (Target, InsnId) {
        let mut insns = InsnList::new();
        insns.add(Insn::op(opcodes::ACONST_NULL));
        insns.add(Insn::op(opcodes::DCONST_1));
        insns.add(Insn::op(opcodes::ICONST_2));
        let call = insns.add(Insn::invoke_virtual("p/Callee", "f", "(DI)V"));
        insns.add(Insn::op(opcodes::RETURN));
        (Target::new("p/Target", "run", "()V", true, insns).unwrap(), call)
    }

    #[test]
    fn test_wide_values_are_rotated_as_pairs() {
        let (mut target, call) = target();
        let handler = HandlerRef::new("p/Target", "h", "(Lorg/spongepowered/asm/mixin/injection/invoke/arg/Args;)V").as_static();
        ModifyArgsInjector::with_default_config(handler).inject(&mut target, call).unwrap();

        let listing = target.insns.listing();
        assert!(listing.contains("DUP_X2\n"));
        assert!(listing.contains("DUP2_X1\n"));
        assert!(listing.contains("INVOKESTATIC java/lang/Double.valueOf (D)Ljava/lang/Double;"));
        assert!(listing.contains("INVOKEVIRTUAL java/lang/Integer.intValue ()I"));
        assert_eq!(target.insns.stack_depth_before(call).unwrap(), 4);
    }

    #[test]
    fn test_display_names_the_handler() {
        let handler = HandlerRef::new("p/Target", "h", "(La/Args;)V");
        let config = Config::default();
        let injector = ModifyArgsInjector::new(handler, &config);
        assert_eq!(injector.to_string(), "@ModifyArgs injector p/Target::h(La/Args;)V");
    }
}
