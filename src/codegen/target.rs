//! Target method: the body being rewritten plus the facts injectors need about it

use std::collections::HashSet;

use super::descriptor::{arg_slots, MethodDescriptor, Type};
use super::error::BytecodeResult;
use super::insn_list::{InsnId, InsnList};

/// A method body open for injection
#[derive(Debug, Clone)]
pub struct Target {
    /// Internal name of the declaring class
    pub owner: String,
    pub name: String,
    pub desc: String,
    pub is_static: bool,
    /// Declared argument types, receiver excluded
    pub arguments: Vec<Type>,
    pub insns: InsnList,
    pub max_stack: u16,
    pub max_locals: u16,
    /// Call sites already rewritten, so each is only intercepted once
    injected: HashSet<InsnId>,
}

impl Target {
    /// Build a target, deriving `max_stack` and `max_locals` from the body and descriptor
    pub fn new(owner: &str, name: &str, desc: &str, is_static: bool, insns: InsnList) -> BytecodeResult<Self> {
        let parsed = MethodDescriptor::parse(desc)?;
        let max_stack = insns.max_stack_depth()?;
        let max_locals = parsed.arg_slots() + if is_static { 0 } else { 1 };
        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
            is_static,
            arguments: parsed.args,
            insns,
            max_stack,
            max_locals,
            injected: HashSet::new(),
        })
    }

    /// Override the recorded max stack (as read from an existing Code attribute)
    pub fn with_max_stack(mut self, max_stack: u16) -> Self {
        self.max_stack = max_stack;
        self
    }

    /// Slots taken by the declared arguments
    pub fn arg_slots(&self) -> u16 {
        arg_slots(&self.arguments)
    }

    /// Local slot of the first declared argument
    pub fn first_arg_slot(&self) -> u16 {
        if self.is_static { 0 } else { 1 }
    }

    /// Start a stack extension based at the depth right before `at`
    pub fn extend_stack(&self, at: InsnId) -> BytecodeResult<StackExtension> {
        Ok(StackExtension::new(self.insns.stack_depth_before(at)?))
    }

    pub fn is_injected(&self, call_site: InsnId) -> bool {
        self.injected.contains(&call_site)
    }

    pub(crate) fn mark_injected(&mut self, call_site: InsnId) {
        self.injected.insert(call_site);
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}{}", self.owner, self.name, self.desc)
    }
}

/// Extra operand stack needed by code inserted at one point
///
/// `base` is the depth live at the insertion point; `size` is what the inserted code needs
/// on top of it. Applying commits `base + size` to the target's max stack without ever
/// lowering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackExtension {
    base: u16,
    size: u16,
}

impl StackExtension {
    pub fn new(base: u16) -> Self {
        Self { base, size: 0 }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn add(&mut self, slots: u16) -> &mut Self {
        self.size = self.size.saturating_add(slots);
        self
    }

    /// Make sure at least `extra` slots are reserved; reserving less is a no-op
    pub fn reserve(&mut self, extra: u16) -> &mut Self {
        self.size = self.size.max(extra);
        self
    }

    /// Depth the target must be able to hold
    pub fn required(&self) -> u32 {
        self.base as u32 + self.size as u32
    }

    /// Commit to the target, returning its resulting max stack
    pub fn apply(self, target: &mut Target) -> u16 {
        let required = u16::try_from(self.required()).unwrap_or(u16::MAX);
        target.max_stack = target.max_stack.max(required);
        target.max_stack
    }
}
