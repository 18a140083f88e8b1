//! Ordered, handle-addressed instruction list for one method body

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use super::error::{BytecodeError, BytecodeResult};
use super::insn::Insn;
use super::stack::StackState;

/// Stable handle to an instruction; survives insertions around it
///
/// A handle is only valid for the list that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InsnId {
    list: u32,
    index: u32,
}

impl fmt::Display for InsnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

fn fresh_list_id() -> u32 {
    static NEXT: AtomicU32 = AtomicU32::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Instruction list
///
/// Instructions live in an arena indexed by [`InsnId`]; `order` holds the program order.
/// A clone keeps the id, so handles stay valid across it.
#[derive(Debug, Clone)]
pub struct InsnList {
    id: u32,
    nodes: Vec<Insn>,
    order: Vec<InsnId>,
}

impl Default for InsnList {
    fn default() -> Self {
        Self {
            id: fresh_list_id(),
            nodes: Vec::new(),
            order: Vec::new(),
        }
    }
}

impl InsnList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Append an instruction, returning its handle
    pub fn add(&mut self, insn: Insn) -> InsnId {
        let id = self.alloc(insn);
        self.order.push(id);
        id
    }

    pub fn add_all<I>(&mut self, insns: I) -> Vec<InsnId>
    where
        I: IntoIterator<Item = Insn>,
    {
        insns.into_iter().map(|insn| self.add(insn)).collect()
    }

    fn alloc(&mut self, insn: Insn) -> InsnId {
        let id = InsnId {
            list: self.id,
            index: self.nodes.len() as u32,
        };
        self.nodes.push(insn);
        id
    }

    pub fn get(&self, id: InsnId) -> Option<&Insn> {
        self.position(id).map(|_| &self.nodes[id.index as usize])
    }

    /// Whether `id` was issued by this list
    pub fn owns(&self, id: InsnId) -> bool {
        id.list == self.id && (id.index as usize) < self.nodes.len()
    }

    /// Program-order index of an instruction; `None` for handles from another list
    pub fn position(&self, id: InsnId) -> Option<usize> {
        if !self.owns(id) {
            return None;
        }
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Handle at a program-order index
    pub fn id_at(&self, index: usize) -> Option<InsnId> {
        self.order.get(index).copied()
    }

    /// Splice `insns` in immediately before `anchor` as one operation
    pub fn insert_before(&mut self, anchor: InsnId, insns: Vec<Insn>) -> BytecodeResult<Vec<InsnId>> {
        let at = self.position(anchor).ok_or_else(|| BytecodeError::UnknownInsn { id: anchor.to_string() })?;
        let ids: Vec<InsnId> = insns.into_iter().map(|insn| self.alloc(insn)).collect();
        self.order.splice(at..at, ids.iter().copied());
        Ok(ids)
    }

    pub fn iter(&self) -> impl Iterator<Item = (InsnId, &Insn)> + '_ {
        self.order.iter().map(move |id| (*id, &self.nodes[id.index as usize]))
    }

    pub fn insns(&self) -> impl Iterator<Item = &Insn> + '_ {
        self.iter().map(|(_, insn)| insn)
    }

    /// Operand stack depth right before `anchor` executes
    pub fn stack_depth_before(&self, anchor: InsnId) -> BytecodeResult<u16> {
        let at = self.position(anchor).ok_or_else(|| BytecodeError::UnknownInsn { id: anchor.to_string() })?;
        let state = StackState::simulate(0, self.insns().take(at))?;
        Ok(state.depth)
    }

    /// Highest operand stack depth reached by the whole list
    pub fn max_stack_depth(&self) -> BytecodeResult<u16> {
        Ok(StackState::simulate(0, self.insns())?.max_depth)
    }

    /// Textual listing, one instruction per line
    pub fn listing(&self) -> String {
        let mut out = String::new();
        for (index, insn) in self.insns().enumerate() {
            out.push_str(&format!("{:4}: {}\n", index, insn));
        }
        out
    }
}

impl fmt::Display for InsnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.listing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::insn::MarkerKind;
    use crate::codegen::opcodes;

    #[test]
    fn test_insert_before_keeps_handles_stable() {
        let mut list = InsnList::new();
        let a = list.add(Insn::op(opcodes::ICONST_1));
        let b = list.add(Insn::op(opcodes::POP));
        let inserted = list
            .insert_before(b, vec![Insn::op(opcodes::DUP), Insn::op(opcodes::POP)])
            .unwrap();

        assert_eq!(list.len(), 4);
        assert_eq!(list.position(a), Some(0));
        assert_eq!(list.position(inserted[0]), Some(1));
        assert_eq!(list.position(inserted[1]), Some(2));
        assert_eq!(list.position(b), Some(3));
        assert_eq!(list.get(b), Some(&Insn::op(opcodes::POP)));
    }

    #[test]
    fn test_insert_before_unknown_anchor_leaves_list_untouched() {
        let mut list = InsnList::new();
        list.add(Insn::op(opcodes::NOP));
        let mut other = InsnList::new();
        other.add(Insn::op(opcodes::NOP));
        let foreign = other.add(Insn::op(opcodes::NOP));

        let err = list.insert_before(foreign, vec![Insn::op(opcodes::NOP)]).unwrap_err();
        assert!(matches!(err, BytecodeError::UnknownInsn { .. }));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_handles_are_bound_to_their_list() {
        let mut list = InsnList::new();
        let own = list.add(Insn::op(opcodes::ICONST_1));
        list.add(Insn::op(opcodes::POP));
        let mut other = InsnList::new();
        let foreign = other.add(Insn::op(opcodes::NOP));

        assert!(list.owns(own));
        assert!(!list.owns(foreign));
        assert_eq!(list.position(foreign), None);
        assert_eq!(list.get(foreign), None);
        assert!(list.insert_before(foreign, vec![Insn::op(opcodes::NOP)]).is_err());
        assert!(list.stack_depth_before(foreign).is_err());
        assert_eq!(list.len(), 2);

        let copy = list.clone();
        assert_eq!(copy.position(own), Some(0));
    }

    #[test]
    fn test_stack_depth_before_and_markers() {
        let mut list = InsnList::new();
        list.add(Insn::Marker(MarkerKind::BodyStart));
        list.add(Insn::op(opcodes::LCONST_0));
        list.add(Insn::op(opcodes::ICONST_2));
        let call = list.add(Insn::invoke_static("p/A", "f", "(JI)V"));
        list.add(Insn::op(opcodes::RETURN));

        assert_eq!(list.stack_depth_before(call).unwrap(), 3);
        assert_eq!(list.max_stack_depth().unwrap(), 3);
        assert!(list.listing().contains("INVOKESTATIC p/A.f (JI)V"));
    }
}
