//! Operand stack depth tracking
//!
//! Depth is simulated over straight-line code from each instruction's static stack effect.

use super::error::{BytecodeError, BytecodeResult};
use super::insn::Insn;

/// Running stack depth and the highest depth seen so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackState {
    /// Current stack depth
    pub depth: u16,
    /// Maximum stack depth seen
    pub max_depth: u16,
}

impl StackState {
    pub fn new(depth: u16) -> Self {
        Self { depth, max_depth: depth }
    }

    /// Apply one instruction's effect
    pub fn apply(&mut self, insn: &Insn) -> BytecodeResult<()> {
        let effect = insn.stack_effect()?;
        if effect.pop > self.depth {
            return Err(BytecodeError::StackUnderflow {
                insn: insn.to_string(),
                needed: effect.pop,
                available: self.depth,
            });
        }
        let depth = (self.depth - effect.pop) as u32 + effect.push as u32;
        self.depth = u16::try_from(depth).map_err(|_| BytecodeError::StackOverflow {
            insn: insn.to_string(),
            limit: u16::MAX,
        })?;
        self.max_depth = self.max_depth.max(self.depth);
        Ok(())
    }

    pub fn apply_all<'a, I>(&mut self, insns: I) -> BytecodeResult<()>
    where
        I: IntoIterator<Item = &'a Insn>,
    {
        for insn in insns {
            self.apply(insn)?;
        }
        Ok(())
    }

    /// Simulate a sequence starting at `depth`
    pub fn simulate<'a, I>(depth: u16, insns: I) -> BytecodeResult<StackState>
    where
        I: IntoIterator<Item = &'a Insn>,
    {
        let mut state = StackState::new(depth);
        state.apply_all(insns)?;
        Ok(state)
    }

    /// Depth reached above the starting point
    pub fn peak_above(&self, base: u16) -> u16 {
        self.max_depth.saturating_sub(base)
    }
}
