/// Java bytecode instruction opcodes
///
/// Only the opcodes the instruction model can carry are defined here. Values follow the
/// Java Virtual Machine Specification and are ordered by opcode value.

use super::insn::StackEffect;

// 0x00 - 0x0F: Constants
pub const NOP: u8 = 0x00;
pub const ACONST_NULL: u8 = 0x01;
pub const ICONST_M1: u8 = 0x02;
pub const ICONST_0: u8 = 0x03;
pub const ICONST_1: u8 = 0x04;
pub const ICONST_2: u8 = 0x05;
pub const ICONST_3: u8 = 0x06;
pub const ICONST_4: u8 = 0x07;
pub const ICONST_5: u8 = 0x08;
pub const LCONST_0: u8 = 0x09;
pub const LCONST_1: u8 = 0x0a;
pub const FCONST_0: u8 = 0x0b;
pub const FCONST_1: u8 = 0x0c;
pub const FCONST_2: u8 = 0x0d;
pub const DCONST_0: u8 = 0x0e;
pub const DCONST_1: u8 = 0x0f;

// 0x10 - 0x14: Extended constants
pub const BIPUSH: u8 = 0x10;
pub const SIPUSH: u8 = 0x11;
pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;

// 0x15 - 0x19: Loads
pub const ILOAD: u8 = 0x15;
pub const LLOAD: u8 = 0x16;
pub const FLOAD: u8 = 0x17;
pub const DLOAD: u8 = 0x18;
pub const ALOAD: u8 = 0x19;

// 0x36 - 0x3A: Stores
pub const ISTORE: u8 = 0x36;
pub const LSTORE: u8 = 0x37;
pub const FSTORE: u8 = 0x38;
pub const DSTORE: u8 = 0x39;
pub const ASTORE: u8 = 0x3a;

// 0x57 - 0x5F: Stack operations
pub const POP: u8 = 0x57;
pub const POP2: u8 = 0x58;
pub const DUP: u8 = 0x59;
pub const DUP_X1: u8 = 0x5a;
pub const DUP_X2: u8 = 0x5b;
pub const DUP2: u8 = 0x5c;
pub const DUP2_X1: u8 = 0x5d;
pub const DUP2_X2: u8 = 0x5e;
pub const SWAP: u8 = 0x5f;

// 0x60 - 0x63: Addition
pub const IADD: u8 = 0x60;
pub const LADD: u8 = 0x61;
pub const FADD: u8 = 0x62;
pub const DADD: u8 = 0x63;

// 0x85 - 0x88: Int/long conversions
pub const I2L: u8 = 0x85;
pub const L2I: u8 = 0x88;

// 0xAC - 0xB1: Returns
pub const IRETURN: u8 = 0xac;
pub const LRETURN: u8 = 0xad;
pub const FRETURN: u8 = 0xae;
pub const DRETURN: u8 = 0xaf;
pub const ARETURN: u8 = 0xb0;
pub const RETURN: u8 = 0xb1;

// 0xB2 - 0xC1: References
pub const GETSTATIC: u8 = 0xb2;
pub const PUTSTATIC: u8 = 0xb3;
pub const GETFIELD: u8 = 0xb4;
pub const PUTFIELD: u8 = 0xb5;
pub const INVOKEVIRTUAL: u8 = 0xb6;
pub const INVOKESPECIAL: u8 = 0xb7;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const NEW: u8 = 0xbb;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;

/// Stack effect, in slots, of an opcode that takes no operands.
///
/// Returns `None` for opcodes that need operands (or that this model does not carry).
pub fn zero_operand_effect(opcode: u8) -> Option<StackEffect> {
    let (pop, push) = match opcode {
        NOP => (0, 0),
        ACONST_NULL | ICONST_M1..=ICONST_5 | FCONST_0..=FCONST_2 => (0, 1),
        LCONST_0 | LCONST_1 | DCONST_0 | DCONST_1 => (0, 2),
        POP => (1, 0),
        POP2 => (2, 0),
        DUP => (1, 2),
        DUP_X1 => (2, 3),
        DUP_X2 => (3, 4),
        DUP2 => (2, 4),
        DUP2_X1 => (3, 5),
        DUP2_X2 => (4, 6),
        SWAP => (2, 2),
        IADD | FADD => (2, 1),
        LADD | DADD => (4, 2),
        I2L => (1, 2),
        L2I => (2, 1),
        IRETURN | FRETURN | ARETURN => (1, 0),
        LRETURN | DRETURN => (2, 0),
        RETURN => (0, 0),
        _ => return None,
    };
    Some(StackEffect::new(pop, push))
}

/// Mnemonic used in listings.
pub fn mnemonic(opcode: u8) -> &'static str {
    match opcode {
        NOP => "NOP",
        ACONST_NULL => "ACONST_NULL",
        ICONST_M1 => "ICONST_M1",
        ICONST_0 => "ICONST_0",
        ICONST_1 => "ICONST_1",
        ICONST_2 => "ICONST_2",
        ICONST_3 => "ICONST_3",
        ICONST_4 => "ICONST_4",
        ICONST_5 => "ICONST_5",
        LCONST_0 => "LCONST_0",
        LCONST_1 => "LCONST_1",
        FCONST_0 => "FCONST_0",
        FCONST_1 => "FCONST_1",
        FCONST_2 => "FCONST_2",
        DCONST_0 => "DCONST_0",
        DCONST_1 => "DCONST_1",
        BIPUSH => "BIPUSH",
        SIPUSH => "SIPUSH",
        LDC => "LDC",
        LDC_W => "LDC_W",
        LDC2_W => "LDC2_W",
        ILOAD => "ILOAD",
        LLOAD => "LLOAD",
        FLOAD => "FLOAD",
        DLOAD => "DLOAD",
        ALOAD => "ALOAD",
        ISTORE => "ISTORE",
        LSTORE => "LSTORE",
        FSTORE => "FSTORE",
        DSTORE => "DSTORE",
        ASTORE => "ASTORE",
        POP => "POP",
        POP2 => "POP2",
        DUP => "DUP",
        DUP_X1 => "DUP_X1",
        DUP_X2 => "DUP_X2",
        DUP2 => "DUP2",
        DUP2_X1 => "DUP2_X1",
        DUP2_X2 => "DUP2_X2",
        SWAP => "SWAP",
        IADD => "IADD",
        LADD => "LADD",
        FADD => "FADD",
        DADD => "DADD",
        I2L => "I2L",
        L2I => "L2I",
        IRETURN => "IRETURN",
        LRETURN => "LRETURN",
        FRETURN => "FRETURN",
        DRETURN => "DRETURN",
        ARETURN => "ARETURN",
        RETURN => "RETURN",
        GETSTATIC => "GETSTATIC",
        PUTSTATIC => "PUTSTATIC",
        GETFIELD => "GETFIELD",
        PUTFIELD => "PUTFIELD",
        INVOKEVIRTUAL => "INVOKEVIRTUAL",
        INVOKESPECIAL => "INVOKESPECIAL",
        INVOKESTATIC => "INVOKESTATIC",
        INVOKEINTERFACE => "INVOKEINTERFACE",
        NEW => "NEW",
        ANEWARRAY => "ANEWARRAY",
        CHECKCAST => "CHECKCAST",
        INSTANCEOF => "INSTANCEOF",
        _ => "<unknown>",
    }
}
