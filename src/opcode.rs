//! The closed set of Micro86 opcodes.
//!
//! Per the "Tagged dispatch" design note, [`Opcode`] is the execution-time
//! authority: decoding a word tries to build one of these variants, and an
//! unrecognized numeric opcode is an [`Error::InvalidInstruction`]
//! regardless of what the text-file-driven [`crate::dataset::Dataset`]
//! happens to contain. The dataset remains authoritative for mnemonic
//! text and for the disassembler's own notion of validity (spec.md §4.G
//! checks the dataset, not this enum).

use crate::error::Error;
use std::fmt;
use strum::EnumIter;

/// A decoded Micro86 opcode. Discriminants match the spec.md §3
/// catalogue exactly, preserving on-disk compatibility with the encoded
/// word format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
#[repr(u32)]
pub enum Opcode {
    Halt = 0x0100,
    Load = 0x0202,
    LoadI = 0x0201,
    Store = 0x0302,
    Add = 0x0402,
    AddI = 0x0401,
    Sub = 0x0502,
    SubI = 0x0501,
    Mul = 0x0602,
    MulI = 0x0601,
    Div = 0x0702,
    DivI = 0x0701,
    Mod = 0x0802,
    ModI = 0x0801,
    Cmp = 0x0902,
    CmpI = 0x0901,
    JmpI = 0x0A01,
    JeI = 0x0B01,
    JneI = 0x0C01,
    JlI = 0x0D01,
    JleI = 0x0E01,
    JgI = 0x0F01,
    JgeI = 0x1001,
    In = 0x1100,
    Out = 0x1200,
}

/// All opcodes, in catalogue order. Used to validate the dataset file at
/// load time and to emit a fallback `micro86_data.m86db`.
pub const ALL: [Opcode; 25] = [
    Opcode::Halt,
    Opcode::Load,
    Opcode::LoadI,
    Opcode::Store,
    Opcode::Add,
    Opcode::AddI,
    Opcode::Sub,
    Opcode::SubI,
    Opcode::Mul,
    Opcode::MulI,
    Opcode::Div,
    Opcode::DivI,
    Opcode::Mod,
    Opcode::ModI,
    Opcode::Cmp,
    Opcode::CmpI,
    Opcode::JmpI,
    Opcode::JeI,
    Opcode::JneI,
    Opcode::JlI,
    Opcode::JleI,
    Opcode::JgI,
    Opcode::JgeI,
    Opcode::In,
    Opcode::Out,
];

/// How an opcode's operand, if any, should be rendered by the
/// disassembler (spec.md §4.G).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandForm {
    /// The instruction takes no operand.
    None,
    /// The operand is a literal value, printed bare.
    Literal,
    /// The operand is a memory address; print the memory-cell pair.
    /// Jump instructions use this form even though they are immediate,
    /// per spec.md §4.G step 2.
    Address,
}

impl Opcode {
    /// The canonical mnemonic for this opcode, matching the spec.md §3
    /// catalogue. This is the fallback used if the dataset file doesn't
    /// override it; in practice the shipped dataset agrees exactly.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Halt => "HALT",
            Self::Load => "LOAD",
            Self::LoadI => "LOADI",
            Self::Store => "STORE",
            Self::Add => "ADD",
            Self::AddI => "ADDI",
            Self::Sub => "SUB",
            Self::SubI => "SUBI",
            Self::Mul => "MUL",
            Self::MulI => "MULI",
            Self::Div => "DIV",
            Self::DivI => "DIVI",
            Self::Mod => "MOD",
            Self::ModI => "MODI",
            Self::Cmp => "CMP",
            Self::CmpI => "CMPI",
            Self::JmpI => "JMPI",
            Self::JeI => "JEI",
            Self::JneI => "JNEI",
            Self::JlI => "JLI",
            Self::JleI => "JLEI",
            Self::JgI => "JGI",
            Self::JgeI => "JGEI",
            Self::In => "IN",
            Self::Out => "OUT",
        }
    }

    /// Whether this opcode takes an operand at all.
    pub const fn has_operand(self) -> bool {
        !matches!(self, Self::Halt | Self::In | Self::Out)
    }

    /// Whether this opcode's operand is a literal ("immediate") rather
    /// than a memory address.
    pub const fn is_immediate(self) -> bool {
        matches!(
            self,
            Self::LoadI
                | Self::AddI
                | Self::SubI
                | Self::MulI
                | Self::DivI
                | Self::ModI
                | Self::CmpI
                | Self::JmpI
                | Self::JeI
                | Self::JneI
                | Self::JlI
                | Self::JleI
                | Self::JgI
                | Self::JgeI
        )
    }

    /// Whether this opcode is one of the conditional/unconditional jumps.
    pub const fn is_jump(self) -> bool {
        matches!(
            self,
            Self::JmpI | Self::JeI | Self::JneI | Self::JlI | Self::JleI | Self::JgI | Self::JgeI
        )
    }

    /// The disassembly operand form for this opcode (spec.md §4.G).
    pub const fn operand_form(self) -> OperandForm {
        if !self.has_operand() {
            OperandForm::None
        } else if self.is_immediate() && !self.is_jump() {
            OperandForm::Literal
        } else {
            OperandForm::Address
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl TryFrom<u32> for Opcode {
    type Error = Error;

    fn try_from(opcode: u32) -> Result<Self, Error> {
        ALL.iter()
            .copied()
            .find(|op| *op as u32 == opcode)
            .ok_or(Error::InvalidOpcode(opcode))
    }
}
