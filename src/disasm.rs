//! Disassembler (spec.md §4.G).
//!
//! Validity here is decided by the [`Dataset`], not by
//! [`crate::opcode::Opcode`] — an instruction the tagged dispatch
//! wouldn't recognize at execute time can still be rendered here if the
//! dataset file (somehow) names it, and vice versa. The only thing the
//! dataset can't tell us is whether an opcode is a jump; that comes from
//! [`Opcode::is_jump`].

use crate::dataset::Dataset;
use crate::instruction::{Decoded, Word};
use crate::memory::Memory;
use crate::opcode::Opcode;
use std::fmt::Write as _;

/// Disassemble a single instruction word.
///
/// Returns a fatal [`crate::error::Error::MemoryViolation`] if the
/// instruction's operand names a memory address outside
/// `[0, memory.len())` — the same check and the same diagnostic the
/// interpreter's own fetch/execute bounds checks use, not a distinct one.
pub fn disassemble_instruction(word: Word, dataset: &Dataset, memory: &Memory) -> Result<String, crate::error::Error> {
    let Decoded { opcode, operand } = Decoded::decode(word);

    if !dataset.is_valid_opcode(opcode) {
        return Ok(format!("0x{:08X}", word as u32));
    }

    let mnemonic = dataset.get_mnemonic(opcode)?;
    if !dataset.opcode_has_operand(opcode)? {
        return Ok(mnemonic.to_string());
    }

    if !memory.in_bounds(operand) {
        return Err(crate::error::Error::MemoryViolation);
    }

    let is_jump = Opcode::try_from(opcode).map(Opcode::is_jump).unwrap_or(false);
    let mut out = String::new();
    if dataset.opcode_is_immediate(opcode) && !is_jump {
        write!(out, "{mnemonic}\t\t0x{operand:08X}").unwrap();
    } else {
        write!(
            out,
            "{mnemonic}\t\t0x{operand:08X}\t\t|0x{operand:08X}: 0x{:08X}|",
            memory.get(operand) as u32
        )
        .unwrap();
    }
    Ok(out)
}

/// Disassemble `[0, program_size)` of `memory`, one line per word,
/// prefixed with its address.
pub fn disassemble_program(
    memory: &Memory,
    program_size: u32,
    dataset: &Dataset,
    writer: &mut impl std::io::Write,
) -> Result<(), crate::error::Error> {
    if program_size == 0 {
        return Err(crate::error::Error::NoProgram);
    }
    for addr in 0..program_size {
        let line = disassemble_instruction(memory.get(addr), dataset, memory)?;
        let _ = writeln!(writer, "0x{addr:08X}:\t{line}");
    }
    Ok(())
}
