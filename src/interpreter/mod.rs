//! The fetch-decode-execute interpreter (spec.md §4.F).

mod alu;
mod flow;
mod io;

use crate::consts::VERSION;
use crate::dataset::Dataset;
use crate::disasm;
use crate::error::Error;
use crate::instruction::Decoded;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::processor::Processor;
use std::io::{BufRead, Write};
use tracing::{debug, trace};

/// Drives one Micro86 program to completion.
///
/// Owns the [`Processor`] and [`Memory`] for the run; borrows a
/// [`Dataset`] loaded once by the caller (see the Design Note in
/// spec.md §9 about not using a process-wide singleton).
pub struct Interpreter<'a> {
    processor: Processor,
    memory: Memory,
    dataset: &'a Dataset,
    program_size: u32,
    trace: bool,
    dump: bool,
    running: bool,
}

impl<'a> Interpreter<'a> {
    /// Build an interpreter around an already-loaded program.
    pub fn new(memory: Memory, program_size: u32, dataset: &'a Dataset, trace: bool, dump: bool) -> Self {
        Self {
            processor: Processor::new(),
            memory,
            dataset,
            program_size,
            trace,
            dump,
            running: false,
        }
    }

    /// Read-only view of the processor, for post-mortem inspection.
    pub const fn processor(&self) -> &Processor {
        &self.processor
    }

    /// Read-only view of memory, for post-mortem inspection.
    pub const fn memory(&self) -> &Memory {
        &self.memory
    }

    /// Run the program to completion (`HALT`, or a fatal error).
    ///
    /// On a normal halt: the boot banner, trace (if requested), the
    /// disassembly (if `dump` was requested), the post-mortem dump, and
    /// the halt banner are all written to `stdout`. On a fatal error the
    /// diagnostic and a post-mortem dump go to `stderr` instead, and
    /// neither the disassembly nor the halt banner is emitted — the run
    /// stops where the error was raised, before either would print.
    pub fn run(
        &mut self,
        program_file: &str,
        stdin: &mut impl BufRead,
        stdout: &mut impl Write,
        stderr: &mut impl Write,
    ) -> Result<(), Error> {
        self.boot(program_file, stdout);

        match self.fde_loop(stdin, stdout) {
            Ok(()) => {
                if self.dump {
                    let _ = write!(stdout, "\n=== DISASSEMBLED CODE ===\n\n");
                    disasm::disassemble_program(&self.memory, self.program_size, self.dataset, stdout)?;
                }
                self.post_mortem(stdout);
                let _ = writeln!(stdout, "\n*** Micro86 Emulator V. {VERSION} HALTED ***");
                Ok(())
            }
            Err(e) => {
                let _ = writeln!(stderr, "{e}");
                self.post_mortem(stderr);
                Err(e)
            }
        }
    }

    fn boot(&mut self, program_file: &str, stdout: &mut impl Write) {
        self.running = true;
        debug!(program_file, "booting micro86");
        let _ = write!(
            stdout,
            "*** Micro86 Emulator V. {VERSION} BOOTING ***\n\nProgram file: {program_file}\n"
        );
        if self.trace {
            let _ = write!(stdout, "\n=== EXECUTION TRACE ===\n\n");
        }
    }

    fn fde_loop(&mut self, stdin: &mut impl BufRead, stdout: &mut impl Write) -> Result<(), Error> {
        while self.running {
            let decoded = self.fetch()?;
            if self.trace {
                self.trace_line(decoded, stdout)?;
            }
            self.execute(decoded, stdin, stdout)?;
        }
        Ok(())
    }

    /// Fetch the instruction at `ip`, post-incrementing it.
    fn fetch(&mut self) -> Result<Decoded, Error> {
        if self.program_size == 0 {
            return Err(Error::NoProgram);
        }
        let addr = self.processor.ip();
        if !self.memory.in_bounds(addr) {
            return Err(Error::MemoryViolation);
        }
        self.processor.set_ip(addr + 1);
        if self.processor.ip() > self.program_size {
            return Err(Error::ProgramEnd);
        }
        let word = self.memory.get(addr);
        self.processor.set_ir(word as u32);
        trace!(addr, word, "fetched instruction");
        Ok(Decoded::decode(word))
    }

    fn execute(&mut self, decoded: Decoded, stdin: &mut impl BufRead, stdout: &mut impl Write) -> Result<(), Error> {
        let op = Opcode::try_from(decoded.opcode).map_err(|_| Error::InvalidInstruction)?;
        let operand = decoded.operand;
        trace!(?op, operand, "executing instruction");

        match op {
            Opcode::Halt => self.running = false,
            Opcode::Load => {
                let value = self.read_cell(operand)?;
                self.processor.set_acc(value);
            }
            Opcode::LoadI => self.processor.set_acc(operand as i32),
            Opcode::Store => {
                self.check_bounds(operand)?;
                self.memory.set(operand, self.processor.acc());
            }
            Opcode::Add => self.alu_binary(operand, |a, b| a.wrapping_add(b))?,
            Opcode::AddI => self.alu_immediate(operand, |a, b| a.wrapping_add(b)),
            Opcode::Sub => self.alu_binary(operand, |a, b| a.wrapping_sub(b))?,
            Opcode::SubI => self.alu_immediate(operand, |a, b| a.wrapping_sub(b)),
            Opcode::Mul => self.alu_binary(operand, |a, b| a.wrapping_mul(b))?,
            Opcode::MulI => self.alu_immediate(operand, |a, b| a.wrapping_mul(b)),
            Opcode::Div => self.alu_binary_checked_div(operand, i32::wrapping_div)?,
            Opcode::DivI => self.alu_immediate_checked_div(operand, i32::wrapping_div)?,
            Opcode::Mod => self.alu_binary_checked_div(operand, i32::wrapping_rem)?,
            Opcode::ModI => self.alu_immediate_checked_div(operand, i32::wrapping_rem)?,
            Opcode::Cmp => {
                let value = self.read_cell(operand)?;
                self.processor.update_flags(self.processor.acc().wrapping_sub(value));
            }
            Opcode::CmpI => {
                let value = operand as i32;
                self.processor.update_flags(self.processor.acc().wrapping_sub(value));
            }
            Opcode::JmpI => self.jump(operand),
            Opcode::JeI => self.jump_if(self.processor.get_zero() == 1, operand),
            Opcode::JneI => self.jump_if(self.processor.get_zero() == 0, operand),
            Opcode::JlI => self.jump_if(self.processor.get_sign() == 1, operand),
            Opcode::JleI => self.jump_if(self.processor.get_sign() == 1 || self.processor.get_zero() == 1, operand),
            Opcode::JgI => {
                self.jump_if(self.processor.get_zero() == 0 && self.processor.get_sign() == 0, operand)
            }
            Opcode::JgeI => {
                let taken = (self.processor.get_zero() == 0 && self.processor.get_sign() == 0)
                    || self.processor.get_zero() == 1;
                self.jump_if(taken, operand);
            }
            Opcode::In => self.do_in(stdin)?,
            Opcode::Out => self.do_out(stdout),
        }

        Ok(())
    }

    fn read_cell(&self, addr: u32) -> Result<i32, Error> {
        self.check_bounds(addr)?;
        Ok(self.memory.get(addr))
    }

    /// Same check as [`Self::fetch`]'s `ip` bounds test and the
    /// disassembler's own check — all three raise the same
    /// [`Error::MemoryViolation`] regardless of which one caught it.
    fn check_bounds(&self, addr: u32) -> Result<(), Error> {
        if self.memory.in_bounds(addr) {
            Ok(())
        } else {
            Err(Error::MemoryViolation)
        }
    }

    fn trace_line(&self, decoded: Decoded, stdout: &mut impl Write) -> Result<(), Error> {
        let addr = self.processor.ip() - 1;
        let word = decoded.to_word();
        let disasm_text = disasm::disassemble_instruction(word, self.dataset, &self.memory)?;
        let _ = write!(
            stdout,
            "0x{addr:08X}:\t{disasm_text}\t\tRegisters: acc: 0x{acc:08X} ip: 0x{ip:08X} flags: 0x{flags:08X} (ir: 0x{ir:08X})\n",
            acc = self.processor.acc() as u32,
            ip = self.processor.ip(),
            flags = self.processor.flags(),
            ir = self.processor.ir(),
        );
        Ok(())
    }

    fn post_mortem(&self, stdout: &mut impl Write) {
        write_post_mortem(&self.processor, &self.memory, stdout);
    }
}

/// Emit `=== POST-MORTEM DUMP ===` plus the CPU and memory snapshots.
///
/// Factored out of [`Interpreter::post_mortem`] so the driver can emit the
/// same dump for a fatal error raised before an [`Interpreter`] exists yet
/// (a bad program file or dataset file never reaches the FDE loop). Write
/// failures on the caller-supplied stream are not reported: the original
/// never checks `fprintf`'s return value on `STD_OUT_DEST`/`STD_ERR_DEST`
/// either, and spec.md's taxonomy has no row for this condition.
pub fn write_post_mortem(processor: &Processor, memory: &Memory, stdout: &mut impl Write) {
    let _ = write!(stdout, "\n=== POST-MORTEM DUMP ===\n");
    let _ = write!(stdout, "\nCPU:\n\n");
    let _ = write!(
        stdout,
        "Registers: acc: 0x{:08X} ip: 0x{:08X} flags: 0x{:08X} (ir: 0x{:08X})\n",
        processor.acc() as u32,
        processor.ip(),
        processor.flags(),
        processor.ir(),
    );
    let _ = write!(stdout, "\nMEMORY:\n\n");
    let _ = memory.print(0, memory.len(), stdout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Decoded;

    fn dataset() -> Dataset {
        Dataset::load_embedded_for_tests()
    }

    fn interpreter_with_words(words: &[i32], dataset: &Dataset, trace: bool, dump: bool) -> Interpreter<'_> {
        let mut mem = Memory::allocate(20);
        for (i, w) in words.iter().enumerate() {
            mem.set(i as u32, *w);
        }
        Interpreter::new(mem, words.len() as u32, dataset, trace, dump)
    }

    fn run_quiet(interp: &mut Interpreter) -> Result<(), Error> {
        let mut stdin = std::io::empty();
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut reader = std::io::BufReader::new(&mut stdin);
        interp.run("test.m86", &mut reader, &mut stdout, &mut stderr)
    }

    #[test]
    fn s1_add_two_immediates() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 5), // LOADI 5
            Decoded::encode(0x0401, 3), // ADDI 3
            Decoded::encode(0x0100, 0), // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        run_quiet(&mut interp).unwrap();
        assert_eq!(interp.processor().acc(), 8);
        assert_eq!(interp.processor().ip(), 3);
    }

    #[test]
    fn s2_load_store_with_resize() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 7),  // LOADI 7
            Decoded::encode(0x0302, 16), // STORE 16 (past default 20? within 20, fits)
            Decoded::encode(0x0100, 0),  // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        run_quiet(&mut interp).unwrap();
        assert_eq!(interp.memory().get(16), 7);
    }

    #[test]
    fn s3_compare_and_jump() {
        let ds = dataset();
        let mut mem = Memory::allocate(20);
        let program = [
            Decoded::encode(0x0201, 5),    // 0: LOADI 5
            Decoded::encode(0x0901, 3),    // 1: CMPI 3
            Decoded::encode(0x0B01, 6),    // 2: JEI 6
            Decoded::encode(0x0F01, 7),    // 3: JGI 7
            Decoded::encode(0x0100, 0),    // 4: HALT
            Decoded::encode(0x0100, 0),    // 5: HALT
            Decoded::encode(0x0201, 0x63), // 6: LOADI 0x63
            Decoded::encode(0x0100, 0),    // 7: HALT
        ];
        for (i, w) in program.iter().enumerate() {
            mem.set(i as u32, *w);
        }
        let mut interp = Interpreter::new(mem, program.len() as u32, &ds, false, false);
        run_quiet(&mut interp).unwrap();
        assert_eq!(interp.processor().acc(), 0x63);
    }

    #[test]
    fn s4_divide_by_zero_is_fatal() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 4), // LOADI 4
            Decoded::encode(0x0701, 0), // DIVI 0
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        assert!(matches!(run_quiet(&mut interp), Err(Error::DivisionByZero)));
    }

    #[test]
    fn s5_io_round_trip() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x1100, 0), // IN
            Decoded::encode(0x1200, 0), // OUT
            Decoded::encode(0x0100, 0), // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        let mut stdin = std::io::Cursor::new(b"A".to_vec());
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        interp
            .run("test.m86", &mut stdin, &mut stdout, &mut stderr)
            .unwrap();
        let text = String::from_utf8(stdout).unwrap();
        assert!(text.contains("A\n"));
    }

    #[test]
    fn s5_io_round_trip_high_byte_is_raw_not_utf8() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x1100, 0), // IN
            Decoded::encode(0x1200, 0), // OUT
            Decoded::encode(0x0100, 0), // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        let mut stdin = std::io::Cursor::new(vec![0xFFu8]);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        interp
            .run("test.m86", &mut stdin, &mut stdout, &mut stderr)
            .unwrap();
        assert!(stdout.windows(2).any(|w| w == [0xFF, b'\n']));
        assert!(!stdout.windows(2).any(|w| w == [0xC3, 0xBF]));
    }

    #[test]
    fn program_end_reached_is_fatal() {
        let ds = dataset();
        // No HALT: falls off the end of the resident program.
        let words = [Decoded::encode(0x0201, 1)];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        assert!(matches!(run_quiet(&mut interp), Err(Error::ProgramEnd)));
    }

    #[test]
    fn unknown_opcode_is_invalid_instruction() {
        let ds = dataset();
        let words = [Decoded::encode(0xFFFF, 0)];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        assert!(matches!(run_quiet(&mut interp), Err(Error::InvalidInstruction)));
    }

    #[test]
    fn arithmetic_does_not_touch_flags() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 5), // LOADI 5
            Decoded::encode(0x0901, 5), // CMPI 5 -> zero flag set
            Decoded::encode(0x0401, 1), // ADDI 1 -> must not clear zero flag
            Decoded::encode(0x0100, 0), // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        run_quiet(&mut interp).unwrap();
        assert_eq!(interp.processor().get_zero(), 1);
        assert_eq!(interp.processor().acc(), 6);
    }

    #[test]
    fn store_out_of_bounds_is_memory_violation() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 1),  // LOADI 1
            Decoded::encode(0x0302, 19), // STORE 19 (last valid cell in default-size memory)
            Decoded::encode(0x0302, 25), // STORE 25, out of bounds, no resize allowed
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, false);
        assert!(matches!(run_quiet(&mut interp), Err(Error::MemoryViolation)));
    }

    #[test]
    fn fatal_error_diagnostic_and_postmortem_go_to_stderr_only() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 4), // LOADI 4
            Decoded::encode(0x0701, 0), // DIVI 0
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, true);
        let mut stdin = std::io::empty();
        let mut reader = std::io::BufReader::new(&mut stdin);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let err = interp
            .run("test.m86", &mut reader, &mut stdout, &mut stderr)
            .unwrap_err();
        assert!(matches!(err, Error::DivisionByZero));

        let stdout_text = String::from_utf8(stdout).unwrap();
        let stderr_text = String::from_utf8(stderr).unwrap();
        assert!(!stdout_text.contains("POST-MORTEM"));
        assert!(!stdout_text.contains("HALTED"));
        assert!(!stdout_text.contains("DISASSEMBLED"));
        assert!(stderr_text.contains("division by zero"));
        assert!(stderr_text.contains("=== POST-MORTEM DUMP ==="));
    }

    #[test]
    fn dump_flag_prints_disassembly_before_postmortem_on_success() {
        let ds = dataset();
        let words = [
            Decoded::encode(0x0201, 5), // LOADI 5
            Decoded::encode(0x0100, 0), // HALT
        ];
        let mut interp = interpreter_with_words(&words, &ds, false, true);
        let mut stdin = std::io::empty();
        let mut reader = std::io::BufReader::new(&mut stdin);
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        interp
            .run("test.m86", &mut reader, &mut stdout, &mut stderr)
            .unwrap();
        let text = String::from_utf8(stdout).unwrap();
        let disasm_pos = text.find("=== DISASSEMBLED CODE ===").unwrap();
        let postmortem_pos = text.find("=== POST-MORTEM DUMP ===").unwrap();
        assert!(disasm_pos < postmortem_pos);
        assert!(text.contains("*** Micro86 Emulator V. 1.0 HALTED ***"));
        assert!(stderr.is_empty());
    }
}
