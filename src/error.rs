//! Error taxonomy for the emulator core.
//!
//! Every variant here corresponds to one row of the error taxonomy table:
//! all of them are FATAL — the core never swallows an error and keeps
//! running, it always returns one of these up to the driver in `main`,
//! which prints the diagnostic, performs the post-mortem dump (if the
//! interpreter had already started), and exits with a non-zero status.

use std::path::PathBuf;
use thiserror::Error;

/// Emulator-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage acquisition failed (memory allocation or extension).
    #[error("ERROR: unable to allocate memory!")]
    AllocFailure,

    /// A required file could not be opened for reading.
    #[error("ERROR: unable to read file {0}!")]
    FileRead(PathBuf),

    /// An output file could not be written. Unused by the core itself —
    /// the core's own output is always the caller-supplied stdout/stderr,
    /// whose write failures are never checked (see `interpreter::mod`'s
    /// and `disasm`'s use of `let _ = write!(...)`, matching the original
    /// never checking `fprintf`'s return value on those streams). Kept
    /// for parity with the original taxonomy and for callers that add
    /// file-based reporting on top of the core.
    #[error("ERROR: unable to write to file {0}!")]
    FileWrite(PathBuf),

    /// A loader or dataset line failed to match its grammar.
    #[error("ERROR: invalid syntax in line {line} in {file}!")]
    Syntax {
        /// File in which the syntax error occurred.
        file: PathBuf,
        /// 1-based line number of the offending line.
        line: usize,
    },

    /// A query named an opcode absent from the dataset.
    #[error("ERROR: opcode '0x{0:04X}' is invalid!")]
    InvalidOpcode(u32),

    /// A query named a mnemonic absent from the dataset.
    #[error("ERROR: mnemonic '{0}' is invalid!")]
    InvalidMnemonic(String),

    /// The loader's write position reached the end of memory with
    /// resizing disallowed (`-r` not given).
    #[error("ERROR: memory access out of bounds at position {0}!")]
    MemoryBounds(u32),

    /// A `DIV`/`DIVI`/`MOD`/`MODI` divisor evaluated to zero.
    #[error("Micro86 ERROR: division by zero!")]
    DivisionByZero,

    /// The interpreter or disassembler was asked to run against empty
    /// memory (`program_size == 0`).
    #[error("Micro86 ERROR: no program in memory!")]
    NoProgram,

    /// Fetch advanced `ip` past `program_size`.
    #[error("Micro86 ERROR: program end reached!")]
    ProgramEnd,

    /// `IN` encountered end-of-file on stdin.
    #[error("Micro86 ERROR: cannot read input!")]
    BadInput,

    /// Execution reached an opcode unknown to the tagged dispatch.
    #[error("Micro86 ERROR: invalid instruction!")]
    InvalidInstruction,

    /// A memory-cell access outside `[0, mem_size)` detected at fetch time
    /// (`ip` ran off the end), at execute time (an operand-bearing,
    /// non-immediate instruction's target or source cell), or by the
    /// disassembler's own bounds check. All three call sites are the same
    /// underlying condition the original's `m86_check_memory_bounds`
    /// guards and always raise this one diagnostic, regardless of which
    /// of them detected it.
    #[error("Micro86 ERROR: memory violation!")]
    MemoryViolation,
}

impl Error {
    /// Whether this error terminates the process. Every variant in this
    /// taxonomy is fatal; the method exists so the driver's exit path
    /// reads the same way the original's `exit_on_exit_fail` convention
    /// does, rather than hard-coding the assumption at every call site.
    pub const fn is_fatal(&self) -> bool {
        true
    }
}

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;
