//! Emulator-wide constants

/// Version string reported in the boot/halt banner and by `--version`.
pub const VERSION: &str = "1.0";

/// Default memory size (number of words) allocated for a fresh run.
pub const DEFAULT_MEM_SIZE: u32 = 20;

/// Value used to seed freshly allocated or extended memory cells.
pub const INIT_MEM_VAL: i32 = 0x00;

/// Extension size for memory, in words, used only when `-r` is given.
pub const MEM_EXT_SIZE: u32 = DEFAULT_MEM_SIZE;

/// Maximum size, in bytes, of a program-file or dataset-file line
/// (not counting the line terminator).
pub const FILE_LINE_SIZE: usize = 80;

/// Name of the dataset file the emulator loads at startup, resolved
/// relative to the process's current working directory.
pub const DATASET_FILE_NAME: &str = "micro86_data.m86db";

/// Comment indicator for program-file and dataset-file syntax.
pub const FILE_COMMENT: char = '#';

/// Maximum length, in bytes, of a mnemonic as read from the dataset file.
pub const MNEMONIC_MAX_LEN: usize = 8;

/// The reserved lookahead keyword used by the companion assembler for
/// variable declarations; not itself a mnemonic.
pub const LOOKAHEAD_KEYWORD: &str = "VAR";

/// Bit position of the zero flag within the flags register.
pub const FLAG_ZERO_BIT: u32 = 0;

/// Bit position of the sign flag within the flags register.
pub const FLAG_SIGN_BIT: u32 = 1;
