//! Program-file loader (spec.md §4.E).

use crate::consts::MEM_EXT_SIZE;
use crate::error::Error;
use crate::instruction::Word;
use crate::memory::Memory;
use std::path::Path;

/// Result of a successful load: the number of words written starting at
/// address 0.
pub type ProgramSize = u32;

/// Load `path` into `memory`, starting at address 0.
///
/// Per spec.md §4.E, each non-blank line is processed as follows:
///
/// 1. Purely blank lines are skipped.
/// 2. The first `#` on the line starts a comment; if it's preceded only
///    by spaces the whole line is comment, otherwise the line is
///    truncated there.
/// 3. What remains must parse as an 8-digit hex word, else this is a
///    [`Error::Syntax`] naming the file and 1-based line number.
/// 4. If the next write position equals the current memory size: with
///    `allow_resize` false this is a fatal [`Error::MemoryBounds`];
///    otherwise memory is grown by [`MEM_EXT_SIZE`] zero-initialized
///    cells.
/// 5. The word is written and the program length incremented.
pub fn load(path: impl AsRef<Path>, allow_resize: bool, memory: &mut Memory) -> Result<ProgramSize, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|_| Error::FileRead(path.to_path_buf()))?;

    let mut program_size: ProgramSize = 0;

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw_line.trim().is_empty() {
            continue;
        }

        let instruct = match raw_line.find('#') {
            Some(pos) => {
                let before = &raw_line[..pos];
                if before.chars().all(|c| c == ' ') {
                    continue;
                }
                before
            }
            None => raw_line,
        };

        let word = parse_word(instruct).ok_or_else(|| Error::Syntax {
            file: path.to_path_buf(),
            line: line_no,
        })?;

        if program_size == memory.len() {
            if !allow_resize {
                return Err(Error::MemoryBounds(program_size));
            }
            memory.extend(MEM_EXT_SIZE);
        }

        memory.set(program_size, word);
        program_size += 1;
    }

    Ok(program_size)
}

/// Parse a candidate line as an 8-hex-digit word, tolerating the
/// surrounding whitespace the original's `%08X` scanf conversion skips.
fn parse_word(candidate: &str) -> Option<Word> {
    let trimmed = candidate.trim();
    if trimmed.len() != 8 || !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let bits = u32::from_str_radix(trimmed, 16).ok()?;
    Some(bits as Word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_simple_program() {
        let file = write_temp(
            "02010005   # LOADI 5\n\
             04010003   # ADDI 3\n\
             01000000   # HALT\n",
        );
        let mut mem = Memory::allocate(20);
        let size = load(file.path(), false, &mut mem).unwrap();
        assert_eq!(size, 3);
        assert_eq!(mem.get(0), 0x0201_0005_u32 as Word);
        assert_eq!(mem.get(1), 0x0401_0003_u32 as Word);
        assert_eq!(mem.get(2), 0x0100_0000_u32 as Word);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        let file = write_temp("\n   # only a comment\n01000000\n");
        let mut mem = Memory::allocate(20);
        let size = load(file.path(), false, &mut mem).unwrap();
        assert_eq!(size, 1);
    }

    #[test]
    fn syntax_error_names_file_and_line() {
        let file = write_temp("01000000\nNOT HEX\n");
        let mut mem = Memory::allocate(20);
        let err = load(file.path(), false, &mut mem).unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 2, .. }));
    }

    #[test]
    fn overflow_without_resize_is_fatal() {
        let file = write_temp(&"01000000\n".repeat(3));
        let mut mem = Memory::allocate(2);
        let err = load(file.path(), false, &mut mem).unwrap_err();
        assert!(matches!(err, Error::MemoryBounds(2)));
    }

    #[test]
    fn overflow_with_resize_extends_memory() {
        let file = write_temp(&"01000000\n".repeat(3));
        let mut mem = Memory::allocate(2);
        let size = load(file.path(), true, &mut mem).unwrap();
        assert_eq!(size, 3);
        assert_eq!(mem.len(), 2 + MEM_EXT_SIZE);
    }

    #[test]
    fn loading_same_file_twice_is_deterministic() {
        let file = write_temp("02010005\n04010003\n01000000\n");
        let mut mem_a = Memory::allocate(20);
        let mut mem_b = Memory::allocate(20);
        let size_a = load(file.path(), false, &mut mem_a).unwrap();
        let size_b = load(file.path(), false, &mut mem_b).unwrap();
        assert_eq!(size_a, size_b);
        assert_eq!(mem_a, mem_b);
    }

    #[test]
    fn missing_file_is_file_read_error() {
        let mut mem = Memory::allocate(20);
        let err = load("/nonexistent/path/to/program.m86", false, &mut mem).unwrap_err();
        assert!(matches!(err, Error::FileRead(_)));
    }
}
