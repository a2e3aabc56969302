//! The opcode↔mnemonic registry, loaded from a text data file
//! (spec.md §4.D).
//!
//! Per the Design Note in spec.md §9, this is *not* a process-wide mutable
//! global with `init`/`kill` endpoints: it is an owned handle constructed
//! once by [`Dataset::load`] and passed by reference to the loader,
//! interpreter, and disassembler. There is nothing to reinitialize or to
//! query before initialization, so the `DatasetLifecycle` error class
//! collapses entirely — the only failure modes left are `Syntax` and
//! `FileRead`, both surfaced from `load` itself.

use crate::consts::{FILE_COMMENT, LOOKAHEAD_KEYWORD, MNEMONIC_MAX_LEN};
use crate::error::Error;
use std::collections::HashMap;
use std::path::Path;

/// One parsed line of the dataset file.
struct Entry {
    opcode: u32,
    mnemonic: String,
    has_operand: bool,
    is_immediate: bool,
}

/// The loaded opcode↔mnemonic registry.
#[derive(Debug, Clone)]
pub struct Dataset {
    opcode_to_mnemonic: HashMap<u32, String>,
    mnemonic_to_opcode: HashMap<String, u32>,
    has_operand: std::collections::HashSet<u32>,
    is_immediate: std::collections::HashSet<u32>,
    reserved_words: std::collections::HashSet<String>,
}

impl Dataset {
    /// Load and parse the dataset file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileRead`] if the file cannot be opened, or
    /// [`Error::Syntax`] at the first line that fails the grammar:
    ///
    /// ```text
    /// %08X = %8s [o [i]]
    /// ```
    ///
    /// `#` to end-of-line is a comment; a line whose first non-space
    /// character is `#` is entirely comment; blank lines are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|_| Error::FileRead(path.to_path_buf()))?;
        Self::parse(&text, path)
    }

    fn parse(text: &str, path: &Path) -> Result<Self, Error> {
        let mut opcode_to_mnemonic = HashMap::new();
        let mut mnemonic_to_opcode = HashMap::new();
        let mut has_operand = std::collections::HashSet::new();
        let mut is_immediate = std::collections::HashSet::new();
        let mut reserved_words: std::collections::HashSet<String> =
            [LOOKAHEAD_KEYWORD.to_string()].into_iter().collect();

        for (idx, raw_line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if raw_line.trim().is_empty() {
                continue;
            }
            let instruct = match raw_line.find(FILE_COMMENT) {
                Some(pos) => {
                    let before = &raw_line[..pos];
                    if before.trim().is_empty() {
                        // entirely comment
                        continue;
                    }
                    before
                }
                None => raw_line,
            };

            let entry = parse_entry(instruct).ok_or_else(|| Error::Syntax {
                file: path.to_path_buf(),
                line: line_no,
            })?;

            reserved_words.insert(entry.mnemonic.clone());
            opcode_to_mnemonic.insert(entry.opcode, entry.mnemonic.clone());
            mnemonic_to_opcode.insert(entry.mnemonic.clone(), entry.opcode);
            if entry.has_operand {
                has_operand.insert(entry.opcode);
            }
            if entry.is_immediate {
                is_immediate.insert(entry.opcode);
            }
        }

        Ok(Self {
            opcode_to_mnemonic,
            mnemonic_to_opcode,
            has_operand,
            is_immediate,
            reserved_words,
        })
    }

    /// Number of opcodes registered.
    pub fn num_instructions(&self) -> usize {
        self.opcode_to_mnemonic.len()
    }

    /// The mnemonic for `opcode`.
    pub fn get_mnemonic(&self, opcode: u32) -> Result<&str, Error> {
        self.opcode_to_mnemonic
            .get(&opcode)
            .map(String::as_str)
            .ok_or(Error::InvalidOpcode(opcode))
    }

    /// The opcode for `mnemonic`.
    pub fn get_opcode(&self, mnemonic: &str) -> Result<u32, Error> {
        self.mnemonic_to_opcode
            .get(mnemonic)
            .copied()
            .ok_or_else(|| Error::InvalidMnemonic(mnemonic.to_string()))
    }

    /// Whether `opcode` is registered.
    pub fn is_valid_opcode(&self, opcode: u32) -> bool {
        self.opcode_to_mnemonic.contains_key(&opcode)
    }

    /// Whether `mnemonic` is registered. An empty string is never valid.
    pub fn is_valid_mnemonic(&self, mnemonic: &str) -> bool {
        !mnemonic.is_empty() && self.mnemonic_to_opcode.contains_key(mnemonic)
    }

    /// Whether `opcode` takes an operand.
    pub fn opcode_has_operand(&self, opcode: u32) -> Result<bool, Error> {
        if !self.is_valid_opcode(opcode) {
            return Err(Error::InvalidOpcode(opcode));
        }
        Ok(self.has_operand.contains(&opcode))
    }

    /// Whether `opcode`'s operand (if any) is immediate. Always `false`
    /// for opcodes that don't take an operand.
    pub fn opcode_is_immediate(&self, opcode: u32) -> bool {
        self.has_operand.contains(&opcode) && self.is_immediate.contains(&opcode)
    }

    /// Whether `word` is reserved: it contains no whitespace and either
    /// names a known mnemonic or is the lookahead keyword `"VAR"`.
    pub fn is_reserved_word(&self, word: &str) -> bool {
        !word.is_empty() && !word.contains(char::is_whitespace) && self.reserved_words.contains(word)
    }

    /// The lookahead keyword used by the companion assembler.
    pub const fn get_lookahead(&self) -> &'static str {
        LOOKAHEAD_KEYWORD
    }

    /// Load the dataset file shipped at the repository root, embedded at
    /// compile time so unit tests don't depend on the test binary's
    /// working directory. The binary itself always reads the file fresh
    /// from disk via [`Dataset::load`], per spec.md §4.D.
    #[cfg(test)]
    pub(crate) fn load_embedded_for_tests() -> Self {
        Self::parse(
            include_str!("../micro86_data.m86db"),
            Path::new("micro86_data.m86db"),
        )
        .expect("the shipped dataset file must parse")
    }
}

/// Parse one non-blank, non-comment line against:
/// `%08X = %8s [o [i]]`.
fn parse_entry(line: &str) -> Option<Entry> {
    let mut fields = line.split_whitespace();

    let opcode_str = fields.next()?;
    if opcode_str.len() != 8 || !opcode_str.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let opcode = u32::from_str_radix(opcode_str, 16).ok()?;

    if fields.next()? != "=" {
        return None;
    }

    let mnemonic = fields.next()?;
    if mnemonic.is_empty() || mnemonic.len() > MNEMONIC_MAX_LEN {
        return None;
    }

    let mut has_operand = false;
    let mut is_immediate = false;

    match fields.next() {
        None => {}
        Some("o") => {
            has_operand = true;
            match fields.next() {
                None => {}
                Some("i") => is_immediate = true,
                Some(_) => return None,
            }
        }
        Some(_) => return None,
    }

    if fields.next().is_some() {
        return None;
    }

    Some(Entry {
        opcode,
        mnemonic: mnemonic.to_string(),
        has_operand,
        is_immediate,
    })
}
