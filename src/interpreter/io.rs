//! `IN`/`OUT`: one byte at a time, through the accumulator's low byte.

use super::Interpreter;
use crate::error::Error;
use std::io::{BufRead, Read, Write};

impl<'a> Interpreter<'a> {
    pub(super) fn do_in(&mut self, stdin: &mut impl BufRead) -> Result<(), Error> {
        let mut byte = [0u8; 1];
        match stdin.read(&mut byte) {
            Ok(1) => {
                self.processor.set_acc(byte[0] as i32);
                Ok(())
            }
            _ => Err(Error::BadInput),
        }
    }

    /// Write the accumulator's low byte raw, followed by a newline —
    /// `(unsigned char)(acc & 0xFF)`, not a `char`-formatted `Display`
    /// (which would UTF-8-encode bytes >= 0x80 as more than one byte).
    /// Matches `fprintf(STD_OUT_DEST, "%c\n", (unsigned char) acc)`; the
    /// write's own success is never checked, just as the original never
    /// checks `fprintf`'s return value on this stream.
    pub(super) fn do_out(&mut self, stdout: &mut impl Write) {
        let byte = self.processor.acc() as u8;
        let _ = stdout.write_all(&[byte]).and_then(|_| stdout.write_all(b"\n"));
    }
}
