//! Arithmetic opcode handling (`ADD`/`SUB`/`MUL`/`DIV`/`MOD` and their
//! immediate forms).
//!
//! Per the Open Question in spec.md §9, none of these touch the flags
//! register — only `CMP`/`CMPI` call
//! [`crate::processor::Processor::update_flags`].

use super::Interpreter;
use crate::error::Error;

impl<'a> Interpreter<'a> {
    pub(super) fn alu_binary(&mut self, operand: u32, f: impl Fn(i32, i32) -> i32) -> Result<(), Error> {
        let value = self.read_cell(operand)?;
        self.processor.set_acc(f(self.processor.acc(), value));
        Ok(())
    }

    pub(super) fn alu_immediate(&mut self, operand: u32, f: impl Fn(i32, i32) -> i32) {
        self.processor.set_acc(f(self.processor.acc(), operand as i32));
    }

    pub(super) fn alu_binary_checked_div(
        &mut self,
        operand: u32,
        f: impl Fn(i32, i32) -> i32,
    ) -> Result<(), Error> {
        let value = self.read_cell(operand)?;
        if value == 0 {
            return Err(Error::DivisionByZero);
        }
        self.processor.set_acc(f(self.processor.acc(), value));
        Ok(())
    }

    pub(super) fn alu_immediate_checked_div(
        &mut self,
        operand: u32,
        f: impl Fn(i32, i32) -> i32,
    ) -> Result<(), Error> {
        if operand == 0 {
            return Err(Error::DivisionByZero);
        }
        self.processor.set_acc(f(self.processor.acc(), operand as i32));
        Ok(())
    }
}
