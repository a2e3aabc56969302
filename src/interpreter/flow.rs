//! Unconditional and conditional jumps.

use super::Interpreter;

impl<'a> Interpreter<'a> {
    pub(super) fn jump(&mut self, addr: u32) {
        self.processor.set_ip(addr);
    }

    pub(super) fn jump_if(&mut self, condition: bool, addr: u32) {
        if condition {
            self.jump(addr);
        }
    }
}
