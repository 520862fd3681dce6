//! レジスタ転送命令（TAX, TAY, TXA, TYA, TSX, TXS）

use super::implied;
use crate::cpu::addressing::AddressingMode::Implied;
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry};
use crate::cpu::Cpu;

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0xAA, implied("TAX", ImpliedOp::Tax, Implied, 2)),
        (0xA8, implied("TAY", ImpliedOp::Tay, Implied, 2)),
        (0x8A, implied("TXA", ImpliedOp::Txa, Implied, 2)),
        (0x98, implied("TYA", ImpliedOp::Tya, Implied, 2)),
        (0xBA, implied("TSX", ImpliedOp::Tsx, Implied, 2)),
        (0x9A, implied("TXS", ImpliedOp::Txs, Implied, 2)),
    ]
}

impl Cpu {
    pub(super) fn tax(&mut self) {
        self.regs.x = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    pub(super) fn tay(&mut self) {
        self.regs.y = self.regs.a;
        self.regs.update_zero_negative_flags(self.regs.y);
    }

    pub(super) fn txa(&mut self) {
        self.regs.a = self.regs.x;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tya(&mut self) {
        self.regs.a = self.regs.y;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn tsx(&mut self) {
        self.regs.x = self.regs.sp;
        self.regs.update_zero_negative_flags(self.regs.x);
    }

    /// TXS はフラグを変えない
    pub(super) fn txs(&mut self) {
        self.regs.sp = self.regs.x;
    }
}
