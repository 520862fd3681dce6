//! インクリメント/デクリメント命令（INC, DEC, INX, INY, DEX, DEY）

use super::{implied, rmw};
use crate::cpu::addressing::AddressingMode::*;
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry, ReadModifyWriteOp};
use crate::cpu::Cpu;

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0xE6, rmw("INC", ReadModifyWriteOp::Inc, ZeroPage, 5)),
        (0xF6, rmw("INC", ReadModifyWriteOp::Inc, ZeroPageX, 6)),
        (0xEE, rmw("INC", ReadModifyWriteOp::Inc, Absolute, 6)),
        (0xFE, rmw("INC", ReadModifyWriteOp::Inc, AbsoluteX, 7)),
        (0xC6, rmw("DEC", ReadModifyWriteOp::Dec, ZeroPage, 5)),
        (0xD6, rmw("DEC", ReadModifyWriteOp::Dec, ZeroPageX, 6)),
        (0xCE, rmw("DEC", ReadModifyWriteOp::Dec, Absolute, 6)),
        (0xDE, rmw("DEC", ReadModifyWriteOp::Dec, AbsoluteX, 7)),
        (0xE8, implied("INX", ImpliedOp::Inx, Implied, 2)),
        (0xC8, implied("INY", ImpliedOp::Iny, Implied, 2)),
        (0xCA, implied("DEX", ImpliedOp::Dex, Implied, 2)),
        (0x88, implied("DEY", ImpliedOp::Dey, Implied, 2)),
    ]
}

impl Cpu {
    pub(super) fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.update_zero_negative_flags(result);
        result
    }

    pub(super) fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.update_zero_negative_flags(result);
        result
    }

    pub(super) fn inx(&mut self) {
        self.regs.x = self.inc(self.regs.x);
    }

    pub(super) fn iny(&mut self) {
        self.regs.y = self.inc(self.regs.y);
    }

    pub(super) fn dex(&mut self) {
        self.regs.x = self.dec(self.regs.x);
    }

    pub(super) fn dey(&mut self) {
        self.regs.y = self.dec(self.regs.y);
    }
}
