//! システム命令（BRK, NOP）

use super::implied;
use crate::cpu::addressing::AddressingMode::Implied;
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry};
use crate::cpu::{Cpu, Interrupt};

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0x00, implied("BRK", ImpliedOp::Brk, Implied, 7)),
        (0xEA, implied("NOP", ImpliedOp::Nop, Implied, 2)),
    ]
}

impl Cpu {
    /// BRK - シグネチャバイトを飛ばしてから割り込みを発生させる
    ///
    /// 実際の割り込みシーケンスは命令の後に `service_interrupt` で処理する。
    pub(super) fn brk(&mut self) {
        self.regs.pc = self.regs.pc.wrapping_add(1);
        self.latch_interrupt(Interrupt::Brk);
    }
}
