//! ジャンプ/サブルーチン命令（JMP, JSR, RTS, RTI）

use super::implied;
use crate::cpu::addressing::AddressingMode::{self, *};
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry};
use crate::cpu::{Cpu, MemoryBus};

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0x4C, implied("JMP", ImpliedOp::Jmp, Absolute, 3)),
        (0x6C, implied("JMP", ImpliedOp::Jmp, Indirect, 5)),
        (0x20, implied("JSR", ImpliedOp::Jsr, Absolute, 6)),
        (0x60, implied("RTS", ImpliedOp::Rts, Implied, 6)),
        (0x40, implied("RTI", ImpliedOp::Rti, Implied, 6)),
    ]
}

impl Cpu {
    /// JMP - 間接モードはページ折り返しバグを再現する
    pub(super) fn jmp<M: MemoryBus>(&mut self, memory: &mut M, mode: AddressingMode) {
        self.regs.pc = self.resolve_address(memory, mode, false);
    }

    /// JSR - オペランド最終バイトのアドレスを積む
    pub(super) fn jsr<M: MemoryBus>(&mut self, memory: &mut M) {
        let target = self.fetch_word(memory);
        let return_addr = self.regs.pc.wrapping_sub(1);
        self.push_word(memory, return_addr);
        self.regs.pc = target;
    }

    pub(super) fn rts<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.pc = self.pop_word(memory).wrapping_add(1);
    }

    /// RTI - ステータス、PCの順に戻す
    pub(super) fn rti<M: MemoryBus>(&mut self, memory: &mut M) {
        let status = self.pop_byte(memory);
        self.regs.set_processor_status(status);
        self.regs.pc = self.pop_word(memory);
    }
}
