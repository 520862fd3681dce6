//! 論理演算命令（AND, ORA, EOR, BIT）

use super::read;
use crate::cpu::addressing::AddressingMode::*;
use crate::cpu::opcodes::{OpcodeEntry, ReadOp};
use crate::cpu::Cpu;

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    let mut opcodes = Vec::with_capacity(26);
    for (mnemonic, op, base) in [
        ("ORA", ReadOp::Ora, 0x00u8),
        ("AND", ReadOp::And, 0x20),
        ("EOR", ReadOp::Eor, 0x40),
    ] {
        // 3グループとも同じオペコード配置
        opcodes.extend([
            (base | 0x09, read(mnemonic, op, Immediate, 2)),
            (base | 0x05, read(mnemonic, op, ZeroPage, 3)),
            (base | 0x15, read(mnemonic, op, ZeroPageX, 4)),
            (base | 0x0D, read(mnemonic, op, Absolute, 4)),
            (base | 0x1D, read(mnemonic, op, AbsoluteX, 4)),
            (base | 0x19, read(mnemonic, op, AbsoluteY, 4)),
            (base | 0x01, read(mnemonic, op, IndirectX, 6)),
            (base | 0x11, read(mnemonic, op, IndirectY, 5)),
        ]);
    }
    opcodes.push((0x24, read("BIT", ReadOp::Bit, ZeroPage, 3)));
    opcodes.push((0x2C, read("BIT", ReadOp::Bit, Absolute, 4)));
    opcodes
}

impl Cpu {
    pub(super) fn and(&mut self, value: u8) {
        self.regs.a &= value;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn ora(&mut self, value: u8) {
        self.regs.a |= value;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn eor(&mut self, value: u8) {
        self.regs.a ^= value;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// BIT - ZはA&値、NとVは値のビット7/6をそのまま写す
    pub(super) fn bit(&mut self, value: u8) {
        self.regs.z = self.regs.a & value == 0;
        self.regs.n = value & 0x80 != 0;
        self.regs.v = value & 0x40 != 0;
    }
}
