//! シフト/ローテート命令（ASL, LSR, ROL, ROR）
//!
//! 9ビットの中間値で計算し、はみ出したビットをキャリーに入れる。

use super::rmw;
use crate::cpu::addressing::AddressingMode::{self, *};
use crate::cpu::opcodes::{OpcodeEntry, ReadModifyWriteOp};
use crate::cpu::Cpu;

fn group(mnemonic: &'static str, op: ReadModifyWriteOp, base: u8) -> Vec<(u8, OpcodeEntry)> {
    let modes: [(u8, AddressingMode, u8); 5] = [
        (0x0A, Accumulator, 2),
        (0x06, ZeroPage, 5),
        (0x16, ZeroPageX, 6),
        (0x0E, Absolute, 6),
        (0x1E, AbsoluteX, 7),
    ];
    modes
        .iter()
        .map(|&(offset, mode, cycles)| (base | offset, rmw(mnemonic, op, mode, cycles)))
        .collect()
}

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    let mut opcodes = group("ASL", ReadModifyWriteOp::Asl, 0x00);
    opcodes.extend(group("ROL", ReadModifyWriteOp::Rol, 0x20));
    opcodes.extend(group("LSR", ReadModifyWriteOp::Lsr, 0x40));
    opcodes.extend(group("ROR", ReadModifyWriteOp::Ror, 0x60));
    opcodes
}

impl Cpu {
    pub(super) fn asl(&mut self, value: u8) -> u8 {
        let shifted = (value as u16) << 1;
        self.store_shift_result(shifted & 0x100 != 0, shifted as u8)
    }

    pub(super) fn lsr(&mut self, value: u8) -> u8 {
        let shifted = (value as u16) >> 1;
        self.store_shift_result(value & 0x01 != 0, shifted as u8)
    }

    pub(super) fn rol(&mut self, value: u8) -> u8 {
        let shifted = ((value as u16) << 1) | self.regs.c as u16;
        self.store_shift_result(shifted & 0x100 != 0, shifted as u8)
    }

    pub(super) fn ror(&mut self, value: u8) -> u8 {
        let extended = ((self.regs.c as u16) << 8) | value as u16;
        self.store_shift_result(value & 0x01 != 0, (extended >> 1) as u8)
    }

    fn store_shift_result(&mut self, carry: bool, result: u8) -> u8 {
        self.regs.c = carry;
        self.regs.update_zero_negative_flags(result);
        result
    }
}
