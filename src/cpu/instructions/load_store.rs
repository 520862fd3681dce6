//! ロード/ストア命令（LDA, LDX, LDY, STA, STX, STY）

use super::{read, write};
use crate::cpu::addressing::AddressingMode::*;
use crate::cpu::opcodes::{OpcodeEntry, ReadOp, WriteOp};
use crate::cpu::Cpu;

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        // LDA
        (0xA9, read("LDA", ReadOp::Lda, Immediate, 2)),
        (0xA5, read("LDA", ReadOp::Lda, ZeroPage, 3)),
        (0xB5, read("LDA", ReadOp::Lda, ZeroPageX, 4)),
        (0xAD, read("LDA", ReadOp::Lda, Absolute, 4)),
        (0xBD, read("LDA", ReadOp::Lda, AbsoluteX, 4)),
        (0xB9, read("LDA", ReadOp::Lda, AbsoluteY, 4)),
        (0xA1, read("LDA", ReadOp::Lda, IndirectX, 6)),
        (0xB1, read("LDA", ReadOp::Lda, IndirectY, 5)),
        // LDX
        (0xA2, read("LDX", ReadOp::Ldx, Immediate, 2)),
        (0xA6, read("LDX", ReadOp::Ldx, ZeroPage, 3)),
        (0xB6, read("LDX", ReadOp::Ldx, ZeroPageY, 4)),
        (0xAE, read("LDX", ReadOp::Ldx, Absolute, 4)),
        (0xBE, read("LDX", ReadOp::Ldx, AbsoluteY, 4)),
        // LDY
        (0xA0, read("LDY", ReadOp::Ldy, Immediate, 2)),
        (0xA4, read("LDY", ReadOp::Ldy, ZeroPage, 3)),
        (0xB4, read("LDY", ReadOp::Ldy, ZeroPageX, 4)),
        (0xAC, read("LDY", ReadOp::Ldy, Absolute, 4)),
        (0xBC, read("LDY", ReadOp::Ldy, AbsoluteX, 4)),
        // STA
        (0x85, write("STA", WriteOp::Sta, ZeroPage, 3)),
        (0x95, write("STA", WriteOp::Sta, ZeroPageX, 4)),
        (0x8D, write("STA", WriteOp::Sta, Absolute, 4)),
        (0x9D, write("STA", WriteOp::Sta, AbsoluteX, 5)),
        (0x99, write("STA", WriteOp::Sta, AbsoluteY, 5)),
        (0x81, write("STA", WriteOp::Sta, IndirectX, 6)),
        (0x91, write("STA", WriteOp::Sta, IndirectY, 6)),
        // STX
        (0x86, write("STX", WriteOp::Stx, ZeroPage, 3)),
        (0x96, write("STX", WriteOp::Stx, ZeroPageY, 4)),
        (0x8E, write("STX", WriteOp::Stx, Absolute, 4)),
        // STY
        (0x84, write("STY", WriteOp::Sty, ZeroPage, 3)),
        (0x94, write("STY", WriteOp::Sty, ZeroPageX, 4)),
        (0x8C, write("STY", WriteOp::Sty, Absolute, 4)),
    ]
}

impl Cpu {
    pub(super) fn lda(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.update_zero_negative_flags(value);
    }

    pub(super) fn ldx(&mut self, value: u8) {
        self.regs.x = value;
        self.regs.update_zero_negative_flags(value);
    }

    pub(super) fn ldy(&mut self, value: u8) {
        self.regs.y = value;
        self.regs.update_zero_negative_flags(value);
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::test_memory::cpu_with_program;

    #[test]
    fn test_lda_immediate_flags() {
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0xA9, 0x80, 0xA9, 0x00]);
        assert_eq!(cpu.step(&mut memory).unwrap(), 2);
        assert_eq!(cpu.regs.a, 0x80);
        assert!(cpu.regs.n);
        assert!(!cpu.regs.z);
        cpu.step(&mut memory).unwrap();
        assert!(cpu.regs.z);
        assert!(!cpu.regs.n);
    }

    #[test]
    fn test_lda_absolute_x_page_cross_costs_extra_cycle() {
        // LDA $12FF,X
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0xBD, 0xFF, 0x12, 0xBD, 0x00, 0x12]);
        memory.ram[0x1300] = 0x42;
        memory.ram[0x1201] = 0x24;
        cpu.regs.x = 1;
        assert_eq!(cpu.step(&mut memory).unwrap(), 5);
        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(cpu.step(&mut memory).unwrap(), 4);
        assert_eq!(cpu.regs.a, 0x24);
    }

    #[test]
    fn test_sta_indirect_y_has_fixed_cost() {
        // STA ($40),Y
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0x91, 0x40]);
        memory.ram[0x40] = 0xFF;
        memory.ram[0x41] = 0x20;
        cpu.regs.a = 0x99;
        cpu.regs.y = 0x01;
        assert_eq!(cpu.step(&mut memory).unwrap(), 6);
        assert_eq!(memory.ram[0x2100], 0x99);
    }

    #[test]
    fn test_ldx_zeropage_y_wraps() {
        // LDX $F0,Y
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0xB6, 0xF0]);
        memory.ram[0x0010] = 0x77;
        cpu.regs.y = 0x20;
        cpu.step(&mut memory).unwrap();
        assert_eq!(cpu.regs.x, 0x77);
    }

    #[test]
    fn test_store_does_not_touch_flags() {
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0x86, 0x10, 0x84, 0x11]);
        cpu.regs.x = 0;
        cpu.regs.y = 0x80;
        cpu.regs.z = false;
        cpu.regs.n = false;
        cpu.step(&mut memory).unwrap();
        cpu.step(&mut memory).unwrap();
        assert_eq!(memory.ram[0x10], 0);
        assert_eq!(memory.ram[0x11], 0x80);
        assert!(!cpu.regs.z);
        assert!(!cpu.regs.n);
    }
}
