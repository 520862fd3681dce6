//! 算術・比較命令（ADC, SBC, CMP, CPX, CPY）
//!
//! ADC/SBCはDフラグが立っているとBCDとして計算する。
//! BCDモードのVフラグは下位ニブル補正後の中間値から求めるが、
//! 実機との一致は保証しない。

use super::read;
use crate::cpu::addressing::AddressingMode::*;
use crate::cpu::opcodes::{OpcodeEntry, ReadOp};
use crate::cpu::Cpu;

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        // ADC
        (0x69, read("ADC", ReadOp::Adc, Immediate, 2)),
        (0x65, read("ADC", ReadOp::Adc, ZeroPage, 3)),
        (0x75, read("ADC", ReadOp::Adc, ZeroPageX, 4)),
        (0x6D, read("ADC", ReadOp::Adc, Absolute, 4)),
        (0x7D, read("ADC", ReadOp::Adc, AbsoluteX, 4)),
        (0x79, read("ADC", ReadOp::Adc, AbsoluteY, 4)),
        (0x61, read("ADC", ReadOp::Adc, IndirectX, 6)),
        (0x71, read("ADC", ReadOp::Adc, IndirectY, 5)),
        // SBC
        (0xE9, read("SBC", ReadOp::Sbc, Immediate, 2)),
        (0xE5, read("SBC", ReadOp::Sbc, ZeroPage, 3)),
        (0xF5, read("SBC", ReadOp::Sbc, ZeroPageX, 4)),
        (0xED, read("SBC", ReadOp::Sbc, Absolute, 4)),
        (0xFD, read("SBC", ReadOp::Sbc, AbsoluteX, 4)),
        (0xF9, read("SBC", ReadOp::Sbc, AbsoluteY, 4)),
        (0xE1, read("SBC", ReadOp::Sbc, IndirectX, 6)),
        (0xF1, read("SBC", ReadOp::Sbc, IndirectY, 5)),
        // CMP
        (0xC9, read("CMP", ReadOp::Cmp, Immediate, 2)),
        (0xC5, read("CMP", ReadOp::Cmp, ZeroPage, 3)),
        (0xD5, read("CMP", ReadOp::Cmp, ZeroPageX, 4)),
        (0xCD, read("CMP", ReadOp::Cmp, Absolute, 4)),
        (0xDD, read("CMP", ReadOp::Cmp, AbsoluteX, 4)),
        (0xD9, read("CMP", ReadOp::Cmp, AbsoluteY, 4)),
        (0xC1, read("CMP", ReadOp::Cmp, IndirectX, 6)),
        (0xD1, read("CMP", ReadOp::Cmp, IndirectY, 5)),
        // CPX
        (0xE0, read("CPX", ReadOp::Cpx, Immediate, 2)),
        (0xE4, read("CPX", ReadOp::Cpx, ZeroPage, 3)),
        (0xEC, read("CPX", ReadOp::Cpx, Absolute, 4)),
        // CPY
        (0xC0, read("CPY", ReadOp::Cpy, Immediate, 2)),
        (0xC4, read("CPY", ReadOp::Cpy, ZeroPage, 3)),
        (0xCC, read("CPY", ReadOp::Cpy, Absolute, 4)),
    ]
}

impl Cpu {
    /// ADC - キャリー付き加算
    pub(super) fn adc(&mut self, value: u8) {
        let a = self.regs.a as u16;
        let v = value as u16;
        let carry = self.regs.c as u16;

        let sum = if self.regs.d {
            let mut low = (a & 0x0F) + (v & 0x0F) + carry;
            if low >= 0x0A {
                low = ((low + 0x06) & 0x0F) + 0x10;
            }
            let mut sum = (a & 0xF0) + (v & 0xF0) + low;
            self.regs.v = (!(a ^ v) & (a ^ sum) & 0x80) != 0;
            if sum >= 0xA0 {
                sum += 0x60;
            }
            sum
        } else {
            let sum = a + v + carry;
            self.regs.v = (!(a ^ v) & (a ^ sum) & 0x80) != 0;
            sum
        };

        self.regs.c = sum > 0xFF;
        self.regs.a = sum as u8;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// SBC - ボロー付き減算（ボロー = !C）
    pub(super) fn sbc(&mut self, value: u8) {
        let a = self.regs.a as i16;
        let v = value as i16;
        let borrow = (!self.regs.c) as i16;
        let binary = a - v - borrow;

        // C と V はバイナリの差から求める
        self.regs.c = binary >= 0;
        self.regs.v = ((a ^ v) & (a ^ binary) & 0x80) != 0;

        let result = if self.regs.d {
            let mut low = (a & 0x0F) - (v & 0x0F) - borrow;
            if low < 0 {
                low = ((low - 0x06) & 0x0F) - 0x10;
            }
            let mut diff = (a & 0xF0) - (v & 0xF0) + low;
            if diff < 0 {
                diff -= 0x60;
            }
            diff
        } else {
            binary
        };

        self.regs.a = result as u8;
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    /// CMP/CPX/CPY 共通の比較（差は書き戻さない）
    pub(super) fn compare(&mut self, register: u8, value: u8) {
        self.regs.c = register >= value;
        self.regs.update_zero_negative_flags(register.wrapping_sub(value));
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::test_memory::cpu_with_program;
    use crate::cpu::Cpu;

    fn adc(a: u8, value: u8, carry: bool, decimal: bool) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.regs.a = a;
        cpu.regs.c = carry;
        cpu.regs.d = decimal;
        cpu.adc(value);
        cpu
    }

    fn sbc(a: u8, value: u8, carry: bool, decimal: bool) -> Cpu {
        let mut cpu = Cpu::new();
        cpu.regs.a = a;
        cpu.regs.c = carry;
        cpu.regs.d = decimal;
        cpu.sbc(value);
        cpu
    }

    #[test]
    fn test_adc_binary() {
        let cpu = adc(0x50, 0x50, false, false);
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.v);
        assert!(cpu.regs.n);
        assert!(!cpu.regs.c);

        let cpu = adc(0xFF, 0x01, false, false);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.c);
        assert!(cpu.regs.z);
        assert!(!cpu.regs.v);

        let cpu = adc(0x01, 0x01, true, false);
        assert_eq!(cpu.regs.a, 0x03);
    }

    #[test]
    fn test_adc_decimal() {
        let cpu = adc(0x09, 0x01, false, true);
        assert_eq!(cpu.regs.a, 0x10);
        assert!(!cpu.regs.c);

        let cpu = adc(0x99, 0x01, false, true);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.c);
        assert!(cpu.regs.z);

        let cpu = adc(0x58, 0x46, true, true);
        assert_eq!(cpu.regs.a, 0x05);
        assert!(cpu.regs.c);
    }

    #[test]
    fn test_sbc_binary() {
        let cpu = sbc(0x05, 0x03, true, false);
        assert_eq!(cpu.regs.a, 0x02);
        assert!(cpu.regs.c);

        let cpu = sbc(0x00, 0x01, true, false);
        assert_eq!(cpu.regs.a, 0xFF);
        assert!(!cpu.regs.c);
        assert!(cpu.regs.n);

        let cpu = sbc(0x80, 0x01, true, false);
        assert_eq!(cpu.regs.a, 0x7F);
        assert!(cpu.regs.v);
    }

    #[test]
    fn test_sbc_decimal() {
        let cpu = sbc(0x10, 0x01, true, true);
        assert_eq!(cpu.regs.a, 0x09);
        assert!(cpu.regs.c);

        let cpu = sbc(0x00, 0x01, true, true);
        assert_eq!(cpu.regs.a, 0x99);
        assert!(!cpu.regs.c);

        let cpu = sbc(0x46, 0x12, true, true);
        assert_eq!(cpu.regs.a, 0x34);
    }

    #[test]
    fn test_compare() {
        let mut cpu = Cpu::new();
        cpu.compare(0x05, 0x05);
        assert!(cpu.regs.z);
        assert!(cpu.regs.c);
        assert!(!cpu.regs.n);

        cpu.compare(0x04, 0x05);
        assert!(!cpu.regs.z);
        assert!(!cpu.regs.c);
        assert!(cpu.regs.n);
    }

    #[test]
    fn test_cmp_does_not_write_back() {
        // CMP #$05
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0xC9, 0x05]);
        cpu.regs.a = 0x07;
        cpu.step(&mut memory).unwrap();
        assert_eq!(cpu.regs.a, 0x07);
        assert!(cpu.regs.c);
    }
}
