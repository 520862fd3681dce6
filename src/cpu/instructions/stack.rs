//! スタック命令（PHA, PHP, PLA, PLP）

use super::implied;
use crate::cpu::addressing::AddressingMode::Implied;
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry};
use crate::cpu::{Cpu, MemoryBus};

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0x48, implied("PHA", ImpliedOp::Pha, Implied, 3)),
        (0x08, implied("PHP", ImpliedOp::Php, Implied, 3)),
        (0x68, implied("PLA", ImpliedOp::Pla, Implied, 4)),
        (0x28, implied("PLP", ImpliedOp::Plp, Implied, 4)),
    ]
}

impl Cpu {
    pub(super) fn pha<M: MemoryBus>(&mut self, memory: &mut M) {
        self.push_byte(memory, self.regs.a);
    }

    /// PHP - Bとビット5は1で積まれる
    pub(super) fn php<M: MemoryBus>(&mut self, memory: &mut M) {
        let status = self.regs.processor_status();
        self.push_byte(memory, status);
    }

    pub(super) fn pla<M: MemoryBus>(&mut self, memory: &mut M) {
        self.regs.a = self.pop_byte(memory);
        self.regs.update_zero_negative_flags(self.regs.a);
    }

    pub(super) fn plp<M: MemoryBus>(&mut self, memory: &mut M) {
        let status = self.pop_byte(memory);
        self.regs.set_processor_status(status);
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::test_memory::cpu_with_program;

    #[test]
    fn test_php_plp() {
        // PHP; CLC; PLP
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0x08, 0x18, 0x28]);
        cpu.regs.c = true;
        cpu.regs.d = true;
        assert_eq!(cpu.step(&mut memory).unwrap(), 3);
        assert_eq!(memory.ram[0x01FF], 0b0011_1001);
        cpu.step(&mut memory).unwrap();
        assert!(!cpu.regs.c);
        assert_eq!(cpu.step(&mut memory).unwrap(), 4);
        assert!(cpu.regs.c);
        assert!(cpu.regs.d);
        assert_eq!(cpu.regs.sp, 0xFF);
    }

    #[test]
    fn test_pha_pla() {
        // PHA; LDA #$00; PLA
        let (mut cpu, mut memory) = cpu_with_program(0x1000, &[0x48, 0xA9, 0x00, 0x68]);
        cpu.regs.a = 0x9C;
        cpu.step(&mut memory).unwrap();
        cpu.step(&mut memory).unwrap();
        assert!(cpu.regs.z);
        cpu.step(&mut memory).unwrap();
        assert_eq!(cpu.regs.a, 0x9C);
        assert!(cpu.regs.n);
        assert!(!cpu.regs.z);
    }
}
