//! 分岐命令（BPL, BMI, BVC, BVS, BCC, BCS, BNE, BEQ）
//!
//! 基本2サイクル。分岐成立で+1、さらにページを跨げば+1。

use super::implied;
use crate::cpu::addressing::AddressingMode::Relative;
use crate::cpu::opcodes::{BranchCondition, ImpliedOp, OpcodeEntry};
use crate::cpu::{Cpu, MemoryBus};

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    let branch = |mnemonic, condition| implied(mnemonic, ImpliedOp::Branch(condition), Relative, 2);
    vec![
        (0x10, branch("BPL", BranchCondition::Plus)),
        (0x30, branch("BMI", BranchCondition::Minus)),
        (0x50, branch("BVC", BranchCondition::OverflowClear)),
        (0x70, branch("BVS", BranchCondition::OverflowSet)),
        (0x90, branch("BCC", BranchCondition::CarryClear)),
        (0xB0, branch("BCS", BranchCondition::CarrySet)),
        (0xD0, branch("BNE", BranchCondition::NotEqual)),
        (0xF0, branch("BEQ", BranchCondition::Equal)),
    ]
}

impl Cpu {
    fn branch_taken(&self, condition: BranchCondition) -> bool {
        match condition {
            BranchCondition::CarryClear => !self.regs.c,
            BranchCondition::CarrySet => self.regs.c,
            BranchCondition::Equal => self.regs.z,
            BranchCondition::NotEqual => !self.regs.z,
            BranchCondition::Minus => self.regs.n,
            BranchCondition::Plus => !self.regs.n,
            BranchCondition::OverflowClear => !self.regs.v,
            BranchCondition::OverflowSet => self.regs.v,
        }
    }

    pub(super) fn branch<M: MemoryBus>(&mut self, memory: &mut M, condition: BranchCondition) {
        let offset = self.fetch_byte(memory) as i8;
        if self.branch_taken(condition) {
            let old_pc = self.regs.pc;
            self.regs.pc = old_pc.wrapping_add(offset as u16);
            self.cycles += 1;
            // ページ境界を越えた場合、追加サイクル
            if (old_pc & 0xFF00) != (self.regs.pc & 0xFF00) {
                self.cycles += 1;
            }
        }
    }
}
