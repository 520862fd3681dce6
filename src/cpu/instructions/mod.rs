//! 命令セット
//!
//! 命令グループごとにオペコード登録関数と命令の意味論を持つ。
//! `execute` はテーブルのエントリを受け取り、形ごとに振り分ける。

mod arithmetic;
mod branch;
mod inc_dec;
mod jumps_calls;
mod load_store;
mod logical;
mod shift;
mod stack;
mod status_flags;
mod system;
mod transfer;

use super::addressing::AddressingMode;
use super::opcodes::{
    ImpliedOp, Instruction, OpcodeEntry, ReadModifyWriteOp, ReadOp, WriteOp,
};
use super::{Cpu, MemoryBus};

/// 全グループのオペコードを集める
pub(super) fn all_opcodes() -> Vec<(u8, OpcodeEntry)> {
    let mut opcodes = Vec::with_capacity(151);
    opcodes.extend(load_store::opcodes());
    opcodes.extend(arithmetic::opcodes());
    opcodes.extend(logical::opcodes());
    opcodes.extend(shift::opcodes());
    opcodes.extend(inc_dec::opcodes());
    opcodes.extend(transfer::opcodes());
    opcodes.extend(stack::opcodes());
    opcodes.extend(status_flags::opcodes());
    opcodes.extend(branch::opcodes());
    opcodes.extend(jumps_calls::opcodes());
    opcodes.extend(system::opcodes());
    opcodes
}

fn implied(mnemonic: &'static str, op: ImpliedOp, mode: AddressingMode, cycles: u8) -> OpcodeEntry {
    OpcodeEntry::new(mnemonic, Instruction::NoOperand(op), mode, cycles)
}

fn read(mnemonic: &'static str, op: ReadOp, mode: AddressingMode, cycles: u8) -> OpcodeEntry {
    OpcodeEntry::new(mnemonic, Instruction::Read(op), mode, cycles)
}

fn write(mnemonic: &'static str, op: WriteOp, mode: AddressingMode, cycles: u8) -> OpcodeEntry {
    OpcodeEntry::new(mnemonic, Instruction::Write(op), mode, cycles)
}

fn rmw(mnemonic: &'static str, op: ReadModifyWriteOp, mode: AddressingMode, cycles: u8) -> OpcodeEntry {
    OpcodeEntry::new(mnemonic, Instruction::ReadModifyWrite(op), mode, cycles)
}

impl Cpu {
    /// テーブルのエントリを1つ実行する
    pub(super) fn execute<M: MemoryBus>(&mut self, memory: &mut M, entry: OpcodeEntry) {
        match entry.instruction {
            Instruction::NoOperand(op) => self.execute_no_operand(memory, op, entry.mode),
            Instruction::Read(op) => {
                let value = self.read_operand(memory, entry.mode);
                match op {
                    ReadOp::Lda => self.lda(value),
                    ReadOp::Ldx => self.ldx(value),
                    ReadOp::Ldy => self.ldy(value),
                    ReadOp::Adc => self.adc(value),
                    ReadOp::Sbc => self.sbc(value),
                    ReadOp::And => self.and(value),
                    ReadOp::Ora => self.ora(value),
                    ReadOp::Eor => self.eor(value),
                    ReadOp::Cmp => self.compare(self.regs.a, value),
                    ReadOp::Cpx => self.compare(self.regs.x, value),
                    ReadOp::Cpy => self.compare(self.regs.y, value),
                    ReadOp::Bit => self.bit(value),
                }
            }
            Instruction::Write(op) => {
                let address = self.resolve_address(memory, entry.mode, false);
                let value = match op {
                    WriteOp::Sta => self.regs.a,
                    WriteOp::Stx => self.regs.x,
                    WriteOp::Sty => self.regs.y,
                };
                memory.write(address, value);
            }
            Instruction::ReadModifyWrite(op) => {
                self.read_modify_write(memory, entry.mode, |cpu, value| match op {
                    ReadModifyWriteOp::Asl => cpu.asl(value),
                    ReadModifyWriteOp::Lsr => cpu.lsr(value),
                    ReadModifyWriteOp::Rol => cpu.rol(value),
                    ReadModifyWriteOp::Ror => cpu.ror(value),
                    ReadModifyWriteOp::Inc => cpu.inc(value),
                    ReadModifyWriteOp::Dec => cpu.dec(value),
                })
            }
        }
    }

    fn execute_no_operand<M: MemoryBus>(&mut self, memory: &mut M, op: ImpliedOp, mode: AddressingMode) {
        match op {
            ImpliedOp::Tax => self.tax(),
            ImpliedOp::Tay => self.tay(),
            ImpliedOp::Txa => self.txa(),
            ImpliedOp::Tya => self.tya(),
            ImpliedOp::Tsx => self.tsx(),
            ImpliedOp::Txs => self.txs(),
            ImpliedOp::Pha => self.pha(memory),
            ImpliedOp::Php => self.php(memory),
            ImpliedOp::Pla => self.pla(memory),
            ImpliedOp::Plp => self.plp(memory),
            ImpliedOp::Clc => self.regs.c = false,
            ImpliedOp::Sec => self.regs.c = true,
            ImpliedOp::Cli => self.regs.i = false,
            ImpliedOp::Sei => self.regs.i = true,
            ImpliedOp::Clv => self.regs.v = false,
            ImpliedOp::Cld => self.regs.d = false,
            ImpliedOp::Sed => self.regs.d = true,
            ImpliedOp::Inx => self.inx(),
            ImpliedOp::Iny => self.iny(),
            ImpliedOp::Dex => self.dex(),
            ImpliedOp::Dey => self.dey(),
            ImpliedOp::Branch(condition) => self.branch(memory, condition),
            ImpliedOp::Jmp => self.jmp(memory, mode),
            ImpliedOp::Jsr => self.jsr(memory),
            ImpliedOp::Rts => self.rts(memory),
            ImpliedOp::Rti => self.rti(memory),
            ImpliedOp::Brk => self.brk(),
            ImpliedOp::Nop => {}
        }
    }
}
