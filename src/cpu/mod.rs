//! MOS 6510 CPU Emulator
//!
//! C64で使用される6510プロセッサのエミュレーション実装。
//! 命令のデコードは256エントリのテーブルで行い、割り込みは
//! 命令と命令の間にだけ処理する。

pub mod addressing;
mod instructions;
pub mod opcodes;
mod registers;
#[cfg(test)]
pub(crate) mod test_memory;

pub use addressing::{check_for_page_boundary_cross, AddressingMode};
pub use opcodes::{Instruction, OpcodeEntry, OpcodeTable};
pub use registers::{flags, Registers, DUMP_HEADER};

use crate::error::{C64Error, Result};

/// NMIベクタ
pub const NMI_VECTOR: u16 = 0xFFFA;
/// リセットベクタ
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRKベクタ
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// 割り込み受付にかかるサイクル数
const INTERRUPT_CYCLES: u32 = 7;

/// メモリバスインターフェース
/// CPUがメモリにアクセスするために必要なトレイト
pub trait MemoryBus {
    /// メモリから1バイト読み取り
    fn read(&mut self, address: u16) -> u8;
    /// メモリに1バイト書き込み
    fn write(&mut self, address: u16, value: u8);
}

/// 保留中の割り込みの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Irq,
    Nmi,
    Reset,
    Brk,
}

impl Interrupt {
    /// 割り込みベクタのアドレス
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Irq | Interrupt::Brk => IRQ_VECTOR,
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Reset => RESET_VECTOR,
        }
    }

    /// 同じステップで複数発生したときの優先度
    fn priority(self) -> u8 {
        match self {
            Interrupt::Irq => 0,
            Interrupt::Brk => 1,
            Interrupt::Nmi => 2,
            Interrupt::Reset => 3,
        }
    }
}

/// 6510 CPUエミュレータ
#[derive(Debug, Clone)]
pub struct Cpu {
    /// CPUレジスタ（累積サイクル数を含む）
    pub regs: Registers,
    /// 現在の命令で消費したサイクル
    pub cycles: u32,
    /// デコードテーブル
    table: OpcodeTable,
    /// 割り込みラッチ
    pending: Option<Interrupt>,
    /// BRKが実行された（NMIに横取りされてもBを積む）
    brk_latched: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// 新しいCPUインスタンスを作成
    pub fn new() -> Self {
        Self::with_registers(Registers::new())
    }

    /// 先に用意したレジスタでCPUを作成
    pub fn with_registers(regs: Registers) -> Self {
        Cpu {
            regs,
            cycles: 0,
            table: OpcodeTable::new(),
            pending: None,
            brk_latched: false,
        }
    }

    /// CPUをリセットし、リセットベクタからPCを読み込む
    pub fn reset<M: MemoryBus>(&mut self, memory: &mut M) {
        self.signal_reset();
        self.service_interrupt(memory);
    }

    /// 1命令を実行し、消費したサイクル数を返す
    ///
    /// 未定義オペコードではPCをオペコードの位置に戻してエラーを返す。
    pub fn step<M: MemoryBus>(&mut self, memory: &mut M) -> Result<u32> {
        let opcode = self.fetch_byte(memory);
        let Some(entry) = self.table.get(opcode) else {
            self.regs.pc = self.regs.pc.wrapping_sub(1);
            return Err(C64Error::UnknownOpcode {
                opcode,
                pc: self.regs.pc,
            });
        };

        self.cycles = entry.cycles as u32;
        self.execute(memory, entry);
        self.regs.cycles += self.cycles as u64;
        Ok(self.cycles)
    }

    //--------------------------------------------------
    // 割り込み
    //--------------------------------------------------

    /// IRQを要求する（Iフラグが立っていれば無視）
    pub fn signal_irq(&mut self) {
        if self.regs.i {
            return;
        }
        self.latch_interrupt(Interrupt::Irq);
    }

    /// NMIを要求する
    pub fn signal_nmi(&mut self) {
        self.latch_interrupt(Interrupt::Nmi);
    }

    /// RESETを要求する
    pub fn signal_reset(&mut self) {
        self.latch_interrupt(Interrupt::Reset);
    }

    /// 保留中の割り込み
    pub fn pending_interrupt(&self) -> Option<Interrupt> {
        self.pending
    }

    /// より優先度の高いものだけがラッチを上書きする
    pub(crate) fn latch_interrupt(&mut self, interrupt: Interrupt) {
        if interrupt == Interrupt::Brk {
            self.brk_latched = true;
        }
        match self.pending {
            Some(current) if current.priority() >= interrupt.priority() => {}
            _ => self.pending = Some(interrupt),
        }
    }

    /// ラッチされた割り込みを処理し、追加で消費したサイクル数を返す
    ///
    /// RESET以外はPC（上位バイト先）とステータスを積み、Iをセットする。
    /// 積むステータスのBはBRKのときだけ1。BRKと同時のNMIは
    /// NMIベクタへ飛ぶが、Bは1のまま積む。
    pub fn service_interrupt<M: MemoryBus>(&mut self, memory: &mut M) -> u32 {
        let Some(interrupt) = self.pending.take() else {
            return 0;
        };
        let software = std::mem::take(&mut self.brk_latched);

        if interrupt == Interrupt::Reset {
            self.regs.reset();
        } else {
            self.push_word(memory, self.regs.pc);
            let mut status = self.regs.processor_status();
            if !software {
                status &= !flags::BREAK;
            }
            self.push_byte(memory, status);
            self.regs.i = true;
        }
        self.regs.pc = self.read_word(memory, interrupt.vector());
        log::trace!("{:?} -> ${:04X}", interrupt, self.regs.pc);

        // BRKのサイクルは命令側で計上済み
        let cycles = if software && interrupt != Interrupt::Reset {
            0
        } else {
            INTERRUPT_CYCLES
        };
        self.regs.cycles += cycles as u64;
        cycles
    }
}
