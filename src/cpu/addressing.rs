//! アドレッシングモードの実装
//!
//! オペランドの実効アドレス解決と、スタック操作のヘルパー。
//! すべてのメモリアクセスは `MemoryBus` の read/write のみを経由する。

use super::{Cpu, MemoryBus};

/// スタックページの先頭
pub const STACK_BASE: u16 = 0x0100;

/// アドレッシングモードの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// 暗黙的
    Implied,
    /// アキュムレータ - A
    Accumulator,
    /// 即値 - #$nn
    Immediate,
    /// ゼロページ - $nn
    ZeroPage,
    /// ゼロページ,X - $nn,X
    ZeroPageX,
    /// ゼロページ,Y - $nn,Y
    ZeroPageY,
    /// 絶対 - $nnnn
    Absolute,
    /// 絶対,X - $nnnn,X
    AbsoluteX,
    /// 絶対,Y - $nnnn,Y
    AbsoluteY,
    /// 間接 - ($nnnn)（JMPのみ）
    Indirect,
    /// 間接,X（プリインデックス） - ($nn,X)
    IndirectX,
    /// 間接,Y（ポストインデックス） - ($nn),Y
    IndirectY,
    /// 相対（ブランチ命令用） - $nn
    Relative,
}

/// インデックス加算でページ境界を越えるなら1を返す
pub fn check_for_page_boundary_cross(address: u16, index: u8) -> u32 {
    let indexed = address.wrapping_add(index as u16);
    if (address & 0xFF00) != (indexed & 0xFF00) {
        1
    } else {
        0
    }
}

impl Cpu {
    //--------------------------------------------------
    // PC相対のフェッチ
    //--------------------------------------------------

    /// PCから1バイトフェッチしてPCをインクリメント
    pub(super) fn fetch_byte<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        let value = memory.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// PCから2バイト（リトルエンディアン）をフェッチ
    pub(super) fn fetch_word<M: MemoryBus>(&mut self, memory: &mut M) -> u16 {
        let low = self.fetch_byte(memory) as u16;
        let high = self.fetch_byte(memory) as u16;
        (high << 8) | low
    }

    /// 指定アドレスから2バイト読む（ベクタ用）
    pub(super) fn read_word<M: MemoryBus>(&mut self, memory: &mut M, address: u16) -> u16 {
        let low = memory.read(address) as u16;
        let high = memory.read(address.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    /// ゼロページ内で折り返す2バイト読み出し
    fn read_zeropage_word<M: MemoryBus>(&mut self, memory: &mut M, pointer: u8) -> u16 {
        let low = memory.read(pointer as u16) as u16;
        let high = memory.read(pointer.wrapping_add(1) as u16) as u16;
        (high << 8) | low
    }

    /// JMP ($nnnn) のポインタ解決
    ///
    /// ポインタの下位バイトだけをインクリメントする（6502のページ折り返しバグ）。
    /// $02FF を指すポインタは $02FF と $0200 から読まれる。
    pub fn fetch_word_indirect_with_pc<M: MemoryBus>(&mut self, memory: &mut M) -> u16 {
        let pointer = self.fetch_word(memory);
        let low = memory.read(pointer) as u16;
        let high_addr = (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF);
        let high = memory.read(high_addr) as u16;
        (high << 8) | low
    }

    //--------------------------------------------------
    // 実効アドレス
    //--------------------------------------------------

    /// モードに従ってオペランドの実効アドレスを求める
    ///
    /// `page_penalty` が真なら、インデックス付きモードでページ境界を
    /// 越えたときに1サイクル加算する（読み込み命令のみ）。
    /// 即値と相対はオペランドバイト自身のアドレスを返す。
    pub(super) fn resolve_address<M: MemoryBus>(
        &mut self,
        memory: &mut M,
        mode: AddressingMode,
        page_penalty: bool,
    ) -> u16 {
        match mode {
            AddressingMode::Immediate | AddressingMode::Relative => {
                let address = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                address
            }
            AddressingMode::ZeroPage => self.fetch_byte(memory) as u16,
            AddressingMode::ZeroPageX => self.fetch_byte(memory).wrapping_add(self.regs.x) as u16,
            AddressingMode::ZeroPageY => self.fetch_byte(memory).wrapping_add(self.regs.y) as u16,
            AddressingMode::Absolute => self.fetch_word(memory),
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(memory);
                self.indexed(base, self.regs.x, page_penalty)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(memory);
                self.indexed(base, self.regs.y, page_penalty)
            }
            AddressingMode::Indirect => self.fetch_word_indirect_with_pc(memory),
            AddressingMode::IndirectX => {
                let pointer = self.fetch_byte(memory).wrapping_add(self.regs.x);
                self.read_zeropage_word(memory, pointer)
            }
            AddressingMode::IndirectY => {
                let pointer = self.fetch_byte(memory);
                let base = self.read_zeropage_word(memory, pointer);
                self.indexed(base, self.regs.y, page_penalty)
            }
            // オペランド無し
            AddressingMode::Implied | AddressingMode::Accumulator => 0,
        }
    }

    fn indexed(&mut self, base: u16, index: u8, page_penalty: bool) -> u16 {
        if page_penalty {
            self.cycles += check_for_page_boundary_cross(base, index);
        }
        base.wrapping_add(index as u16)
    }

    /// 読み込み命令のオペランド値を取得
    pub(super) fn read_operand<M: MemoryBus>(&mut self, memory: &mut M, mode: AddressingMode) -> u8 {
        match mode {
            AddressingMode::Accumulator => self.regs.a,
            _ => {
                let address = self.resolve_address(memory, mode, true);
                memory.read(address)
            }
        }
    }

    /// 読み込み→変換→書き戻し
    ///
    /// アキュムレータモードならAに、それ以外は読んだアドレスに書き戻す。
    pub(super) fn read_modify_write<M, F>(&mut self, memory: &mut M, mode: AddressingMode, op: F)
    where
        M: MemoryBus,
        F: FnOnce(&mut Cpu, u8) -> u8,
    {
        if mode == AddressingMode::Accumulator {
            let value = self.regs.a;
            self.regs.a = op(self, value);
        } else {
            let address = self.resolve_address(memory, mode, false);
            let value = memory.read(address);
            let result = op(self, value);
            memory.write(address, result);
        }
    }

    //--------------------------------------------------
    // スタック（$0100-$01FF、SPは8ビットで折り返す）
    //--------------------------------------------------

    /// スタックに1バイトプッシュ
    pub fn push_byte<M: MemoryBus>(&mut self, memory: &mut M, value: u8) {
        memory.write(STACK_BASE | self.regs.sp as u16, value);
        self.regs.sp = self.regs.sp.wrapping_sub(1);
    }

    /// スタックから1バイトポップ
    pub fn pop_byte<M: MemoryBus>(&mut self, memory: &mut M) -> u8 {
        self.regs.sp = self.regs.sp.wrapping_add(1);
        memory.read(STACK_BASE | self.regs.sp as u16)
    }

    /// スタックに2バイトプッシュ（上位バイト先）
    pub fn push_word<M: MemoryBus>(&mut self, memory: &mut M, value: u16) {
        self.push_byte(memory, (value >> 8) as u8);
        self.push_byte(memory, value as u8);
    }

    /// スタックから2バイトポップ
    pub fn pop_word<M: MemoryBus>(&mut self, memory: &mut M) -> u16 {
        let low = self.pop_byte(memory) as u16;
        let high = self.pop_byte(memory) as u16;
        (high << 8) | low
    }
}
