//! オペコードテーブル
//!
//! 256エントリの固定テーブル。各エントリは命令の形（オペランド無し、
//! 読み込み、書き込み、読み込み→変更→書き込み）を持つ列挙型で、
//! 実行時は `match` で振り分ける。テーブルは命令グループごとの
//! 登録関数が返す (opcode, entry) の組から起動時に一度だけ組み立てる。

use super::addressing::AddressingMode;
use super::instructions;

/// ブランチ条件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchCondition {
    CarryClear,
    CarrySet,
    Equal,
    NotEqual,
    Minus,
    Plus,
    OverflowClear,
    OverflowSet,
}

/// オペランドを値として読まない命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpliedOp {
    Tax,
    Tay,
    Txa,
    Tya,
    Tsx,
    Txs,
    Pha,
    Php,
    Pla,
    Plp,
    Clc,
    Sec,
    Cli,
    Sei,
    Clv,
    Cld,
    Sed,
    Inx,
    Iny,
    Dex,
    Dey,
    Branch(BranchCondition),
    Jmp,
    Jsr,
    Rts,
    Rti,
    Brk,
    Nop,
}

/// 1バイト読んでレジスタ/フラグを更新する命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOp {
    Lda,
    Ldx,
    Ldy,
    Adc,
    Sbc,
    And,
    Ora,
    Eor,
    Cmp,
    Cpx,
    Cpy,
    Bit,
}

/// レジスタをメモリに書く命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Sta,
    Stx,
    Sty,
}

/// 読んで変換して同じ場所に書き戻す命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadModifyWriteOp {
    Asl,
    Lsr,
    Rol,
    Ror,
    Inc,
    Dec,
}

/// 命令の形
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    NoOperand(ImpliedOp),
    Read(ReadOp),
    Write(WriteOp),
    ReadModifyWrite(ReadModifyWriteOp),
}

/// テーブルの1エントリ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub mnemonic: &'static str,
    pub instruction: Instruction,
    pub mode: AddressingMode,
    /// 基本サイクル数（ページ境界・分岐成立の加算は含まない）
    pub cycles: u8,
}

impl OpcodeEntry {
    pub const fn new(
        mnemonic: &'static str,
        instruction: Instruction,
        mode: AddressingMode,
        cycles: u8,
    ) -> Self {
        OpcodeEntry {
            mnemonic,
            instruction,
            mode,
            cycles,
        }
    }
}

/// 256エントリのオペコードテーブル
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: [Option<OpcodeEntry>; 256],
}

impl Default for OpcodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OpcodeTable {
    /// 全命令グループの登録関数からテーブルを組み立てる
    pub fn new() -> Self {
        let mut entries: [Option<OpcodeEntry>; 256] = [None; 256];
        for (opcode, entry) in instructions::all_opcodes() {
            if let Some(existing) = &entries[opcode as usize] {
                log::error!(
                    "opcode ${:02X} registered twice ({} / {})",
                    opcode,
                    existing.mnemonic,
                    entry.mnemonic
                );
                continue;
            }
            entries[opcode as usize] = Some(entry);
        }
        OpcodeTable { entries }
    }

    /// オペコードに対応するエントリ（未定義ならNone）
    pub fn get(&self, opcode: u8) -> Option<OpcodeEntry> {
        self.entries[opcode as usize]
    }

    /// 登録済みオペコード数
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_documented_opcode_count() {
        let table = OpcodeTable::new();
        assert_eq!(table.len(), 151);
    }

    #[test]
    fn test_no_duplicate_registrations() {
        let mut seen = HashSet::new();
        for (opcode, entry) in instructions::all_opcodes() {
            assert!(seen.insert(opcode), "duplicate ${:02X} {}", opcode, entry.mnemonic);
        }
    }

    #[test]
    fn test_lookup() {
        let table = OpcodeTable::new();
        let lda = table.get(0xA9).unwrap();
        assert_eq!(lda.mnemonic, "LDA");
        assert_eq!(lda.mode, AddressingMode::Immediate);
        assert_eq!(lda.cycles, 2);
        let jmp = table.get(0x6C).unwrap();
        assert_eq!(jmp.instruction, Instruction::NoOperand(ImpliedOp::Jmp));
        assert_eq!(jmp.cycles, 5);
        assert!(table.get(0x02).is_none());
        assert!(table.get(0xFF).is_none());
    }

    #[test]
    fn test_modes_fit_instruction_shape() {
        use AddressingMode::*;
        for (opcode, entry) in instructions::all_opcodes() {
            match entry.instruction {
                Instruction::Write(_) => {
                    assert!(!matches!(entry.mode, Immediate | Accumulator | Implied), "${:02X}", opcode)
                }
                Instruction::ReadModifyWrite(_) => assert!(
                    matches!(entry.mode, Accumulator | ZeroPage | ZeroPageX | Absolute | AbsoluteX),
                    "${:02X}",
                    opcode
                ),
                Instruction::Read(_) => {
                    assert!(!matches!(entry.mode, Implied | Accumulator | Relative), "${:02X}", opcode)
                }
                Instruction::NoOperand(_) => {}
            }
        }
    }
}
