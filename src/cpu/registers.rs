//! CPUレジスタとステータスフラグ
//!
//! 6510のレジスタ群。フラグはビットではなく個別のboolで保持し、
//! ステータスバイトは必要になった時点で組み立てる。

use std::fmt;

/// ステータスバイトのビット位置
pub mod flags {
    pub const CARRY: u8 = 0b0000_0001;      // C
    pub const ZERO: u8 = 0b0000_0010;       // Z
    pub const IRQ_DISABLE: u8 = 0b0000_0100; // I
    pub const DECIMAL: u8 = 0b0000_1000;    // D
    pub const BREAK: u8 = 0b0001_0000;      // B（読み出し時は常に1）
    pub const UNUSED: u8 = 0b0010_0000;     // 常に1
    pub const OVERFLOW: u8 = 0b0100_0000;   // V
    pub const NEGATIVE: u8 = 0b1000_0000;   // N
}

/// レジスタダンプのヘッダ行
pub const DUMP_HEADER: &str = " PC   AC XR YR SP   NV-BDIZC  CY";

/// CPUレジスタの状態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    /// プログラムカウンタ
    pub pc: u16,
    /// アキュムレータ
    pub a: u8,
    /// Xインデックスレジスタ
    pub x: u8,
    /// Yインデックスレジスタ
    pub y: u8,
    /// スタックポインタ（$0100ページ内のオフセット）
    pub sp: u8,
    /// 負数フラグ
    pub n: bool,
    /// オーバーフローフラグ
    pub v: bool,
    /// ブレークフラグ
    pub b: bool,
    /// BCDモードフラグ
    pub d: bool,
    /// 割り込み禁止フラグ
    pub i: bool,
    /// ゼロフラグ
    pub z: bool,
    /// キャリーフラグ
    pub c: bool,
    /// 起動からの累積サイクル数
    pub cycles: u64,
}

impl Registers {
    pub fn new() -> Self {
        let mut regs = Registers::default();
        regs.reset();
        regs
    }

    /// コールドスタート時の状態に戻す（サイクル数はそのまま）
    pub fn reset(&mut self) {
        self.pc = 0;
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFF;
        self.n = false;
        self.v = false;
        self.b = false;
        self.d = false;
        self.i = false;
        self.z = false;
        self.c = false;
    }

    /// フラグをステータスバイトに詰める
    ///
    /// ビット5とビット4（B）は常に1として読める。
    pub fn processor_status(&self) -> u8 {
        let mut status = flags::UNUSED | flags::BREAK;
        if self.n {
            status |= flags::NEGATIVE;
        }
        if self.v {
            status |= flags::OVERFLOW;
        }
        if self.d {
            status |= flags::DECIMAL;
        }
        if self.i {
            status |= flags::IRQ_DISABLE;
        }
        if self.z {
            status |= flags::ZERO;
        }
        if self.c {
            status |= flags::CARRY;
        }
        status
    }

    /// ステータスバイトを各フラグに展開する
    ///
    /// Bには実体のレジスタが無いため、常にtrueになる。
    pub fn set_processor_status(&mut self, status: u8) {
        self.n = status & flags::NEGATIVE != 0;
        self.v = status & flags::OVERFLOW != 0;
        self.b = true;
        self.d = status & flags::DECIMAL != 0;
        self.i = status & flags::IRQ_DISABLE != 0;
        self.z = status & flags::ZERO != 0;
        self.c = status & flags::CARRY != 0;
    }

    /// 値が0ならZをセット
    pub fn set_zero_flag(&mut self, value: u8) {
        self.z = value == 0;
    }

    /// ビット7が立っていればNをセット
    pub fn set_negative_flag(&mut self, value: u8) {
        self.n = value & 0x80 != 0;
    }

    /// ゼロフラグと負数フラグを値に基づいて更新
    pub fn update_zero_negative_flags(&mut self, value: u8) {
        self.set_zero_flag(value);
        self.set_negative_flag(value);
    }
}

impl fmt::Display for Registers {
    /// `DUMP_HEADER` に揃えた1行ダンプ
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04X}  {:02X} {:02X} {:02X} {:02X}   {:08b}  {}",
            self.pc,
            self.a,
            self.x,
            self.y,
            self.sp,
            self.processor_status(),
            self.cycles
        )
    }
}
