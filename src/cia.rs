//! CIA 6526 (CIA1, $DC00-$DC0F)
//!
//! 2本の16ビットダウンカウンタ（Timer A/B）と、BCDの時刻クロック（TOD）、
//! 割り込み制御レジスタ（ICR）、キーボードマトリクスにつながるデータポート。
//! `cycle()` を1マシンサイクルごとに呼ぶ。

use bitflags::bitflags;

/// PALのクロック周波数
pub const PAL_CYCLES_PER_SECOND: u32 = 985_248;

// レジスタオフセット
pub const PRA: u8 = 0x00;
pub const PRB: u8 = 0x01;
pub const DDRA: u8 = 0x02;
pub const DDRB: u8 = 0x03;
pub const TA_LO: u8 = 0x04;
pub const TA_HI: u8 = 0x05;
pub const TB_LO: u8 = 0x06;
pub const TB_HI: u8 = 0x07;
pub const TOD_TEN: u8 = 0x08;
pub const TOD_SEC: u8 = 0x09;
pub const TOD_MIN: u8 = 0x0A;
pub const TOD_HRS: u8 = 0x0B;
pub const SDR: u8 = 0x0C;
pub const ICR: u8 = 0x0D;
pub const CRA: u8 = 0x0E;
pub const CRB: u8 = 0x0F;

/// 16バイトのレジスタブロックは$DC00-$DCFFでミラーされる
pub const REGISTER_MASK: u8 = 0x0F;

/// ICRの読み出しでIRQ発生を示すビット
pub const ICR_IRQ: u8 = 0x80;

bitflags! {
    /// 割り込み要因（ICRのビット0-4）
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct InterruptSource: u8 {
        const TIMER_A = 0x01;
        const TIMER_B = 0x02;
        const TOD_ALARM = 0x04;
        const SERIAL = 0x08;
        const FLAG = 0x10;
    }
}

bitflags! {
    /// CRA/CRB
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TimerControl: u8 {
        const START = 0x01;
        const PB_OUTPUT = 0x02;
        const PB_TOGGLE = 0x04;
        const ONE_SHOT = 0x08;
        /// 書き込み時のみ有効（ラッチをカウンタへ転送）
        const FORCE_LOAD = 0x10;
        const INPUT_MODE_0 = 0x20;
        const INPUT_MODE_1 = 0x40;
        /// CRA: TOD 50Hz / CRB: TOD書き込み先をアラームにする
        const EXTRA = 0x80;
    }
}

/// 16ビットダウンカウンタ
#[derive(Debug, Clone, Default)]
pub struct Timer {
    counter: u16,
    latch: u16,
    control: TimerControl,
}

impl Timer {
    pub fn counter(&self) -> u16 {
        self.counter
    }

    pub fn latch(&self) -> u16 {
        self.latch
    }

    pub fn running(&self) -> bool {
        self.control.contains(TimerControl::START)
    }

    pub fn one_shot(&self) -> bool {
        self.control.contains(TimerControl::ONE_SHOT)
    }

    fn write_latch_low(&mut self, value: u8) {
        self.latch = (self.latch & 0xFF00) | value as u16;
    }

    /// 停止中なら上位バイトの書き込みでカウンタもロードされる
    fn write_latch_high(&mut self, value: u8) {
        self.latch = (self.latch & 0x00FF) | ((value as u16) << 8);
        if !self.running() {
            self.counter = self.latch;
        }
    }

    fn write_control(&mut self, value: u8) {
        let control = TimerControl::from_bits_retain(value);
        if control.contains(TimerControl::FORCE_LOAD) {
            self.counter = self.latch;
        }
        self.control = control - TimerControl::FORCE_LOAD;
    }

    /// 1カウント進め、アンダーフローしたらtrue
    ///
    /// アンダーフロー時はラッチから再ロードし、ワンショットなら停止する。
    fn count(&mut self) -> bool {
        if self.counter > 1 {
            self.counter -= 1;
            return false;
        }
        self.counter = self.latch;
        if self.one_shot() {
            self.control.remove(TimerControl::START);
        }
        true
    }
}

/// Timer B の入力
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerBInput {
    Phi2,
    Cnt,
    TimerA,
    TimerAWithCnt,
}

impl TimerBInput {
    fn from_control(control: TimerControl) -> Self {
        match control.bits() & 0x60 {
            0x00 => TimerBInput::Phi2,
            0x20 => TimerBInput::Cnt,
            0x40 => TimerBInput::TimerA,
            _ => TimerBInput::TimerAWithCnt,
        }
    }
}

/// TODの時刻（すべてBCD、時はビット7がPM）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TodTime {
    pub tenths: u8,
    pub seconds: u8,
    pub minutes: u8,
    pub hours: u8,
}

fn bcd_increment(value: u8) -> u8 {
    if value & 0x0F >= 0x09 {
        (value & 0xF0) + 0x10
    } else {
        value + 1
    }
}

impl TodTime {
    /// 1秒進める
    fn advance_second(&mut self) {
        self.tenths = 0;
        self.seconds = bcd_increment(self.seconds);
        if self.seconds < 0x60 {
            return;
        }
        self.seconds = 0;
        self.minutes = bcd_increment(self.minutes);
        if self.minutes < 0x60 {
            return;
        }
        self.minutes = 0;

        let pm = self.hours & 0x80;
        let hour = self.hours & 0x1F;
        self.hours = match hour {
            // 11時→12時でAM/PMが反転する
            0x11 => 0x12 | (pm ^ 0x80),
            0x12 => 0x01 | pm,
            _ => bcd_increment(hour) | pm,
        };
    }
}

/// 時刻クロック
#[derive(Debug, Clone)]
pub struct TodClock {
    time: TodTime,
    alarm: TodTime,
    /// TODHRS読み出しで固定した時刻
    latched: Option<TodTime>,
    stopped: bool,
    cycles_per_second: u32,
    /// 1サイクルごとに10ずつ加算し、cycles_per_secondに達したら1/10秒
    tenth_cycles: u32,
}

impl TodClock {
    fn new(cycles_per_second: u32) -> Self {
        TodClock {
            time: TodTime::default(),
            alarm: TodTime::default(),
            latched: None,
            stopped: true,
            cycles_per_second: cycles_per_second.max(1),
            tenth_cycles: 0,
        }
    }

    pub fn time(&self) -> TodTime {
        self.time
    }

    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// 1サイクル進め、時刻が変わったらtrue
    fn tick(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.tenth_cycles += 10;
        if self.tenth_cycles < self.cycles_per_second {
            return false;
        }
        self.tenth_cycles -= self.cycles_per_second;
        // 1/10秒の桁が9から戻るときだけ秒が進む
        if self.time.tenths >= 9 {
            self.time.advance_second();
        } else {
            self.time.tenths += 1;
        }
        true
    }

    fn start(&mut self) {
        if self.stopped {
            log::debug!("TOD clock started");
        }
        self.stopped = false;
        self.tenth_cycles = 0;
    }

    fn toggle(&mut self) {
        if self.stopped {
            self.start();
        } else {
            log::debug!("TOD clock stopped");
            self.stopped = true;
        }
    }

    fn visible(&self) -> TodTime {
        self.latched.unwrap_or(self.time)
    }
}

/// CIA1
#[derive(Debug, Clone)]
pub struct Cia {
    pra: u8,
    prb: u8,
    ddra: u8,
    ddrb: u8,
    sdr: u8,
    timer_a: Timer,
    timer_b: Timer,
    tod: TodClock,
    /// ICRの要因ビット（読み出しでクリア）
    icr_status: u8,
    icr_mask: InterruptSource,
    irq: bool,
    /// 押されているキー（列ごとの行ビット）
    key_matrix: [u8; 8],
}

impl Default for Cia {
    fn default() -> Self {
        Self::new(PAL_CYCLES_PER_SECOND)
    }
}

impl Cia {
    pub fn new(cycles_per_second: u32) -> Self {
        Cia {
            pra: 0,
            prb: 0,
            ddra: 0,
            ddrb: 0,
            sdr: 0,
            timer_a: Timer::default(),
            timer_b: Timer::default(),
            tod: TodClock::new(cycles_per_second),
            icr_status: 0,
            icr_mask: InterruptSource::empty(),
            irq: false,
            key_matrix: [0; 8],
        }
    }

    pub fn timer_a(&self) -> &Timer {
        &self.timer_a
    }

    pub fn timer_b(&self) -> &Timer {
        &self.timer_b
    }

    pub fn tod(&self) -> &TodClock {
        &self.tod
    }

    pub fn interrupt_mask(&self) -> InterruptSource {
        self.icr_mask
    }

    /// IRQ線の状態（ICRが読まれるまで保持される）
    pub fn irq_line(&self) -> bool {
        self.irq
    }

    /// キーボードマトリクスのキーを押す/離す
    pub fn set_key(&mut self, column: usize, row: usize, pressed: bool) {
        if column >= 8 || row >= 8 {
            log::warn!("keyboard matrix position {}/{} out of range", column, row);
            return;
        }
        if pressed {
            self.key_matrix[column] |= 1 << row;
        } else {
            self.key_matrix[column] &= !(1 << row);
        }
    }

    pub fn release_all_keys(&mut self) {
        self.key_matrix = [0; 8];
    }

    //--------------------------------------------------
    // クロック
    //--------------------------------------------------

    /// 1マシンサイクル進める
    pub fn cycle(&mut self) {
        if self.tod.tick() && self.tod.time == self.tod.alarm {
            self.raise(InterruptSource::TOD_ALARM);
        }

        let a_underflow = self.timer_a.running() && self.timer_a.count();
        if a_underflow {
            self.raise(InterruptSource::TIMER_A);
        }

        let b_input = match TimerBInput::from_control(self.timer_b.control) {
            TimerBInput::Phi2 => true,
            TimerBInput::TimerA => a_underflow,
            TimerBInput::Cnt | TimerBInput::TimerAWithCnt => false,
        };
        if b_input && self.timer_b.running() && self.timer_b.count() {
            self.raise(InterruptSource::TIMER_B);
        }
    }

    fn raise(&mut self, source: InterruptSource) {
        self.icr_status |= source.bits() | ICR_IRQ;
        if self.icr_mask.intersects(source) {
            if !self.irq {
                log::trace!("CIA IRQ: {:?}", source);
            }
            self.irq = true;
        }
    }

    //--------------------------------------------------
    // レジスタアクセス
    //--------------------------------------------------

    fn port_a(&self) -> u8 {
        (self.pra & self.ddra) | !self.ddra
    }

    /// ポートAで選択した列（Lowアクティブ）の行を読む
    fn port_b(&self) -> u8 {
        let columns = self.port_a();
        let mut rows = 0xFF;
        for (column, &pressed) in self.key_matrix.iter().enumerate() {
            if columns & (1 << column) == 0 {
                rows &= !pressed;
            }
        }
        (self.prb & self.ddrb) | (rows & !self.ddrb)
    }

    /// レジスタを読む（副作用あり）
    pub fn fetch(&mut self, register: u8) -> u8 {
        match register & REGISTER_MASK {
            TOD_TEN => {
                let value = self.tod.visible().tenths;
                self.tod.latched = None;
                value
            }
            TOD_HRS => {
                self.tod.latched = Some(self.tod.time);
                self.tod.time.hours
            }
            ICR => {
                let value = self.icr_status;
                self.icr_status = 0;
                self.irq = false;
                value
            }
            _ => self.peek(register),
        }
    }

    /// レジスタの現在値（副作用なし）
    pub fn peek(&self, register: u8) -> u8 {
        match register & REGISTER_MASK {
            PRA => self.port_a(),
            PRB => self.port_b(),
            DDRA => self.ddra,
            DDRB => self.ddrb,
            TA_LO => self.timer_a.counter as u8,
            TA_HI => (self.timer_a.counter >> 8) as u8,
            TB_LO => self.timer_b.counter as u8,
            TB_HI => (self.timer_b.counter >> 8) as u8,
            TOD_TEN => self.tod.visible().tenths,
            TOD_SEC => self.tod.visible().seconds,
            TOD_MIN => self.tod.visible().minutes,
            TOD_HRS => self.tod.time.hours,
            SDR => self.sdr,
            ICR => self.icr_status,
            CRA => self.timer_a.control.bits(),
            CRB => self.timer_b.control.bits(),
            _ => 0,
        }
    }

    /// レジスタに書く
    pub fn store(&mut self, register: u8, value: u8) {
        let register = register & REGISTER_MASK;
        match register {
            PRA => self.pra = value,
            PRB => self.prb = value,
            DDRA => self.ddra = value,
            DDRB => self.ddrb = value,
            TA_LO => self.timer_a.write_latch_low(value),
            TA_HI => self.timer_a.write_latch_high(value),
            TB_LO => self.timer_b.write_latch_low(value),
            TB_HI => self.timer_b.write_latch_high(value),
            TOD_TEN | TOD_SEC | TOD_MIN | TOD_HRS => self.store_tod(register, value),
            SDR => self.sdr = value,
            ICR => {
                let bits = InterruptSource::from_bits_truncate(value);
                if value & ICR_IRQ != 0 {
                    self.icr_mask |= bits;
                } else {
                    self.icr_mask -= bits;
                }
                // 既に立っている要因が許可されたらIRQを出す
                if self.icr_status & self.icr_mask.bits() != 0 {
                    self.irq = true;
                }
            }
            CRA => {
                if value & 0x20 != 0 {
                    log::warn!("CIA timer A CNT counting not emulated (CRA=${:02X})", value);
                }
                self.timer_a.write_control(value);
            }
            CRB => {
                let input = TimerBInput::from_control(TimerControl::from_bits_retain(value));
                if matches!(input, TimerBInput::Cnt | TimerBInput::TimerAWithCnt) {
                    log::warn!("CIA timer B CNT counting not emulated (CRB=${:02X})", value);
                }
                self.timer_b.write_control(value);
            }
            _ => {}
        }
    }

    fn store_tod(&mut self, register: u8, value: u8) {
        let set_alarm = self.timer_b.control.contains(TimerControl::EXTRA);
        let target = if set_alarm {
            &mut self.tod.alarm
        } else {
            &mut self.tod.time
        };
        match register {
            TOD_TEN => target.tenths = value & 0x0F,
            TOD_SEC => target.seconds = value & 0x7F,
            TOD_MIN => target.minutes = value & 0x7F,
            _ => target.hours = value & 0x9F,
        }
        if set_alarm {
            return;
        }
        match register {
            TOD_HRS => self.tod.toggle(),
            TOD_TEN => self.tod.start(),
            _ => {}
        }
    }
}
