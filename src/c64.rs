//! C64 マシン本体
//!
//! CPU・メモリ・VIC・CIAを所有し、命令単位でそれぞれを進める。
//! 1ステップの順序:
//! 1. CIAのIRQ線が立っていればIRQを要求
//! 2. 1命令を実行
//! 3. ラッチされた割り込みを処理
//! 4. VICを新しいサイクル数でリフレッシュ
//! 5. 消費したサイクル数だけCIAを進める

use std::path::Path;
use std::time::{Duration, Instant};

use crate::cia::Cia;
use crate::config::Config;
use crate::cpu::{Cpu, Registers, DUMP_HEADER};
use crate::error::{C64Error, Result};
use crate::memory::{Bus, Memory, Roms};
use crate::vic::Vic;

/// C64エミュレータ
pub struct C64 {
    pub cpu: Cpu,
    pub memory: Memory,
    pub vic: Vic,
    pub cia: Cia,
    cycles_per_second: u32,
}

impl C64 {
    /// ROMイメージからマシンを組み立て、RESETを処理する
    ///
    /// 構築順はレジスタ → メモリ → VIC → CIA → CPU。
    pub fn new(roms: Roms, cycles_per_second: u32) -> Result<Self> {
        let registers = Registers::new();
        let memory = Memory::new(roms)?;
        let vic = Vic::new();
        let cia = Cia::new(cycles_per_second);
        let cpu = Cpu::with_registers(registers);

        let mut c64 = C64 {
            cpu,
            memory,
            vic,
            cia,
            cycles_per_second,
        };
        c64.reset();
        log::info!("C64 ready, PC=${:04X}", c64.cpu.regs.pc);
        Ok(c64)
    }

    /// 設定ファイルのROMパスとクロックで組み立てる
    pub fn from_config(config: &Config) -> Result<Self> {
        let roms = Roms::load(
            config.rom_path(&config.basic_rom),
            config.rom_path(&config.kernal_rom),
            config.rom_path(&config.chargen_rom),
        )?;
        Self::new(roms, config.cycles_per_second)
    }

    pub fn cycles_per_second(&self) -> u32 {
        self.cycles_per_second
    }

    /// 累積サイクル数
    pub fn total_cycles(&self) -> u64 {
        self.cpu.regs.cycles
    }

    /// CPUとVICから見たバス
    pub fn bus(&mut self) -> Bus<'_> {
        self.memory.bus(&mut self.cia)
    }

    /// RESETを要求し、すぐにリセットベクタへ移る
    pub fn reset(&mut self) {
        let mut bus = self.memory.bus(&mut self.cia);
        self.cpu.reset(&mut bus);
    }

    /// NMIを要求する（次の命令の後で処理）
    pub fn nmi(&mut self) {
        self.cpu.signal_nmi();
    }

    /// 1命令分マシンを進め、消費したサイクル数を返す
    pub fn step(&mut self) -> Result<u32> {
        if self.cia.irq_line() {
            self.cpu.signal_irq();
        }

        let mut bus = self.memory.bus(&mut self.cia);
        let cycles = match self.cpu.step(&mut bus) {
            Ok(cycles) => cycles,
            Err(e) => {
                log_fault(&self.cpu.regs, &bus, &e);
                return Err(e);
            }
        };
        let cycles = cycles + self.cpu.service_interrupt(&mut bus);
        self.vic.refresh(self.cpu.regs.cycles, &mut bus);

        for _ in 0..cycles {
            self.cia.cycle();
        }
        Ok(cycles)
    }

    /// 少なくとも `target_cycles` サイクル経過するまで実行
    pub fn run_cycles(&mut self, target_cycles: u64) -> Result<()> {
        let start = self.cpu.regs.cycles;
        while self.cpu.regs.cycles - start < target_cycles {
            self.step()?;
        }
        Ok(())
    }

    /// VICが1フレームを描き終えるまで実行
    pub fn run_frame(&mut self) -> Result<()> {
        let frame = self.vic.frames();
        while self.vic.frames() == frame {
            self.step()?;
        }
        Ok(())
    }

    /// 実時間に合わせて実行（1ms単位で待つ）
    ///
    /// `budget` が0なら止まるまで、`speed` が0なら待たずに実行する。
    pub fn run_realtime(&mut self, budget: u64, speed: u32) -> Result<()> {
        if speed == 0 {
            return if budget == 0 {
                loop {
                    self.step()?;
                }
            } else {
                self.run_cycles(budget)
            };
        }

        let mut clock = Clock::new(self.cycles_per_second, speed);
        let start = self.cpu.regs.cycles;
        loop {
            let executed = self.cpu.regs.cycles - start;
            if budget > 0 && executed >= budget {
                return Ok(());
            }
            self.step()?;
            clock.throttle(self.cpu.regs.cycles - start);
        }
    }

    /// プログラムイメージをRAMに展開
    pub fn load_prg(&mut self, data: &[u8]) -> Result<u16> {
        self.memory.load_prg(data)
    }

    pub fn load_prg_file<P: AsRef<Path>>(&mut self, path: P) -> Result<u16> {
        self.memory.load_prg_file(path)
    }

    /// 現在の画素バッファをPNGで保存
    pub fn save_screenshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.vic.save_screenshot(path)
    }
}

/// CPU停止時のレジスタとPC付近のメモリを出力
fn log_fault(regs: &Registers, bus: &Bus, error: &C64Error) {
    log::error!("CPU jam: {}", error);
    log::error!("{}", DUMP_HEADER);
    log::error!("{}", regs);
    log::error!("${:04X}: {}", regs.pc, bus.dump_line(regs.pc, 16));
}

/// 実時間との同期（1ms分のサイクルごとに時刻を確認する）
struct Clock {
    start: Instant,
    cycles_per_milli: u64,
    next_check: u64,
}

impl Clock {
    fn new(cycles_per_second: u32, speed: u32) -> Self {
        let cycles_per_milli = (cycles_per_second as u64 * speed as u64 / 1000).max(1);
        Clock {
            start: Instant::now(),
            cycles_per_milli,
            next_check: cycles_per_milli,
        }
    }

    /// 実行済みサイクルが経過時間より先行していれば待つ
    fn throttle(&mut self, executed: u64) {
        if executed < self.next_check {
            return;
        }
        self.next_check = executed + self.cycles_per_milli;

        let target = Duration::from_millis(executed / self.cycles_per_milli);
        let elapsed = self.start.elapsed();
        if target > elapsed {
            std::thread::sleep(target - elapsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::flags;
    use crate::cpu::MemoryBus;
    use crate::memory::tests::test_roms;
    use crate::vic::PAL_CYCLES_PER_FRAME;

    const KERNAL_BASE: usize = 0xE000;

    /// RESET=$1000, NMI=$2100, IRQ=$2000 のROM
    fn machine() -> C64 {
        let mut roms = test_roms();
        let vectors = [(0xFFFA, 0x2100u16), (0xFFFC, 0x1000), (0xFFFE, 0x2000)];
        for (address, target) in vectors {
            let [low, high] = target.to_le_bytes();
            roms.kernal[address - KERNAL_BASE] = low;
            roms.kernal[address - KERNAL_BASE + 1] = high;
        }
        C64::new(roms, crate::cia::PAL_CYCLES_PER_SECOND).unwrap()
    }

    fn load(c64: &mut C64, address: u16, program: &[u8]) {
        for (i, &byte) in program.iter().enumerate() {
            c64.memory.poke_ram(address + i as u16, byte);
        }
    }

    #[test]
    fn test_boot_uses_reset_vector() {
        let c64 = machine();
        assert_eq!(c64.cpu.regs.pc, 0x1000);
        assert_eq!(c64.cpu.regs.sp, 0xFF);
        assert_eq!(c64.total_cycles(), 7);
    }

    #[test]
    fn test_step_returns_cycles() {
        let mut c64 = machine();
        // LDA #$01; STA $0400
        load(&mut c64, 0x1000, &[0xA9, 0x01, 0x8D, 0x00, 0x04]);
        assert_eq!(c64.step().unwrap(), 2);
        assert_eq!(c64.step().unwrap(), 4);
        assert_eq!(c64.memory.ram()[0x0400], 0x01);
        assert_eq!(c64.total_cycles(), 7 + 6);
    }

    #[test]
    fn test_unknown_opcode_stops_run() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0xEA, 0x02]);
        let err = c64.run_cycles(1000).unwrap_err();
        assert!(matches!(err, C64Error::UnknownOpcode { opcode: 0x02, pc: 0x1001 }));
        assert_eq!(c64.cpu.regs.pc, 0x1001);
    }

    #[test]
    fn test_timer_irq_reaches_handler() {
        let mut c64 = machine();
        let program = [
            0xA9, 0x00, // LDA #$00
            0x8D, 0x04, 0xDC, // STA $DC04
            0xA9, 0x01, // LDA #$01
            0x8D, 0x05, 0xDC, // STA $DC05  (ラッチ $0100)
            0xA9, 0x81, // LDA #$81
            0x8D, 0x0D, 0xDC, // STA $DC0D  (Timer A IRQ許可)
            0xA9, 0x01, // LDA #$01
            0x8D, 0x0E, 0xDC, // STA $DC0E  (開始)
            0x58, // CLI
            0x4C, 0x15, 0x10, // JMP $1015
        ];
        load(&mut c64, 0x1000, &program);
        // IRQ: LDA $DC0D; INC $3000; RTI
        load(&mut c64, 0x2000, &[0xAD, 0x0D, 0xDC, 0xEE, 0x00, 0x30, 0x40]);

        c64.run_cycles(2000).unwrap();
        let count = c64.memory.ram()[0x3000];
        assert!((6..=8).contains(&count), "irq count {}", count);
    }

    #[test]
    fn test_masked_irq_is_not_taken() {
        let mut c64 = machine();
        let program = [
            0x78, // SEI
            0xA9, 0x10, 0x8D, 0x04, 0xDC, // LDA #$10; STA $DC04
            0xA9, 0x00, 0x8D, 0x05, 0xDC, // LDA #$00; STA $DC05
            0xA9, 0x81, 0x8D, 0x0D, 0xDC, // LDA #$81; STA $DC0D
            0xA9, 0x01, 0x8D, 0x0E, 0xDC, // LDA #$01; STA $DC0E
            0x4C, 0x15, 0x10, // JMP $1015
        ];
        load(&mut c64, 0x1000, &program);
        c64.run_cycles(500).unwrap();
        assert!(c64.cia.irq_line());
        assert!((0x1015..=0x1017).contains(&c64.cpu.regs.pc));
    }

    #[test]
    fn test_nmi_after_next_instruction() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0xEA, 0xEA]);
        c64.nmi();
        assert_eq!(c64.step().unwrap(), 2 + 7);
        assert_eq!(c64.cpu.regs.pc, 0x2100);
        // 戻り先は2つ目のNOP
        let bus = c64.bus();
        assert_eq!(bus.peek(0x01FF), 0x10);
        assert_eq!(bus.peek(0x01FE), 0x01);
        assert_eq!(bus.peek(0x01FD) & flags::BREAK, 0);
    }

    #[test]
    fn test_reset_restarts_at_vector() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0xA2, 0x05, 0xEA]);
        c64.step().unwrap();
        assert_eq!(c64.cpu.regs.x, 5);
        c64.reset();
        assert_eq!(c64.cpu.regs.pc, 0x1000);
        assert_eq!(c64.cpu.regs.x, 0);
    }

    #[test]
    fn test_run_frame_completes_one_frame() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0x4C, 0x00, 0x10]);
        c64.run_frame().unwrap();
        assert_eq!(c64.vic.frames(), 1);
        assert!(c64.total_cycles() >= PAL_CYCLES_PER_FRAME);
        assert!(c64.total_cycles() < PAL_CYCLES_PER_FRAME + 63);
        c64.run_frame().unwrap();
        assert_eq!(c64.vic.frames(), 2);
    }

    #[test]
    fn test_raster_register_follows_cycles() {
        let mut c64 = machine();
        // LDA $D012; JMP $1000
        load(&mut c64, 0x1000, &[0xAD, 0x12, 0xD0, 0x4C, 0x00, 0x10]);
        c64.run_cycles(63 * 100).unwrap();
        let line = crate::vic::raster_line(c64.total_cycles());
        assert_eq!(c64.bus().read(0xD012), line as u8);
    }

    #[test]
    fn test_load_prg_through_machine() {
        let mut c64 = machine();
        let address = c64.load_prg(&[0x00, 0xC0, 0xA9, 0x42, 0x60]).unwrap();
        assert_eq!(address, 0xC000);
        assert_eq!(c64.memory.ram()[0xC001], 0x42);
    }

    #[test]
    fn test_realtime_unthrottled_budget() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0x4C, 0x00, 0x10]);
        c64.run_realtime(10_000, 0).unwrap();
        assert!(c64.total_cycles() >= 10_000);
    }

    #[test]
    fn test_realtime_is_paced() {
        let mut c64 = machine();
        load(&mut c64, 0x1000, &[0x4C, 0x00, 0x10]);
        let start = Instant::now();
        // 約20ms分
        c64.run_realtime(19_705, 1).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(15));
    }
}
