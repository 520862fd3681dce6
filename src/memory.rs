//! C64 メモリサブシステム
//!
//! 64KBのRAMと3つのROM（BASIC, KERNAL, CHARGEN）、$D000-$DFFFの
//! I/O領域を、プロセッサポート（$0001の下位3ビット）で切り替える。
//!
//! | port | $A000-$BFFF | $D000-$DFFF | $E000-$FFFF |
//! |------|-------------|-------------|-------------|
//! | 0    | RAM         | RAM         | RAM         |
//! | 1    | RAM         | CHARGEN     | RAM         |
//! | 2    | RAM         | CHARGEN     | KERNAL      |
//! | 3    | BASIC       | CHARGEN     | KERNAL      |
//! | 4    | RAM         | RAM         | RAM         |
//! | 5    | RAM         | I/O         | RAM         |
//! | 6    | RAM         | I/O         | KERNAL      |
//! | 7    | BASIC       | I/O         | KERNAL      |
//!
//! 書き込みは常にRAMへ。ただしI/Oが見えているときの$D000-$DFFFは
//! CIA（$DC00-$DCFF、16バイトごとにミラー）かI/Oシャドウに入る。

use std::fs;
use std::path::Path;

use crate::cia::{Cia, REGISTER_MASK};
use crate::cpu::MemoryBus;
use crate::error::{C64Error, Result};

pub const RAM_SIZE: usize = 0x10000;
pub const BASIC_SIZE: usize = 0x2000;
pub const KERNAL_SIZE: usize = 0x2000;
pub const CHARGEN_SIZE: usize = 0x1000;

const BASIC_START: u16 = 0xA000;
const BASIC_END: u16 = 0xBFFF;
const IO_START: u16 = 0xD000;
const IO_END: u16 = 0xDFFF;
const CIA_START: u16 = 0xDC00;
const CIA_END: u16 = 0xDCFF;
const KERNAL_START: u16 = 0xE000;

/// プロセッサポートのアドレス
pub const PROCESSOR_PORT: u16 = 0x0001;

/// 電源投入時のプロセッサポート（BASIC, I/O, KERNAL が見える）
pub const POWER_ON_PORT: u8 = 0x37;

/// BASICプログラムの標準ロードアドレス
pub const BASIC_PROGRAM_START: u16 = 0x0801;
/// BASICのプログラム終端/変数開始/変数終端ポインタ
const BASIC_POINTERS: [u16; 3] = [0x002D, 0x002F, 0x0031];

/// ROMイメージ一式
#[derive(Debug, Clone)]
pub struct Roms {
    pub basic: Vec<u8>,
    pub kernal: Vec<u8>,
    pub chargen: Vec<u8>,
}

impl Roms {
    /// 3つのROMファイルを読み込む（サイズが違えばエラー）
    pub fn load<P: AsRef<Path>>(basic: P, kernal: P, chargen: P) -> Result<Self> {
        let roms = Roms {
            basic: read_rom(basic.as_ref())?,
            kernal: read_rom(kernal.as_ref())?,
            chargen: read_rom(chargen.as_ref())?,
        };
        roms.validate()?;
        log::info!("Loaded BASIC, KERNAL and CHARGEN ROMs");
        Ok(roms)
    }

    /// 各イメージのサイズを検査する
    pub fn validate(&self) -> Result<()> {
        check_size("BASIC", &self.basic, BASIC_SIZE)?;
        check_size("KERNAL", &self.kernal, KERNAL_SIZE)?;
        check_size("CHARGEN", &self.chargen, CHARGEN_SIZE)
    }
}

fn read_rom(path: &Path) -> Result<Vec<u8>> {
    log::debug!("loading {:?}", path);
    fs::read(path).map_err(|e| C64Error::io(path, e))
}

fn check_size(name: &'static str, data: &[u8], expected: usize) -> Result<()> {
    if data.len() != expected {
        return Err(C64Error::RomSize {
            name,
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// アドレスを解決した先
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Region {
    Ram(usize),
    Basic(usize),
    Kernal(usize),
    Chargen(usize),
    Io(usize),
    /// CIAレジスタ（$DC00からのオフセット）
    Cia(u8),
}

/// RAM/ROM/I/Oシャドウ
#[derive(Debug, Clone)]
pub struct Memory {
    ram: Vec<u8>,
    io: Vec<u8>,
    basic: Vec<u8>,
    kernal: Vec<u8>,
    chargen: Vec<u8>,
}

impl Memory {
    pub fn new(roms: Roms) -> Result<Self> {
        roms.validate()?;
        log::info!("init Memory with size of {} bytes", RAM_SIZE);
        let mut ram = vec![0; RAM_SIZE];
        ram[PROCESSOR_PORT as usize] = POWER_ON_PORT;
        Ok(Memory {
            ram,
            io: vec![0; CHARGEN_SIZE],
            basic: roms.basic,
            kernal: roms.kernal,
            chargen: roms.chargen,
        })
    }

    /// プロセッサポートの下位3ビット
    pub fn processor_port(&self) -> u8 {
        self.ram[PROCESSOR_PORT as usize] & 0x07
    }

    /// CPUとVICが使うバスを組み立てる
    pub fn bus<'a>(&'a mut self, cia: &'a mut Cia) -> Bus<'a> {
        Bus { memory: self, cia }
    }

    fn resolve(&self, address: u16) -> Region {
        let port = self.processor_port();
        match address {
            BASIC_START..=BASIC_END if port == 3 || port == 7 => {
                Region::Basic((address - BASIC_START) as usize)
            }
            IO_START..=IO_END => match port {
                1..=3 => Region::Chargen((address - IO_START) as usize),
                5..=7 => match address {
                    CIA_START..=CIA_END => Region::Cia((address - CIA_START) as u8 & REGISTER_MASK),
                    _ => Region::Io((address - IO_START) as usize),
                },
                _ => Region::Ram(address as usize),
            },
            KERNAL_START..=0xFFFF if matches!(port, 2 | 3 | 6 | 7) => {
                Region::Kernal((address - KERNAL_START) as usize)
            }
            _ => Region::Ram(address as usize),
        }
    }

    fn resolve_store(&self, address: u16) -> Region {
        match address {
            IO_START..=IO_END if self.processor_port() > 4 => match address {
                CIA_START..=CIA_END => Region::Cia((address - CIA_START) as u8 & REGISTER_MASK),
                _ => Region::Io((address - IO_START) as usize),
            },
            _ => Region::Ram(address as usize),
        }
    }

    fn read_region(&self, region: Region) -> u8 {
        match region {
            Region::Ram(i) => self.ram[i],
            Region::Basic(i) => self.basic[i],
            Region::Kernal(i) => self.kernal[i],
            Region::Chargen(i) => self.chargen[i],
            Region::Io(i) => self.io[i],
            // CIAはBus経由でのみ読む
            Region::Cia(_) => 0,
        }
    }

    /// キャラクタROMから直接読む（VIC用）
    pub fn fetch_char_rom(&self, offset: u16) -> u8 {
        self.chargen[offset as usize % CHARGEN_SIZE]
    }

    /// バンク切り替えを無視してRAMを読む
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    /// バンク切り替えを無視してRAMに書く
    pub fn poke_ram(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    /// プログラムイメージ（先頭2バイトがロードアドレス）をRAMに展開する
    ///
    /// $0801へのロードではBASICのプログラム終端と変数領域ポインタも更新する。
    /// 戻り値はロードアドレス。
    pub fn load_prg(&mut self, data: &[u8]) -> Result<u16> {
        if data.len() < 2 {
            return Err(C64Error::ProgramTooShort(data.len()));
        }
        let address = u16::from_le_bytes([data[0], data[1]]);
        let body = &data[2..];
        for (i, &byte) in body.iter().enumerate() {
            let addr = (address as usize + i) & 0xFFFF;
            self.ram[addr] = byte;
        }
        if address as usize + body.len() > RAM_SIZE {
            log::warn!("program at ${:04X} wraps past $FFFF", address);
        }

        if address == BASIC_PROGRAM_START {
            let end = address.wrapping_add(body.len() as u16);
            let [low, high] = end.to_le_bytes();
            for pointer in BASIC_POINTERS {
                self.ram[pointer as usize] = low;
                self.ram[pointer as usize + 1] = high;
            }
        }
        log::info!(
            "Loaded program: ${:04X}-${:04X} ({} bytes)",
            address,
            address.wrapping_add(body.len() as u16),
            body.len()
        );
        Ok(address)
    }

    /// ファイルからプログラムを読み込む
    pub fn load_prg_file<P: AsRef<Path>>(&mut self, path: P) -> Result<u16> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| C64Error::io(path, e))?;
        self.load_prg(&data)
    }
}

/// CPUとVICから見たアドレス空間（メモリ + CIA）
pub struct Bus<'a> {
    pub memory: &'a mut Memory,
    pub cia: &'a mut Cia,
}

impl Bus<'_> {
    /// 副作用なしで読む（診断用。CIAは現在値を返す）
    pub fn peek(&self, address: u16) -> u8 {
        match self.memory.resolve(address) {
            Region::Cia(register) => self.cia.peek(register),
            region => self.memory.read_region(region),
        }
    }

    /// `address` から `count` バイトを16進で並べる
    pub fn dump_line(&self, address: u16, count: u16) -> String {
        (0..count)
            .map(|i| format!("{:02X}", self.peek(address.wrapping_add(i))))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl MemoryBus for Bus<'_> {
    fn read(&mut self, address: u16) -> u8 {
        match self.memory.resolve(address) {
            Region::Cia(register) => self.cia.fetch(register),
            region => self.memory.read_region(region),
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match self.memory.resolve_store(address) {
            Region::Cia(register) => self.cia.store(register, value),
            Region::Io(i) => self.memory.io[i] = value,
            Region::Ram(i) => self.memory.ram[i] = value,
            // ROMには書き込まない
            _ => {}
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// 領域ごとに異なる値で埋めたROM
    pub(crate) fn test_roms() -> Roms {
        Roms {
            basic: vec![0xBA; BASIC_SIZE],
            kernal: vec![0xEE; KERNAL_SIZE],
            chargen: vec![0xC4; CHARGEN_SIZE],
        }
    }

    #[test]
    fn test_rom_size_mismatch_is_rejected() {
        let mut roms = test_roms();
        roms.kernal.truncate(100);
        let err = Memory::new(roms).unwrap_err();
        assert!(matches!(
            err,
            C64Error::RomSize { name: "KERNAL", expected: 8192, actual: 100 }
        ));
    }

    #[test]
    fn test_bank_switching_basic_rom() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);
        // ROMが見えていなくても書き込みはRAMへ
        bus.write(PROCESSOR_PORT, 0x37);
        bus.write(0xA123, 0x42);
        assert_eq!(bus.read(0xA123), 0xBA);
        assert_eq!(bus.read(0xBFFF), 0xBA);
        bus.write(PROCESSOR_PORT, 0x36);
        assert_eq!(bus.read(0xA123), 0x42);
        assert_eq!(bus.read(0xE000), 0xEE);
    }

    #[test]
    fn test_io_window_modes() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);

        bus.write(PROCESSOR_PORT, 0x37);
        bus.write(0xD020, 0x0E);
        assert_eq!(bus.read(0xD020), 0x0E);

        // CHARGENモードでは書き込みはRAM、読み込みはROM
        bus.write(PROCESSOR_PORT, 0x33);
        bus.write(0xD020, 0x05);
        assert_eq!(bus.read(0xD020), 0xC4);
        assert_eq!(bus.memory.ram()[0xD020], 0x05);

        // 全RAM
        bus.write(PROCESSOR_PORT, 0x30);
        assert_eq!(bus.read(0xD020), 0x05);
        assert_eq!(bus.read(0xE000), 0x00);
        assert_eq!(bus.read(0xA000), 0x00);

        // I/Oに戻すとシャドウの値が見える
        bus.write(PROCESSOR_PORT, 0x35);
        assert_eq!(bus.read(0xD020), 0x0E);
        assert_eq!(bus.read(0xE000), 0x00);
    }

    #[test]
    fn test_cia_window_is_routed() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);
        bus.write(PROCESSOR_PORT, 0x37);
        // Timer A ラッチ
        bus.write(0xDC04, 0x25);
        assert_eq!(bus.memory.ram()[0xDC04], 0);
        assert_eq!(bus.memory.io[0x0C04], 0);
        assert_eq!(cia.timer_a().latch(), 0x0025);
    }

    #[test]
    fn test_cia_registers_mirror_across_page() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);
        // $DC14 は $DC04 のミラー
        bus.write(0xDC14, 0x25);
        bus.write(0xDCF5, 0x01);
        assert_eq!(bus.read(0xDC04), 0x25);
        assert_eq!(bus.read(0xDC45), 0x01);
        assert_eq!(bus.memory.io[0x0C14], 0);
        assert_eq!(cia.timer_a().latch(), 0x0125);
    }

    #[test]
    fn test_power_on_port_shows_roms() {
        let mut memory = Memory::new(test_roms()).unwrap();
        assert_eq!(memory.processor_port(), 7);
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);
        assert_eq!(bus.read(0xFFFC), 0xEE);
        assert_eq!(bus.read(0xA000), 0xBA);
    }

    #[test]
    fn test_processor_port_is_always_ram() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let mut cia = Cia::default();
        let mut bus = memory.bus(&mut cia);
        bus.write(PROCESSOR_PORT, 0x30);
        assert_eq!(bus.read(PROCESSOR_PORT), 0x30);
        assert_eq!(bus.memory.processor_port(), 0);
    }

    #[test]
    fn test_load_basic_program_sets_pointers() {
        let mut memory = Memory::new(test_roms()).unwrap();
        let prg = [0x01, 0x08, 0x0B, 0x08, 0x0A, 0x00, 0x99];
        assert_eq!(memory.load_prg(&prg).unwrap(), 0x0801);
        assert_eq!(&memory.ram()[0x0801..0x0806], &prg[2..]);
        for pointer in [0x2D, 0x2F, 0x31] {
            assert_eq!(memory.ram()[pointer], 0x06);
            assert_eq!(memory.ram()[pointer + 1], 0x08);
        }
    }

    #[test]
    fn test_load_machine_code_leaves_pointers() {
        let mut memory = Memory::new(test_roms()).unwrap();
        assert_eq!(memory.load_prg(&[0x00, 0xC0, 0xEA, 0x60]).unwrap(), 0xC000);
        assert_eq!(memory.ram()[0xC001], 0x60);
        assert_eq!(memory.ram()[0x2D], 0);
        assert!(matches!(memory.load_prg(&[0x01]), Err(C64Error::ProgramTooShort(1))));
    }

    #[test]
    fn test_dump_line() {
        let mut memory = Memory::new(test_roms()).unwrap();
        memory.poke_ram(0x1000, 0xA9);
        memory.poke_ram(0x1001, 0x01);
        let mut cia = Cia::default();
        let bus = memory.bus(&mut cia);
        assert_eq!(bus.dump_line(0x1000, 3), "A9 01 00");
    }
}
