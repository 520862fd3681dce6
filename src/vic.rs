//! VIC-II (6569, PAL) ラスタ描画
//!
//! サイクル数から現在のラスタラインを求め、ラインが変わったときに
//! 直前のラインを画素バッファへ描画する（1ライン遅れ）。
//! 画面データはすべて `Bus` 経由で読むので、CPUと同じバンク規則に従う。

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::cpu::MemoryBus;
use crate::error::{C64Error, Result};
use crate::memory::Bus;

pub const PAL_RASTERLINES: usize = 312;
pub const PAL_RASTERCOLUMNS: usize = 367;
pub const PAL_CYCLES_PER_RASTERLINE: u64 = 63;
pub const PAL_CYCLES_PER_FRAME: u64 = PAL_RASTERLINES as u64 * PAL_CYCLES_PER_RASTERLINE;

/// 表示ウィンドウ（これ以外はボーダー）
const FIRST_DISPLAY_LINE: usize = 51;
const LAST_DISPLAY_LINE: usize = 250;
const FIRST_DISPLAY_COLUMN: usize = 24;
const LAST_DISPLAY_COLUMN: usize = 343;

// レジスタ
pub const VIC_SCROLY: u16 = 0xD011;
pub const VIC_RASTER: u16 = 0xD012;
pub const VIC_SCROLX: u16 = 0xD016;
pub const VIC_VMCSB: u16 = 0xD018;
pub const VIC_EXTCOL: u16 = 0xD020;
pub const VIC_BGCOL0: u16 = 0xD021;
pub const COLOR_RAM: u16 = 0xD800;
/// CIA2 データポートA（ビット0-1がVICバンク）
pub const CIA2_PRA: u16 = 0xDD00;

/// SCROLY: ビットマップモード
const BITMAP_MODE: u8 = 0x20;
/// SCROLY: ラスタラインのビット8
const RASTER_BIT8: u8 = 0x80;
/// SCROLX: マルチカラー
const MULTICOLOR_MODE: u8 = 0x10;

/// C64のカラーパレット（0xRRGGBB）
pub const PALETTE: [u32; 16] = [
    0x000000, // black
    0xFFFFFF, // white
    0x924A40, // red
    0x84C5CC, // cyan
    0x9351B6, // purple
    0x72B14B, // green
    0x483AAA, // blue
    0xD5DF7C, // yellow
    0x99692D, // orange
    0x675200, // brown
    0xC18178, // light red
    0x606060, // dark grey
    0x8A8A8A, // grey
    0xB3EC91, // light green
    0x867ADE, // light blue
    0xB3B3B3, // light grey
];

fn color(index: u8) -> u32 {
    PALETTE[(index & 0x0F) as usize]
}

/// サイクル数からラスタラインを求める
pub fn raster_line(cycles: u64) -> usize {
    ((cycles % PAL_CYCLES_PER_FRAME) / PAL_CYCLES_PER_RASTERLINE) as usize
}

/// キャラクタデータの取得元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CharSource {
    CharRom(u16),
    VideoBank(u16),
}

/// 1ライン描画に使うレジスタ値
struct LineSetup {
    border: u32,
    background: u32,
    bank_address: u16,
    screen_address: u16,
    row: u16,
    char_y: u16,
}

/// VIC-II
#[derive(Debug, Clone)]
pub struct Vic {
    pixels: Vec<u32>,
    last_raster_line: usize,
    lines_rendered: u64,
    frames: u64,
}

impl Default for Vic {
    fn default() -> Self {
        Self::new()
    }
}

impl Vic {
    pub fn new() -> Self {
        log::info!("init VIC ({}x{} PAL)", PAL_RASTERCOLUMNS, PAL_RASTERLINES);
        Vic {
            pixels: vec![0; PAL_RASTERCOLUMNS * PAL_RASTERLINES],
            last_raster_line: 0,
            lines_rendered: 0,
            frames: 0,
        }
    }

    /// 画素バッファ（0xRRGGBB、行優先）
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn lines_rendered(&self) -> u64 {
        self.lines_rendered
    }

    /// 描画が完了したフレーム数
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// 命令ごとに呼ぶ。フレームの最終ラインを描画したらtrue
    pub fn refresh(&mut self, cycles: u64, bus: &mut Bus) -> bool {
        let line = raster_line(cycles);
        if line == self.last_raster_line {
            return false;
        }

        // 新しいライン番号を$D012（と$D011のビット7）に公開
        bus.write(VIC_RASTER, line as u8);
        let scroly = bus.read(VIC_SCROLY);
        let bit8 = if line > 0xFF { RASTER_BIT8 } else { 0 };
        bus.write(VIC_SCROLY, (scroly & !RASTER_BIT8) | bit8);

        let finished = self.last_raster_line;
        self.render_line(finished, bus);
        self.last_raster_line = line;

        if finished == PAL_RASTERLINES - 1 {
            self.frames += 1;
            true
        } else {
            false
        }
    }

    fn setup(&self, rasterline: usize, bus: &mut Bus) -> LineSetup {
        let y = rasterline.saturating_sub(FIRST_DISPLAY_LINE) as u16;
        LineSetup {
            border: color(bus.read(VIC_EXTCOL)),
            background: color(bus.read(VIC_BGCOL0)),
            bank_address: video_bank_address(bus),
            screen_address: screen_memory_address(bus),
            row: y / 8,
            char_y: y % 8,
        }
    }

    /// 1ライン分を描画する
    pub(crate) fn render_line(&mut self, rasterline: usize, bus: &mut Bus) {
        let setup = self.setup(rasterline, bus);
        let in_window = (FIRST_DISPLAY_LINE..=LAST_DISPLAY_LINE).contains(&rasterline);
        let start = rasterline * PAL_RASTERCOLUMNS;
        let row = &mut self.pixels[start..start + PAL_RASTERCOLUMNS];

        if !in_window {
            row.fill(setup.border);
        } else if bus.read(VIC_SCROLY) & BITMAP_MODE == 0 {
            render_text(row, &setup, bus);
        } else if bus.read(VIC_SCROLX) & MULTICOLOR_MODE == 0 {
            render_hires_bitmap(row, &setup, bus);
        } else {
            render_multicolor_bitmap(row, &setup, bus);
        }
        self.lines_rendered += 1;
    }

    /// 画素バッファをPNGで保存
    pub fn save_screenshot<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| C64Error::io(dir, e))?;
        }
        let file = File::create(path).map_err(|e| C64Error::io(path, e))?;
        let w = BufWriter::new(file);
        let mut encoder = png::Encoder::new(w, PAL_RASTERCOLUMNS as u32, PAL_RASTERLINES as u32);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;

        let mut rgb_data = Vec::with_capacity(self.pixels.len() * 3);
        for pixel in self.pixels.iter() {
            rgb_data.push(((pixel >> 16) & 0xFF) as u8);
            rgb_data.push(((pixel >> 8) & 0xFF) as u8);
            rgb_data.push((pixel & 0xFF) as u8);
        }

        writer.write_image_data(&rgb_data)?;
        log::info!("Screenshot saved: {:?}", path);
        Ok(())
    }
}

//--------------------------------------------------
// バンク/アドレス計算
//--------------------------------------------------

/// $DD00の下位2ビット（3でバンク0）
fn video_bank(bus: &mut Bus) -> u8 {
    bus.read(CIA2_PRA) & 0x03
}

/// VICバンクの先頭アドレス
fn video_bank_address(bus: &mut Bus) -> u16 {
    0xC000 - video_bank(bus) as u16 * 0x4000
}

/// スクリーンメモリ（バンク内オフセット）
fn screen_memory_address(bus: &mut Bus) -> u16 {
    0x0400 * (bus.read(VIC_VMCSB) >> 4) as u16
}

/// ビットマップ（バンク内オフセット）
fn bitmap_address(bus: &mut Bus) -> u16 {
    if bus.read(VIC_VMCSB) & 0x08 != 0 {
        0x2000
    } else {
        0x0000
    }
}

/// キャラクタデータの取得元
///
/// バンク0/2でポインタが2か3ならキャラクタROMが見える。
fn char_source(bus: &mut Bus) -> CharSource {
    let index = (bus.read(VIC_VMCSB) & 0x0E) >> 1;
    let offset = index as u16 * 0x800;
    let bank = video_bank(bus);
    if (index == 2 || index == 3) && (bank == 3 || bank == 1) {
        CharSource::CharRom(offset)
    } else {
        CharSource::VideoBank(video_bank_address(bus).wrapping_add(offset))
    }
}

fn fetch_char(bus: &mut Bus, source: CharSource, offset: u16) -> u8 {
    match source {
        CharSource::CharRom(base) => bus.memory.fetch_char_rom(base.wrapping_add(offset)),
        CharSource::VideoBank(base) => bus.read(base.wrapping_add(offset)),
    }
}

fn in_display_columns(column: usize) -> bool {
    (FIRST_DISPLAY_COLUMN..=LAST_DISPLAY_COLUMN).contains(&column)
}

//--------------------------------------------------
// モード別の描画
//--------------------------------------------------

fn render_text(row: &mut [u32], setup: &LineSetup, bus: &mut Bus) {
    let source = char_source(bus);
    let text_row_addr = setup.row * 40;
    let screen_row = setup
        .bank_address
        .wrapping_add(setup.screen_address)
        .wrapping_add(text_row_addr);
    let color_row = COLOR_RAM + text_row_addr;

    for (column, pixel) in row.iter_mut().enumerate() {
        if !in_display_columns(column) {
            *pixel = setup.border;
            continue;
        }
        let x = (column - FIRST_DISPLAY_COLUMN) as u16;
        let text_col = x / 8;
        let screen_code = bus.read(screen_row.wrapping_add(text_col));
        let foreground = color(bus.read(color_row + text_col));
        let char_data = fetch_char(bus, source, screen_code as u16 * 8 + setup.char_y);
        let mask = 0x80 >> (x & 0x07);
        *pixel = if char_data & mask != 0 {
            foreground
        } else {
            setup.background
        };
    }
}

fn bitmap_rows(setup: &LineSetup, bus: &mut Bus) -> (u16, u16) {
    let text_row_addr = setup.row * 40;
    let colors = setup
        .bank_address
        .wrapping_add(setup.screen_address)
        .wrapping_add(text_row_addr);
    let bitmap = setup
        .bank_address
        .wrapping_add(bitmap_address(bus))
        .wrapping_add(text_row_addr * 8)
        .wrapping_add(setup.char_y);
    (colors, bitmap)
}

/// ハイレゾ: 上位ニブルが前景色、下位ニブルが背景色
fn render_hires_bitmap(row: &mut [u32], setup: &LineSetup, bus: &mut Bus) {
    let (color_row, bitmap_row) = bitmap_rows(setup, bus);
    for (column, pixel) in row.iter_mut().enumerate() {
        if !in_display_columns(column) {
            *pixel = setup.border;
            continue;
        }
        let x = (column - FIRST_DISPLAY_COLUMN) as u16;
        let text_col = x / 8;
        let colors = bus.read(color_row.wrapping_add(text_col));
        let bitmap_byte = bus.read(bitmap_row.wrapping_add(text_col * 8));
        let mask = 0x80 >> (x & 0x07);
        *pixel = if bitmap_byte & mask != 0 {
            color(colors >> 4)
        } else {
            color(colors)
        };
    }
}

/// マルチカラー: 2ビットで 00=背景 01=上位ニブル 10=下位ニブル 11=カラーRAM
fn render_multicolor_bitmap(row: &mut [u32], setup: &LineSetup, bus: &mut Bus) {
    let (color_row, bitmap_row) = bitmap_rows(setup, bus);
    let color_ram_row = COLOR_RAM + setup.row * 40;
    for (column, pixel) in row.iter_mut().enumerate() {
        if !in_display_columns(column) {
            *pixel = setup.border;
            continue;
        }
        let x = (column - FIRST_DISPLAY_COLUMN) as u16;
        let text_col = x / 8;
        let shift = 6 - (x & 0x06);
        let bitmap_byte = bus.read(bitmap_row.wrapping_add(text_col * 8));
        *pixel = match (bitmap_byte >> shift) & 0x03 {
            0b00 => setup.background,
            0b01 => color(bus.read(color_row.wrapping_add(text_col)) >> 4),
            0b10 => color(bus.read(color_row.wrapping_add(text_col))),
            _ => color(bus.read(color_ram_row + text_col)),
        };
    }
}
