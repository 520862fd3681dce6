//! C64RS - Commodore 64 Emulator in Rust
//!
//! ヘッドレスでマシンを動かし、必要ならプログラムを注入して
//! 終了時の画面をPNGに保存する。

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use c64rs::config::Config;
use c64rs::{Result, C64};
use clap::Parser;

/// C64RS - Commodore 64 Emulator in Rust
#[derive(Parser, Debug)]
#[command(name = "c64rs")]
#[command(version)]
#[command(about = "C64RS - Commodore 64 Emulator in Rust", long_about = None)]
struct Args {
    /// 設定ファイル
    #[arg(long)]
    config: Option<String>,

    /// ホームディレクトリ（相対パスの基準）
    #[arg(long)]
    home: Option<String>,

    /// ROMディレクトリ（設定ファイルより優先）
    #[arg(long)]
    rom_dir: Option<String>,

    /// 起動後に読み込むプログラム（.prg）
    #[arg(long)]
    prg: Option<PathBuf>,

    /// プログラムを読み込むまでのサイクル数（KERNALの起動待ち、既定はPAL 3秒）
    #[arg(long, default_value = "2955744")]
    prg_delay: u64,

    /// 実行するサイクル数（0=停止するまで）
    #[arg(long, default_value = "0")]
    cycles: u64,

    /// 速度倍率（1=通常、2=2倍速、0=最高速）
    #[arg(long)]
    speed: Option<u32>,

    /// 終了時に画面を保存するPNGファイル（相対パスはスクリーンショットディレクトリ基準）
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// 現在の設定を設定ファイルに保存
    #[arg(long)]
    save_config: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let (mut config, config_path) =
        Config::load_with_options(args.config.as_deref(), args.home.as_deref());
    if let Some(rom_dir) = &args.rom_dir {
        config.rom_dir = rom_dir.clone();
    }
    if let Some(speed) = args.speed {
        config.speed = speed;
    }

    if args.save_config {
        if let Err(e) = config.save_to(&config_path) {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    println!("C64RS - Commodore 64 Emulator v{}", env!("CARGO_PKG_VERSION"));

    match run(&args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: &Config) -> Result<()> {
    let mut c64 = C64::from_config(config)?;
    let start = Instant::now();

    // 実行結果はスクリーンショットを保存してから返す
    let result = run_machine(&mut c64, args, config.speed);

    let elapsed = start.elapsed();
    let cycles = c64.total_cycles();
    let mhz = cycles as f64 / elapsed.as_secs_f64() / 1_000_000.0;
    log::info!(
        "Executed {} cycles in {:?} ({:.2} MHz effective), final PC: ${:04X}",
        cycles,
        elapsed,
        mhz,
        c64.cpu.regs.pc
    );

    if let Some(file) = &args.screenshot {
        c64.save_screenshot(config.screenshot_path(file))?;
    }
    result
}

fn run_machine(c64: &mut C64, args: &Args, speed: u32) -> Result<()> {
    let mut budget = args.cycles;

    if let Some(prg) = &args.prg {
        let delay = if budget > 0 {
            args.prg_delay.min(budget)
        } else {
            args.prg_delay
        };
        // run_realtimeは0を無制限と解釈する
        if delay > 0 {
            c64.run_realtime(delay, speed)?;
        }
        c64.load_prg_file(prg)?;
        if budget > 0 {
            budget = budget.saturating_sub(delay);
            if budget == 0 {
                return Ok(());
            }
        }
    }

    c64.run_realtime(budget, speed)
}
