//! 設定ファイル管理モジュール
//!
//! エミュレータの設定をJSON形式で永続化

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cia::PAL_CYCLES_PER_SECOND;
use crate::error::{C64Error, Result};

/// 設定ファイルのデフォルトファイル名
pub const CONFIG_FILENAME: &str = "c64_config.json";

/// 実行ファイルのディレクトリを取得
pub fn get_exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// 相対パスを指定されたベースディレクトリからの絶対パスに解決
///
/// ベースが空または相対なら実行ファイルのディレクトリを起点にする。
pub fn resolve_path_with_base(base: &str, relative: &str) -> PathBuf {
    let path = Path::new(relative);
    if path.is_absolute() {
        path.to_path_buf()
    } else if base.is_empty() {
        get_exe_dir().join(relative)
    } else {
        let base_path = Path::new(base);
        if base_path.is_absolute() {
            base_path.join(relative)
        } else {
            get_exe_dir().join(base).join(relative)
        }
    }
}

/// 設定ファイルのパスを取得
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join(CONFIG_FILENAME)
}

/// エミュレータ設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// ホームディレクトリ（相対パスの基準）
    /// 空の場合は実行ファイルのディレクトリを使用
    #[serde(default = "default_home_dir")]
    pub c64rs_home: String,
    /// ROMディレクトリ
    #[serde(default = "default_rom_dir")]
    pub rom_dir: String,
    #[serde(default = "default_basic_rom")]
    pub basic_rom: String,
    #[serde(default = "default_kernal_rom")]
    pub kernal_rom: String,
    #[serde(default = "default_chargen_rom")]
    pub chargen_rom: String,
    /// 1秒あたりのマシンサイクル（TODとリアルタイム実行の基準）
    #[serde(default = "default_cycles_per_second")]
    pub cycles_per_second: u32,
    /// 速度設定（1=通常、0=最速）
    #[serde(default = "default_speed")]
    pub speed: u32,
    /// スクリーンショットディレクトリ
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: String,
}

fn default_home_dir() -> String { String::new() }
fn default_rom_dir() -> String { "roms".to_string() }
fn default_basic_rom() -> String { "basic.rom".to_string() }
fn default_kernal_rom() -> String { "kernal.rom".to_string() }
fn default_chargen_rom() -> String { "chargen.rom".to_string() }
fn default_cycles_per_second() -> u32 { PAL_CYCLES_PER_SECOND }
fn default_speed() -> u32 { 1 }
fn default_screenshot_dir() -> String { "screenshots".to_string() }

impl Default for Config {
    fn default() -> Self {
        Config {
            c64rs_home: default_home_dir(),
            rom_dir: default_rom_dir(),
            basic_rom: default_basic_rom(),
            kernal_rom: default_kernal_rom(),
            chargen_rom: default_chargen_rom(),
            cycles_per_second: default_cycles_per_second(),
            speed: default_speed(),
            screenshot_dir: default_screenshot_dir(),
        }
    }
}

impl Config {
    /// オプション指定で設定ファイルを読み込む
    /// 優先順位:
    /// 1. config_path が指定されている場合はそれを使用
    /// 2. home_path が指定されている場合は home_path/c64_config.json を探す
    /// 3. 実行ファイルディレクトリの c64_config.json
    ///
    /// home_path が指定されている場合、読み込んだ設定の c64rs_home を上書き
    pub fn load_with_options(config_path: Option<&str>, home_path: Option<&str>) -> (Self, PathBuf) {
        let config_file_path = if let Some(path) = config_path {
            PathBuf::from(path)
        } else if let Some(home) = home_path {
            let home_config = Path::new(home).join(CONFIG_FILENAME);
            if home_config.exists() {
                home_config
            } else {
                get_config_path()
            }
        } else {
            get_config_path()
        };

        let mut config = Self::load_from(&config_file_path);

        // コマンドラインのhome指定を優先
        if let Some(home) = home_path {
            config.c64rs_home = home.to_string();
        }

        (config, config_file_path)
    }

    /// 指定したパスから設定を読み込む（無い/壊れている場合はデフォルト）
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config {:?}: {}, using defaults", path.as_ref(), e);
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// 指定したパスに設定を保存する
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| C64Error::io(path, e))?;
        log::info!("Config saved: {:?}", path);
        Ok(())
    }

    /// 相対パスをc64rs_homeからの絶対パスに解決
    pub fn resolve_path(&self, relative: &str) -> PathBuf {
        resolve_path_with_base(&self.c64rs_home, relative)
    }

    /// ROMディレクトリの絶対パスを取得
    pub fn rom_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.rom_dir)
    }

    /// ROMファイルのパス（ROMディレクトリ基準）
    pub fn rom_path(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.rom_dir_path().join(name)
        }
    }

    /// スクリーンショットディレクトリの絶対パスを取得
    pub fn screenshot_dir_path(&self) -> PathBuf {
        self.resolve_path(&self.screenshot_dir)
    }

    /// スクリーンショットの保存先（相対パスはスクリーンショットディレクトリ基準）
    pub fn screenshot_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.screenshot_dir_path().join(file)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("c64rs_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(temp_path("does_not_exist.json"));
        assert_eq!(config, Config::default());
        assert_eq!(config.cycles_per_second, 985_248);
        assert_eq!(config.speed, 1);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = temp_path("partial.json");
        fs::write(&path, r#"{ "rom_dir": "/opt/c64/roms", "speed": 0 }"#).unwrap();
        let config = Config::load_from(&path);
        fs::remove_file(&path).ok();
        assert_eq!(config.rom_dir, "/opt/c64/roms");
        assert_eq!(config.speed, 0);
        assert_eq!(config.kernal_rom, "kernal.rom");
        assert_eq!(
            config.rom_path("kernal.rom"),
            PathBuf::from("/opt/c64/roms/kernal.rom")
        );
    }

    #[test]
    fn test_invalid_json_gives_defaults() {
        let path = temp_path("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let config = Config::load_from(&path);
        fs::remove_file(&path).ok();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_path("saved.json");
        let config = Config {
            c64rs_home: "/tmp/c64".to_string(),
            speed: 0,
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path);
        fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_home_option_overrides() {
        let missing = temp_path("none.json");
        let missing = missing.to_str().unwrap();
        let (config, path) = Config::load_with_options(Some(missing), Some("/srv/c64"));
        assert_eq!(config.c64rs_home, "/srv/c64");
        assert_eq!(path, PathBuf::from(missing));
        assert_eq!(config.rom_dir_path(), PathBuf::from("/srv/c64/roms"));
        assert_eq!(config.screenshot_dir_path(), PathBuf::from("/srv/c64/screenshots"));
    }

    #[test]
    fn test_screenshot_path_uses_screenshot_dir() {
        let config = Config {
            c64rs_home: "/srv/c64".to_string(),
            screenshot_dir: "shots".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.screenshot_path(Path::new("boot.png")),
            PathBuf::from("/srv/c64/shots/boot.png")
        );
        assert_eq!(
            config.screenshot_path(Path::new("/tmp/boot.png")),
            PathBuf::from("/tmp/boot.png")
        );
    }

    #[test]
    fn test_absolute_paths_are_kept() {
        assert_eq!(
            resolve_path_with_base("/base", "/abs/file.rom"),
            PathBuf::from("/abs/file.rom")
        );
        assert_eq!(
            resolve_path_with_base("/base", "rel"),
            PathBuf::from("/base/rel")
        );
    }
}
