//! エミュレータのエラー型

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, C64Error>;

/// エミュレーション中・起動時のエラー
#[derive(Debug, Error)]
pub enum C64Error {
    /// 未定義オペコード（実機ではCPUが停止する）
    #[error("unknown opcode ${opcode:02X} at ${pc:04X}")]
    UnknownOpcode { opcode: u8, pc: u16 },

    #[error("{name} ROM has wrong size: expected {expected} bytes, got {actual}")]
    RomSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// ロードアドレスの2バイトに満たないプログラムイメージ
    #[error("program image too short ({0} bytes)")]
    ProgramTooShort(usize),

    #[error("failed to write screenshot: {0}")]
    Screenshot(#[from] png::EncodingError),

    #[error("failed to serialize config: {0}")]
    Config(#[from] serde_json::Error),
}

impl C64Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        C64Error::Io {
            path: path.into(),
            source,
        }
    }
}
