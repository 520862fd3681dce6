//! C64RS - Commodore 64 Emulator in Rust
//!
//! A cycle-counting C64 machine engine:
//! - MOS 6510 CPU with the documented instruction set
//! - Bank-switched memory (BASIC / KERNAL / CHARGEN / I/O)
//! - CIA1 timers, time-of-day clock and keyboard matrix
//! - VIC-II PAL raster timing with text and bitmap modes

pub mod c64;
pub mod cia;
pub mod config;
pub mod cpu;
pub mod error;
pub mod memory;
pub mod vic;

pub use c64::C64;
pub use error::{C64Error, Result};
