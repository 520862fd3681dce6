//! フラグ操作命令（CLC, SEC, CLI, SEI, CLV, CLD, SED）

use super::implied;
use crate::cpu::addressing::AddressingMode::Implied;
use crate::cpu::opcodes::{ImpliedOp, OpcodeEntry};

pub(super) fn opcodes() -> Vec<(u8, OpcodeEntry)> {
    vec![
        (0x18, implied("CLC", ImpliedOp::Clc, Implied, 2)),
        (0x38, implied("SEC", ImpliedOp::Sec, Implied, 2)),
        (0x58, implied("CLI", ImpliedOp::Cli, Implied, 2)),
        (0x78, implied("SEI", ImpliedOp::Sei, Implied, 2)),
        (0xB8, implied("CLV", ImpliedOp::Clv, Implied, 2)),
        (0xD8, implied("CLD", ImpliedOp::Cld, Implied, 2)),
        (0xF8, implied("SED", ImpliedOp::Sed, Implied, 2)),
    ]
}
