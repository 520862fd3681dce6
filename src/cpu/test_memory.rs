//! テスト用メモリ（64KB フラットメモリ）

use super::{Cpu, MemoryBus};

pub(crate) struct TestMemory {
    pub ram: Vec<u8>,
}

impl TestMemory {
    pub fn new() -> Self {
        TestMemory { ram: vec![0; 65536] }
    }

    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let addr = (address as usize).wrapping_add(i) & 0xFFFF;
            self.ram[addr] = byte;
        }
    }
}

impl MemoryBus for TestMemory {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }
}

/// プログラムを配置し、PCをその先頭に合わせたCPUを返す
pub(crate) fn cpu_with_program(origin: u16, program: &[u8]) -> (Cpu, TestMemory) {
    let mut memory = TestMemory::new();
    memory.load(origin, program);
    let mut cpu = Cpu::new();
    cpu.regs.pc = origin;
    (cpu, memory)
}
