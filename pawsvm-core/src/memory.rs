use std::fmt;

use bytes::Bytes;

use crate::config::ValidationMode;
use crate::cpu::alu::Flags;
use crate::error::{ExecutionError, Result};
use crate::isa::{Flag, Register};
use crate::layout::{Layout, REGISTER_SIZE};

/// Flat, zero-initialized machine memory with the register file and flag bank
/// mapped at fixed offsets.
#[derive(Clone)]
pub struct Memory {
    bytes: Vec<u8>,
    layout: Layout,
    mode: ValidationMode,
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory")
            .field("size", &self.bytes.len())
            .field("layout", &self.layout)
            .field("mode", &self.mode)
            .finish()
    }
}

impl Memory {
    /// Allocates zeroed memory and points `sp` at the stack base.
    pub fn new(layout: Layout, mode: ValidationMode) -> Self {
        let mut memory = Self {
            bytes: vec![0; layout.memory_size()],
            layout,
            mode,
        };
        memory.set_register(Register::Sp, layout.stack_base() as u32);
        memory
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub(crate) fn check_bounds(&self, address: usize, length: usize) -> Result<()> {
        match address.checked_add(length) {
            Some(end) if end <= self.bytes.len() => Ok(()),
            _ => Err(ExecutionError::OutOfBounds {
                address,
                length,
                memory_size: self.bytes.len(),
            }),
        }
    }

    pub fn read_bytes(&self, address: usize, length: usize) -> Result<Bytes> {
        self.check_bounds(address, length)?;
        Ok(Bytes::copy_from_slice(&self.bytes[address..address + length]))
    }

    /// Raw write with bounds checking only. Stores of program data go through
    /// [`Memory::store_word`] or [`Memory::assert_write_safe`] first.
    pub fn write_bytes(&mut self, address: usize, data: &[u8]) -> Result<()> {
        self.check_bounds(address, data.len())?;
        self.bytes[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    pub fn read_byte(&self, address: usize) -> Result<u8> {
        self.check_bounds(address, 1)?;
        Ok(self.bytes[address])
    }

    pub fn read_word(&self, address: usize) -> Result<u32> {
        self.check_bounds(address, 4)?;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bytes[address..address + 4]);
        Ok(u32::from_le_bytes(word))
    }

    pub fn write_word(&mut self, address: usize, value: u32) -> Result<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// A data store: bounds checked, then refused if it touches a reserved
    /// region.
    pub fn store_word(&mut self, address: usize, value: u32) -> Result<()> {
        self.check_bounds(address, 4)?;
        self.assert_write_safe(address, 4)?;
        self.write_word(address, value)
    }

    /// Fails with [`ExecutionError::RegionCollision`] if `[address, address +
    /// length)` overlaps the registers, the flags or the stack.
    pub fn assert_write_safe(&self, address: usize, length: usize) -> Result<()> {
        match self.layout.first_collision(address, length) {
            Some(region) => Err(ExecutionError::RegionCollision {
                address,
                length,
                region,
            }),
            None => Ok(()),
        }
    }

    pub fn register(&self, register: Register) -> u32 {
        let offset = register.offset();
        let mut word = [0u8; REGISTER_SIZE];
        word.copy_from_slice(&self.bytes[offset..offset + REGISTER_SIZE]);
        u32::from_le_bytes(word)
    }

    pub fn set_register(&mut self, register: Register, value: u32) {
        let offset = register.offset();
        self.bytes[offset..offset + REGISTER_SIZE].copy_from_slice(&value.to_le_bytes());
    }

    pub fn flag(&self, flag: Flag) -> bool {
        self.bytes[flag.offset()] != 0
    }

    pub fn set_flag(&mut self, flag: Flag, value: bool) {
        self.bytes[flag.offset()] = u8::from(value);
    }

    /// Writes every flag an ALU operation produced, leaving the rest alone.
    pub fn apply_flags(&mut self, flags: &Flags) {
        for (flag, value) in flags.iter() {
            self.set_flag(flag, value);
        }
    }

    fn lookup_register(&self, name: &str) -> Result<Register> {
        Register::from_name(name)
            .ok_or_else(|| ExecutionError::InvalidName("register", name.to_string()))
    }

    fn lookup_flag(&self, name: &str) -> Result<Flag> {
        Flag::from_name(name).ok_or_else(|| ExecutionError::InvalidName("flag", name.to_string()))
    }

    pub fn read_register(&self, name: &str) -> Result<u32> {
        Ok(self.register(self.lookup_register(name)?))
    }

    pub fn write_register(&mut self, name: &str, value: u32) -> Result<()> {
        let register = self.lookup_register(name)?;
        self.set_register(register, value);
        Ok(())
    }

    pub fn read_flag(&self, name: &str) -> Result<bool> {
        Ok(self.flag(self.lookup_flag(name)?))
    }

    pub fn write_flag(&mut self, name: &str, value: bool) -> Result<()> {
        let flag = self.lookup_flag(name)?;
        self.set_flag(flag, value);
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: Register::ALL.map(|register| (register, self.register(register))),
            flags: Flag::ALL.map(|flag| (flag, self.flag(flag))),
        }
    }
}

/// Register and flag values at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub registers: [(Register, u32); 16],
    pub flags: [(Flag, bool); 5],
}

impl Snapshot {
    pub fn register(&self, register: Register) -> u32 {
        self.registers[register.code() as usize].1
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.registers.chunks(4) {
            let line = row
                .iter()
                .map(|(register, value)| format!("{:>3} = 0x{:08X}", register.name(), value))
                .collect::<Vec<_>>()
                .join("  ");
            writeln!(f, "{line}")?;
        }
        let flags = self
            .flags
            .iter()
            .map(|(flag, value)| format!("{}={}", flag.name(), u8::from(*value)))
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{flags}")
    }
}
