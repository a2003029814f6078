use std::fmt;

use crate::layout::{REGISTERS_START, REGISTER_COUNT, REGISTER_SIZE};

/// A register of the memory-mapped register file.
///
/// The discriminant is the register's 4-bit code, used in the byte encoding;
/// the register's memory offset is derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Register {
    R0 = 0x00,
    R1 = 0x01,
    R2 = 0x02,
    R3 = 0x03,
    R4 = 0x04,
    R5 = 0x05,
    R6 = 0x06,
    R7 = 0x07,
    R8 = 0x08,
    R9 = 0x09,
    R10 = 0x0A,
    R11 = 0x0B,
    R12 = 0x0C,
    /// Program counter.
    Pc = 0x0D,
    /// Stack pointer.
    Sp = 0x0E,
    /// Accumulator, also the syscall selector and result.
    Acc = 0x0F,
}

impl Register {
    pub const ALL: [Register; REGISTER_COUNT] = [
        Register::R0,
        Register::R1,
        Register::R2,
        Register::R3,
        Register::R4,
        Register::R5,
        Register::R6,
        Register::R7,
        Register::R8,
        Register::R9,
        Register::R10,
        Register::R11,
        Register::R12,
        Register::Pc,
        Register::Sp,
        Register::Acc,
    ];

    /// Registers handed to a syscall handler, in argument order.
    pub const SYSCALL_ARGS: [Register; 4] = [Register::R0, Register::R1, Register::R2, Register::R3];

    pub const CODE_MASK: u8 = 0x0F;

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn offset(self) -> usize {
        REGISTERS_START + self as usize * REGISTER_SIZE
    }

    pub const fn name(self) -> &'static str {
        match self {
            Register::R0 => "r0",
            Register::R1 => "r1",
            Register::R2 => "r2",
            Register::R3 => "r3",
            Register::R4 => "r4",
            Register::R5 => "r5",
            Register::R6 => "r6",
            Register::R7 => "r7",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::R11 => "r11",
            Register::R12 => "r12",
            Register::Pc => "pc",
            Register::Sp => "sp",
            Register::Acc => "acc",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Decodes a register code without validation, keeping only its low nybble.
    pub fn from_code_masked(code: u8) -> Self {
        Self::ALL[(code & Self::CODE_MASK) as usize]
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|register| register.name() == name)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
