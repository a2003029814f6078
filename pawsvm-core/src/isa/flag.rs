use std::fmt;

use crate::layout::{FLAGS_START, FLAG_COUNT, FLAG_SIZE};

/// A status flag of the memory-mapped flag bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Flag {
    /// `ZF`: the last result was zero.
    Zero,
    /// `CF`: unsigned carry out of, or borrow into, bit 31.
    Carry,
    /// `OVF`: signed two's-complement overflow.
    Overflow,
    /// `SF`: bit 31 of the last result.
    Sign,
    /// `PF`: the low byte of the last result has an even number of set bits.
    Parity,
}

impl Flag {
    pub const ALL: [Flag; FLAG_COUNT] = [
        Flag::Zero,
        Flag::Carry,
        Flag::Overflow,
        Flag::Sign,
        Flag::Parity,
    ];

    pub const fn offset(self) -> usize {
        let slot = match self {
            Flag::Zero => 0,
            Flag::Carry => 1,
            Flag::Overflow => 2,
            Flag::Sign => 3,
            Flag::Parity => 4,
        };
        FLAGS_START + slot * FLAG_SIZE
    }

    pub const fn code(self) -> u8 {
        match self {
            Flag::Carry => 0x00,
            Flag::Zero => 0x01,
            Flag::Sign => 0x02,
            Flag::Overflow => 0x03,
            Flag::Parity => 0x04,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Flag::Zero => "ZF",
            Flag::Carry => "CF",
            Flag::Overflow => "OVF",
            Flag::Sign => "SF",
            Flag::Parity => "PF",
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.code() == code)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|flag| flag.name() == name)
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
