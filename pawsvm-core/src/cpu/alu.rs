//! 32-bit unsigned arithmetic with x86-style status flags.

use crate::error::{ExecutionError, Result};
use crate::isa::Flag;

/// Flag updates produced by one operation. `None` leaves a flag untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags {
    pub zero: Option<bool>,
    pub carry: Option<bool>,
    pub overflow: Option<bool>,
    pub sign: Option<bool>,
    pub parity: Option<bool>,
}

impl Flags {
    /// `ZF`, `SF` and `PF` derived from a result.
    fn of_result(result: u32) -> Self {
        Self {
            zero: Some(result == 0),
            sign: Some(result >> 31 == 1),
            parity: Some((result as u8).count_ones() % 2 == 0),
            ..Default::default()
        }
    }

    fn with_carry_overflow(mut self, carry: bool, overflow: bool) -> Self {
        self.carry = Some(carry);
        self.overflow = Some(overflow);
        self
    }

    pub fn get(&self, flag: Flag) -> Option<bool> {
        match flag {
            Flag::Zero => self.zero,
            Flag::Carry => self.carry,
            Flag::Overflow => self.overflow,
            Flag::Sign => self.sign,
            Flag::Parity => self.parity,
        }
    }

    /// The flags this update writes, with their new values.
    pub fn iter(&self) -> impl Iterator<Item = (Flag, bool)> + '_ {
        Flag::ALL
            .into_iter()
            .filter_map(|flag| self.get(flag).map(|value| (flag, value)))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AluOutput {
    pub result: u32,
    pub flags: Flags,
}

pub fn add(x: u32, y: u32) -> AluOutput {
    let sum = u64::from(x) + u64::from(y);
    let result = sum as u32;
    let overflow = ((x ^ result) & (y ^ result)) >> 31 == 1;
    AluOutput {
        result,
        flags: Flags::of_result(result).with_carry_overflow(sum > u64::from(u32::MAX), overflow),
    }
}

pub fn sub(x: u32, y: u32) -> AluOutput {
    let result = x.wrapping_sub(y);
    let overflow = ((x ^ y) & (x ^ result)) >> 31 == 1;
    AluOutput {
        result,
        flags: Flags::of_result(result).with_carry_overflow(x < y, overflow),
    }
}

pub fn mul(x: u32, y: u32) -> AluOutput {
    let product = u64::from(x) * u64::from(y);
    let result = product as u32;
    let wide = product > u64::from(u32::MAX);
    AluOutput {
        result,
        flags: Flags::of_result(result).with_carry_overflow(wide, wide),
    }
}

pub fn div(x: u32, y: u32) -> Result<AluOutput> {
    let result = x.checked_div(y).ok_or(ExecutionError::DivisionByZero)?;
    Ok(AluOutput {
        result,
        flags: Flags::of_result(result).with_carry_overflow(false, false),
    })
}

pub fn rem(x: u32, y: u32) -> Result<AluOutput> {
    let result = x.checked_rem(y).ok_or(ExecutionError::DivisionByZero)?;
    Ok(AluOutput {
        result,
        flags: Flags::of_result(result).with_carry_overflow(false, false),
    })
}

/// `TEST`: only `ZF` and `SF`.
pub fn test(value: u32) -> Flags {
    Flags {
        zero: Some(value == 0),
        sign: Some(value >> 31 == 1),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_with_carry() {
        let out = add(0xFFFF_FFFF, 1);
        assert_eq!(out.result, 0);
        assert_eq!(out.flags.zero, Some(true));
        assert_eq!(out.flags.carry, Some(true));
        assert_eq!(out.flags.overflow, Some(false));
        assert_eq!(out.flags.sign, Some(false));
        assert_eq!(out.flags.parity, Some(true));
    }

    #[test]
    fn add_signed_overflow() {
        let out = add(0x7FFF_FFFF, 1);
        assert_eq!(out.result, 0x8000_0000);
        assert_eq!(out.flags.overflow, Some(true));
        assert_eq!(out.flags.carry, Some(false));
        assert_eq!(out.flags.sign, Some(true));

        let out = add(5, 10);
        assert_eq!(out.result, 15);
        assert_eq!(out.flags.zero, Some(false));
        // 0b1111 has four set bits
        assert_eq!(out.flags.parity, Some(true));
    }

    #[test]
    fn sub_borrows() {
        let out = sub(1, 2);
        assert_eq!(out.result, 0xFFFF_FFFF);
        assert_eq!(out.flags.carry, Some(true));
        assert_eq!(out.flags.sign, Some(true));
        assert_eq!(out.flags.overflow, Some(false));

        let out = sub(0x8000_0000, 1);
        assert_eq!(out.result, 0x7FFF_FFFF);
        assert_eq!(out.flags.overflow, Some(true));
        assert_eq!(out.flags.carry, Some(false));

        let out = sub(7, 7);
        assert_eq!(out.flags.zero, Some(true));
        assert_eq!(out.flags.carry, Some(false));
    }

    #[test]
    fn mul_reports_truncation() {
        let out = mul(0x1_0000, 0x1_0000);
        assert_eq!(out.result, 0);
        assert_eq!(out.flags.carry, Some(true));
        assert_eq!(out.flags.overflow, Some(true));
        assert_eq!(out.flags.zero, Some(true));

        let out = mul(6, 7);
        assert_eq!(out.result, 42);
        assert_eq!(out.flags.carry, Some(false));
    }

    #[test]
    fn division() {
        assert_eq!(div(17, 5).unwrap().result, 3);
        assert_eq!(rem(17, 5).unwrap().result, 2);
        assert_eq!(div(1, 0), Err(ExecutionError::DivisionByZero));
        assert_eq!(rem(1, 0), Err(ExecutionError::DivisionByZero));
        let out = rem(10, 5).unwrap();
        assert_eq!(out.flags.zero, Some(true));
        assert_eq!(out.flags.carry, Some(false));
    }

    #[test]
    fn test_touches_zero_and_sign_only() {
        let flags = test(0x8000_0000);
        let written: Vec<_> = flags.iter().collect();
        assert_eq!(written, [(Flag::Zero, false), (Flag::Sign, true)]);
    }
}
