use std::fmt;

use crate::isa::register::Register;

/// Encoded size of a register operand.
pub const REGISTER_OPERAND_LEN: usize = 1;
/// Encoded size of an immediate or address operand.
pub const WIDE_OPERAND_LEN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    Register(Register),
    /// A literal value. Decoded value operands also land here, since the
    /// encoding does not tell immediates and addresses apart.
    Immediate(i64),
    /// A label resolved to an absolute address.
    Address(u32),
}

impl Operand {
    pub fn is_wide(&self) -> bool {
        !matches!(self, Operand::Register(_))
    }

    pub fn encoded_len(&self) -> usize {
        if self.is_wide() {
            WIDE_OPERAND_LEN
        } else {
            REGISTER_OPERAND_LEN
        }
    }

    /// The 32-bit word a value operand encodes to; `None` for registers.
    pub fn word(&self) -> Option<u32> {
        match self {
            Operand::Register(_) => None,
            Operand::Immediate(value) => Some(*value as u32),
            Operand::Address(address) => Some(*address),
        }
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Operand::Register(register) => out.push(register.code()),
            Operand::Immediate(value) => out.extend_from_slice(&(*value as u32).to_le_bytes()),
            Operand::Address(address) => out.extend_from_slice(&address.to_le_bytes()),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Immediate(value) => write!(f, "#{value}"),
            Operand::Address(address) => write!(f, "0x{address:04X}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings() {
        let mut out = Vec::new();
        Operand::Register(Register::Acc).encode_into(&mut out);
        Operand::Immediate(-1).encode_into(&mut out);
        Operand::Immediate(0x1234).encode_into(&mut out);
        Operand::Address(0x0100).encode_into(&mut out);
        assert_eq!(
            out,
            [0x0F, 0xFF, 0xFF, 0xFF, 0xFF, 0x34, 0x12, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn widths_and_words() {
        assert_eq!(Operand::Register(Register::R1).encoded_len(), 1);
        assert_eq!(Operand::Immediate(5).encoded_len(), 4);
        assert_eq!(Operand::Address(7).encoded_len(), 4);
        assert_eq!(Operand::Register(Register::R1).word(), None);
        assert_eq!(Operand::Immediate(-2).word(), Some(0xFFFF_FFFE));
        assert_eq!(Operand::Address(0x40).word(), Some(0x40));
    }

    #[test]
    fn display() {
        assert_eq!(Operand::Register(Register::R12).to_string(), "r12");
        assert_eq!(Operand::Immediate(10).to_string(), "#10");
        assert_eq!(Operand::Address(0x104).to_string(), "0x0104");
    }
}
