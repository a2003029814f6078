use std::fmt;

use crate::isa::opcode::{Opcode, OpcodeByte};
use crate::isa::operand::Operand;

/// One decoded (or about-to-be-encoded) instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self { opcode, operands }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn opcode_byte(&self) -> OpcodeByte {
        OpcodeByte::new(self.opcode, self.operands.iter().map(Operand::is_wide))
    }

    pub fn encoded_len(&self) -> usize {
        1 + self
            .operands
            .iter()
            .map(Operand::encoded_len)
            .sum::<usize>()
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.opcode_byte().value());
        for operand in &self.operands {
            operand.encode_into(out);
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for (idx, operand) in self.operands.iter().enumerate() {
            let separator = if idx == 0 { " " } else { ", " };
            write!(f, "{separator}{operand}")?;
        }
        Ok(())
    }
}
