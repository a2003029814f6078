use crate::config::ValidationMode;
use crate::error::{ExecutionError, Result};
use crate::isa::operand::{REGISTER_OPERAND_LEN, WIDE_OPERAND_LEN};
use crate::isa::{Instruction, OpcodeByte, Operand, OperandRole, Register};
use crate::memory::Memory;

/// An instruction read out of memory, with where it sat and where the next one
/// starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub instruction: Instruction,
    pub address: u32,
    pub next: u32,
}

pub trait DecodeOne {
    fn decode_one(&self, memory: &Memory, address: u32) -> Result<Decoded>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Decoder {
    mode: ValidationMode,
}

impl Decoder {
    pub fn new(mode: ValidationMode) -> Self {
        Self { mode }
    }

    fn register(&self, code: u8) -> Result<Register> {
        if self.mode.is_strict() {
            Register::from_code(code).ok_or_else(|| {
                ExecutionError::InvalidName("register code", format!("0x{code:02X}"))
            })
        } else {
            Ok(Register::from_code_masked(code))
        }
    }
}

impl DecodeOne for Decoder {
    fn decode_one(&self, memory: &Memory, address: u32) -> Result<Decoded> {
        let byte = memory.read_byte(address as usize)?;
        let invalid = ExecutionError::InvalidInstruction { address, byte };
        let opcode_byte = OpcodeByte::from_byte(byte);
        let opcode = opcode_byte.opcode().ok_or_else(|| invalid.clone())?;
        let roles = opcode.roles();
        if opcode_byte.wide_mask() >> roles.len() != 0 {
            return Err(invalid);
        }

        let mut cursor = address as usize + 1;
        let mut operands = Vec::with_capacity(roles.len());
        for (idx, role) in roles.iter().enumerate() {
            if opcode_byte.is_wide(idx) {
                if *role == OperandRole::Destination {
                    return Err(invalid);
                }
                let value = memory.read_word(cursor)?;
                operands.push(Operand::Immediate(i64::from(value)));
                cursor += WIDE_OPERAND_LEN;
            } else {
                let code = memory.read_byte(cursor)?;
                operands.push(Operand::Register(self.register(code)?));
                cursor += REGISTER_OPERAND_LEN;
            }
        }

        Ok(Decoded {
            instruction: Instruction::new(opcode, operands),
            address,
            next: cursor as u32,
        })
    }
}
