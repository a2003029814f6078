//! Instruction set definition: opcode catalog, register and flag tables, and
//! the operand/instruction byte encoding shared by the assembler and the
//! decoder.
//!
//! An encoded instruction is one opcode byte followed by one block per
//! operand, in source order:
//!
//! - register: 1 byte, the register's code
//! - immediate or resolved label: 4 bytes, little-endian
//!
//! The opcode byte keeps the catalog opcode in bits 0..=4; bit `5 + i` is set
//! when operand `i` is a 4-byte value, so the decoder knows how many bytes to
//! consume without a per-operand tag.

pub mod flag;
pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod register;

pub use flag::Flag;
pub use instruction::Instruction;
pub use opcode::{Opcode, OpcodeByte, OpcodeDef, OperandRole, INSTRUCTIONS};
pub use operand::Operand;
pub use register::Register;
