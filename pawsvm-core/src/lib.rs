mod config;
mod cpu;
mod error;
pub mod isa;
pub mod layout;
mod machine;
mod memory;
mod syscall;

pub use crate::config::{MachineConfig, ValidationMode};
pub use crate::cpu::alu::{AluOutput, Flags};
pub use crate::cpu::decoder::{DecodeOne, Decoded, Decoder};
pub use crate::cpu::{Cpu, Cycle};
pub use crate::error::{ConfigError, ExecutionError, Result};
pub use crate::isa::{Flag, Instruction, Opcode, Operand, OperandRole, Register};
pub use crate::layout::{Layout, Region};
pub use crate::machine::{Machine, MachineState};
pub use crate::memory::{Memory, Snapshot};
pub use crate::syscall::{NoSyscalls, SyscallError, SyscallHandler, SyscallResult, SyscallTable};
