use thiserror::Error;

use crate::layout::Region;
use crate::syscall::SyscallError;

/// Fatal conditions raised while a program executes. Any of these moves the
/// machine to [`MachineState::Faulted`](crate::MachineState::Faulted).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("access of {length} bytes at 0x{address:04X} is out of bounds (memory size 0x{memory_size:04X})")]
    OutOfBounds {
        address: usize,
        length: usize,
        memory_size: usize,
    },
    #[error("stack overflow: sp 0x{sp:04X}, stack limit 0x{limit:04X}")]
    StackOverflow { sp: u32, limit: usize },
    #[error("stack underflow: sp 0x{sp:04X}, stack base 0x{base:04X}")]
    StackUnderflow { sp: u32, base: usize },
    #[error("illegal write of {length} bytes at 0x{address:04X} collides with {region} space")]
    RegionCollision {
        address: usize,
        length: usize,
        region: Region,
    },
    #[error("invalid {0} '{1}'")]
    InvalidName(&'static str, String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid instruction 0x{byte:02X} at 0x{address:04X}")]
    InvalidInstruction { address: u32, byte: u8 },
    #[error(transparent)]
    Syscall(#[from] SyscallError),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;

/// Rejected machine configurations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("memory size {size} is too small, at least {required} bytes are required")]
    MemoryTooSmall { size: usize, required: usize },
    #[error("memory size {0} exceeds the 32-bit address space")]
    MemoryTooLarge(usize),
    #[error("stack capacity of {0} bytes cannot hold a single value")]
    StackTooSmall(usize),
    #[error("program origin 0x{0:04X} lies outside program memory")]
    OriginOutsideProgramMemory(u32),
    #[error("unknown validation mode '{0}', expected 'strict' or 'fast'")]
    UnknownMode(String),
}
