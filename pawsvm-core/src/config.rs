use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::layout::{Layout, DEFAULT_MEMORY_SIZE, DEFAULT_ORIGIN, DEFAULT_STACK_CAPACITY};

/// How much the machine trusts the names and register codes it is handed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// Validate every register/flag name and every register code in the
    /// instruction stream before touching memory.
    Strict,
    /// Trust callers and bytecode; register codes are masked to 4 bits.
    #[default]
    Fast,
}

impl ValidationMode {
    pub fn is_strict(self) -> bool {
        self == ValidationMode::Strict
    }
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Strict => f.write_str("strict"),
            ValidationMode::Fast => f.write_str("fast"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" | "dev" => Ok(ValidationMode::Strict),
            "fast" | "prod" => Ok(ValidationMode::Fast),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// Total memory size in bytes.
    pub memory_size: usize,
    /// Size of the stack region in bytes.
    pub stack_capacity: usize,
    /// Address programs are loaded at and start executing from.
    pub origin: u32,
    pub mode: ValidationMode,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_capacity: DEFAULT_STACK_CAPACITY,
            origin: DEFAULT_ORIGIN,
            mode: ValidationMode::default(),
        }
    }
}

impl MachineConfig {
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_stack_capacity(mut self, stack_capacity: usize) -> Self {
        self.stack_capacity = stack_capacity;
        self
    }

    pub fn with_origin(mut self, origin: u32) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Validates the configuration and computes the memory layout it describes.
    pub fn layout(&self) -> Result<Layout, ConfigError> {
        let layout = Layout::new(self.memory_size, self.stack_capacity)?;
        if !layout.is_program_address(self.origin as usize) {
            return Err(ConfigError::OriginOutsideProgramMemory(self.origin));
        }
        Ok(layout)
    }
}
