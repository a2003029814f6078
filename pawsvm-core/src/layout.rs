//! Address-space layout shared by the memory model, the engine and the
//! assembler.
//!
//! ```text
//! 0x0000 +------------------+
//!        | registers (A)    |  16 x 4 bytes, r0..r12, pc, sp, acc
//! 0x0040 +------------------+
//!        | flags (B)        |  5 x 1 byte, ZF CF OVF SF PF
//! 0x0045 +------------------+
//!        | program / data   |
//!        |        ...       |
//! limit  +------------------+
//!        | stack (grows ^)  |  stack_capacity bytes
//! size   +------------------+
//! ```

use std::fmt;
use std::ops::Range;

use rangemap::RangeMap;

use crate::error::ConfigError;

pub const DEFAULT_MEMORY_SIZE: usize = 32768;

pub const REGISTER_COUNT: usize = 16;
pub const REGISTER_SIZE: usize = 4;
pub const FLAG_COUNT: usize = 5;
pub const FLAG_SIZE: usize = 1;

pub const REGISTERS_START: usize = 0x0000;
pub const REGISTERS_END: usize = REGISTERS_START + REGISTER_COUNT * REGISTER_SIZE;
pub const FLAGS_START: usize = REGISTERS_END;
pub const FLAGS_END: usize = FLAGS_START + FLAG_COUNT * FLAG_SIZE;

pub const DEFAULT_STACK_CAPACITY: usize = 256;
pub const STACK_VALUE_SIZE: usize = 4;

pub const DEFAULT_ORIGIN: u32 = 0x0100;

/// A reserved sub-range of memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Registers,
    Flags,
    Stack,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Region::Registers => "registers",
            Region::Flags => "flags",
            Region::Stack => "stack",
        };
        f.write_str(name)
    }
}

/// Bounds of the stack region for a given memory size and capacity.
///
/// The stack occupies the top `stack_capacity` bytes: from `stack_limit` up to
/// and including `stack_base`, the last byte of memory.
pub fn stack_bounds(memory_size: usize, stack_capacity: usize) -> Range<usize> {
    let base = memory_size.saturating_sub(1);
    let limit = base.saturating_sub(stack_capacity.saturating_sub(1));
    limit..memory_size
}

/// Every reserved region keyed by its address range. Recomputed on demand
/// since the stack bounds depend on the memory size.
pub fn reserved_regions(memory_size: usize, stack_capacity: usize) -> RangeMap<usize, Region> {
    let mut regions = RangeMap::new();
    regions.insert(REGISTERS_START..REGISTERS_END, Region::Registers);
    regions.insert(FLAGS_START..FLAGS_END, Region::Flags);
    let stack = stack_bounds(memory_size, stack_capacity);
    if !stack.is_empty() {
        regions.insert(stack, Region::Stack);
    }
    regions
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    memory_size: usize,
    stack_capacity: usize,
}

impl Layout {
    pub fn new(memory_size: usize, stack_capacity: usize) -> Result<Self, ConfigError> {
        if stack_capacity <= STACK_VALUE_SIZE {
            return Err(ConfigError::StackTooSmall(stack_capacity));
        }
        if memory_size as u64 > u64::from(u32::MAX) {
            return Err(ConfigError::MemoryTooLarge(memory_size));
        }
        let required = FLAGS_END.saturating_add(stack_capacity);
        if memory_size < required {
            return Err(ConfigError::MemoryTooSmall {
                size: memory_size,
                required,
            });
        }
        Ok(Self {
            memory_size,
            stack_capacity,
        })
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    pub fn stack_capacity(&self) -> usize {
        self.stack_capacity
    }

    /// Highest legal stack address, and the initial value of `sp`.
    pub fn stack_base(&self) -> usize {
        self.memory_size - 1
    }

    /// Lowest legal stack address.
    pub fn stack_limit(&self) -> usize {
        self.stack_base() - (self.stack_capacity - 1)
    }

    /// Number of 4-byte values that fit between `stack_base` and `stack_limit`.
    pub fn stack_slots(&self) -> usize {
        (self.stack_base() - self.stack_limit()) / STACK_VALUE_SIZE
    }

    pub fn region_bounds(&self, region: Region) -> Range<usize> {
        match region {
            Region::Registers => REGISTERS_START..REGISTERS_END,
            Region::Flags => FLAGS_START..FLAGS_END,
            Region::Stack => stack_bounds(self.memory_size, self.stack_capacity),
        }
    }

    pub fn region_at(&self, address: usize) -> Option<Region> {
        reserved_regions(self.memory_size, self.stack_capacity)
            .get(&address)
            .copied()
    }

    /// The lowest reserved region overlapping `[address, address + length)`.
    pub fn first_collision(&self, address: usize, length: usize) -> Option<Region> {
        if length == 0 {
            return None;
        }
        let end = address.saturating_add(length);
        reserved_regions(self.memory_size, self.stack_capacity)
            .overlapping(&(address..end))
            .map(|(_, region)| *region)
            .next()
    }

    /// Whether `address` may hold program bytes, i.e. it lies between the
    /// flag bank and the stack.
    pub fn is_program_address(&self, address: usize) -> bool {
        (FLAGS_END..self.stack_limit()).contains(&address)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            stack_capacity: DEFAULT_STACK_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_regions() {
        let layout = Layout::default();
        assert_eq!(layout.region_bounds(Region::Registers), 0x0000..0x0040);
        assert_eq!(layout.region_bounds(Region::Flags), 0x0040..0x0045);
        assert_eq!(layout.region_bounds(Region::Stack), 32512..32768);
        assert_eq!(layout.stack_base(), 32767);
        assert_eq!(layout.stack_limit(), 32512);
        assert_eq!(layout.stack_slots(), 63);
    }

    #[test]
    fn stack_follows_memory_size() {
        let small = Layout::new(1024, 64).unwrap();
        assert_eq!(small.region_bounds(Region::Stack), 960..1024);
        assert_eq!(small.stack_limit(), 960);
        assert_eq!(stack_bounds(1024, 64), 960..1024);
    }

    #[test]
    fn collisions() {
        let layout = Layout::default();
        assert_eq!(layout.first_collision(0x003C, 4), Some(Region::Registers));
        assert_eq!(layout.first_collision(0x003E, 4), Some(Region::Registers));
        assert_eq!(layout.first_collision(0x0042, 4), Some(Region::Flags));
        assert_eq!(layout.first_collision(0x0044, 1), Some(Region::Flags));
        assert_eq!(layout.first_collision(0x0045, 4), None);
        assert_eq!(layout.first_collision(0x0100, 4), None);
        assert_eq!(layout.first_collision(32508, 4), None);
        assert_eq!(layout.first_collision(32509, 4), Some(Region::Stack));
        assert_eq!(layout.first_collision(32764, 4), Some(Region::Stack));
        assert_eq!(layout.first_collision(0x0000, 0), None);
    }

    #[test]
    fn region_lookup() {
        let layout = Layout::default();
        assert_eq!(layout.region_at(0x0000), Some(Region::Registers));
        assert_eq!(layout.region_at(0x0043), Some(Region::Flags));
        assert_eq!(layout.region_at(0x0045), None);
        assert_eq!(layout.region_at(32767), Some(Region::Stack));
        assert!(layout.is_program_address(0x0100));
        assert!(!layout.is_program_address(0x0044));
        assert!(!layout.is_program_address(32512));
    }

    #[test]
    fn rejects_bad_sizes() {
        assert_eq!(Layout::new(1024, 4), Err(ConfigError::StackTooSmall(4)));
        assert_eq!(
            Layout::new(100, 64),
            Err(ConfigError::MemoryTooSmall {
                size: 100,
                required: FLAGS_END + 64
            })
        );
        assert!(Layout::new(FLAGS_END + 64, 64).is_ok());
    }

    #[test]
    fn huge_stack_capacity_is_rejected() {
        assert_eq!(
            Layout::new(DEFAULT_MEMORY_SIZE, usize::MAX),
            Err(ConfigError::MemoryTooSmall {
                size: DEFAULT_MEMORY_SIZE,
                required: usize::MAX
            })
        );
        assert!(Layout::new(DEFAULT_MEMORY_SIZE, usize::MAX - FLAGS_END + 1).is_err());
    }
}
