//! The downward-growing stack at the top of memory, addressed through `sp`.
//!
//! Push and pop own the stack region, so they write it directly instead of
//! going through the data-store write-safety check.

use crate::error::{ExecutionError, Result};
use crate::isa::Register;
use crate::layout::STACK_VALUE_SIZE;
use crate::memory::Memory;

/// Fails unless `stack_limit <= sp <= stack_base`.
pub fn check_stack_pointer(memory: &Memory) -> Result<u32> {
    let sp = memory.register(Register::Sp);
    let layout = memory.layout();
    if sp as usize > layout.stack_base() {
        return Err(ExecutionError::StackUnderflow {
            sp,
            base: layout.stack_base(),
        });
    }
    if (sp as usize) < layout.stack_limit() {
        return Err(ExecutionError::StackOverflow {
            sp,
            limit: layout.stack_limit(),
        });
    }
    Ok(sp)
}

pub fn push(memory: &mut Memory, value: u32) -> Result<()> {
    let sp = check_stack_pointer(memory)?;
    let limit = memory.layout().stack_limit();
    if (sp as usize) < limit + STACK_VALUE_SIZE {
        return Err(ExecutionError::StackOverflow { sp, limit });
    }
    let sp = sp - STACK_VALUE_SIZE as u32;
    memory.write_word(sp as usize, value)?;
    memory.set_register(Register::Sp, sp);
    Ok(())
}

pub fn pop(memory: &mut Memory) -> Result<u32> {
    let sp = check_stack_pointer(memory)?;
    let base = memory.layout().stack_base();
    if sp as usize >= base {
        return Err(ExecutionError::StackUnderflow { sp, base });
    }
    let value = memory.read_word(sp as usize)?;
    memory.set_register(Register::Sp, sp + STACK_VALUE_SIZE as u32);
    Ok(value)
}
