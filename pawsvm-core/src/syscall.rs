//! The host boundary behind the `SYSCALL` instruction.
//!
//! `acc` selects the call, `r0..r3` carry its arguments, and a returned value
//! lands back in `acc`. The catalog itself belongs to the host.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SyscallError {
    #[error("unknown syscall {0}")]
    Unknown(u32),
    #[error("syscall {number} failed: {reason}")]
    Failed { number: u32, reason: String },
}

pub type SyscallResult = std::result::Result<Option<u32>, SyscallError>;

pub trait SyscallHandler {
    fn dispatch(&mut self, number: u32, args: [u32; 4]) -> SyscallResult;
}

impl<F> SyscallHandler for F
where
    F: FnMut(u32, [u32; 4]) -> SyscallResult,
{
    fn dispatch(&mut self, number: u32, args: [u32; 4]) -> SyscallResult {
        self(number, args)
    }
}

/// Rejects every call. Installed until the host provides a catalog.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSyscalls;

impl SyscallHandler for NoSyscalls {
    fn dispatch(&mut self, number: u32, _args: [u32; 4]) -> SyscallResult {
        Err(SyscallError::Unknown(number))
    }
}

type BoxedCall = Box<dyn FnMut([u32; 4]) -> SyscallResult>;

/// A catalog of calls keyed by number.
#[derive(Default)]
pub struct SyscallTable {
    calls: HashMap<u32, BoxedCall>,
}

impl fmt::Debug for SyscallTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut numbers: Vec<_> = self.calls.keys().collect();
        numbers.sort();
        f.debug_struct("SyscallTable")
            .field("numbers", &numbers)
            .finish()
    }
}

impl SyscallTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, number: u32, call: F) -> &mut Self
    where
        F: FnMut([u32; 4]) -> SyscallResult + 'static,
    {
        self.calls.insert(number, Box::new(call));
        self
    }

    pub fn with<F>(mut self, number: u32, call: F) -> Self
    where
        F: FnMut([u32; 4]) -> SyscallResult + 'static,
    {
        self.register(number, call);
        self
    }

    pub fn contains(&self, number: u32) -> bool {
        self.calls.contains_key(&number)
    }
}

impl SyscallHandler for SyscallTable {
    fn dispatch(&mut self, number: u32, args: [u32; 4]) -> SyscallResult {
        match self.calls.get_mut(&number) {
            Some(call) => call(args),
            None => Err(SyscallError::Unknown(number)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_dispatches_by_number() {
        let mut table = SyscallTable::new()
            .with(1, |args: [u32; 4]| Ok(Some(args[0] + args[1])))
            .with(2, |_: [u32; 4]| Ok(None));
        assert!(table.contains(1));
        assert_eq!(table.dispatch(1, [2, 3, 0, 0]), Ok(Some(5)));
        assert_eq!(table.dispatch(2, [0; 4]), Ok(None));
        assert_eq!(table.dispatch(9, [0; 4]), Err(SyscallError::Unknown(9)));
    }

    #[test]
    fn closures_are_handlers() {
        let mut calls = 0;
        let mut handler = |number: u32, _args: [u32; 4]| -> SyscallResult {
            calls += 1;
            Ok(Some(number * 2))
        };
        assert_eq!(handler.dispatch(21, [0; 4]), Ok(Some(42)));
        assert_eq!(NoSyscalls.dispatch(3, [0; 4]), Err(SyscallError::Unknown(3)));
        drop(handler);
        assert_eq!(calls, 1);
    }
}
