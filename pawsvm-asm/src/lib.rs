//! Two-pass assembler for the pawsvm instruction set.
//!
//! ```text
//! .text
//!     ; comments run to the end of the line
//! start:
//!     mov r0, #5
//!     add r1, r0, #0xA
//!     jump_if_zero start
//!     halt
//! ```
//!
//! Mnemonics are case-insensitive. Operands are registers (`r0`..`r12`, `pc`,
//! `sp`, `acc`), `#` immediates, or labels defined elsewhere in `.text`.

mod assembler;
mod error;
pub mod syntax;

pub use crate::assembler::{assemble_source, Assembler};
pub use crate::error::{AssemblyError, Result};
