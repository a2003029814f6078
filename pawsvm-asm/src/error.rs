use thiserror::Error;

/// Why a source file failed to assemble. Line numbers are 1-based and `text`
/// is the offending source line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("no .text section found")]
    MissingSection,
    #[error("line {line}: unknown opcode '{mnemonic}': {text}")]
    UnknownOpcode {
        mnemonic: String,
        line: usize,
        text: String,
    },
    #[error("line {line}: illegal operand '{operand}' ({reason}): {text}")]
    IllegalOperand {
        operand: String,
        reason: String,
        line: usize,
        text: String,
    },
    #[error("line {line}: illegal register '{register}': {text}")]
    IllegalRegister {
        register: String,
        line: usize,
        text: String,
    },
    #[error("line {line}: label '{label}' already defined on line {first}")]
    DuplicateLabel {
        label: String,
        line: usize,
        first: usize,
    },
}

impl AssemblyError {
    /// The source line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            AssemblyError::MissingSection => None,
            AssemblyError::UnknownOpcode { line, .. }
            | AssemblyError::IllegalOperand { line, .. }
            | AssemblyError::IllegalRegister { line, .. }
            | AssemblyError::DuplicateLabel { line, .. } => Some(*line),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblyError>;
