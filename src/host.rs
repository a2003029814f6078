use std::io::{self, BufRead, Write};

use pawsvm_core::{SyscallError, SyscallHandler, SyscallResult};

pub const PRINT_INT: u32 = 1;
pub const PRINT_CHAR: u32 = 2;
pub const READ_INT: u32 = 3;

/// The syscall catalog the command-line host offers to programs.
///
/// | acc | call |
/// |-----|------|
/// | 1 | print `r0` as a signed integer and a newline |
/// | 2 | print `r0` as a character |
/// | 3 | read a signed integer line from input into `acc` |
pub struct HostSyscalls<R, W> {
    input: R,
    output: W,
}

impl HostSyscalls<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> HostSyscalls<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

fn failed(number: u32, reason: impl ToString) -> SyscallError {
    SyscallError::Failed {
        number,
        reason: reason.to_string(),
    }
}

impl<R: BufRead, W: Write> SyscallHandler for HostSyscalls<R, W> {
    fn dispatch(&mut self, number: u32, args: [u32; 4]) -> SyscallResult {
        match number {
            PRINT_INT => {
                writeln!(self.output, "{}", args[0] as i32).map_err(|err| failed(number, err))?;
                Ok(None)
            }
            PRINT_CHAR => {
                let c = char::from_u32(args[0])
                    .ok_or_else(|| failed(number, format!("0x{:X} is not a character", args[0])))?;
                write!(self.output, "{c}")
                    .and_then(|_| self.output.flush())
                    .map_err(|err| failed(number, err))?;
                Ok(None)
            }
            READ_INT => {
                let mut line = String::new();
                self.input
                    .read_line(&mut line)
                    .map_err(|err| failed(number, err))?;
                let value: i64 = line
                    .trim()
                    .parse()
                    .map_err(|_| failed(number, format!("'{}' is not an integer", line.trim())))?;
                Ok(Some(value as u32))
            }
            _ => Err(SyscallError::Unknown(number)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(input: &str) -> HostSyscalls<&[u8], Vec<u8>> {
        HostSyscalls::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn prints() {
        let mut host = host("");
        assert_eq!(host.dispatch(PRINT_INT, [(-7i32) as u32, 0, 0, 0]), Ok(None));
        assert_eq!(host.dispatch(PRINT_CHAR, ['!' as u32, 0, 0, 0]), Ok(None));
        assert_eq!(host.into_output(), b"-7\n!");
    }

    #[test]
    fn reads_integers() {
        let mut host = host("42\n-1\nnope\n");
        assert_eq!(host.dispatch(READ_INT, [0; 4]), Ok(Some(42)));
        assert_eq!(host.dispatch(READ_INT, [0; 4]), Ok(Some(u32::MAX)));
        assert!(matches!(
            host.dispatch(READ_INT, [0; 4]),
            Err(SyscallError::Failed { number: READ_INT, .. })
        ));
    }

    #[test]
    fn rejects_unknown_calls() {
        let mut host = host("");
        assert_eq!(host.dispatch(9, [0; 4]), Err(SyscallError::Unknown(9)));
        assert!(host.dispatch(PRINT_CHAR, [0xD800, 0, 0, 0]).is_err());
    }
}
