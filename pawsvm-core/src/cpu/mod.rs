pub mod alu;
pub mod decoder;
pub mod stack;

use std::fmt;

use crate::error::{ExecutionError, Result};
use crate::isa::{Flag, Instruction, Opcode, Operand, Register};
use crate::memory::Memory;
use crate::syscall::{NoSyscalls, SyscallHandler};

use self::decoder::{DecodeOne, Decoded, Decoder};

/// What the machine should do after an instruction completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cycle {
    Continue,
    Halt,
}

pub struct Cpu {
    memory: Memory,
    decoder: Decoder,
    syscalls: Box<dyn SyscallHandler>,
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("memory", &self.memory)
            .field("decoder", &self.decoder)
            .finish_non_exhaustive()
    }
}

impl Cpu {
    pub fn new(memory: Memory) -> Self {
        let decoder = Decoder::new(memory.mode());
        Self {
            memory,
            decoder,
            syscalls: Box::new(NoSyscalls),
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn set_syscall_handler(&mut self, handler: Box<dyn SyscallHandler>) {
        self.syscalls = handler;
    }

    /// Fetches, decodes and executes the instruction at `pc`.
    ///
    /// `pc` is advanced past the instruction before it runs, so control flow
    /// simply overwrites it. On failure `pc` is left on the faulting
    /// instruction.
    pub fn execute_cycle(&mut self) -> Result<Cycle> {
        let pc = self.memory.register(Register::Pc);
        let decoded = self.decoder.decode_one(&self.memory, pc)?;
        tracing::trace!("0x{:04X}: {}", decoded.address, decoded.instruction);

        self.retire(&decoded)
    }

    /// Executes an already-built instruction as if it had been fetched from
    /// `pc`, without reading memory.
    pub fn execute_instruction(&mut self, instruction: Instruction) -> Result<Cycle> {
        let address = self.memory.register(Register::Pc);
        let decoded = Decoded {
            next: address.wrapping_add(instruction.encoded_len() as u32),
            instruction,
            address,
        };
        self.retire(&decoded)
    }

    fn retire(&mut self, decoded: &Decoded) -> Result<Cycle> {
        self.memory.set_register(Register::Pc, decoded.next);
        let cycle = self
            .execute(decoded)
            .and_then(|cycle| stack::check_stack_pointer(&self.memory).map(|_| cycle));
        if cycle.is_err() {
            self.memory.set_register(Register::Pc, decoded.address);
        }
        cycle
    }

    fn value(&self, operand: &Operand) -> u32 {
        match operand {
            Operand::Register(register) => self.memory.register(*register),
            Operand::Immediate(value) => *value as u32,
            Operand::Address(address) => *address,
        }
    }

    fn jump(&mut self, target: u32) {
        self.memory.set_register(Register::Pc, target);
    }

    fn execute(&mut self, decoded: &Decoded) -> Result<Cycle> {
        let instruction = &decoded.instruction;
        let opcode = instruction.opcode();
        match (opcode, instruction.operands()) {
            (Opcode::Push, [src]) => {
                let value = self.value(src);
                stack::push(&mut self.memory, value)?;
            }
            (Opcode::Pop, [Operand::Register(dst)]) => {
                let value = stack::pop(&mut self.memory)?;
                self.memory.set_register(*dst, value);
            }
            (Opcode::Mov, [Operand::Register(dst), src]) => {
                let value = self.value(src);
                self.memory.set_register(*dst, value);
            }
            (Opcode::Load, [Operand::Register(dst), src]) => {
                let address = self.value(src) as usize;
                let value = self.memory.read_word(address)?;
                self.memory.set_register(*dst, value);
            }
            (Opcode::Store, [src, dst]) => {
                let value = self.value(src);
                let address = self.value(dst) as usize;
                self.memory.store_word(address, value)?;
            }
            (
                Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod,
                [Operand::Register(dst), x, y],
            ) => {
                let (x, y) = (self.value(x), self.value(y));
                let output = match opcode {
                    Opcode::Add => alu::add(x, y),
                    Opcode::Sub => alu::sub(x, y),
                    Opcode::Mul => alu::mul(x, y),
                    Opcode::Div => alu::div(x, y)?,
                    _ => alu::rem(x, y)?,
                };
                self.memory.set_register(*dst, output.result);
                self.memory.apply_flags(&output.flags);
            }
            (Opcode::Jump, [target]) => {
                let target = self.value(target);
                self.jump(target);
            }
            (Opcode::JumpIfZero, [target]) => {
                if self.memory.flag(Flag::Zero) {
                    let target = self.value(target);
                    self.jump(target);
                }
            }
            (Opcode::JumpIfCarry, [target]) => {
                if self.memory.flag(Flag::Carry) {
                    let target = self.value(target);
                    self.jump(target);
                }
            }
            (Opcode::Cmp, [x, y]) => {
                let output = alu::sub(self.value(x), self.value(y));
                self.memory.apply_flags(&output.flags);
            }
            (Opcode::Call, [target]) => {
                let target = self.value(target);
                stack::push(&mut self.memory, decoded.next)?;
                self.jump(target);
            }
            (Opcode::Ret, []) => {
                let target = stack::pop(&mut self.memory)?;
                self.jump(target);
            }
            (Opcode::Test, [src]) => {
                let flags = alu::test(self.value(src));
                self.memory.apply_flags(&flags);
            }
            (Opcode::Nop, []) => {}
            (Opcode::Halt, []) => return Ok(Cycle::Halt),
            (Opcode::Syscall, []) => self.syscall()?,
            _ => return Err(invalid(decoded)),
        }
        Ok(Cycle::Continue)
    }

    fn syscall(&mut self) -> Result<()> {
        let number = self.memory.register(Register::Acc);
        let args = Register::SYSCALL_ARGS.map(|register| self.memory.register(register));
        tracing::debug!("syscall {} with args {:?}", number, args);
        if let Some(result) = self.syscalls.dispatch(number, args)? {
            self.memory.set_register(Register::Acc, result);
        }
        Ok(())
    }
}

fn invalid(decoded: &Decoded) -> ExecutionError {
    ExecutionError::InvalidInstruction {
        address: decoded.address,
        byte: decoded.instruction.opcode_byte().value(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationMode;
    use crate::layout::{Layout, Region};
    use crate::syscall::{SyscallError, SyscallResult};

    fn cpu() -> Cpu {
        let mut memory = Memory::new(Layout::default(), ValidationMode::Strict);
        memory.set_register(Register::Pc, 0x0100);
        Cpu::new(memory)
    }

    fn reg(register: Register) -> Operand {
        Operand::Register(register)
    }

    fn imm(value: i64) -> Operand {
        Operand::Immediate(value)
    }

    fn run(cpu: &mut Cpu, opcode: Opcode, operands: Vec<Operand>) -> Result<Cycle> {
        cpu.execute_instruction(Instruction::new(opcode, operands))
    }

    #[test]
    fn add_sets_zero_and_carry() {
        let mut cpu = cpu();
        run(&mut cpu, Opcode::Add, vec![reg(Register::R2), imm(0xFFFF_FFFF), imm(1)]).unwrap();
        let memory = cpu.memory();
        assert_eq!(memory.register(Register::R2), 0);
        assert!(memory.flag(Flag::Zero));
        assert!(memory.flag(Flag::Carry));
        assert_eq!(memory.register(Register::Pc), 0x0100 + 10);
    }

    #[test]
    fn test_leaves_carry_alone() {
        let mut cpu = cpu();
        cpu.memory_mut().set_flag(Flag::Carry, true);
        run(&mut cpu, Opcode::Test, vec![imm(0)]).unwrap();
        assert!(cpu.memory().flag(Flag::Zero));
        assert!(cpu.memory().flag(Flag::Carry));
    }

    #[test]
    fn conditional_jumps() {
        let mut cpu = cpu();
        run(&mut cpu, Opcode::Cmp, vec![imm(3), imm(3)]).unwrap();
        run(&mut cpu, Opcode::JumpIfCarry, vec![imm(0x0400)]).unwrap();
        assert_eq!(cpu.memory().register(Register::Pc), 0x0100 + 9 + 5);
        run(&mut cpu, Opcode::JumpIfZero, vec![imm(0x0400)]).unwrap();
        assert_eq!(cpu.memory().register(Register::Pc), 0x0400);
    }

    #[test]
    fn store_into_registers_is_refused() {
        let mut cpu = cpu();
        cpu.memory_mut().set_register(Register::R0, 0x1234);
        let before = cpu.memory().snapshot();
        let err = run(&mut cpu, Opcode::Store, vec![reg(Register::R0), imm(0x0004)]).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::RegionCollision {
                address: 4,
                length: 4,
                region: Region::Registers
            }
        );
        assert_eq!(cpu.memory().snapshot(), before);
    }

    #[test]
    fn load_out_of_bounds() {
        let mut cpu = cpu();
        let err = run(&mut cpu, Opcode::Load, vec![reg(Register::R0), imm(32767)]).unwrap_err();
        assert!(matches!(err, ExecutionError::OutOfBounds { address: 32767, .. }));
    }

    #[test]
    fn division_by_zero_keeps_pc() {
        let mut cpu = cpu();
        let err = run(&mut cpu, Opcode::Div, vec![reg(Register::R0), imm(1), imm(0)]).unwrap_err();
        assert_eq!(err, ExecutionError::DivisionByZero);
        assert_eq!(cpu.memory().register(Register::Pc), 0x0100);
    }

    #[test]
    fn moving_sp_out_of_the_stack_faults() {
        let mut cpu = cpu();
        let err = run(&mut cpu, Opcode::Mov, vec![reg(Register::Sp), imm(0x0200)]).unwrap_err();
        assert!(matches!(err, ExecutionError::StackOverflow { sp: 0x0200, .. }));
    }

    #[test]
    fn value_destination_is_invalid() {
        let mut cpu = cpu();
        let err = run(&mut cpu, Opcode::Pop, vec![imm(1)]).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidInstruction { address: 0x0100, .. }));
    }

    #[test]
    fn syscalls_reach_the_handler() {
        let mut cpu = cpu();
        cpu.set_syscall_handler(Box::new(|number: u32, args: [u32; 4]| -> SyscallResult {
            if number == 7 {
                Ok(Some(args.iter().sum::<u32>()))
            } else {
                Err(SyscallError::Unknown(number))
            }
        }));
        for (register, value) in [(Register::Acc, 7), (Register::R0, 1), (Register::R3, 2)] {
            cpu.memory_mut().set_register(register, value);
        }
        run(&mut cpu, Opcode::Syscall, vec![]).unwrap();
        assert_eq!(cpu.memory().register(Register::Acc), 3);

        cpu.memory_mut().set_register(Register::Acc, 8);
        assert_eq!(
            run(&mut cpu, Opcode::Syscall, vec![]),
            Err(ExecutionError::Syscall(SyscallError::Unknown(8)))
        );
    }
}
