use std::fmt;

use crate::config::MachineConfig;
use crate::cpu::{Cpu, Cycle};
use crate::error::{ConfigError, ExecutionError, Result};
use crate::isa::Register;
use crate::memory::Memory;
use crate::syscall::SyscallHandler;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MachineState {
    /// Constructed or freshly loaded; nothing executed yet.
    Ready,
    Running,
    Halted,
    Faulted,
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MachineState::Ready => "ready",
            MachineState::Running => "running",
            MachineState::Halted => "halted",
            MachineState::Faulted => "faulted",
        };
        f.write_str(name)
    }
}

pub struct Machine {
    config: MachineConfig,
    cpu: Cpu,
    state: MachineState,
    fault: Option<ExecutionError>,
    steps: u64,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("config", &self.config)
            .field("state", &self.state)
            .field("fault", &self.fault)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

impl Machine {
    pub fn new(config: MachineConfig) -> std::result::Result<Self, ConfigError> {
        let layout = config.layout()?;
        let memory = Memory::new(layout, config.mode);
        tracing::debug!(
            "created machine: {} bytes, stack 0x{:04X}..=0x{:04X}, {} mode",
            layout.memory_size(),
            layout.stack_limit(),
            layout.stack_base(),
            config.mode
        );
        Ok(Self {
            config,
            cpu: Cpu::new(memory),
            state: MachineState::Ready,
            fault: None,
            steps: 0,
        })
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn fault(&self) -> Option<&ExecutionError> {
        self.fault.as_ref()
    }

    /// Instructions retired so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn memory(&self) -> &Memory {
        self.cpu.memory()
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        self.cpu.memory_mut()
    }

    pub fn set_syscall_handler(&mut self, handler: impl SyscallHandler + 'static) {
        self.cpu.set_syscall_handler(Box::new(handler));
    }

    /// Loads `program` at the configured origin.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        self.load_program_at(self.config.origin, program)
    }

    /// Copies `program` into memory at `origin` and points `pc` at it.
    ///
    /// Loading into a machine that has already executed starts over from
    /// fresh memory: registers, flags and data are zeroed and `sp` is back at
    /// the stack base. Nothing from a halted or faulted run carries over.
    pub fn load_program_at(&mut self, origin: u32, program: &[u8]) -> Result<()> {
        let memory = self.cpu.memory();
        memory.check_bounds(origin as usize, program.len())?;
        memory.assert_write_safe(origin as usize, program.len())?;

        if self.state != MachineState::Ready {
            let layout = *memory.layout();
            tracing::debug!("resetting {} machine before load", self.state);
            *self.cpu.memory_mut() = Memory::new(layout, self.config.mode);
        }

        let memory = self.cpu.memory_mut();
        memory.write_bytes(origin as usize, program)?;
        memory.set_register(Register::Pc, origin);
        tracing::debug!("loaded {} bytes at 0x{:04X}", program.len(), origin);

        self.state = MachineState::Ready;
        self.fault = None;
        self.steps = 0;
        Ok(())
    }

    /// Executes one instruction. A halted machine stays halted; a faulted
    /// one returns its fault again without executing anything.
    pub fn step(&mut self) -> Result<MachineState> {
        match self.state {
            MachineState::Halted => return Ok(MachineState::Halted),
            MachineState::Faulted => {
                if let Some(fault) = &self.fault {
                    return Err(fault.clone());
                }
            }
            MachineState::Ready => {
                tracing::debug!("machine running");
                self.state = MachineState::Running;
            }
            MachineState::Running => {}
        }

        match self.cpu.execute_cycle() {
            Ok(cycle) => {
                self.steps += 1;
                if cycle == Cycle::Halt {
                    tracing::debug!("machine halted after {} steps", self.steps);
                    self.state = MachineState::Halted;
                }
                Ok(self.state)
            }
            Err(err) => {
                let pc = self.memory().register(Register::Pc);
                tracing::warn!("machine faulted at 0x{:04X}: {}", pc, err);
                self.state = MachineState::Faulted;
                self.fault = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Runs until `HALT` or a fault.
    pub fn run(&mut self) -> Result<MachineState> {
        loop {
            if self.step()? == MachineState::Halted {
                return Ok(MachineState::Halted);
            }
        }
    }

    /// Runs at most `max_steps` instructions. Returns `Running` if the budget
    /// ran out first.
    pub fn run_for(&mut self, max_steps: u64) -> Result<MachineState> {
        for _ in 0..max_steps {
            if self.step()? == MachineState::Halted {
                return Ok(MachineState::Halted);
            }
        }
        Ok(self.state)
    }
}
