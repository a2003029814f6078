mod host;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use pawsvm_asm::Assembler;
use pawsvm_core::layout::{DEFAULT_MEMORY_SIZE, DEFAULT_STACK_CAPACITY};
use pawsvm_core::{Machine, MachineConfig, MachineState, ValidationMode};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use crate::host::HostSyscalls;

#[derive(Debug, Parser)]
#[command(author, version, about = "Assembler and virtual machine for the pawsvm instruction set")]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Assemble a source file into an encoded program
    Assemble {
        input: PathBuf,
        /// Output file, defaults to INPUT with a .bin extension
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Load address labels are resolved against
        #[arg(long, value_parser = parse_address, default_value = "0x0100")]
        origin: u32,
    },
    /// Assemble (unless --binary) and execute a program
    Run(RunArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    input: PathBuf,
    /// INPUT is an already-assembled program
    #[arg(long)]
    binary: bool,
    #[arg(long, default_value_t = DEFAULT_MEMORY_SIZE)]
    memory_size: usize,
    #[arg(long, default_value_t = DEFAULT_STACK_CAPACITY)]
    stack_capacity: usize,
    #[arg(long, value_parser = parse_address, default_value = "0x0100")]
    origin: u32,
    /// strict validates register names and codes, fast trusts them
    #[arg(long, env = "PAWSVM_MODE", default_value = "fast")]
    mode: ValidationMode,
    /// Stop after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
}

fn parse_address(text: &str) -> std::result::Result<u32, String> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.map_err(|err| format!("invalid address '{text}': {err}"))
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn assemble_file(input: &Path, origin: u32) -> Result<Vec<u8>> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read '{}'", input.display()))?;
    let bytes = Assembler::new(source.lines())
        .with_origin(origin)
        .assemble()
        .with_context(|| format!("failed to assemble '{}'", input.display()))?;
    Ok(bytes)
}

fn assemble(input: PathBuf, output: Option<PathBuf>, origin: u32) -> Result<()> {
    let bytes = assemble_file(&input, origin)?;
    let output = output.unwrap_or_else(|| input.with_extension("bin"));
    fs::write(&output, &bytes)
        .with_context(|| format!("failed to write '{}'", output.display()))?;
    tracing::info!("wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let program = if args.binary {
        fs::read(&args.input)
            .with_context(|| format!("failed to read '{}'", args.input.display()))?
    } else {
        assemble_file(&args.input, args.origin)?
    };

    let config = MachineConfig::default()
        .with_memory_size(args.memory_size)
        .with_stack_capacity(args.stack_capacity)
        .with_origin(args.origin)
        .with_mode(args.mode);
    let mut machine = Machine::new(config).context("invalid machine configuration")?;
    machine
        .load_program(&program)
        .context("failed to load program")?;
    machine.set_syscall_handler(HostSyscalls::stdio());

    tracing::info!("running {} ({} bytes)", args.input.display(), program.len());
    let outcome = match args.max_steps {
        Some(max_steps) => machine.run_for(max_steps),
        None => machine.run(),
    };

    println!("{}", machine.memory().snapshot());
    println!("state: {} after {} steps", machine.state(), machine.steps());
    if machine.state() == MachineState::Running {
        tracing::warn!("step budget exhausted before HALT");
    }
    outcome.context("program faulted")?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let stderr_format = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(level_filter(cli.verbose));
    tracing_subscriber::registry().with(stderr_format).init();

    match cli.command {
        Command::Assemble {
            input,
            output,
            origin,
        } => assemble(input, output, origin),
        Command::Run(args) => run(args),
    }
}
