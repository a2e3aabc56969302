//! `micro86`: load a program file and run it to completion or to a fatal
//! error, per spec.md §6.

use clap::Parser;
use micro86::consts::{DATASET_FILE_NAME, DEFAULT_MEM_SIZE};
use micro86::error::Error;
use micro86::interpreter::{write_post_mortem, Interpreter};
use micro86::memory::Memory;
use micro86::processor::Processor;
use micro86::{dataset::Dataset, loader};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// An emulator for Micro86, a pedagogical 16-bit accumulator machine.
#[derive(Debug, Parser)]
#[command(name = "micro86", version = "1.0")]
struct Cli {
    /// Program file to load and run.
    program_file: PathBuf,

    /// Emit the full disassembly after the run, in addition to the
    /// post-mortem dump.
    #[arg(short = 'd')]
    dump: bool,

    /// Permit the loader to extend memory when it runs out of room.
    #[arg(short = 'r')]
    resize: bool,

    /// Emit an execution trace, one line per instruction, before it runs.
    #[arg(short = 't')]
    trace: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    run(cli)
}

fn run(cli: Cli) -> ExitCode {
    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut stdout = stdout.lock();
    let mut stderr = stderr.lock();

    let mut memory = Memory::allocate(DEFAULT_MEM_SIZE);
    let program_size = match loader::load(&cli.program_file, cli.resize, &mut memory) {
        Ok(size) => size,
        Err(e) => return fatal_before_boot(e, &memory, &mut stderr),
    };

    let dataset = match Dataset::load(DATASET_FILE_NAME) {
        Ok(ds) => ds,
        Err(e) => return fatal_before_boot(e, &memory, &mut stderr),
    };

    let mut interpreter = Interpreter::new(memory, program_size, &dataset, cli.trace, cli.dump);

    let stdin = io::stdin();
    let mut stdin = stdin.lock();
    let program_file = cli.program_file.display().to_string();

    match interpreter.run(&program_file, &mut stdin, &mut stdout, &mut stderr) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

/// Print a diagnostic and a post-mortem dump for an error raised before an
/// [`Interpreter`] was ever constructed (a bad program file or dataset
/// file). The processor snapshot is necessarily fresh — nothing has run
/// yet — but the memory snapshot reflects whatever the loader managed to
/// write before it failed.
fn fatal_before_boot(err: Error, memory: &Memory, stderr: &mut impl Write) -> ExitCode {
    let _ = writeln!(stderr, "{err}");
    write_post_mortem(&Processor::new(), memory, stderr);
    ExitCode::FAILURE
}
