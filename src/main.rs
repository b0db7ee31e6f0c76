use avremu::chips::{self, KNOWN_MCU_NAMES};
use avremu::error::ConfigError;
use avremu::mcu::Mcu;
use avremu::repl::{self, Debugger};
use avremu::xref::XrefType;
use avremu::xref_file;
use clap::Parser;
use std::fs;
use std::process::ExitCode;

/// Interpreter, disassembler, and interactive debugger for AVR flash images.
#[derive(Parser)]
#[command(name = "avremu", about = "AVR interpreter, disassembler, and debugger")]
struct Args {
    /// Render disassembly to standard output
    #[arg(short = 'd')]
    disasm: bool,

    /// Enter the REPL after load
    #[arg(short = 'e')]
    execute: bool,

    /// Run macro commands from this file before the REPL (implies -e)
    #[arg(long = "ee", value_name = "MACRO")]
    macro_file: Option<String>,

    /// MCU variant; see --help for the supported list
    #[arg(short = 'm', value_name = "MCU", default_value = "ATany")]
    mcu: String,

    /// Cross-reference file to load
    #[arg(short = 'x', value_name = "XREF")]
    xref: Option<String>,

    /// Binary file of EEPROM contents
    #[arg(short = 'p', value_name = "EEPROM")]
    eeprom: Option<String>,

    /// Flash image to disassemble / execute
    avr_bin: String,
}

fn load_flash(path: &str) -> Result<Vec<u16>, ConfigError> {
    let bytes = fs::read(path).map_err(|source| ConfigError::ReadFailed { path: path.to_string(), source })?;
    Ok(bytes.chunks(2).map(|c| if c.len() == 2 { u16::from_le_bytes([c[0], c[1]]) } else { c[0] as u16 }).collect())
}

fn load_eeprom(path: &str) -> Result<Vec<u8>, ConfigError> {
    fs::read(path).map_err(|source| ConfigError::ReadFailed { path: path.to_string(), source })
}

fn run(args: Args) -> Result<(), ConfigError> {
    let mut mcu = chips::by_name(&args.mcu).ok_or_else(|| ConfigError::UnknownMcu(args.mcu.clone()))?;

    let prog = load_flash(&args.avr_bin)?;

    if let Some(path) = &args.eeprom {
        let bytes = load_eeprom(path)?;
        mcu.set_eeprom(0, &bytes);
    }

    if let Some(path) = &args.xref {
        xref_file::load(&mut mcu, path)?;
    }

    let loaded_words = (prog.len() as u32).min(mcu.flash_words());
    mcu.set_flash(0, &prog);
    mcu.pc = 0;
    println!("prog size:   {} words", prog.len());
    println!("loaded size: {} words", loaded_words);

    let execute = args.execute || args.macro_file.is_some();

    if args.disasm || !execute {
        print_disassembly(&mut mcu, loaded_words);
    }

    if execute {
        let mut debugger = Debugger::new();
        if let Some(path) = &args.macro_file {
            if let Err(e) = repl::run_macro(&mut mcu, &mut debugger, path) {
                eprintln!("reading macro file \"{}\" failed: {}", path, e);
            }
        }
        let _ = repl::interactive(&mut mcu, &mut debugger);
    }

    Ok(())
}

/// Mirrors `main.cpp`'s disassembly loop: a blank-line-plus-banner separator
/// before any address that is both a known call target and preceded by a
/// terminal instruction (a return, or an unconditional jump).
fn print_disassembly(mcu: &mut Mcu, prog_end: u32) {
    let mut prev_terminal = false;
    mcu.pc = 0;
    while mcu.pc < prog_end {
        let addr = mcu.pc;
        let is_call_target = mcu.xrefs().by_addr(addr).map(|x| x.kind.contains(XrefType::CALL)).unwrap_or(false);
        if is_call_target && prev_terminal {
            println!();
            println!("////////////////////////////////////////////////////////////////////////////");
            println!();
        }
        if let Some(xref) = mcu.xrefs().by_addr(addr) {
            if xref.description.is_empty() {
                println!("{}:", xref.label);
            } else {
                println!("{}: ; {}", xref.label, xref.description);
            }
        }
        let cmd = mcu.program(addr);
        let terminal = mcu.dispatch_lookup(cmd).map(|d| d.is_return || (d.is_jump && !d.is_branch)).unwrap_or(false);
        let (line, size) = mcu.disasm_at(addr);
        println!("{}", line);
        prev_terminal = terminal;
        mcu.pc = addr.wrapping_add(size as u32);
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ConfigError::UnknownMcu(name)) => {
            eprintln!("unknown MCU type \"{}\"", name);
            eprintln!("supported MCU types: {}", KNOWN_MCU_NAMES.join(" "));
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
