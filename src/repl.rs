// Interactive debugger. Reads one line at a time, matches it against an
// ordered grammar of anchored regexes, and runs the corresponding operation
// against the Mcu.

use crate::mcu::Mcu;
use regex::Regex;
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub enum Signal {
    Continue,
    Quit,
}

struct Patterns {
    step: Regex,
    goto: Regex,
    assign: Regex,
    list: Regex,
    list_labels: Regex,
    help: Regex,
    quit: Regex,
}

impl Patterns {
    fn new() -> Self {
        Patterns {
            step: Regex::new(r"^\s*([sn])\s*(?:(\d+)\s*)?$").unwrap(),
            goto: Regex::new(r"^\s*g\s*(?:(0x[0-9a-fA-F]+|\d+)|([-_:*.a-zA-Z0-9]+))\s*$").unwrap(),
            assign: Regex::new(r"^\s*([rdp])\s*(0x[0-9a-fA-F]+|\d+)\s*=\s*(0x[0-9a-fA-F]+|\d+)\s*$").unwrap(),
            list: Regex::new(r"^\s*l\s*(?:(0x[0-9a-fA-F]+|\d+)\s*(?:(0x[0-9a-fA-F]+|\d+)\s*)?)?$").unwrap(),
            list_labels: Regex::new(r"^\s*ll\s*$").unwrap(),
            help: Regex::new(r"^\s*[?h]\s*$").unwrap(),
            quit: Regex::new(r"^\s*q\s*$").unwrap(),
        }
    }
}

const HELP_TEXT: &[&str] = &[
    "<empty line>        -- repeat last command",
    "s [count]           -- step in count instructions",
    "n [count]           -- step over count instructions",
    "g <addr>|<label>    -- goto address/label",
    "r<d>    = byte      -- set register",
    "d<addr> = byte      -- set data memory",
    "p<addr> = word      -- set program memory",
    "l [[<addr>] <count>] -- list source",
    "ll                  -- list labels",
    "q                   -- quit",
    "?, h                -- help",
];

/// Owns the regex grammar, the last-executed command line (for the
/// empty-line repeat), and the Ctrl-C flag a step loop polls. One SIGINT
/// handler is installed per process.
pub struct Debugger {
    patterns: Patterns,
    last_line: Option<String>,
    interrupted: Arc<AtomicBool>,
}

impl Debugger {
    pub fn new() -> Self {
        let interrupted = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&interrupted);
        // set_handler errors if called twice in one process; a second
        // Debugger in the same run (e.g. tests) just keeps the first hook.
        let _ = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst));
        Debugger { patterns: Patterns::new(), last_line: None, interrupted }
    }

    fn parse_num(s: &str) -> u32 {
        if let Some(hex) = s.strip_prefix("0x") {
            u32::from_str_radix(hex, 16).unwrap_or(0)
        } else {
            s.parse().unwrap_or(0)
        }
    }

    /// Runs one REPL input line. Returns `Signal::Quit` once `q` is seen.
    pub fn run_line(&mut self, mcu: &mut Mcu, line: &str) -> Signal {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let effective = if trimmed.is_empty() {
            match self.last_line.clone() {
                Some(prev) => prev,
                None => return Signal::Continue,
            }
        } else {
            trimmed.to_string()
        };
        let signal = self.dispatch(mcu, &effective);
        if !trimmed.is_empty() {
            self.last_line = Some(effective);
        }
        signal
    }

    fn dispatch(&mut self, mcu: &mut Mcu, line: &str) -> Signal {
        if self.patterns.quit.is_match(line) {
            return Signal::Quit;
        }
        if self.patterns.help.is_match(line) {
            println!();
            for h in HELP_TEXT {
                println!("{}", h);
            }
            println!();
        } else if self.patterns.list_labels.is_match(line) {
            self.list_labels(mcu);
        } else if let Some(caps) = self.patterns.goto.captures(line) {
            self.goto(mcu, caps.get(1).map(|m| m.as_str()), caps.get(2).map(|m| m.as_str()));
        } else if let Some(caps) = self.patterns.assign.captures(line) {
            self.assign(mcu, &caps[1], &caps[2], &caps[3]);
        } else if let Some(caps) = self.patterns.list.captures(line) {
            self.list(mcu, caps.get(1).map(|m| m.as_str()), caps.get(2).map(|m| m.as_str()));
        } else if let Some(caps) = self.patterns.step.captures(line) {
            let mode = caps[1].chars().next().unwrap();
            let count: u32 = caps.get(2).map(|m| m.as_str().parse().unwrap_or(1)).unwrap_or(1);
            self.step(mcu, mode, count);
        } else {
            println!("unknown command \"{}\"", line);
        }
        Signal::Continue
    }

    fn step(&mut self, mcu: &mut Mcu, mode: char, count: u32) {
        self.interrupted.store(false, Ordering::SeqCst);
        match mode {
            's' => {
                for _ in 0..count {
                    if self.interrupted.load(Ordering::SeqCst) {
                        break;
                    }
                    mcu.execute();
                }
            }
            'n' => {
                for _ in 0..count {
                    if self.interrupted.load(Ordering::SeqCst) {
                        break;
                    }
                    let pc = mcu.pc;
                    let cmd = mcu.program(pc);
                    let is_call = mcu.dispatch_lookup(cmd).map(|d| d.is_call).unwrap_or(false);
                    if is_call {
                        let target = pc.wrapping_add(mcu.dispatch_lookup(cmd).map(|d| d.size as u32).unwrap_or(1));
                        while mcu.pc != target && !self.interrupted.load(Ordering::SeqCst) {
                            mcu.execute();
                        }
                    } else {
                        mcu.execute();
                    }
                }
            }
            _ => {}
        }
        print_status(mcu);
    }

    fn goto(&self, mcu: &mut Mcu, addr: Option<&str>, label: Option<&str>) {
        if let Some(label) = label {
            match mcu.xrefs().by_label(label) {
                Some(xref) => mcu.pc = xref.addr,
                None => println!("illegal value"),
            }
        } else if let Some(addr) = addr {
            mcu.pc = Self::parse_num(addr);
        }
    }

    fn assign(&self, mcu: &mut Mcu, kind: &str, idx: &str, val: &str) {
        let idx = Self::parse_num(idx);
        let val = Self::parse_num(val);
        match kind.chars().next().unwrap() {
            'r' => {
                if idx > 0x1f || val > 0xff {
                    println!("illegal value");
                    return;
                }
                mcu.set_reg(idx as usize, val as u8);
            }
            'd' => {
                if val > 0xff {
                    println!("illegal value");
                    return;
                }
                mcu.set_data(idx, val as u8);
            }
            'p' => {
                if val > 0xffff {
                    println!("illegal value");
                    return;
                }
                mcu.set_program(idx, val as u16);
            }
            _ => {}
        }
        print_status(mcu);
    }

    fn list(&self, mcu: &mut Mcu, m1: Option<&str>, m2: Option<&str>) {
        let pc0 = mcu.pc;
        let (mut addr, count) = match (m1, m2) {
            (Some(a), Some(c)) => (Self::parse_num(a), Self::parse_num(c)),
            (Some(c), None) => (pc0, Self::parse_num(c)),
            _ => (pc0, 20),
        };
        for _ in 0..count {
            let (line, size) = mcu.disasm_at(addr);
            println!("{}", line);
            addr = addr.wrapping_add(size as u32);
        }
        println!();
    }

    fn list_labels(&self, mcu: &mut Mcu) {
        let mut xrefs: Vec<_> = mcu.xrefs().iter().collect();
        xrefs.sort_by_key(|x| x.addr);
        for xref in xrefs {
            if xref.description.is_empty() {
                println!("[{:05x}] {}", xref.addr, xref.label);
            } else {
                println!("[{:05x}] {} -- {}", xref.addr, xref.label, xref.description);
            }
        }
        println!();
    }
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}

fn print_status(mcu: &mut Mcu) {
    println!(
        "PC={:05x} SP={:04x} SREG={:02x} ticks={}",
        mcu.pc,
        mcu.sp(),
        mcu.sreg().bits(),
        mcu.ticks
    );
}

/// Runs a macro file's REPL command lines in order, non-interactively, for
/// the `-ee <macro>` flag. Stops early on `q`.
pub fn run_macro(mcu: &mut Mcu, debugger: &mut Debugger, path: &str) -> io::Result<Signal> {
    let file = std::fs::File::open(path)?;
    for line in io::BufReader::new(file).lines() {
        let line = line?;
        if matches!(debugger.run_line(mcu, &line), Signal::Quit) {
            return Ok(Signal::Quit);
        }
    }
    Ok(Signal::Continue)
}

/// Drives the interactive loop against stdin/stdout until `q` or EOF.
pub fn interactive(mcu: &mut Mcu, debugger: &mut Debugger) -> io::Result<()> {
    println!("type \"?\" for help");
    let stdin = io::stdin();
    loop {
        let (line, _) = mcu.disasm_at(mcu.pc);
        println!("{}", line);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break; // EOF
        }
        if matches!(debugger.run_line(mcu, &input), Signal::Quit) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips::new_atmega328p;

    #[test]
    fn goto_label_moves_pc() {
        let mut mcu = new_atmega328p();
        mcu.set_flash(0, &[0x940C, 0x0000, 0x0000]); // JMP 0
        let mut dbg = Debugger::new();
        assert!(matches!(dbg.run_line(&mut mcu, "g RESET"), Signal::Continue));
        assert_eq!(mcu.pc, 0);
    }

    #[test]
    fn assign_register_then_read_back() {
        let mut mcu = new_atmega328p();
        let mut dbg = Debugger::new();
        dbg.run_line(&mut mcu, "r16=0x2a");
        assert_eq!(mcu.reg(16), 0x2a);
    }

    #[test]
    fn assign_rejects_out_of_range_register() {
        let mut mcu = new_atmega328p();
        let mut dbg = Debugger::new();
        dbg.run_line(&mut mcu, "r99=1");
        assert_eq!(mcu.reg(0), 0);
    }

    #[test]
    fn step_in_advances_pc_by_one_instruction() {
        let mut mcu = new_atmega328p();
        mcu.set_flash(0, &[0xE005, 0xE010, 0x0F01]);
        let mut dbg = Debugger::new();
        dbg.run_line(&mut mcu, "s");
        assert_eq!(mcu.pc, 1);
    }

    #[test]
    fn repeat_empty_line_reruns_last_step() {
        let mut mcu = new_atmega328p();
        mcu.set_flash(0, &[0xE005, 0xE010, 0x0F01]);
        let mut dbg = Debugger::new();
        dbg.run_line(&mut mcu, "s");
        dbg.run_line(&mut mcu, "");
        assert_eq!(mcu.pc, 2);
    }

    #[test]
    fn quit_returns_quit_signal() {
        let mut mcu = new_atmega328p();
        let mut dbg = Debugger::new();
        assert!(matches!(dbg.run_line(&mut mcu, "q"), Signal::Quit));
    }
}
