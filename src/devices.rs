// I/O register protocol: polymorphic byte-wide cells bound to specific
// offsets in the data space's I/O window.
//
// Registers do not hold a back-reference to their Mcu, which would create a
// borrow cycle. Instead each register stores only its own state and
// receives the bits of Mcu state it needs (current tick count, eeprom
// array) as explicit arguments to get/set.

use log::warn;
use std::cell::Cell;
use std::cell::RefCell;
use std::rc::Rc;

pub trait IoRegister {
    fn name(&self) -> &str;
    fn get(&mut self, ticks: u64) -> u8;
    fn set(&mut self, value: u8, ticks: u64, eeprom: &mut [u8]);
    fn init(&self) -> u8 {
        0x00
    }
}

/// Plain byte cell with no side effects, used for registers the chip
/// catalogue names but that have no behavior the core cares about.
pub struct PlainByte {
    name: String,
    value: u8,
}

impl PlainByte {
    pub fn new(name: impl Into<String>) -> Self {
        PlainByte { name: name.into(), value: 0 }
    }
}

impl IoRegister for PlainByte {
    fn name(&self) -> &str {
        &self.name
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        self.value
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        self.value = value;
    }
}

/// The long-tail placeholder: remembers its name, warns once on first
/// access and stays quiet afterward.
pub struct NotImplemented {
    name: String,
    value: Cell<u8>,
    warned: Cell<bool>,
}

impl NotImplemented {
    pub fn new(name: impl Into<String>) -> Self {
        NotImplemented { name: name.into(), value: Cell::new(0), warned: Cell::new(false) }
    }

    fn warn_once(&self) {
        if !self.warned.get() {
            warn!("not implemented IO register {}", self.name);
            self.warned.set(true);
        }
    }
}

impl IoRegister for NotImplemented {
    fn name(&self) -> &str {
        &self.name
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        self.warn_once();
        self.value.get()
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        self.warn_once();
        self.value.set(value);
    }
}

/// One half of the stack pointer, aliased into the I/O window. Holds a
/// shared cell so SPL/SPH observe and mutate the same 16-bit value.
#[derive(Clone)]
pub struct SpCell(pub Rc<Cell<u16>>);

pub struct SpLow(pub SpCell);
pub struct SpHigh(pub SpCell);

impl IoRegister for SpLow {
    fn name(&self) -> &str {
        "SPL"
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        self.0 .0.get() as u8
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        let hi = self.0 .0.get() & 0xff00;
        self.0 .0.set(hi | value as u16);
    }
}

impl IoRegister for SpHigh {
    fn name(&self) -> &str {
        "SPH"
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        (self.0 .0.get() >> 8) as u8
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        let lo = self.0 .0.get() & 0x00ff;
        self.0 .0.set(lo | ((value as u16) << 8));
    }
}

/// SREG alias: reads/writes the underlying flags byte directly.
#[derive(Clone)]
pub struct SregCell(pub Rc<Cell<u8>>);

pub struct SregIo(pub SregCell);

impl IoRegister for SregIo {
    fn name(&self) -> &str {
        "SREG"
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        self.0 .0.get()
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        self.0 .0.set(value);
    }
}

/// EEPROM controller state machine: EEARH/EEARL/EEDR/EECR.
///
/// Bits of EECR:
///   EEPM  = 0b0011_0000  program-mode select (00 erase+write, 01 erase only, 10 write only)
///   EERIE = 0b0000_1000  interrupt enable (not supported; diagnostic only)
///   EEMPE = 0b0000_0100  master write enable, arms the controller for 4 ticks
///   EEPE  = 0b0000_0010  start write (requires EEMPE armed within the last 4 ticks)
///   EERE  = 0b0000_0001  start read
pub struct EepromController {
    size: usize,
    addr: u16,
    data: u8,
    control: u8,
    active_until: Option<u64>,
    write_busy_until: Option<u64>,
    read_busy_until: Option<u64>,
}

const EEPM: u8 = 0b0011_0000;
const EERIE: u8 = 0b0000_1000;
const EEMPE: u8 = 0b0000_0100;
const EEPE: u8 = 0b0000_0010;
const EERE: u8 = 0b0000_0001;

impl EepromController {
    pub fn new(size: usize) -> Self {
        EepromController {
            size,
            addr: 0,
            data: 0,
            control: 0,
            active_until: None,
            write_busy_until: None,
            read_busy_until: None,
        }
    }

    fn busy(&self, ticks: u64) -> bool {
        self.write_busy_until.map_or(false, |t| t > ticks) || self.read_busy_until.map_or(false, |t| t > ticks)
    }

    pub fn get_addr_lo(&self) -> u8 {
        self.addr as u8
    }
    pub fn get_addr_hi(&self) -> u8 {
        (self.addr >> 8) as u8
    }
    pub fn set_addr_lo(&mut self, v: u8) {
        self.addr = (self.addr & 0xff00) | v as u16;
        self.clamp_addr();
    }
    pub fn set_addr_hi(&mut self, v: u8) {
        self.addr = (self.addr & 0x00ff) | ((v as u16) << 8);
        self.clamp_addr();
    }
    fn clamp_addr(&mut self) {
        if self.size > 0 && self.addr as usize >= self.size {
            self.addr %= self.size as u16;
        }
    }

    pub fn get_data(&self) -> u8 {
        self.data
    }
    pub fn set_data(&mut self, v: u8, ticks: u64) {
        if !self.busy(ticks) {
            self.data = v;
        }
    }

    pub fn get_control(&mut self, ticks: u64) -> u8 {
        if self.write_busy_until.map_or(false, |t| t <= ticks) {
            self.write_busy_until = None;
            self.control &= !(EERE | EEPE | EEMPE);
        }
        if self.read_busy_until.map_or(false, |t| t <= ticks) {
            self.read_busy_until = None;
            self.control &= !EERE;
        }
        self.control
    }

    /// Runs the write/erase/read state machine. `busy_ticks` is
    /// (erase+write, erase-only, write-only), the chip-dependent durations
    /// expressed in ticks by the caller.
    pub fn set_control(&mut self, v: u8, ticks: u64, eeprom: &mut [u8], busy_ticks: (u64, u64, u64)) {
        let v = v & 0x3f;
        if v & EERIE != 0 {
            warn!("EEPROM interrupt-on-ready is not supported");
        }
        if !self.busy(ticks) {
            let start_bits = v & (EEMPE | EEPE | EERE);
            if start_bits == EEMPE {
                self.active_until = Some(ticks + 4);
            } else if start_bits & EEPE != 0 {
                if self.active_until.map_or(false, |t| t >= ticks) {
                    let addr = self.addr as usize % self.size.max(1);
                    match v & EEPM {
                        0x00 => {
                            eeprom[addr] = self.data;
                            self.write_busy_until = Some(ticks + busy_ticks.0);
                        }
                        0x10 => {
                            eeprom[addr] = 0xff;
                            self.write_busy_until = Some(ticks + busy_ticks.1);
                        }
                        0x20 => {
                            eeprom[addr] &= self.data;
                            self.write_busy_until = Some(ticks + busy_ticks.2);
                        }
                        _ => {}
                    }
                    self.active_until = None;
                }
            } else if start_bits == EERE {
                let addr = self.addr as usize % self.size.max(1);
                self.data = eeprom[addr];
                self.read_busy_until = Some(ticks);
            } else if start_bits != 0 {
                warn!("illegal EECR bit combination 0x{:02x}", v);
            }
        }
        self.control = v;
    }
}

pub struct EepromSlot {
    pub controller: Rc<RefCell<EepromController>>,
    pub slot: EepromSlotKind,
    pub busy_ticks: (u64, u64, u64),
}

#[derive(Clone, Copy)]
pub enum EepromSlotKind {
    Earh,
    Earl,
    Edr,
    Ecr,
}

impl IoRegister for EepromSlot {
    fn name(&self) -> &str {
        match self.slot {
            EepromSlotKind::Earh => "EEARH",
            EepromSlotKind::Earl => "EEARL",
            EepromSlotKind::Edr => "EEDR",
            EepromSlotKind::Ecr => "EECR",
        }
    }
    fn get(&mut self, ticks: u64) -> u8 {
        let mut c = self.controller.borrow_mut();
        match self.slot {
            EepromSlotKind::Earh => c.get_addr_hi(),
            EepromSlotKind::Earl => c.get_addr_lo(),
            EepromSlotKind::Edr => c.get_data(),
            EepromSlotKind::Ecr => c.get_control(ticks),
        }
    }
    fn set(&mut self, value: u8, ticks: u64, eeprom: &mut [u8]) {
        let mut c = self.controller.borrow_mut();
        match self.slot {
            EepromSlotKind::Earh => c.set_addr_hi(value),
            EepromSlotKind::Earl => c.set_addr_lo(value),
            EepromSlotKind::Edr => c.set_data(value, ticks),
            EepromSlotKind::Ecr => {
                let busy = self.busy_ticks;
                c.set_control(value, ticks, eeprom, busy)
            }
        }
    }
}

/// XMEGA USART: a receive queue fed externally via `add`, and a transmit
/// side that frames bytes to stdout as hex + printable ASCII.
pub struct Usart {
    rx: Vec<u8>,
    rx_pos: usize,
    ctrl_a: u8,
    ctrl_b: u8,
    ctrl_c: u8,
    baud_a: u8,
    baud_b: u8,
}

impl Usart {
    pub fn new() -> Self {
        Usart { rx: Vec::new(), rx_pos: 0, ctrl_a: 0, ctrl_b: 0, ctrl_c: 0x02, baud_a: 0, baud_b: 0 }
    }

    pub fn add(&mut self, data: &[u8]) {
        self.rx.extend_from_slice(data);
    }

    fn rx_avail(&self) -> bool {
        self.rx_pos < self.rx.len()
    }

    fn rx_byte(&mut self) -> u8 {
        if self.rx_pos < self.rx.len() {
            let b = self.rx[self.rx_pos];
            self.rx_pos += 1;
            let ascii = if (0x20..=0x7e).contains(&b) { b as char } else { '.' };
            log::info!("usart rx: 0x{:02x} '{}'", b, ascii);
            if self.rx_pos >= self.rx.len() {
                self.rx.clear();
                self.rx_pos = 0;
            }
            b
        } else {
            0
        }
    }

    fn tx_byte(&mut self, b: u8) {
        let ascii = if (0x20..=0x7e).contains(&b) { b as char } else { '.' };
        println!("usart tx: 0x{:02x} '{}'", b, ascii);
    }
}

impl Default for Usart {
    fn default() -> Self {
        Self::new()
    }
}

pub enum UsartSlotKind {
    Data,
    Status,
    CtrlA,
    CtrlB,
    CtrlC,
    BaudCtrlA,
    BaudCtrlB,
}

pub struct UsartSlot {
    pub usart: Rc<RefCell<Usart>>,
    pub slot: UsartSlotKind,
}

impl IoRegister for UsartSlot {
    fn name(&self) -> &str {
        match self.slot {
            UsartSlotKind::Data => "USART_DATA",
            UsartSlotKind::Status => "USART_STATUS",
            UsartSlotKind::CtrlA => "USART_CTRLA",
            UsartSlotKind::CtrlB => "USART_CTRLB",
            UsartSlotKind::CtrlC => "USART_CTRLC",
            UsartSlotKind::BaudCtrlA => "USART_BAUDCTRLA",
            UsartSlotKind::BaudCtrlB => "USART_BAUDCTRLB",
        }
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        let mut u = self.usart.borrow_mut();
        match self.slot {
            UsartSlotKind::Data => u.rx_byte(),
            UsartSlotKind::Status => {
                let mut s = 0x40 | 0x20; // TransmitComplete | DataRegisterEmpty
                if u.rx_avail() {
                    s |= 0x80; // ReceiveComplete
                }
                s
            }
            UsartSlotKind::CtrlA => u.ctrl_a,
            UsartSlotKind::CtrlB => u.ctrl_b,
            UsartSlotKind::CtrlC => u.ctrl_c,
            UsartSlotKind::BaudCtrlA => u.baud_a,
            UsartSlotKind::BaudCtrlB => u.baud_b,
        }
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        let mut u = self.usart.borrow_mut();
        match self.slot {
            UsartSlotKind::Data => u.tx_byte(value),
            UsartSlotKind::Status => {}
            UsartSlotKind::CtrlA => u.ctrl_a = value & 0x3f,
            UsartSlotKind::CtrlB => u.ctrl_b = value & 0x1f,
            UsartSlotKind::CtrlC => u.ctrl_c = value,
            UsartSlotKind::BaudCtrlA => u.baud_a = value,
            UsartSlotKind::BaudCtrlB => u.baud_b = value,
        }
    }
}

/// A RAMP register (RAMPZ, EIND, RAMPX, RAMPY, RAMPD) aliased into the I/O
/// window over a shared cell owned by the core, so ELPM/EIJMP/EICALL and
/// IN/OUT on the same byte observe each other's writes.
#[derive(Clone)]
pub struct RampCell {
    name: String,
    cell: Rc<Cell<u8>>,
}

impl RampCell {
    pub fn new(name: impl Into<String>, cell: Rc<Cell<u8>>) -> Self {
        RampCell { name: name.into(), cell }
    }
}

impl IoRegister for RampCell {
    fn name(&self) -> &str {
        &self.name
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        self.cell.get()
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        self.cell.set(value);
    }
}

/// XMEGA NVM controller: ADDR0..2/DATA0..2/CMD/CTRLA/CTRLB/STATUS. Flash and
/// EEPROM programming through this controller is out of scope here; the
/// slots hold their written values and STATUS always reports "not busy",
/// which is enough for code that only polls for completion.
pub struct NvmController {
    addr: [u8; 3],
    data: [u8; 3],
    cmd: u8,
    ctrl_a: u8,
    ctrl_b: u8,
}

impl NvmController {
    pub fn new() -> Self {
        NvmController { addr: [0; 3], data: [0; 3], cmd: 0, ctrl_a: 0, ctrl_b: 0 }
    }
}

impl Default for NvmController {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub enum NvmSlotKind {
    Addr0,
    Addr1,
    Addr2,
    Data0,
    Data1,
    Data2,
    Cmd,
    CtrlA,
    CtrlB,
    Status,
}

pub struct NvmSlot {
    pub nvm: Rc<RefCell<NvmController>>,
    pub slot: NvmSlotKind,
}

impl IoRegister for NvmSlot {
    fn name(&self) -> &str {
        match self.slot {
            NvmSlotKind::Addr0 => "NVM_ADDR0",
            NvmSlotKind::Addr1 => "NVM_ADDR1",
            NvmSlotKind::Addr2 => "NVM_ADDR2",
            NvmSlotKind::Data0 => "NVM_DATA0",
            NvmSlotKind::Data1 => "NVM_DATA1",
            NvmSlotKind::Data2 => "NVM_DATA2",
            NvmSlotKind::Cmd => "NVM_CMD",
            NvmSlotKind::CtrlA => "NVM_CTRLA",
            NvmSlotKind::CtrlB => "NVM_CTRLB",
            NvmSlotKind::Status => "NVM_STATUS",
        }
    }
    fn get(&mut self, _ticks: u64) -> u8 {
        let n = self.nvm.borrow();
        match self.slot {
            NvmSlotKind::Addr0 => n.addr[0],
            NvmSlotKind::Addr1 => n.addr[1],
            NvmSlotKind::Addr2 => n.addr[2],
            NvmSlotKind::Data0 => n.data[0],
            NvmSlotKind::Data1 => n.data[1],
            NvmSlotKind::Data2 => n.data[2],
            NvmSlotKind::Cmd => n.cmd,
            NvmSlotKind::CtrlA => n.ctrl_a,
            NvmSlotKind::CtrlB => n.ctrl_b,
            NvmSlotKind::Status => 0x00, // never busy, no errors
        }
    }
    fn set(&mut self, value: u8, _ticks: u64, _eeprom: &mut [u8]) {
        let mut n = self.nvm.borrow_mut();
        match self.slot {
            NvmSlotKind::Addr0 => n.addr[0] = value,
            NvmSlotKind::Addr1 => n.addr[1] = value,
            NvmSlotKind::Addr2 => n.addr[2] = value,
            NvmSlotKind::Data0 => n.data[0] = value,
            NvmSlotKind::Data1 => n.data[1] = value,
            NvmSlotKind::Data2 => n.data[2] = value,
            NvmSlotKind::Cmd => n.cmd = value,
            NvmSlotKind::CtrlA => n.ctrl_a = value,
            NvmSlotKind::CtrlB => n.ctrl_b = value,
            NvmSlotKind::Status => {}
        }
    }
}

/// XMEGA RTC: CNT free-runs off the tick counter at a fixed divider so code
/// that polls it observes real forward motion, without modelling the
/// oscillator/prescaler/period registers or real wall-clock timing.
pub struct RtcController {
    ctrl: u8,
    intctrl: u8,
    started_at: u64,
}

impl RtcController {
    const TICKS_PER_COUNT: u64 = 1024;

    pub fn new() -> Self {
        RtcController { ctrl: 0, intctrl: 0, started_at: 0 }
    }

    fn cnt(&self, ticks: u64) -> u16 {
        (ticks.saturating_sub(self.started_at) / Self::TICKS_PER_COUNT) as u16
    }
}

impl Default for RtcController {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
pub enum RtcSlotKind {
    CtrlA,
    Status,
    IntCtrl,
    CntLo,
    CntHi,
}

pub struct RtcSlot {
    pub rtc: Rc<RefCell<RtcController>>,
    pub slot: RtcSlotKind,
}

impl IoRegister for RtcSlot {
    fn name(&self) -> &str {
        match self.slot {
            RtcSlotKind::CtrlA => "RTC_CTRL",
            RtcSlotKind::Status => "RTC_STATUS",
            RtcSlotKind::IntCtrl => "RTC_INTCTRL",
            RtcSlotKind::CntLo => "RTC_CNTL",
            RtcSlotKind::CntHi => "RTC_CNTH",
        }
    }
    fn get(&mut self, ticks: u64) -> u8 {
        let r = self.rtc.borrow();
        match self.slot {
            RtcSlotKind::CtrlA => r.ctrl,
            RtcSlotKind::Status => 0x00, // SYNCBUSY never set
            RtcSlotKind::IntCtrl => r.intctrl,
            RtcSlotKind::CntLo => r.cnt(ticks) as u8,
            RtcSlotKind::CntHi => (r.cnt(ticks) >> 8) as u8,
        }
    }
    fn set(&mut self, value: u8, ticks: u64, _eeprom: &mut [u8]) {
        let mut r = self.rtc.borrow_mut();
        match self.slot {
            RtcSlotKind::CtrlA => r.ctrl = value,
            RtcSlotKind::Status => {}
            RtcSlotKind::IntCtrl => r.intctrl = value,
            RtcSlotKind::CntLo | RtcSlotKind::CntHi => r.started_at = ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_implemented_warns_once() {
        let mut reg = NotImplemented::new("FOO");
        assert!(!reg.warned.get());
        let _ = reg.get(0);
        assert!(reg.warned.get());
    }

    #[test]
    fn eeprom_write_requires_empe_first() {
        let mut c = EepromController::new(16);
        let mut mem = vec![0u8; 16];
        c.set_addr_lo(4);
        c.set_data(0x2a, 0);
        c.set_control(EEPE, 0, &mut mem, (34, 18, 18));
        assert_eq!(mem[4], 0);
    }

    #[test]
    fn eeprom_round_trip_write_then_read() {
        let mut c = EepromController::new(16);
        let mut mem = vec![0u8; 16];
        c.set_addr_lo(4);
        c.set_data(0x2a, 0);
        c.set_control(EEMPE, 0, &mut mem, (34, 18, 18));
        c.set_control(EEPE, 1, &mut mem, (34, 18, 18));
        assert_eq!(mem[4], 0x2a);
        c.set_control(EERE, 40, &mut mem, (34, 18, 18));
        assert_eq!(c.get_data(), 0x2a);
    }

    #[test]
    fn usart_tx_and_rx_queue() {
        let mut u = Usart::new();
        u.add(&[0x41, 0x42]);
        assert!(u.rx_avail());
        assert_eq!(u.rx_byte(), 0x41);
        assert_eq!(u.rx_byte(), 0x42);
        assert!(!u.rx_avail());
    }

    #[test]
    fn ramp_cell_shares_state_with_core() {
        let cell = Rc::new(Cell::new(0u8));
        let mut reg = RampCell::new("RAMPZ", Rc::clone(&cell));
        let mut mem = [];
        reg.set(0x03, 0, &mut mem);
        assert_eq!(cell.get(), 0x03);
        cell.set(0x07);
        assert_eq!(reg.get(0), 0x07);
    }

    #[test]
    fn nvm_status_always_reports_not_busy() {
        let nvm = Rc::new(RefCell::new(NvmController::new()));
        let mut status = NvmSlot { nvm: Rc::clone(&nvm), slot: NvmSlotKind::Status };
        let mut cmd = NvmSlot { nvm, slot: NvmSlotKind::Cmd };
        let mut mem = [];
        cmd.set(0x02, 0, &mut mem);
        assert_eq!(status.get(0), 0x00);
        assert_eq!(cmd.get(0), 0x02);
    }

    #[test]
    fn rtc_count_advances_with_ticks() {
        let rtc = Rc::new(RefCell::new(RtcController::new()));
        let mut lo = RtcSlot { rtc: Rc::clone(&rtc), slot: RtcSlotKind::CntLo };
        assert_eq!(lo.get(0), 0);
        assert_eq!(lo.get(RtcController::TICKS_PER_COUNT * 3), 3);
    }
}
