// Chip factories: each variant picks flash/RAM/EEPROM sizes,
// registers its supported instruction subset, installs the I/O register
// catalogue at the chip's real offsets, and seeds the known-vector table.
//
// Only the handful of named registers with real behavior (SREG, SP, the
// EEPROM controller, USART on XMEGA) get dedicated objects; the rest of
// each chip's I/O window is filled with `NotImplemented` placeholders so
// accessing them is diagnosed instead of silently reading zero.

use crate::devices::{
    EepromSlot, EepromSlotKind, IoRegister, NotImplemented, NvmController, NvmSlot, NvmSlotKind, RampCell,
    RtcController, RtcSlot, RtcSlotKind, SpCell, SpHigh, SpLow, SregCell, SregIo, UsartSlot, UsartSlotKind,
};
use crate::instructions::ALL;
use crate::memory::DataLayout;
use crate::mcu::{Mcu, PcWidth};
use std::cell::RefCell;
use std::rc::Rc;

fn install_core_registers(mcu: &mut Mcu, sreg_offset: usize, spl_offset: usize, sph_offset: usize) {
    let sreg = SregCell(mcu.sreg_cell());
    mcu.install_io(sreg_offset, Box::new(SregIo(sreg)));
    let sp = SpCell(mcu.sp_cell());
    mcu.install_io(spl_offset, Box::new(SpLow(sp.clone())));
    mcu.install_io(sph_offset, Box::new(SpHigh(sp)));
}

fn install_eeprom(mcu: &mut Mcu, size: usize, ear_lo: usize, ear_hi: usize, edr: usize, ecr: usize) {
    let controller = Rc::new(RefCell::new(crate::devices::EepromController::new(size)));
    let busy_ticks = (34_000 / 8, 18_000 / 8, 18_000 / 8); // approximate, chip-independent in this crate
    mcu.install_io(ear_lo, Box::new(EepromSlot { controller: Rc::clone(&controller), slot: EepromSlotKind::Earl, busy_ticks }));
    mcu.install_io(ear_hi, Box::new(EepromSlot { controller: Rc::clone(&controller), slot: EepromSlotKind::Earh, busy_ticks }));
    mcu.install_io(edr, Box::new(EepromSlot { controller: Rc::clone(&controller), slot: EepromSlotKind::Edr, busy_ticks }));
    mcu.install_io(ecr, Box::new(EepromSlot { controller, slot: EepromSlotKind::Ecr, busy_ticks }));
}

fn fill_not_implemented(mcu: &mut Mcu, io_size: usize, reserved: &[usize]) {
    for offset in 0..io_size {
        if reserved.contains(&offset) {
            continue;
        }
        mcu.install_io(offset, Box::new(NotImplemented::new(format!("IO@0x{:02x}", offset))));
    }
}

fn classic_vectors(mcu: &mut Mcu) {
    mcu.add_known_vector(0x0000, "RESET", "external reset, power-on reset, brown-out reset, watchdog reset");
}

/// `ATany`: every instruction this crate implements, no chip-specific I/O
/// catalogue or known vectors. Used by tests and by `-m any` for opcode
/// experimentation, not a real silicon part.
pub fn new_atany() -> Mcu {
    let mut mcu = Mcu::new("ATany", PcWidth::Bits22, 0x20000, DataLayout::Classic, 0x1e0, 0x2000, 0x1000, 0x1fff);
    mcu.set_dispatch(ALL);
    install_core_registers(&mut mcu, 0x1df, 0x1dd, 0x1de);
    fill_not_implemented(&mut mcu, 0x1e0, &[0x1df, 0x1dd, 0x1de]);
    mcu
}

/// `ATmegaXX8` family (328P/168PA/88PA/48PA): classic layout, 16-bit PC,
/// EEPROM controller, SREG/SP at the top of the I/O window.
fn new_atmega_xx8(name: &str, flash_words: usize, ram_size: usize, eeprom_size: usize) -> Mcu {
    let io_size = 0xc0;
    let mut mcu = Mcu::new(name, PcWidth::Bits16, flash_words, DataLayout::Classic, io_size, ram_size, eeprom_size, (0x20 + io_size + ram_size - 1) as u16);
    mcu.set_dispatch(ALL);
    install_core_registers(&mut mcu, 0x3f, 0x3d, 0x3e);
    install_eeprom(&mut mcu, eeprom_size, 0x1e, 0x1f, 0x20, 0x1c);
    fill_not_implemented(&mut mcu, io_size, &[0x3f, 0x3d, 0x3e, 0x1e, 0x1f, 0x20, 0x1c]);
    classic_vectors(&mut mcu);
    mcu.add_known_vector(0x0002, "INT0", "external interrupt request 0");
    mcu.add_known_vector(0x0004, "INT1", "external interrupt request 1");
    mcu.add_known_vector(0x0012, "TIMER0_OVF", "timer/counter0 overflow");
    mcu.add_known_vector(0x001a, "USART_RX", "usart rx complete");
    mcu.add_known_vector(0x001c, "USART_UDRE", "usart data register empty");
    mcu.add_known_vector(0x001e, "USART_TX", "usart tx complete");
    mcu
}

pub fn new_atmega328p() -> Mcu {
    new_atmega_xx8("ATmega328P", 0x8000, 0x800, 0x400)
}
pub fn new_atmega168pa() -> Mcu {
    new_atmega_xx8("ATmega168PA", 0x4000, 0x400, 0x200)
}
pub fn new_atmega88pa() -> Mcu {
    new_atmega_xx8("ATmega88PA", 0x2000, 0x200, 0x200)
}
pub fn new_atmega48pa() -> Mcu {
    new_atmega_xx8("ATmega48PA", 0x1000, 0x100, 0x100)
}

/// `ATmega8A`: predecessor of the `ATmegaXX8` line, same core layout but a
/// smaller I/O window and no LIN/USI.
pub fn new_atmega8a() -> Mcu {
    let io_size = 0x40;
    let ram_size = 0x400;
    let eeprom_size = 0x200;
    let mut mcu = Mcu::new("ATmega8A", PcWidth::Bits16, 0x2000, DataLayout::Classic, io_size, ram_size, eeprom_size, (0x20 + io_size + ram_size - 1) as u16);
    mcu.set_dispatch(ALL);
    install_core_registers(&mut mcu, 0x3f, 0x3d, 0x3e);
    install_eeprom(&mut mcu, eeprom_size, 0x1e, 0x1f, 0x20, 0x1c);
    fill_not_implemented(&mut mcu, io_size, &[0x3f, 0x3d, 0x3e, 0x1e, 0x1f, 0x20, 0x1c]);
    classic_vectors(&mut mcu);
    mcu.add_known_vector(0x0002, "INT0", "external interrupt request 0");
    mcu
}

/// `ATtinyX4` family (84A/44A/24A): reduced-core tiny, no JMP/CALL/EIJMP/
/// EICALL/ELPM (flash too small to need them), no MUL.
fn new_attiny_x4(name: &str, flash_words: usize, ram_size: usize, eeprom_size: usize) -> Mcu {
    let io_size = 0x40;
    let mut mcu = Mcu::new(name, PcWidth::Bits16, flash_words, DataLayout::Classic, io_size, ram_size, eeprom_size, (0x20 + io_size + ram_size - 1) as u16);
    let reduced: Vec<&'static crate::instructions::Descriptor> = ALL
        .iter()
        .copied()
        .filter(|d| !matches!(d.mnemonic, "JMP" | "CALL" | "EIJMP" | "EICALL" | "ELPM" | "MUL" | "MULS" | "MULSU" | "DES"))
        .collect();
    mcu.set_dispatch(&reduced);
    install_core_registers(&mut mcu, 0x3f, 0x3d, 0x3e);
    install_eeprom(&mut mcu, eeprom_size, 0x1e, 0x1f, 0x20, 0x1c);
    fill_not_implemented(&mut mcu, io_size, &[0x3f, 0x3d, 0x3e, 0x1e, 0x1f, 0x20, 0x1c]);
    classic_vectors(&mut mcu);
    mcu.add_known_vector(0x0002, "INT0", "external interrupt request 0");
    mcu.add_known_vector(0x0004, "PCINT0", "pin change interrupt request 0");
    mcu
}

pub fn new_attiny84a() -> Mcu {
    new_attiny_x4("ATtiny84A", 0x1000, 0x200, 0x200)
}
pub fn new_attiny44a() -> Mcu {
    new_attiny_x4("ATtiny44A", 0x800, 0x100, 0x100)
}
pub fn new_attiny24a() -> Mcu {
    new_attiny_x4("ATtiny24A", 0x400, 0x80, 0x80)
}

/// `ATtinyX5` family (85/45/25): same reduced-core restrictions as
/// `ATtinyX4`, different pin/interrupt set.
fn new_attiny_x5(name: &str, flash_words: usize, ram_size: usize, eeprom_size: usize) -> Mcu {
    let io_size = 0x40;
    let mut mcu = Mcu::new(name, PcWidth::Bits16, flash_words, DataLayout::Classic, io_size, ram_size, eeprom_size, (0x20 + io_size + ram_size - 1) as u16);
    let reduced: Vec<&'static crate::instructions::Descriptor> = ALL
        .iter()
        .copied()
        .filter(|d| !matches!(d.mnemonic, "JMP" | "CALL" | "EIJMP" | "EICALL" | "ELPM" | "MUL" | "MULS" | "MULSU" | "DES"))
        .collect();
    mcu.set_dispatch(&reduced);
    install_core_registers(&mut mcu, 0x3f, 0x3d, 0x3e);
    install_eeprom(&mut mcu, eeprom_size, 0x1e, 0x1f, 0x20, 0x1c);
    fill_not_implemented(&mut mcu, io_size, &[0x3f, 0x3d, 0x3e, 0x1e, 0x1f, 0x20, 0x1c]);
    classic_vectors(&mut mcu);
    mcu.add_known_vector(0x0002, "INT0", "external interrupt request 0");
    mcu.add_known_vector(0x0004, "PCINT0", "pin change interrupt request 0");
    mcu
}

pub fn new_attiny85() -> Mcu {
    new_attiny_x5("ATtiny85", 0x1000, 0x200, 0x200)
}
pub fn new_attiny45() -> Mcu {
    new_attiny_x5("ATtiny45", 0x800, 0x100, 0x100)
}
pub fn new_attiny25() -> Mcu {
    new_attiny_x5("ATtiny25", 0x400, 0x80, 0x80)
}

/// `ATxmegaAU` family: 22-bit PC, XMEGA data-space layout (I/O at the
/// bottom, optionally memory-mapped EEPROM, RAM at 0x2000+), DES and a
/// real USART.
fn new_atxmega_au(name: &str, flash_words: usize, ram_size: usize, eeprom_size: usize) -> Mcu {
    let io_size = 0x1000;
    let mut mcu = Mcu::new(
        name,
        PcWidth::Bits22,
        flash_words,
        DataLayout::Xmega { eeprom_mapped: true },
        io_size,
        ram_size,
        eeprom_size,
        (0x2000 + ram_size - 1) as u16,
    );
    mcu.set_dispatch(ALL);
    // CPU control block lives at 0x0030..0x0040 on every XMEGA part: CCP,
    // RAMPD/X/Y/Z, EIND, SPL/SPH, SREG, at the same relative offsets as the
    // classic core's top-of-window layout.
    install_core_registers(&mut mcu, 0x003f, 0x003d, 0x003e);
    mcu.install_io(0x0030, Box::new(NotImplemented::new("CCP")));
    mcu.install_io(0x0038, Box::new(RampCell::new("RAMPD", Rc::new(std::cell::Cell::new(0)))));
    mcu.install_io(0x0039, Box::new(RampCell::new("RAMPX", Rc::new(std::cell::Cell::new(0)))));
    mcu.install_io(0x003a, Box::new(RampCell::new("RAMPY", Rc::new(std::cell::Cell::new(0)))));
    mcu.install_io(0x003b, Box::new(RampCell::new("RAMPZ", mcu.rampz_cell())));
    mcu.install_io(0x003c, Box::new(RampCell::new("EIND", mcu.eind_cell())));
    install_eeprom(&mut mcu, eeprom_size, 0x01d0, 0x01d1, 0x01d2, 0x01d3);
    let mut reserved = vec![0x0030usize, 0x0038, 0x0039, 0x003a, 0x003b, 0x003c, 0x003d, 0x003e, 0x003f];
    reserved.extend([0x01d0, 0x01d1, 0x01d2, 0x01d3]);

    // The real NVM controller drives flash/EEPROM programming through this
    // block; this crate models it as inert (flash self-programming is out
    // of scope) while still giving code that polls NVM_STATUS a plausible
    // "not busy" answer instead of a NotImplemented warning.
    let nvm = Rc::new(RefCell::new(NvmController::new()));
    let nvm_slots: &[(usize, NvmSlotKind)] = &[
        (0x01c0, NvmSlotKind::Addr0),
        (0x01c1, NvmSlotKind::Addr1),
        (0x01c2, NvmSlotKind::Addr2),
        (0x01c4, NvmSlotKind::Data0),
        (0x01c5, NvmSlotKind::Data1),
        (0x01c6, NvmSlotKind::Data2),
        (0x01ca, NvmSlotKind::Cmd),
        (0x01cb, NvmSlotKind::CtrlA),
        (0x01cc, NvmSlotKind::CtrlB),
        (0x01cf, NvmSlotKind::Status),
    ];
    for (offset, kind) in nvm_slots {
        mcu.install_io(*offset, Box::new(NvmSlot { nvm: Rc::clone(&nvm), slot: nvm_kind_clone(kind) }));
        reserved.push(*offset);
    }

    let rtc = Rc::new(RefCell::new(RtcController::new()));
    let rtc_slots: &[(usize, RtcSlotKind)] = &[
        (0x0400, RtcSlotKind::CtrlA),
        (0x0401, RtcSlotKind::Status),
        (0x0402, RtcSlotKind::IntCtrl),
        (0x0408, RtcSlotKind::CntLo),
        (0x0409, RtcSlotKind::CntHi),
    ];
    for (offset, kind) in rtc_slots {
        mcu.install_io(*offset, Box::new(RtcSlot { rtc: Rc::clone(&rtc), slot: rtc_kind_clone(kind) }));
        reserved.push(*offset);
    }

    let usart = Rc::new(RefCell::new(crate::devices::Usart::new()));
    let slots: &[(usize, UsartSlotKind)] = &[
        (0x0a00, UsartSlotKind::Data),
        (0x0a01, UsartSlotKind::Status),
        (0x0a03, UsartSlotKind::CtrlA),
        (0x0a04, UsartSlotKind::CtrlB),
        (0x0a05, UsartSlotKind::CtrlC),
        (0x0a06, UsartSlotKind::BaudCtrlA),
        (0x0a07, UsartSlotKind::BaudCtrlB),
    ];
    for (offset, kind) in slots {
        mcu.install_io(*offset, Box::new(UsartSlot { usart: Rc::clone(&usart), slot: kind_clone(kind) }));
        reserved.push(*offset);
    }
    fill_not_implemented(&mut mcu, io_size, &reserved);
    mcu.add_known_vector(0x0000, "RESET", "external reset, power-on reset, brown-out reset, watchdog reset");
    mcu.add_known_vector(0x0002, "OSC_OSCF", "oscillator failure interrupt");
    mcu
}

fn nvm_kind_clone(kind: &NvmSlotKind) -> NvmSlotKind {
    match kind {
        NvmSlotKind::Addr0 => NvmSlotKind::Addr0,
        NvmSlotKind::Addr1 => NvmSlotKind::Addr1,
        NvmSlotKind::Addr2 => NvmSlotKind::Addr2,
        NvmSlotKind::Data0 => NvmSlotKind::Data0,
        NvmSlotKind::Data1 => NvmSlotKind::Data1,
        NvmSlotKind::Data2 => NvmSlotKind::Data2,
        NvmSlotKind::Cmd => NvmSlotKind::Cmd,
        NvmSlotKind::CtrlA => NvmSlotKind::CtrlA,
        NvmSlotKind::CtrlB => NvmSlotKind::CtrlB,
        NvmSlotKind::Status => NvmSlotKind::Status,
    }
}

fn rtc_kind_clone(kind: &RtcSlotKind) -> RtcSlotKind {
    match kind {
        RtcSlotKind::CtrlA => RtcSlotKind::CtrlA,
        RtcSlotKind::Status => RtcSlotKind::Status,
        RtcSlotKind::IntCtrl => RtcSlotKind::IntCtrl,
        RtcSlotKind::CntLo => RtcSlotKind::CntLo,
        RtcSlotKind::CntHi => RtcSlotKind::CntHi,
    }
}

fn kind_clone(kind: &UsartSlotKind) -> UsartSlotKind {
    match kind {
        UsartSlotKind::Data => UsartSlotKind::Data,
        UsartSlotKind::Status => UsartSlotKind::Status,
        UsartSlotKind::CtrlA => UsartSlotKind::CtrlA,
        UsartSlotKind::CtrlB => UsartSlotKind::CtrlB,
        UsartSlotKind::CtrlC => UsartSlotKind::CtrlC,
        UsartSlotKind::BaudCtrlA => UsartSlotKind::BaudCtrlA,
        UsartSlotKind::BaudCtrlB => UsartSlotKind::BaudCtrlB,
    }
}

pub fn new_atxmega128a4u() -> Mcu {
    new_atxmega_au("ATxmega128A4U", 0x10000, 0x2000, 0x800)
}
pub fn new_atxmega64a4u() -> Mcu {
    new_atxmega_au("ATxmega64A4U", 0x8000, 0x1000, 0x800)
}
pub fn new_atxmega32a4u() -> Mcu {
    new_atxmega_au("ATxmega32A4U", 0x4000, 0x1000, 0x400)
}
pub fn new_atxmega16a4u() -> Mcu {
    new_atxmega_au("ATxmega16A4U", 0x2000, 0x800, 0x400)
}

/// Resolves a `-m` CLI argument to a chip factory. Matching is
/// case-insensitive; unknown names are the caller's `ConfigError`.
pub fn by_name(name: &str) -> Option<Mcu> {
    match name.to_ascii_lowercase().as_str() {
        "any" | "atany" => Some(new_atany()),
        "atmega328p" => Some(new_atmega328p()),
        "atmega168pa" => Some(new_atmega168pa()),
        "atmega88pa" => Some(new_atmega88pa()),
        "atmega48pa" => Some(new_atmega48pa()),
        "atmega8a" => Some(new_atmega8a()),
        "attiny84a" => Some(new_attiny84a()),
        "attiny44a" => Some(new_attiny44a()),
        "attiny24a" => Some(new_attiny24a()),
        "attiny85" => Some(new_attiny85()),
        "attiny45" => Some(new_attiny45()),
        "attiny25" => Some(new_attiny25()),
        "atxmega128a4u" => Some(new_atxmega128a4u()),
        "atxmega64a4u" => Some(new_atxmega64a4u()),
        "atxmega32a4u" => Some(new_atxmega32a4u()),
        "atxmega16a4u" => Some(new_atxmega16a4u()),
        _ => None,
    }
}

pub const KNOWN_MCU_NAMES: &[&str] = &[
    "any",
    "ATmega328P",
    "ATmega168PA",
    "ATmega88PA",
    "ATmega48PA",
    "ATmega8A",
    "ATtiny84A",
    "ATtiny44A",
    "ATtiny24A",
    "ATtiny85",
    "ATtiny45",
    "ATtiny25",
    "ATxmega128A4U",
    "ATxmega64A4U",
    "ATxmega32A4U",
    "ATxmega16A4U",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atany_resolves_every_descriptor() {
        let mcu = new_atany();
        assert!(mcu.dispatch_lookup(0x0000).is_some()); // NOP
        assert!(mcu.dispatch_lookup(0x940C).is_some()); // JMP
    }

    #[test]
    fn attiny_drops_jmp_and_mul() {
        let mcu = new_attiny85();
        assert!(mcu.dispatch_lookup(0x940C).is_none());
        assert!(mcu.dispatch_lookup(0x9C00).is_none());
        assert!(mcu.dispatch_lookup(0x0000).is_some()); // NOP still present
    }

    #[test]
    fn by_name_is_case_insensitive_and_rejects_unknown() {
        assert!(by_name("atmega328p").is_some());
        assert!(by_name("ATMEGA328P").is_some());
        assert!(by_name("not-a-chip").is_none());
    }

    #[test]
    fn xmega_rampz_alias_shares_state_with_core() {
        let mut mcu = new_atxmega16a4u();
        mcu.set_rampz(0x02);
        let reg = mcu.io_get_mut(0x003b).expect("RAMPZ installed");
        assert_eq!(reg.get(0), 0x02);
    }

    #[test]
    fn xmega_nvm_status_reports_not_busy() {
        let mut mcu = new_atxmega16a4u();
        let reg = mcu.io_get_mut(0x01cf).expect("NVM_STATUS installed");
        assert_eq!(reg.get(0), 0x00);
    }
}
