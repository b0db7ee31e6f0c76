use avremu::chips::{new_atany, new_atmega328p, new_atxmega128a4u, KNOWN_MCU_NAMES};
use avremu::fields::Sreg;
use avremu::instructions::ALL;

#[test]
fn load_flash_and_disassemble_reads_back_mnemonics() {
    let mut mcu = new_atmega328p();
    // LDI r16,0x05 ; LDI r17,0x10 ; ADD r16,r17 ; RJMP -2 (self loop)
    mcu.set_flash(0, &[0xE005, 0xE110, 0x0F01, 0xCFFF]);
    let (line0, size0) = mcu.disasm_at(0);
    assert!(line0.contains("LDI"));
    assert_eq!(size0, 1);
    let (line2, _) = mcu.disasm_at(2);
    assert!(line2.contains("ADD"));
}

#[test]
fn arithmetic_sets_zero_and_carry_flags() {
    let mut mcu = new_atmega328p();
    // LDI r16,0xff ; LDI r17,0x01 ; ADD r16,r17 -> result 0, carry out
    mcu.set_flash(0, &[0xEF0F, 0xE011, 0x0F01]);
    mcu.execute();
    mcu.execute();
    mcu.execute();
    assert_eq!(mcu.reg(16), 0);
    assert!(mcu.flag(Sreg::Z));
    assert!(mcu.flag(Sreg::C));
}

#[test]
fn call_and_ret_are_symmetric_on_the_stack() {
    let mut mcu = new_atmega328p();
    // 0: CALL 3 ; 2: (second word of CALL) ; 3: NOP ; 4: RET
    mcu.set_flash(0, &[0x940E, 0x0003, 0x0000, 0x9508]);
    let sp_before = mcu.sp();
    mcu.execute(); // CALL
    assert_eq!(mcu.pc, 3);
    assert_ne!(mcu.sp(), sp_before);
    mcu.execute(); // NOP
    mcu.execute(); // RET
    assert_eq!(mcu.pc, 2);
    assert_eq!(mcu.sp(), sp_before);
}

#[test]
fn eeprom_round_trips_through_set_eeprom_and_data_space() {
    let mut mcu = new_atmega328p();
    mcu.set_eeprom(0, &[0xaa, 0xbb, 0xcc]);
    // EEPROM isn't memory-mapped on classic parts; set_eeprom's effect is
    // observed through the EEPROM controller registers (EEARL/EEARH/EEDR),
    // installed at offsets 0x1e/0x1f/0x20 relative to the I/O window, i.e.
    // data addresses 0x3e/0x3f/0x40 for the classic 0x20-based layout.
    mcu.set_data(0x3e, 0x01); // EEARL = 1
    mcu.set_data(0x3f, 0x00); // EEARH = 0
    mcu.set_data(0x3c, 0x01); // EECR: EERE (bit0) triggers a read
    assert_eq!(mcu.data(0x40), 0xbb); // EEDR now holds eeprom[1]
}

#[test]
fn dispatch_table_resolves_every_registered_descriptor() {
    let mcu = new_atany();
    for descriptor in ALL {
        // Every descriptor's canonical pattern must resolve back to itself;
        // first-registration-wins means overlapping patterns are fine as
        // long as *a* descriptor is found.
        assert!(mcu.dispatch_lookup(descriptor.pattern).is_some(), "pattern {:#06x} ({}) not resolved", descriptor.pattern, descriptor.mnemonic);
    }
}

#[test]
fn elpm_reads_through_the_rampz_high_byte() {
    let mut mcu = new_atxmega128a4u();
    mcu.set_program(0x8000, 0xabcd);
    mcu.set_pair(30, 0x0000);
    mcu.set_rampz(0x01); // Z:RAMPZ = 0x1_0000 bytes = word 0x8000
    mcu.set_flash(0, &[0x95D8]); // ELPM (implicit R0,Z)
    mcu.execute();
    assert_eq!(mcu.reg(0), 0xcd);
}

#[test]
fn known_mcu_names_all_resolve_via_by_name() {
    for name in KNOWN_MCU_NAMES {
        assert!(avremu::chips::by_name(name).is_some(), "{} failed to resolve", name);
    }
}
