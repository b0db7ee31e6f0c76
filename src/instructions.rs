// InstructionTable: ~110 instruction descriptors, each exposing pattern,
// mask, mnemonic, size-in-words, a ticks count, an execute function, a
// disassembler, and a control-flow classifier.
//
// These are plain-data records built once as `static`s and shared read-only
// by every Mcu; there is no subtyping, and dispatch is a 65,536-entry table
// of `Option<&'static Descriptor>` built by each chip factory from the
// subset of statics it registers.

use crate::decode::*;
use crate::fields::Sreg;
use crate::mcu::Mcu;
use crate::xref::XrefType;

pub type XrefFn = fn(cmd: u16, cmd2: Option<u16>, pc: u32, flash_words: u32) -> Option<(XrefType, u32)>;
pub type DisasmFn = fn(cmd: u16, cmd2: Option<u16>) -> String;
pub type ExecFn = fn(&mut Mcu, u16);

pub struct Descriptor {
    pub pattern: u16,
    pub mask: u16,
    pub mnemonic: &'static str,
    pub description: &'static str,
    pub size: u8,
    pub is_jump: bool,
    pub is_branch: bool,
    pub is_call: bool,
    pub is_return: bool,
    pub ticks: u8,
    pub execute: ExecFn,
    pub disasm: DisasmFn,
    pub xref: XrefFn,
}

impl Descriptor {
    pub fn matches(&self, cmd: u16) -> bool {
        (cmd & self.mask) == self.pattern
    }
}

fn no_xref(_cmd: u16, _cmd2: Option<u16>, _pc: u32, _fw: u32) -> Option<(XrefType, u32)> {
    None
}

fn fmt2(mnemonic: &str, operands: String, description: &str) -> String {
    format!("{:<6}{:<16}; {}", mnemonic, operands, description)
}

fn wrap_word(addr: i64, flash_words: u32) -> u32 {
    addr.rem_euclid(flash_words.max(1) as i64) as u32
}

// ---------------------------------------------------------------------
// Arithmetic and logic
// ---------------------------------------------------------------------

const AFFECTED_ADD: Sreg = Sreg::from_bits_truncate(
    Sreg::C.bits() | Sreg::Z.bits() | Sreg::N.bits() | Sreg::V.bits() | Sreg::S.bits() | Sreg::H.bits(),
);
const AFFECTED_LOGIC: Sreg = Sreg::from_bits_truncate(Sreg::Z.bits() | Sreg::N.bits() | Sreg::V.bits() | Sreg::S.bits());
const AFFECTED_INCDEC: Sreg = Sreg::from_bits_truncate(Sreg::Z.bits() | Sreg::N.bits() | Sreg::V.bits() | Sreg::S.bits());
const AFFECTED_SHIFT: Sreg =
    Sreg::from_bits_truncate(Sreg::C.bits() | Sreg::Z.bits() | Sreg::N.bits() | Sreg::V.bits() | Sreg::S.bits());
const AFFECTED_MUL: Sreg = Sreg::from_bits_truncate(Sreg::C.bits() | Sreg::Z.bits());

fn exec_add(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let (res, flags) = crate::fields::add_flags(mcu.reg(d), mcu.reg(r), 0);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_add(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("add", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Add without Carry")
}
pub static ADD: Descriptor = Descriptor {
    pattern: 0x0C00, mask: 0xFC00, mnemonic: "ADD", description: "Add without Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_add, disasm: disasm_add, xref: no_xref,
};

fn exec_adc(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let c = mcu.flag(Sreg::C) as u8;
    let (res, flags) = crate::fields::add_flags(mcu.reg(d), mcu.reg(r), c);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_adc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("adc", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Add with Carry")
}
pub static ADC: Descriptor = Descriptor {
    pattern: 0x1C00, mask: 0xFC00, mnemonic: "ADC", description: "Add with Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_adc, disasm: disasm_adc, xref: no_xref,
};

fn exec_adiw(mcu: &mut Mcu, cmd: u16) {
    let pair = adiw_pair(cmd);
    let old = mcu.pair(pair);
    let k = k6(cmd) as u16;
    let new = old.wrapping_add(k);
    mcu.set_pair(pair, new);
    let rdh7 = (old >> 15) & 1;
    let r15 = (new >> 15) & 1;
    let mut f = Sreg::empty();
    if rdh7 == 0 && r15 == 1 {
        f |= Sreg::V;
    }
    if r15 == 1 {
        f |= Sreg::N;
    }
    if new == 0 {
        f |= Sreg::Z;
    }
    if rdh7 == 1 && r15 == 0 {
        f |= Sreg::C;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    mcu.apply_flags(AFFECTED_SHIFT, f);
}
fn disasm_adiw(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("adiw", format!("r{},{}", adiw_pair(cmd), k6(cmd)), "Add Immediate to Word")
}
pub static ADIW: Descriptor = Descriptor {
    pattern: 0x9600, mask: 0xFF00, mnemonic: "ADIW", description: "Add Immediate to Word",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_adiw, disasm: disasm_adiw, xref: no_xref,
};

fn exec_sub(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let (res, flags) = crate::fields::sub_flags(mcu.reg(d), mcu.reg(r), 0);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_sub(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sub", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Subtract without Carry")
}
pub static SUB: Descriptor = Descriptor {
    pattern: 0x1800, mask: 0xFC00, mnemonic: "SUB", description: "Subtract without Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sub, disasm: disasm_sub, xref: no_xref,
};

fn exec_subi(mcu: &mut Mcu, cmd: u16) {
    let d = rd4(cmd);
    let k = k8(cmd);
    let (res, flags) = crate::fields::sub_flags(mcu.reg(d), k, 0);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_subi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("subi", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Subtract Immediate")
}
pub static SUBI: Descriptor = Descriptor {
    pattern: 0x5000, mask: 0xF000, mnemonic: "SUBI", description: "Subtract Immediate",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_subi, disasm: disasm_subi, xref: no_xref,
};

fn exec_sbc(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let prev_z = mcu.flag(Sreg::Z);
    let (res, mut flags) = crate::fields::sub_flags(mcu.reg(d), mcu.reg(r), mcu.flag(Sreg::C) as u8);
    flags.set(Sreg::Z, res == 0 && prev_z);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_sbc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbc", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Subtract with Carry")
}
pub static SBC: Descriptor = Descriptor {
    pattern: 0x0800, mask: 0xFC00, mnemonic: "SBC", description: "Subtract with Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbc, disasm: disasm_sbc, xref: no_xref,
};

fn exec_sbci(mcu: &mut Mcu, cmd: u16) {
    let d = rd4(cmd);
    let k = k8(cmd);
    let prev_z = mcu.flag(Sreg::Z);
    let (res, mut flags) = crate::fields::sub_flags(mcu.reg(d), k, mcu.flag(Sreg::C) as u8);
    flags.set(Sreg::Z, res == 0 && prev_z);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_sbci(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbci", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Subtract Immediate with Carry")
}
pub static SBCI: Descriptor = Descriptor {
    pattern: 0x4000, mask: 0xF000, mnemonic: "SBCI", description: "Subtract Immediate with Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbci, disasm: disasm_sbci, xref: no_xref,
};

fn exec_sbiw(mcu: &mut Mcu, cmd: u16) {
    let pair = adiw_pair(cmd);
    let old = mcu.pair(pair);
    let k = k6(cmd) as u16;
    let new = old.wrapping_sub(k);
    mcu.set_pair(pair, new);
    let rdh7 = (old >> 15) & 1;
    let r15 = (new >> 15) & 1;
    let mut f = Sreg::empty();
    if rdh7 == 1 && r15 == 0 {
        f |= Sreg::V;
    }
    if r15 == 1 {
        f |= Sreg::N;
    }
    if new == 0 {
        f |= Sreg::Z;
    }
    if r15 == 1 && rdh7 == 0 {
        f |= Sreg::C;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    mcu.apply_flags(AFFECTED_SHIFT, f);
}
fn disasm_sbiw(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbiw", format!("r{},{}", adiw_pair(cmd), k6(cmd)), "Subtract Immediate from Word")
}
pub static SBIW: Descriptor = Descriptor {
    pattern: 0x9700, mask: 0xFF00, mnemonic: "SBIW", description: "Subtract Immediate from Word",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sbiw, disasm: disasm_sbiw, xref: no_xref,
};

fn exec_and(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let res = mcu.reg(d) & mcu.reg(r);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_LOGIC, crate::fields::logic_flags(res));
}
fn disasm_and(cmd: u16, _c2: Option<u16>) -> String {
    if rd5(cmd) == rr5(cmd) {
        fmt2("tst", format!("r{}", rd5(cmd)), "Test for Zero or Minus (= AND r,r)")
    } else {
        fmt2("and", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Logical AND")
    }
}
pub static AND: Descriptor = Descriptor {
    pattern: 0x2000, mask: 0xFC00, mnemonic: "AND", description: "Logical AND",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_and, disasm: disasm_and, xref: no_xref,
};

fn exec_andi(mcu: &mut Mcu, cmd: u16) {
    let d = rd4(cmd);
    let res = mcu.reg(d) & k8(cmd);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_LOGIC, crate::fields::logic_flags(res));
}
fn disasm_andi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("andi", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Logical AND with Immediate (also CBR)")
}
pub static ANDI: Descriptor = Descriptor {
    pattern: 0x7000, mask: 0xF000, mnemonic: "ANDI", description: "Logical AND with Immediate",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_andi, disasm: disasm_andi, xref: no_xref,
};

fn exec_or(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let res = mcu.reg(d) | mcu.reg(r);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_LOGIC, crate::fields::logic_flags(res));
}
fn disasm_or(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("or", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Logical OR")
}
pub static OR: Descriptor = Descriptor {
    pattern: 0x2800, mask: 0xFC00, mnemonic: "OR", description: "Logical OR",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_or, disasm: disasm_or, xref: no_xref,
};

fn exec_ori(mcu: &mut Mcu, cmd: u16) {
    let d = rd4(cmd);
    let res = mcu.reg(d) | k8(cmd);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_LOGIC, crate::fields::logic_flags(res));
}
fn disasm_ori(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ori", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Logical OR with Immediate (also SBR)")
}
pub static ORI: Descriptor = Descriptor {
    pattern: 0x6000, mask: 0xF000, mnemonic: "ORI", description: "Logical OR with Immediate",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_ori, disasm: disasm_ori, xref: no_xref,
};

fn exec_eor(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let res = mcu.reg(d) ^ mcu.reg(r);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_LOGIC, crate::fields::logic_flags(res));
}
fn disasm_eor(cmd: u16, _c2: Option<u16>) -> String {
    if rd5(cmd) == rr5(cmd) {
        fmt2("clr", format!("r{}", rd5(cmd)), "Clear Register (= EOR r,r)")
    } else {
        fmt2("eor", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Exclusive OR")
    }
}
pub static EOR: Descriptor = Descriptor {
    pattern: 0x2400, mask: 0xFC00, mnemonic: "EOR", description: "Exclusive OR",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_eor, disasm: disasm_eor, xref: no_xref,
};

fn exec_com(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let res = !mcu.reg(d);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, crate::fields::com_flags(res));
}
fn disasm_com(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("com", format!("r{}", rd5(cmd)), "One's Complement")
}
pub static COM: Descriptor = Descriptor {
    pattern: 0x9400, mask: 0xFE0F, mnemonic: "COM", description: "One's Complement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_com, disasm: disasm_com, xref: no_xref,
};

fn exec_neg(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let old = mcu.reg(d);
    let res = 0u8.wrapping_sub(old);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_ADD, crate::fields::neg_flags(old, res));
}
fn disasm_neg(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("neg", format!("r{}", rd5(cmd)), "Two's Complement")
}
pub static NEG: Descriptor = Descriptor {
    pattern: 0x9401, mask: 0xFE0F, mnemonic: "NEG", description: "Two's Complement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_neg, disasm: disasm_neg, xref: no_xref,
};

fn exec_inc(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let res = mcu.reg(d).wrapping_add(1);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_INCDEC, crate::fields::inc_flags(res));
}
fn disasm_inc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("inc", format!("r{}", rd5(cmd)), "Increment")
}
pub static INC: Descriptor = Descriptor {
    pattern: 0x9403, mask: 0xFE0F, mnemonic: "INC", description: "Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_inc, disasm: disasm_inc, xref: no_xref,
};

fn exec_dec(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let res = mcu.reg(d).wrapping_sub(1);
    mcu.set_reg(d, res);
    mcu.apply_flags(AFFECTED_INCDEC, crate::fields::dec_flags(res));
}
fn disasm_dec(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("dec", format!("r{}", rd5(cmd)), "Decrement")
}
pub static DEC: Descriptor = Descriptor {
    pattern: 0x940A, mask: 0xFE0F, mnemonic: "DEC", description: "Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_dec, disasm: disasm_dec, xref: no_xref,
};

fn exec_mul(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let r = rr5(cmd);
    let product = mcu.reg(d) as u16 * mcu.reg(r) as u16;
    mcu.set_reg(0, product as u8);
    mcu.set_reg(1, (product >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, crate::fields::mul_flags(product));
}
fn disasm_mul(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("mul", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Multiply Unsigned")
}
pub static MUL: Descriptor = Descriptor {
    pattern: 0x9C00, mask: 0xFC00, mnemonic: "MUL", description: "Multiply Unsigned",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_mul, disasm: disasm_mul, xref: no_xref,
};

fn exec_muls(mcu: &mut Mcu, cmd: u16) {
    let d = rd4(cmd);
    let r = rr4(cmd);
    let product = (mcu.reg(d) as i8 as i16).wrapping_mul(mcu.reg(r) as i8 as i16) as u16;
    mcu.set_reg(0, product as u8);
    mcu.set_reg(1, (product >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, crate::fields::mul_flags(product));
}
fn disasm_muls(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("muls", format!("r{},r{}", rd4(cmd), rr4(cmd)), "Multiply Signed")
}
pub static MULS: Descriptor = Descriptor {
    pattern: 0x0200, mask: 0xFF00, mnemonic: "MULS", description: "Multiply Signed",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_muls, disasm: disasm_muls, xref: no_xref,
};

fn exec_mulsu(mcu: &mut Mcu, cmd: u16) {
    let d = rd3(cmd);
    let r = rr3(cmd);
    let product = (mcu.reg(d) as i8 as i16).wrapping_mul(mcu.reg(r) as i16) as u16;
    mcu.set_reg(0, product as u8);
    mcu.set_reg(1, (product >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, crate::fields::mul_flags(product));
}
fn disasm_mulsu(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("mulsu", format!("r{},r{}", rd3(cmd), rr3(cmd)), "Multiply Signed with Unsigned")
}
pub static MULSU: Descriptor = Descriptor {
    pattern: 0x0300, mask: 0xFF88, mnemonic: "MULSU", description: "Multiply Signed with Unsigned",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_mulsu, disasm: disasm_mulsu, xref: no_xref,
};

fn fmul_flags_and_result(a: u16, b: u16) -> (u16, Sreg) {
    let product = a.wrapping_mul(b);
    let c = (product >> 15) & 1;
    let result = product << 1;
    let mut f = Sreg::empty();
    if c != 0 {
        f |= Sreg::C;
    }
    if result == 0 {
        f |= Sreg::Z;
    }
    (result, f)
}
fn exec_fmul(mcu: &mut Mcu, cmd: u16) {
    let d = rd3(cmd);
    let r = rr3(cmd);
    let (res, f) = fmul_flags_and_result(mcu.reg(d) as u16, mcu.reg(r) as u16);
    mcu.set_reg(0, res as u8);
    mcu.set_reg(1, (res >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, f);
}
fn disasm_fmul(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("fmul", format!("r{},r{}", rd3(cmd), rr3(cmd)), "Fractional Multiply Unsigned")
}
pub static FMUL: Descriptor = Descriptor {
    pattern: 0x0308, mask: 0xFF88, mnemonic: "FMUL", description: "Fractional Multiply Unsigned",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_fmul, disasm: disasm_fmul, xref: no_xref,
};

fn exec_fmuls(mcu: &mut Mcu, cmd: u16) {
    let d = rd3(cmd);
    let r = rr3(cmd);
    let a = mcu.reg(d) as i8 as i16 as u16;
    let b = mcu.reg(r) as i8 as i16 as u16;
    let (res, f) = fmul_flags_and_result(a, b);
    mcu.set_reg(0, res as u8);
    mcu.set_reg(1, (res >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, f);
}
fn disasm_fmuls(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("fmuls", format!("r{},r{}", rd3(cmd), rr3(cmd)), "Fractional Multiply Signed")
}
pub static FMULS: Descriptor = Descriptor {
    pattern: 0x0380, mask: 0xFF88, mnemonic: "FMULS", description: "Fractional Multiply Signed",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_fmuls, disasm: disasm_fmuls, xref: no_xref,
};

fn exec_fmulsu(mcu: &mut Mcu, cmd: u16) {
    let d = rd3(cmd);
    let r = rr3(cmd);
    let a = mcu.reg(d) as i8 as i16 as u16;
    let b = mcu.reg(r) as u16;
    let (res, f) = fmul_flags_and_result(a, b);
    mcu.set_reg(0, res as u8);
    mcu.set_reg(1, (res >> 8) as u8);
    mcu.apply_flags(AFFECTED_MUL, f);
}
fn disasm_fmulsu(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("fmulsu", format!("r{},r{}", rd3(cmd), rr3(cmd)), "Fractional Multiply Signed with Unsigned")
}
pub static FMULSU: Descriptor = Descriptor {
    pattern: 0x0388, mask: 0xFF88, mnemonic: "FMULSU", description: "Fractional Multiply Signed with Unsigned",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_fmulsu, disasm: disasm_fmulsu, xref: no_xref,
};

/// DES models one simplified XOR/rotate round (key bytes from R8..R15
/// applied to R0..R7); it does not reproduce the real AVR DES cipher
/// round function bit-for-bit. XMEGA-only.
fn exec_des(mcu: &mut Mcu, cmd: u16) {
    let round = ((cmd >> 4) & 0x0f) as u32;
    for i in 0..8 {
        let b = mcu.reg(i);
        let key = mcu.reg(8 + i);
        mcu.set_reg(i, b ^ key.rotate_left(round % 8));
    }
    mcu.set_flag(Sreg::H, round == 15);
}
fn disasm_des(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("des", format!("0x{:x}", (cmd >> 4) & 0x0f), "Data Encryption (simplified)")
}
pub static DES: Descriptor = Descriptor {
    pattern: 0x940B, mask: 0xFF0F, mnemonic: "DES", description: "Data Encryption (simplified)",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_des, disasm: disasm_des, xref: no_xref,
};

// ---------------------------------------------------------------------
// Branch / control flow
// ---------------------------------------------------------------------

fn exec_rjmp(mcu: &mut Mcu, cmd: u16) {
    let k = k12(cmd) as i64;
    let fw = mcu.flash_words();
    mcu.pc = wrap_word(mcu.pc as i64 + k, fw);
}
fn disasm_rjmp(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("rjmp", format!(".{:+}", k12(cmd)), "Relative Jump")
}
fn xref_rjmp(cmd: u16, _c2: Option<u16>, pc: u32, fw: u32) -> Option<(XrefType, u32)> {
    Some((XrefType::JMP, wrap_word(pc as i64 + 1 + k12(cmd) as i64, fw)))
}
pub static RJMP: Descriptor = Descriptor {
    pattern: 0xC000, mask: 0xF000, mnemonic: "RJMP", description: "Relative Jump",
    size: 1, is_jump: true, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_rjmp, disasm: disasm_rjmp, xref: xref_rjmp,
};

fn exec_ijmp(mcu: &mut Mcu, _cmd: u16) {
    mcu.pc = mcu.pair(30) as u32;
}
fn disasm_ijmp(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ijmp", String::new(), "Indirect Jump to Z")
}
pub static IJMP: Descriptor = Descriptor {
    pattern: 0x9409, mask: 0xFFFF, mnemonic: "IJMP", description: "Indirect Jump to Z",
    size: 1, is_jump: true, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ijmp, disasm: disasm_ijmp, xref: no_xref,
};

fn exec_eijmp(mcu: &mut Mcu, _cmd: u16) {
    mcu.pc = ((mcu.eind() as u32) << 16) | mcu.pair(30) as u32;
}
fn disasm_eijmp(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("eijmp", String::new(), "Extended Indirect Jump")
}
pub static EIJMP: Descriptor = Descriptor {
    pattern: 0x9419, mask: 0xFFFF, mnemonic: "EIJMP", description: "Extended Indirect Jump",
    size: 1, is_jump: true, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_eijmp, disasm: disasm_eijmp, xref: no_xref,
};

fn exec_jmp(mcu: &mut Mcu, cmd: u16) {
    let hi = k22_high(cmd);
    let lo = mcu.program_next() as u32;
    mcu.pc = hi | lo;
}
fn disasm_jmp(cmd: u16, c2: Option<u16>) -> String {
    let target = k22_high(cmd) | c2.unwrap_or(0) as u32;
    fmt2("jmp", format!("0x{:05x}", target), "Jump")
}
fn xref_jmp(cmd: u16, c2: Option<u16>, _pc: u32, _fw: u32) -> Option<(XrefType, u32)> {
    c2.map(|w2| (XrefType::JMP, k22_high(cmd) | w2 as u32))
}
pub static JMP: Descriptor = Descriptor {
    pattern: 0x940C, mask: 0xFE0E, mnemonic: "JMP", description: "Jump",
    size: 2, is_jump: true, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_jmp, disasm: disasm_jmp, xref: xref_jmp,
};

fn exec_rcall(mcu: &mut Mcu, cmd: u16) {
    let k = k12(cmd) as i64;
    let fw = mcu.flash_words();
    mcu.push_pc();
    mcu.pc = wrap_word(mcu.pc as i64 + k, fw);
}
fn disasm_rcall(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("rcall", format!(".{:+}", k12(cmd)), "Relative Call")
}
fn xref_rcall(cmd: u16, _c2: Option<u16>, pc: u32, fw: u32) -> Option<(XrefType, u32)> {
    Some((XrefType::CALL, wrap_word(pc as i64 + 1 + k12(cmd) as i64, fw)))
}
pub static RCALL: Descriptor = Descriptor {
    pattern: 0xD000, mask: 0xF000, mnemonic: "RCALL", description: "Relative Call",
    size: 1, is_jump: false, is_branch: false, is_call: true, is_return: false,
    ticks: 3, execute: exec_rcall, disasm: disasm_rcall, xref: xref_rcall,
};

fn exec_icall(mcu: &mut Mcu, _cmd: u16) {
    let target = mcu.pair(30) as u32;
    mcu.push_pc();
    mcu.pc = target;
}
fn disasm_icall(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("icall", String::new(), "Indirect Call to Z")
}
pub static ICALL: Descriptor = Descriptor {
    pattern: 0x9509, mask: 0xFFFF, mnemonic: "ICALL", description: "Indirect Call to Z",
    size: 1, is_jump: false, is_branch: false, is_call: true, is_return: false,
    ticks: 3, execute: exec_icall, disasm: disasm_icall, xref: no_xref,
};

fn exec_eicall(mcu: &mut Mcu, _cmd: u16) {
    let target = ((mcu.eind() as u32) << 16) | mcu.pair(30) as u32;
    mcu.push_pc();
    mcu.pc = target;
}
fn disasm_eicall(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("eicall", String::new(), "Extended Indirect Call")
}
pub static EICALL: Descriptor = Descriptor {
    pattern: 0x9519, mask: 0xFFFF, mnemonic: "EICALL", description: "Extended Indirect Call",
    size: 1, is_jump: false, is_branch: false, is_call: true, is_return: false,
    ticks: 3, execute: exec_eicall, disasm: disasm_eicall, xref: no_xref,
};

fn exec_call(mcu: &mut Mcu, cmd: u16) {
    let hi = k22_high(cmd);
    let lo = mcu.program_next() as u32;
    let target = hi | lo;
    mcu.push_pc();
    mcu.pc = target;
}
fn disasm_call(cmd: u16, c2: Option<u16>) -> String {
    let target = k22_high(cmd) | c2.unwrap_or(0) as u32;
    fmt2("call", format!("0x{:05x}", target), "Call")
}
fn xref_call(cmd: u16, c2: Option<u16>, _pc: u32, _fw: u32) -> Option<(XrefType, u32)> {
    c2.map(|w2| (XrefType::CALL, k22_high(cmd) | w2 as u32))
}
pub static CALL: Descriptor = Descriptor {
    pattern: 0x940E, mask: 0xFE0E, mnemonic: "CALL", description: "Call",
    size: 2, is_jump: false, is_branch: false, is_call: true, is_return: false,
    ticks: 4, execute: exec_call, disasm: disasm_call, xref: xref_call,
};

fn exec_ret(mcu: &mut Mcu, _cmd: u16) {
    mcu.pop_pc();
}
fn disasm_ret(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ret", String::new(), "Return from Subroutine")
}
pub static RET: Descriptor = Descriptor {
    pattern: 0x9508, mask: 0xFFFF, mnemonic: "RET", description: "Return from Subroutine",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: true,
    ticks: 4, execute: exec_ret, disasm: disasm_ret, xref: no_xref,
};

fn exec_reti(mcu: &mut Mcu, _cmd: u16) {
    mcu.pop_pc();
    mcu.set_flag(Sreg::I, true);
}
fn disasm_reti(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("reti", String::new(), "Return from Interrupt")
}
pub static RETI: Descriptor = Descriptor {
    pattern: 0x9518, mask: 0xFFFF, mnemonic: "RETI", description: "Return from Interrupt",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: true,
    ticks: 4, execute: exec_reti, disasm: disasm_reti, xref: no_xref,
};

fn exec_cpse(mcu: &mut Mcu, cmd: u16) {
    if mcu.reg(rd5(cmd)) == mcu.reg(rr5(cmd)) {
        mcu.skip();
    }
}
fn disasm_cpse(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("cpse", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Compare, Skip if Equal")
}
pub static CPSE: Descriptor = Descriptor {
    pattern: 0x1000, mask: 0xFC00, mnemonic: "CPSE", description: "Compare, Skip if Equal",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_cpse, disasm: disasm_cpse, xref: no_xref,
};

fn exec_cp(mcu: &mut Mcu, cmd: u16) {
    let (_, flags) = crate::fields::sub_flags(mcu.reg(rd5(cmd)), mcu.reg(rr5(cmd)), 0);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_cp(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("cp", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Compare")
}
pub static CP: Descriptor = Descriptor {
    pattern: 0x1400, mask: 0xFC00, mnemonic: "CP", description: "Compare",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_cp, disasm: disasm_cp, xref: no_xref,
};

fn exec_cpc(mcu: &mut Mcu, cmd: u16) {
    let prev_z = mcu.flag(Sreg::Z);
    let (res, mut flags) = crate::fields::sub_flags(mcu.reg(rd5(cmd)), mcu.reg(rr5(cmd)), mcu.flag(Sreg::C) as u8);
    flags.set(Sreg::Z, res == 0 && prev_z);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_cpc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("cpc", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Compare with Carry")
}
pub static CPC: Descriptor = Descriptor {
    pattern: 0x0400, mask: 0xFC00, mnemonic: "CPC", description: "Compare with Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_cpc, disasm: disasm_cpc, xref: no_xref,
};

fn exec_cpi(mcu: &mut Mcu, cmd: u16) {
    let (_, flags) = crate::fields::sub_flags(mcu.reg(rd4(cmd)), k8(cmd), 0);
    mcu.apply_flags(AFFECTED_ADD, flags);
}
fn disasm_cpi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("cpi", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Compare with Immediate")
}
pub static CPI: Descriptor = Descriptor {
    pattern: 0x3000, mask: 0xF000, mnemonic: "CPI", description: "Compare with Immediate",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_cpi, disasm: disasm_cpi, xref: no_xref,
};

fn exec_sbrc(mcu: &mut Mcu, cmd: u16) {
    if mcu.reg(rr5(cmd)) & (1 << bit3(cmd)) == 0 {
        mcu.skip();
    }
}
fn disasm_sbrc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbrc", format!("r{},{}", rr5(cmd), bit3(cmd)), "Skip if Bit in Register Cleared")
}
pub static SBRC: Descriptor = Descriptor {
    pattern: 0xFC00, mask: 0xFE08, mnemonic: "SBRC", description: "Skip if Bit in Register Cleared",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbrc, disasm: disasm_sbrc, xref: no_xref,
};

fn exec_sbrs(mcu: &mut Mcu, cmd: u16) {
    if mcu.reg(rr5(cmd)) & (1 << bit3(cmd)) != 0 {
        mcu.skip();
    }
}
fn disasm_sbrs(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbrs", format!("r{},{}", rr5(cmd), bit3(cmd)), "Skip if Bit in Register Set")
}
pub static SBRS: Descriptor = Descriptor {
    pattern: 0xFE00, mask: 0xFE08, mnemonic: "SBRS", description: "Skip if Bit in Register Set",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbrs, disasm: disasm_sbrs, xref: no_xref,
};

fn exec_sbic(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr5(cmd) as u32);
    if mcu.data(addr) & (1 << bit3(cmd)) == 0 {
        mcu.skip();
    }
}
fn disasm_sbic(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbic", format!("0x{:02x},{}", io_addr5(cmd), bit3(cmd)), "Skip if Bit in I/O Register Cleared")
}
pub static SBIC: Descriptor = Descriptor {
    pattern: 0x9900, mask: 0xFF00, mnemonic: "SBIC", description: "Skip if Bit in I/O Register Cleared",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbic, disasm: disasm_sbic, xref: no_xref,
};

fn exec_sbis(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr5(cmd) as u32);
    if mcu.data(addr) & (1 << bit3(cmd)) != 0 {
        mcu.skip();
    }
}
fn disasm_sbis(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbis", format!("0x{:02x},{}", io_addr5(cmd), bit3(cmd)), "Skip if Bit in I/O Register Set")
}
pub static SBIS: Descriptor = Descriptor {
    pattern: 0x9B00, mask: 0xFF00, mnemonic: "SBIS", description: "Skip if Bit in I/O Register Set",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sbis, disasm: disasm_sbis, xref: no_xref,
};

fn sreg_bit_name(s: u8) -> &'static str {
    match s {
        0 => "c", 1 => "z", 2 => "n", 3 => "v", 4 => "s", 5 => "h", 6 => "t", 7 => "i",
        _ => "?",
    }
}

fn exec_brbs(mcu: &mut Mcu, cmd: u16) {
    let bit = sbit(cmd);
    if mcu.sreg().bits() & (1 << bit) != 0 {
        let k = k7(cmd) as i64;
        let fw = mcu.flash_words();
        mcu.pc = wrap_word(mcu.pc as i64 + k, fw);
    }
}
fn disasm_brbs(cmd: u16, _c2: Option<u16>) -> String {
    fmt2(&format!("br{}s", sreg_bit_name(sbit(cmd))), format!(".{:+}", k7(cmd)), "Branch if Status Flag Set")
}
fn xref_brbs(cmd: u16, _c2: Option<u16>, pc: u32, fw: u32) -> Option<(XrefType, u32)> {
    Some((XrefType::JMP, wrap_word(pc as i64 + 1 + k7(cmd) as i64, fw)))
}
pub static BRBS: Descriptor = Descriptor {
    pattern: 0xF000, mask: 0xFC00, mnemonic: "BRBS", description: "Branch if Status Flag Set",
    size: 1, is_jump: true, is_branch: true, is_call: false, is_return: false,
    ticks: 1, execute: exec_brbs, disasm: disasm_brbs, xref: xref_brbs,
};

fn exec_brbc(mcu: &mut Mcu, cmd: u16) {
    let bit = sbit(cmd);
    if mcu.sreg().bits() & (1 << bit) == 0 {
        let k = k7(cmd) as i64;
        let fw = mcu.flash_words();
        mcu.pc = wrap_word(mcu.pc as i64 + k, fw);
    }
}
fn disasm_brbc(cmd: u16, _c2: Option<u16>) -> String {
    fmt2(&format!("br{}c", sreg_bit_name(sbit(cmd))), format!(".{:+}", k7(cmd)), "Branch if Status Flag Clear")
}
fn xref_brbc(cmd: u16, _c2: Option<u16>, pc: u32, fw: u32) -> Option<(XrefType, u32)> {
    Some((XrefType::JMP, wrap_word(pc as i64 + 1 + k7(cmd) as i64, fw)))
}
pub static BRBC: Descriptor = Descriptor {
    pattern: 0xF400, mask: 0xFC00, mnemonic: "BRBC", description: "Branch if Status Flag Clear",
    size: 1, is_jump: true, is_branch: true, is_call: false, is_return: false,
    ticks: 1, execute: exec_brbc, disasm: disasm_brbc, xref: xref_brbc,
};

// ---------------------------------------------------------------------
// Data transfer
// ---------------------------------------------------------------------

fn exec_mov(mcu: &mut Mcu, cmd: u16) {
    let v = mcu.reg(rr5(cmd));
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_mov(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("mov", format!("r{},r{}", rd5(cmd), rr5(cmd)), "Copy Register")
}
pub static MOV: Descriptor = Descriptor {
    pattern: 0x2C00, mask: 0xFC00, mnemonic: "MOV", description: "Copy Register",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_mov, disasm: disasm_mov, xref: no_xref,
};

fn exec_movw(mcu: &mut Mcu, cmd: u16) {
    let d = (((cmd >> 4) & 0x0f) * 2) as usize;
    let r = ((cmd & 0x0f) * 2) as usize;
    let v = mcu.pair(r);
    mcu.set_pair(d, v);
}
fn disasm_movw(cmd: u16, _c2: Option<u16>) -> String {
    let d = ((cmd >> 4) & 0x0f) * 2;
    let r = (cmd & 0x0f) * 2;
    fmt2("movw", format!("r{},r{}", d, r), "Copy Register Pair")
}
pub static MOVW: Descriptor = Descriptor {
    pattern: 0x0100, mask: 0xFF00, mnemonic: "MOVW", description: "Copy Register Pair",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_movw, disasm: disasm_movw, xref: no_xref,
};

fn exec_ldi(mcu: &mut Mcu, cmd: u16) {
    mcu.set_reg(rd4(cmd), k8(cmd));
}
fn disasm_ldi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ldi", format!("r{},0x{:02x}", rd4(cmd), k8(cmd)), "Load Immediate")
}
pub static LDI: Descriptor = Descriptor {
    pattern: 0xE000, mask: 0xF000, mnemonic: "LDI", description: "Load Immediate",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_ldi, disasm: disasm_ldi, xref: no_xref,
};

fn exec_lds(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.program_next() as u32;
    let v = mcu.data(addr);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_lds(cmd: u16, c2: Option<u16>) -> String {
    fmt2("lds", format!("r{},0x{:04x}", rd5(cmd), c2.unwrap_or(0)), "Load Direct from Data Space")
}
fn xref_lds(_cmd: u16, c2: Option<u16>, _pc: u32, _fw: u32) -> Option<(XrefType, u32)> {
    c2.map(|w| (XrefType::DATA, w as u32))
}
pub static LDS: Descriptor = Descriptor {
    pattern: 0x9000, mask: 0xFE0F, mnemonic: "LDS", description: "Load Direct from Data Space",
    size: 2, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_lds, disasm: disasm_lds, xref: xref_lds,
};

fn exec_sts(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.program_next() as u32;
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(addr, v);
}
fn disasm_sts(cmd: u16, c2: Option<u16>) -> String {
    fmt2("sts", format!("0x{:04x},r{}", c2.unwrap_or(0), rd5(cmd)), "Store Direct to Data Space")
}
fn xref_sts(_cmd: u16, c2: Option<u16>, _pc: u32, _fw: u32) -> Option<(XrefType, u32)> {
    c2.map(|w| (XrefType::DATA, w as u32))
}
pub static STS: Descriptor = Descriptor {
    pattern: 0x9200, mask: 0xFE0F, mnemonic: "STS", description: "Store Direct to Data Space",
    size: 2, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sts, disasm: disasm_sts, xref: xref_sts,
};

fn exec_ldx1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldx1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},X", rd5(cmd)), "Load Indirect via X")
}
pub static LDX1: Descriptor = Descriptor {
    pattern: 0x900C, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via X",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldx1, disasm: disasm_ldx1, xref: no_xref,
};

fn exec_ldx2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
    mcu.set_pair(26, p.wrapping_add(1));
}
fn disasm_ldx2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},X+", rd5(cmd)), "Load Indirect via X, Post-Increment")
}
pub static LDX2: Descriptor = Descriptor {
    pattern: 0x900D, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via X, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldx2, disasm: disasm_ldx2, xref: no_xref,
};

fn exec_ldx3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26).wrapping_sub(1);
    mcu.set_pair(26, p);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldx3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},-X", rd5(cmd)), "Load Indirect via X, Pre-Decrement")
}
pub static LDX3: Descriptor = Descriptor {
    pattern: 0x900E, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via X, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldx3, disasm: disasm_ldx3, xref: no_xref,
};

fn exec_ldy1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldy1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},Y", rd5(cmd)), "Load Indirect via Y")
}
pub static LDY1: Descriptor = Descriptor {
    pattern: 0x8008, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Y",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldy1, disasm: disasm_ldy1, xref: no_xref,
};

fn exec_ldy2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
    mcu.set_pair(28, p.wrapping_add(1));
}
fn disasm_ldy2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},Y+", rd5(cmd)), "Load Indirect via Y, Post-Increment")
}
pub static LDY2: Descriptor = Descriptor {
    pattern: 0x9009, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Y, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldy2, disasm: disasm_ldy2, xref: no_xref,
};

fn exec_ldy3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28).wrapping_sub(1);
    mcu.set_pair(28, p);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldy3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},-Y", rd5(cmd)), "Load Indirect via Y, Pre-Decrement")
}
pub static LDY3: Descriptor = Descriptor {
    pattern: 0x900A, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Y, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldy3, disasm: disasm_ldy3, xref: no_xref,
};

fn exec_ldy4(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28).wrapping_add(q6(cmd));
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldy4(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ldd", format!("r{},Y+{}", rd5(cmd), q6(cmd)), "Load Indirect via Y with Displacement")
}
pub static LDY4: Descriptor = Descriptor {
    pattern: 0x8008, mask: 0xD208, mnemonic: "LDD", description: "Load Indirect via Y with Displacement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldy4, disasm: disasm_ldy4, xref: no_xref,
};

fn exec_ldz1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldz1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},Z", rd5(cmd)), "Load Indirect via Z")
}
pub static LDZ1: Descriptor = Descriptor {
    pattern: 0x8000, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Z",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldz1, disasm: disasm_ldz1, xref: no_xref,
};

fn exec_ldz2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
    mcu.set_pair(30, p.wrapping_add(1));
}
fn disasm_ldz2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},Z+", rd5(cmd)), "Load Indirect via Z, Post-Increment")
}
pub static LDZ2: Descriptor = Descriptor {
    pattern: 0x9001, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Z, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldz2, disasm: disasm_ldz2, xref: no_xref,
};

fn exec_ldz3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30).wrapping_sub(1);
    mcu.set_pair(30, p);
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldz3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ld", format!("r{},-Z", rd5(cmd)), "Load Indirect via Z, Pre-Decrement")
}
pub static LDZ3: Descriptor = Descriptor {
    pattern: 0x9002, mask: 0xFE0F, mnemonic: "LD", description: "Load Indirect via Z, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldz3, disasm: disasm_ldz3, xref: no_xref,
};

fn exec_ldz4(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30).wrapping_add(q6(cmd));
    let v = mcu.data(p as u32);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_ldz4(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ldd", format!("r{},Z+{}", rd5(cmd), q6(cmd)), "Load Indirect via Z with Displacement")
}
pub static LDZ4: Descriptor = Descriptor {
    pattern: 0x8000, mask: 0xD208, mnemonic: "LDD", description: "Load Indirect via Z with Displacement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_ldz4, disasm: disasm_ldz4, xref: no_xref,
};

fn exec_stx1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_stx1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("X,r{}", rd5(cmd)), "Store Indirect via X")
}
pub static STX1: Descriptor = Descriptor {
    pattern: 0x920C, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via X",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stx1, disasm: disasm_stx1, xref: no_xref,
};

fn exec_stx2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
    mcu.set_pair(26, p.wrapping_add(1));
}
fn disasm_stx2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("X+,r{}", rd5(cmd)), "Store Indirect via X, Post-Increment")
}
pub static STX2: Descriptor = Descriptor {
    pattern: 0x920D, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via X, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stx2, disasm: disasm_stx2, xref: no_xref,
};

fn exec_stx3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(26).wrapping_sub(1);
    mcu.set_pair(26, p);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_stx3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("-X,r{}", rd5(cmd)), "Store Indirect via X, Pre-Decrement")
}
pub static STX3: Descriptor = Descriptor {
    pattern: 0x920E, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via X, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stx3, disasm: disasm_stx3, xref: no_xref,
};

fn exec_sty1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_sty1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("Y,r{}", rd5(cmd)), "Store Indirect via Y")
}
pub static STY1: Descriptor = Descriptor {
    pattern: 0x8208, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Y",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sty1, disasm: disasm_sty1, xref: no_xref,
};

fn exec_sty2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
    mcu.set_pair(28, p.wrapping_add(1));
}
fn disasm_sty2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("Y+,r{}", rd5(cmd)), "Store Indirect via Y, Post-Increment")
}
pub static STY2: Descriptor = Descriptor {
    pattern: 0x9209, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Y, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sty2, disasm: disasm_sty2, xref: no_xref,
};

fn exec_sty3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28).wrapping_sub(1);
    mcu.set_pair(28, p);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_sty3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("-Y,r{}", rd5(cmd)), "Store Indirect via Y, Pre-Decrement")
}
pub static STY3: Descriptor = Descriptor {
    pattern: 0x920A, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Y, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sty3, disasm: disasm_sty3, xref: no_xref,
};

fn exec_sty4(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(28).wrapping_add(q6(cmd));
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_sty4(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("std", format!("Y+{},r{}", q6(cmd), rd5(cmd)), "Store Indirect via Y with Displacement")
}
pub static STY4: Descriptor = Descriptor {
    pattern: 0x8208, mask: 0xD208, mnemonic: "STD", description: "Store Indirect via Y with Displacement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sty4, disasm: disasm_sty4, xref: no_xref,
};

fn exec_stz1(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_stz1(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("Z,r{}", rd5(cmd)), "Store Indirect via Z")
}
pub static STZ1: Descriptor = Descriptor {
    pattern: 0x8200, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Z",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stz1, disasm: disasm_stz1, xref: no_xref,
};

fn exec_stz2(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
    mcu.set_pair(30, p.wrapping_add(1));
}
fn disasm_stz2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("Z+,r{}", rd5(cmd)), "Store Indirect via Z, Post-Increment")
}
pub static STZ2: Descriptor = Descriptor {
    pattern: 0x9201, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Z, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stz2, disasm: disasm_stz2, xref: no_xref,
};

fn exec_stz3(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30).wrapping_sub(1);
    mcu.set_pair(30, p);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_stz3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("st", format!("-Z,r{}", rd5(cmd)), "Store Indirect via Z, Pre-Decrement")
}
pub static STZ3: Descriptor = Descriptor {
    pattern: 0x9202, mask: 0xFE0F, mnemonic: "ST", description: "Store Indirect via Z, Pre-Decrement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stz3, disasm: disasm_stz3, xref: no_xref,
};

fn exec_stz4(mcu: &mut Mcu, cmd: u16) {
    let p = mcu.pair(30).wrapping_add(q6(cmd));
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(p as u32, v);
}
fn disasm_stz4(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("std", format!("Z+{},r{}", q6(cmd), rd5(cmd)), "Store Indirect via Z with Displacement")
}
pub static STZ4: Descriptor = Descriptor {
    pattern: 0x8200, mask: 0xD208, mnemonic: "STD", description: "Store Indirect via Z with Displacement",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_stz4, disasm: disasm_stz4, xref: no_xref,
};

fn exec_lpm1(mcu: &mut Mcu, _cmd: u16) {
    let z = mcu.pair(30) as u32;
    let v = mcu.program_byte(z);
    mcu.set_reg(0, v);
}
fn disasm_lpm1(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lpm", String::new(), "Load Program Memory (implicit R0,Z)")
}
pub static LPM1: Descriptor = Descriptor {
    pattern: 0x95C8, mask: 0xFFFF, mnemonic: "LPM", description: "Load Program Memory (implicit R0,Z)",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_lpm1, disasm: disasm_lpm1, xref: no_xref,
};

fn exec_lpm2(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let v = mcu.program_byte(z);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_lpm2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lpm", format!("r{},Z", rd5(cmd)), "Load Program Memory")
}
pub static LPM2: Descriptor = Descriptor {
    pattern: 0x9004, mask: 0xFE0F, mnemonic: "LPM", description: "Load Program Memory",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_lpm2, disasm: disasm_lpm2, xref: no_xref,
};

fn exec_lpm3(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let v = mcu.program_byte(z);
    mcu.set_reg(rd5(cmd), v);
    mcu.set_pair(30, (z as u16).wrapping_add(1));
}
fn disasm_lpm3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lpm", format!("r{},Z+", rd5(cmd)), "Load Program Memory, Post-Increment")
}
pub static LPM3: Descriptor = Descriptor {
    pattern: 0x9005, mask: 0xFE0F, mnemonic: "LPM", description: "Load Program Memory, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_lpm3, disasm: disasm_lpm3, xref: no_xref,
};

fn elpm_addr(mcu: &Mcu) -> u32 {
    ((mcu.rampz() as u32) << 16) | mcu.pair(30) as u32
}
fn elpm_advance_z(mcu: &mut Mcu) {
    let z = mcu.pair(30).wrapping_add(1);
    if z == 0 {
        mcu.set_rampz(mcu.rampz().wrapping_add(1));
    }
    mcu.set_pair(30, z);
}
fn exec_elpm1(mcu: &mut Mcu, _cmd: u16) {
    let addr = elpm_addr(mcu);
    let v = mcu.program_byte(addr);
    mcu.set_reg(0, v);
}
fn disasm_elpm1(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("elpm", String::new(), "Extended Load Program Memory (implicit R0,Z)")
}
pub static ELPM1: Descriptor = Descriptor {
    pattern: 0x95D8, mask: 0xFFFF, mnemonic: "ELPM", description: "Extended Load Program Memory (implicit R0,Z)",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_elpm1, disasm: disasm_elpm1, xref: no_xref,
};

fn exec_elpm2(mcu: &mut Mcu, cmd: u16) {
    let addr = elpm_addr(mcu);
    let v = mcu.program_byte(addr);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_elpm2(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("elpm", format!("r{},Z", rd5(cmd)), "Extended Load Program Memory")
}
pub static ELPM2: Descriptor = Descriptor {
    pattern: 0x9006, mask: 0xFE0F, mnemonic: "ELPM", description: "Extended Load Program Memory",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_elpm2, disasm: disasm_elpm2, xref: no_xref,
};

fn exec_elpm3(mcu: &mut Mcu, cmd: u16) {
    let addr = elpm_addr(mcu);
    let v = mcu.program_byte(addr);
    mcu.set_reg(rd5(cmd), v);
    elpm_advance_z(mcu);
}
fn disasm_elpm3(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("elpm", format!("r{},Z+", rd5(cmd)), "Extended Load Program Memory, Post-Increment")
}
pub static ELPM3: Descriptor = Descriptor {
    pattern: 0x9007, mask: 0xFE0F, mnemonic: "ELPM", description: "Extended Load Program Memory, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 3, execute: exec_elpm3, disasm: disasm_elpm3, xref: no_xref,
};

fn exec_spm1(mcu: &mut Mcu, _cmd: u16) {
    let z = mcu.pair(30) as u32 >> 1;
    let word = ((mcu.reg(1) as u16) << 8) | mcu.reg(0) as u16;
    mcu.set_program(z, word);
}
fn disasm_spm1(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("spm", String::new(), "Store Program Memory")
}
pub static SPM1: Descriptor = Descriptor {
    pattern: 0x95E8, mask: 0xFFFF, mnemonic: "SPM", description: "Store Program Memory",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_spm1, disasm: disasm_spm1, xref: no_xref,
};

fn exec_spm2(mcu: &mut Mcu, _cmd: u16) {
    let z = mcu.pair(30) as u32 >> 1;
    let word = ((mcu.reg(1) as u16) << 8) | mcu.reg(0) as u16;
    mcu.set_program(z, word);
    mcu.set_pair(30, mcu.pair(30).wrapping_add(2));
}
fn disasm_spm2(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("spm", "Z+".to_string(), "Store Program Memory, Post-Increment")
}
pub static SPM2: Descriptor = Descriptor {
    pattern: 0x95F8, mask: 0xFFFF, mnemonic: "SPM", description: "Store Program Memory, Post-Increment",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_spm2, disasm: disasm_spm2, xref: no_xref,
};

fn exec_in(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr6(cmd) as u32);
    let v = mcu.data(addr);
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_in(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("in", format!("r{},0x{:02x}", rd5(cmd), io_addr6(cmd)), "In Port")
}
pub static IN: Descriptor = Descriptor {
    pattern: 0xB000, mask: 0xF800, mnemonic: "IN", description: "In Port",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_in, disasm: disasm_in, xref: no_xref,
};

fn exec_out(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr6(cmd) as u32);
    let v = mcu.reg(rd5(cmd));
    mcu.set_data(addr, v);
}
fn disasm_out(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("out", format!("0x{:02x},r{}", io_addr6(cmd), rd5(cmd)), "Out Port")
}
pub static OUT: Descriptor = Descriptor {
    pattern: 0xB800, mask: 0xF800, mnemonic: "OUT", description: "Out Port",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_out, disasm: disasm_out, xref: no_xref,
};

fn exec_push(mcu: &mut Mcu, cmd: u16) {
    let v = mcu.reg(rd5(cmd));
    mcu.push(v);
}
fn disasm_push(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("push", format!("r{}", rd5(cmd)), "Push Register on Stack")
}
pub static PUSH: Descriptor = Descriptor {
    pattern: 0x920F, mask: 0xFE0F, mnemonic: "PUSH", description: "Push Register on Stack",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_push, disasm: disasm_push, xref: no_xref,
};

fn exec_pop(mcu: &mut Mcu, cmd: u16) {
    let v = mcu.pop();
    mcu.set_reg(rd5(cmd), v);
}
fn disasm_pop(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("pop", format!("r{}", rd5(cmd)), "Pop Register from Stack")
}
pub static POP: Descriptor = Descriptor {
    pattern: 0x900F, mask: 0xFE0F, mnemonic: "POP", description: "Pop Register from Stack",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_pop, disasm: disasm_pop, xref: no_xref,
};

fn exec_xch(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let d = rd5(cmd);
    let old = mcu.data(z);
    let rd = mcu.reg(d);
    mcu.set_data(z, rd);
    mcu.set_reg(d, old);
}
fn disasm_xch(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("xch", format!("Z,r{}", rd5(cmd)), "Exchange")
}
pub static XCH: Descriptor = Descriptor {
    pattern: 0x9204, mask: 0xFE0F, mnemonic: "XCH", description: "Exchange",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_xch, disasm: disasm_xch, xref: no_xref,
};

fn exec_las(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let d = rd5(cmd);
    let old = mcu.data(z);
    let rd = mcu.reg(d);
    mcu.set_data(z, old | rd);
    mcu.set_reg(d, old);
}
fn disasm_las(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("las", format!("Z,r{}", rd5(cmd)), "Load and Set")
}
pub static LAS: Descriptor = Descriptor {
    pattern: 0x9205, mask: 0xFE0F, mnemonic: "LAS", description: "Load and Set",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_las, disasm: disasm_las, xref: no_xref,
};

fn exec_lac(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let d = rd5(cmd);
    let old = mcu.data(z);
    let rd = mcu.reg(d);
    mcu.set_data(z, old & !rd);
    mcu.set_reg(d, old);
}
fn disasm_lac(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lac", format!("Z,r{}", rd5(cmd)), "Load and Clear")
}
pub static LAC: Descriptor = Descriptor {
    pattern: 0x9206, mask: 0xFE0F, mnemonic: "LAC", description: "Load and Clear",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_lac, disasm: disasm_lac, xref: no_xref,
};

fn exec_lat(mcu: &mut Mcu, cmd: u16) {
    let z = mcu.pair(30) as u32;
    let d = rd5(cmd);
    let old = mcu.data(z);
    let rd = mcu.reg(d);
    mcu.set_data(z, old ^ rd);
    mcu.set_reg(d, old);
}
fn disasm_lat(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lat", format!("Z,r{}", rd5(cmd)), "Load and Toggle")
}
pub static LAT: Descriptor = Descriptor {
    pattern: 0x9207, mask: 0xFE0F, mnemonic: "LAT", description: "Load and Toggle",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_lat, disasm: disasm_lat, xref: no_xref,
};

// ---------------------------------------------------------------------
// Bit and bit-test
// ---------------------------------------------------------------------

fn exec_lsr(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let old = mcu.reg(d);
    let r = old >> 1;
    mcu.set_reg(d, r);
    mcu.apply_flags(AFFECTED_SHIFT, crate::fields::shift_right_flags(old, r));
}
fn disasm_lsr(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("lsr", format!("r{}", rd5(cmd)), "Logical Shift Right")
}
pub static LSR: Descriptor = Descriptor {
    pattern: 0x9406, mask: 0xFE0F, mnemonic: "LSR", description: "Logical Shift Right",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_lsr, disasm: disasm_lsr, xref: no_xref,
};

fn exec_ror(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let old = mcu.reg(d);
    let c = mcu.flag(Sreg::C) as u8;
    let r = (old >> 1) | (c << 7);
    mcu.set_reg(d, r);
    mcu.apply_flags(AFFECTED_SHIFT, crate::fields::shift_right_flags(old, r));
}
fn disasm_ror(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("ror", format!("r{}", rd5(cmd)), "Rotate Right through Carry")
}
pub static ROR: Descriptor = Descriptor {
    pattern: 0x9407, mask: 0xFE0F, mnemonic: "ROR", description: "Rotate Right through Carry",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_ror, disasm: disasm_ror, xref: no_xref,
};

fn exec_asr(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let old = mcu.reg(d);
    let r = ((old as i8) >> 1) as u8;
    mcu.set_reg(d, r);
    mcu.apply_flags(AFFECTED_SHIFT, crate::fields::shift_right_flags(old, r));
}
fn disasm_asr(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("asr", format!("r{}", rd5(cmd)), "Arithmetic Shift Right")
}
pub static ASR: Descriptor = Descriptor {
    pattern: 0x9405, mask: 0xFE0F, mnemonic: "ASR", description: "Arithmetic Shift Right",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_asr, disasm: disasm_asr, xref: no_xref,
};

fn exec_swap(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let old = mcu.reg(d);
    mcu.set_reg(d, (old << 4) | (old >> 4));
}
fn disasm_swap(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("swap", format!("r{}", rd5(cmd)), "Swap Nibbles")
}
pub static SWAP: Descriptor = Descriptor {
    pattern: 0x9402, mask: 0xFE0F, mnemonic: "SWAP", description: "Swap Nibbles",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_swap, disasm: disasm_swap, xref: no_xref,
};

fn exec_bset(mcu: &mut Mcu, cmd: u16) {
    let s = sbit(cmd);
    let cur = mcu.sreg();
    mcu.set_sreg(Sreg::from_bits_truncate(cur.bits() | (1 << s)));
}
fn disasm_bset(cmd: u16, _c2: Option<u16>) -> String {
    fmt2(&format!("se{}", sreg_bit_name(sbit(cmd))), String::new(), "Set Flag")
}
pub static BSET: Descriptor = Descriptor {
    pattern: 0x9408, mask: 0xFF8F, mnemonic: "BSET", description: "Set Flag",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_bset, disasm: disasm_bset, xref: no_xref,
};

fn exec_bclr(mcu: &mut Mcu, cmd: u16) {
    let s = sbit(cmd);
    let cur = mcu.sreg();
    mcu.set_sreg(Sreg::from_bits_truncate(cur.bits() & !(1 << s)));
}
fn disasm_bclr(cmd: u16, _c2: Option<u16>) -> String {
    fmt2(&format!("cl{}", sreg_bit_name(sbit(cmd))), String::new(), "Clear Flag")
}
pub static BCLR: Descriptor = Descriptor {
    pattern: 0x9488, mask: 0xFF8F, mnemonic: "BCLR", description: "Clear Flag",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_bclr, disasm: disasm_bclr, xref: no_xref,
};

fn exec_sbi(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr5(cmd) as u32);
    let v = mcu.data(addr) | (1 << bit3(cmd));
    mcu.set_data(addr, v);
}
fn disasm_sbi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sbi", format!("0x{:02x},{}", io_addr5(cmd), bit3(cmd)), "Set Bit in I/O Register")
}
pub static SBI: Descriptor = Descriptor {
    pattern: 0x9A00, mask: 0xFF00, mnemonic: "SBI", description: "Set Bit in I/O Register",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_sbi, disasm: disasm_sbi, xref: no_xref,
};

fn exec_cbi(mcu: &mut Mcu, cmd: u16) {
    let addr = mcu.io_to_data_addr(io_addr5(cmd) as u32);
    let v = mcu.data(addr) & !(1 << bit3(cmd));
    mcu.set_data(addr, v);
}
fn disasm_cbi(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("cbi", format!("0x{:02x},{}", io_addr5(cmd), bit3(cmd)), "Clear Bit in I/O Register")
}
pub static CBI: Descriptor = Descriptor {
    pattern: 0x9800, mask: 0xFF00, mnemonic: "CBI", description: "Clear Bit in I/O Register",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 2, execute: exec_cbi, disasm: disasm_cbi, xref: no_xref,
};

fn exec_bst(mcu: &mut Mcu, cmd: u16) {
    let bit = mcu.reg(rd5(cmd)) & (1 << bit3(cmd)) != 0;
    mcu.set_flag(Sreg::T, bit);
}
fn disasm_bst(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("bst", format!("r{},{}", rd5(cmd), bit3(cmd)), "Bit Store from Register to T")
}
pub static BST: Descriptor = Descriptor {
    pattern: 0xFA00, mask: 0xFE08, mnemonic: "BST", description: "Bit Store from Register to T",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_bst, disasm: disasm_bst, xref: no_xref,
};

fn exec_bld(mcu: &mut Mcu, cmd: u16) {
    let d = rd5(cmd);
    let bit = bit3(cmd);
    let mut v = mcu.reg(d);
    if mcu.flag(Sreg::T) {
        v |= 1 << bit;
    } else {
        v &= !(1 << bit);
    }
    mcu.set_reg(d, v);
}
fn disasm_bld(cmd: u16, _c2: Option<u16>) -> String {
    fmt2("bld", format!("r{},{}", rd5(cmd), bit3(cmd)), "Bit Load from T to Register")
}
pub static BLD: Descriptor = Descriptor {
    pattern: 0xF800, mask: 0xFE08, mnemonic: "BLD", description: "Bit Load from T to Register",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_bld, disasm: disasm_bld, xref: no_xref,
};

// ---------------------------------------------------------------------
// MCU control
// ---------------------------------------------------------------------

fn exec_break(mcu: &mut Mcu, _cmd: u16) {
    mcu.verbose(crate::error::VerboseType::PROG_ERROR, "BREAK encountered".to_string());
}
fn disasm_break(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("break", String::new(), "Breakpoint (debugger trap)")
}
pub static BREAK: Descriptor = Descriptor {
    pattern: 0x9598, mask: 0xFFFF, mnemonic: "BREAK", description: "Breakpoint (debugger trap)",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_break, disasm: disasm_break, xref: no_xref,
};

fn exec_nop(_mcu: &mut Mcu, _cmd: u16) {}
fn disasm_nop(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("nop", String::new(), "No Operation")
}
pub static NOP: Descriptor = Descriptor {
    pattern: 0x0000, mask: 0xFFFF, mnemonic: "NOP", description: "No Operation",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_nop, disasm: disasm_nop, xref: no_xref,
};

fn exec_sleep(mcu: &mut Mcu, _cmd: u16) {
    mcu.verbose(crate::error::VerboseType::PROG_ERROR, "entering SLEEP (not simulated)".to_string());
}
fn disasm_sleep(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("sleep", String::new(), "Sleep")
}
pub static SLEEP: Descriptor = Descriptor {
    pattern: 0x9588, mask: 0xFFFF, mnemonic: "SLEEP", description: "Sleep",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_sleep, disasm: disasm_sleep, xref: no_xref,
};

fn exec_wdr(mcu: &mut Mcu, _cmd: u16) {
    mcu.verbose(crate::error::VerboseType::PROG_ERROR, "watchdog reset (not simulated)".to_string());
}
fn disasm_wdr(_cmd: u16, _c2: Option<u16>) -> String {
    fmt2("wdr", String::new(), "Watchdog Reset")
}
pub static WDR: Descriptor = Descriptor {
    pattern: 0x95A8, mask: 0xFFFF, mnemonic: "WDR", description: "Watchdog Reset",
    size: 1, is_jump: false, is_branch: false, is_call: false, is_return: false,
    ticks: 1, execute: exec_wdr, disasm: disasm_wdr, xref: no_xref,
};

/// Every descriptor this crate implements, in the order the chip factories
/// register them. The y/z-displacement (`LDD`/`STD`) forms are registered
/// *after* their zero-displacement siblings (`LD Rd,Y`/`ST Y,Rr` etc.) so
/// that first-wins dispatch-table construction resolves the documented
/// encoding overlap at q=0 in favor of the more specific instruction.
pub static ALL: &[&Descriptor] = &[
    &ADD, &ADC, &ADIW, &SUB, &SUBI, &SBC, &SBCI, &SBIW, &AND, &ANDI, &OR, &ORI, &EOR, &COM, &NEG, &INC, &DEC,
    &MUL, &MULS, &MULSU, &FMUL, &FMULS, &FMULSU, &DES,
    &RJMP, &IJMP, &EIJMP, &JMP, &RCALL, &ICALL, &EICALL, &CALL, &RET, &RETI, &CPSE, &CP, &CPC, &CPI, &SBRC, &SBRS,
    &SBIC, &SBIS, &BRBS, &BRBC,
    &MOV, &MOVW, &LDI, &LDS, &LDX1, &LDX2, &LDX3, &LDY1, &LDY2, &LDY3, &LDY4, &LDZ1, &LDZ2, &LDZ3, &LDZ4, &STS,
    &STX1, &STX2, &STX3, &STY1, &STY2, &STY3, &STY4, &STZ1, &STZ2, &STZ3, &STZ4,
    &LPM1, &LPM2, &LPM3, &ELPM1, &ELPM2, &ELPM3, &SPM1, &SPM2, &IN, &OUT, &PUSH, &POP, &XCH, &LAS, &LAC, &LAT,
    &LSR, &ROR, &ASR, &SWAP, &BSET, &BCLR, &SBI, &CBI, &BST, &BLD,
    &BREAK, &NOP, &SLEEP, &WDR,
];

/// Builds the 65,536-entry dispatch table from a chip's descriptor subset.
/// First registration wins, which is how the LDD/STD-vs-LD/ST q=0 overlap
/// documented on `ALL` resolves.
pub fn build_dispatch(descriptors: &[&'static Descriptor]) -> Vec<Option<&'static Descriptor>> {
    let mut table: Vec<Option<&'static Descriptor>> = vec![None; 0x10000];
    for descriptor in descriptors {
        let mut m: u32 = 0;
        loop {
            if (m as u16) & descriptor.mask == 0 {
                let cmd = descriptor.pattern | m as u16;
                if table[cmd as usize].is_none() {
                    table[cmd as usize] = Some(*descriptor);
                }
            }
            if m == 0xffff {
                break;
            }
            m += 1;
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chips::new_atany;

    #[test]
    fn dispatch_table_completeness() {
        let mcu = new_atany();
        for d in ALL {
            let mut found = false;
            let mut m: u32 = 0;
            loop {
                if (m as u16 & d.mask) == 0 {
                    let cmd = d.pattern | m as u16;
                    if let Some(resolved) = mcu.dispatch_lookup(cmd) {
                        if std::ptr::eq(resolved, *d) {
                            found = true;
                            break;
                        }
                    }
                }
                if m == 0xffff {
                    break;
                }
                m += 1;
            }
            assert!(found, "no opcode resolves to {}", d.mnemonic);
        }
    }

    #[test]
    fn ldy1_wins_over_ldy4_at_q0() {
        let mcu = new_atany();
        let resolved = mcu.dispatch_lookup(0x8008).expect("some descriptor");
        assert_eq!(resolved.mnemonic, "LD");
    }
}
