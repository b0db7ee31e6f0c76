// Status-register flag arithmetic.
//
// Every function here mirrors one datasheet boolean-equation table: given
// the inputs and the result of an 8-bit operation, derive C/H/V/N/Z/S.
// None of these touch Mcu state directly -- they're pure so the arithmetic
// can be unit-tested against the datasheet tables in isolation.

use bitflags::bitflags;

bitflags! {
    #[derive(Default)]
    pub struct Sreg: u8 {
        const C = 1 << 0;
        const Z = 1 << 1;
        const N = 1 << 2;
        const V = 1 << 3;
        const S = 1 << 4;
        const H = 1 << 5;
        const T = 1 << 6;
        const I = 1 << 7;
    }
}

/// Flags affected by ADD/ADC (C,Z,N,V,S,H). `carry_in` is 0 or 1.
pub fn add_flags(rd: u8, rr: u8, carry_in: u8) -> (u8, Sreg) {
    let r16 = rd as u16 + rr as u16 + carry_in as u16;
    let r = r16 as u8;
    let half = (rd & rr) | (rr & !r) | (!r & rd);
    let full_carry = (rd & rr) | (rr & !r) | (!r & rd);
    let overflow_bit = (rd & rr & !r) | (!rd & !rr & r);
    let mut f = Sreg::empty();
    if half & 0x08 != 0 {
        f |= Sreg::H;
    }
    if overflow_bit & 0x80 != 0 {
        f |= Sreg::V;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if full_carry & 0x80 != 0 {
        f |= Sreg::C;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    (r, f)
}

/// Flags affected by SUB/SBC/CP/CPC (C,Z,N,V,S,H). `carry_in` is 0 or 1.
pub fn sub_flags(rd: u8, rr: u8, carry_in: u8) -> (u8, Sreg) {
    let r16 = (rd as i16) - (rr as i16) - (carry_in as i16);
    let r = r16 as u8;
    let half = (!rd & rr) | (rr & r) | (r & !rd);
    let full_carry = (!rd & rr) | (rr & r) | (r & !rd);
    let overflow_bit = (rd & !rr & !r) | (!rd & rr & r);
    let mut f = Sreg::empty();
    if half & 0x08 != 0 {
        f |= Sreg::H;
    }
    if overflow_bit & 0x80 != 0 {
        f |= Sreg::V;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if full_carry & 0x80 != 0 {
        f |= Sreg::C;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    (r, f)
}

/// Flags for bitwise AND/OR/EOR (N,Z,S only; V is always cleared).
pub fn logic_flags(r: u8) -> Sreg {
    let mut f = Sreg::empty();
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if f.contains(Sreg::N) {
        f |= Sreg::S;
    }
    f
}

/// Flags for COM (one's complement): N,Z,S as usual, C unconditionally set.
pub fn com_flags(r: u8) -> Sreg {
    let mut f = logic_flags(r);
    f.remove(Sreg::V);
    f | Sreg::C
}

/// Flags for NEG (two's complement negate).
pub fn neg_flags(rd: u8, r: u8) -> Sreg {
    let half = r | !rd;
    let mut f = Sreg::empty();
    if half & 0x08 != 0 {
        f |= Sreg::H;
    }
    if r == 0x80 {
        f |= Sreg::V;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if r != 0 {
        f |= Sreg::C;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    f
}

/// Flags for INC (N,Z,S,V; V set iff result is 0x80; C is untouched by the caller).
pub fn inc_flags(r: u8) -> Sreg {
    let mut f = Sreg::empty();
    if r == 0x80 {
        f |= Sreg::V;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    f
}

/// Flags for DEC (N,Z,S,V; V set iff result is 0x7f; C is untouched by the caller).
pub fn dec_flags(r: u8) -> Sreg {
    let mut f = Sreg::empty();
    if r == 0x7f {
        f |= Sreg::V;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    f
}

/// Flags for LSR/ROR/ASR (single-bit right shifts: N,Z,C,V,S).
pub fn shift_right_flags(rd: u8, r: u8) -> Sreg {
    let mut f = Sreg::empty();
    if rd & 0x01 != 0 {
        f |= Sreg::C;
    }
    if r & 0x80 != 0 {
        f |= Sreg::N;
    }
    if r == 0 {
        f |= Sreg::Z;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::C) {
        f |= Sreg::V;
    }
    if f.contains(Sreg::N) != f.contains(Sreg::V) {
        f |= Sreg::S;
    }
    f
}

/// Flags for SWAP: none affected.
pub fn swap_flags() -> Sreg {
    Sreg::empty()
}

/// Flags for the MUL-family result (C,Z only; C is bit 2*N-1 of the product,
/// signedness already baked into the caller's widened multiplicands).
pub fn mul_flags(r16: u16) -> Sreg {
    let mut f = Sreg::empty();
    if r16 & 0x8000 != 0 {
        f |= Sreg::C;
    }
    if r16 == 0 {
        f |= Sreg::Z;
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_0x80_plus_0x80_sets_z_c_v() {
        let (r, f) = add_flags(0x80, 0x80, 0);
        assert_eq!(r, 0x00);
        assert!(f.contains(Sreg::Z));
        assert!(f.contains(Sreg::C));
        assert!(f.contains(Sreg::V));
        assert!(!f.contains(Sreg::N));
        assert!(!f.contains(Sreg::H));
        assert!(f.contains(Sreg::S));
    }

    #[test]
    fn sub_equal_operands_sets_z_clears_c() {
        let (r, f) = sub_flags(5, 5, 0);
        assert_eq!(r, 0);
        assert!(f.contains(Sreg::Z));
        assert!(!f.contains(Sreg::C));
    }

    #[test]
    fn com_always_sets_carry() {
        let r = !3u8;
        let f = com_flags(r);
        assert!(f.contains(Sreg::C));
    }

    #[test]
    fn neg_zero_sets_zero_not_carry() {
        let f = neg_flags(0, 0);
        assert!(f.contains(Sreg::Z));
        assert!(!f.contains(Sreg::C));
    }

    #[test]
    fn inc_0x7f_sets_overflow_not_zero() {
        let f = inc_flags(0x80);
        assert!(f.contains(Sreg::V));
        assert!(!f.contains(Sreg::Z));
    }
}
