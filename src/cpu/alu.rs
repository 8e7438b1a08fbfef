//! Scalar instruction handlers: formats 1.0 (three g.p. registers),
//! 1.1 (g.p. register and 16-bit immediate), 1.8 (two g.p. registers and an
//! 8-bit immediate) and 2.9 (three g.p. registers and a 32-bit immediate).

use super::{
    sign_extend, Interrupt, Thread, MSK_FLOAT_INVALID, MSK_OVERFL_FLOAT, MSK_OVERFL_I,
    MSK_OVERFL_SIGN, MSK_OVERFL_UNSIGN, RT_POINTER,
};

// ============================================================================
// Shared scalar arithmetic (also used by the wide-immediate handlers)
// ============================================================================

/// Add `parm[1] + parm[2]`, trapping on overflow when `num_contr` asks for it
pub fn add(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let b = t.parm[2];
    match t.operand_type {
        0..=3 => {
            let r = a.wrapping_add(b);
            if t.num_contr & MSK_OVERFL_I != 0 {
                let size_mask = t.size_mask();
                let sign_bit = (size_mask >> 1) + 1;
                // signed overflow if a and b have the same sign and the
                // result has the opposite sign
                if t.num_contr & MSK_OVERFL_SIGN != 0 && !(a ^ b) & (a ^ r) & sign_bit != 0 {
                    t.interrupt(Interrupt::OverflSign);
                } else if t.num_contr & MSK_OVERFL_UNSIGN != 0 && (r & size_mask) < (a & size_mask)
                {
                    t.interrupt(Interrupt::OverflUnsign);
                }
            }
            r
        }
        5 => {
            let r = f32::from_bits(a as u32) + f32::from_bits(b as u32);
            float32_result(t, r, a as u32, b as u32)
        }
        6 => {
            let r = f64::from_bits(a) + f64::from_bits(b);
            float64_result(t, r, a, b)
        }
        _ => {
            t.interrupt(Interrupt::InstIllegal);
            0
        }
    }
}

/// Subtract `parm[1] - parm[2]` with the same overflow policy as [`add`]
pub fn sub(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let b = t.parm[2];
    match t.operand_type {
        0..=3 => {
            let r = a.wrapping_sub(b);
            if t.num_contr & MSK_OVERFL_I != 0 {
                let size_mask = t.size_mask();
                let sign_bit = (size_mask >> 1) + 1;
                if t.num_contr & MSK_OVERFL_SIGN != 0 && (a ^ b) & (a ^ r) & sign_bit != 0 {
                    t.interrupt(Interrupt::OverflSign);
                } else if t.num_contr & MSK_OVERFL_UNSIGN != 0 && (r & size_mask) > (a & size_mask)
                {
                    t.interrupt(Interrupt::OverflUnsign);
                }
            }
            r
        }
        5 => {
            let r = f32::from_bits(a as u32) - f32::from_bits(b as u32);
            float32_result(t, r, a as u32, b as u32)
        }
        6 => {
            let r = f64::from_bits(a) - f64::from_bits(b);
            float64_result(t, r, a, b)
        }
        _ => {
            t.interrupt(Interrupt::InstIllegal);
            0
        }
    }
}

/// Multiply `parm[1] * parm[2]`; integer overflow is detected on the exact
/// widened product
pub fn mul(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let b = t.parm[2];
    match t.operand_type {
        0..=3 => {
            let r = a.wrapping_mul(b);
            if t.num_contr & MSK_OVERFL_I != 0 {
                let size_mask = t.size_mask();
                let wide = sign_extend(a, t.operand_type) as i128
                    * sign_extend(b, t.operand_type) as i128;
                let uwide = (a & size_mask) as u128 * (b & size_mask) as u128;
                if t.num_contr & MSK_OVERFL_SIGN != 0
                    && wide != sign_extend(r, t.operand_type) as i128
                {
                    t.interrupt(Interrupt::OverflSign);
                } else if t.num_contr & MSK_OVERFL_UNSIGN != 0 && uwide > size_mask as u128 {
                    t.interrupt(Interrupt::OverflUnsign);
                }
            }
            r
        }
        5 => {
            let r = f32::from_bits(a as u32) * f32::from_bits(b as u32);
            float32_result(t, r, a as u32, b as u32)
        }
        6 => {
            let r = f64::from_bits(a) * f64::from_bits(b);
            float64_result(t, r, a, b)
        }
        _ => {
            t.interrupt(Interrupt::InstIllegal);
            0
        }
    }
}

/// Signed divide `parm[1] / parm[2]`. Division by zero and MIN/-1 return
/// the sign-bit sentinel and trap when enabled.
pub fn div(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let b = t.parm[2];
    match t.operand_type {
        0..=3 => {
            let size_mask = t.size_mask();
            let sign_bit = (size_mask >> 1) + 1;
            let sa = sign_extend(a, t.operand_type);
            let sb = sign_extend(b, t.operand_type);
            if sb == 0 || (a & size_mask == sign_bit && sb == -1) {
                if t.num_contr & MSK_OVERFL_SIGN != 0 {
                    t.interrupt(Interrupt::OverflSign);
                }
                sign_bit
            } else {
                (sa / sb) as u64
            }
        }
        5 => {
            let fa = f32::from_bits(a as u32);
            let fb = f32::from_bits(b as u32);
            let r = fa / fb;
            // 0/0 is the invalid operation; finite/0 is a divide-by-zero
            // giving infinity, caught by the overflow check below
            if fa == 0.0 && fb == 0.0 && t.num_contr & MSK_FLOAT_INVALID != 0 {
                t.interrupt(Interrupt::FloatInvalid);
            }
            float32_result(t, r, a as u32, b as u32)
        }
        6 => {
            let fa = f64::from_bits(a);
            let fb = f64::from_bits(b);
            let r = fa / fb;
            if fa == 0.0 && fb == 0.0 && t.num_contr & MSK_FLOAT_INVALID != 0 {
                t.interrupt(Interrupt::FloatInvalid);
            }
            float64_result(t, r, a, b)
        }
        _ => {
            t.interrupt(Interrupt::InstIllegal);
            0
        }
    }
}

/// Commit a single-precision result, trapping when a finite operation
/// overflowed to infinity and the float overflow trap is enabled
fn float32_result(t: &mut Thread, r: f32, a: u32, b: u32) -> u64 {
    if t.num_contr & MSK_OVERFL_FLOAT != 0
        && r.is_infinite()
        && f32::from_bits(a).is_finite()
        && f32::from_bits(b).is_finite()
    {
        t.interrupt(Interrupt::OverflFloat);
    }
    r.to_bits() as u64
}

fn float64_result(t: &mut Thread, r: f64, a: u64, b: u64) -> u64 {
    if t.num_contr & MSK_OVERFL_FLOAT != 0
        && r.is_infinite()
        && f64::from_bits(a).is_finite()
        && f64::from_bits(b).is_finite()
    {
        t.interrupt(Interrupt::OverflFloat);
    }
    r.to_bits()
}

// ============================================================================
// Format 1.0 A: three general purpose registers
// ============================================================================

/// Bit scan forward: index of the least significant set bit, -1 if none
pub fn bitscan_f(t: &mut Thread) -> u64 {
    let a = t.parm[2] & t.size_mask();
    if t.data_size() > 8 {
        t.interrupt(Interrupt::InstIllegal);
    }
    if a != 0 {
        a.trailing_zeros() as u64
    } else {
        u64::MAX
    }
}

/// Bit scan reverse: index of the most significant set bit, -1 if none
pub fn bitscan_r(t: &mut Thread) -> u64 {
    let a = t.parm[2] & t.size_mask();
    if t.data_size() > 8 {
        t.interrupt(Interrupt::InstIllegal);
    }
    if a != 0 {
        (63 - a.leading_zeros()) as u64
    } else {
        u64::MAX
    }
}

/// Round down to the nearest power of 2; zero stays zero
pub fn round_d2(t: &mut Thread) -> u64 {
    let a = t.parm[2] & t.size_mask();
    if t.data_size() > 8 {
        t.interrupt(Interrupt::InstIllegal);
    }
    if a == 0 {
        return 0;
    }
    1u64 << (63 - a.leading_zeros())
}

/// Round up to the nearest power of 2; returns all ones on overflow
pub fn round_u2(t: &mut Thread) -> u64 {
    let a = t.parm[2] & t.size_mask();
    let mask = t.parm[3] as u32;
    if t.data_size() > 8 {
        t.interrupt(Interrupt::InstIllegal);
    }
    if a == 0 {
        return 0;
    }
    if a & (a - 1) == 0 {
        return a; // already a power of 2
    }
    let s = 63 - a.leading_zeros(); // highest set bit
    if s + 1 >= t.data_size_bits() {
        if mask & MSK_OVERFL_SIGN != 0 {
            t.interrupt(Interrupt::OverflSign);
        } else if mask & MSK_OVERFL_UNSIGN != 0 {
            t.interrupt(Interrupt::OverflUnsign);
        }
        return u64::MAX;
    }
    1u64 << (s + 1)
}

// ============================================================================
// Format 1.1 C: one general purpose register and a 16-bit immediate
// ============================================================================

/// Move 16-bit sign-extended constant (the decoder has already extended it)
pub fn move_16s(t: &mut Thread) -> u64 {
    t.parm[2]
}

/// Move 16-bit zero-extended constant
pub fn move_16u(t: &mut Thread) -> u64 {
    t.parm[2] & 0xFFFF
}

/// Shift the 16-bit signed constant left by 16 and add
pub fn shift16_add(t: &mut Thread) -> u64 {
    t.parm[2] <<= 16;
    add(t)
}

/// Decode the packed two-immediate field: IM2 sign-extended in bits 8..63,
/// the unsigned shift count IM1 in bits 0..7
fn shifted_imm(packed: u64) -> u64 {
    let sh = (packed & 0xFF) as u32;
    let im2 = ((packed as i64) >> 8) as u64;
    if sh >= 64 {
        0
    } else {
        im2 << sh
    }
}

/// RD = IM2 << IM1
pub fn shifti1_move(t: &mut Thread) -> u64 {
    shifted_imm(t.parm[2])
}

/// RD += IM2 << IM1
pub fn shifti1_add(t: &mut Thread) -> u64 {
    t.parm[2] = shifted_imm(t.parm[2]);
    add(t)
}

/// RD &= IM2 << IM1
pub fn shifti1_and(t: &mut Thread) -> u64 {
    t.parm[1] & shifted_imm(t.parm[2])
}

/// RD |= IM2 << IM1
pub fn shifti1_or(t: &mut Thread) -> u64 {
    t.parm[1] | shifted_imm(t.parm[2])
}

/// RD ^= IM2 << IM1
pub fn shifti1_xor(t: &mut Thread) -> u64 {
    t.parm[1] ^ shifted_imm(t.parm[2])
}

// ============================================================================
// Format 1.8 B: two general purpose registers and an 8-bit immediate
// ============================================================================

/// Absolute value of a signed integer. IM1 selects the overflow handling
/// for the most negative value: 0 wrap, 1 saturate, 2 zero; bit 2 also traps.
pub fn abs_64(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let size_mask = t.size_mask();
    let sign_bit = (size_mask >> 1) + 1;
    let imm = t.parm[2] as u8;
    if a & size_mask == sign_bit {
        if imm & 4 != 0 {
            t.interrupt(Interrupt::OverflSign);
        }
        return match imm & !4 {
            0 => a,              // wrap around
            1 => size_mask >> 1, // saturate
            2 => 0,
            _ => {
                t.interrupt(Interrupt::InstIllegal);
                a
            }
        };
    }
    if a & sign_bit != 0 {
        (a as i64).wrapping_neg() as u64
    } else {
        a
    }
}

/// Shift and add: RD += RS << IM1
pub fn shifti_add(t: &mut Thread) -> u64 {
    let a = t.parm[0];
    let b = t.parm[1];
    let c = t.parm[2];
    let nbits = t.data_size_bits();
    let sh = (c & 0xFF) as u32;
    let r1 = if c >= nbits as u64 || sh >= 64 {
        0 // shift out of range gives zero
    } else {
        b << sh
    };
    let r2 = a.wrapping_add(r1);

    if t.num_contr & MSK_OVERFL_I != 0 {
        if t.num_contr & MSK_OVERFL_SIGN != 0 {
            let size_mask = t.size_mask();
            let sign_bit = (size_mask >> 1) + 1;
            let ovfl = !(a ^ r1) & (a ^ r2); // sign-mix rule
            let shift_lost = sh >= 64 || ((r1 as i64) >> sh) != b as i64;
            if shift_lost || ovfl & sign_bit != 0 || c >= nbits as u64 {
                t.interrupt(Interrupt::OverflSign);
            }
        } else if t.num_contr & MSK_OVERFL_UNSIGN != 0 {
            let shift_lost = sh >= 64 || (r1 >> sh) != b;
            if r2 < a || shift_lost || c >= nbits as u64 {
                t.interrupt(Interrupt::OverflUnsign);
            }
        }
    }
    r2
}

// System register access: the registers themselves live outside the core,
// so these only keep their dispatch slots occupied.

pub fn read_spec(_t: &mut Thread) -> u64 {
    0
}

pub fn write_spec(t: &mut Thread) -> u64 {
    t.return_type = 0;
    0
}

pub fn read_capabilities(_t: &mut Thread) -> u64 {
    0
}

pub fn write_capabilities(t: &mut Thread) -> u64 {
    t.return_type = 0;
    0
}

pub fn read_perf(_t: &mut Thread) -> u64 {
    0
}

pub fn read_sys(_t: &mut Thread) -> u64 {
    0
}

pub fn write_sys(t: &mut Thread) -> u64 {
    t.return_type = 0;
    0
}

// ============================================================================
// Format 2.9 A: three general purpose registers and a 32-bit immediate
// ============================================================================

/// RD = IM2 << 32, low half zero
pub fn move_hi32(t: &mut Thread) -> u64 {
    t.parm[2] << 32
}

/// RD = IM2 << 32 | low half of RT
pub fn insert_hi32(t: &mut Thread) -> u64 {
    t.parm[2] << 32 | (t.parm[1] & 0xFFFF_FFFF)
}

/// Add zero-extended 32-bit constant
pub fn add_32u(t: &mut Thread) -> u64 {
    t.parm[2] &= 0xFFFF_FFFF;
    add(t)
}

/// Subtract zero-extended 32-bit constant
pub fn sub_32u(t: &mut Thread) -> u64 {
    t.parm[2] &= 0xFFFF_FFFF;
    sub(t)
}

/// RD = RT + (IM2 << 32)
pub fn add_hi32(t: &mut Thread) -> u64 {
    t.parm[2] <<= 32;
    add(t)
}

/// RD = RT & (IM2 << 32)
pub fn and_hi32(t: &mut Thread) -> u64 {
    t.parm[1] & (t.parm[2] << 32)
}

/// RD = RT | (IM2 << 32)
pub fn or_hi32(t: &mut Thread) -> u64 {
    t.parm[1] | (t.parm[2] << 32)
}

/// RD = RT ^ (IM2 << 32)
pub fn xor_hi32(t: &mut Thread) -> u64 {
    t.parm[1] ^ (t.parm[2] << 32)
}

/// Replace a window of contiguous bits in RT by a constant. IM2 packs the
/// 16-bit value, the start position (bits 16..23) and the bit count
/// (bits 24..31); counts above 32 or windows past bit 63 are illegal.
pub fn replace_bits(t: &mut Thread) -> u64 {
    let a = t.parm[1];
    let b = t.parm[2];
    let val = b & 0xFFFF;
    let pos = ((b >> 16) & 0xFF) as u32;
    let num = ((b >> 24) & 0xFF) as u32;
    if num > 32 || pos + num > 64 {
        t.interrupt(Interrupt::InstIllegal);
        return a;
    }
    let mask = (1u64 << num) - 1;
    (a & !(mask << pos)) | ((val & mask) << pos)
}

/// RD = RT + IM2 where RT is a base pointer; the decoder has already formed
/// the effective address
pub fn address_form(t: &mut Thread) -> u64 {
    t.return_type = RT_POINTER;
    t.mem_address
}
