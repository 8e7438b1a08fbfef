//! Dispatch tables for the single-format instructions, and the drivers that
//! stage operands, run the vector lane loop and commit results.

use super::{alu, vector, Interrupt, Thread};

/// Instruction handler: reads the staged context, returns the 64-bit result
pub type Handler = fn(&mut Thread) -> u64;

/// Single-format instruction groups, named by ForwardCom format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 1.0 A: three general purpose registers
    F1_0,
    /// 1.1 C: one general purpose register and a 16-bit immediate
    F1_1,
    /// 1.2 A: three vector registers
    F1_2,
    /// 1.8 B: two general purpose registers and an 8-bit immediate
    F1_8,
    /// 2.9 A: three general purpose registers and a 32-bit immediate
    F2_9,
}

/// Format 1.0 A. Reserved slots raise an illegal-instruction interrupt.
pub static FORMAT_1_0: [Option<Handler>; 64] = [
    None,
    Some(alu::bitscan_f),
    Some(alu::bitscan_r),
    Some(alu::round_d2),
    Some(alu::round_u2),
    None,
    None,
    None, // 0 - 7
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 8 - 15
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 16 - 23
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 24 - 31
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 32 - 39
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 40 - 47
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 48 - 55
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 56 - 63
];

/// Format 1.1 C. Arithmetic on a 16-bit immediate, int64.
pub static FORMAT_1_1: [Option<Handler>; 64] = [
    Some(alu::move_16s),
    Some(alu::move_16u),
    Some(alu::add),
    None,
    None,
    Some(alu::mul),
    Some(alu::div),
    Some(alu::shift16_add), // 0 - 7
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 8 - 15
    Some(alu::shifti1_move),
    Some(alu::shifti1_add),
    Some(alu::shifti1_and),
    Some(alu::shifti1_or),
    Some(alu::shifti1_xor),
    None,
    None,
    None, // 16 - 23
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 24 - 31
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 32 - 39
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 40 - 47
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 48 - 55
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 56 - 63
];

/// Format 1.2 A. Vector reshaping, extended-precision and saturating
/// arithmetic. The call-stack, memory-map and port I/O slots (58-63) are
/// reserved.
pub static FORMAT_1_2: [Option<Handler>; 64] = [
    Some(vector::set_len),
    Some(vector::get_len),
    Some(vector::set_len),
    Some(vector::get_len),
    Some(vector::compress),
    Some(vector::compress),
    Some(vector::compress),
    Some(vector::expand), // 0 - 7
    Some(vector::expand),
    Some(vector::compress_sparse),
    Some(vector::expand_sparse),
    Some(vector::extract),
    Some(vector::insert),
    Some(vector::broadcast),
    Some(vector::bits2bool),
    Some(vector::bool2bits), // 8 - 15
    Some(vector::bool_reduce),
    None,
    Some(vector::shift_expand),
    Some(vector::shift_reduce),
    Some(vector::shift_up),
    Some(vector::shift_down),
    Some(vector::rotate_up),
    Some(vector::rotate_down), // 16 - 23
    Some(vector::div_ex),
    Some(vector::div_ex),
    Some(vector::sqrt),
    None,
    Some(vector::add_c),
    Some(vector::sub_b),
    Some(vector::add_ss),
    Some(vector::add_us), // 24 - 31
    Some(vector::sub_ss),
    Some(vector::sub_us),
    Some(vector::mul_ss),
    Some(vector::mul_us),
    None,
    None,
    Some(vector::add_oc),
    Some(vector::sub_oc), // 32 - 39
    None,
    Some(vector::mul_oc),
    Some(vector::div_oc),
    None,
    None,
    None,
    None,
    None, // 40 - 47
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 48 - 55
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 56 - 63
];

/// Format 1.8 B. Absolute value, shift-and-add and system register access.
pub static FORMAT_1_8: [Option<Handler>; 64] = [
    Some(alu::abs_64),
    Some(alu::shifti_add),
    None,
    None,
    None,
    None,
    None,
    None, // 0 - 7
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 8 - 15
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 16 - 23
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 24 - 31
    Some(alu::read_spec),
    Some(alu::write_spec),
    Some(alu::read_capabilities),
    Some(alu::write_capabilities),
    Some(alu::read_perf),
    Some(alu::read_perf),
    Some(alu::read_sys),
    Some(alu::write_sys), // 32 - 39
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 40 - 47
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 48 - 55
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 56 - 63
];

/// Format 2.9 A. Wide-immediate composition on a 32-bit immediate.
pub static FORMAT_2_9: [Option<Handler>; 64] = [
    Some(alu::move_hi32),
    Some(alu::insert_hi32),
    Some(alu::add_32u),
    Some(alu::sub_32u),
    Some(alu::add_hi32),
    Some(alu::and_hi32),
    Some(alu::or_hi32),
    Some(alu::xor_hi32), // 0 - 7
    None,
    Some(alu::replace_bits),
    None,
    None,
    None,
    None,
    None,
    None, // 8 - 15
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 16 - 23
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 24 - 31
    Some(alu::address_form),
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 32 - 39
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 40 - 47
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 48 - 55
    None,
    None,
    None,
    None,
    None,
    None,
    None,
    None, // 56 - 63
];

/// Extended-precision protocol ops operate on a pair of lanes per step:
/// the even lane carries the arithmetic, the odd lane receives `parm[5]`
fn paired_lanes(op: u8) -> bool {
    matches!(op, 24 | 25 | 28 | 29 | 38 | 39 | 41 | 42)
}

/// Dispatch one single-format instruction. Scalar formats commit the
/// returned value to the g.p. register selected by `operands[0]` unless the
/// handler already committed (`running == 2`); the vector format runs the
/// lane loop.
pub fn exec_single(t: &mut Thread, format: Format) -> u64 {
    if format == Format::F1_2 {
        return exec_vector(t);
    }
    let table = match format {
        Format::F1_0 => &FORMAT_1_0,
        Format::F1_1 => &FORMAT_1_1,
        Format::F1_8 => &FORMAT_1_8,
        Format::F2_9 => &FORMAT_2_9,
        Format::F1_2 => unreachable!(),
    };
    let handler = match table[(t.op & 63) as usize] {
        Some(h) => h,
        None => {
            log::warn!("reserved opcode {:#04x} in format {:?}", t.op, format);
            t.interrupt(Interrupt::InstIllegal);
            return 0;
        }
    };
    t.return_type = 0x10 + t.operand_type as u32;
    t.running = 1;
    let result = handler(t);
    if t.running != 2 {
        t.regs[(t.operands[0] & 31) as usize] = result;
    }
    t.running = 1;
    result
}

/// The vector lane loop for format 1.2. Stages `parm[0..=2]` from the
/// destination and the two source vectors at the current offset and
/// `parm[3]` from the numeric control word (per-element mask staging is the
/// decoder's job), invokes the handler per lane — per lane *pair* for the
/// extended-precision protocol — and writes results back until the length
/// runs out or the handler stops the loop.
pub fn exec_vector(t: &mut Thread) -> u64 {
    let op = t.op & 63;
    let handler = match FORMAT_1_2[op as usize] {
        Some(h) => h,
        None => {
            log::warn!("reserved opcode {:#04x} in format {:?}", op, Format::F1_2);
            t.interrupt(Interrupt::InstIllegal);
            return 0;
        }
    };
    let rd = (t.operands[0] & 31) as usize;
    let rs = (t.operands[4] & 31) as usize;
    let rt = (t.operands[5] & 31) as usize;
    let element_size = t.data_size();
    let stride = if paired_lanes(op) {
        2 * element_size
    } else {
        element_size
    };
    t.return_type = 0x110 + t.operand_type as u32;
    t.vector_length_r = t.vregs.length[rt];
    t.vector_offset = 0;
    t.vect = 1;
    t.running = 1;
    let mut result = 0u64;
    loop {
        let off = t.vector_offset;
        t.parm[0] = t.vregs.read_elem(rd, off, element_size.min(8));
        t.parm[1] = t.vregs.read_elem(rs, off, element_size.min(8));
        t.parm[2] = t.vregs.read_elem(rt, off, element_size.min(8));
        t.parm[3] = t.num_contr as u64;
        t.parm[5] = 0;
        result = handler(t);
        if t.running == 2 {
            break; // result already committed
        }
        if element_size == 16 {
            // 128-bit lanes: low half from the result, high half from parm[5]
            t.vregs.write_elem(rd, off, 8, result);
            t.vregs.write_elem(rd, off + 8, 8, t.parm[5]);
        } else {
            t.vregs.write_elem(rd, off, element_size, result);
            if stride != element_size {
                t.vregs.write_elem(rd, off + element_size, element_size, t.parm[5]);
            }
        }
        if t.vect == 4 {
            break;
        }
        t.vector_offset += stride;
        if t.vector_offset >= t.vector_length_r {
            break;
        }
    }
    if t.running != 2 {
        t.vregs.length[rd] = t.vector_length_r;
    }
    t.vect = 1;
    t.running = 1;
    result
}
