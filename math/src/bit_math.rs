//! Bit scanning over 256-bit words.
//!
//! The tick bitmap stores one word per 256 ticks; walking it during a swap
//! needs the most- and least-significant set bit of a masked word. Both scans
//! are an 8-step binary search over power-of-two boundaries, constant-time in
//! big-integer operations.

use primitive_types::U256;

use crate::error::MathError;

const SHIFTS: [u32; 8] = [128, 64, 32, 16, 8, 4, 2, 1];

/// Index of the highest set bit of `x`. Errors on zero.
pub fn most_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::UintOutOfBounds("msb of zero".into()));
    }
    let mut x = x;
    let mut r: u8 = 0;
    for shift in SHIFTS {
        if x >= U256::one() << shift {
            x >>= shift;
            r += shift as u8;
        }
    }
    Ok(r)
}

/// Index of the lowest set bit of `x`. Errors on zero.
pub fn least_significant_bit(x: U256) -> Result<u8, MathError> {
    if x.is_zero() {
        return Err(MathError::UintOutOfBounds("lsb of zero".into()));
    }
    let mut x = x;
    let mut r: u8 = 0;
    for shift in SHIFTS {
        let mask = (U256::one() << shift) - U256::one();
        if (x & mask).is_zero() {
            x >>= shift;
            r += shift as u8;
        }
    }
    Ok(r)
}

/// Returns `word` with bit `bit` set.
pub fn set_bit(word: U256, bit: u8) -> U256 {
    word | (U256::one() << bit)
}

/// Returns `word` with bit `bit` cleared.
pub fn clear_bit(word: U256, bit: u8) -> U256 {
    word & !(U256::one() << bit)
}

/// Whether bit `bit` of `word` is set.
pub fn is_bit_set(word: U256, bit: u8) -> bool {
    !(word & (U256::one() << bit)).is_zero()
}
