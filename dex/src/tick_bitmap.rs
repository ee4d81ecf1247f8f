//! Word-indexed bitmap of initialized ticks.
//!
//! Ticks on the spacing grid compress to `floor(tick / spacing)`; each
//! 256-tick run of compressed indices shares one `U256` word. The swap loop
//! asks for the next initialized tick *within the current word only* and
//! walks word by word itself, so an empty word costs one lookup, not 256.

use std::collections::BTreeMap;

use amm_math::bit_math;
use primitive_types::U256;

use crate::errors::{DexError, DexResult};

/// Compressed index: floor division, toward negative infinity.
fn compress(tick: i32, spacing: i32) -> i32 {
    tick.div_euclid(spacing)
}

/// Word index and bit position of a compressed tick.
fn position(compressed: i32) -> (i16, u8) {
    let word = compressed.div_euclid(256) as i16;
    let bit = compressed.rem_euclid(256) as u8;
    (word, bit)
}

/// Toggles the bit for `tick`; removes the word entry when it zeroes out.
/// The tick must sit on the spacing grid.
pub fn flip_tick(bitmap: &mut BTreeMap<i16, U256>, tick: i32, spacing: i32) -> DexResult<()> {
    if tick % spacing != 0 {
        return Err(DexError::ValidationFailed(format!(
            "tick {tick} is not a multiple of spacing {spacing}"
        )));
    }
    let (word_pos, bit_pos) = position(compress(tick, spacing));
    let word = bitmap.get(&word_pos).copied().unwrap_or_else(U256::zero);
    let flipped = word ^ (U256::one() << bit_pos);
    if flipped.is_zero() {
        bitmap.remove(&word_pos);
    } else {
        bitmap.insert(word_pos, flipped);
    }
    Ok(())
}

/// Whether the grid tick's bit is set.
pub fn is_tick_initialized(bitmap: &BTreeMap<i16, U256>, tick: i32, spacing: i32) -> bool {
    if tick % spacing != 0 {
        return false;
    }
    let (word_pos, bit_pos) = position(compress(tick, spacing));
    match bitmap.get(&word_pos) {
        Some(word) => bit_math::is_bit_set(*word, bit_pos),
        None => false,
    }
}

/// Next initialized tick within the word containing `tick`, searching
/// downward (`lte`) or upward.
///
/// Returns `(next_tick, initialized)`. When no bit is set in the searched
/// direction the word-boundary tick comes back uninitialized; the caller
/// clamps it to the valid tick range and keeps walking.
pub fn next_initialized_tick_within_one_word(
    bitmap: &BTreeMap<i16, U256>,
    tick: i32,
    spacing: i32,
    lte: bool,
) -> DexResult<(i32, bool)> {
    let compressed = compress(tick, spacing);

    if lte {
        let (word_pos, bit_pos) = position(compressed);
        let word = bitmap.get(&word_pos).copied().unwrap_or_else(U256::zero);
        // Bits at or below the current position.
        let mask = if bit_pos == 255 {
            U256::MAX
        } else {
            (U256::one() << (bit_pos + 1)) - U256::one()
        };
        let masked = word & mask;
        if masked.is_zero() {
            Ok(((compressed - i32::from(bit_pos)) * spacing, false))
        } else {
            let msb = bit_math::most_significant_bit(masked)?;
            Ok((
                (compressed - i32::from(bit_pos) + i32::from(msb)) * spacing,
                true,
            ))
        }
    } else {
        // Search starts one past the current compressed tick.
        let start = compressed + 1;
        let (word_pos, bit_pos) = position(start);
        let word = bitmap.get(&word_pos).copied().unwrap_or_else(U256::zero);
        // Bits at or above the start position.
        let mask = if bit_pos == 0 {
            U256::MAX
        } else {
            !((U256::one() << bit_pos) - U256::one())
        };
        let masked = word & mask;
        if masked.is_zero() {
            Ok(((start + i32::from(255 - bit_pos)) * spacing, false))
        } else {
            let lsb = bit_math::least_significant_bit(masked)?;
            Ok((
                (start + i32::from(lsb) - i32::from(bit_pos)) * spacing,
                true,
            ))
        }
    }
}
