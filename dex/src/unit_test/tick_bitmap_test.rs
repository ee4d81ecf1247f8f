use std::collections::BTreeMap;

use primitive_types::U256;
use proptest::prelude::*;

use crate::tick_bitmap::{
    flip_tick, is_tick_initialized, next_initialized_tick_within_one_word,
};

fn bitmap_with(ticks: &[i32], spacing: i32) -> BTreeMap<i16, U256> {
    let mut bitmap = BTreeMap::new();
    for tick in ticks {
        flip_tick(&mut bitmap, *tick, spacing).unwrap();
    }
    bitmap
}

#[test]
fn flip_sets_and_clears() {
    let mut bitmap = BTreeMap::new();
    flip_tick(&mut bitmap, 120, 60).unwrap();
    assert!(is_tick_initialized(&bitmap, 120, 60));
    assert!(!is_tick_initialized(&bitmap, 60, 60));

    flip_tick(&mut bitmap, 120, 60).unwrap();
    assert!(!is_tick_initialized(&bitmap, 120, 60));
    // The zeroed word is dropped entirely.
    assert!(bitmap.is_empty());
}

#[test]
fn flip_rejects_off_grid_ticks() {
    let mut bitmap = BTreeMap::new();
    assert!(flip_tick(&mut bitmap, 61, 60).is_err());
}

#[test]
fn negative_ticks_compress_toward_negative_infinity() {
    let mut bitmap = BTreeMap::new();
    flip_tick(&mut bitmap, -60, 60).unwrap();
    // Compressed index -1 lives in word -1, bit 255.
    assert_eq!(bitmap.keys().copied().collect::<Vec<_>>(), vec![-1]);
    assert!(is_tick_initialized(&bitmap, -60, 60));
}

#[test]
fn search_downward_finds_own_tick() {
    let bitmap = bitmap_with(&[-60, 60], 60);
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 60, 60, true).unwrap();
    assert_eq!((next, initialized), (60, true));
}

#[test]
fn search_downward_within_word() {
    let bitmap = bitmap_with(&[-60, 60], 60);
    // From tick 0 downward the word holds -60.
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 0, 60, true).unwrap();
    assert_eq!((next, initialized), (-60, true));
}

#[test]
fn search_upward_skips_own_tick() {
    let bitmap = bitmap_with(&[-60, 60], 60);
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, -60, 60, false).unwrap();
    assert_eq!((next, initialized), (60, true));
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 0, 60, false).unwrap();
    assert_eq!((next, initialized), (60, true));
}

#[test]
fn empty_word_returns_boundary_uninitialized() {
    let bitmap = bitmap_with(&[], 60);
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 0, 60, true).unwrap();
    assert!(!initialized);
    // Bottom of word 0: compressed 0 - bit 0 = 0.
    assert_eq!(next, 0);

    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 0, 60, false).unwrap();
    assert!(!initialized);
    // Top of word 0: compressed 255.
    assert_eq!(next, 255 * 60);
}

#[test]
fn search_does_not_leave_the_word() {
    // A tick one word above is invisible to the single-word search.
    let bitmap = bitmap_with(&[300 * 60], 60);
    let (next, initialized) =
        next_initialized_tick_within_one_word(&bitmap, 0, 60, false).unwrap();
    assert!(!initialized);
    assert_eq!(next, 255 * 60);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    // Flipping a random set of grid ticks leaves exactly those ticks set.
    #[test]
    fn bitmap_matches_flipped_set(ticks in prop::collection::btree_set(-800i32..800, 0..12)) {
        let spacing = 10;
        let grid: Vec<i32> = ticks.iter().map(|t| t * spacing).collect();
        let bitmap = bitmap_with(&grid, spacing);
        for t in -800..800 {
            let tick = t * spacing;
            prop_assert_eq!(
                is_tick_initialized(&bitmap, tick, spacing),
                grid.contains(&tick)
            );
        }
    }

    // The downward search from any start returns the greatest set tick at or
    // below it when one exists in the same word.
    #[test]
    fn downward_search_agrees_with_linear_scan(
        ticks in prop::collection::btree_set(0i32..256, 1..8),
        start in 0i32..256,
    ) {
        let spacing = 60;
        let grid: Vec<i32> = ticks.iter().map(|t| t * spacing).collect();
        let bitmap = bitmap_with(&grid, spacing);
        let (next, initialized) =
            next_initialized_tick_within_one_word(&bitmap, start * spacing, spacing, true).unwrap();
        let expected = grid.iter().filter(|t| **t <= start * spacing).max();
        match expected {
            Some(t) => {
                prop_assert!(initialized);
                prop_assert_eq!(next, *t);
            }
            None => prop_assert!(!initialized),
        }
    }
}
