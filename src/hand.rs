//! Seven-card hand strength evaluation.
//!
//! A Cactus-Kev style evaluator: prime products identify rank multisets,
//! 13-bit rank patterns identify flushes and straights, and lookup tables
//! map both to a total order over five-card hands. Strengths are returned
//! with **larger = stronger**, which is the ordering the showdown sweep
//! relies on.

use crate::card::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One prime per rank (2..A); products are unique per rank multiset.
const PRIMES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];

/// Number of distinct five-card hand classes.
const NUM_HAND_CLASSES: u16 = 7462;

/// Rank patterns of the ten straights, ace-high down to the wheel.
const STRAIGHT_PATTERNS: [u16; 10] = [
    0b1111100000000,
    0b0111110000000,
    0b0011111000000,
    0b0001111100000,
    0b0000111110000,
    0b0000011111000,
    0b0000001111100,
    0b0000000111110,
    0b0000000011111,
    0b1000000001111,
];

/// Flush lookup: 13-bit rank pattern -> class (1 = royal flush, lower is
/// stronger in the internal ordering).
static FLUSH_TABLE: Lazy<Vec<u16>> = Lazy::new(|| {
    let mut table = vec![0u16; 8192];

    // straight flushes: classes 1..=10
    for (i, &pattern) in STRAIGHT_PATTERNS.iter().enumerate() {
        table[pattern as usize] = 1 + i as u16;
    }

    // remaining flushes: classes 323..=1599
    let mut class = 323;
    for bits in (0u16..8192).rev() {
        if bits.count_ones() == 5 && !STRAIGHT_PATTERNS.contains(&bits) {
            table[bits as usize] = class;
            class += 1;
        }
    }

    table
});

/// Non-flush distinct-rank lookup: straights and high cards.
static UNIQUE5_TABLE: Lazy<Vec<u16>> = Lazy::new(|| {
    let mut table = vec![0u16; 8192];

    // straights: classes 1600..=1609
    for (i, &pattern) in STRAIGHT_PATTERNS.iter().enumerate() {
        table[pattern as usize] = 1600 + i as u16;
    }

    // high cards: classes 6186..=7462
    let mut class = 6186;
    for bits in (0u16..8192).rev() {
        if bits.count_ones() == 5 && !STRAIGHT_PATTERNS.contains(&bits) {
            table[bits as usize] = class;
            class += 1;
        }
    }

    table
});

/// Paired-hand lookup: prime product -> class.
static PAIRED_TABLE: Lazy<HashMap<u32, u16>> = Lazy::new(|| {
    let mut table = HashMap::new();

    // four of a kind: 11..=166
    let mut class = 11u16;
    for quads in (0..13).rev() {
        for kicker in (0..13).rev() {
            if quads != kicker {
                table.insert(PRIMES[quads].pow(4) * PRIMES[kicker], class);
                class += 1;
            }
        }
    }

    // full house: 167..=322
    class = 167;
    for trips in (0..13).rev() {
        for pair in (0..13).rev() {
            if trips != pair {
                table.insert(PRIMES[trips].pow(3) * PRIMES[pair].pow(2), class);
                class += 1;
            }
        }
    }

    // three of a kind: 1610..=2467
    class = 1610;
    for trips in (0..13).rev() {
        for k1 in (0..13).rev() {
            for k2 in (0..k1).rev() {
                if k1 != trips && k2 != trips {
                    table.insert(PRIMES[trips].pow(3) * PRIMES[k1] * PRIMES[k2], class);
                    class += 1;
                }
            }
        }
    }

    // two pair: 2468..=3325
    class = 2468;
    for p1 in (0..13).rev() {
        for p2 in (0..p1).rev() {
            for kicker in (0..13).rev() {
                if kicker != p1 && kicker != p2 {
                    table.insert(PRIMES[p1].pow(2) * PRIMES[p2].pow(2) * PRIMES[kicker], class);
                    class += 1;
                }
            }
        }
    }

    // one pair: 3326..=6185
    class = 3326;
    for pair in (0..13).rev() {
        for k1 in (0..13).rev() {
            for k2 in (0..k1).rev() {
                for k3 in (0..k2).rev() {
                    if k1 != pair && k2 != pair && k3 != pair {
                        table.insert(
                            PRIMES[pair].pow(2) * PRIMES[k1] * PRIMES[k2] * PRIMES[k3],
                            class,
                        );
                        class += 1;
                    }
                }
            }
        }
    }

    table
});

/// Classifies a five-card hand. Internal ordering: 1 = royal flush,
/// 7462 = worst high card.
fn classify_five(cards: [Card; 5]) -> u16 {
    let mut rank_bits: u16 = 0;
    let mut suit_counts = [0u8; 4];
    let mut prime_product: u32 = 1;

    for card in cards {
        let rank = card_rank(card) as usize;
        rank_bits |= 1 << rank;
        suit_counts[card_suit(card) as usize] += 1;
        prime_product *= PRIMES[rank];
    }

    if suit_counts.contains(&5) {
        FLUSH_TABLE[rank_bits as usize]
    } else if rank_bits.count_ones() == 5 {
        UNIQUE5_TABLE[rank_bits as usize]
    } else {
        PAIRED_TABLE[&prime_product]
    }
}

/// Evaluates the strength of the best five-card hand among a hole pair and a
/// five-card board. Larger values are stronger; equal values tie.
///
/// # Examples
/// ```
/// use postflop_dcfr::{board_from_str, card_from_str, hand_strength};
///
/// let board = board_from_str("2c 7d Kh 3s 9h").unwrap();
/// let aces = hand_strength(
///     card_from_str("As").unwrap(),
///     card_from_str("Ah").unwrap(),
///     &board,
/// );
/// let kings = hand_strength(
///     card_from_str("Ks").unwrap(),
///     card_from_str("Kd").unwrap(),
///     &board,
/// );
/// assert!(kings > aces);
/// ```
pub fn hand_strength(card1: Card, card2: Card, board: &[Card]) -> u16 {
    debug_assert_eq!(board.len(), 5);
    let cards = [card1, card2, board[0], board[1], board[2], board[3], board[4]];

    let mut best = u16::MAX;
    for i in 0..7 {
        for j in (i + 1)..7 {
            // the five cards not at positions i and j
            let mut five = [0; 5];
            let mut n = 0;
            for (k, &card) in cards.iter().enumerate() {
                if k != i && k != j {
                    five[n] = card;
                    n += 1;
                }
            }
            best = best.min(classify_five(five));
        }
    }

    NUM_HAND_CLASSES + 1 - best
}
