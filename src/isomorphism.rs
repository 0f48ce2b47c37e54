//! Suit-isomorphism detection for chance nodes.
//!
//! Two suits are interchangeable at a chance node when the board so far has
//! the same rank set in both suits and neither player's range distinguishes
//! them. Cards of the higher suit are then aliased to their lower-suit
//! counterpart: the chance node keeps one representative child, and the
//! traversal reuses the representative's result after permuting the per-hand
//! vector through a precomputed swap list.

use crate::card::*;
use crate::range::{suit_isomorphic, PreflopCombo};

/// Pairs of combo indices that exchange under one suit swap.
pub type SwapList = Vec<(u16, u16)>;

/// Precomputed suit symmetries of one chance node.
#[derive(Debug, Clone, Default)]
pub struct IsomorphismData {
    /// For each suit, the lower suit it aliases to, if any.
    isomorphic_suit: [Option<u8>; 4],
    /// Per aliased suit, per player, the reach-vector permutation.
    swap_lists: [[SwapList; 2]; 4],
}

/// Index of an unordered card pair: 2d2c => `0`, ..., AsAh => `1325`.
#[inline]
fn card_pair_to_index(mut card1: Card, mut card2: Card) -> usize {
    if card1 > card2 {
        std::mem::swap(&mut card1, &mut card2);
    }
    card1 as usize * (101 - card1 as usize) / 2 + card2 as usize - 1
}

impl IsomorphismData {
    /// Detects the suit symmetries of `board` with respect to both ranges.
    pub fn compute(
        p1_combos: &[PreflopCombo],
        p2_combos: &[PreflopCombo],
        board: &[Card],
    ) -> Self {
        let mut board_rankset = [0u16; 4];
        for &card in board {
            board_rankset[card_suit(card) as usize] |= 1 << card_rank(card);
        }

        let mut data = Self::default();

        for suit1 in 1..4u8 {
            for suit2 in 0..suit1 {
                if board_rankset[suit1 as usize] == board_rankset[suit2 as usize]
                    && suit_isomorphic(p1_combos, suit1, suit2)
                    && suit_isomorphic(p2_combos, suit1, suit2)
                {
                    data.isomorphic_suit[suit1 as usize] = Some(suit2);
                    data.swap_lists[suit1 as usize] = [
                        compute_swap_list(p1_combos, suit1, suit2),
                        compute_swap_list(p2_combos, suit1, suit2),
                    ];
                    break;
                }
            }
        }

        data
    }

    /// The representative card a dealt card aliases to, if its suit is
    /// isomorphic to a lower one.
    #[inline]
    pub fn alias(&self, card: Card) -> Option<Card> {
        let suit = card_suit(card);
        self.isomorphic_suit[suit as usize].map(|rep_suit| card - suit + rep_suit)
    }

    /// The reach-vector permutation for a card of an aliased suit.
    #[inline]
    pub fn swap_list(&self, card: Card, player: u8) -> &SwapList {
        debug_assert!(player == 1 || player == 2);
        &self.swap_lists[card_suit(card) as usize][player as usize - 1]
    }

    #[inline]
    pub fn has_isomorphism(&self) -> bool {
        self.isomorphic_suit.iter().any(|s| s.is_some())
    }
}

fn compute_swap_list(combos: &[PreflopCombo], suit1: u8, suit2: u8) -> SwapList {
    let replace = |card: Card| -> Card {
        let suit = card_suit(card);
        if suit == suit1 {
            card - suit1 + suit2
        } else if suit == suit2 {
            card + suit1 - suit2
        } else {
            card
        }
    };

    let mut reverse_table = vec![usize::MAX; 52 * 51 / 2];
    for (i, combo) in combos.iter().enumerate() {
        reverse_table[card_pair_to_index(combo.card1, combo.card2)] = i;
    }

    let mut swaps = SwapList::new();
    for (i, combo) in combos.iter().enumerate() {
        let swapped_index = card_pair_to_index(replace(combo.card1), replace(combo.card2));
        let j = reverse_table[swapped_index];
        if j != usize::MAX && j > i {
            swaps.push((i as u16, j as u16));
        }
    }
    swaps
}

/// Applies a swap list to a per-hand vector in place. The permutation is an
/// involution, so applying it twice restores the original order.
#[inline]
pub(crate) fn apply_swap(values: &mut [f32], swaps: &SwapList) {
    for &(i, j) in swaps {
        values.swap(i as usize, j as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    #[test]
    fn test_paired_flop_aliases_suits() {
        // clubs and diamonds share the board rank set {7}; pair-only ranges
        // are symmetric in every suit
        let range: Range = "88+".parse().unwrap();
        let board = board_from_str("7c 7d 2s").unwrap();
        let iso = IsomorphismData::compute(range.combos(), range.combos(), &board);

        assert!(iso.has_isomorphism());
        assert_eq!(iso.isomorphic_suit[1], Some(0));
        assert_eq!(iso.isomorphic_suit[2], None);
        assert_eq!(iso.isomorphic_suit[3], None);

        // every unseen diamond aliases to its club twin
        let eight_d = (6 << 2) | 1;
        assert_eq!(iso.alias(eight_d), Some(6 << 2));
    }

    #[test]
    fn test_rainbow_flop_distinct_ranks_no_alias() {
        let range: Range = "88+".parse().unwrap();
        let board = board_from_str("Ah 7d 2s").unwrap();
        let iso = IsomorphismData::compute(range.combos(), range.combos(), &board);
        // all four suits have distinct board rank sets
        assert!(!iso.has_isomorphism());
    }

    #[test]
    fn test_asymmetric_range_blocks_alias() {
        // one extra club-only combo breaks the club/diamond symmetry
        let symmetric: Range = "88+".parse().unwrap();
        let mut combos = symmetric.combos().to_vec();
        combos.push(PreflopCombo::new(12 << 2, 11 << 2, 1.0)); // AcKc

        let board = board_from_str("7c 7d 2s").unwrap();
        let iso = IsomorphismData::compute(&combos, symmetric.combos(), &board);
        assert!(!iso.has_isomorphism());
    }

    #[test]
    fn test_swap_list_involution() {
        let range: Range = "88+,AKs".parse().unwrap();
        let board = board_from_str("7c 7d 2s").unwrap();
        let iso = IsomorphismData::compute(range.combos(), range.combos(), &board);

        let swaps = iso.swap_list(1, 1); // any diamond card
        assert!(!swaps.is_empty());

        let mut values: Vec<f32> = (0..range.num_combos()).map(|i| i as f32).collect();
        let original = values.clone();
        apply_swap(&mut values, swaps);
        assert_ne!(values, original);
        apply_swap(&mut values, swaps);
        assert_eq!(values, original);
    }
}
