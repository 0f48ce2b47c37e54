use crate::card::*;
use crate::hand::hand_strength;
use crate::range::PreflopCombo;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A combo projected onto a specific five-card river board.
///
/// `reach_index` points back into the owning player's preflop combo list so
/// the terminal sweeps can address full-size reach vectors.
#[derive(Debug, Clone, Copy)]
pub struct RiverCombo {
    pub card1: Card,
    pub card2: Card,
    pub strength: u16,
    pub reach_index: u16,
}

/// Lazily caches each player's river combos per board.
///
/// Entries are write-once read-many; the cache is shared across the parallel
/// traversal, keyed by the board's bitmask.
#[derive(Debug, Default)]
pub struct RiverRangeManager {
    caches: [RwLock<HashMap<u64, Arc<[RiverCombo]>>>; 2],
}

impl RiverRangeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `player`'s combos that survive `board`, sorted ascending by
    /// hand strength. Results are computed once per board and then served
    /// from the cache.
    pub fn river_combos(
        &self,
        player: u8,
        preflop_combos: &[PreflopCombo],
        board: &[Card],
    ) -> Arc<[RiverCombo]> {
        debug_assert!(player == 1 || player == 2);
        debug_assert_eq!(board.len(), 5);

        let cache = &self.caches[player as usize - 1];
        let key = board_mask(board);

        if let Some(combos) = cache.read().get(&key) {
            return Arc::clone(combos);
        }

        let mut river_combos: Vec<RiverCombo> = preflop_combos
            .iter()
            .enumerate()
            .filter(|(_, combo)| !combo.overlaps_mask(key))
            .map(|(index, combo)| RiverCombo {
                card1: combo.card1,
                card2: combo.card2,
                strength: hand_strength(combo.card1, combo.card2, board),
                reach_index: index as u16,
            })
            .collect();
        river_combos.sort_by_key(|combo| combo.strength);

        let river_combos: Arc<[RiverCombo]> = river_combos.into();
        cache
            .write()
            .entry(key)
            .or_insert_with(|| Arc::clone(&river_combos));
        river_combos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    #[test]
    fn test_river_combos_sorted_and_filtered() {
        let range: Range = "AA,KK,QQ".parse().unwrap();
        let board = board_from_str("As 7d 2c 3h 9s").unwrap();
        let rrm = RiverRangeManager::new();

        let combos = rrm.river_combos(1, range.combos(), &board);
        // As removes three AA combos
        assert_eq!(combos.len(), 15);
        assert!(combos.windows(2).all(|w| w[0].strength <= w[1].strength));

        // strongest remaining combos are the aces
        let strongest = combos.last().unwrap();
        assert_eq!(card_rank(strongest.card1), 12);
    }

    #[test]
    fn test_cache_returns_same_allocation() {
        let range: Range = "AA".parse().unwrap();
        let board = board_from_str("Ks 7d 2c 3h 9s").unwrap();
        let rrm = RiverRangeManager::new();

        let first = rrm.river_combos(1, range.combos(), &board);
        let second = rrm.river_combos(1, range.combos(), &board);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_reach_indices_point_into_preflop_range() {
        let range: Range = "AA,KK".parse().unwrap();
        let board = board_from_str("As 7d 2c 3h 9s").unwrap();
        let rrm = RiverRangeManager::new();

        let combos = rrm.river_combos(1, range.combos(), &board);
        for rc in combos.iter() {
            let pc = &range.combos()[rc.reach_index as usize];
            assert_eq!((rc.card1, rc.card2), (pc.card1, pc.card2));
        }
    }
}
