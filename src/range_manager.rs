use crate::card::*;
use crate::error::SolverError;
use crate::range::{PreflopCombo, Range};

/// Holds both players' expanded combos and the reach-probability machinery
/// derived from them.
///
/// Players are identified as `1` and `2` throughout the crate. On
/// construction the manager computes board-conditioned relative
/// probabilities and the hero-to-villain matching-combo indices used by the
/// terminal kernels for blocker corrections.
#[derive(Debug, Clone)]
pub struct RangeManager {
    combos: [Vec<PreflopCombo>; 2],
    matching: [Vec<Option<u16>>; 2],
}

impl RangeManager {
    /// Builds the manager from both ranges and the initial board, and
    /// computes relative probabilities conditioned on that board.
    pub fn new(range1: &Range, range2: &Range, init_board: &[Card]) -> Result<Self, SolverError> {
        validate_board(init_board)?;

        let mut combos = [range1.combos().to_vec(), range2.combos().to_vec()];
        set_rel_probabilities(&mut combos, init_board);

        let matching = [
            matching_indices(&combos[0], &combos[1]),
            matching_indices(&combos[1], &combos[0]),
        ];

        Ok(Self { combos, matching })
    }

    #[inline]
    pub fn num_hands(&self, player: u8) -> usize {
        self.preflop_combos(player).len()
    }

    #[inline]
    pub fn preflop_combos(&self, player: u8) -> &[PreflopCombo] {
        debug_assert!(player == 1 || player == 2);
        &self.combos[player as usize - 1]
    }

    /// For each of `player`'s combos, the index of the identical holding in
    /// the opponent's range, if present.
    #[inline]
    pub(crate) fn matching_combo_indices(&self, player: u8) -> &[Option<u16>] {
        debug_assert!(player == 1 || player == 2);
        &self.matching[player as usize - 1]
    }

    /// Initial reach probabilities against a board: a combo's absolute
    /// weight, or zero when it overlaps the board.
    pub fn initial_reach_probs(&self, player: u8, board: &[Card]) -> Vec<f32> {
        let mask = board_mask(board);
        self.preflop_combos(player)
            .iter()
            .map(|combo| {
                if combo.overlaps_mask(mask) {
                    0.0
                } else {
                    combo.probability
                }
            })
            .collect()
    }
}

/// Computes board-conditioned relative probabilities for both players.
///
/// For each hero combo `h`: `rel[h] = p(h) * sum of p(v)` over villain
/// combos disjoint from both the board and `h`, then normalised per player
/// to sum to one. Combos that block most of the opponent's range end up
/// down-weighted.
fn set_rel_probabilities(combos: &mut [Vec<PreflopCombo>; 2], init_board: &[Card]) {
    let mask = board_mask(init_board);

    for player in 0..2 {
        let villain_combos = combos[player ^ 1].clone();
        let hero_combos = &mut combos[player];
        let mut rel_sum = 0.0f64;

        for hero_combo in hero_combos.iter_mut() {
            if hero_combo.overlaps_mask(mask) {
                hero_combo.rel_probability = 0.0;
                continue;
            }

            let villain_sum: f64 = villain_combos
                .iter()
                .filter(|v| !v.overlaps_mask(mask) && !v.overlaps(hero_combo))
                .map(|v| v.probability as f64)
                .sum();

            hero_combo.rel_probability = (villain_sum * hero_combo.probability as f64) as f32;
            rel_sum += hero_combo.rel_probability as f64;
        }

        if rel_sum > 0.0 {
            for hero_combo in hero_combos.iter_mut() {
                hero_combo.rel_probability = (hero_combo.rel_probability as f64 / rel_sum) as f32;
            }
        }
    }
}

fn matching_indices(hero: &[PreflopCombo], villain: &[PreflopCombo]) -> Vec<Option<u16>> {
    hero.iter()
        .map(|h| {
            villain
                .iter()
                .position(|v| v.same_hand(h))
                .map(|i| i as u16)
        })
        .collect()
}
