//! The vector-CFR traversal.
//!
//! One recursion computes, for a fixed (hero, villain) perspective, the
//! per-hand counterfactual value vector of every node. Regret and cumulative
//! strategy updates happen on the hero's action nodes only, after the child
//! tasks have joined.

use crate::card::*;
use crate::dcfr::DiscountParams;
use crate::isomorphism::{apply_swap, SwapList};
use crate::range::PreflopCombo;
use crate::range_manager::RangeManager;
use crate::river::RiverRangeManager;
use crate::sliceop::*;
use crate::tree::*;

/// Immutable context of one traversal perspective.
pub(crate) struct TraversalContext<'a> {
    pub hero: u8,
    pub villain: u8,
    pub hero_combos: &'a [PreflopCombo],
    pub villain_combos: &'a [PreflopCombo],
    /// Index of the hero combo's identical holding in the villain's range.
    pub hero_to_villain: &'a [Option<u16>],
    pub river_ranges: &'a RiverRangeManager,
}

impl<'a> TraversalContext<'a> {
    pub(crate) fn new(
        range_manager: &'a RangeManager,
        river_ranges: &'a RiverRangeManager,
        hero: u8,
    ) -> Self {
        let villain = 3 - hero;
        Self {
            hero,
            villain,
            hero_combos: range_manager.preflop_combos(hero),
            villain_combos: range_manager.preflop_combos(villain),
            hero_to_villain: range_manager.matching_combo_indices(hero),
            river_ranges,
        }
    }

    #[inline]
    pub(crate) fn num_hero_hands(&self) -> usize {
        self.hero_combos.len()
    }

    #[inline]
    pub(crate) fn num_villain_hands(&self) -> usize {
        self.villain_combos.len()
    }

    /// Reach probability of the villain holding the exact same combo as the
    /// hero's hand, the add-back term of the blocker corrections.
    #[inline]
    pub(crate) fn matching_villain_reach(&self, hero_hand: usize, villain_reach: &[f32]) -> f32 {
        self.hero_to_villain[hero_hand]
            .map(|index| villain_reach[index as usize])
            .unwrap_or(0.0)
    }
}

/// Recursively computes the hero's counterfactual values under `node`.
pub(crate) fn cfr_traverse(
    ctx: &TraversalContext,
    params: &DiscountParams,
    node: &Node,
    board: &[Card],
    hero_reach: &[f32],
    villain_reach: &[f32],
) -> Vec<f32> {
    match node {
        Node::Action(action_node) => {
            action_node_utility(ctx, params, action_node, board, hero_reach, villain_reach)
        }
        Node::Chance(chance_node) => {
            chance_node_utility(ctx, params, chance_node, board, hero_reach, villain_reach)
        }
        Node::Terminal(terminal_node) => terminal_utility(ctx, terminal_node, board, villain_reach),
    }
}

fn action_node_utility(
    ctx: &TraversalContext,
    params: &DiscountParams,
    node: &ActionNode,
    board: &[Card],
    hero_reach: &[f32],
    villain_reach: &[f32],
) -> Vec<f32> {
    let num_hero_hands = ctx.num_hero_hands();
    let num_actions = node.num_actions();
    let strategy = node.dcfr().current_strategy();

    let mut cfv_actions = vec![0.0; num_actions * num_hero_hands];

    if node.player() == ctx.hero {
        for_each_row(&mut cfv_actions, num_hero_hands, |action, out| {
            let mut new_hero_reach = hero_reach.to_vec();
            mul_slice(&mut new_hero_reach, row(&strategy, action, num_hero_hands));
            let cfv = cfr_traverse(
                ctx,
                params,
                node.child(action),
                board,
                &new_hero_reach,
                villain_reach,
            );
            out.copy_from_slice(&cfv);
        });

        // expected value per hand under the current strategy
        let mut result = vec![0.0; num_hero_hands];
        fma_slices(&mut result, &strategy, &cfv_actions);

        let mut dcfr = node.dcfr();
        dcfr.update_regrets(&cfv_actions, &result, params);
        dcfr.update_cum_strategy(&strategy, hero_reach, params);

        result
    } else {
        let num_villain_hands = ctx.num_villain_hands();

        for_each_row(&mut cfv_actions, num_hero_hands, |action, out| {
            let mut new_villain_reach = villain_reach.to_vec();
            mul_slice(&mut new_villain_reach, row(&strategy, action, num_villain_hands));
            let cfv = cfr_traverse(
                ctx,
                params,
                node.child(action),
                board,
                hero_reach,
                &new_villain_reach,
            );
            out.copy_from_slice(&cfv);
        });

        // the villain's choice is averaged out into the hero's value
        let mut result = vec![0.0; num_hero_hands];
        sum_slices(&mut result, &cfv_actions);
        result
    }
}

/// A resolvable deal at a chance node: either a representative child, or an
/// aliased card routed through the representative with a swap applied.
struct Deal<'a> {
    card: Card,
    child: &'a Node,
    swap: Option<&'a SwapList>,
}

fn resolve_deals<'a>(node: &'a ChanceNode, board: &[Card], hero: u8) -> Vec<Deal<'a>> {
    let mask = board_mask(board);
    (0..NUM_CARDS as Card)
        .filter(|&card| card_mask(card) & mask == 0)
        .filter_map(|card| {
            if let Some(child) = node.child(card) {
                Some(Deal {
                    card,
                    child,
                    swap: None,
                })
            } else {
                let rep = node.iso().alias(card)?;
                node.child(rep).map(|child| Deal {
                    card,
                    child,
                    swap: Some(node.iso().swap_list(card, hero)),
                })
            }
        })
        .collect()
}

fn chance_node_utility(
    ctx: &TraversalContext,
    params: &DiscountParams,
    node: &ChanceNode,
    board: &[Card],
    hero_reach: &[f32],
    villain_reach: &[f32],
) -> Vec<f32> {
    let num_hero_hands = ctx.num_hero_hands();
    let num_villain_hands = ctx.num_villain_hands();
    let weights = chance_card_weights(ctx, villain_reach, board);
    let deals = resolve_deals(node, board, ctx.hero);

    let mut cfv_deals = vec![0.0; deals.len() * num_hero_hands];
    for_each_row(&mut cfv_deals, num_hero_hands, |index, out| {
        let deal = &deals[index];
        let card = deal.card;

        let mut new_board = board.to_vec();
        new_board.push(card);

        let mut new_hero_reach = vec![0.0; num_hero_hands];
        for (hand, combo) in ctx.hero_combos.iter().enumerate() {
            if !combo.overlaps_mask(card_mask(card)) {
                new_hero_reach[hand] =
                    hero_reach[hand] * weights[hand + card as usize * num_hero_hands];
            }
        }

        let mut new_villain_reach = vec![0.0; num_villain_hands];
        for (hand, combo) in ctx.villain_combos.iter().enumerate() {
            if !combo.overlaps_mask(card_mask(card)) {
                new_villain_reach[hand] = villain_reach[hand];
            }
        }

        let mut cfv = cfr_traverse(
            ctx,
            params,
            deal.child,
            &new_board,
            &new_hero_reach,
            &new_villain_reach,
        );
        if let Some(swap) = deal.swap {
            apply_swap(&mut cfv, swap);
        }
        out.copy_from_slice(&cfv);
    });

    let mut result = vec![0.0; num_hero_hands];
    sum_slices(&mut result, &cfv_deals);
    mul_slice_scalar(&mut result, 1.0 / node.chance_factor() as f32);
    result
}

/// Per-hand, per-card conditional weights of the next deal given the
/// villain's reach: for each live hero hand, the villain reach mass
/// compatible with the card, blocker-corrected and normalised over cards.
pub(crate) fn chance_card_weights(
    ctx: &TraversalContext,
    villain_reach: &[f32],
    board: &[Card],
) -> Vec<f32> {
    let num_hero_hands = ctx.num_hero_hands();
    let board_mask = board_mask(board);

    let mut villain_total = 0.0f32;
    let mut villain_with_card = [0.0f32; NUM_CARDS];
    for (hand, combo) in ctx.villain_combos.iter().enumerate() {
        let reach = villain_reach[hand];
        villain_with_card[combo.card1 as usize] += reach;
        villain_with_card[combo.card2 as usize] += reach;
        villain_total += reach;
    }

    let mut weights = vec![0.0f32; num_hero_hands * NUM_CARDS];
    for (hand, combo) in ctx.hero_combos.iter().enumerate() {
        if combo.overlaps_mask(board_mask) {
            continue;
        }

        let matching_reach = ctx.matching_villain_reach(hand, villain_reach);
        let blocked = villain_with_card[combo.card1 as usize]
            + villain_with_card[combo.card2 as usize]
            - matching_reach;

        let mut total_weight = 0.0f32;
        for card in 0..NUM_CARDS as Card {
            if card_mask(card) & board_mask != 0 || combo.overlaps_mask(card_mask(card)) {
                continue;
            }
            let weight =
                (villain_total - villain_with_card[card as usize] - blocked).max(0.0);
            weights[hand + card as usize * num_hero_hands] = weight;
            total_weight += weight;
        }

        if total_weight > 0.0 {
            for card in 0..NUM_CARDS {
                weights[hand + card * num_hero_hands] /= total_weight;
            }
        }
    }

    weights
}

fn terminal_utility(
    ctx: &TraversalContext,
    node: &TerminalNode,
    board: &[Card],
    villain_reach: &[f32],
) -> Vec<f32> {
    match node.kind {
        TerminalKind::Uncontested => {
            uncontested_utils(ctx, node.pot, node.last_to_act, board, villain_reach)
        }
        TerminalKind::Showdown => showdown_utils(ctx, node.pot, board, villain_reach),
        TerminalKind::Allin => allin_utils(ctx, node.pot, board, villain_reach),
    }
}

/// A fold ended the hand: the winner takes the pot, weighted by the villain
/// reach compatible with each hero hand.
pub(crate) fn uncontested_utils(
    ctx: &TraversalContext,
    pot: i32,
    last_to_act: u8,
    board: &[Card],
    villain_reach: &[f32],
) -> Vec<f32> {
    let board_mask = board_mask(board);

    let mut villain_sum = 0.0f32;
    let mut sum_with_card = [0.0f32; NUM_CARDS];
    for (hand, combo) in ctx.villain_combos.iter().enumerate() {
        if combo.overlaps_mask(board_mask) {
            continue;
        }
        let reach = villain_reach[hand];
        sum_with_card[combo.card1 as usize] += reach;
        sum_with_card[combo.card2 as usize] += reach;
        villain_sum += reach;
    }

    // `last_to_act` marks the folder
    let value = if ctx.hero == last_to_act {
        -(pot as f32) / 2.0
    } else {
        pot as f32 / 2.0
    };

    let mut utils = vec![0.0; ctx.num_hero_hands()];
    for (hand, combo) in ctx.hero_combos.iter().enumerate() {
        if combo.overlaps_mask(board_mask) {
            continue;
        }

        // the two per-card subtractions double-count combos identical to the
        // hero's hand; add the matching reach back
        let matching_reach = ctx.matching_villain_reach(hand, villain_reach);
        utils[hand] = value
            * (villain_sum
                - sum_with_card[combo.card1 as usize]
                - sum_with_card[combo.card2 as usize]
                + matching_reach);
    }

    utils
}

/// Showdown on a complete board: two simultaneous sweeps over both players'
/// strength-sorted river combos, with per-card running sums correcting for
/// shared-card blockers. Ties contribute nothing.
pub(crate) fn showdown_utils(
    ctx: &TraversalContext,
    pot: i32,
    board: &[Card],
    villain_reach: &[f32],
) -> Vec<f32> {
    let hero_combos = ctx
        .river_ranges
        .river_combos(ctx.hero, ctx.hero_combos, board);
    let villain_combos = ctx
        .river_ranges
        .river_combos(ctx.villain, ctx.villain_combos, board);

    let mut utils = vec![0.0; ctx.num_hero_hands()];
    let value = pot as f32 / 2.0;

    // hands the hero beats
    let mut win_sum = 0.0f32;
    let mut card_win_sum = [0.0f32; NUM_CARDS];
    let mut j = 0;
    for hero_combo in hero_combos.iter() {
        while j < villain_combos.len() && hero_combo.strength > villain_combos[j].strength {
            let villain_combo = &villain_combos[j];
            let reach = villain_reach[villain_combo.reach_index as usize];
            win_sum += reach;
            card_win_sum[villain_combo.card1 as usize] += reach;
            card_win_sum[villain_combo.card2 as usize] += reach;
            j += 1;
        }

        utils[hero_combo.reach_index as usize] = value
            * (win_sum
                - card_win_sum[hero_combo.card1 as usize]
                - card_win_sum[hero_combo.card2 as usize]);
    }

    // hands the hero loses to
    let mut lose_sum = 0.0f32;
    let mut card_lose_sum = [0.0f32; NUM_CARDS];
    let mut j = villain_combos.len();
    for hero_combo in hero_combos.iter().rev() {
        while j > 0 && hero_combo.strength < villain_combos[j - 1].strength {
            let villain_combo = &villain_combos[j - 1];
            let reach = villain_reach[villain_combo.reach_index as usize];
            lose_sum += reach;
            card_lose_sum[villain_combo.card1 as usize] += reach;
            card_lose_sum[villain_combo.card2 as usize] += reach;
            j -= 1;
        }

        utils[hero_combo.reach_index as usize] -= value
            * (lose_sum
                - card_lose_sum[hero_combo.card1 as usize]
                - card_lose_sum[hero_combo.card2 as usize]);
    }

    utils
}

/// All-in before the river: deal the remaining board cards uniformly (no
/// isomorphism here) and average the showdown values by the unseen-card
/// count of each street.
pub(crate) fn allin_utils(
    ctx: &TraversalContext,
    pot: i32,
    board: &[Card],
    villain_reach: &[f32],
) -> Vec<f32> {
    if board.len() == 5 {
        return showdown_utils(ctx, pot, board, villain_reach);
    }

    let board_mask = board_mask(board);
    let unseen = (NUM_CARDS - board.len()) as f32;
    let num_villain_hands = ctx.num_villain_hands();

    let mut result = vec![0.0; ctx.num_hero_hands()];
    let mut new_board = board.to_vec();
    new_board.push(0);

    for card in 0..NUM_CARDS as Card {
        if card_mask(card) & board_mask != 0 {
            continue;
        }
        *new_board.last_mut().unwrap() = card;

        let mut new_villain_reach = vec![0.0; num_villain_hands];
        for (hand, combo) in ctx.villain_combos.iter().enumerate() {
            if !combo.overlaps_mask(card_mask(card)) {
                new_villain_reach[hand] = villain_reach[hand];
            }
        }

        let sub = allin_utils(ctx, pot, &new_board, &new_villain_reach);
        result
            .iter_mut()
            .zip(&sub)
            .for_each(|(r, s)| *r += s / unseen);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    fn setup(r1: &str, r2: &str, board: &str) -> (RangeManager, RiverRangeManager, Vec<Card>) {
        let range1: Range = r1.parse().unwrap();
        let range2: Range = r2.parse().unwrap();
        let board = board_from_str(board).unwrap();
        let rm = RangeManager::new(&range1, &range2, &board).unwrap();
        (rm, RiverRangeManager::new(), board)
    }

    #[test]
    fn test_showdown_tie_is_zero() {
        // mirrored ranges on a board that plays itself for nobody: AA vs AA
        let (rm, rrm, board) = setup("AA", "AA", "2c 7d Kh 3s 9h");
        let ctx = TraversalContext::new(&rm, &rrm, 1);
        let villain_reach = rm.initial_reach_probs(2, &board);

        let utils = showdown_utils(&ctx, 100, &board, &villain_reach);
        for (hand, &util) in utils.iter().enumerate() {
            assert!(
                util.abs() < 1e-6,
                "hand {hand} should tie, got {util}"
            );
        }
    }

    #[test]
    fn test_showdown_dominated_range() {
        // hero AA vs villain KK on a dry runout: hero wins the full pot
        let (rm, rrm, board) = setup("AA", "KK", "2c 7d 3s 8d Th");
        let villain_reach = rm.initial_reach_probs(2, &board);

        let ctx = TraversalContext::new(&rm, &rrm, 1);
        let utils = showdown_utils(&ctx, 200, &board, &villain_reach);
        for &util in &utils {
            // six live villain combos, each contributing pot/2
            assert!((util - 600.0).abs() < 1e-3, "got {util}");
        }

        let ctx = TraversalContext::new(&rm, &rrm, 2);
        let hero_reach = rm.initial_reach_probs(1, &board);
        let utils = showdown_utils(&ctx, 200, &board, &hero_reach);
        for &util in &utils {
            assert!((util + 600.0).abs() < 1e-3, "got {util}");
        }
    }

    #[test]
    fn test_showdown_zero_sum() {
        let (rm, rrm, board) = setup("AA,KK,QQ,JJ", "AA,TT,99", "2c 7d Kh 3s 9h");
        let p1_reach = rm.initial_reach_probs(1, &board);
        let p2_reach = rm.initial_reach_probs(2, &board);

        let ctx1 = TraversalContext::new(&rm, &rrm, 1);
        let ctx2 = TraversalContext::new(&rm, &rrm, 2);
        let utils1 = showdown_utils(&ctx1, 100, &board, &p2_reach);
        let utils2 = showdown_utils(&ctx2, 100, &board, &p1_reach);

        let total1: f32 = utils1
            .iter()
            .zip(&p1_reach)
            .map(|(u, r)| u * r)
            .sum();
        let total2: f32 = utils2
            .iter()
            .zip(&p2_reach)
            .map(|(u, r)| u * r)
            .sum();
        assert!(
            (total1 + total2).abs() < 0.05,
            "zero-sum violated: {total1} + {total2}"
        );
    }

    #[test]
    fn test_showdown_pairwise_zero_sum() {
        // with singleton reach vectors, utils[h] is the raw pair utility
        let (rm, rrm, board) = setup("AA,KK,QQ", "AA,KK,QQ", "2c 7d Kh 3s 9h");
        let ctx1 = TraversalContext::new(&rm, &rrm, 1);
        let ctx2 = TraversalContext::new(&rm, &rrm, 2);
        let num_hands = ctx1.num_hero_hands();

        for v in 0..num_hands {
            let mut villain_reach = vec![0.0; num_hands];
            villain_reach[v] = 1.0;
            let utils1 = showdown_utils(&ctx1, 100, &board, &villain_reach);

            for h in 0..num_hands {
                let mut hero_reach = vec![0.0; num_hands];
                hero_reach[h] = 1.0;
                let utils2 = showdown_utils(&ctx2, 100, &board, &hero_reach);
                assert!(
                    (utils1[h] + utils2[v]).abs() < 1e-4,
                    "pair ({h}, {v}): {} + {}",
                    utils1[h],
                    utils2[v]
                );
            }
        }
    }

    #[test]
    fn test_uncontested_blocked_hand_is_zero() {
        // villain's entire range shares both cards with one hero combo
        let (rm, rrm, board) = setup("AA", "AA", "2c 7d Kh");
        let ctx = TraversalContext::new(&rm, &rrm, 1);

        // villain reach concentrated on the exact combo AcAd
        let mut villain_reach = vec![0.0; 6];
        villain_reach[0] = 1.0;

        let utils = uncontested_utils(&ctx, 100, 2, &board, &villain_reach);
        // hero's AcAd is fully blocked: sum - with_c1 - with_c2 + matching = 0
        assert!(utils[0].abs() < 1e-6);
        // hero combos sharing one card are also dead against this reach
        assert!(utils[1].abs() < 1e-6);
        // AhAs shares nothing and wins the half pot
        assert!((utils[5] - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_uncontested_sign_follows_folder() {
        let (rm, rrm, board) = setup("AA", "KK", "2c 7d Kh");
        let villain_reach = rm.initial_reach_probs(2, &board);
        let ctx = TraversalContext::new(&rm, &rrm, 1);

        let hero_folds = uncontested_utils(&ctx, 100, 1, &board, &villain_reach);
        let villain_folds = uncontested_utils(&ctx, 100, 2, &board, &villain_reach);
        assert!(hero_folds.iter().all(|&u| u <= 0.0));
        assert!(villain_folds.iter().all(|&u| u >= 0.0));
        assert!((hero_folds[0] + villain_folds[0]).abs() < 1e-6);
    }

    #[test]
    fn test_allin_matches_showdown_on_river() {
        let (rm, rrm, board) = setup("AA", "KK", "2c 7d 3s 8d Th");
        let villain_reach = rm.initial_reach_probs(2, &board);
        let ctx = TraversalContext::new(&rm, &rrm, 1);

        let allin = allin_utils(&ctx, 200, &board, &villain_reach);
        let showdown = showdown_utils(&ctx, 200, &board, &villain_reach);
        assert_eq!(allin, showdown);
    }

    #[test]
    fn test_allin_runout_zero_sum() {
        let (rm, rrm, board) = setup("AA,QQ", "KK,JJ", "2c 7d 3s");
        let p1_reach = rm.initial_reach_probs(1, &board);
        let p2_reach = rm.initial_reach_probs(2, &board);

        let ctx1 = TraversalContext::new(&rm, &rrm, 1);
        let ctx2 = TraversalContext::new(&rm, &rrm, 2);
        let utils1 = allin_utils(&ctx1, 200, &board, &p2_reach);
        let utils2 = allin_utils(&ctx2, 200, &board, &p1_reach);

        let total1: f32 = utils1.iter().zip(&p1_reach).map(|(u, r)| u * r).sum();
        let total2: f32 = utils2.iter().zip(&p2_reach).map(|(u, r)| u * r).sum();
        assert!((total1 + total2).abs() < 1.0, "{total1} + {total2}");
    }

    #[test]
    fn test_chance_card_weights_normalised() {
        let (rm, rrm, board) = setup("AA,KK", "QQ,JJ,TT", "2c 7d 3s");
        let villain_reach = rm.initial_reach_probs(2, &board);
        let ctx = TraversalContext::new(&rm, &rrm, 1);

        let weights = chance_card_weights(&ctx, &villain_reach, &board);
        let num_hands = ctx.num_hero_hands();
        for hand in 0..num_hands {
            let sum: f32 = (0..NUM_CARDS).map(|c| weights[hand + c * num_hands]).sum();
            assert!((sum - 1.0).abs() < 1e-5, "hand {hand}: {sum}");
        }
    }
}
