//! Best-response traversal and exploitability.
//!
//! Holding the opponent's *average* strategy fixed, the hero picks the
//! per-hand maximum over actions at every decision point. The two
//! best-response EVs sum to zero exactly at a Nash equilibrium; any positive
//! sum, halved and normalised to the starting pot, is the reported
//! exploitability.

use crate::card::*;
use crate::cfr::{allin_utils, showdown_utils, uncontested_utils, TraversalContext};
use crate::isomorphism::apply_swap;
use crate::range_manager::RangeManager;
use crate::river::RiverRangeManager;
use crate::sliceop::*;
use crate::tree::*;

pub struct BestResponse<'a> {
    range_manager: &'a RangeManager,
    river_ranges: &'a RiverRangeManager,
}

impl<'a> BestResponse<'a> {
    pub fn new(range_manager: &'a RangeManager, river_ranges: &'a RiverRangeManager) -> Self {
        Self {
            range_manager,
            river_ranges,
        }
    }

    /// Joint exploitability of the averaged strategy pair, as a percentage
    /// of the starting pot.
    pub fn exploitability(
        &self,
        root: &Node,
        board: &[Card],
        starting_pot: i32,
        in_position_player: u8,
    ) -> f32 {
        let oop = 3 - in_position_player;
        let oop_ev = self.best_response_ev(root, board, oop);
        let ip_ev = self.best_response_ev(root, board, in_position_player);

        let exploitability_chips = ((oop_ev + ip_ev) / 2.0).max(0.0);
        100.0 * exploitability_chips / starting_pot as f32
    }

    /// The hero's best-response EV in chips, averaged over the weighted
    /// disjoint combo matchups.
    pub fn best_response_ev(&self, root: &Node, board: &[Card], hero: u8) -> f32 {
        let ctx = TraversalContext::new(self.range_manager, self.river_ranges, hero);
        let mask = board_mask(board);

        let mut num_combinations = 0.0f64;
        for hero_combo in ctx.hero_combos {
            if hero_combo.overlaps_mask(mask) {
                continue;
            }
            for villain_combo in ctx.villain_combos {
                if !villain_combo.overlaps_mask(mask) && !villain_combo.overlaps(hero_combo) {
                    num_combinations +=
                        hero_combo.probability as f64 * villain_combo.probability as f64;
                }
            }
        }
        if num_combinations == 0.0 {
            return 0.0;
        }

        let villain_reach = self
            .range_manager
            .initial_reach_probs(ctx.villain, board);
        let cfvs = self.traverse(&ctx, root, board, &villain_reach);

        let weighted_cfv_sum: f64 = ctx
            .hero_combos
            .iter()
            .zip(&cfvs)
            .filter(|(combo, _)| !combo.overlaps_mask(mask))
            .map(|(combo, &cfv)| combo.probability as f64 * cfv as f64)
            .sum();

        (weighted_cfv_sum / num_combinations) as f32
    }

    fn traverse(
        &self,
        ctx: &TraversalContext,
        node: &Node,
        board: &[Card],
        villain_reach: &[f32],
    ) -> Vec<f32> {
        match node {
            Node::Action(action_node) => {
                self.action_best_response(ctx, action_node, board, villain_reach)
            }
            Node::Chance(chance_node) => {
                self.chance_best_response(ctx, chance_node, board, villain_reach)
            }
            Node::Terminal(terminal_node) => match terminal_node.kind {
                TerminalKind::Uncontested => uncontested_utils(
                    ctx,
                    terminal_node.pot,
                    terminal_node.last_to_act,
                    board,
                    villain_reach,
                ),
                TerminalKind::Showdown => {
                    showdown_utils(ctx, terminal_node.pot, board, villain_reach)
                }
                TerminalKind::Allin => allin_utils(ctx, terminal_node.pot, board, villain_reach),
            },
        }
    }

    fn action_best_response(
        &self,
        ctx: &TraversalContext,
        node: &ActionNode,
        board: &[Card],
        villain_reach: &[f32],
    ) -> Vec<f32> {
        let num_hero_hands = ctx.num_hero_hands();

        if node.player() == ctx.hero {
            let mut action_evs = vec![0.0; node.num_actions() * num_hero_hands];
            for action in 0..node.num_actions() {
                let evs = self.traverse(ctx, node.child(action), board, villain_reach);
                row_mut(&mut action_evs, action, num_hero_hands).copy_from_slice(&evs);
            }

            let mut max_evs = vec![0.0; num_hero_hands];
            max_slices(&mut max_evs, &action_evs);
            max_evs
        } else {
            let num_villain_hands = ctx.num_villain_hands();
            let average_strategy = node.average_strategy();

            let mut result = vec![0.0; num_hero_hands];
            for action in 0..node.num_actions() {
                let mut new_villain_reach = villain_reach.to_vec();
                mul_slice(
                    &mut new_villain_reach,
                    row(&average_strategy, action, num_villain_hands),
                );
                let action_evs =
                    self.traverse(ctx, node.child(action), board, &new_villain_reach);
                add_slice(&mut result, &action_evs);
            }
            result
        }
    }

    fn chance_best_response(
        &self,
        ctx: &TraversalContext,
        node: &ChanceNode,
        board: &[Card],
        villain_reach: &[f32],
    ) -> Vec<f32> {
        let mask = board_mask(board);
        let num_villain_hands = ctx.num_villain_hands();
        let mut result = vec![0.0; ctx.num_hero_hands()];

        for card in 0..NUM_CARDS as Card {
            if card_mask(card) & mask != 0 {
                continue;
            }

            let (child, swap) = match node.child(card) {
                Some(child) => (child, None),
                None => {
                    let Some(rep) = node.iso().alias(card) else {
                        continue;
                    };
                    let Some(child) = node.child(rep) else {
                        continue;
                    };
                    (child, Some(node.iso().swap_list(card, ctx.hero)))
                }
            };

            let mut new_board = board.to_vec();
            new_board.push(card);

            let mut new_villain_reach = vec![0.0; num_villain_hands];
            for (hand, combo) in ctx.villain_combos.iter().enumerate() {
                if !combo.overlaps_mask(card_mask(card)) {
                    new_villain_reach[hand] = villain_reach[hand];
                }
            }

            let mut subgame_evs = self.traverse(ctx, child, &new_board, &new_villain_reach);
            if let Some(swap) = swap {
                apply_swap(&mut subgame_evs, swap);
            }
            add_slice(&mut result, &subgame_evs);
        }

        mul_slice_scalar(&mut result, 1.0 / node.chance_factor() as f32);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    fn setup(
        r1: &str,
        r2: &str,
        board: &str,
        pot: i32,
        stack: i32,
    ) -> (GameTree, RangeManager, Vec<Card>) {
        let range1: Range = r1.parse().unwrap();
        let range2: Range = r2.parse().unwrap();
        let board = board_from_str(board).unwrap();
        let rm = RangeManager::new(&range1, &range2, &board).unwrap();
        let config = TreeConfig {
            in_position_player: 2,
            starting_pot: pot,
            starting_stack: stack,
            minimum_bet: 10,
            all_in_threshold: 0.67,
            bet_sizing: BetSizingConfig::default(),
            raise_cap: -1,
            remove_donk_bets: false,
            use_isomorphism: true,
            compression: true,
        };
        let tree = TreeBuilder::new(&rm, board.clone(), config)
            .unwrap()
            .build()
            .unwrap();
        (tree, rm, board)
    }

    #[test]
    fn test_dominated_showdown_evs() {
        // stack 0: pure showdown, hero AA nets +100, villain KK nets -100
        let (tree, rm, board) = setup("AA", "KK", "2c 7d 3s 8d Th", 200, 0);
        let rrm = RiverRangeManager::new();
        let br = BestResponse::new(&rm, &rrm);

        let oop_ev = br.best_response_ev(tree.root(), &board, 1);
        let ip_ev = br.best_response_ev(tree.root(), &board, 2);
        assert!((oop_ev - 100.0).abs() < 1e-3, "oop: {oop_ev}");
        assert!((ip_ev + 100.0).abs() < 1e-3, "ip: {ip_ev}");

        let exploitability = br.exploitability(tree.root(), &board, 200, 2);
        assert!(exploitability.abs() < 1e-4);
    }

    #[test]
    fn test_mirrored_showdown_is_unexploitable() {
        let (tree, rm, board) = setup("AA", "AA", "2c 7d Kh 3s 9h", 100, 0);
        let rrm = RiverRangeManager::new();
        let br = BestResponse::new(&rm, &rrm);
        let exploitability = br.exploitability(tree.root(), &board, 100, 2);
        assert!(exploitability.abs() < 1e-4);
    }

    #[test]
    fn test_untrained_tree_is_exploitable() {
        // uniform strategies fold too often; best response must profit
        let (tree, rm, board) = setup("AA,KK,QQ", "AA,KK,QQ", "2c 7d 3s 8d Th", 100, 1000);
        let rrm = RiverRangeManager::new();
        let br = BestResponse::new(&rm, &rrm);
        let exploitability = br.exploitability(tree.root(), &board, 100, 2);
        assert!(exploitability > 1.0, "got {exploitability}");
    }
}
