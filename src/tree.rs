//! Game-tree construction under a fixed bet-sizing abstraction.

use crate::card::*;
use crate::dcfr::DcfrState;
use crate::error::SolverError;
use crate::game::*;
use crate::isomorphism::IsomorphismData;
use crate::mutex_like::{MutexGuardLike, MutexLike};
use crate::range_manager::RangeManager;
use serde::{Deserialize, Serialize};

/// Bet and raise sizes of one street, as fractions of the post-call pot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetSizing {
    pub bet_sizes: Vec<f32>,
    pub raise_sizes: Vec<f32>,
}

impl StreetSizing {
    fn validate(&self, street: &str) -> Result<(), SolverError> {
        for &size in self.bet_sizes.iter().chain(&self.raise_sizes) {
            if !(size > 0.0) {
                return Err(SolverError::InvalidSettings(format!(
                    "non-positive bet size {size} on the {street}"
                )));
            }
        }
        Ok(())
    }
}

/// Parses comma-separated pot-percentage strings, e.g.
/// `("50%, 100%", "100%")`.
impl TryFrom<(&str, &str)> for StreetSizing {
    type Error = SolverError;

    fn try_from((bets, raises): (&str, &str)) -> Result<Self, Self::Error> {
        Ok(Self {
            bet_sizes: sizes_from_str(bets)?,
            raise_sizes: sizes_from_str(raises)?,
        })
    }
}

fn sizes_from_str(s: &str) -> Result<Vec<f32>, SolverError> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            let percent = t.strip_suffix('%').ok_or_else(|| {
                SolverError::InvalidSettings(format!("bet size must end in '%': '{t}'"))
            })?;
            let value: f32 = percent.parse().map_err(|_| {
                SolverError::InvalidSettings(format!("malformed bet size: '{t}'"))
            })?;
            Ok(value / 100.0)
        })
        .collect()
}

/// Per-street bet-sizing abstraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetSizingConfig {
    pub flop: StreetSizing,
    pub turn: StreetSizing,
    pub river: StreetSizing,
}

impl Default for BetSizingConfig {
    fn default() -> Self {
        let late = StreetSizing {
            bet_sizes: vec![0.33, 0.66, 1.0],
            raise_sizes: vec![0.5, 1.0],
        };
        Self {
            flop: StreetSizing {
                bet_sizes: vec![0.5, 1.0],
                raise_sizes: vec![1.0],
            },
            turn: late.clone(),
            river: late,
        }
    }
}

impl BetSizingConfig {
    #[inline]
    pub fn for_street(&self, street: Street) -> &StreetSizing {
        match street {
            Street::Flop => &self.flop,
            Street::Turn => &self.turn,
            Street::River => &self.river,
        }
    }
}

fn default_all_in_threshold() -> f32 {
    0.67
}

fn default_in_position_player() -> u8 {
    2
}

fn default_raise_cap() -> i32 {
    -1
}

fn default_true() -> bool {
    true
}

/// Tree-builder input. Ranges and the board are supplied separately through
/// the [`RangeManager`] and the builder constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// The player acting last on every street, `1` or `2`.
    #[serde(default = "default_in_position_player")]
    pub in_position_player: u8,
    pub starting_pot: i32,
    pub starting_stack: i32,
    pub minimum_bet: i32,
    /// A candidate wager consuming at least this fraction of the remaining
    /// stack becomes an all-in shove.
    #[serde(default = "default_all_in_threshold")]
    pub all_in_threshold: f32,
    #[serde(default)]
    pub bet_sizing: BetSizingConfig,
    /// Maximum raises per street; `-1` disables the cap. All-in raises are
    /// never suppressed.
    #[serde(default = "default_raise_cap")]
    pub raise_cap: i32,
    /// Removes the out-of-position player's opening bets on streets after a
    /// street that checked through.
    #[serde(default)]
    pub remove_donk_bets: bool,
    #[serde(default = "default_true")]
    pub use_isomorphism: bool,
    /// Stores cumulative strategies quantised (`i16` + scale) rather than as
    /// `f32`.
    #[serde(default = "default_true")]
    pub compression: bool,
}

impl TreeConfig {
    fn validate(&self) -> Result<(), SolverError> {
        if self.in_position_player != 1 && self.in_position_player != 2 {
            return Err(SolverError::InvalidSettings(format!(
                "in_position_player must be 1 or 2, got {}",
                self.in_position_player
            )));
        }
        if self.starting_pot <= 0 {
            return Err(SolverError::InvalidSettings(format!(
                "starting pot must be positive, got {}",
                self.starting_pot
            )));
        }
        if self.starting_stack < 0 {
            return Err(SolverError::InvalidSettings(format!(
                "starting stack must be non-negative, got {}",
                self.starting_stack
            )));
        }
        if self.minimum_bet <= 0 {
            return Err(SolverError::InvalidSettings(format!(
                "minimum bet must be positive, got {}",
                self.minimum_bet
            )));
        }
        if !(self.all_in_threshold > 0.0 && self.all_in_threshold <= 1.0) {
            return Err(SolverError::InvalidSettings(format!(
                "all-in threshold must be in (0, 1], got {}",
                self.all_in_threshold
            )));
        }
        self.bet_sizing.flop.validate("flop")?;
        self.bet_sizing.turn.validate("turn")?;
        self.bet_sizing.river.validate("river")?;
        Ok(())
    }
}

/// A decision point owned by one player.
pub struct ActionNode {
    player: u8,
    actions: Vec<Action>,
    children: Vec<Node>,
    dcfr: MutexLike<DcfrState>,
}

impl ActionNode {
    #[inline]
    pub fn player(&self) -> u8 {
        self.player
    }

    #[inline]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    #[inline]
    pub fn num_actions(&self) -> usize {
        self.actions.len()
    }

    #[inline]
    pub fn child(&self, index: usize) -> &Node {
        &self.children[index]
    }

    #[inline]
    pub(crate) fn dcfr(&self) -> MutexGuardLike<'_, DcfrState> {
        self.dcfr.lock()
    }

    /// Average strategy over all iterations, laid out as `num_actions` rows
    /// of `num_hands` entries. This is the user-facing solve output.
    pub fn average_strategy(&self) -> Vec<f32> {
        self.dcfr.lock().average_strategy()
    }

    /// Current regret-matched strategy, same layout as
    /// [`average_strategy`](Self::average_strategy).
    pub fn current_strategy(&self) -> Vec<f32> {
        self.dcfr.lock().current_strategy()
    }

    /// Single entry of the average strategy.
    pub fn average_strategy_at(&self, hand: usize, action: usize) -> f32 {
        let num_hands = self.dcfr.lock().num_hands();
        self.average_strategy()[action * num_hands + hand]
    }

    /// Single entry of the current strategy.
    pub fn current_strategy_at(&self, hand: usize, action: usize) -> f32 {
        let num_hands = self.dcfr.lock().num_hands();
        self.current_strategy()[action * num_hands + hand]
    }
}

/// Which street a chance node deals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealKind {
    Turn,
    River,
}

/// A board-card deal with 52 child slots. Cards already on the board, cards
/// aliased by suit isomorphism, and cards leaving a player without live
/// combos have no child.
pub struct ChanceNode {
    kind: DealKind,
    children: Vec<Option<Box<Node>>>,
    iso: IsomorphismData,
    chance_factor: u16,
}

impl ChanceNode {
    #[inline]
    pub fn kind(&self) -> DealKind {
        self.kind
    }

    #[inline]
    pub fn child(&self, card: Card) -> Option<&Node> {
        self.children[card as usize].as_deref()
    }

    #[inline]
    pub fn num_children(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    #[inline]
    pub(crate) fn iso(&self) -> &IsomorphismData {
        &self.iso
    }

    /// Logical count of dealable cards (representatives plus their
    /// isomorphic aliases); reach probabilities are scaled by its inverse.
    #[inline]
    pub fn chance_factor(&self) -> u16 {
        self.chance_factor
    }
}

/// Why a hand ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    /// Both remaining streets run out with no further betting.
    Allin,
    /// A player folded; `last_to_act` identifies the folder.
    Uncontested,
    /// Five-card board reached with both players live.
    Showdown,
}

/// A leaf of the game tree.
pub struct TerminalNode {
    pub kind: TerminalKind,
    pub pot: i32,
    pub last_to_act: u8,
}

/// A node of the extensive-form tree.
pub enum Node {
    Action(ActionNode),
    Chance(ChanceNode),
    Terminal(TerminalNode),
}

/// Node and storage counts gathered during the build, used for memory
/// budgeting before training allocates the DCFR arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStatistics {
    pub flop_action_nodes: u64,
    pub turn_action_nodes: u64,
    pub river_action_nodes: u64,
    pub chance_nodes: u64,
    pub terminal_nodes: u64,
    pub p1_num_hands: usize,
    pub p2_num_hands: usize,
    /// Total `num_hands * num_actions` entries over all action nodes.
    pub storage_entries: u64,
}

impl TreeStatistics {
    #[inline]
    pub fn total_action_nodes(&self) -> u64 {
        self.flop_action_nodes + self.turn_action_nodes + self.river_action_nodes
    }

    /// Estimated bytes of DCFR storage. Regrets are always quantised; the
    /// cumulative strategy doubles in size without compression.
    pub fn estimated_memory_bytes(&self, compression: bool) -> u64 {
        const NODE_OVERHEAD: u64 = 64;
        let bytes_per_entry = if compression { 4 } else { 6 };
        self.storage_entries * bytes_per_entry + self.total_action_nodes() * NODE_OVERHEAD
    }
}

/// The built tree together with everything the trainer needs to traverse it.
pub struct GameTree {
    root: Node,
    statistics: TreeStatistics,
    config: TreeConfig,
    initial_board: Vec<Card>,
}

impl GameTree {
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    #[inline]
    pub fn statistics(&self) -> &TreeStatistics {
        &self.statistics
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn initial_board(&self) -> &[Card] {
        &self.initial_board
    }
}

/// Builds the extensive-form tree by recursive case analysis on the game
/// state.
pub struct TreeBuilder<'a> {
    range_manager: &'a RangeManager,
    config: TreeConfig,
    initial_board: Vec<Card>,
    stats: TreeStatistics,
}

impl<'a> TreeBuilder<'a> {
    /// Validates settings and board; fails fast before any allocation.
    pub fn new(
        range_manager: &'a RangeManager,
        initial_board: Vec<Card>,
        config: TreeConfig,
    ) -> Result<Self, SolverError> {
        config.validate()?;
        validate_board(&initial_board)?;

        let mask = board_mask(&initial_board);
        for player in [1, 2] {
            let live = range_manager
                .preflop_combos(player)
                .iter()
                .any(|c| !c.overlaps_mask(mask));
            if !live {
                return Err(SolverError::InvalidRange(format!(
                    "player {player}'s range has no combo disjoint from the board"
                )));
            }
        }

        let stats = TreeStatistics {
            p1_num_hands: range_manager.num_hands(1),
            p2_num_hands: range_manager.num_hands(2),
            ..Default::default()
        };

        Ok(Self {
            range_manager,
            config,
            initial_board,
            stats,
        })
    }

    pub fn build(mut self) -> Result<GameTree, SolverError> {
        let state = GameState::new(
            self.initial_board.clone(),
            self.config.starting_pot,
            self.config.starting_stack,
            self.config.in_position_player,
            self.config.minimum_bet,
        )?;

        let root = if state.both_all_in() {
            self.build_runout_terminal(&state)
        } else {
            self.build_action_node(state)
        };

        Ok(GameTree {
            root,
            statistics: self.stats,
            config: self.config,
            initial_board: self.initial_board,
        })
    }

    fn build_action_node(&mut self, state: GameState) -> Node {
        let player = state.current;
        let actions = self.enumerate_actions(&state);
        debug_assert!(!actions.is_empty());

        let children = actions
            .iter()
            .map(|&action| {
                let mut next = state.clone();
                match next.apply_action(action) {
                    ActionOutcome::Folded => self.terminal(TerminalNode {
                        kind: TerminalKind::Uncontested,
                        pot: next.contested_pot(),
                        last_to_act: player,
                    }),
                    ActionOutcome::StreetClosed => {
                        self.build_street_end(next, action == Action::Check)
                    }
                    ActionOutcome::Continue => self.build_action_node(next),
                }
            })
            .collect::<Vec<_>>();

        match state.street {
            Street::Flop => self.stats.flop_action_nodes += 1,
            Street::Turn => self.stats.turn_action_nodes += 1,
            Street::River => self.stats.river_action_nodes += 1,
        }

        let num_hands = self.range_manager.num_hands(player);
        self.stats.storage_entries += (num_hands * actions.len()) as u64;

        Node::Action(ActionNode {
            player,
            dcfr: MutexLike::new(DcfrState::new(num_hands, actions.len())),
            actions,
            children,
        })
    }

    /// Betting closed without a fold: showdown, all-in runout, or the next
    /// street's chance node.
    fn build_street_end(&mut self, state: GameState, checked_through: bool) -> Node {
        if state.street == Street::River {
            self.terminal(TerminalNode {
                kind: TerminalKind::Showdown,
                pot: state.contested_pot(),
                last_to_act: state.last_to_act,
            })
        } else if state.any_all_in() {
            self.terminal(TerminalNode {
                kind: TerminalKind::Allin,
                pot: state.contested_pot(),
                last_to_act: state.last_to_act,
            })
        } else {
            self.build_chance_node(state, checked_through)
        }
    }

    fn build_runout_terminal(&mut self, state: &GameState) -> Node {
        let kind = if state.street == Street::River {
            TerminalKind::Showdown
        } else {
            TerminalKind::Allin
        };
        self.terminal(TerminalNode {
            kind,
            pot: state.contested_pot(),
            last_to_act: state.last_to_act,
        })
    }

    fn build_chance_node(&mut self, state: GameState, checked_through: bool) -> Node {
        let kind = match state.street {
            Street::Flop => DealKind::Turn,
            Street::Turn => DealKind::River,
            Street::River => unreachable!("no deal after the river"),
        };

        let range_manager = self.range_manager;
        let p1_combos = range_manager.preflop_combos(1);
        let p2_combos = range_manager.preflop_combos(2);
        let iso = if self.config.use_isomorphism {
            IsomorphismData::compute(p1_combos, p2_combos, &state.board)
        } else {
            IsomorphismData::default()
        };

        let mask = board_mask(&state.board);
        let mut children: Vec<Option<Box<Node>>> = (0..NUM_CARDS).map(|_| None).collect();
        let mut num_rep_cards = 0u16;

        for card in 0..NUM_CARDS as Card {
            if card_mask(card) & mask != 0 || iso.alias(card).is_some() {
                continue;
            }

            // prune deals that leave a player without live combos
            let dealt_mask = mask | card_mask(card);
            let both_live = [p1_combos, p2_combos]
                .iter()
                .all(|combos| combos.iter().any(|c| !c.overlaps_mask(dealt_mask)));
            if !both_live {
                continue;
            }

            let mut next = state.clone();
            next.advance_street(card, checked_through);
            children[card as usize] = Some(Box::new(self.build_action_node(next)));
            num_rep_cards += 1;
        }

        let num_iso_cards = (0..NUM_CARDS as Card)
            .filter(|&card| card_mask(card) & mask == 0)
            .filter(|&card| {
                iso.alias(card)
                    .is_some_and(|rep| children[rep as usize].is_some())
            })
            .count() as u16;

        self.stats.chance_nodes += 1;
        Node::Chance(ChanceNode {
            kind,
            children,
            iso,
            chance_factor: num_rep_cards + num_iso_cards,
        })
    }

    fn terminal(&mut self, node: TerminalNode) -> Node {
        self.stats.terminal_nodes += 1;
        Node::Terminal(node)
    }

    /// Enumerates the legal actions at a state under the bet-sizing
    /// abstraction.
    fn enumerate_actions(&self, state: &GameState) -> Vec<Action> {
        let player = state.current_player();
        let stack = player.stack;
        let wager = player.wager;
        let call_amount = state.call_amount();
        let opponent = state.player(state.opponent_id(state.current));
        let sizing = self.config.bet_sizing.for_street(state.street);
        let threshold = self.config.all_in_threshold;

        let mut actions = Vec::new();

        if call_amount > 0 {
            actions.push(Action::Fold);
            actions.push(Action::Call(call_amount.min(stack)));
        } else {
            actions.push(Action::Check);
        }

        // aggressive actions need chips behind and an opponent who can call
        if stack <= call_amount || opponent.stack == 0 {
            return actions;
        }

        let pot_after_call = state.pot_after_call();
        let mut amounts: Vec<i32> = Vec::new();

        if call_amount == 0 {
            let donk_suppressed = self.config.remove_donk_bets
                && !player.has_position
                && state.prev_street_checked_through;

            if !donk_suppressed {
                for &fraction in &sizing.bet_sizes {
                    let mut amount = (fraction * pot_after_call as f32).round() as i32;
                    if amount as f32 >= threshold * stack as f32 {
                        amount = stack;
                    }
                    if Action::Bet(amount).is_valid(stack, wager, call_amount, state.minimum_raise_size)
                        && !amounts.contains(&amount)
                    {
                        amounts.push(amount);
                    }
                }
                amounts.sort_unstable();
                actions.extend(amounts.iter().map(|&a| Action::Bet(a)));
            }
        } else {
            let cap_reached = self.config.raise_cap >= 0
                && state.raises_this_street >= self.config.raise_cap as u32;

            if cap_reached {
                // only the shove survives the cap
                amounts.push(stack + wager);
            } else {
                for &fraction in &sizing.raise_sizes {
                    let mut amount = (fraction * pot_after_call as f32).round() as i32;
                    if (amount - wager) as f32 >= threshold * stack as f32 {
                        amount = stack + wager;
                    }
                    if !amounts.contains(&amount) {
                        amounts.push(amount);
                    }
                }
            }

            amounts.retain(|&a| {
                Action::Raise(a).is_valid(stack, wager, call_amount, state.minimum_raise_size)
            });
            amounts.sort_unstable();
            amounts.dedup();
            actions.extend(amounts.iter().map(|&a| Action::Raise(a)));
        }

        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::Range;

    fn config(pot: i32, stack: i32) -> TreeConfig {
        TreeConfig {
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
        }
    }

    fn build(r1: &str, r2: &str, board: &str, config: TreeConfig) -> (GameTree, RangeManager) {
        let range1: Range = r1.parse().unwrap();
        let range2: Range = r2.parse().unwrap();
        let board = board_from_str(board).unwrap();
        let rm = RangeManager::new(&range1, &range2, &board).unwrap();
        let tree = TreeBuilder::new(&rm, board, config).unwrap().build().unwrap();
        (tree, rm)
    }

    #[test]
    fn test_settings_validation() {
        let rm = RangeManager::new(
            &"AA".parse().unwrap(),
            &"KK".parse().unwrap(),
            &board_from_str("Ts 7d 2c").unwrap(),
        )
        .unwrap();
        let board = board_from_str("Ts 7d 2c").unwrap();

        let mut bad = config(0, 100);
        assert!(TreeBuilder::new(&rm, board.clone(), bad.clone()).is_err());
        bad.starting_pot = 100;
        bad.all_in_threshold = 1.5;
        assert!(TreeBuilder::new(&rm, board.clone(), bad.clone()).is_err());
        bad.all_in_threshold = 0.67;
        bad.in_position_player = 3;
        assert!(TreeBuilder::new(&rm, board.clone(), bad.clone()).is_err());
        bad.in_position_player = 2;
        assert!(TreeBuilder::new(&rm, board, bad).is_ok());
    }

    #[test]
    fn test_zero_stack_root_is_terminal() {
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", config(200, 0));
        match tree.root() {
            Node::Terminal(t) => {
                assert_eq!(t.kind, TerminalKind::Showdown);
                assert_eq!(t.pot, 200);
            }
            _ => panic!("expected a terminal root"),
        }
        assert_eq!(tree.statistics().terminal_nodes, 1);
    }

    #[test]
    fn test_zero_stack_before_river_is_allin() {
        let (tree, _) = build("AA", "KK", "2c 7d 3s", config(200, 0));
        match tree.root() {
            Node::Terminal(t) => assert_eq!(t.kind, TerminalKind::Allin),
            _ => panic!("expected a terminal root"),
        }
    }

    #[test]
    fn test_river_root_actions() {
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 1000));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!("expected an action node"),
        };
        assert_eq!(root.player(), 1);
        // check plus three bet sizes (33%, 66%, 100% of 100)
        assert_eq!(
            root.actions(),
            &[Action::Check, Action::Bet(33), Action::Bet(66), Action::Bet(100)]
        );
    }

    #[test]
    fn test_bet_then_raise_sizes() {
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 1000));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        // after Bet(100): pot_after_call = 300. The 50% candidate (150) has a
        // raise increment of 50, below the bet of 100, and is dropped; the
        // pot-size candidate (300) survives.
        let after_bet = match root.child(3) {
            Node::Action(node) => node,
            _ => panic!(),
        };
        assert_eq!(after_bet.player(), 2);
        assert_eq!(
            after_bet.actions(),
            &[Action::Fold, Action::Call(100), Action::Raise(300)]
        );
    }

    #[test]
    fn test_all_in_threshold_replaces_large_bets() {
        // stack 120: a pot bet of 100 uses >= 67% of stack -> shove
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 120));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        assert_eq!(
            root.actions(),
            &[Action::Check, Action::Bet(33), Action::Bet(66), Action::Bet(120)]
        );
    }

    #[test]
    fn test_raise_cap_leaves_only_shove() {
        let mut cfg = config(100, 10_000);
        cfg.raise_cap = 0;
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", cfg);
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        let after_bet = match root.child(root.num_actions() - 1) {
            Node::Action(node) => node,
            _ => panic!(),
        };
        // cap 0: facing the bet only fold/call/shove remain
        assert_eq!(after_bet.num_actions(), 3);
        assert_eq!(after_bet.actions()[2], Action::Raise(10_000));
    }

    #[test]
    fn test_check_check_reaches_showdown() {
        let (tree, _) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 1000));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        let after_check = match root.child(0) {
            Node::Action(node) => node,
            _ => panic!(),
        };
        match after_check.child(0) {
            Node::Terminal(t) => {
                assert_eq!(t.kind, TerminalKind::Showdown);
                assert_eq!(t.pot, 100);
            }
            _ => panic!("check-check on the river must reach showdown"),
        }
    }

    #[test]
    fn test_turn_start_deals_one_street() {
        let (tree, _) = build("AA,KK,QQ", "AA,KK,QQ", "3h 8h 4c 4d", config(400, 800));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        // check-check leads to the river deal
        let chance = match root.child(0) {
            Node::Action(node) => match node.child(0) {
                Node::Chance(chance) => chance,
                _ => panic!("expected the river chance node"),
            },
            _ => panic!(),
        };
        assert_eq!(chance.kind(), DealKind::River);
        // clubs and diamonds share the board rank set {4}, so the twelve
        // unseen diamonds alias to their club twins
        assert_eq!(chance.num_children(), 36);
        assert_eq!(chance.chance_factor(), 48);
    }

    #[test]
    fn test_isomorphic_flop_chance_children() {
        // 7c 7d 2s with pair-only ranges: clubs and diamonds alias, so the
        // turn chance node keeps 49 - 12 children
        let (tree, _) = build("88+", "88+", "7c 7d 2s", config(100, 1000));
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        let chance = match root.child(0) {
            Node::Action(node) => match node.child(0) {
                Node::Chance(chance) => chance,
                _ => panic!(),
            },
            _ => panic!(),
        };
        assert_eq!(chance.kind(), DealKind::Turn);
        assert_eq!(chance.num_children(), 37);
        assert_eq!(chance.chance_factor(), 49);
    }

    #[test]
    fn test_isomorphism_disabled_keeps_all_children() {
        let mut cfg = config(100, 1000);
        cfg.use_isomorphism = false;
        let (tree, _) = build("88+", "88+", "7c 7d 2s", cfg);
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        let chance = match root.child(0) {
            Node::Action(node) => match node.child(0) {
                Node::Chance(chance) => chance,
                _ => panic!(),
            },
            _ => panic!(),
        };
        assert_eq!(chance.num_children(), 49);
        assert_eq!(chance.chance_factor(), 49);
    }

    #[test]
    fn test_donk_bet_removal() {
        let mut cfg = config(100, 1000);
        cfg.remove_donk_bets = true;
        let (tree, _) = build("AA,KK", "AA,KK", "3h 8h 4c 4d", cfg);
        let root = match tree.root() {
            Node::Action(node) => node,
            _ => panic!(),
        };
        // turn checks through; on every river the OOP player may only check
        let chance = match root.child(0) {
            Node::Action(node) => match node.child(0) {
                Node::Chance(chance) => chance,
                _ => panic!(),
            },
            _ => panic!(),
        };
        for card in 0..NUM_CARDS as Card {
            if let Some(Node::Action(river_root)) = chance.child(card) {
                assert_eq!(river_root.actions(), &[Action::Check]);
            }
        }
    }

    #[test]
    fn test_statistics_storage_entries() {
        let (tree, rm) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 0));
        let _ = rm;
        assert_eq!(tree.statistics().storage_entries, 0);

        let (tree, rm) = build("AA", "KK", "2c 7d 3s 8d Th", config(100, 1000));
        let stats = tree.statistics();
        assert_eq!(stats.p1_num_hands, 6);
        assert_eq!(stats.p2_num_hands, 6);
        assert!(stats.storage_entries > 0);
        assert!(stats.estimated_memory_bytes(true) < stats.estimated_memory_bytes(false));
        let _ = rm;
    }
}
