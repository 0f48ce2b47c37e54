use crate::card::*;
use crate::error::SolverError;
use std::fmt;

/// Betting street, identified with the number of visible board cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Street {
    Flop,
    Turn,
    River,
}

impl Street {
    /// Number of board cards visible on this street.
    #[inline]
    pub fn board_cards(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn => 4,
            Self::River => 5,
        }
    }

    #[inline]
    pub fn from_board_len(len: usize) -> Result<Self, SolverError> {
        match len {
            3 => Ok(Self::Flop),
            4 => Ok(Self::Turn),
            5 => Ok(Self::River),
            _ => Err(SolverError::InvalidBoard(format!(
                "expected 3 to 5 board cards, got {len}"
            ))),
        }
    }

    #[inline]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => None,
        }
    }
}

/// A betting action. Bet and raise amounts are the acting player's total
/// wager on the current street after the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action {
    Fold,
    Check,
    Call(i32),
    Bet(i32),
    Raise(i32),
}

impl Action {
    /// Validates an action against the acting player's situation.
    ///
    /// `wager` is the player's current-street wager, `call_amount` the chips
    /// needed to match the opponent, and `minimum_raise_size` the smallest
    /// legal raise increment. All-in actions are legal regardless of the
    /// minimum sizes.
    pub fn is_valid(
        self,
        stack: i32,
        wager: i32,
        call_amount: i32,
        minimum_raise_size: i32,
    ) -> bool {
        match self {
            Self::Fold => call_amount > 0,
            Self::Check => call_amount == 0,
            Self::Call(amount) => {
                call_amount > 0
                    && ((amount == call_amount && amount <= stack) || amount == stack)
            }
            Self::Bet(amount) => {
                call_amount == 0
                    && ((amount >= minimum_raise_size && amount <= stack)
                        || (amount > 0 && amount == stack))
            }
            Self::Raise(amount) => {
                let raise_size = amount - call_amount - wager;
                call_amount > 0
                    && ((raise_size >= minimum_raise_size && amount <= stack + wager)
                        || (raise_size > 0 && amount == stack + wager))
            }
        }
    }

}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "Fold"),
            Self::Check => write!(f, "Check"),
            Self::Call(amount) => write!(f, "Call {amount}"),
            Self::Bet(amount) => write!(f, "Bet {amount}"),
            Self::Raise(amount) => write!(f, "Raise {amount}"),
        }
    }
}

/// One player's chip situation within a hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub id: u8,
    pub has_position: bool,
    pub has_folded: bool,
    pub stack: i32,
    pub wager: i32,
}

impl PlayerState {
    pub fn new(id: u8, has_position: bool, stack: i32) -> Self {
        Self {
            id,
            has_position,
            has_folded: false,
            stack,
            wager: 0,
        }
    }

    #[inline]
    pub(crate) fn commit_chips(&mut self, amount: i32) {
        debug_assert!(amount <= self.stack);
        self.wager += amount;
        self.stack -= amount;
    }
}

/// Outcome of applying one action to a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActionOutcome {
    /// Betting continues on the current street.
    Continue,
    /// The street's betting is closed (call, or closing check).
    StreetClosed,
    /// The acting player folded.
    Folded,
}

/// Full state of the hand at one point of the tree build.
#[derive(Debug, Clone)]
pub struct GameState {
    pub street: Street,
    pub pot: i32,
    pub board: Vec<Card>,
    pub p1: PlayerState,
    pub p2: PlayerState,
    /// Id of the player to act.
    pub current: u8,
    /// Id of the player whose passive action closes the street.
    pub last_to_act: u8,
    pub minimum_bet: i32,
    /// Largest raise increment seen on this street, initially the minimum
    /// bet.
    pub minimum_raise_size: i32,
    pub(crate) raises_this_street: u32,
    pub(crate) prev_street_checked_through: bool,
}

impl GameState {
    pub(crate) fn new(
        board: Vec<Card>,
        pot: i32,
        stack: i32,
        in_position_player: u8,
        minimum_bet: i32,
    ) -> Result<Self, SolverError> {
        let street = Street::from_board_len(board.len())?;
        let p1 = PlayerState::new(1, in_position_player == 1, stack);
        let p2 = PlayerState::new(2, in_position_player == 2, stack);

        // the out-of-position player opens every post-flop street
        let oop = if in_position_player == 1 { 2 } else { 1 };

        Ok(Self {
            street,
            pot,
            board,
            p1,
            p2,
            current: oop,
            last_to_act: in_position_player,
            minimum_bet,
            minimum_raise_size: minimum_bet,
            raises_this_street: 0,
            prev_street_checked_through: false,
        })
    }

    #[inline]
    pub fn player(&self, id: u8) -> &PlayerState {
        debug_assert!(id == 1 || id == 2);
        if id == 1 {
            &self.p1
        } else {
            &self.p2
        }
    }

    #[inline]
    fn player_mut(&mut self, id: u8) -> &mut PlayerState {
        debug_assert!(id == 1 || id == 2);
        if id == 1 {
            &mut self.p1
        } else {
            &mut self.p2
        }
    }

    #[inline]
    pub fn current_player(&self) -> &PlayerState {
        self.player(self.current)
    }

    #[inline]
    pub fn opponent_id(&self, id: u8) -> u8 {
        3 - id
    }

    #[inline]
    pub fn max_wager(&self) -> i32 {
        self.p1.wager.max(self.p2.wager)
    }

    /// Chips the player to act needs to match the opponent's wager.
    #[inline]
    pub fn call_amount(&self) -> i32 {
        self.max_wager() - self.current_player().wager
    }

    /// Pot size once the player to act matches the opponent's wager.
    #[inline]
    pub fn pot_after_call(&self) -> i32 {
        self.pot + 2 * self.max_wager()
    }

    /// Pot awarded at a terminal: uncalled excess is returned to the bettor.
    #[inline]
    pub fn contested_pot(&self) -> i32 {
        self.pot + 2 * self.p1.wager.min(self.p2.wager)
    }

    #[inline]
    pub fn is_uncontested(&self) -> bool {
        self.p1.has_folded || self.p2.has_folded
    }

    #[inline]
    pub fn both_all_in(&self) -> bool {
        self.p1.stack == 0 && self.p2.stack == 0
    }

    #[inline]
    pub fn any_all_in(&self) -> bool {
        self.p1.stack == 0 || self.p2.stack == 0
    }

    /// Applies one (pre-validated) action for the player to act.
    pub(crate) fn apply_action(&mut self, action: Action) -> ActionOutcome {
        let actor = self.current;
        let call_amount = self.call_amount();
        let max_wager = self.max_wager();

        let outcome = match action {
            Action::Fold => {
                self.player_mut(actor).has_folded = true;
                return ActionOutcome::Folded;
            }
            Action::Check => {
                if actor == self.last_to_act {
                    ActionOutcome::StreetClosed
                } else {
                    ActionOutcome::Continue
                }
            }
            Action::Call(amount) => {
                debug_assert!(amount == call_amount.min(self.current_player().stack));
                self.player_mut(actor).commit_chips(amount);
                ActionOutcome::StreetClosed
            }
            Action::Bet(amount) => {
                self.player_mut(actor).commit_chips(amount);
                self.minimum_raise_size = amount;
                self.last_to_act = self.opponent_id(actor);
                ActionOutcome::Continue
            }
            Action::Raise(amount) => {
                let increment = amount - max_wager;
                let to_commit = amount - self.current_player().wager;
                self.player_mut(actor).commit_chips(to_commit);
                self.minimum_raise_size = increment.max(self.minimum_raise_size);
                self.raises_this_street += 1;
                self.last_to_act = self.opponent_id(actor);
                ActionOutcome::Continue
            }
        };

        self.current = self.opponent_id(actor);
        outcome
    }

    /// Moves to the next street after betting closed, dealing `card`.
    pub(crate) fn advance_street(&mut self, card: Card, checked_through: bool) {
        debug_assert!(self.p1.wager == self.p2.wager);
        self.pot += self.p1.wager + self.p2.wager;
        self.p1.wager = 0;
        self.p2.wager = 0;
        self.street = self.street.next().expect("no street after the river");
        self.board.push(card);

        let ip = if self.p1.has_position { 1 } else { 2 };
        self.current = self.opponent_id(ip);
        self.last_to_act = ip;
        self.minimum_raise_size = self.minimum_bet;
        self.raises_this_street = 0;
        self.prev_street_checked_through = checked_through;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        let board = board_from_str("Ts 7d 2c").unwrap();
        GameState::new(board, 100, 1000, 2, 10).unwrap()
    }

    #[test]
    fn test_initial_positions() {
        let state = state();
        assert_eq!(state.current, 1); // player 2 is in position, 1 opens
        assert_eq!(state.last_to_act, 2);
        assert_eq!(state.call_amount(), 0);
    }

    #[test]
    fn test_action_validity() {
        // facing no bet
        assert!(Action::Check.is_valid(1000, 0, 0, 10));
        assert!(!Action::Fold.is_valid(1000, 0, 0, 10));
        assert!(Action::Bet(10).is_valid(1000, 0, 0, 10)); // exact min-bet
        assert!(!Action::Bet(9).is_valid(1000, 0, 0, 10));
        assert!(Action::Bet(5).is_valid(5, 0, 0, 10)); // short all-in
        assert!(!Action::Bet(1001).is_valid(1000, 0, 0, 10));

        // facing a bet of 50
        assert!(Action::Fold.is_valid(1000, 0, 50, 50));
        assert!(!Action::Check.is_valid(1000, 0, 50, 50));
        assert!(Action::Call(50).is_valid(1000, 0, 50, 50));
        assert!(Action::Call(30).is_valid(30, 0, 50, 50)); // short call
        assert!(Action::Raise(100).is_valid(1000, 0, 50, 50));
        assert!(!Action::Raise(90).is_valid(1000, 0, 50, 50)); // short increment
        assert!(Action::Raise(70).is_valid(70, 0, 50, 50)); // all-in raise
    }

    #[test]
    fn test_check_check_closes_street() {
        let mut state = state();
        assert_eq!(state.apply_action(Action::Check), ActionOutcome::Continue);
        assert_eq!(state.current, 2);
        assert_eq!(state.apply_action(Action::Check), ActionOutcome::StreetClosed);
    }

    #[test]
    fn test_bet_call_updates_pot() {
        let mut state = state();
        assert_eq!(state.apply_action(Action::Bet(50)), ActionOutcome::Continue);
        assert_eq!(state.call_amount(), 50);
        assert_eq!(state.pot_after_call(), 200);
        assert_eq!(state.apply_action(Action::Call(50)), ActionOutcome::StreetClosed);
        assert_eq!(state.contested_pot(), 200);

        state.advance_street(card_from_str("9h").unwrap(), false);
        assert_eq!(state.pot, 200);
        assert_eq!(state.street, Street::Turn);
        assert_eq!(state.current, 1);
        assert_eq!(state.minimum_raise_size, 10);
    }

    #[test]
    fn test_raise_updates_minimum_raise() {
        let mut state = state();
        state.apply_action(Action::Bet(50));
        state.apply_action(Action::Raise(150)); // increment 100
        assert_eq!(state.minimum_raise_size, 100);
        assert_eq!(state.raises_this_street, 1);
        assert_eq!(state.call_amount(), 100);
    }

    #[test]
    fn test_fold_is_terminal() {
        let mut state = state();
        state.apply_action(Action::Bet(50));
        assert_eq!(state.apply_action(Action::Fold), ActionOutcome::Folded);
        assert!(state.is_uncontested());
        // the uncalled bet is returned
        assert_eq!(state.contested_pot(), 100);
    }

    #[test]
    fn test_short_call_contested_pot() {
        let board = board_from_str("Ts 7d 2c").unwrap();
        let mut state = GameState::new(board, 100, 1000, 2, 10).unwrap();
        state.p2.stack = 30;
        state.apply_action(Action::Bet(50));
        state.apply_action(Action::Call(30));
        assert_eq!(state.contested_pot(), 160);
        assert!(state.any_all_in());
    }
}
