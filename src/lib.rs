//! A heads-up post-flop solver core based on Discounted CFR.
//!
//! Given two hand ranges, a 3-5 card board, a starting pot, a stack size and
//! a per-street bet-sizing abstraction, the crate builds a finite
//! extensive-form game tree and iteratively computes an approximate Nash
//! equilibrium at every decision point, together with a best-response
//! exploitability bound.
//!
//! # Example
//!
//! ```
//! use postflop_dcfr::*;
//!
//! let oop_range: Range = "AA,KK,QQ".parse().unwrap();
//! let ip_range: Range = "AA,KK,QQ".parse().unwrap();
//! let board = board_from_str("3h 8h 4c 4d").unwrap();
//!
//! let config = TreeConfig {
//!     in_position_player: 2,
//!     starting_pot: 400,
//!     starting_stack: 800,
//!     minimum_bet: 10,
//!     all_in_threshold: 0.67,
//!     bet_sizing: BetSizingConfig::default(),
//!     raise_cap: -1,
//!     remove_donk_bets: false,
//!     use_isomorphism: true,
//!     compression: true,
//! };
//!
//! let range_manager = RangeManager::new(&oop_range, &ip_range, &board).unwrap();
//! let tree = TreeBuilder::new(&range_manager, board, config)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let mut trainer = Trainer::new(range_manager, tree);
//! let settings = SolveSettings {
//!     max_iterations: 20,
//!     ..Default::default()
//! };
//! let exploitability = trainer.train(&settings, |_, _, _| {}).unwrap();
//! assert!(exploitability >= 0.0);
//! ```
//!
//! # Implementation details
//! - **Algorithm**: Discounted CFR with alternating hero/villain updates;
//!   positive regrets, negative regrets and cumulative strategies are
//!   discounted by `alpha`, `beta = 0.5` and `gamma` per iteration.
//! - **Precision**: 32-bit floats in the traversal; cumulative regrets and
//!   strategies are stored as 16-bit integers with one 32-bit scale per
//!   array (the cumulative strategy may opt out via the tree config).
//! - **Isomorphism**: turn and river deals of interchangeable suits are
//!   folded into one representative child; results are permuted back
//!   through precomputed swap lists.
//! - **Terminal evaluation**: showdowns run in `O(|hero| + |villain|)` via
//!   simultaneous sweeps over strength-sorted river ranges with per-card
//!   blocker corrections.
//!
//! # Crate features
//! - `rayon`: parallelises the traversal over child actions and chance
//!   deals. Enabled by default.

mod best_response;
mod card;
mod cfr;
mod dcfr;
mod error;
mod game;
mod hand;
mod isomorphism;
mod mutex_like;
mod range;
mod range_manager;
mod river;
mod sliceop;
mod solver;
mod tree;

pub use best_response::*;
pub use card::*;
pub use dcfr::{DcfrState, DiscountParams};
pub use error::*;
pub use game::*;
pub use hand::*;
pub use isomorphism::{IsomorphismData, SwapList};
pub use mutex_like::*;
pub use range::*;
pub use range_manager::*;
pub use river::*;
pub use solver::*;
pub use tree::*;
