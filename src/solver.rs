//! The top-level DCFR training loop.

use crate::best_response::BestResponse;
use crate::card::*;
use crate::cfr::{cfr_traverse, TraversalContext};
use crate::dcfr::DiscountParams;
use crate::error::SolverError;
use crate::range_manager::RangeManager;
use crate::river::RiverRangeManager;
use crate::tree::{GameTree, Node};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// How often the trainer re-evaluates exploitability.
const EXPLOITABILITY_INTERVAL: u32 = 10;

/// Safety margin applied to the storage estimate before training starts.
const MEMORY_SAFETY_MARGIN: f64 = 1.1;

/// Trainer inputs beyond the tree itself.
#[derive(Debug, Clone)]
pub struct SolveSettings {
    pub max_iterations: u32,
    /// Early-stop threshold as a percentage of the starting pot; values
    /// `<= 0` disable early stopping.
    pub target_exploitability_pct: f32,
    /// Worker threads for the traversal; `0` uses the default pool size.
    pub thread_count: usize,
    /// Available bytes reported by the caller's memory probe; when present,
    /// training refuses to start if the storage estimate (with margin) does
    /// not fit.
    pub available_memory: Option<u64>,
    pub print_progress: bool,
}

impl Default for SolveSettings {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            target_exploitability_pct: 0.0,
            thread_count: 0,
            available_memory: None,
            print_progress: false,
        }
    }
}

/// Owns the tree and the range machinery and runs alternating DCFR
/// iterations over them.
pub struct Trainer {
    range_manager: RangeManager,
    tree: GameTree,
    river_ranges: RiverRangeManager,
    stop_flag: Arc<AtomicBool>,
}

impl Trainer {
    pub fn new(range_manager: RangeManager, tree: GameTree) -> Self {
        Self {
            range_manager,
            tree,
            river_ranges: RiverRangeManager::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn game_tree(&self) -> &GameTree {
        &self.tree
    }

    #[inline]
    pub fn range_manager(&self) -> &RangeManager {
        &self.range_manager
    }

    /// Shared flag for cooperative cancellation; setting it stops training
    /// between iterations.
    #[inline]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    /// Runs DCFR until the iteration budget or the exploitability target is
    /// reached, reporting `(iteration, total, exploitability_pct)` to the
    /// callback at every exploitability evaluation.
    ///
    /// Returns the final exploitability as a percentage of the starting
    /// pot.
    pub fn train(
        &mut self,
        settings: &SolveSettings,
        mut progress: impl FnMut(u32, u32, f32) + Send,
    ) -> Result<f32, SolverError> {
        self.check_memory(settings)?;
        allocate_storage(self.tree.root(), self.tree.config().compression);

        #[cfg(feature = "rayon")]
        {
            if settings.thread_count > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(settings.thread_count)
                    .build()
                    .map_err(|e| {
                        SolverError::InvalidSettings(format!("thread pool: {e}"))
                    })?;
                return pool.install(|| self.run_iterations(settings, &mut progress));
            }
        }

        self.run_iterations(settings, &mut progress)
    }

    fn check_memory(&self, settings: &SolveSettings) -> Result<(), SolverError> {
        let Some(available) = settings.available_memory else {
            return Ok(());
        };

        let estimate = self
            .tree
            .statistics()
            .estimated_memory_bytes(self.tree.config().compression);
        let required = (estimate as f64 * MEMORY_SAFETY_MARGIN) as u64;
        if required > available {
            return Err(SolverError::InsufficientMemory {
                required,
                available,
            });
        }
        Ok(())
    }

    fn run_iterations(
        &self,
        settings: &SolveSettings,
        progress: &mut impl FnMut(u32, u32, f32),
    ) -> Result<f32, SolverError> {
        let board = self.tree.initial_board().to_vec();
        let starting_pot = self.tree.config().starting_pot;
        let in_position_player = self.tree.config().in_position_player;
        let max_iterations = settings.max_iterations;
        let target = settings.target_exploitability_pct;

        let best_response = BestResponse::new(&self.range_manager, &self.river_ranges);
        let mut exploitability =
            best_response.exploitability(self.tree.root(), &board, starting_pot, in_position_player);
        progress(0, max_iterations, exploitability);

        if settings.print_progress {
            print!("iteration: 0 / {max_iterations} ");
            print!("(exploitability = {exploitability:.4}%)");
            io::stdout().flush().ok();
        }

        for t in 1..=max_iterations {
            if self.stop_flag.load(Ordering::Relaxed) {
                return Err(SolverError::Cancelled);
            }
            if target > 0.0 && exploitability <= target {
                break;
            }

            let params = DiscountParams::new(t);

            // alternating updates
            for hero in [1u8, 2] {
                let ctx = TraversalContext::new(&self.range_manager, &self.river_ranges, hero);
                let hero_reach = self.range_manager.initial_reach_probs(hero, &board);
                let villain_reach = self.range_manager.initial_reach_probs(3 - hero, &board);
                cfr_traverse(
                    &ctx,
                    &params,
                    self.tree.root(),
                    &board,
                    &hero_reach,
                    &villain_reach,
                );
            }

            if t % EXPLOITABILITY_INTERVAL == 0 || t == max_iterations {
                exploitability = best_response.exploitability(
                    self.tree.root(),
                    &board,
                    starting_pot,
                    in_position_player,
                );
                progress(t, max_iterations, exploitability);
            }

            if settings.print_progress {
                print!("\riteration: {t} / {max_iterations} ");
                print!("(exploitability = {exploitability:.4}%)");
                io::stdout().flush().ok();
            }
        }

        if settings.print_progress {
            println!();
        }

        Ok(exploitability)
    }
}

/// Walks the tree and allocates every action node's DCFR arrays.
fn allocate_storage(node: &Node, compression: bool) {
    match node {
        Node::Action(action_node) => {
            action_node.dcfr().allocate(compression);
            for action in 0..action_node.num_actions() {
                allocate_storage(action_node.child(action), compression);
            }
        }
        Node::Chance(chance_node) => {
            for card in 0..NUM_CARDS as Card {
                if let Some(child) = chance_node.child(card) {
                    allocate_storage(child, compression);
                }
            }
        }
        Node::Terminal(_) => {}
    }
}
