use clap::Parser;
use postflop_dcfr::{
    board_from_str, card_to_string, Node, Range, RangeManager, SolveSettings, Trainer,
    TreeBuilder, TreeConfig,
};
use serde::{Deserialize, Serialize};

/// Solve a heads-up post-flop spot from a JSON configuration file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(required = true)]
    config: String,

    /// Max number of iterations to run
    #[arg(short = 'n', long, default_value = "1000")]
    max_iterations: u32,

    /// Early-stop exploitability as a percentage of the starting pot.
    /// Non-positive values disable early stopping.
    #[arg(short = 'e', long, default_value = "0.5")]
    exploitability: f32,

    /// Worker threads (0 = auto)
    #[arg(short = 't', long, default_value = "0")]
    threads: usize,

    /// OOP's range (overrides the range in the config)
    #[arg(long)]
    oop_range: Option<String>,

    /// IP's range (overrides the range in the config)
    #[arg(long)]
    ip_range: Option<String>,

    /// Board cards (override the board in the config), e.g. "Td9d6h"
    #[arg(long)]
    board: Option<String>,

    /// Number of hands to print per strategy row
    #[arg(long, default_value = "10")]
    display_hands: usize,
}

/// On-disk configuration: ranges and board as strings, everything else as
/// the tree config.
#[derive(Debug, Serialize, Deserialize)]
struct SolveConfig {
    /// Player 1's range (out of position by default)
    oop_range: String,
    /// Player 2's range (in position by default)
    ip_range: String,
    board: String,
    #[serde(flatten)]
    tree: TreeConfig,
}

fn main() -> Result<(), String> {
    let args = Args::parse();

    let contents = std::fs::read_to_string(&args.config)
        .map_err(|e| format!("unable to read {}: {e}", args.config))?;
    let mut config: SolveConfig =
        serde_json::from_str(&contents).map_err(|e| format!("invalid config: {e}"))?;

    if let Some(range) = args.oop_range {
        config.oop_range = range;
    }
    if let Some(range) = args.ip_range {
        config.ip_range = range;
    }
    if let Some(board) = args.board {
        config.board = board;
    }

    let oop_range: Range = config.oop_range.parse().map_err(|e| format!("{e}"))?;
    let ip_range: Range = config.ip_range.parse().map_err(|e| format!("{e}"))?;
    let board = board_from_str(&config.board).map_err(|e| format!("{e}"))?;

    let range_manager =
        RangeManager::new(&oop_range, &ip_range, &board).map_err(|e| format!("{e}"))?;
    let tree = TreeBuilder::new(&range_manager, board, config.tree.clone())
        .map_err(|e| format!("{e}"))?
        .build()
        .map_err(|e| format!("{e}"))?;

    let stats = tree.statistics();
    println!("Starting pot: {}", config.tree.starting_pot);
    println!("Effective stacks: {}", config.tree.starting_stack);
    println!(
        "Action nodes: {} (flop {}, turn {}, river {})",
        stats.total_action_nodes(),
        stats.flop_action_nodes,
        stats.turn_action_nodes,
        stats.river_action_nodes
    );

    let estimate = stats.estimated_memory_bytes(config.tree.compression);
    let estimate_mb = estimate as f64 / (1024.0 * 1024.0);
    println!("Estimated storage: {estimate_mb:.2} MB");

    let mut trainer = Trainer::new(range_manager, tree);
    let settings = SolveSettings {
        max_iterations: args.max_iterations,
        target_exploitability_pct: args.exploitability,
        thread_count: args.threads,
        available_memory: available_memory(),
        print_progress: true,
    };

    let exploitability = trainer
        .train(&settings, |_, _, _| {})
        .map_err(|e| format!("{e}"))?;
    println!("Final exploitability: {exploitability:.4}% of the pot");

    print_root_strategy(&trainer, args.display_hands);
    Ok(())
}

/// Reads the available-memory probe; the solver core treats this as an
/// external input.
fn available_memory() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let line = meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

fn print_root_strategy(trainer: &Trainer, display_hands: usize) {
    let Node::Action(root) = trainer.game_tree().root() else {
        println!("The root is terminal; nothing to display.");
        return;
    };

    let player = root.player();
    let combos = trainer.range_manager().preflop_combos(player);
    let strategy = root.average_strategy();

    println!("\n--- Average strategy at the root (player {player}) ---");
    for (hand, combo) in combos.iter().take(display_hands).enumerate() {
        print!(
            "{}{}: ",
            card_to_string(combo.card2),
            card_to_string(combo.card1)
        );
        for (index, action) in root.actions().iter().enumerate() {
            print!("{action}: {:.3}  ", strategy[index * combos.len() + hand]);
        }
        println!();
    }
    if combos.len() > display_hands {
        println!("... ({} more hands)", combos.len() - display_hands);
    }
}
