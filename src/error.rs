use std::error::Error;
use std::fmt;

/// Error type produced by the solver core.
///
/// Range, board and settings errors are raised at construction time, before
/// any heavy allocation. `Cancelled` is returned when the cooperative stop
/// flag is observed between iterations.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Malformed range token, unknown rank/suit, suited pair, or an empty
    /// expansion result.
    InvalidRange(String),

    /// Duplicate cards, out-of-bounds card, or a board outside 3..=5 cards.
    InvalidBoard(String),

    /// Non-positive pot/minimum bet, negative stack, threshold outside
    /// (0, 1], or an empty bet-size list entry.
    InvalidSettings(String),

    /// The estimated tree storage exceeds the configured safety margin of
    /// the available memory reported by the caller.
    InsufficientMemory { required: u64, available: u64 },

    /// The stop flag was set while training.
    Cancelled,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRange(msg) => write!(f, "invalid range: {msg}"),
            Self::InvalidBoard(msg) => write!(f, "invalid board: {msg}"),
            Self::InvalidSettings(msg) => write!(f, "invalid settings: {msg}"),
            Self::InsufficientMemory {
                required,
                available,
            } => write!(
                f,
                "insufficient memory: {required} bytes required (with safety margin), \
                 {available} bytes available"
            ),
            Self::Cancelled => write!(f, "solve cancelled"),
        }
    }
}

impl Error for SolverError {}
