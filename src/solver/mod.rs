use std::fs;
use std::path::Path;

use serde::Deserialize;

pub mod bag;
pub mod board;
pub mod search;
pub mod util;
pub mod word_index;

/// Default grid dimensions.
pub const GRID_WIDTH: usize = 21;
pub const GRID_HEIGHT: usize = 21;

/// Probability of shuffling a candidate list instead of keeping its
/// heuristic order. Zero keeps the search fully greedy.
pub const TEMPERATURE: f64 = 0.35;

/// How many states one seed word may explore before its search is abandoned.
pub const MAX_STATES: usize = 1_200_000;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolveConfig {
    pub width: usize,
    pub height: usize,
    pub temperature: f64,
    pub max_states: usize,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            width: GRID_WIDTH,
            height: GRID_HEIGHT,
            temperature: TEMPERATURE,
            max_states: MAX_STATES,
        }
    }
}

impl SolveConfig {
    /// Reads overrides from a JSON file. Missing files mean defaults;
    /// malformed ones are ignored with a warning.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Option<Self> {
        let data = fs::read_to_string(path.as_ref()).ok()?;
        match serde_json::from_str(&data) {
            Ok(config) => Some(config),
            Err(err) => {
                log::warn!("ignoring malformed config {}: {err}", path.as_ref().display());
                None
            }
        }
    }
}

pub use bag::Bag;
pub use board::{Board, Tile};
pub use search::{park_leftovers, Solution, Solver};
pub use util::{Direction, Position};
pub use word_index::WordIndex;
