mod engine;

pub use engine::{search, SearchEngine, SearchState};

use std::collections::HashMap;

use crate::common::{Cell, Path, SearchMode};

/// Predecessor of every discovered cell; the start maps to `None`.
type Trace = HashMap<Cell, Option<Cell>>;

/// Frontier ordering key for a neighbor reached at accumulated `cost` with
/// heuristic estimate `h` to the goal.
pub fn priority(mode: SearchMode, cost: usize, h: f64) -> f64 {
    match mode {
        SearchMode::UniformCost => cost as f64,
        SearchMode::GreedyBestFirst => h,
        SearchMode::WeightedBestFirst => cost as f64 + h,
    }
}

// Walks predecessors back from the goal. A dead end before reaching the
// start means the goal was never discovered.
fn construct_path(trace: &Trace, start: Cell, goal: Cell) -> Path {
    let mut path = Vec::new();
    let mut current = goal;
    while current != start {
        match trace.get(&current) {
            Some(&Some(previous)) => {
                path.push(current);
                current = previous;
            }
            _ => return Vec::new(),
        }
    }
    path.push(start);
    path.reverse();
    path
}
