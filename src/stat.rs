use anyhow::Result;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tracing::info;

use crate::algorithm::search;
use crate::common::{Cell, Path, SearchMode};
use crate::heuristic::Heuristic;
use crate::map::Grid;

/// Outcome of one timed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub mode: SearchMode,
    pub path: Path,
    pub visited: HashSet<Cell>,
    pub duration: Duration,
    pub path_length: usize,
    pub explored_nodes: usize,
}

impl SearchResult {
    pub fn found_path(&self) -> bool {
        !self.path.is_empty()
    }

    pub(crate) fn print(&self) {
        info!(
            "{} Time(microseconds) {:?} Path length {:?} Explored nodes {:?}",
            self.mode,
            self.duration.as_micros(),
            self.path_length,
            self.explored_nodes
        );
    }
}

/// Times a single search. Start and goal must be free cells on the grid.
pub fn run_with_metrics(
    start: Cell,
    goal: Cell,
    grid: &Grid,
    mode: SearchMode,
    heuristic: Heuristic,
) -> Result<SearchResult> {
    grid.check_endpoint(start, "start")?;
    grid.check_endpoint(goal, "goal")?;

    let search_start_time = Instant::now();
    let (path, visited) = search(start, goal, grid, mode, heuristic);
    let duration = search_start_time.elapsed();

    let result = SearchResult {
        mode,
        path_length: path.len(),
        explored_nodes: visited.len(),
        path,
        visited,
        duration,
    };
    result.print();
    Ok(result)
}
