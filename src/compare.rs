use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::common::{Cell, SearchMode};
use crate::heuristic::Heuristic;
use crate::map::Grid;
use crate::stat::{run_with_metrics, SearchResult};

/// Runs each mode in turn; results follow `modes` order.
pub fn compare_sequential(
    grid: &Grid,
    start: Cell,
    goal: Cell,
    modes: &[SearchMode],
    heuristic: Heuristic,
) -> Result<Vec<SearchResult>> {
    info!("Comparing {} modes sequentially from {start} to {goal}", modes.len());
    modes
        .iter()
        .map(|&mode| run_with_metrics(start, goal, grid, mode, heuristic))
        .collect()
}

/// Runs every mode on its own blocking task over the shared grid. Results
/// follow `modes` order, whatever order the tasks finish in.
pub async fn compare_parallel(
    grid: Arc<Grid>,
    start: Cell,
    goal: Cell,
    modes: &[SearchMode],
    heuristic: Heuristic,
) -> Result<Vec<SearchResult>> {
    info!("Comparing {} modes in parallel from {start} to {goal}", modes.len());
    let handles: Vec<_> = modes
        .iter()
        .map(|&mode| {
            let grid = Arc::clone(&grid);
            tokio::task::spawn_blocking(move || {
                run_with_metrics(start, goal, &grid, mode, heuristic)
            })
        })
        .collect();

    let mut results = Vec::with_capacity(handles.len());
    for (handle, mode) in handles.into_iter().zip(modes) {
        let result = handle
            .await
            .with_context(|| format!("{mode} search task did not complete"))??;
        debug!("{mode} task joined");
        results.push(result);
    }
    Ok(results)
}
