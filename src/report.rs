use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path as FsPath;

use crate::common::{Cell, Path, SearchMode};
use crate::map::Grid;
use crate::stat::SearchResult;

#[derive(Debug, Serialize)]
struct ResultRecord<'a> {
    mode: SearchMode,
    path: &'a Path,
    visited: Vec<Cell>,
    duration_secs: f64,
    path_length: usize,
    explored_nodes: usize,
}

impl<'a> From<&'a SearchResult> for ResultRecord<'a> {
    fn from(result: &'a SearchResult) -> Self {
        let mut visited: Vec<Cell> = result.visited.iter().copied().collect();
        visited.sort();
        ResultRecord {
            mode: result.mode,
            path: &result.path,
            visited,
            duration_secs: result.duration.as_secs_f64(),
            path_length: result.path_length,
            explored_nodes: result.explored_nodes,
        }
    }
}

/// Summary table, one row per result.
pub fn format_table(results: &[SearchResult]) -> String {
    let mut table = String::new();
    let _ = writeln!(
        table,
        "{:<10} {:>10} {:>12} {:>15}",
        "Algorithm", "Time (s)", "Path length", "Explored nodes"
    );
    let _ = writeln!(table, "{}", "-".repeat(50));
    for result in results {
        let _ = writeln!(
            table,
            "{:<10} {:>10.4} {:>12} {:>15}",
            result.mode.name(),
            result.duration.as_secs_f64(),
            result.path_length,
            result.explored_nodes
        );
    }
    table
}

pub fn write_json<P: AsRef<FsPath>>(path: P, results: &[SearchResult]) -> Result<()> {
    let path = path.as_ref();
    let records: Vec<ResultRecord> = results.iter().map(ResultRecord::from).collect();

    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(())
}

/// Character picture of one result over the grid. The top line is the
/// highest row, so the origin sits at the lower left.
///
/// `#` blocked, `.` free, `o` expanded, `*` path, `S` start, `G` goal.
pub fn render_overlay(grid: &Grid, result: &SearchResult, start: Cell, goal: Cell) -> String {
    let on_path: HashSet<&Cell> = result.path.iter().collect();
    let mut picture = String::with_capacity((grid.width() + 1) * grid.height());

    for y in (0..grid.height() as i64).rev() {
        for x in 0..grid.width() as i64 {
            let cell = Cell::new(x, y);
            let ch = if cell == start {
                'S'
            } else if cell == goal {
                'G'
            } else if on_path.contains(&cell) {
                '*'
            } else if result.visited.contains(&cell) {
                'o'
            } else if grid.is_free(cell) {
                '.'
            } else {
                '#'
            };
            picture.push(ch);
        }
        picture.push('\n');
    }
    picture
}
