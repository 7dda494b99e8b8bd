use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A grid position. `x` indexes columns, `y` indexes rows.
///
/// Ordering is lexicographic on `(x, y)`, which is also the frontier
/// tie-break between entries of equal priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i64,
    pub y: i64,
}

impl Cell {
    pub const fn new(x: i64, y: i64) -> Self {
        Cell { x, y }
    }

    pub(crate) const fn offset(&self, dx: i64, dy: i64) -> Self {
        Cell {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i64, i64)> for Cell {
    fn from((x, y): (i64, i64)) -> Self {
        Cell { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cells from start to goal inclusive; empty when the goal is unreachable.
pub type Path = Vec<Cell>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SearchMode {
    /// Dijkstra: priority is the accumulated cost.
    #[serde(rename = "dijkstra")]
    UniformCost,
    /// Priority is the heuristic estimate alone.
    #[serde(rename = "greedy")]
    GreedyBestFirst,
    /// A*: priority is accumulated cost plus heuristic estimate.
    #[serde(rename = "astar")]
    WeightedBestFirst,
}

impl SearchMode {
    /// Order in which the comparison tool runs the modes by default.
    pub const ALL: [SearchMode; 3] = [
        SearchMode::WeightedBestFirst,
        SearchMode::UniformCost,
        SearchMode::GreedyBestFirst,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SearchMode::UniformCost => "Dijkstra",
            SearchMode::GreedyBestFirst => "Greedy",
            SearchMode::WeightedBestFirst => "A*",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dijkstra" | "uniform-cost" | "ucs" => Ok(SearchMode::UniformCost),
            "greedy" | "greedy-best-first" => Ok(SearchMode::GreedyBestFirst),
            "astar" | "a*" | "weighted-best-first" => Ok(SearchMode::WeightedBestFirst),
            other => Err(anyhow!(
                "unknown search mode {other:?}, expected one of: astar, dijkstra, greedy"
            )),
        }
    }
}

impl TryFrom<String> for SearchMode {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
