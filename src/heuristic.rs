use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::Cell;

/// Distance estimate between two cells. Both kinds are admissible under
/// 4-connected unit-cost movement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Heuristic {
    #[default]
    #[serde(rename = "euclidean")]
    Euclidean,
    #[serde(rename = "manhattan")]
    Manhattan,
}

impl Heuristic {
    pub fn estimate(&self, a: Cell, b: Cell) -> f64 {
        // Differences in f64 so far-off cells cannot overflow.
        let dx = a.x as f64 - b.x as f64;
        let dy = a.y as f64 - b.y as f64;
        match self {
            // Not `hypot`: the sum of squares keeps mirrored offsets bit-identical.
            Heuristic::Euclidean => (dx * dx + dy * dy).sqrt(),
            Heuristic::Manhattan => dx.abs() + dy.abs(),
        }
    }
}

pub fn estimate(a: Cell, b: Cell, kind: Heuristic) -> f64 {
    kind.estimate(a, b)
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heuristic::Euclidean => f.write_str("euclidean"),
            Heuristic::Manhattan => f.write_str("manhattan"),
        }
    }
}

impl FromStr for Heuristic {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euclidean" => Ok(Heuristic::Euclidean),
            "manhattan" => Ok(Heuristic::Manhattan),
            other => Err(anyhow!(
                "unknown heuristic {other:?}, expected euclidean or manhattan"
            )),
        }
    }
}

impl TryFrom<String> for Heuristic {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
