use anyhow::{anyhow, bail};
use clap::Parser;
use serde::Deserialize;

use crate::common::{Cell, SearchMode};
use crate::heuristic::Heuristic;

#[derive(Parser, Debug)]
#[command(
    name = "Grid Search",
    about = "Compare Dijkstra, greedy best-first and A* on a 2D occupancy grid.",
    version = "1.0"
)]
pub struct Cli {
    #[arg(long, help = "Path to a YAML config file")]
    pub config: Option<String>,

    #[arg(long, help = "Path to the map file (.npy, MovingAI .map or 0/1 matrix)")]
    pub map_path: Option<String>,

    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true, help = "Start cell")]
    pub start: Option<Vec<i64>>,

    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true, help = "Goal cell")]
    pub goal: Option<Vec<i64>>,

    #[arg(long, help = "Heuristic: euclidean or manhattan")]
    pub heuristic: Option<String>,

    #[arg(
        long,
        help = "Search modes to compare: astar, dijkstra, greedy",
        value_delimiter = ','
    )]
    pub modes: Vec<String>,

    #[arg(long, help = "Run the modes concurrently", default_value_t = false)]
    pub parallel: bool,

    #[arg(long, help = "Print an ASCII overlay per mode", default_value_t = false)]
    pub render: bool,

    #[arg(long, help = "Path to the JSON output file")]
    pub output_path: Option<String>,

    #[arg(long, help = "Width of the generated map when no map file is given")]
    pub random_width: Option<usize>,

    #[arg(long, help = "Height of the generated map when no map file is given")]
    pub random_height: Option<usize>,

    #[arg(long, help = "Probability that a generated cell is blocked")]
    pub obstacle_density: Option<f64>,

    #[arg(long, help = "Seed for the random number generator")]
    pub seed: Option<u64>,
}

/// Parameters of a generated map.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RandomMap {
    pub width: usize,
    pub height: usize,
    pub obstacle_density: f64,
    pub seed: u64,
}

impl Default for RandomMap {
    fn default() -> Self {
        RandomMap {
            width: 50,
            height: 30,
            obstacle_density: 0.2,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub map_path: Option<String>,
    pub start: Cell,
    pub goal: Cell,
    pub heuristic: Heuristic,
    pub modes: Vec<SearchMode>,
    pub parallel: bool,
    pub render: bool,
    pub output_path: Option<String>,
    pub random: RandomMap,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            map_path: None,
            start: Cell::new(2, 2),
            goal: Cell::new(47, 27),
            heuristic: Heuristic::Euclidean,
            modes: SearchMode::ALL.to_vec(),
            parallel: false,
            render: false,
            output_path: None,
            random: RandomMap::default(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Command-line values take precedence over the file or defaults.
    pub fn override_from_command_line(mut self, cli: &Cli) -> anyhow::Result<Self> {
        if let Some(map_path) = &cli.map_path {
            self.map_path = Some(map_path.clone());
        }
        if let Some(start) = &cli.start {
            self.start = parse_cell(start, "start")?;
        }
        if let Some(goal) = &cli.goal {
            self.goal = parse_cell(goal, "goal")?;
        }
        if let Some(heuristic) = &cli.heuristic {
            self.heuristic = heuristic.parse()?;
        }
        if !cli.modes.is_empty() {
            self.modes = cli
                .modes
                .iter()
                .map(|mode| mode.parse())
                .collect::<anyhow::Result<_>>()?;
        }
        self.parallel |= cli.parallel;
        self.render |= cli.render;
        if let Some(output_path) = &cli.output_path {
            self.output_path = Some(output_path.clone());
        }
        if let Some(width) = cli.random_width {
            self.random.width = width;
        }
        if let Some(height) = cli.random_height {
            self.random.height = height;
        }
        if let Some(density) = cli.obstacle_density {
            self.random.obstacle_density = density;
        }
        if let Some(seed) = cli.seed {
            self.random.seed = seed;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.modes.is_empty() {
            bail!("At least one search mode must be selected");
        }

        if self.map_path.is_none() {
            let density = self.random.obstacle_density;
            if !(0.0..1.0).contains(&density) {
                return Err(anyhow!(
                    "Obstacle density must be in [0, 1), got {}",
                    density
                ));
            }
            if self.random.width == 0 || self.random.height == 0 {
                bail!(
                    "Generated map must not be empty, got {}x{}",
                    self.random.width,
                    self.random.height
                );
            }
        }
        Ok(())
    }
}

fn parse_cell(values: &[i64], role: &str) -> anyhow::Result<Cell> {
    match values {
        [x, y] => Ok(Cell::new(*x, *y)),
        _ => Err(anyhow!("{role} needs exactly two coordinates, got {values:?}")),
    }
}
