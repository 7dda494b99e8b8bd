use anyhow::{anyhow, bail, Context, Result};
use npyz::{DType, NpyFile, Order, TypeChar};
use rand::Rng;
use std::fs;

use crate::common::Cell;

/// Left, right, down, up. Fixed because it decides which of several
/// equal-priority neighbors reaches the frontier first.
const DIRECTIONS: [(i64, i64); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

const NPY_MAGIC: &[u8] = b"\x93NUMPY";

/// Static binary occupancy grid, stored row-major (`free[y][x]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    height: usize,
    width: usize,
    free: Vec<Vec<bool>>,
}

impl Grid {
    /// Builds a grid from rows of occupancy values: 0 is free, 1 is blocked.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.len());
        if height == 0 || width == 0 {
            bail!("occupancy grid is empty");
        }

        let mut free = Vec::with_capacity(height);
        for (y, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                bail!("row {y} has {} columns, expected {width}", row.len());
            }
            let parsed = row
                .into_iter()
                .enumerate()
                .map(|(x, value)| match value {
                    0 => Ok(true),
                    1 => Ok(false),
                    other => Err(anyhow!("non-binary value {other} at ({x}, {y})")),
                })
                .collect::<Result<Vec<bool>>>()?;
            free.push(parsed);
        }

        Ok(Grid {
            height,
            width,
            free,
        })
    }

    /// Loads a NumPy `.npy` array, a MovingAI `.map` file or a plain 0/1
    /// matrix, told apart by their leading bytes.
    pub fn from_file(path: &str) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("failed to read map file {path}"))?;
        let grid = if bytes.starts_with(NPY_MAGIC) {
            Self::parse_npy(&bytes)
        } else {
            String::from_utf8(bytes)
                .context("map file is neither npy nor text")
                .and_then(|content| {
                    if content.trim_start().starts_with("type") {
                        Self::parse_moving_ai(&content)
                    } else {
                        Self::parse_matrix(&content)
                    }
                })
        };
        grid.with_context(|| format!("failed to parse map file {path}"))
    }

    /// Two-dimensional NumPy array of shape (height, width). Integer and
    /// float arrays are accepted as long as every value is 0 or 1.
    pub fn parse_npy(bytes: &[u8]) -> Result<Self> {
        let npy = NpyFile::new(bytes).context("invalid npy header")?;
        let (height, width) = match *npy.shape() {
            [height, width] => (height as usize, width as usize),
            ref shape => bail!("expected a 2-D occupancy array, got shape {shape:?}"),
        };
        let order = npy.order();

        let values: Vec<f64> = match npy.dtype() {
            DType::Plain(ty) => match (ty.type_char(), ty.size_field()) {
                (TypeChar::Uint, 1) => widen(npy.into_vec::<u8>()?),
                (TypeChar::Uint, 2) => widen(npy.into_vec::<u16>()?),
                (TypeChar::Uint, 4) => widen(npy.into_vec::<u32>()?),
                (TypeChar::Int, 1) => widen(npy.into_vec::<i8>()?),
                (TypeChar::Int, 2) => widen(npy.into_vec::<i16>()?),
                (TypeChar::Int, 4) => widen(npy.into_vec::<i32>()?),
                (TypeChar::Int, 8) => npy
                    .into_vec::<i64>()?
                    .into_iter()
                    .map(|v| v as f64)
                    .collect(),
                (TypeChar::Float, 4) => widen(npy.into_vec::<f32>()?),
                (TypeChar::Float, 8) => npy.into_vec::<f64>()?,
                _ => bail!("unsupported npy dtype {ty:?}"),
            },
            other => bail!("unsupported npy dtype {other:?}"),
        };
        if values.len() != height * width {
            bail!(
                "npy data holds {} values, expected {height}x{width}",
                values.len()
            );
        }

        let mut rows = Vec::with_capacity(height);
        for y in 0..height {
            let row = (0..width)
                .map(|x| {
                    let index = match order {
                        Order::C => y * width + x,
                        Order::Fortran => x * height + y,
                    };
                    occupancy_byte(values[index], x, y)
                })
                .collect::<Result<Vec<u8>>>()?;
            rows.push(row);
        }

        Self::from_rows(rows)
    }

    /// MovingAI benchmark format: four header lines, then one text row per
    /// grid row where `.` is passable.
    pub fn parse_moving_ai(content: &str) -> Result<Self> {
        let mut lines = content.lines();

        let _type = lines.next().ok_or_else(|| anyhow!("missing type line"))?;
        let height = parse_header(lines.next(), "height")?;
        let width = parse_header(lines.next(), "width")?;
        match lines.next() {
            Some(line) if line.trim() == "map" => {}
            _ => bail!("missing map line"),
        }

        let mut rows = Vec::with_capacity(height);
        for line in lines.take(height) {
            let row: Vec<u8> = line
                .trim_end()
                .chars()
                .map(|ch| if ch == '.' { 0 } else { 1 })
                .collect();
            rows.push(row);
        }
        if rows.len() != height {
            bail!("expected {height} rows, found {}", rows.len());
        }
        if let Some(row) = rows.iter().position(|row| row.len() != width) {
            bail!("row {row} does not match declared width {width}");
        }

        Self::from_rows(rows)
    }

    /// One row per line, values separated by whitespace or commas.
    pub fn parse_matrix(content: &str) -> Result<Self> {
        let rows = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(y, line)| {
                line.split(|ch: char| ch == ',' || ch.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .map(|token| {
                        token
                            .parse::<u8>()
                            .with_context(|| format!("invalid value {token:?} in row {y}"))
                    })
                    .collect::<Result<Vec<u8>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_rows(rows)
    }

    /// Blocks each cell with probability `density`, leaving `keep_free` open.
    pub fn random<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        density: f64,
        keep_free: &[Cell],
        rng: &mut R,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            bail!("random grid must not be empty, got {width}x{height}");
        }
        if !(0.0..=1.0).contains(&density) {
            bail!("obstacle density must be in [0, 1], got {density}");
        }

        let mut free = vec![vec![true; width]; height];
        for (y, row) in free.iter_mut().enumerate() {
            for (x, value) in row.iter_mut().enumerate() {
                let cell = Cell::new(x as i64, y as i64);
                if !keep_free.contains(&cell) {
                    *value = !rng.gen_bool(density);
                }
            }
        }

        Ok(Grid {
            height,
            width,
            free,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height
    }

    pub fn is_free(&self, cell: Cell) -> bool {
        self.in_bounds(cell) && self.free[cell.y as usize][cell.x as usize]
    }

    /// Free axis-aligned neighbors in left, right, down, up order. An invalid
    /// cell has no neighbors.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        if !self.is_free(cell) {
            return Vec::new();
        }

        DIRECTIONS
            .iter()
            .map(|&(dx, dy)| cell.offset(dx, dy))
            .filter(|neighbor| self.is_free(*neighbor))
            .collect()
    }

    pub fn free_count(&self) -> usize {
        self.free
            .iter()
            .map(|row| row.iter().filter(|&&value| value).count())
            .sum()
    }

    /// Rejects a search endpoint that is off the grid or blocked.
    pub fn check_endpoint(&self, cell: Cell, role: &str) -> Result<()> {
        if !self.in_bounds(cell) {
            bail!(
                "{role} {cell} is outside the {}x{} grid",
                self.width,
                self.height
            );
        }
        if !self.is_free(cell) {
            bail!("{role} {cell} is a blocked cell");
        }
        Ok(())
    }
}

fn widen<T: Into<f64>>(values: Vec<T>) -> Vec<f64> {
    values.into_iter().map(Into::into).collect()
}

// Whole values that fit a byte pass through for `from_rows` to judge.
fn occupancy_byte(value: f64, x: usize, y: usize) -> Result<u8> {
    if value.fract() == 0.0 && (0.0..=255.0).contains(&value) {
        Ok(value as u8)
    } else {
        Err(anyhow!("non-binary value {value} at ({x}, {y})"))
    }
}

fn parse_header(line: Option<&str>, key: &str) -> Result<usize> {
    let line = line.ok_or_else(|| anyhow!("missing {key} line"))?;
    let mut parts = line.split_whitespace();
    if parts.next() != Some(key) {
        bail!("expected {key} line, found {line:?}");
    }
    parts
        .next()
        .ok_or_else(|| anyhow!("missing value on {key} line"))?
        .parse::<usize>()
        .with_context(|| format!("invalid {key} value"))
}
