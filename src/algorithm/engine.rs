use super::{construct_path, priority, Trace};
use crate::common::{Cell, Path, SearchMode};
use crate::heuristic::Heuristic;
use crate::map::Grid;

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, Copy)]
struct FrontierEntry {
    priority: f64,
    cell: Cell,
}

// Reversed so the max-heap pops the lowest priority first, then the
// lexicographically smallest cell.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Initialized,
    Running,
    Succeeded,
    /// Frontier exhausted without reaching the goal.
    Failed,
}

/// One best-first search over a borrowed grid. All bookkeeping belongs to
/// this value and is dropped with it.
///
/// The frontier keeps stale duplicates: a cell is pushed again each time a
/// cheaper cost is found, and older entries are simply popped later.
pub struct SearchEngine<'a> {
    grid: &'a Grid,
    start: Cell,
    goal: Cell,
    mode: SearchMode,
    heuristic: Heuristic,
    frontier: BinaryHeap<FrontierEntry>,
    cost_so_far: HashMap<Cell, usize>,
    came_from: Trace,
    visited: HashSet<Cell>,
    state: SearchState,
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        grid: &'a Grid,
        start: Cell,
        goal: Cell,
        mode: SearchMode,
        heuristic: Heuristic,
    ) -> Self {
        let mut frontier = BinaryHeap::new();
        frontier.push(FrontierEntry {
            priority: 0.0,
            cell: start,
        });

        let mut cost_so_far = HashMap::new();
        cost_so_far.insert(start, 0);
        let mut came_from = Trace::new();
        came_from.insert(start, None);

        SearchEngine {
            grid,
            start,
            goal,
            mode,
            heuristic,
            frontier,
            cost_so_far,
            came_from,
            visited: HashSet::new(),
            state: SearchState::Initialized,
        }
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SearchState::Succeeded | SearchState::Failed)
    }

    /// Pops and expands one frontier entry. Does nothing once finished.
    pub fn step(&mut self) -> SearchState {
        if self.is_finished() {
            return self.state;
        }

        let Some(FrontierEntry { cell: current, .. }) = self.frontier.pop() else {
            self.state = SearchState::Failed;
            return self.state;
        };
        self.state = SearchState::Running;
        trace!("expand node: {current}");
        self.visited.insert(current);

        if current == self.goal {
            self.state = SearchState::Succeeded;
            return self.state;
        }

        // Uniform step cost.
        let tentative_cost = self.cost_so_far[&current] + 1;

        for neighbor in self.grid.neighbors(current) {
            let improved = self
                .cost_so_far
                .get(&neighbor)
                .map_or(true, |&old_cost| tentative_cost < old_cost);
            if !improved {
                continue;
            }

            self.cost_so_far.insert(neighbor, tentative_cost);
            self.came_from.insert(neighbor, Some(current));
            let h = self.heuristic.estimate(self.goal, neighbor);
            self.frontier.push(FrontierEntry {
                priority: priority(self.mode, tentative_cost, h),
                cell: neighbor,
            });
        }

        if self.frontier.is_empty() {
            self.state = SearchState::Failed;
        }
        self.state
    }

    pub fn run(&mut self) -> SearchState {
        while !self.is_finished() {
            self.step();
        }
        debug!(
            "search finished: {:?}, expanded {} nodes",
            self.state,
            self.visited.len()
        );
        self.state
    }

    /// Cheapest known step count from the start to `cell`.
    pub fn cost_to(&self, cell: Cell) -> Option<usize> {
        self.cost_so_far.get(&cell).copied()
    }

    pub fn visited(&self) -> &HashSet<Cell> {
        &self.visited
    }

    /// Path from start to goal, or empty when the goal has no recorded
    /// predecessor chain back to the start.
    pub fn path(&self) -> Path {
        construct_path(&self.came_from, self.start, self.goal)
    }

    pub fn into_result(self) -> (Path, HashSet<Cell>) {
        (self.path(), self.visited)
    }
}

/// Runs a complete search and returns the path (empty if unreachable) and
/// every expanded cell. Endpoints are not validated here.
#[instrument(skip_all, name = "search", fields(mode = %mode, start = %start, goal = %goal), level = "debug")]
pub fn search(
    start: Cell,
    goal: Cell,
    grid: &Grid,
    mode: SearchMode,
    heuristic: Heuristic,
) -> (Path, HashSet<Cell>) {
    let mut engine = SearchEngine::new(grid, start, goal, mode, heuristic);
    engine.run();
    engine.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .try_init();
    }

    fn open_grid(width: usize, height: usize) -> Grid {
        Grid::from_rows(vec![vec![0; width]; height]).unwrap()
    }

    fn manhattan(a: Cell, b: Cell) -> usize {
        ((a.x - b.x).abs() + (a.y - b.y).abs()) as usize
    }

    // Every step moves to a free 4-neighbor.
    fn assert_valid_path(grid: &Grid, path: &Path, start: Cell, goal: Cell) {
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        for pair in path.windows(2) {
            assert!(grid.is_free(pair[1]));
            assert_eq!(manhattan(pair[0], pair[1]), 1);
        }
    }

    fn reachable_from(grid: &Grid, start: Cell) -> HashSet<Cell> {
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(cell) = queue.pop_front() {
            for neighbor in grid.neighbors(cell) {
                if seen.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        seen
    }

    #[test]
    fn test_frontier_pops_lowest_priority_then_smallest_cell() {
        let mut frontier = BinaryHeap::new();
        for (priority, x, y) in [(2.0, 0, 0), (1.0, 5, 5), (1.0, 1, 9), (1.0, 1, 2)] {
            frontier.push(FrontierEntry {
                priority,
                cell: Cell::new(x, y),
            });
        }
        let order: Vec<Cell> =
            std::iter::from_fn(|| frontier.pop().map(|entry| entry.cell)).collect();
        assert_eq!(
            order,
            vec![
                Cell::new(1, 2),
                Cell::new(1, 9),
                Cell::new(5, 5),
                Cell::new(0, 0)
            ]
        );
    }

    #[test]
    fn test_dijkstra_open_grid() {
        init_tracing();
        let grid = open_grid(5, 5);
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 4);
        let (path, visited) = search(
            start,
            goal,
            &grid,
            SearchMode::UniformCost,
            Heuristic::Euclidean,
        );

        assert_eq!(path.len(), 9);
        assert_valid_path(&grid, &path, start, goal);
        assert!(visited.len() <= 25);
        assert!(visited.contains(&goal));
    }

    #[test]
    fn test_open_grid_optimal_modes_match_manhattan() {
        let grid = open_grid(8, 6);
        let cells: Vec<Cell> = (0..8)
            .flat_map(|x| (0..6).map(move |y| Cell::new(x, y)))
            .collect();
        for &start in cells.iter().step_by(5) {
            for &goal in cells.iter().step_by(7) {
                for mode in [SearchMode::UniformCost, SearchMode::WeightedBestFirst] {
                    for heuristic in [Heuristic::Euclidean, Heuristic::Manhattan] {
                        let (path, _) = search(start, goal, &grid, mode, heuristic);
                        assert_eq!(path.len(), manhattan(start, goal) + 1);
                        assert_valid_path(&grid, &path, start, goal);
                    }
                }
            }
        }
    }

    // Equal-priority ties go to the smaller cell, which fixes the exact route.
    #[test]
    fn test_greedy_exact_route() {
        let grid = open_grid(3, 3);
        let start = Cell::new(0, 0);
        let goal = Cell::new(2, 2);
        let (path, visited) = search(
            start,
            goal,
            &grid,
            SearchMode::GreedyBestFirst,
            Heuristic::Euclidean,
        );

        let expected = vec![
            Cell::new(0, 0),
            Cell::new(0, 1),
            Cell::new(1, 1),
            Cell::new(1, 2),
            Cell::new(2, 2),
        ];
        assert_eq!(path, expected);
        assert_eq!(visited, expected.into_iter().collect::<HashSet<_>>());
    }

    // Greedy lowers recorded costs along the detour before reaching the goal;
    // the reconstructed route still matches the goal's recorded cost.
    #[test]
    fn test_greedy_detour_matches_recorded_cost() {
        let grid = Grid::from_rows(vec![
            vec![0, 0, 0, 0, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 0, 0, 1, 0],
            vec![0, 0, 1, 0, 0],
            vec![0, 1, 0, 0, 0],
        ])
        .unwrap();
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 4);
        let expected: Path = [
            (0, 0),
            (0, 1),
            (1, 1),
            (2, 1),
            (2, 0),
            (3, 0),
            (4, 0),
            (4, 1),
            (4, 2),
            (4, 3),
            (4, 4),
        ]
        .into_iter()
        .map(Cell::from)
        .collect();

        for heuristic in [Heuristic::Euclidean, Heuristic::Manhattan] {
            let mut engine =
                SearchEngine::new(&grid, start, goal, SearchMode::GreedyBestFirst, heuristic);
            assert_eq!(engine.run(), SearchState::Succeeded);
            let path = engine.path();
            assert_eq!(path, expected);
            assert_eq!(engine.cost_to(goal), Some(path.len() - 1));

            let mut optimal =
                SearchEngine::new(&grid, start, goal, SearchMode::UniformCost, heuristic);
            optimal.run();
            assert_eq!(optimal.cost_to(goal), Some(8));
        }
    }

    #[test]
    fn test_map_file_shortest_path() {
        init_tracing();
        let grid = Grid::from_file("map_file/test/test.map").unwrap();
        let start = Cell::new(0, 0);
        let goal = Cell::new(2, 2);

        for mode in [SearchMode::UniformCost, SearchMode::WeightedBestFirst] {
            let mut engine = SearchEngine::new(&grid, start, goal, mode, Heuristic::Euclidean);
            assert_eq!(engine.run(), SearchState::Succeeded);
            let path = engine.path();
            assert_eq!(path.len(), 9);
            assert_valid_path(&grid, &path, start, goal);
            assert_eq!(engine.cost_to(goal), Some(8));
        }

        let (path, _) = search(
            start,
            goal,
            &grid,
            SearchMode::GreedyBestFirst,
            Heuristic::Manhattan,
        );
        assert!(path.len() >= 9);
        assert_valid_path(&grid, &path, start, goal);
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = Grid::from_file("map_file/test/test.map").unwrap();
        let cell = Cell::new(4, 4);
        for mode in SearchMode::ALL {
            let (path, visited) = search(cell, cell, &grid, mode, Heuristic::Euclidean);
            assert_eq!(path, vec![cell]);
            assert_eq!(visited, HashSet::from([cell]));
        }
    }

    #[test]
    fn test_extreme_endpoints_yield_no_path() {
        let grid = open_grid(3, 3);
        let origin = Cell::new(0, 0);
        let extremes = [
            Cell::new(i64::MIN, 0),
            Cell::new(i64::MAX, 0),
            Cell::new(0, i64::MIN),
            Cell::new(i64::MIN, i64::MAX),
        ];

        for far in extremes {
            for mode in SearchMode::ALL {
                for heuristic in [Heuristic::Euclidean, Heuristic::Manhattan] {
                    let (path, visited) = search(origin, far, &grid, mode, heuristic);
                    assert!(path.is_empty());
                    assert_eq!(visited.len(), 9);

                    let (path, visited) = search(far, origin, &grid, mode, heuristic);
                    assert!(path.is_empty());
                    assert_eq!(visited, HashSet::from([far]));
                }
            }
        }
    }

    #[test]
    fn test_wall_blocks_every_mode() {
        let grid = Grid::from_file("map_file/test/wall.txt").unwrap();
        let start = Cell::new(0, 2);
        let goal = Cell::new(6, 2);
        for mode in SearchMode::ALL {
            let mut engine = SearchEngine::new(&grid, start, goal, mode, Heuristic::Euclidean);
            assert_eq!(engine.run(), SearchState::Failed);
            assert!(engine.path().is_empty());
            assert_eq!(engine.visited().len(), 15);
            assert!(!engine.visited().contains(&goal));
        }
    }

    #[test]
    fn test_enclosed_goal_visits_start_component() {
        let grid = Grid::from_file("map_file/test/enclosed.txt").unwrap();
        let start = Cell::new(0, 0);
        let goal = Cell::new(4, 2);
        let component = reachable_from(&grid, start);
        assert_eq!(component.len(), 15);

        for mode in SearchMode::ALL {
            for heuristic in [Heuristic::Euclidean, Heuristic::Manhattan] {
                let (path, visited) = search(start, goal, &grid, mode, heuristic);
                assert!(path.is_empty());
                assert_eq!(visited, component);
            }
        }
    }

    #[test]
    fn test_invalid_endpoints_yield_no_path() {
        let grid = open_grid(4, 4);
        let goal = Cell::new(3, 3);

        let outside = Cell::new(-1, 0);
        let (path, visited) = search(
            outside,
            goal,
            &grid,
            SearchMode::WeightedBestFirst,
            Heuristic::Euclidean,
        );
        assert!(path.is_empty());
        assert_eq!(visited, HashSet::from([outside]));

        let (path, _) = search(
            Cell::new(0, 0),
            Cell::new(9, 9),
            &grid,
            SearchMode::UniformCost,
            Heuristic::Euclidean,
        );
        assert!(path.is_empty());
    }

    #[test]
    fn test_visited_grows_monotonically() {
        let grid = Grid::from_file("map_file/test/test.map").unwrap();
        let goal = Cell::new(2, 4);
        let mut engine = SearchEngine::new(
            &grid,
            Cell::new(4, 4),
            goal,
            SearchMode::UniformCost,
            Heuristic::Euclidean,
        );
        assert_eq!(engine.state(), SearchState::Initialized);

        let mut previous = 0;
        while !engine.is_finished() {
            engine.step();
            assert!(engine.visited().len() >= previous);
            previous = engine.visited().len();
        }

        assert_eq!(engine.state(), SearchState::Succeeded);
        assert!(engine.visited().contains(&goal));
        assert_eq!(engine.step(), SearchState::Succeeded);
        assert_eq!(engine.visited().len(), previous);
    }

    #[test]
    fn test_search_is_deterministic() {
        let grid = Grid::from_file("map_file/test/test.map").unwrap();
        for mode in SearchMode::ALL {
            let (start, goal) = (Cell::new(0, 4), Cell::new(4, 4));
            let first = search(start, goal, &grid, mode, Heuristic::Euclidean);
            let second = search(start, goal, &grid, mode, Heuristic::Euclidean);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_random_grids_properties() {
        let start = Cell::new(0, 0);
        let goal = Cell::new(19, 14);

        for seed in 0..30 {
            let mut rng = StdRng::seed_from_u64(seed);
            let grid = Grid::random(20, 15, 0.3, &[start, goal], &mut rng).unwrap();
            let reachable = reachable_from(&grid, start).contains(&goal);

            for heuristic in [Heuristic::Euclidean, Heuristic::Manhattan] {
                let mut lengths = HashMap::new();
                for mode in SearchMode::ALL {
                    let mut engine = SearchEngine::new(&grid, start, goal, mode, heuristic);
                    engine.run();
                    let path = engine.path();

                    if reachable {
                        assert_eq!(engine.state(), SearchState::Succeeded);
                        assert_valid_path(&grid, &path, start, goal);
                        assert_eq!(engine.cost_to(goal), Some(path.len() - 1));
                        assert!(engine.visited().contains(&goal));
                    } else {
                        assert_eq!(engine.state(), SearchState::Failed);
                        assert!(path.is_empty());
                    }
                    lengths.insert(mode, path.len());
                }

                assert_eq!(
                    lengths[&SearchMode::WeightedBestFirst],
                    lengths[&SearchMode::UniformCost]
                );
                assert!(
                    lengths[&SearchMode::WeightedBestFirst]
                        <= lengths[&SearchMode::GreedyBestFirst]
                );
            }
        }
    }
}
