//! Maze generation: a randomized-Prim-like absorption over ranked candidate
//! buckets.
//!
//! Starting from cell (0, 0) the generator repeatedly absorbs one frontier
//! cell into the maze. Candidates queue in ten FIFO buckets indexed by their
//! random rank; the next absorption always pops the first cell of the lowest
//! non-empty bucket, so ties at equal rank go to the earliest discovered cell.
//! A popped candidate that already has two absorbed neighbours is discarded
//! and stays a wall - that cap is what keeps the result corridor-like instead
//! of a bushy tree. Absorption stops when the buckets run dry, and the last
//! absorbed cell becomes the End cell.
//!
//! Every absorbed cell other than the start had exactly one absorbed
//! neighbour at the moment it was absorbed (two would have disqualified it),
//! so carving a passage to that discoverer builds a tree: the absorbed set is
//! connected and acyclic by construction.

use crate::cells::{Cartesian2DCoordinate, Cell, CellState, CoordinateSmallVec, RANK_RANGE};
use crate::grid::Grid;
use crate::utils::{self, FnvHashSet};

use rand_xorshift::XorShiftRng;
use std::array;
use std::collections::VecDeque;

pub const RANK_BUCKET_COUNT: usize = RANK_RANGE as usize;

/// A cell linked in by this many absorbed neighbours before its own turn
/// comes up is discarded without being absorbed.
const MAX_OPENED_NEIGHBOURS: u8 = 2;

/// The outcome of one complete generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    absorbed_order: Vec<Cartesian2DCoordinate>,
    start: Cartesian2DCoordinate,
    end: Cartesian2DCoordinate,
}

impl GenerationResult {
    /// Every absorbed cell, in absorption order. The first entry is the
    /// start, the last the end. Useful for animated playback of the carve.
    #[inline]
    pub fn absorbed_order(&self) -> &[Cartesian2DCoordinate] {
        &self.absorbed_order
    }

    #[inline]
    pub fn start(&self) -> Cartesian2DCoordinate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Cartesian2DCoordinate {
        self.end
    }
}

/// Generate a maze on the grid in one atomic call: assigns ranks from the
/// given randomness source, links neighbours and runs the absorption to
/// completion.
pub fn generate(grid: &mut Grid, rng: &mut XorShiftRng) -> GenerationResult {
    grid.assign_random_ranks(rng);
    grid.link_neighbours();
    RankedPrim::new(grid).into_result()
}

/// Resumable generation state, scoped to one run over one grid.
///
/// `step` absorbs one cell at a time so a caller may interleave its own work
/// (an incremental reveal, say) with generation. `into_result` finishes any
/// remaining work. The grid must already have ranks assigned and neighbours
/// linked; [`generate`] is the packaged whole.
pub struct RankedPrim<'a> {
    grid: &'a mut Grid,
    absorbed: Vec<Cartesian2DCoordinate>,
    candidates_by_rank: [VecDeque<Cartesian2DCoordinate>; RANK_BUCKET_COUNT],
    // Every coordinate ever queued; a popped candidate is never queued again,
    // absorbed or not.
    queued: FnvHashSet<Cartesian2DCoordinate>,
    done: bool,
}

impl<'a> RankedPrim<'a> {
    pub fn new(grid: &'a mut Grid) -> RankedPrim<'a> {
        let cells_count = grid.size();
        let start = Cartesian2DCoordinate::new(0, 0);

        let mut generation = RankedPrim {
            grid,
            absorbed: Vec::with_capacity(cells_count),
            candidates_by_rank: array::from_fn(|_| VecDeque::new()),
            queued: utils::fnv_hashset(cells_count),
            done: false,
        };

        if let Some(cell) = generation.grid.cell_at_mut(start) {
            cell.set_state(CellState::Start);
        }
        generation.queued.insert(start);
        generation.absorbed.push(start);
        generation.open_neighbours_of(start);
        generation
    }

    /// Absorb the next eligible candidate. Returns true while more work
    /// remains, false once the buckets are exhausted and the end cell is
    /// designated.
    pub fn step(&mut self) -> bool {
        if self.done {
            return false;
        }

        loop {
            let candidate = self
                .candidates_by_rank
                .iter_mut()
                .find(|bucket| !bucket.is_empty())
                .and_then(VecDeque::pop_front);

            let coord = match candidate {
                Some(coord) => coord,
                None => {
                    self.finish();
                    return false;
                }
            };

            let opened = self.grid.cell_at(coord).map_or(0, Cell::open_neighbour_count);
            if opened >= MAX_OPENED_NEIGHBOURS {
                // Disqualified: two absorbed neighbours reached it first.
                if let Some(cell) = self.grid.cell_at_mut(coord) {
                    cell.set_state(CellState::Unvisited);
                }
                continue;
            }

            self.absorb(coord);
            return true;
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Run any remaining steps and return the completed result.
    pub fn into_result(mut self) -> GenerationResult {
        while self.step() {}

        let start = self.absorbed[0];
        let end = *self.absorbed.last().expect("the start cell is always absorbed");
        GenerationResult { absorbed_order: self.absorbed, start, end }
    }

    fn absorb(&mut self, coord: Cartesian2DCoordinate) {
        // The unique already-absorbed neighbour that pulled this cell in.
        let discoverer = self.grid.cell_at(coord).and_then(|cell| {
            cell.neighbours()
                .iter()
                .cloned()
                .find(|n| self.grid.state_of(*n).map_or(false, CellState::is_open))
        });

        if let Some(cell) = self.grid.cell_at_mut(coord) {
            cell.set_state(CellState::Path);
        }
        if let Some(from) = discoverer {
            let _ = self.grid.link(coord, from);
        }

        self.absorbed.push(coord);
        self.open_neighbours_of(coord);
    }

    fn open_neighbours_of(&mut self, coord: Cartesian2DCoordinate) {
        let neighbours: CoordinateSmallVec = match self.grid.cell_at(coord) {
            Some(cell) => cell.neighbours().iter().cloned().collect(),
            None => return,
        };

        for neighbour in neighbours {
            if let Some(cell) = self.grid.cell_at_mut(neighbour) {
                cell.increment_open_neighbour_count();

                if cell.state() == CellState::Unvisited && !self.queued.contains(&neighbour) {
                    cell.set_state(CellState::Frontier);
                    let rank = cell.random_rank() as usize;
                    self.candidates_by_rank[rank].push_back(neighbour);
                    self.queued.insert(neighbour);
                }
            }
        }
    }

    fn finish(&mut self) {
        if let Some(end) = self.absorbed.last().cloned() {
            if let Some(cell) = self.grid.cell_at_mut(end) {
                cell.set_state(CellState::End);
            }
        }
        self.done = true;
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::units::{Depth, Width};
    use quickcheck::quickcheck;
    use rand::SeedableRng;
    use std::collections::VecDeque;

    fn generated(width: usize, depth: usize, seed: u64) -> (Grid, GenerationResult) {
        let mut grid = Grid::allocate(Width(width), Depth(depth)).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(seed);
        let result = generate(&mut grid, &mut rng);
        (grid, result)
    }

    fn reachable_from_start(grid: &Grid, result: &GenerationResult) -> FnvHashSet<Cartesian2DCoordinate> {
        let mut reached = utils::fnv_hashset(grid.size());
        let mut frontier = VecDeque::new();
        reached.insert(result.start());
        frontier.push_back(result.start());
        while let Some(coord) = frontier.pop_front() {
            for linked in &*grid.links(coord).unwrap() {
                if reached.insert(*linked) {
                    frontier.push_back(*linked);
                }
            }
        }
        reached
    }

    fn assert_is_corridor_tree(grid: &Grid, result: &GenerationResult) {
        let absorbed = result.absorbed_order();

        // A tree over the absorbed set: one fewer carved passage than cells,
        // and every absorbed cell reachable from the start.
        assert_eq!(grid.links_count(), absorbed.len() - 1);
        let reached = reachable_from_start(grid, result);
        assert_eq!(reached.len(), absorbed.len());
        for coord in absorbed {
            assert!(reached.contains(coord));
        }

        // Each absorbed cell links to exactly one earlier-absorbed cell, its
        // discoverer.
        let mut earlier = utils::fnv_hashset(absorbed.len());
        earlier.insert(absorbed[0]);
        for coord in &absorbed[1..] {
            let links_to_earlier = grid
                .links(*coord)
                .unwrap()
                .iter()
                .filter(|linked| earlier.contains(*linked))
                .count();
            assert_eq!(links_to_earlier, 1);
            earlier.insert(*coord);
        }
    }

    #[test]
    fn starts_at_origin_and_ends_at_last_absorbed() {
        let (grid, result) = generated(8, 8, 7);
        assert_eq!(result.start(), Cartesian2DCoordinate::new(0, 0));
        assert_eq!(result.absorbed_order().first(), Some(&result.start()));
        assert_eq!(result.absorbed_order().last(), Some(&result.end()));
        assert_eq!(grid.state_of(result.start()), Some(CellState::Start));
        assert_eq!(grid.state_of(result.end()), Some(CellState::End));
    }

    #[test]
    fn absorbed_cells_form_a_tree() {
        for seed in 0..8 {
            let (grid, result) = generated(10, 7, seed);
            assert_is_corridor_tree(&grid, &result);
        }
    }

    #[test]
    fn walls_are_unvisited_and_corridors_open() {
        let (grid, result) = generated(9, 9, 3);
        let absorbed: FnvHashSet<Cartesian2DCoordinate> =
            result.absorbed_order().iter().cloned().collect();

        for coord in grid.iter() {
            let state = grid.state_of(coord).unwrap();
            if absorbed.contains(&coord) {
                assert!(state.is_open());
            } else {
                // No Frontier leftovers once the buckets drain.
                assert_eq!(state, CellState::Unvisited);
            }
        }
    }

    #[test]
    fn same_seed_gives_identical_absorption_order() {
        let (_, a) = generated(12, 9, 42);
        let (_, b) = generated(12, 9, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn one_by_one_grid_is_start_and_end() {
        let (grid, result) = generated(1, 1, 0);
        assert_eq!(result.absorbed_order(), &[Cartesian2DCoordinate::new(0, 0)]);
        assert_eq!(result.start(), result.end());
        assert_eq!(grid.links_count(), 0);
        // SetEnd overwrites: the lone cell renders as the finish line.
        assert_eq!(grid.state_of(result.start()), Some(CellState::End));
    }

    #[test]
    fn single_column_absorbs_every_cell() {
        let (grid, result) = generated(1, 6, 11);
        assert_eq!(result.absorbed_order().len(), 6);
        assert_eq!(grid.links_count(), 5);
        assert_eq!(result.end(), Cartesian2DCoordinate::new(0, 5));
    }

    #[test]
    fn stepper_matches_atomic_generation() {
        let (_, atomic) = generated(8, 6, 21);

        let mut grid = Grid::allocate(Width(8), Depth(6)).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(21);
        grid.assign_random_ranks(&mut rng);
        grid.link_neighbours();

        let mut generation = RankedPrim::new(&mut grid);
        let mut steps = 0;
        while generation.step() {
            steps += 1;
        }
        assert!(generation.is_done());
        let stepped = generation.into_result();

        assert_eq!(stepped, atomic);
        // One absorption per productive step, plus the start cell.
        assert_eq!(steps + 1, stepped.absorbed_order().len());
    }

    #[test]
    fn step_after_done_keeps_returning_false() {
        let mut grid = Grid::allocate(Width(3), Depth(3)).unwrap();
        let mut rng = XorShiftRng::seed_from_u64(5);
        grid.assign_random_ranks(&mut rng);
        grid.link_neighbours();

        let mut generation = RankedPrim::new(&mut grid);
        while generation.step() {}
        assert!(!generation.step());
        assert!(!generation.step());
    }

    #[test]
    fn quickcheck_generated_mazes_are_corridor_trees() {
        fn p(width: u8, depth: u8, seed: u64) -> bool {
            let width = usize::from(width % 12) + 1;
            let depth = usize::from(depth % 12) + 1;
            let (grid, result) = generated(width, depth, seed);

            let absorbed = result.absorbed_order();
            absorbed.len() <= grid.size()
                && grid.links_count() == absorbed.len() - 1
                && reachable_from_start(&grid, &result).len() == absorbed.len()
        }
        quickcheck(p as fn(u8, u8, u64) -> bool);
    }
}
