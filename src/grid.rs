use crate::cells::{
    Cartesian2DCoordinate, Cell, CellState, CoordinateSmallVec, Direction, ALL_DIRECTIONS,
    RANK_RANGE,
};
use crate::units::{Depth, EdgesCount, NodesCount, Width};

use petgraph::graph::NodeIndex;
use petgraph::{Graph, Undirected};
use rand::Rng;
use rand_xorshift::XorShiftRng;
use std::{error, fmt};

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum GridError {
    /// Width or depth of zero cells. Fatal to the allocation call, never retried.
    InvalidDimensions,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            GridError::InvalidDimensions => {
                write!(f, "grid dimensions must both be at least one cell")
            }
        }
    }
}

impl error::Error for GridError {}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellLinkError {
    InvalidGridCoordinate,
    SelfLink,
}

/// A `width` x `depth` board of cells, plus the carved passages between them.
///
/// The grid owns every cell exclusively and is created fresh for each maze -
/// a new level or a replay gets a whole new grid, never an in-place reset.
pub struct Grid {
    width: Width,
    depth: Depth,
    cells: Vec<Cell>,
    passages: Graph<(), (), Undirected>,
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Grid :: width: {:?}, depth: {:?}, passages: {}",
            self.width,
            self.depth,
            self.passages.edge_count()
        )
    }
}

impl Grid {
    /// Construct a grid with every cell's coordinate set and no passages.
    /// Ranks and neighbour links are assigned by their own passes, before
    /// generation runs.
    pub fn allocate(width: Width, depth: Depth) -> Result<Grid, GridError> {
        if width.0 == 0 || depth.0 == 0 {
            return Err(GridError::InvalidDimensions);
        }

        let (NodesCount(nodes), EdgesCount(edges)) = graph_size(width, depth);
        let mut cells = Vec::with_capacity(nodes);
        let mut passages = Graph::with_capacity(nodes, edges);
        for index in 0..nodes {
            cells.push(Cell::new(index_to_coordinate(width, index)));
            let _ = passages.add_node(());
        }

        Ok(Grid { width, depth, cells, passages })
    }

    /// Give every cell an independent uniform rank in `0..RANK_RANGE`.
    /// The randomness source is caller supplied so mazes are seedable.
    pub fn assign_random_ranks(&mut self, rng: &mut XorShiftRng) {
        for cell in &mut self.cells {
            cell.set_random_rank(rng.gen_range(0..RANK_RANGE));
        }
    }

    /// Populate every cell's adjacency list with the up-to-4 in-bounds
    /// neighbours. Must run after allocation and before generation.
    pub fn link_neighbours(&mut self) {
        for index in 0..self.cells.len() {
            let coord = self.cells[index].coordinate();
            let neighbours = self.neighbours(coord);
            self.cells[index].set_neighbours(neighbours);
        }
    }

    #[inline]
    pub fn width(&self) -> Width {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> Depth {
        self.depth
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.width.0 * self.depth.0
    }

    pub fn cell_at(&self, coord: Cartesian2DCoordinate) -> Option<&Cell> {
        self.coordinate_to_index(coord).map(|i| &self.cells[i])
    }

    pub(crate) fn cell_at_mut(&mut self, coord: Cartesian2DCoordinate) -> Option<&mut Cell> {
        match self.coordinate_to_index(coord) {
            Some(i) => Some(&mut self.cells[i]),
            None => None,
        }
    }

    pub fn state_of(&self, coord: Cartesian2DCoordinate) -> Option<CellState> {
        self.cell_at(coord).map(Cell::state)
    }

    /// Cells Up, Down, Left or Right of a coordinate, but not necessarily
    /// connected to it by a passage.
    pub fn neighbours(&self, coord: Cartesian2DCoordinate) -> CoordinateSmallVec {
        ALL_DIRECTIONS
            .iter()
            .filter_map(|dir| self.neighbour_towards(coord, *dir))
            .collect()
    }

    /// The in-bounds neighbour one cell away in `direction`, if any.
    pub fn neighbour_towards(
        &self,
        coord: Cartesian2DCoordinate,
        direction: Direction,
    ) -> Option<Cartesian2DCoordinate> {
        direction
            .offset_coordinate(coord)
            .filter(|c| self.is_valid_coordinate(*c))
    }

    pub fn is_valid_coordinate(&self, coord: Cartesian2DCoordinate) -> bool {
        (coord.x as usize) < self.width.0 && (coord.z as usize) < self.depth.0
    }

    /// Carve a passage between two cells.
    pub fn link(
        &mut self,
        a: Cartesian2DCoordinate,
        b: Cartesian2DCoordinate,
    ) -> Result<(), CellLinkError> {
        if a == b {
            return Err(CellLinkError::SelfLink);
        }
        match (self.coordinate_to_index(a), self.coordinate_to_index(b)) {
            (Some(a_index), Some(b_index)) => {
                let _ = self.passages.update_edge(
                    NodeIndex::new(a_index),
                    NodeIndex::new(b_index),
                    (),
                );
                Ok(())
            }
            _ => Err(CellLinkError::InvalidGridCoordinate),
        }
    }

    /// Are two cells connected by a carved passage?
    pub fn is_linked(&self, a: Cartesian2DCoordinate, b: Cartesian2DCoordinate) -> bool {
        match (self.coordinate_to_index(a), self.coordinate_to_index(b)) {
            (Some(a_index), Some(b_index)) => self
                .passages
                .find_edge(NodeIndex::new(a_index), NodeIndex::new(b_index))
                .is_some(),
            _ => false,
        }
    }

    /// Cells joined to `coord` by a carved passage.
    pub fn links(&self, coord: Cartesian2DCoordinate) -> Option<CoordinateSmallVec> {
        let index = self.coordinate_to_index(coord)?;
        let linked = self
            .passages
            .neighbors(NodeIndex::new(index))
            .map(|node| index_to_coordinate(self.width, node.index()))
            .collect();
        Some(linked)
    }

    #[inline]
    pub fn links_count(&self) -> usize {
        self.passages.edge_count()
    }

    /// Convert a coordinate to a row-major index in `0..size()`.
    /// Returns None if the coordinate is out of the grid.
    #[inline]
    pub fn coordinate_to_index(&self, coord: Cartesian2DCoordinate) -> Option<usize> {
        if self.is_valid_coordinate(coord) {
            Some(coord.z as usize * self.width.0 + coord.x as usize)
        } else {
            None
        }
    }

    pub fn iter(&self) -> CellIter {
        CellIter {
            current_cell_number: 0,
            width: self.width,
            cells_count: self.size(),
        }
    }
}

impl<'a> IntoIterator for &'a Grid {
    type Item = Cartesian2DCoordinate;
    type IntoIter = CellIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Rows are printed with the largest `z` first so Up on screen is Up in the
/// grid. One glyph per cell, derived from the cell state.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for z in (0..self.depth.0).rev() {
            for x in 0..self.width.0 {
                let coord = Cartesian2DCoordinate::new(x as u32, z as u32);
                let state = self.state_of(coord).expect("iterated coordinate in bounds");
                let glyph = match state {
                    CellState::Unvisited => '█',
                    CellState::Frontier => '░',
                    CellState::Path => '·',
                    CellState::Start => 'S',
                    CellState::End => 'E',
                };
                write!(f, "{}", glyph)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone)]
pub struct CellIter {
    current_cell_number: usize,
    width: Width,
    cells_count: usize,
}

impl Iterator for CellIter {
    type Item = Cartesian2DCoordinate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.current_cell_number < self.cells_count {
            let coord = index_to_coordinate(self.width, self.current_cell_number);
            self.current_cell_number += 1;
            Some(coord)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.cells_count - self.current_cell_number;
        (remaining, Some(remaining))
    }
}

fn index_to_coordinate(width: Width, row_major_index: usize) -> Cartesian2DCoordinate {
    let z = row_major_index / width.0;
    let x = row_major_index - (z * width.0);
    Cartesian2DCoordinate::new(x as u32, z as u32)
}

fn graph_size(width: Width, depth: Depth) -> (NodesCount, EdgesCount) {
    let cells_count = width.0 * depth.0;
    // A generated maze carves a tree, so at most cells - 1 edges.
    (NodesCount(cells_count), EdgesCount(cells_count.saturating_sub(1)))
}

#[cfg(test)]
mod tests {

    use super::*;
    use itertools::Itertools;
    use rand::SeedableRng;

    fn grid(width: usize, depth: usize) -> Grid {
        Grid::allocate(Width(width), Depth(depth)).expect("test dimensions are valid")
    }

    fn gc(x: u32, z: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x, z)
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert_eq!(Grid::allocate(Width(0), Depth(4)).err(), Some(GridError::InvalidDimensions));
        assert_eq!(Grid::allocate(Width(4), Depth(0)).err(), Some(GridError::InvalidDimensions));
        assert_eq!(Grid::allocate(Width(0), Depth(0)).err(), Some(GridError::InvalidDimensions));
    }

    #[test]
    fn allocation_covers_every_coordinate_once() {
        let g = grid(4, 3);
        assert_eq!(g.size(), 12);

        let coords: Vec<Cartesian2DCoordinate> =
            g.iter().map(|c| g.cell_at(c).unwrap().coordinate()).collect();
        let unique: Vec<Cartesian2DCoordinate> = coords.iter().cloned().unique().collect();
        assert_eq!(coords.len(), 12);
        assert_eq!(unique.len(), 12);
    }

    #[test]
    fn cells_start_unvisited() {
        let g = grid(3, 3);
        for coord in g.iter() {
            assert_eq!(g.state_of(coord), Some(CellState::Unvisited));
            assert_eq!(g.cell_at(coord).unwrap().open_neighbour_count(), 0);
        }
    }

    #[test]
    fn ranks_are_in_range_and_seed_deterministic() {
        let mut a = grid(8, 8);
        let mut b = grid(8, 8);
        let mut rng_a = XorShiftRng::seed_from_u64(99);
        let mut rng_b = XorShiftRng::seed_from_u64(99);
        a.assign_random_ranks(&mut rng_a);
        b.assign_random_ranks(&mut rng_b);

        for coord in a.iter() {
            let rank = a.cell_at(coord).unwrap().random_rank();
            assert!(rank < RANK_RANGE);
            assert_eq!(rank, b.cell_at(coord).unwrap().random_rank());
        }
    }

    #[test]
    fn neighbour_cells() {
        let mut g = grid(10, 10);
        g.link_neighbours();

        let check_expected_neighbours = |coord, expected_neighbours: &[Cartesian2DCoordinate]| {
            let actual: Vec<Cartesian2DCoordinate> =
                g.cell_at(coord).unwrap().neighbours().iter().cloned().sorted().collect();
            let expected: Vec<Cartesian2DCoordinate> =
                expected_neighbours.iter().cloned().sorted().collect();
            assert_eq!(actual, expected);
        };

        // corners
        check_expected_neighbours(gc(0, 0), &[gc(1, 0), gc(0, 1)]);
        check_expected_neighbours(gc(9, 0), &[gc(8, 0), gc(9, 1)]);
        check_expected_neighbours(gc(0, 9), &[gc(0, 8), gc(1, 9)]);
        check_expected_neighbours(gc(9, 9), &[gc(9, 8), gc(8, 9)]);

        // side element examples
        check_expected_neighbours(gc(1, 0), &[gc(0, 0), gc(1, 1), gc(2, 0)]);
        check_expected_neighbours(gc(0, 1), &[gc(0, 0), gc(0, 2), gc(1, 1)]);

        // somewhere with 4 neighbours inside the grid
        check_expected_neighbours(gc(1, 1), &[gc(0, 1), gc(1, 0), gc(2, 1), gc(1, 2)]);
    }

    #[test]
    fn neighbour_towards_boundaries() {
        let g = grid(2, 2);
        assert_eq!(g.neighbour_towards(gc(0, 0), Direction::Left), None);
        assert_eq!(g.neighbour_towards(gc(0, 0), Direction::Down), None);
        assert_eq!(g.neighbour_towards(gc(0, 0), Direction::Right), Some(gc(1, 0)));
        assert_eq!(g.neighbour_towards(gc(0, 0), Direction::Up), Some(gc(0, 1)));

        assert_eq!(g.neighbour_towards(gc(1, 1), Direction::Right), None);
        assert_eq!(g.neighbour_towards(gc(1, 1), Direction::Up), None);
        assert_eq!(g.neighbour_towards(gc(1, 1), Direction::Left), Some(gc(0, 1)));
        assert_eq!(g.neighbour_towards(gc(1, 1), Direction::Down), Some(gc(1, 0)));
    }

    #[test]
    fn linking_cells() {
        let mut g = grid(4, 4);
        let a = gc(0, 1);
        let b = gc(0, 2);
        let c = gc(0, 3);

        assert!(!g.is_linked(a, b));
        assert_eq!(g.links_count(), 0);

        g.link(a, b).unwrap();
        assert!(g.is_linked(a, b));
        assert!(g.is_linked(b, a));
        assert!(!g.is_linked(b, c));
        assert_eq!(g.links_count(), 1);
        assert_eq!(&*g.links(a).unwrap(), &[b]);

        g.link(b, c).unwrap();
        let b_links: Vec<Cartesian2DCoordinate> =
            g.links(b).unwrap().iter().cloned().sorted().collect();
        assert_eq!(b_links, vec![a, c]);

        // relinking does not duplicate the passage
        g.link(a, b).unwrap();
        assert_eq!(g.links_count(), 2);
    }

    #[test]
    fn self_links_and_invalid_coordinates_rejected() {
        let mut g = grid(2, 2);
        assert_eq!(g.link(gc(0, 0), gc(0, 0)), Err(CellLinkError::SelfLink));
        assert_eq!(g.link(gc(0, 0), gc(5, 5)), Err(CellLinkError::InvalidGridCoordinate));
        assert!(!g.is_linked(gc(0, 0), gc(5, 5)));
        assert!(g.links(gc(5, 5)).is_none());
    }

    #[test]
    fn cell_iter_is_row_major() {
        let g = grid(2, 2);
        assert_eq!(
            g.iter().collect::<Vec<Cartesian2DCoordinate>>(),
            &[gc(0, 0), gc(1, 0), gc(0, 1), gc(1, 1)]
        );
    }

    #[test]
    fn out_of_bounds_queries_are_none() {
        let g = grid(3, 3);
        assert!(g.cell_at(gc(3, 0)).is_none());
        assert!(g.state_of(gc(0, 3)).is_none());
        assert_eq!(g.coordinate_to_index(gc(3, 3)), None);
        assert_eq!(g.coordinate_to_index(gc(2, 2)), Some(8));
    }
}
