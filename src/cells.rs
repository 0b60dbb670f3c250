use smallvec::SmallVec;
use std::convert::From;

/// Number of distinct rank values a cell can be assigned, `0..RANK_RANGE`.
/// The generator keeps one candidate bucket per rank.
pub const RANK_RANGE: u8 = 10;

#[derive(Hash, Eq, PartialEq, Copy, Clone, Debug, Ord, PartialOrd)]
pub struct Cartesian2DCoordinate {
    pub x: u32,
    pub z: u32,
}

impl Cartesian2DCoordinate {
    pub fn new(x: u32, z: u32) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate { x, z }
    }
}

impl From<(u32, u32)> for Cartesian2DCoordinate {
    fn from(x_z_pair: (u32, u32)) -> Cartesian2DCoordinate {
        Cartesian2DCoordinate::new(x_z_pair.0, x_z_pair.1)
    }
}

pub type CoordinateSmallVec = SmallVec<[Cartesian2DCoordinate; 4]>;

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

pub const ALL_DIRECTIONS: [Direction; 4] =
    [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

impl Direction {
    /// The coordinate one cell away in this direction, or `None` when it is
    /// not representable (below zero). The upper grid boundary is the grid's
    /// concern as only it knows the dimensions.
    pub fn offset_coordinate(self, coord: Cartesian2DCoordinate) -> Option<Cartesian2DCoordinate> {
        let (x, z) = (coord.x, coord.z);
        match self {
            Direction::Up => Some(Cartesian2DCoordinate { x, z: z + 1 }),
            Direction::Down => {
                if z > 0 {
                    Some(Cartesian2DCoordinate { x, z: z - 1 })
                } else {
                    None
                }
            }
            Direction::Right => Some(Cartesian2DCoordinate { x: x + 1, z }),
            Direction::Left => {
                if x > 0 {
                    Some(Cartesian2DCoordinate { x: x - 1, z })
                } else {
                    None
                }
            }
        }
    }
}

/// Explicit generation state of a cell. Rendering derives colour from this,
/// never the reverse.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum CellState {
    /// Not absorbed into the maze; a wall unless generation still runs.
    Unvisited,
    /// Adjacent to the absorbed set, queued in a rank bucket.
    Frontier,
    /// Absorbed into the maze as a corridor cell.
    Path,
    Start,
    End,
}

impl CellState {
    /// Whether a player may stand on or move through a cell in this state.
    pub fn is_open(self) -> bool {
        match self {
            CellState::Path | CellState::Start | CellState::End => true,
            CellState::Unvisited | CellState::Frontier => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    coordinate: Cartesian2DCoordinate,
    random_rank: u8,
    neighbours: CoordinateSmallVec,
    open_neighbour_count: u8,
    state: CellState,
}

impl Cell {
    pub(crate) fn new(coordinate: Cartesian2DCoordinate) -> Cell {
        Cell {
            coordinate,
            random_rank: 0,
            neighbours: CoordinateSmallVec::new(),
            open_neighbour_count: 0,
            state: CellState::Unvisited,
        }
    }

    #[inline]
    pub fn coordinate(&self) -> Cartesian2DCoordinate {
        self.coordinate
    }

    #[inline]
    pub fn random_rank(&self) -> u8 {
        self.random_rank
    }

    /// Grid-adjacent cells, boundary clipped. Empty until the grid has linked
    /// its neighbours.
    #[inline]
    pub fn neighbours(&self) -> &[Cartesian2DCoordinate] {
        &self.neighbours
    }

    /// How many of this cell's neighbours have been absorbed into the maze.
    #[inline]
    pub fn open_neighbour_count(&self) -> u8 {
        self.open_neighbour_count
    }

    #[inline]
    pub fn state(&self) -> CellState {
        self.state
    }

    pub(crate) fn set_random_rank(&mut self, rank: u8) {
        debug_assert!(rank < RANK_RANGE);
        self.random_rank = rank;
    }

    pub(crate) fn set_neighbours(&mut self, neighbours: CoordinateSmallVec) {
        self.neighbours = neighbours;
    }

    pub(crate) fn set_state(&mut self, state: CellState) {
        self.state = state;
    }

    pub(crate) fn increment_open_neighbour_count(&mut self) {
        self.open_neighbour_count += 1;
    }
}
