//! One player's attempt at one maze: current position, move validation
//! against the generated connectivity, win detection and attempt timing.
//!
//! A session is created per maze and never reused; winning is terminal.

use crate::cells::{Cartesian2DCoordinate, CellState, Direction};
use crate::grid::Grid;

use std::time::Instant;

/// The typed outcome of a move attempt. `Blocked` and `OutOfBounds` are
/// expected and frequent, not errors; neither mutates the session.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub enum MoveOutcome {
    Moved(Cartesian2DCoordinate),
    Blocked,
    OutOfBounds,
    Won,
}

#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum SessionState {
    Playing,
    Completed,
}

#[derive(Debug)]
pub struct PlayerSession {
    position: Cartesian2DCoordinate,
    start: Cartesian2DCoordinate,
    end: Cartesian2DCoordinate,
    state: SessionState,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl PlayerSession {
    /// Begin an attempt at the maze bounded by `start` and `end`.
    ///
    /// A degenerate maze whose start is its end (the 1x1 grid) has no move
    /// that could win it, so the session begins already completed.
    pub fn new(start: Cartesian2DCoordinate, end: Cartesian2DCoordinate) -> PlayerSession {
        let now = Instant::now();
        let (state, finished_at) = if start == end {
            (SessionState::Completed, Some(now))
        } else {
            (SessionState::Playing, None)
        };

        PlayerSession { position: start, start, end, state, started_at: now, finished_at }
    }

    #[inline]
    pub fn position(&self) -> Cartesian2DCoordinate {
        self.position
    }

    #[inline]
    pub fn start(&self) -> Cartesian2DCoordinate {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Cartesian2DCoordinate {
        self.end
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Seconds from session start until the winning move, or until now while
    /// still playing.
    pub fn elapsed_seconds(&self) -> f64 {
        let finish = self.finished_at.unwrap_or_else(Instant::now);
        finish.duration_since(self.started_at).as_secs_f64()
    }

    /// Try to move one cell in `direction`.
    ///
    /// The target must exist on the grid and must have been absorbed into the
    /// maze - adjacency alone is never enough, an unabsorbed wall cell
    /// rejects the move. Entering the End cell wins and is terminal; the
    /// position deliberately does not advance onto it. A completed session
    /// rejects all further moves without mutating anything.
    pub fn attempt_move(&mut self, grid: &Grid, direction: Direction) -> MoveOutcome {
        if self.is_complete() {
            return MoveOutcome::Blocked;
        }

        let target = match grid.neighbour_towards(self.position, direction) {
            Some(target) => target,
            None => return MoveOutcome::OutOfBounds,
        };

        match grid.state_of(target) {
            Some(CellState::End) => {
                self.state = SessionState::Completed;
                self.finished_at = Some(Instant::now());
                MoveOutcome::Won
            }
            Some(state) if state.is_open() => {
                self.position = target;
                MoveOutcome::Moved(target)
            }
            _ => MoveOutcome::Blocked,
        }
    }
}
