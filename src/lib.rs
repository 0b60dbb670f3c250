//! **mazeplay** generates corridor-style mazes with a ranked-bucket variant
//! of Prim's algorithm, validates player moves against the generated
//! connectivity and keeps per-attempt timing statistics across levels.

pub mod cells;
pub mod generators;
pub mod grid;
pub mod session;
pub mod stats;
pub mod units;
mod utils;
