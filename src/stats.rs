//! Per-attempt timing aggregates and the level counter, plus the key-value
//! settings interface a persistence collaborator plugs into.
//!
//! Four scalar fields survive across attempts, keyed by fixed strings. An
//! absent key always means "first-ever attempt": loading an empty store gives
//! fresh-start defaults and a failed read is treated the same way, never as a
//! fatal error.

use crate::utils::{self, FnvHashMap};

pub const LEVEL_KEY: &str = "level";
pub const TOTAL_TIME_KEY: &str = "total_time";
pub const AVERAGE_TIME_KEY: &str = "average_time";
pub const FASTEST_TIME_KEY: &str = "fastest_time";

/// Durable key-value storage for progress, injected rather than ambient.
pub trait SettingsStore {
    fn get_int(&self, key: &str) -> Option<i64>;
    fn set_int(&mut self, key: &str, value: i64);
    fn get_float(&self, key: &str) -> Option<f64>;
    fn set_float(&mut self, key: &str, value: f64);
}

/// Store backed by plain hash maps; the default for tests and for callers
/// that do not persist anything.
#[derive(Debug, Default)]
pub struct InMemorySettings {
    ints: FnvHashMap<String, i64>,
    floats: FnvHashMap<String, f64>,
}

impl InMemorySettings {
    pub fn new() -> InMemorySettings {
        InMemorySettings { ints: utils::fnv_hashmap(4), floats: utils::fnv_hashmap(4) }
    }
}

impl SettingsStore for InMemorySettings {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.get(key).cloned()
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.ints.insert(key.to_owned(), value);
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.floats.get(key).cloned()
    }

    fn set_float(&mut self, key: &str, value: f64) {
        self.floats.insert(key.to_owned(), value);
    }
}

/// The current level, used by the presentation layer to size the next grid.
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
pub struct LevelProgression {
    level: u32,
}

impl LevelProgression {
    pub fn new() -> LevelProgression {
        LevelProgression { level: 1 }
    }

    pub fn from_level(level: u32) -> LevelProgression {
        LevelProgression { level: level.max(1) }
    }

    #[inline]
    pub fn current(&self) -> u32 {
        self.level
    }

    /// Bump the level on a win; returns the new level.
    pub fn advance(&mut self) -> u32 {
        self.level += 1;
        self.level
    }
}

impl Default for LevelProgression {
    fn default() -> LevelProgression {
        LevelProgression::new()
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StatsSnapshot {
    pub total: f64,
    pub average: f64,
    pub fastest: f64,
}

/// Running aggregates over completed attempts. The recorder owns its own
/// completion count and never touches the level counter.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsRecorder {
    completed: u32,
    total_time: f64,
    fastest_time: Option<f64>,
}

impl StatsRecorder {
    pub fn new() -> StatsRecorder {
        StatsRecorder { completed: 0, total_time: 0.0, fastest_time: None }
    }

    /// Rebuild a recorder from persisted aggregates.
    pub fn from_completed(
        completed: u32,
        total_time: f64,
        fastest_time: Option<f64>,
    ) -> StatsRecorder {
        StatsRecorder { completed, total_time, fastest_time }
    }

    /// Fold one finished attempt's elapsed seconds into the aggregates.
    pub fn record_completion(&mut self, elapsed: f64) -> StatsSnapshot {
        self.completed += 1;
        self.total_time += elapsed;
        self.fastest_time = Some(match self.fastest_time {
            Some(fastest) => fastest.min(elapsed),
            None => elapsed,
        });

        StatsSnapshot {
            total: self.total_time,
            average: self.total_time / f64::from(self.completed),
            fastest: self.fastest_time.unwrap_or(elapsed),
        }
    }

    #[inline]
    pub fn completed(&self) -> u32 {
        self.completed
    }

    /// None before the first completion, so displays can show N/A.
    pub fn total_time(&self) -> Option<f64> {
        if self.completed > 0 {
            Some(self.total_time)
        } else {
            None
        }
    }

    pub fn average_time(&self) -> Option<f64> {
        if self.completed > 0 {
            Some(self.total_time / f64::from(self.completed))
        } else {
            None
        }
    }

    #[inline]
    pub fn fastest_time(&self) -> Option<f64> {
        self.fastest_time
    }
}

impl Default for StatsRecorder {
    fn default() -> StatsRecorder {
        StatsRecorder::new()
    }
}

/// Read persisted progress at process start. Absent keys mean fresh state:
/// level 1 and an empty recorder.
pub fn load_progress(store: &dyn SettingsStore) -> (LevelProgression, StatsRecorder) {
    let level = store
        .get_int(LEVEL_KEY)
        .and_then(|raw| if raw >= 1 { Some(raw as u32) } else { None })
        .unwrap_or(1);
    let progression = LevelProgression::from_level(level);

    let recorder = match store.get_float(TOTAL_TIME_KEY) {
        Some(total) => StatsRecorder::from_completed(
            level.saturating_sub(1),
            total,
            store.get_float(FASTEST_TIME_KEY),
        ),
        None => StatsRecorder::new(),
    };

    (progression, recorder)
}

/// Write the post-win level and aggregates back to the store.
pub fn save_progress(store: &mut dyn SettingsStore, level: u32, snapshot: &StatsSnapshot) {
    store.set_int(LEVEL_KEY, i64::from(level));
    store.set_float(TOTAL_TIME_KEY, snapshot.total);
    store.set_float(AVERAGE_TIME_KEY, snapshot.average);
    store.set_float(FASTEST_TIME_KEY, snapshot.fastest);
}
