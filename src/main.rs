use docopt::Docopt;
use itertools::Itertools;
use mazeplay::{
    cells::{Cartesian2DCoordinate, CellState, Direction},
    generators,
    grid::Grid,
    session::{MoveOutcome, PlayerSession},
    stats::{self, InMemorySettings, SettingsStore},
    units::{Depth, Width},
};
use rand::SeedableRng;
use rand_xorshift::XorShiftRng;
use serde_derive::Deserialize;
use std::{
    fs,
    io,
    io::prelude::*,
    path::{Path, PathBuf},
};

const USAGE: &str = "Mazeplay

Usage:
    mazeplay_driver -h | --help
    mazeplay_driver generate [--grid-width=<w>] [--grid-depth=<d>] [--seed=<n>] [--text-out=<path>] [--show-order]
    mazeplay_driver play [--seed=<n>] [--settings-file=<path>] [--fresh]

Options:
    -h --help               Show this screen.
    --grid-width=<w>        Grid width in cells [default: 12].
    --grid-depth=<d>        Grid depth in cells [default: 12].
    --seed=<n>              Seed the maze layout for reproducible runs.
    --text-out=<path>       Write the rendered maze to a file instead of stdout.
    --show-order            Also print the absorption order of the generated maze.
    --settings-file=<path>  Progress file holding level and time records [default: mazeplay_settings.txt].
    --fresh                 Start a new game, discarding saved progress.
";

#[derive(Debug, Deserialize)]
struct MazeArgs {
    cmd_generate: bool,
    cmd_play: bool,
    flag_grid_width: usize,
    flag_grid_depth: usize,
    flag_seed: Option<u64>,
    flag_text_out: String,
    flag_show_order: bool,
    flag_settings_file: String,
    flag_fresh: bool,
}

mod errors {
    use error_chain::*;
    error_chain! {

        foreign_links {
            DocOptFailure(::docopt::Error);
            Io(::std::io::Error);
        }
    }
}
use crate::errors::*;

fn main() -> Result<()> {
    let args: MazeArgs = Docopt::new(USAGE).and_then(|d| d.deserialize())?;

    if args.cmd_play {
        run_play(&args)
    } else {
        run_generate(&args)
    }
}

fn run_generate(args: &MazeArgs) -> Result<()> {
    let mut grid = Grid::allocate(Width(args.flag_grid_width), Depth(args.flag_grid_depth))
        .map_err(|e| e.to_string())?;
    let mut rng = make_rng(args.flag_seed);
    let result = generators::generate(&mut grid, &mut rng);

    let rendered = format!("{}", grid);
    if args.flag_text_out.is_empty() {
        print!("{}", rendered);
    } else {
        write_text_to_file(&rendered, Path::new(&args.flag_text_out))
            .chain_err(|| format!("Failed to write maze to text file {}", args.flag_text_out))?;
    }

    if args.flag_show_order {
        let order = result
            .absorbed_order()
            .iter()
            .map(|coord| format!("({},{})", coord.x, coord.z))
            .join(" ");
        println!("{}", order);
    }

    Ok(())
}

fn run_play(args: &MazeArgs) -> Result<()> {
    if args.flag_fresh {
        // A new game starts over from level 1, like deleting every preference.
        let _ = fs::remove_file(&args.flag_settings_file);
    }
    let mut store = FileSettings::load(&args.flag_settings_file);
    let (mut progression, mut recorder) = stats::load_progress(&store);

    let mut rng = make_rng(args.flag_seed);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    'game: loop {
        let (width, depth) = grid_size_for_level(progression.current());
        let mut grid = Grid::allocate(width, depth).map_err(|e| e.to_string())?;
        let result = generators::generate(&mut grid, &mut rng);
        let mut session = PlayerSession::new(result.start(), result.end());

        println!("LEVEL {}", progression.current());
        print_records(&recorder);
        println!("{}", render_board(&grid, session.position()));
        println!("w/a/s/d = move, n = new maze, m = menu/quit");

        while !session.is_complete() {
            let line = match lines.next() {
                Some(line) => line?,
                None => break 'game,
            };

            let direction = match line.trim().chars().next() {
                Some('w') => Direction::Up,
                Some('s') => Direction::Down,
                Some('a') => Direction::Left,
                Some('d') => Direction::Right,
                Some('n') => continue 'game,
                Some('m') | Some('q') => break 'game,
                _ => continue,
            };

            match session.attempt_move(&grid, direction) {
                MoveOutcome::Moved(_) => {
                    println!("{}", render_board(&grid, session.position()));
                }
                // The player stays put; nothing worth redrawing.
                MoveOutcome::Blocked | MoveOutcome::OutOfBounds => {}
                MoveOutcome::Won => {
                    let elapsed = session.elapsed_seconds();
                    let snapshot = recorder.record_completion(elapsed);
                    let new_level = progression.advance();
                    stats::save_progress(&mut store, new_level, &snapshot);
                    store
                        .persist()
                        .chain_err(|| "Failed to write progress settings")?;
                    println!("Solved in {:.1}s", elapsed);
                }
            }
        }
    }

    Ok(())
}

/// Presentation-owned sizing policy: mazes grow with the level.
fn grid_size_for_level(level: u32) -> (Width, Depth) {
    let side = (6 + 2 * (level as usize - 1)).min(30);
    (Width(side), Depth(side))
}

fn make_rng(seed: Option<u64>) -> XorShiftRng {
    match seed {
        Some(seed) => XorShiftRng::seed_from_u64(seed),
        None => XorShiftRng::from_entropy(),
    }
}

fn print_records(recorder: &stats::StatsRecorder) {
    match recorder.average_time() {
        Some(average) => println!("Average Time: {:.1}", average),
        None => println!("Average Time: N/A"),
    }
    match recorder.fastest_time() {
        Some(fastest) => println!("Fastest Time: {:.1}", fastest),
        None => println!("Fastest Time: N/A"),
    }
}

/// The grid rendering with the player's cell overlaid.
fn render_board(grid: &Grid, player: Cartesian2DCoordinate) -> String {
    let depth = grid.depth().0;
    let width = grid.width().0;
    let mut output = String::with_capacity((width + 1) * depth);

    for z in (0..depth).rev() {
        for x in 0..width {
            let coord = Cartesian2DCoordinate::new(x as u32, z as u32);
            let glyph = if coord == player {
                '@'
            } else {
                match grid.state_of(coord) {
                    Some(CellState::Start) => 'S',
                    Some(CellState::End) => 'E',
                    Some(CellState::Path) => '·',
                    _ => '█',
                }
            };
            output.push(glyph);
        }
        output.push('\n');
    }
    output
}

fn write_text_to_file(data: &str, file_name: &Path) -> io::Result<()> {
    let mut f = fs::File::create(file_name)?;
    f.write_all(data.as_bytes())?;
    Ok(())
}

/// Settings store backed by a line-oriented `key value` text file.
/// Unreadable files or unparseable lines degrade to absent keys.
struct FileSettings {
    path: PathBuf,
    values: InMemorySettings,
}

impl FileSettings {
    fn load(path: &str) -> FileSettings {
        let mut values = InMemorySettings::new();
        if let Ok(contents) = fs::read_to_string(path) {
            for line in contents.lines() {
                let mut parts = line.split_whitespace();
                if let (Some(key), Some(raw)) = (parts.next(), parts.next()) {
                    if let Ok(int) = raw.parse::<i64>() {
                        values.set_int(key, int);
                    } else if let Ok(float) = raw.parse::<f64>() {
                        values.set_float(key, float);
                    }
                }
            }
        }
        FileSettings { path: PathBuf::from(path), values }
    }

    fn persist(&self) -> io::Result<()> {
        let mut data = String::new();
        if let Some(level) = self.values.get_int(stats::LEVEL_KEY) {
            data.push_str(&format!("{} {}\n", stats::LEVEL_KEY, level));
        }
        for key in &[stats::TOTAL_TIME_KEY, stats::AVERAGE_TIME_KEY, stats::FASTEST_TIME_KEY] {
            if let Some(value) = self.values.get_float(key) {
                // Debug float formatting keeps the decimal point, so the
                // value reads back as a float rather than an integer.
                data.push_str(&format!("{} {:?}\n", key, value));
            }
        }
        write_text_to_file(&data, &self.path)
    }
}

impl SettingsStore for FileSettings {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get_int(key)
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.values.set_int(key, value);
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.values.get_float(key)
    }

    fn set_float(&mut self, key: &str, value: f64) {
        self.values.set_float(key, value);
    }
}
