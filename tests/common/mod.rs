#![allow(dead_code)]

use gridnav::{Config, Grid, Position, Session};
use std::collections::HashSet;

/// Parse a test layout.
///
/// Format:
/// - 'S': agent start (free cell)
/// - 'T': target (free cell)
/// - '#': obstacle
/// - '.': free cell
pub fn parse_scenario(text: &str) -> (Grid, Position, Position) {
    let mut start = None;
    let mut target = None;
    let mut rows = Vec::new();

    for (y, line) in text.lines().map(str::trim).filter(|l| !l.is_empty()).enumerate() {
        let mut row = String::new();
        for (x, ch) in line.chars().enumerate() {
            match ch {
                'S' => start = Some(Position::new(x as i32, y as i32)),
                'T' => target = Some(Position::new(x as i32, y as i32)),
                _ => {}
            }
            row.push(if ch == '#' { '#' } else { '.' });
        }
        rows.push(row);
    }

    let grid = Grid::from_layout(&rows.join("\n")).expect("scenario layout should parse");
    (
        grid,
        start.expect("scenario needs an 'S'"),
        target.expect("scenario needs a 'T'"),
    )
}

/// Route library logging to the test output; run with RUST_LOG=debug to see it
pub fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

/// Session with a 100ms step delay around a scenario layout
pub fn scenario_session(text: &str) -> Session {
    init_logging();
    let (grid, start, target) = parse_scenario(text);
    Session::with_grid(grid, start, target, fast_config()).expect("scenario session")
}

pub fn fast_config() -> Config {
    init_logging();
    let mut config = Config::default();
    config.playback.step_delay_ms = 100;
    config
}

/// Every consecutive pair is one 8-directional step and no node is an obstacle
/// (the start is allowed to be one)
pub fn assert_valid_path(grid: &Grid, path: &[Position]) {
    for pair in path.windows(2) {
        assert_eq!(
            pair[0].chebyshev(&pair[1]),
            1,
            "({},{}) -> ({},{}) is not a single step",
            pair[0].x, pair[0].y, pair[1].x, pair[1].y
        );
    }
    for pos in path.iter().skip(1) {
        assert!(!grid.is_obstacle(*pos), "path crosses obstacle at ({},{})", pos.x, pos.y);
    }
    let unique: HashSet<_> = path.iter().collect();
    assert_eq!(unique.len(), path.len(), "path revisits a cell");
}

/// Visualize a path on a grid
pub fn visualize_path(grid: &Grid, path: &[Position]) -> String {
    let mut result = String::new();
    let start = path.first().copied();
    let dest = path.last().copied();

    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = Position::new(x, y);
            let symbol = if Some(pos) == start {
                'S'
            } else if Some(pos) == dest {
                'T'
            } else if path.contains(&pos) {
                '*'
            } else if grid.is_obstacle(pos) {
                '█'
            } else {
                '.'
            };
            result.push(symbol);
        }
        result.push('\n');
    }

    result
}
