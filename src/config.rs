use crate::error::{NavError, Result};
use crate::grid::{Grid, Position};
use crate::pathfinding::SearchOptions;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Largest accepted grid side, in cells
pub const MAX_GRID_SIDE: i32 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default = "default_obstacles")]
    pub obstacles: Vec<ObstacleRect>,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub search: SearchOptions,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_cols")]
    pub cols: i32,
    #[serde(default = "default_rows")]
    pub rows: i32,
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
}

/// Axis-aligned block of obstacle cells placed at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ObstacleRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Default agent and target positions, restored by `reset`
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_start_x")]
    pub start_x: i32,
    #[serde(default = "default_start_y")]
    pub start_y: i32,
    #[serde(default = "default_target_x")]
    pub target_x: i32,
    #[serde(default = "default_target_y")]
    pub target_y: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_range")]
    pub range: i32,
    #[serde(default = "default_min_range")]
    pub min_range: i32,
    #[serde(default = "default_max_range")]
    pub max_range: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,
    #[serde(default = "default_min_step_delay_ms")]
    pub min_step_delay_ms: u64,
    #[serde(default = "default_max_step_delay_ms")]
    pub max_step_delay_ms: u64,
    /// Increment used by the front end's speed keys
    #[serde(default = "default_delay_step_ms")]
    pub delay_step_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    #[serde(default = "default_bg_r")]
    pub background_r: u8,
    #[serde(default = "default_bg_g")]
    pub background_g: u8,
    #[serde(default = "default_bg_b")]
    pub background_b: u8,
    #[serde(default = "default_show_grid_lines")]
    pub show_grid_lines: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_enable_action_log")]
    pub enable_action_log: bool,
    #[serde(default = "default_action_log_path")]
    pub action_log_path: String,
}

// Default values
fn default_cols() -> i32 { 40 }
fn default_rows() -> i32 { 30 }
fn default_cell_size() -> f32 { 15.0 }
fn default_start_x() -> i32 { 2 }
fn default_start_y() -> i32 { 2 }
fn default_target_x() -> i32 { 35 }
fn default_target_y() -> i32 { 25 }
fn default_sensor_range() -> i32 { 3 }
fn default_min_range() -> i32 { 1 }
fn default_max_range() -> i32 { 8 }
fn default_step_delay_ms() -> u64 { 500 }
fn default_min_step_delay_ms() -> u64 { 100 }
fn default_max_step_delay_ms() -> u64 { 1000 }
fn default_delay_step_ms() -> u64 { 50 }
fn default_window_title() -> String { "GridNav - Obstacle Avoidance".to_string() }
fn default_bg_r() -> u8 { 248 }
fn default_bg_g() -> u8 { 249 }
fn default_bg_b() -> u8 { 250 }
fn default_show_grid_lines() -> bool { true }
fn default_enable_action_log() -> bool { true }
fn default_action_log_path() -> String { "action_log.json".to_string() }

fn default_obstacles() -> Vec<ObstacleRect> {
    vec![
        ObstacleRect { x: 10, y: 5, width: 3, height: 8 },
        ObstacleRect { x: 20, y: 10, width: 5, height: 3 },
        ObstacleRect { x: 30, y: 15, width: 2, height: 6 },
        ObstacleRect { x: 15, y: 20, width: 8, height: 2 },
        ObstacleRect { x: 5, y: 25, width: 4, height: 3 },
    ]
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: default_cols(),
            rows: default_rows(),
            cell_size: default_cell_size(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            start_x: default_start_x(),
            start_y: default_start_y(),
            target_x: default_target_x(),
            target_y: default_target_y(),
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            range: default_sensor_range(),
            min_range: default_min_range(),
            max_range: default_max_range(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay_ms(),
            min_step_delay_ms: default_min_step_delay_ms(),
            max_step_delay_ms: default_max_step_delay_ms(),
            delay_step_ms: default_delay_step_ms(),
        }
    }
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            background_r: default_bg_r(),
            background_g: default_bg_g(),
            background_b: default_bg_b(),
            show_grid_lines: default_show_grid_lines(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_action_log: default_enable_action_log(),
            action_log_path: default_action_log_path(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            obstacles: default_obstacles(),
            agent: AgentConfig::default(),
            sensor: SensorConfig::default(),
            playback: PlaybackConfig::default(),
            search: SearchOptions::default(),
            visual: VisualConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AgentConfig {
    pub fn start(&self) -> Position {
        Position::new(self.start_x, self.start_y)
    }

    pub fn target(&self) -> Position {
        Position::new(self.target_x, self.target_y)
    }
}

impl SensorConfig {
    /// Accept `range` only inside the configured bounds
    pub fn check(&self, range: i32) -> Result<i32> {
        if range < self.min_range || range > self.max_range {
            return Err(NavError::InvalidConfiguration {
                field: "sensor range",
                value: range as i64,
                min: self.min_range as i64,
                max: self.max_range as i64,
            });
        }
        Ok(range)
    }
}

impl PlaybackConfig {
    /// Accept `delay_ms` only inside the configured bounds
    pub fn check(&self, delay_ms: u64) -> Result<u64> {
        if delay_ms == 0 || delay_ms < self.min_step_delay_ms || delay_ms > self.max_step_delay_ms {
            return Err(NavError::InvalidConfiguration {
                field: "step delay (ms)",
                value: delay_ms as i64,
                min: self.min_step_delay_ms as i64,
                max: self.max_step_delay_ms as i64,
            });
        }
        Ok(delay_ms)
    }
}

impl Config {
    /// Load configuration from config.toml, or use defaults if it is missing or invalid
    pub fn load() -> Self {
        match Self::load_from("config.toml") {
            Ok(config) => {
                info!("Loaded configuration from config.toml");
                config
            }
            Err(NavError::Io(_)) => {
                info!("No config.toml found, using default configuration");
                Config::default()
            }
            Err(e) => {
                warn!("Failed to load config.toml: {}", e);
                warn!("Using default configuration");
                Config::default()
            }
        }
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the session could not start with
    pub fn validate(&self) -> Result<()> {
        if self.grid.cols <= 0 || self.grid.rows <= 0 {
            return Err(NavError::Config(format!(
                "grid must be at least 1x1, got {}x{}",
                self.grid.cols, self.grid.rows
            )));
        }
        if self.grid.cols > MAX_GRID_SIDE || self.grid.rows > MAX_GRID_SIDE {
            return Err(NavError::Config(format!(
                "grid {}x{} exceeds the {}x{} limit",
                self.grid.cols, self.grid.rows, MAX_GRID_SIDE, MAX_GRID_SIDE
            )));
        }
        if self.sensor.min_range < 1 || self.sensor.min_range > self.sensor.max_range {
            return Err(NavError::Config(format!(
                "sensor range bounds {}..={} are empty or non-positive",
                self.sensor.min_range, self.sensor.max_range
            )));
        }
        // Nothing on the grid is further away than its diagonal
        let diagonal = (self.grid.cols as f64).hypot(self.grid.rows as f64).ceil() as i32;
        if self.sensor.max_range > diagonal {
            return Err(NavError::Config(format!(
                "sensor max_range {} exceeds the grid diagonal {}",
                self.sensor.max_range, diagonal
            )));
        }
        if self.playback.min_step_delay_ms == 0
            || self.playback.min_step_delay_ms > self.playback.max_step_delay_ms
        {
            return Err(NavError::Config(format!(
                "step delay bounds {}..={} are empty or non-positive",
                self.playback.min_step_delay_ms, self.playback.max_step_delay_ms
            )));
        }
        self.sensor.check(self.sensor.range)?;
        self.playback.check(self.playback.step_delay_ms)?;

        let grid = Grid::new(self.grid.cols, self.grid.rows);
        grid.check_bounds(self.agent.start())?;
        grid.check_bounds(self.agent.target())?;
        Ok(())
    }

    /// Build the starting grid: configured size with the obstacle blocks applied
    pub fn build_grid(&self) -> Grid {
        let mut grid = Grid::new(self.grid.cols, self.grid.rows);
        for rect in &self.obstacles {
            grid.fill_rect(rect.x, rect.y, rect.width, rect.height);
        }
        grid
    }
}
