//! Simulation session: owns the grid, agent, target and current path, and
//! steps the agent along the path on a simulated millisecond clock.
//!
//! Every command that changes the grid, the agent or the target replans
//! before returning. A replan cancels the pending step; if the session is
//! still running the next step is rescheduled against the new path.

use crate::action_log::Command;
use crate::agent::Agent;
use crate::config::Config;
use crate::error::Result;
use crate::grid::{Cell, Grid, Position};
use crate::pathfinding::{self, format_path, Path, SearchOptions};
use crate::scheduler::StepTimer;
use crate::sensor::{self, SensorReading};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Simulation execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SimState {
    /// Not advancing
    #[default]
    Idle,
    /// Advancing one waypoint per step delay
    Running,
    /// Halted after consuming the last waypoint
    Finished,
}

impl SimState {
    pub fn is_running(&self) -> bool {
        matches!(self, SimState::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SimState::Idle => "IDLE",
            SimState::Running => "RUNNING",
            SimState::Finished => "FINISHED",
        }
    }
}

/// Derived statistics, refreshed on every replan and every step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Node count of the current path
    pub path_length: usize,
    /// Obstacles in the latest sensor reading
    pub obstacles_detected: usize,
    /// Simulated time spent stepping
    pub elapsed_ms: u64,
    /// Manhattan distance start->target over path length, as a rounded
    /// percentage; 0 when there is no path
    pub efficiency: u32,
    /// Nodes expanded by the last search
    pub nodes_expanded: usize,
    /// Searches run since the session started or was reset
    pub replans: u64,
}

impl SimulationStats {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed_ms as f64 / 1000.0
    }
}

/// Efficiency of `path` towards `target` as a rounded percentage
pub fn path_efficiency(path: &Path, target: Position) -> u32 {
    match path.first() {
        Some(start) => {
            let direct = start.manhattan(&target) as f64;
            (direct / path.len() as f64 * 100.0).round() as u32
        }
        None => 0,
    }
}

pub struct Session {
    config: Config,
    grid: Grid,
    agent: Agent,
    target: Position,
    path: Path,
    reading: SensorReading,
    stats: SimulationStats,
    state: SimState,
    sensor_range: i32,
    step_delay_ms: u64,
    search: SearchOptions,
    timer: StepTimer,
    clock_ms: u64,
}

impl Session {
    /// Build a session from configuration: configured grid and obstacles,
    /// agent and target at their defaults, path already computed
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let grid = config.build_grid();
        let start = config.agent.start();
        let target = config.agent.target();
        Self::with_grid(grid, start, target, config)
    }

    /// Build a session around an existing grid
    pub fn with_grid(grid: Grid, start: Position, target: Position, config: Config) -> Result<Self> {
        grid.check_bounds(start)?;
        grid.check_bounds(target)?;
        let sensor_range = config.sensor.check(config.sensor.range)?;
        let step_delay_ms = config.playback.check(config.playback.step_delay_ms)?;

        let mut session = Session {
            search: config.search,
            config,
            grid,
            agent: Agent::new(start),
            target,
            path: Vec::new(),
            reading: SensorReading::default(),
            stats: SimulationStats::default(),
            state: SimState::Idle,
            sensor_range,
            step_delay_ms,
            timer: StepTimer::new(),
            clock_ms: 0,
        };
        session.replan();
        info!(
            "Session ready: {}x{} grid, agent ({},{}), target ({},{}), path {} nodes",
            session.grid.width(),
            session.grid.height(),
            start.x,
            start.y,
            target.x,
            target.y,
            session.path.len()
        );
        Ok(session)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn agent_position(&self) -> Position {
        self.agent.position
    }

    pub fn target(&self) -> Position {
        self.target
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn stats(&self) -> SimulationStats {
        self.stats
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn sensor_range(&self) -> i32 {
        self.sensor_range
    }

    pub fn step_delay_ms(&self) -> u64 {
        self.step_delay_ms
    }

    pub fn search_options(&self) -> SearchOptions {
        self.search
    }

    /// Current simulated time
    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn is_step_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Next waypoint the agent will move to, if any
    pub fn next_waypoint(&self) -> Option<Position> {
        self.agent.next_waypoint(&self.path)
    }

    /// Move the agent. Out-of-bounds positions are rejected with no state change.
    pub fn set_agent_position(&mut self, pos: Position) -> Result<()> {
        if let Err(e) = self.grid.check_bounds(pos) {
            warn!("Rejected agent move: {}", e);
            return Err(e);
        }
        self.agent.reposition(pos);
        self.invalidate();
        Ok(())
    }

    /// Move the target. Out-of-bounds positions are rejected with no state change.
    pub fn set_target_position(&mut self, pos: Position) -> Result<()> {
        if let Err(e) = self.grid.check_bounds(pos) {
            warn!("Rejected target move: {}", e);
            return Err(e);
        }
        self.target = pos;
        self.invalidate();
        Ok(())
    }

    /// Flip a cell between empty and obstacle and replan.
    /// The agent stays put even if its own cell becomes an obstacle.
    pub fn toggle_obstacle(&mut self, pos: Position) -> Result<Cell> {
        let cell = match self.grid.toggle(pos) {
            Ok(cell) => cell,
            Err(e) => {
                warn!("Rejected obstacle toggle: {}", e);
                return Err(e);
            }
        };
        self.invalidate();
        Ok(cell)
    }

    pub fn set_sensor_range(&mut self, range: i32) -> Result<()> {
        self.sensor_range = self.config.sensor.check(range).map_err(|e| {
            warn!("Rejected sensor range: {}", e);
            e
        })?;
        debug!("Sensor range set to {}", range);
        Ok(())
    }

    /// Change the step delay. A pending step is rescheduled with the new delay.
    pub fn set_step_delay(&mut self, delay_ms: u64) -> Result<()> {
        self.step_delay_ms = self.config.playback.check(delay_ms).map_err(|e| {
            warn!("Rejected step delay: {}", e);
            e
        })?;
        if self.timer.cancel() {
            self.timer.schedule(self.clock_ms, self.step_delay_ms);
        }
        debug!("Step delay set to {}ms", delay_ms);
        Ok(())
    }

    /// Begin stepping. Returns false (and does not run) when there is no
    /// path or nothing left to consume.
    pub fn start(&mut self) -> bool {
        if self.path.is_empty() {
            warn!("Cannot start: no path to target");
            return false;
        }
        if self.agent.remaining(&self.path) == 0 {
            debug!("Nothing left to traverse, marking finished");
            self.timer.cancel();
            self.state = SimState::Finished;
            return false;
        }
        if self.state.is_running() {
            return true;
        }
        self.state = SimState::Running;
        self.timer.schedule(self.clock_ms, self.step_delay_ms);
        debug!("Simulation {} at {}ms", self.state.as_str(), self.clock_ms);
        true
    }

    pub fn pause(&mut self) {
        self.timer.cancel();
        if self.state.is_running() {
            self.state = SimState::Idle;
            debug!("Simulation paused at {}ms", self.clock_ms);
        }
    }

    /// Run the search again without changing anything else
    pub fn recalculate_path(&mut self) {
        self.invalidate();
    }

    /// Stop, restore the default agent and target, clear the sensor reading
    /// and statistics, then replan from the defaults
    pub fn reset(&mut self) {
        self.timer.cancel();
        self.state = SimState::Idle;
        self.agent = Agent::new(self.config.agent.start());
        self.target = self.config.agent.target();
        self.reading = SensorReading::default();
        self.stats = SimulationStats::default();
        self.path.clear();
        self.replan();
        info!("Session reset");
    }

    /// Cancel any pending step and stop. Nothing fires after this.
    pub fn shutdown(&mut self) {
        self.timer.cancel();
        self.state = SimState::Idle;
    }

    /// Move the simulated clock forward, firing every step that falls due.
    /// Returns the number of steps taken.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        let until = self.clock_ms.saturating_add(elapsed_ms);
        let mut steps = 0;

        while let Some(pending) = self.timer.pending() {
            if pending.due_ms > until {
                break;
            }
            self.clock_ms = pending.due_ms;
            if self.timer.take_due(self.clock_ms).is_some() && self.step() {
                steps += 1;
            }
        }

        self.clock_ms = until;
        steps
    }

    /// Dispatch a recorded command
    pub fn apply(&mut self, command: &Command) -> Result<()> {
        match *command {
            Command::SetAgent { x, y } => self.set_agent_position(Position::new(x, y)),
            Command::SetTarget { x, y } => self.set_target_position(Position::new(x, y)),
            Command::ToggleObstacle { x, y } => self.toggle_obstacle(Position::new(x, y)).map(|_| ()),
            Command::SetSensorRange { range } => self.set_sensor_range(range),
            Command::SetStepDelay { delay_ms } => self.set_step_delay(delay_ms),
            Command::Start => {
                self.start();
                Ok(())
            }
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::RecalculatePath => {
                self.recalculate_path();
                Ok(())
            }
            Command::Reset => {
                self.reset();
                Ok(())
            }
            Command::Advance { elapsed_ms } => {
                self.advance(elapsed_ms);
                Ok(())
            }
        }
    }

    /// One timed step: move to the next waypoint, sense, update statistics,
    /// then schedule the following step or halt
    fn step(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }

        let Some(position) = self.agent.advance(&self.path) else {
            self.state = SimState::Finished;
            return false;
        };

        self.reading = sensor::detect(&self.grid, position, self.sensor_range);
        self.stats.obstacles_detected = self.reading.len();
        self.stats.elapsed_ms += self.step_delay_ms;

        trace!(
            "[step] t={}ms agent=({},{}) detected={} remaining={}",
            self.clock_ms,
            position.x,
            position.y,
            self.reading.len(),
            self.agent.remaining(&self.path)
        );

        if self.agent.remaining(&self.path) == 0 {
            self.state = SimState::Finished;
            debug!("Simulation finished at ({},{})", position.x, position.y);
        } else {
            self.timer.schedule(self.clock_ms, self.step_delay_ms);
        }
        true
    }

    /// Cancel the pending step, replan, and keep running against the new path
    fn invalidate(&mut self) {
        self.timer.cancel();
        self.replan();

        if self.state.is_running() {
            if self.path.is_empty() {
                debug!("No route after replan, stopping");
                self.state = SimState::Idle;
            } else if self.agent.remaining(&self.path) == 0 {
                self.state = SimState::Finished;
            } else {
                self.timer.schedule(self.clock_ms, self.step_delay_ms);
            }
        }
    }

    fn replan(&mut self) {
        let result = pathfinding::search(&self.grid, self.agent.position, self.target, &self.search);
        self.path = result.path;
        self.agent.progress = 0;

        self.stats.path_length = self.path.len();
        self.stats.efficiency = path_efficiency(&self.path, self.target);
        self.stats.nodes_expanded = result.nodes_expanded;
        self.stats.replans += 1;

        debug!(
            "Replanned (grid rev {}): {} nodes, efficiency {}%",
            self.grid.revision(),
            self.path.len(),
            self.stats.efficiency
        );
        trace!("Path: {}", format_path(&self.path));
    }
}
