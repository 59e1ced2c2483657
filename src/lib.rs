pub mod action_log;
pub mod agent;
pub mod config;
pub mod error;
pub mod grid;
pub mod pathfinding;
pub mod scheduler;
pub mod sensor;
pub mod simulation;

pub use action_log::{ActionLog, Command};
pub use agent::Agent;
pub use config::Config;
pub use error::{NavError, Result};
pub use grid::{Cell, Grid, Position};
pub use pathfinding::{find_path, search, Heuristic, Path, SearchOptions, SearchResult};
pub use sensor::{detect, Detection, SensorReading};
pub use simulation::{Session, SimState, SimulationStats};
