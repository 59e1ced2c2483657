use crate::error::Result;
use crate::simulation::Session;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

/// External commands accepted by a session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Move the agent to (x, y)
    SetAgent { x: i32, y: i32 },
    /// Move the target to (x, y)
    SetTarget { x: i32, y: i32 },
    /// Toggle the cell at (x, y)
    ToggleObstacle { x: i32, y: i32 },
    SetSensorRange { range: i32 },
    SetStepDelay { delay_ms: u64 },
    Start,
    Pause,
    RecalculatePath,
    Reset,
    /// Let simulated time pass
    Advance { elapsed_ms: u64 },
}

impl Command {
    /// Short name used for grouping in summaries
    pub fn kind(&self) -> &'static str {
        match self {
            Command::SetAgent { .. } => "set_agent",
            Command::SetTarget { .. } => "set_target",
            Command::ToggleObstacle { .. } => "toggle_obstacle",
            Command::SetSensorRange { .. } => "set_sensor_range",
            Command::SetStepDelay { .. } => "set_step_delay",
            Command::Start => "start",
            Command::Pause => "pause",
            Command::RecalculatePath => "recalculate_path",
            Command::Reset => "reset",
            Command::Advance { .. } => "advance",
        }
    }
}

/// Whether the session accepted the command
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Applied,
    Rejected { reason: String },
}

/// Logged command with timestamps and outcome
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedCommand {
    /// Wall-clock milliseconds since the log was created
    pub timestamp_ms: u64,
    /// Session clock when the command was applied
    pub sim_clock_ms: u64,
    pub command: Command,
    pub outcome: Outcome,
}

/// Command recorder
pub struct ActionLog {
    start_time: Instant,
    entries: Vec<LoggedCommand>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            entries: Vec::new(),
        }
    }

    /// Apply `command` to `session` and record what happened.
    /// Consecutive applied `Advance` commands are merged into one entry.
    pub fn execute(&mut self, session: &mut Session, command: Command) -> Result<()> {
        let result = session.apply(&command);
        if let Command::Advance { elapsed_ms } = command {
            if let (true, Some(LoggedCommand {
                sim_clock_ms,
                command: Command::Advance { elapsed_ms: total },
                outcome: Outcome::Applied,
                ..
            })) = (result.is_ok(), self.entries.last_mut())
            {
                *total += elapsed_ms;
                *sim_clock_ms = session.clock_ms();
                return result;
            }
        }
        let outcome = match &result {
            Ok(()) => Outcome::Applied,
            Err(e) => Outcome::Rejected {
                reason: e.to_string(),
            },
        };
        self.entries.push(LoggedCommand {
            timestamp_ms: self.start_time.elapsed().as_millis() as u64,
            sim_clock_ms: session.clock_ms(),
            command,
            outcome,
        });
        result
    }

    pub fn entries(&self) -> &[LoggedCommand] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Save log to JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved log
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<LoggedCommand>> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Re-apply logged commands to `session` in order.
    /// Rejections are expected to repeat, so they are not errors here.
    /// Returns how many commands were applied.
    pub fn replay(entries: &[LoggedCommand], session: &mut Session) -> usize {
        entries
            .iter()
            .filter(|entry| session.apply(&entry.command).is_ok())
            .count()
    }

    /// Write the log through the `log` facade
    pub fn print(&self) {
        info!("=== Action Log ({} commands) ===", self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            let status = match &entry.outcome {
                Outcome::Applied => "OK ".to_string(),
                Outcome::Rejected { reason } => format!("ERR ({})", reason),
            };
            info!(
                "[{:6}ms | sim {:6}ms] #{:3} {} {:?}",
                entry.timestamp_ms,
                entry.sim_clock_ms,
                i + 1,
                status,
                entry.command
            );
        }
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut per_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut rejected = 0;

        for entry in &self.entries {
            *per_kind.entry(entry.command.kind()).or_insert(0) += 1;
            if matches!(entry.outcome, Outcome::Rejected { .. }) {
                rejected += 1;
            }
        }

        let duration = self.entries.last().map(|e| e.timestamp_ms).unwrap_or(0);
        let breakdown = per_kind
            .iter()
            .map(|(kind, count)| format!("{} {}", count, kind))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "Session Duration: {}ms\n\
             Total Commands: {} ({} rejected)\n\
             Breakdown: {}",
            duration,
            self.entries.len(),
            rejected,
            if breakdown.is_empty() { "none".to_string() } else { breakdown }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::grid::{Grid, Position};

    fn session() -> Session {
        Session::with_grid(
            Grid::new(6, 6),
            Position::new(0, 0),
            Position::new(5, 5),
            Config::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_execute_records_outcome() {
        let mut session = session();
        let mut log = ActionLog::new();

        log.execute(&mut session, Command::ToggleObstacle { x: 2, y: 2 }).unwrap();
        assert!(log.execute(&mut session, Command::SetTarget { x: 9, y: 9 }).is_err());

        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[0].outcome, Outcome::Applied);
        assert!(matches!(log.entries()[1].outcome, Outcome::Rejected { .. }));
        assert_eq!(session.target(), Position::new(5, 5));

        let summary = log.summary();
        assert!(summary.contains("Total Commands: 2 (1 rejected)"));
        assert!(summary.contains("1 set_target"));
        assert!(summary.contains("1 toggle_obstacle"));
    }

    #[test]
    fn test_consecutive_advances_share_an_entry() {
        let mut session = session();
        let mut log = ActionLog::new();

        log.execute(&mut session, Command::Start).unwrap();
        for _ in 0..60 {
            log.execute(&mut session, Command::Advance { elapsed_ms: 16 }).unwrap();
        }
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].command, Command::Advance { elapsed_ms: 960 });
        assert_eq!(log.entries()[1].sim_clock_ms, 960);

        log.execute(&mut session, Command::Pause).unwrap();
        log.execute(&mut session, Command::Advance { elapsed_ms: 5 }).unwrap();
        assert_eq!(log.len(), 4);

        let mut replayed = self::session();
        ActionLog::replay(log.entries(), &mut replayed);
        assert_eq!(replayed.agent_position(), session.agent_position());
        assert_eq!(replayed.stats(), session.stats());
        assert_eq!(replayed.clock_ms(), session.clock_ms());
    }

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_string(&Command::SetAgent { x: 1, y: 2 }).unwrap();
        assert_eq!(json, r#"{"SetAgent":{"x":1,"y":2}}"#);
        let back: Command = serde_json::from_str(r#""Start""#).unwrap();
        assert_eq!(back, Command::Start);
    }

    #[test]
    fn test_replay_reproduces_session() {
        let mut original = session();
        let mut log = ActionLog::new();
        for command in [
            Command::ToggleObstacle { x: 1, y: 1 },
            Command::SetTarget { x: 4, y: 0 },
            Command::SetSensorRange { range: 0 },
            Command::Start,
            Command::Advance { elapsed_ms: 1_000 },
        ] {
            let _ = log.execute(&mut original, command);
        }

        let mut replayed = session();
        assert_eq!(ActionLog::replay(log.entries(), &mut replayed), 4);
        assert_eq!(replayed.agent_position(), original.agent_position());
        assert_eq!(replayed.path(), original.path());
        assert_eq!(replayed.stats(), original.stats());
        assert_eq!(replayed.grid(), original.grid());
    }
}
