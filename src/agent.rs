use crate::grid::Position;
use crate::pathfinding::Path;

/// The navigating entity: where it stands and how far along the current path it is
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Agent {
    pub position: Position,

    /// Steps taken along the current path. Reset to 0 on every replan;
    /// the next waypoint is `path[progress + 1]`.
    pub progress: usize,
}

impl Agent {
    pub fn new(position: Position) -> Self {
        Agent {
            position,
            progress: 0,
        }
    }

    /// Place the agent somewhere new; the old progress no longer applies
    pub fn reposition(&mut self, position: Position) {
        self.position = position;
        self.progress = 0;
    }

    /// Next waypoint on `path`, or None when the path is exhausted
    pub fn next_waypoint(&self, path: &Path) -> Option<Position> {
        path.get(self.progress + 1).copied()
    }

    /// Move onto the next waypoint. Returns the new position, or None if
    /// there was nothing left to consume.
    pub fn advance(&mut self, path: &Path) -> Option<Position> {
        let next = self.next_waypoint(path)?;
        self.position = next;
        self.progress += 1;
        Some(next)
    }

    /// Waypoints still ahead of the agent
    pub fn remaining(&self, path: &Path) -> usize {
        path.len().saturating_sub(self.progress + 1)
    }
}
