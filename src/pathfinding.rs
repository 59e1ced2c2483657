//! A* search over the grid.
//!
//! - 8-directional movement, every step costs 1
//! - Manhattan heuristic by default (not admissible for diagonal moves, so a
//!   route can come out longer than the true shortest one on some layouts)
//! - Diagonal steps may cut between two obstacle corners unless
//!   `prevent_corner_cutting` is set
//!
//! Tie-break: lowest `f`, then lowest `h`, then earliest insertion.

use crate::grid::{Grid, Position};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Ordered cells from start to target. Empty when the target is unreachable.
pub type Path = Vec<Position>;

/// Neighbour order: N, E, S, W, NE, SE, SW, NW
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Remaining-cost estimate used to order the open set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Heuristic {
    /// |dx| + |dy|
    #[default]
    Manhattan,
    /// max(|dx|, |dy|), admissible for unit-cost diagonal moves
    Chebyshev,
}

impl Heuristic {
    pub fn estimate(&self, from: &Position, to: &Position) -> i32 {
        match self {
            Heuristic::Manhattan => from.manhattan(to),
            Heuristic::Chebyshev => from.chebyshev(to),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub heuristic: Heuristic,
    /// Refuse a diagonal step when either orthogonal flank is an obstacle
    #[serde(default)]
    pub prevent_corner_cutting: bool,
}

/// Outcome of a single search run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    pub path: Path,
    /// Nodes moved to the closed set before the search ended
    pub nodes_expanded: usize,
}

impl SearchResult {
    pub fn found(&self) -> bool {
        !self.path.is_empty()
    }
}

/// Search-time record, stored in an arena and linked to its predecessor by index
#[derive(Debug, Clone)]
struct SearchNode {
    position: Position,
    g: i32,
    h: i32,
    f: i32,
    parent: Option<usize>,
}

/// Open-set entry. Entries go stale when their node is improved or closed;
/// stale entries are skipped when popped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenEntry {
    f: i32,
    h: i32,
    seq: u64,
    node: usize,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Find a path with the default options (Manhattan heuristic, corner cutting allowed)
pub fn find_path(grid: &Grid, start: Position, target: Position) -> Path {
    search(grid, start, target, &SearchOptions::default()).path
}

/// Run A* from `start` to `target`.
///
/// The start cell is never checked for obstacles, so a search can begin on
/// an obstacle; its neighbours are filtered as usual.
pub fn search(grid: &Grid, start: Position, target: Position, options: &SearchOptions) -> SearchResult {
    trace!(
        "[search] start=({},{}) target=({},{}) heuristic={:?}",
        start.x, start.y, target.x, target.y, options.heuristic
    );

    if !grid.in_bounds(start) || !grid.in_bounds(target) {
        debug!("[search] start or target outside grid, no path");
        return SearchResult::default();
    }

    let mut nodes: Vec<SearchNode> = Vec::new();
    let mut open: BinaryHeap<OpenEntry> = BinaryHeap::new();
    let mut open_index: HashMap<Position, usize> = HashMap::new();
    let mut closed: HashSet<Position> = HashSet::new();
    let mut seq: u64 = 0;

    let h = options.heuristic.estimate(&start, &target);
    nodes.push(SearchNode {
        position: start,
        g: 0,
        h,
        f: h,
        parent: None,
    });
    open_index.insert(start, 0);
    open.push(OpenEntry { f: h, h, seq, node: 0 });

    while let Some(entry) = open.pop() {
        let current = nodes[entry.node].clone();
        if closed.contains(&current.position) || entry.f != current.f {
            continue;
        }

        if current.position == target {
            let path = reconstruct(&nodes, entry.node);
            debug!(
                "[search] found path: {} nodes, {} expanded",
                path.len(),
                closed.len()
            );
            return SearchResult {
                path,
                nodes_expanded: closed.len(),
            };
        }

        open_index.remove(&current.position);
        closed.insert(current.position);

        for neighbor in neighbors(grid, current.position, options.prevent_corner_cutting) {
            if closed.contains(&neighbor) {
                continue;
            }

            let g = current.g + 1;
            match open_index.get(&neighbor) {
                Some(&idx) => {
                    let existing = &mut nodes[idx];
                    if g < existing.g {
                        existing.g = g;
                        existing.f = g + existing.h;
                        existing.parent = Some(entry.node);
                        seq += 1;
                        open.push(OpenEntry {
                            f: existing.f,
                            h: existing.h,
                            seq,
                            node: idx,
                        });
                    }
                }
                None => {
                    let h = options.heuristic.estimate(&neighbor, &target);
                    let idx = nodes.len();
                    nodes.push(SearchNode {
                        position: neighbor,
                        g,
                        h,
                        f: g + h,
                        parent: Some(entry.node),
                    });
                    open_index.insert(neighbor, idx);
                    seq += 1;
                    open.push(OpenEntry { f: g + h, h, seq, node: idx });
                }
            }
        }
    }

    debug!("[search] no path after expanding {} nodes", closed.len());
    SearchResult {
        path: Vec::new(),
        nodes_expanded: closed.len(),
    }
}

/// In-bounds, non-obstacle cells adjacent to `pos`
fn neighbors(grid: &Grid, pos: Position, prevent_corner_cutting: bool) -> Vec<Position> {
    let mut result = Vec::with_capacity(DIRECTIONS.len());
    for (dx, dy) in DIRECTIONS {
        let next = Position::new(pos.x + dx, pos.y + dy);
        if grid.is_obstacle(next) {
            continue;
        }
        if prevent_corner_cutting
            && dx != 0
            && dy != 0
            && (grid.is_obstacle(Position::new(pos.x + dx, pos.y))
                || grid.is_obstacle(Position::new(pos.x, pos.y + dy)))
        {
            continue;
        }
        result.push(next);
    }
    result
}

/// Follow predecessor links back to the start and reverse
fn reconstruct(nodes: &[SearchNode], last: usize) -> Path {
    let mut path = Vec::new();
    let mut cursor = Some(last);
    while let Some(idx) = cursor {
        path.push(nodes[idx].position);
        cursor = nodes[idx].parent;
    }
    path.reverse();
    path
}

/// Format path for display
pub fn format_path(path: &[Position]) -> String {
    if path.is_empty() {
        return "No path".to_string();
    }

    path.iter()
        .map(|pos| format!("({},{})", pos.x, pos.y))
        .collect::<Vec<_>>()
        .join(" -> ")
}
