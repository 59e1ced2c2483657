use crate::error::{NavError, Result};
use serde::{Deserialize, Serialize};

/// A cell coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    /// Manhattan distance |dx| + |dy|
    pub fn manhattan(&self, other: &Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Chebyshev distance max(|dx|, |dy|), the step count under 8-directional movement
    pub fn chebyshev(&self, other: &Position) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// Calculate Euclidean distance squared (avoid sqrt for comparisons)
    pub fn distance_squared(&self, other: &Position) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx * dx + dy * dy
    }

    /// Calculate Euclidean distance
    pub fn distance(&self, other: &Position) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }
}

/// Stored classification of a grid cell.
/// Start, target and path markers are derived at draw time and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Obstacle,
}

impl Cell {
    pub fn toggled(self) -> Cell {
        match self {
            Cell::Empty => Cell::Obstacle,
            Cell::Obstacle => Cell::Empty,
        }
    }
}

/// Fixed-size grid of cells.
///
/// Dimensions are set at construction and never change. Cells are only
/// reachable through the accessors below, so every mutation bumps
/// `revision` and is visible to the next search.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<Cell>,
    /// Revision number - incremented whenever a cell changes
    revision: u64,
}

impl Grid {
    /// Create a new grid with all cells empty
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Grid {
            width,
            height,
            cells: vec![Cell::Empty; width as usize * height as usize],
            revision: 0,
        }
    }

    /// Create a grid with the given cells set to obstacles.
    /// Out-of-bounds positions are skipped.
    pub fn with_obstacles(width: i32, height: i32, obstacles: &[Position]) -> Self {
        let mut grid = Self::new(width, height);
        for &pos in obstacles {
            if grid.in_bounds(pos) {
                let idx = grid.index(pos);
                grid.cells[idx] = Cell::Obstacle;
            }
        }
        grid
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Get current grid revision number
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    /// Fails with `OutOfBounds` unless `pos` lies on the grid
    pub fn check_bounds(&self, pos: Position) -> Result<()> {
        if self.in_bounds(pos) {
            Ok(())
        } else {
            Err(NavError::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn index(&self, pos: Position) -> usize {
        pos.x as usize + pos.y as usize * self.width as usize
    }

    /// Get the cell at `pos`
    pub fn cell_at(&self, pos: Position) -> Result<Cell> {
        self.check_bounds(pos)?;
        Ok(self.cells[self.index(pos)])
    }

    /// Check if a cell is an obstacle. Out of bounds is treated as blocked.
    pub fn is_obstacle(&self, pos: Position) -> bool {
        match self.cell_at(pos) {
            Ok(cell) => cell == Cell::Obstacle,
            Err(_) => true,
        }
    }

    /// Set a single cell. Out-of-bounds writes are rejected and leave the grid untouched.
    pub fn set_cell(&mut self, pos: Position, cell: Cell) -> Result<()> {
        self.check_bounds(pos)?;
        let idx = self.index(pos);
        if self.cells[idx] != cell {
            self.cells[idx] = cell;
            self.revision += 1;
        }
        Ok(())
    }

    /// Flip a cell between empty and obstacle, returning the new classification
    pub fn toggle(&mut self, pos: Position) -> Result<Cell> {
        let next = self.cell_at(pos)?.toggled();
        self.set_cell(pos, next)?;
        Ok(next)
    }

    /// Fill a rectangle with obstacles, clipped to the grid
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32) {
        for cy in y.max(0)..y.saturating_add(height).min(self.height) {
            for cx in x.max(0)..x.saturating_add(width).min(self.width) {
                // Clipped above, cannot fail
                let _ = self.set_cell(Position::new(cx, cy), Cell::Obstacle);
            }
        }
    }

    /// All obstacle positions in row-major order
    pub fn obstacles(&self) -> Vec<Position> {
        let mut result = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let pos = Position::new(x, y);
                if self.cells[self.index(pos)] == Cell::Obstacle {
                    result.push(pos);
                }
            }
        }
        result
    }

    /// Render the grid as text: '■' for obstacles, '□' for empty cells
    pub fn to_layout_string(&self) -> String {
        let mut result = String::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let symbol = match self.cells[self.index(Position::new(x, y))] {
                    Cell::Obstacle => '■',
                    Cell::Empty => '□',
                };
                result.push(symbol);
            }
            result.push('\n');
        }
        result
    }

    /// Parse a text layout.
    ///
    /// Format:
    /// - '■' or '#': obstacle
    /// - '□' or '.': empty
    ///
    /// Blank lines are ignored; every row must have the same width.
    pub fn from_layout(text: &str) -> Result<Grid> {
        let lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end())
            .filter(|line| !line.is_empty())
            .collect();

        if lines.is_empty() {
            return Err(NavError::Layout("no grid rows found".to_string()));
        }

        let width = lines[0].chars().count() as i32;
        let height = lines.len() as i32;
        let mut grid = Grid::new(width, height);

        for (y, line) in lines.iter().enumerate() {
            let row_width = line.chars().count() as i32;
            if row_width != width {
                return Err(NavError::Layout(format!(
                    "row {} has width {}, expected {}",
                    y, row_width, width
                )));
            }
            for (x, ch) in line.chars().enumerate() {
                let pos = Position::new(x as i32, y as i32);
                match ch {
                    '■' | '#' => grid.set_cell(pos, Cell::Obstacle)?,
                    '□' | '.' => {}
                    other => {
                        return Err(NavError::Layout(format!(
                            "unexpected character '{}' at ({},{})",
                            other, x, y
                        )));
                    }
                }
            }
        }

        // A freshly parsed grid starts at revision 0
        grid.revision = 0;
        Ok(grid)
    }
}
