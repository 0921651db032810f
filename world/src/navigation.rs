//! Breadth-first path planner over the discretised arena.

use std::collections::VecDeque;

use roomba_core::{ArenaGeometry, Direction, Position};

const UNVISITED: u32 = u32::MAX;

/// Stateless shortest-path planner over a square grid derived from the arena.
///
/// Positions are snapped to the nearest grid node by rounding each coordinate to
/// the closest multiple of the grid step. The search walks 4-connected neighbours
/// in [`Direction::EXPANSION_ORDER`] (up, down, left, right); that order decides
/// which of several equally short paths is returned. A neighbour is admissible
/// when a robot-sized circle centred on it satisfies [`ArenaGeometry::admits`].
/// The start node itself is never tested, so a robot resting on an awkward
/// position can still leave it.
#[derive(Clone, Debug)]
pub struct PathPlanner {
    geometry: ArenaGeometry,
    grid: NodeGrid,
    radius: f32,
}

impl PathPlanner {
    /// Creates a planner for a robot of `radius` moving on a grid of pitch `step`.
    #[must_use]
    pub fn new(geometry: ArenaGeometry, step: f32, radius: f32) -> Self {
        let grid = NodeGrid::covering(&geometry, step);
        Self {
            geometry,
            grid,
            radius,
        }
    }

    /// Snaps a position to the nearest grid node.
    #[must_use]
    pub fn snap(&self, position: Position) -> Position {
        let step = self.grid.step;
        Position::new(
            (position.x() / step).round() * step,
            (position.y() / step).round() * step,
        )
    }

    /// Computes the shortest grid path from `start` to `goal`, both inclusive.
    ///
    /// Returns an empty path when the goal cannot be reached. A single-node path
    /// means both positions snap to the same node.
    #[must_use]
    pub fn plan(&self, start: Position, goal: Position) -> Vec<Position> {
        let (Some(start), Some(goal)) = (self.grid.node_at(start), self.grid.node_at(goal)) else {
            return Vec::new();
        };

        if start == goal {
            return vec![self.grid.position(start)];
        }

        let Some(start_index) = self.grid.index(start) else {
            return Vec::new();
        };
        let mut parents = vec![UNVISITED; self.grid.len()];
        parents[start_index] = start_index as u32;

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            if node == goal {
                return self.trace(&parents, start, goal);
            }

            let Some(node_index) = self.grid.index(node) else {
                continue;
            };

            for direction in Direction::EXPANSION_ORDER {
                let neighbor = node.neighbor(direction);
                let Some(neighbor_index) = self.grid.index(neighbor) else {
                    continue;
                };

                if parents[neighbor_index] != UNVISITED {
                    continue;
                }

                if !self
                    .geometry
                    .admits(self.grid.position(neighbor), self.radius)
                {
                    continue;
                }

                parents[neighbor_index] = node_index as u32;
                queue.push_back(neighbor);
            }
        }

        Vec::new()
    }

    fn trace(&self, parents: &[u32], start: GridNode, goal: GridNode) -> Vec<Position> {
        let mut path = vec![self.grid.position(goal)];
        let mut current = goal;

        while current != start {
            let Some(index) = self.grid.index(current) else {
                return Vec::new();
            };
            let Some(parent) = self.grid.node_from_index(parents[index] as usize) else {
                return Vec::new();
            };
            path.push(self.grid.position(parent));
            current = parent;
        }

        path.reverse();
        path
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct GridNode {
    column: i32,
    row: i32,
}

impl GridNode {
    fn neighbor(self, direction: Direction) -> Self {
        match direction {
            Direction::Up => Self {
                column: self.column,
                row: self.row - 1,
            },
            Direction::Down => Self {
                column: self.column,
                row: self.row + 1,
            },
            Direction::Left => Self {
                column: self.column - 1,
                row: self.row,
            },
            Direction::Right => Self {
                column: self.column + 1,
                row: self.row,
            },
        }
    }
}

/// Dense node lattice covering the boundary, one node per multiple of the step.
#[derive(Clone, Debug)]
struct NodeGrid {
    step: f32,
    first_column: i32,
    first_row: i32,
    columns: u32,
    rows: u32,
}

impl NodeGrid {
    fn covering(geometry: &ArenaGeometry, step: f32) -> Self {
        let step = if step.is_finite() && step > 0.0 { step } else { 1.0 };
        let boundary = geometry.boundary();
        let first_column = (boundary.min_x() / step).floor() as i32;
        let last_column = (boundary.max_x() / step).ceil() as i32;
        let first_row = (boundary.min_y() / step).floor() as i32;
        let last_row = (boundary.max_y() / step).ceil() as i32;

        Self {
            step,
            first_column,
            first_row,
            columns: u32::try_from(last_column - first_column + 1).unwrap_or(0),
            rows: u32::try_from(last_row - first_row + 1).unwrap_or(0),
        }
    }

    fn len(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    fn node_at(&self, position: Position) -> Option<GridNode> {
        let column = (position.x() / self.step).round();
        let row = (position.y() / self.step).round();
        if !column.is_finite() || !row.is_finite() {
            return None;
        }

        let node = GridNode {
            column: column as i32,
            row: row as i32,
        };
        self.index(node).map(|_| node)
    }

    fn position(&self, node: GridNode) -> Position {
        Position::new(
            node.column as f32 * self.step,
            node.row as f32 * self.step,
        )
    }

    fn index(&self, node: GridNode) -> Option<usize> {
        let column = u32::try_from(node.column - self.first_column).ok()?;
        let row = u32::try_from(node.row - self.first_row).ok()?;
        if column >= self.columns || row >= self.rows {
            return None;
        }

        let width = usize::try_from(self.columns).ok()?;
        let row = usize::try_from(row).ok()?;
        let column = usize::try_from(column).ok()?;
        row.checked_mul(width)?.checked_add(column)
    }

    fn node_from_index(&self, index: usize) -> Option<GridNode> {
        let width = usize::try_from(self.columns).ok()?;
        if width == 0 || index >= self.len() {
            return None;
        }

        Some(GridNode {
            column: self.first_column + i32::try_from(index % width).ok()?,
            row: self.first_row + i32::try_from(index / width).ok()?,
        })
    }
}
