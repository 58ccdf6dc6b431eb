use std::collections::{HashSet, VecDeque};

use engine::{Rect, Vec2};

use super::TILE_SIZE;

/// Neighbour order is part of the result: visitation order is deterministic.
const NEIGHBOURS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TileCoord {
    pub(crate) col: i32,
    pub(crate) row: i32,
}

impl TileCoord {
    pub(crate) const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    pub(crate) fn from_world(position: Vec2) -> Self {
        Self {
            col: (position.x / TILE_SIZE).floor() as i32,
            row: (position.y / TILE_SIZE).floor() as i32,
        }
    }

    pub(crate) fn rect(self) -> Rect {
        Rect::new(
            self.col as f32 * TILE_SIZE,
            self.row as f32 * TILE_SIZE,
            TILE_SIZE,
            TILE_SIZE,
        )
    }
}

/// Tiles reachable from a start tile, in BFS visitation order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReachableSet {
    order: Vec<TileCoord>,
    members: HashSet<TileCoord>,
}

impl ReachableSet {
    fn starting_at(start: TileCoord) -> Self {
        Self {
            order: vec![start],
            members: HashSet::from([start]),
        }
    }

    pub(crate) fn contains(&self, tile: TileCoord) -> bool {
        self.members.contains(&tile)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn start(&self) -> TileCoord {
        self.order[0]
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = TileCoord> + '_ {
        self.order.iter().copied()
    }

    fn insert(&mut self, tile: TileCoord) -> bool {
        if self.members.insert(tile) {
            self.order.push(tile);
            true
        } else {
            false
        }
    }
}

/// 4-connected flood fill over tiles that no shape overlaps. A start tile that
/// is blocked or outside the grid yields just `{start}`.
pub(crate) fn compute(
    start: TileCoord,
    shapes: &[Rect],
    grid_width: u32,
    grid_height: u32,
) -> ReachableSet {
    let free = FreeGrid::build(shapes, grid_width, grid_height);
    let mut reachable = ReachableSet::starting_at(start);
    if !free.is_free(start) {
        return reachable;
    }

    let mut queue = VecDeque::from([start]);
    while let Some(tile) = queue.pop_front() {
        for (dc, dr) in NEIGHBOURS {
            let next = TileCoord::new(tile.col + dc, tile.row + dr);
            if free.is_free(next) && reachable.insert(next) {
                queue.push_back(next);
            }
        }
    }
    reachable
}

struct FreeGrid {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl FreeGrid {
    fn build(shapes: &[Rect], width: u32, height: u32) -> Self {
        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for col in 0..width {
                let cell = TileCoord::new(col as i32, row as i32).rect();
                cells.push(!shapes.iter().any(|shape| shape.intersects(&cell)));
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    fn is_free(&self, tile: TileCoord) -> bool {
        if tile.col < 0 || tile.row < 0 {
            return false;
        }
        let (col, row) = (tile.col as u32, tile.row as u32);
        if col >= self.width || row >= self.height {
            return false;
        }
        self.cells[row as usize * self.width as usize + col as usize]
    }
}
