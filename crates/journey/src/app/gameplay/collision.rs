use engine::Rect;

/// Blocking rectangles gathered from a room's map, grouped by origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RoomGeometry {
    /// Shapes of the "Collisions" object group.
    pub(crate) collision_rects: Vec<Rect>,
    /// Named static objects from "Objects" and "Ground_objects".
    pub(crate) obstacle_rects: Vec<Rect>,
    /// Cells of tile layers flagged `solid`.
    pub(crate) solid_tile_rects: Vec<Rect>,
}

/// Immutable set of movement-blocking shapes for the current room.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct CollisionRegistry {
    shapes: Vec<Rect>,
}

impl CollisionRegistry {
    pub(crate) fn build(geometry: &RoomGeometry) -> Self {
        let shapes = geometry
            .collision_rects
            .iter()
            .chain(&geometry.obstacle_rects)
            .chain(&geometry.solid_tile_rects)
            .copied()
            .collect();
        Self { shapes }
    }

    pub(crate) fn shapes(&self) -> &[Rect] {
        &self.shapes
    }

    pub(crate) fn len(&self) -> usize {
        self.shapes.len()
    }

    #[cfg(test)]
    pub(crate) fn blocks(&self, rect: &Rect) -> bool {
        self.shapes.iter().any(|shape| shape.intersects(rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_merges_every_source() {
        let geometry = RoomGeometry {
            collision_rects: vec![Rect::new(0.0, 0.0, 10.0, 10.0)],
            obstacle_rects: vec![Rect::new(20.0, 0.0, 10.0, 10.0)],
            solid_tile_rects: vec![Rect::new(64.0, 64.0, 64.0, 64.0)],
        };

        let registry = CollisionRegistry::build(&geometry);

        assert_eq!(registry.len(), 3);
        assert!(registry.blocks(&Rect::new(70.0, 70.0, 4.0, 4.0)));
        assert!(!registry.blocks(&Rect::new(10.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn empty_room_blocks_nothing() {
        let registry = CollisionRegistry::build(&RoomGeometry::default());
        assert_eq!(registry.len(), 0);
        assert!(!registry.blocks(&Rect::new(0.0, 0.0, 1000.0, 1000.0)));
    }
}
