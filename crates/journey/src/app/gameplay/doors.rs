use engine::{resolve_relative_key, AssetKeyError, Rect, Vec2};

/// Trigger area leading to another room.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Door {
    pub(crate) rect: Rect,
    /// Map file, relative to the current map's directory.
    pub(crate) target: String,
    pub(crate) spawn: Option<Vec2>,
}

impl Door {
    /// Asset key of the target map.
    pub(crate) fn target_key(&self, current_map_key: &str) -> Result<String, AssetKeyError> {
        let base_dir = current_map_key
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("");
        resolve_relative_key(base_dir, &self.target)
    }
}

/// First door whose area overlaps `hitbox`.
pub(crate) fn door_at<'a>(doors: &'a [Door], hitbox: &Rect) -> Option<&'a Door> {
    doors.iter().find(|door| door.rect.intersects(hitbox))
}

/// Edge detector for "player started touching a door".
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DoorProximity {
    touching: bool,
}

impl DoorProximity {
    /// Returns true only on the tick contact begins.
    pub(crate) fn update(&mut self, touching: bool) -> bool {
        let entered = touching && !self.touching;
        self.touching = touching;
        entered
    }

    pub(crate) fn reset(&mut self, touching: bool) {
        self.touching = touching;
    }
}
