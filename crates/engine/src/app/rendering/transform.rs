use crate::app::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn half_size(&self) -> Vec2 {
        Vec2::new(self.width as f32 * 0.5, self.height as f32 * 0.5)
    }
}

/// Translation that puts `target` at the center of the viewport.
///
/// Recomputed from the current viewport on every frame, so a resize recenters
/// the target immediately.
pub fn camera_offset(target: Vec2, viewport: Viewport) -> Vec2 {
    viewport.half_size() - target
}

/// Background layers scroll at `speed` times the camera offset. Speeds
/// outside `[0, 1]` are clamped.
pub fn parallax_offset(offset: Vec2, speed: f32) -> Vec2 {
    let speed = if speed.is_finite() {
        speed.clamp(0.0, 1.0)
    } else {
        0.0
    };
    offset * speed
}

pub fn world_to_screen(world: Vec2, offset: Vec2) -> (i32, i32) {
    let screen = world + offset;
    (screen.x.round() as i32, screen.y.round() as i32)
}
