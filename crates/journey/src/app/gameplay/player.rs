use std::io;
use std::path::Path;
use std::rc::Rc;

use engine::{discover_png_keys, Rect, Vec2};

/// Visual sprite edge length.
pub(crate) const PLAYER_SIZE: f32 = 128.0;
/// Hitbox is the visual rect shrunk by this much on each axis (total).
pub(crate) const HITBOX_INSET: Vec2 = Vec2::new(60.0, 90.0);
/// 200 px per 600 ms.
pub(crate) const PLAYER_SPEED: f32 = 1000.0 / 3.0;
/// 5 frames per 600 ms.
pub(crate) const ANIMATION_FPS: f32 = 25.0 / 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Facing {
    Down,
    Up,
    Left,
    Right,
}

impl Facing {
    pub(crate) const ALL: [Facing; 4] = [Facing::Down, Facing::Up, Facing::Left, Facing::Right];

    pub(crate) fn dir_name(self) -> &'static str {
        match self {
            Facing::Down => "down",
            Facing::Up => "up",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Walk-cycle sprite keys per facing, discovered once and shared by every
/// player instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AnimationFrames {
    frames: [Vec<String>; 4],
}

impl AnimationFrames {
    pub(crate) fn discover(assets_dir: &Path) -> io::Result<Self> {
        let mut frames = Self::default();
        for facing in Facing::ALL {
            let dir_key = format!("images/player/{}", facing.dir_name());
            frames.frames[facing.index()] = discover_png_keys(assets_dir, &dir_key)?;
        }
        Ok(frames)
    }

    #[cfg(test)]
    pub(crate) fn with_frames(mut self, facing: Facing, keys: Vec<String>) -> Self {
        self.frames[facing.index()] = keys;
        self
    }

    pub(crate) fn frames(&self, facing: Facing) -> &[String] {
        &self.frames[facing.index()]
    }

    pub(crate) fn frame_key(&self, facing: Facing, frame_index: f32) -> Option<&str> {
        let frames = self.frames(facing);
        if frames.is_empty() {
            return None;
        }
        let index = frame_index.max(0.0) as usize % frames.len();
        Some(frames[index].as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone)]
pub(crate) struct Player {
    frames: Rc<AnimationFrames>,
    hitbox: Rect,
    visual: Rect,
    direction: Vec2,
    facing: Facing,
    frame_index: f32,
}

impl Player {
    /// New player whose visual rect is centred on `center`.
    pub(crate) fn spawn_at(center: Vec2, frames: Rc<AnimationFrames>) -> Self {
        let visual = Rect::from_center(center, PLAYER_SIZE, PLAYER_SIZE);
        Self {
            frames,
            hitbox: visual.inflate(-HITBOX_INSET.x, -HITBOX_INSET.y),
            visual,
            direction: Vec2::ZERO,
            facing: Facing::Down,
            frame_index: 0.0,
        }
    }

    pub(crate) fn hitbox(&self) -> Rect {
        self.hitbox
    }

    pub(crate) fn visual(&self) -> Rect {
        self.visual
    }

    pub(crate) fn center(&self) -> Vec2 {
        self.visual.center()
    }

    #[cfg(test)]
    pub(crate) fn direction(&self) -> Vec2 {
        self.direction
    }

    pub(crate) fn facing(&self) -> Facing {
        self.facing
    }

    #[cfg(test)]
    pub(crate) fn frame_index(&self) -> f32 {
        self.frame_index
    }

    pub(crate) fn current_frame_key(&self) -> Option<&str> {
        self.frames.frame_key(self.facing, self.frame_index)
    }

    /// Sets the movement intent; each component is clamped to -1..=1.
    /// Horizontal intent wins the facing; zero intent keeps the last facing.
    pub(crate) fn set_intent(&mut self, x: i32, y: i32) {
        let (x, y) = (x.signum(), y.signum());
        self.direction = Vec2::new(x as f32, y as f32).normalized_or_zero();
        self.facing = match (x, y) {
            (x, _) if x < 0 => Facing::Left,
            (x, _) if x > 0 => Facing::Right,
            (_, y) if y < 0 => Facing::Up,
            (_, y) if y > 0 => Facing::Down,
            _ => self.facing,
        };
    }

    /// Moves the player somewhere else without touching animation state.
    pub(crate) fn place_at(&mut self, center: Vec2) {
        self.hitbox.set_center(center);
        self.visual.set_center(center);
    }

    pub(crate) fn update(&mut self, dt: f32, shapes: &[Rect]) {
        self.apply_physics(dt, shapes);
        self.animate(dt);
    }

    /// Moves the hitbox along X, resolves, then along Y, resolves, and
    /// re-centres the visual rect.
    pub(crate) fn apply_physics(&mut self, dt: f32, shapes: &[Rect]) {
        let step = self.direction * (PLAYER_SPEED * dt);
        self.hitbox.x += step.x;
        resolve_axis(&mut self.hitbox, self.direction.x, Axis::Horizontal, shapes);
        self.hitbox.y += step.y;
        resolve_axis(&mut self.hitbox, self.direction.y, Axis::Vertical, shapes);
        self.visual.set_center(self.hitbox.center());
    }

    fn animate(&mut self, dt: f32) {
        if self.direction.length_squared() > 0.0 {
            self.frame_index += ANIMATION_FPS * dt;
        } else {
            self.frame_index = 0.0;
        }
    }
}

/// Pushes the leading edge of `hitbox` flush against every shape it overlaps.
fn resolve_axis(hitbox: &mut Rect, direction: f32, axis: Axis, shapes: &[Rect]) {
    for shape in shapes {
        if !shape.intersects(hitbox) {
            continue;
        }
        match axis {
            Axis::Horizontal if direction < 0.0 => hitbox.set_left(shape.right()),
            Axis::Horizontal if direction > 0.0 => hitbox.set_right(shape.left()),
            Axis::Vertical if direction < 0.0 => hitbox.set_top(shape.bottom()),
            Axis::Vertical if direction > 0.0 => hitbox.set_bottom(shape.top()),
            _ => {}
        }
    }
}
