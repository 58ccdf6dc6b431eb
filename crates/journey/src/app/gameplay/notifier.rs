use engine::{OverlayKind, ScreenAnchor, ScreenOverlay, SpriteRef};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BannerTiming {
    pub(crate) display_seconds: f32,
    pub(crate) fade_delay_seconds: f32,
}

pub(crate) const ROOM_BANNER: BannerTiming = BannerTiming {
    display_seconds: 5.0,
    fade_delay_seconds: 2.0,
};

pub(crate) const DOOR_BANNER: BannerTiming = BannerTiming {
    display_seconds: 4.0,
    fade_delay_seconds: 0.5,
};

pub(crate) const DOOR_BANNER_SPRITE_KEY: &str = "graphics/ui/door_banner.png";

pub(crate) fn room_banner_key(room_name: &str) -> String {
    format!("graphics/ui/{room_name}_banner.png")
}

/// Timed screen banner: opaque until the fade delay, then fading linearly to
/// nothing at the end of its display time.
#[derive(Debug, Clone)]
pub(crate) struct Banner {
    timing: BannerTiming,
    sprite_key: Option<String>,
    elapsed: f32,
}

impl Banner {
    pub(crate) fn new(timing: BannerTiming) -> Self {
        Self {
            timing,
            sprite_key: None,
            elapsed: 0.0,
        }
    }

    /// Restarts the banner with a new image.
    pub(crate) fn show(&mut self, sprite_key: impl Into<String>) {
        self.sprite_key = Some(sprite_key.into());
        self.elapsed = 0.0;
    }

    pub(crate) fn tick(&mut self, dt: f32) {
        if self.sprite_key.is_none() {
            return;
        }
        self.elapsed += dt;
        if self.elapsed >= self.timing.display_seconds {
            self.sprite_key = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.sprite_key.is_some()
    }

    pub(crate) fn alpha(&self) -> Option<u8> {
        self.sprite_key.as_ref()?;
        let fade_elapsed = self.elapsed - self.timing.fade_delay_seconds;
        if fade_elapsed <= 0.0 {
            return Some(u8::MAX);
        }
        let fade_seconds = self.timing.display_seconds - self.timing.fade_delay_seconds;
        let alpha = 255.0 * (1.0 - fade_elapsed / fade_seconds);
        Some(alpha.max(0.0) as u8)
    }

    pub(crate) fn overlay(&self, anchor: ScreenAnchor, offset: (i32, i32)) -> Option<ScreenOverlay> {
        let key = self.sprite_key.as_ref()?;
        let alpha = self.alpha()?;
        Some(
            ScreenOverlay::new(OverlayKind::Sprite(SpriteRef::new(key.clone())), anchor)
                .with_offset(offset)
                .with_alpha(alpha),
        )
    }
}
