use engine::{
    InputAction, InputSnapshot, OverlayKind, Scene, SceneCommand, SceneKey, SceneWorld,
    ScreenAnchor, ScreenOverlay, SpriteRef,
};
use tracing::info;

const BACKGROUND_SPRITE_KEY: &str = "graphics/ui/title_background.png";
const LOGO_SPRITE_KEY: &str = "graphics/ui/logo.png";
const LOGO_SIZE: (u32, u32) = (600, 375);
/// Logo centre sits at 40% of the window height.
const LOGO_CENTER_FRACTION: f32 = 0.4;

/// Background plus logo; confirm starts the game.
#[derive(Debug, Default)]
pub(crate) struct TitleScene;

impl TitleScene {
    fn overlays(window_size: (u32, u32)) -> Vec<ScreenOverlay> {
        let logo_lift = window_size.1 as f32 * (0.5 - LOGO_CENTER_FRACTION);
        vec![
            ScreenOverlay::new(
                OverlayKind::Sprite(SpriteRef::new(BACKGROUND_SPRITE_KEY)),
                ScreenAnchor::FullScreen,
            ),
            ScreenOverlay::new(
                OverlayKind::Sprite(SpriteRef::new(LOGO_SPRITE_KEY)),
                ScreenAnchor::Center,
            )
            .with_offset((0, -(logo_lift.round() as i32)))
            .with_size(LOGO_SIZE),
        ]
    }
}

impl Scene for TitleScene {
    fn load(&mut self, world: &mut SceneWorld) {
        world.clear();
        info!("title_scene_loaded");
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        world.set_overlays(Self::overlays(input.window_size()));
        if input.was_pressed(InputAction::Confirm) {
            info!("title_confirmed");
            return SceneCommand::SwitchTo(SceneKey::Gameplay);
        }
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, world: &mut SceneWorld) {
        world.clear();
    }

    fn window_title(&self, _world: &SceneWorld) -> Option<String> {
        Some("Journey".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_switches_to_gameplay() {
        let mut scene = TitleScene;
        let mut world = SceneWorld::default();
        scene.load(&mut world);

        let idle = InputSnapshot::empty().with_window_size((1280, 720));
        assert_eq!(scene.update(1.0 / 60.0, &idle, &mut world), SceneCommand::None);
        assert_eq!(
            scene.update(
                1.0 / 60.0,
                &idle.with_action_pressed(InputAction::Confirm),
                &mut world
            ),
            SceneCommand::SwitchTo(SceneKey::Gameplay)
        );
    }

    #[test]
    fn logo_sits_above_centre() {
        let overlays = TitleScene::overlays((1280, 720));
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].anchor, ScreenAnchor::FullScreen);
        assert_eq!(overlays[1].offset, (0, -72));
        assert_eq!(overlays[1].size, Some(LOGO_SIZE));
    }
}
