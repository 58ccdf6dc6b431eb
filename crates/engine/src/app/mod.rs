mod input;
mod loop_runner;
mod rendering;
mod scene;

pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use rendering::{
    camera_offset, depth_sorted_indices, parallax_offset, world_to_screen, Renderer, Viewport,
};
pub use scene::{
    Camera2D, DrawLayer, Entity, EntityId, InputSnapshot, OverlayKind, ParallaxLayer, Rect,
    RenderableDesc, RenderableKind, Scene, SceneCommand, SceneKey, SceneWorld, ScreenAnchor,
    ScreenOverlay, SpriteRef, SpriteRegion, Vec2,
};
