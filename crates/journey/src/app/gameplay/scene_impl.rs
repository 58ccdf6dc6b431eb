use engine::{
    DrawLayer, EntityId, InputSnapshot, RenderableDesc, RenderableKind, Scene, SceneCommand,
    SceneWorld, SpriteRef,
};
use tracing::info;

use super::loader::RoomLoader;
use super::player::Player;
use super::session::{Session, SessionEvent};

const PLAYER_PLACEHOLDER_COLOR: [u8; 4] = [220, 180, 60, 255];

/// Mirrors a [`Session`] into the engine's entity arena.
pub(crate) struct GameplayScene<L> {
    session: Session<L>,
    synced_generation: Option<u64>,
    player_entity: Option<EntityId>,
    item_entities: Vec<(u32, EntityId)>,
}

impl<L: RoomLoader> GameplayScene<L> {
    pub(crate) fn new(session: Session<L>) -> Self {
        Self {
            session,
            synced_generation: None,
            player_entity: None,
            item_entities: Vec::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn session(&self) -> &Session<L> {
        &self.session
    }

    fn rebuild_world(&mut self, world: &mut SceneWorld) {
        world.clear();
        self.item_entities.clear();

        let layout = &self.session.room().layout;
        for tile in &layout.tiles {
            world.spawn(
                tile.rect,
                sprite_renderable(tile.sprite.clone(), tile.layer, "tile"),
            );
        }
        for obstacle in &layout.obstacles {
            world.spawn(
                obstacle.rect,
                sprite_renderable(obstacle.sprite.clone(), DrawLayer::Object, "obstacle"),
            );
        }
        for item in self.session.items() {
            let id = world.spawn(
                item.rect,
                sprite_renderable(item.sprite.clone(), DrawLayer::Object, "item"),
            );
            self.item_entities.push((item.instance, id));
        }
        let player = self.session.player();
        self.player_entity = Some(world.spawn(
            player.visual(),
            RenderableDesc {
                kind: player_kind(player),
                layer: DrawLayer::Object,
                debug_name: "player",
            },
        ));
        world.set_parallax_layers(layout.background.iter().cloned().collect());
        world.apply_pending();

        self.synced_generation = Some(self.session.room_generation());
        info!(
            room = %layout.name,
            entity_count = world.entity_count(),
            "gameplay_world_rebuilt"
        );
    }

    fn sync_dynamic(&mut self, world: &mut SceneWorld) {
        let items = self.session.items();
        self.item_entities.retain(|(instance, entity_id)| {
            let still_active = items.iter().any(|item| item.instance == *instance);
            if !still_active {
                world.despawn(*entity_id);
            }
            still_active
        });

        let player = self.session.player();
        if let Some(entity) = self
            .player_entity
            .and_then(|entity_id| world.find_entity_mut(entity_id))
        {
            entity.rect = player.visual();
            entity.renderable.kind = player_kind(player);
        }
        world.set_camera_target(player.center());
    }

    fn sync_world(&mut self, world: &mut SceneWorld) {
        if self.synced_generation != Some(self.session.room_generation()) {
            self.rebuild_world(world);
        }
        self.sync_dynamic(world);
    }
}

impl<L: RoomLoader> Scene for GameplayScene<L> {
    fn load(&mut self, world: &mut SceneWorld) {
        self.synced_generation = None;
        self.sync_world(world);
    }

    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let events = self.session.step(fixed_dt_seconds, input);
        if events.contains(&SessionEvent::QuitRequested) {
            info!(reason = "menu_confirm", "quit_requested");
            return SceneCommand::Quit;
        }

        self.sync_world(world);
        world.set_overlays(self.session.overlays(input.window_size()));
        SceneCommand::None
    }

    fn render(&mut self, _world: &SceneWorld) {}

    fn unload(&mut self, world: &mut SceneWorld) {
        world.clear();
        self.synced_generation = None;
        self.player_entity = None;
        self.item_entities.clear();
    }

    fn window_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(format!("Journey - {}", self.session.room().layout.name))
    }
}

fn sprite_renderable(sprite: SpriteRef, layer: DrawLayer, debug_name: &'static str) -> RenderableDesc {
    RenderableDesc {
        kind: RenderableKind::Sprite(sprite),
        layer,
        debug_name,
    }
}

fn player_kind(player: &Player) -> RenderableKind {
    match player.current_frame_key() {
        Some(key) => RenderableKind::Sprite(SpriteRef::new(key)),
        None => RenderableKind::Solid(PLAYER_PLACEHOLDER_COLOR),
    }
}
