use std::rc::Rc;

use engine::{
    InputAction, InputSnapshot, OverlayKind, ScreenAnchor, ScreenOverlay, SpriteRef,
    TileMapError, Vec2,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::asset_stem;
use super::collision::CollisionRegistry;
use super::doors::{door_at, Door, DoorProximity};
use super::inventory::Inventory;
use super::items::{check_pickups, spawn_items, ActiveItem};
use super::loader::RoomLoader;
use super::notifier::{room_banner_key, Banner, DOOR_BANNER, DOOR_BANNER_SPRITE_KEY, ROOM_BANNER};
use super::player::{AnimationFrames, Player};
use super::reach::{self, ReachableSet, TileCoord};
use super::room::RoomLayout;
use super::transition::{TransitionController, TransitionState};

const ROOM_BANNER_TOP_PX: i32 = 20;
/// Door banner sits with its bottom edge at 95% of the window height.
const DOOR_BANNER_BOTTOM_FRACTION: f32 = 0.95;
const MENU_PANEL_SPRITE_KEY: &str = "graphics/ui/menu_panel.png";
const MENU_DIM_ALPHA: u8 = 160;
const BLACK: [u8; 4] = [0, 0, 0, 255];

#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("failed to load starting room '{map_key}': {source}")]
    StartRoom {
        map_key: String,
        #[source]
        source: TileMapError,
    },
}

/// Something that happened during one [`Session::step`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SessionEvent {
    MenuToggled { open: bool },
    InventoryToggled { open: bool },
    QuitRequested,
    RoomReloaded { room: String },
    TransitionStarted { target: String },
    RoomEntered { room: String },
    TransitionFailed { target: String },
    ItemPicked { id: String },
    DoorTouched,
}

/// Room-scoped state; rebuilt on every load, reload and door transition.
#[derive(Debug)]
pub(crate) struct ActiveRoom {
    pub(crate) layout: RoomLayout,
    pub(crate) collisions: CollisionRegistry,
    pub(crate) reachable: ReachableSet,
}

impl ActiveRoom {
    fn build(layout: RoomLayout, player_center: Vec2) -> Self {
        let collisions = CollisionRegistry::build(&layout.geometry);
        let reachable = reach::compute(
            TileCoord::from_world(player_center),
            collisions.shapes(),
            layout.grid_width,
            layout.grid_height,
        );
        Self {
            layout,
            collisions,
            reachable,
        }
    }
}

/// One play-through: the current room, the player, and the inventory that
/// outlives every room.
pub(crate) struct Session<L> {
    loader: L,
    frames: Rc<AnimationFrames>,
    inventory: Inventory,
    room: ActiveRoom,
    room_generation: u64,
    player: Player,
    items: Vec<ActiveItem>,
    transition: TransitionController,
    door_proximity: DoorProximity,
    room_banner: Banner,
    door_banner: Banner,
    menu_open: bool,
}

impl<L: RoomLoader> Session<L> {
    /// Loads the first room and pre-registers `sticker_keys` as grey
    /// inventory slots. Failing to load the first room is fatal.
    pub(crate) fn start(
        mut loader: L,
        frames: Rc<AnimationFrames>,
        sticker_keys: &[String],
        map_key: &str,
    ) -> Result<Self, SessionError> {
        let map = loader
            .load_room(map_key)
            .map_err(|source| SessionError::StartRoom {
                map_key: map_key.to_string(),
                source,
            })?;
        let layout = RoomLayout::from_map(&map);
        let player = Player::spawn_at(layout.player_spawn, Rc::clone(&frames));
        let room = ActiveRoom::build(layout, player.center());

        let mut inventory = Inventory::default();
        for key in sticker_keys {
            inventory.register(asset_stem(key), key);
        }

        let mut session = Self {
            loader,
            frames,
            inventory,
            room,
            room_generation: 0,
            player,
            items: Vec::new(),
            transition: TransitionController::default(),
            door_proximity: DoorProximity::default(),
            room_banner: Banner::new(ROOM_BANNER),
            door_banner: Banner::new(DOOR_BANNER),
            menu_open: false,
        };
        session.respawn_items();
        session.door_proximity.reset(session.touching_door());
        session
            .room_banner
            .show(room_banner_key(&session.room.layout.name));
        session.log_room_loaded("start");
        Ok(session)
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn items(&self) -> &[ActiveItem] {
        &self.items
    }

    pub(crate) fn room(&self) -> &ActiveRoom {
        &self.room
    }

    /// Bumped whenever room-scoped state is rebuilt.
    pub(crate) fn room_generation(&self) -> u64 {
        self.room_generation
    }

    #[cfg(test)]
    pub(crate) fn transition(&self) -> &TransitionController {
        &self.transition
    }

    #[cfg(test)]
    pub(crate) fn is_menu_open(&self) -> bool {
        self.menu_open
    }

    /// Advances the session by one fixed tick.
    pub(crate) fn step(&mut self, dt: f32, input: &InputSnapshot) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if input.was_pressed(InputAction::ToggleMenu) {
            self.menu_open = !self.menu_open;
            events.push(SessionEvent::MenuToggled {
                open: self.menu_open,
            });
        }
        if self.menu_open {
            if input.was_pressed(InputAction::Confirm) {
                events.push(SessionEvent::QuitRequested);
            }
            return events;
        }

        self.handle_commands(input, &mut events);
        self.room_banner.tick(dt);
        self.door_banner.tick(dt);

        if self.transition.is_transitioning() {
            if let Some(door) = self.transition.tick(dt) {
                self.finish_transition(&door, &mut events);
            }
            return events;
        }

        self.update_world(dt, input, &mut events);
        events
    }

    /// Starts a transition through the door under the player. Returns false
    /// when no door overlaps the hitbox or a transition is already running.
    pub(crate) fn request_door_transition(&mut self) -> bool {
        let Some(door) = door_at(&self.room.layout.doors, &self.player.hitbox()) else {
            return false;
        };
        if !self.transition.request(door) {
            debug!(door_target = %door.target, "door_request_ignored");
            return false;
        }
        info!(
            room = %self.room.layout.name,
            door_target = %door.target,
            "room_transition_started"
        );
        true
    }

    /// Rebuilds the current room from its map and recreates the player at the
    /// map's spawn. The inventory is kept.
    pub(crate) fn reload(&mut self) -> bool {
        let map_key = self.room.layout.map_key.clone();
        match self.loader.load_room(&map_key) {
            Ok(map) => {
                let layout = RoomLayout::from_map(&map);
                self.player = Player::spawn_at(layout.player_spawn, Rc::clone(&self.frames));
                self.enter_room(layout);
                self.log_room_loaded("reload");
                true
            }
            Err(error) => {
                warn!(error = %error, map = %map_key, "room_reload_failed");
                false
            }
        }
    }

    /// Screen overlays for the current state, back to front.
    pub(crate) fn overlays(&self, window_size: (u32, u32)) -> Vec<ScreenOverlay> {
        let mut overlays = Vec::new();
        overlays.extend(
            self.room_banner
                .overlay(ScreenAnchor::TopCenter, (0, ROOM_BANNER_TOP_PX)),
        );
        let door_banner_lift = window_size.1 as f32 * (1.0 - DOOR_BANNER_BOTTOM_FRACTION);
        overlays.extend(
            self.door_banner
                .overlay(ScreenAnchor::BottomCenter, (0, -(door_banner_lift.round() as i32))),
        );
        overlays.extend(self.inventory.overlays());

        let fade_alpha = self.transition.fade_alpha();
        if fade_alpha > 0 {
            overlays.push(
                ScreenOverlay::new(OverlayKind::Solid(BLACK), ScreenAnchor::FullScreen)
                    .with_alpha(fade_alpha),
            );
        }
        if self.menu_open {
            overlays.push(
                ScreenOverlay::new(OverlayKind::Solid(BLACK), ScreenAnchor::FullScreen)
                    .with_alpha(MENU_DIM_ALPHA),
            );
            overlays.push(ScreenOverlay::new(
                OverlayKind::Sprite(SpriteRef::new(MENU_PANEL_SPRITE_KEY)),
                ScreenAnchor::Center,
            ));
        }
        overlays
    }

    fn handle_commands(&mut self, input: &InputSnapshot, events: &mut Vec<SessionEvent>) {
        if input.was_pressed(InputAction::ToggleInventory) {
            let open = self.inventory.toggle();
            events.push(SessionEvent::InventoryToggled { open });
        }
        if self.inventory.is_open() {
            if input.was_pressed(InputAction::PageNext) {
                self.inventory.next_page();
            }
            if input.was_pressed(InputAction::PagePrev) {
                self.inventory.prev_page();
            }
        }

        if input.was_pressed(InputAction::Reload) {
            if self.transition.is_transitioning() {
                debug!("reload_ignored_during_transition");
            } else if self.reload() {
                events.push(SessionEvent::RoomReloaded {
                    room: self.room.layout.name.clone(),
                });
            }
        }

        if input.was_pressed(InputAction::Interact) && self.request_door_transition() {
            if let TransitionState::Transitioning { door, .. } = self.transition.state() {
                events.push(SessionEvent::TransitionStarted {
                    target: door.target.clone(),
                });
            }
        }
    }

    fn update_world(&mut self, dt: f32, input: &InputSnapshot, events: &mut Vec<SessionEvent>) {
        let picked = check_pickups(self.player.visual(), &mut self.items, &mut self.inventory);
        for item in picked {
            info!(
                room = %self.room.layout.name,
                item = %item.id,
                picked = self.inventory.picked_count(),
                total = self.inventory.len(),
                "item_picked"
            );
            events.push(SessionEvent::ItemPicked { id: item.id });
        }

        let (x, y) = movement_intent(input);
        self.player.set_intent(x, y);
        self.player.update(dt, self.room.collisions.shapes());

        if self.door_proximity.update(self.touching_door()) {
            self.door_banner.show(DOOR_BANNER_SPRITE_KEY);
            events.push(SessionEvent::DoorTouched);
        }
    }

    fn finish_transition(&mut self, door: &Door, events: &mut Vec<SessionEvent>) {
        let loaded = door
            .target_key(&self.room.layout.map_key)
            .map_err(|error| error.to_string())
            .and_then(|map_key| {
                self.loader
                    .load_room(&map_key)
                    .map_err(|error| error.to_string())
            });
        let map = match loaded {
            Ok(map) => map,
            Err(error) => {
                warn!(
                    room = %self.room.layout.name,
                    door_target = %door.target,
                    error = %error,
                    "room_transition_failed"
                );
                events.push(SessionEvent::TransitionFailed {
                    target: door.target.clone(),
                });
                return;
            }
        };

        let layout = RoomLayout::from_map(&map);
        match door.spawn {
            Some(spawn) => self.player.place_at(spawn),
            None => warn!(room = %layout.name, door_target = %door.target, "door_spawn_missing"),
        }
        let room = layout.name.clone();
        self.enter_room(layout);
        self.room_banner.show(room_banner_key(&room));
        self.log_room_loaded("door");
        events.push(SessionEvent::RoomEntered { room });
    }

    fn enter_room(&mut self, layout: RoomLayout) {
        self.room = ActiveRoom::build(layout, self.player.center());
        self.room_generation += 1;
        self.respawn_items();
        self.door_proximity.reset(self.touching_door());
    }

    fn respawn_items(&mut self) {
        self.items = spawn_items(&self.room.layout.collectibles, &self.inventory);
        for item in &self.items {
            let tile = TileCoord::from_world(item.rect.center());
            if !self.room.reachable.contains(tile) {
                warn!(
                    room = %self.room.layout.name,
                    item = %item.id,
                    col = tile.col,
                    row = tile.row,
                    "collectible_unreachable"
                );
            }
        }
    }

    fn touching_door(&self) -> bool {
        door_at(&self.room.layout.doors, &self.player.hitbox()).is_some()
    }

    fn log_room_loaded(&self, reason: &'static str) {
        info!(
            room = %self.room.layout.name,
            reason,
            items = self.items.len(),
            collisions = self.room.collisions.len(),
            doors = self.room.layout.doors.len(),
            reach_col = self.room.reachable.start().col,
            reach_row = self.room.reachable.start().row,
            reachable_tiles = self.room.reachable.len(),
            "room_loaded"
        );
    }
}

fn movement_intent(input: &InputSnapshot) -> (i32, i32) {
    let axis = |negative: InputAction, positive: InputAction| {
        i32::from(input.is_down(positive)) - i32::from(input.is_down(negative))
    };
    (
        axis(InputAction::MoveLeft, InputAction::MoveRight),
        axis(InputAction::MoveUp, InputAction::MoveDown),
    )
}
