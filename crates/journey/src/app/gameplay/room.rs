use engine::{
    DrawLayer, MapObject, ParallaxLayer, PropertyValue, Rect, SpriteRef, TileImage, TileMap,
    Vec2,
};
use tracing::{debug, warn};

use super::collision::RoomGeometry;
use super::doors::Door;
use super::items::CollectibleSpawn;
use super::{asset_stem, TILE_SIZE};

/// Tile layers drawn beneath everything else, in this order.
const GROUND_LAYERS: [&str; 5] = [
    "Ground",
    "Ground_layer1",
    "Ground_layer2",
    "Ground_layer3",
    "Ground_layer4",
];
const ENTITIES_GROUP: &str = "Entities";
const OBJECT_GROUPS: [&str; 2] = ["Objects", "Ground_objects"];
const COLLECTIBLES_GROUP: &str = "Objects";
const COLLISIONS_GROUP: &str = "Collisions";
const DOORS_GROUP: &str = "Doors";
const PLAYER_OBJECT: &str = "Player";
const DOOR_KIND: &str = "Door";
const DEFAULT_PARALLAX_SPEED: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TileSprite {
    pub(crate) rect: Rect,
    pub(crate) sprite: SpriteRef,
    pub(crate) layer: DrawLayer,
}

/// Static decoration that also blocks movement.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Obstacle {
    pub(crate) rect: Rect,
    pub(crate) sprite: SpriteRef,
}

/// Everything a room needs, read once from its map.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RoomLayout {
    pub(crate) name: String,
    pub(crate) map_key: String,
    pub(crate) grid_width: u32,
    pub(crate) grid_height: u32,
    pub(crate) tiles: Vec<TileSprite>,
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) geometry: RoomGeometry,
    pub(crate) doors: Vec<Door>,
    pub(crate) collectibles: Vec<CollectibleSpawn>,
    pub(crate) player_spawn: Vec2,
    pub(crate) background: Option<ParallaxLayer>,
}

impl RoomLayout {
    /// Builds the layout; missing or malformed content is logged and skipped.
    pub(crate) fn from_map(map: &TileMap) -> Self {
        let name = map.stem().to_string();
        if map.tile_width as f32 != TILE_SIZE || map.tile_height as f32 != TILE_SIZE {
            warn!(
                room = %name,
                tile_width = map.tile_width,
                tile_height = map.tile_height,
                grid = TILE_SIZE,
                "room_tile_size_mismatch"
            );
        }
        let mut layout = Self {
            name,
            map_key: map.key.clone(),
            grid_width: map.width,
            grid_height: map.height,
            tiles: Vec::new(),
            obstacles: Vec::new(),
            geometry: RoomGeometry::default(),
            doors: Vec::new(),
            collectibles: Vec::new(),
            player_spawn: Vec2::new(TILE_SIZE * 0.5, TILE_SIZE * 0.5),
            background: read_background(map),
        };
        layout.read_tile_layers(map);
        layout.read_player_spawn(map);
        layout.read_objects(map);
        layout.read_collisions(map);
        layout.read_doors(map);
        layout
    }

    fn read_tile_layers(&mut self, map: &TileMap) {
        if map.tile_layer(GROUND_LAYERS[0]).is_none() {
            warn!(room = %self.name, layer = GROUND_LAYERS[0], "room_layer_missing");
        }

        let ground = GROUND_LAYERS
            .iter()
            .filter_map(|name| map.tile_layer(name))
            .map(|layer| (layer, DrawLayer::Ground));
        let decoration = map
            .tile_layers
            .iter()
            .filter(|layer| !GROUND_LAYERS.contains(&layer.name.as_str()))
            .map(|layer| (layer, DrawLayer::Object));

        // Tiles sit on the TILE_SIZE grid whatever the map declares.
        for (layer, draw_layer) in ground.chain(decoration) {
            let solid = layer.bool_property("solid");
            for (col, row, image) in layer.tiles() {
                let rect = Rect::new(
                    col as f32 * TILE_SIZE,
                    row as f32 * TILE_SIZE,
                    TILE_SIZE,
                    TILE_SIZE,
                );
                if solid {
                    self.geometry.solid_tile_rects.push(rect);
                }
                if layer.visible {
                    self.tiles.push(TileSprite {
                        rect,
                        sprite: SpriteRef::new(image.key.clone()).with_region(image.region),
                        layer: draw_layer,
                    });
                }
            }
        }
    }

    fn read_player_spawn(&mut self, map: &TileMap) {
        let spawn = map
            .object_group(ENTITIES_GROUP)
            .and_then(|group| group.objects.iter().find(|obj| obj.name == PLAYER_OBJECT));
        match spawn {
            Some(object) => self.player_spawn = Vec2::new(object.x, object.y),
            None => warn!(
                room = %self.name,
                fallback_x = self.player_spawn.x,
                fallback_y = self.player_spawn.y,
                "room_player_spawn_missing"
            ),
        }
    }

    fn read_objects(&mut self, map: &TileMap) {
        for group_name in OBJECT_GROUPS {
            let Some(group) = map.object_group(group_name) else {
                warn!(room = %self.name, layer = group_name, "room_layer_missing");
                continue;
            };
            for object in &group.objects {
                match &object.tile {
                    Some(image) if group_name == COLLECTIBLES_GROUP => {
                        self.read_collectible(object, image)
                    }
                    Some(_) => {}
                    None if !object.name.is_empty() => self.obstacles.push(Obstacle {
                        rect: sized_or_tile(object),
                        sprite: SpriteRef::new(format!("graphics/objects/{}.png", object.name)),
                    }),
                    None => {}
                }
            }
        }
        self.geometry.obstacle_rects = self.obstacles.iter().map(|obstacle| obstacle.rect).collect();
    }

    fn read_collectible(&mut self, object: &MapObject, image: &TileImage) {
        debug!(room = %self.name, object = object.id, key = %image.key, "collectible_read");
        self.collectibles.push(CollectibleSpawn {
            raw_id: asset_stem(&image.key).to_string(),
            rect: Rect::new(object.x, object.y, TILE_SIZE, TILE_SIZE),
            sprite: SpriteRef::new(image.key.clone()).with_region(image.region),
        });
    }

    fn read_collisions(&mut self, map: &TileMap) {
        match map.object_group(COLLISIONS_GROUP) {
            Some(group) => {
                self.geometry.collision_rects = group.objects.iter().map(MapObject::rect).collect();
            }
            None => warn!(room = %self.name, layer = COLLISIONS_GROUP, "room_layer_missing"),
        }
    }

    fn read_doors(&mut self, map: &TileMap) {
        let Some(group) = map.object_group(DOORS_GROUP) else {
            warn!(room = %self.name, layer = DOORS_GROUP, "room_layer_missing");
            return;
        };
        for object in group.objects.iter().filter(|obj| obj.kind == DOOR_KIND) {
            let Some(target) = object
                .property("target")
                .and_then(PropertyValue::as_str)
                .filter(|target| !target.trim().is_empty())
            else {
                warn!(room = %self.name, object = object.id, "door_target_missing");
                continue;
            };
            self.doors.push(Door {
                rect: object.rect(),
                target: target.trim().to_string(),
                spawn: self.read_door_spawn(object),
            });
        }
    }

    fn read_door_spawn(&self, object: &MapObject) -> Option<Vec2> {
        let raw_x = object.property("spawn_x");
        let raw_y = object.property("spawn_y");
        if raw_x.is_none() && raw_y.is_none() {
            return None;
        }
        match (
            raw_x.and_then(PropertyValue::as_f64),
            raw_y.and_then(PropertyValue::as_f64),
        ) {
            (Some(x), Some(y)) => Some(Vec2::new(x as f32, y as f32)),
            _ => {
                warn!(room = %self.name, object = object.id, "door_spawn_malformed");
                None
            }
        }
    }
}

fn read_background(map: &TileMap) -> Option<ParallaxLayer> {
    let key = map.property("background").and_then(PropertyValue::as_str)?;
    let speed = map
        .property("parallax_speed")
        .and_then(PropertyValue::as_f64)
        .map(|speed| speed as f32)
        .unwrap_or(DEFAULT_PARALLAX_SPEED);
    Some(ParallaxLayer {
        sprite: SpriteRef::new(key),
        speed: if speed.is_finite() { speed.clamp(0.0, 1.0) } else { 0.0 },
    })
}

/// Point objects have no size; give them one tile.
fn sized_or_tile(object: &MapObject) -> Rect {
    let width = if object.width > 0.0 { object.width } else { TILE_SIZE };
    let height = if object.height > 0.0 { object.height } else { TILE_SIZE };
    Rect::new(object.x, object.y, width, height)
}
