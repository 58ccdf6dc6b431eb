use std::path::{Path, PathBuf};

use thiserror::Error;
use tiled::{LayerType, Loader, ObjectShape, Tileset};
use tracing::debug;

use crate::app::SpriteRegion;
use crate::asset_keys::{resolve_relative_key, validate_asset_key, AssetKeyError};

use super::tilemap::{
    MapObject, ObjectGroup, Properties, PropertyValue, TileImage, TileLayer, TileMap,
};

#[derive(Debug, Error)]
pub enum TileMapError {
    #[error("invalid map key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("failed to load map '{}': {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: tiled::Error,
    },
    #[error("map '{key}' is infinite; only fixed-size maps are supported")]
    Infinite { key: String },
    #[error("map '{key}' references image '{}' outside the assets root", .path.display())]
    ImageOutsideRoot { key: String, path: PathBuf },
    #[error("map '{key}' references invalid image path '{}': {source}", .path.display())]
    ImagePath {
        key: String,
        path: PathBuf,
        #[source]
        source: AssetKeyError,
    },
}

/// Loads `key` (relative to `assets_dir`) through `tiled` and flattens it
/// into a [`TileMap`]: group layers are unwrapped, tiles resolve to asset
/// keys and tile objects get a top-left origin.
pub fn load_tile_map(assets_dir: &Path, key: &str) -> Result<TileMap, TileMapError> {
    validate_asset_key(key).map_err(|source| TileMapError::InvalidKey {
        key: key.to_string(),
        source,
    })?;
    let path = assets_dir.join(key);
    let map = Loader::new()
        .load_tmx_map(&path)
        .map_err(|source| TileMapError::Load {
            path: path.clone(),
            source,
        })?;
    if map.infinite() {
        return Err(TileMapError::Infinite {
            key: key.to_string(),
        });
    }

    let adapter = MapAdapter { assets_dir, key };
    let mut tile_map = TileMap {
        key: key.to_string(),
        width: map.width,
        height: map.height,
        tile_width: map.tile_width,
        tile_height: map.tile_height,
        properties: convert_properties(&map.properties),
        tile_layers: Vec::new(),
        object_groups: Vec::new(),
    };

    let mut pending: Vec<tiled::Layer<'_>> = map.layers().collect();
    pending.reverse();
    while let Some(layer) = pending.pop() {
        match layer.layer_type() {
            LayerType::Tiles(tiled::TileLayer::Finite(data)) => {
                let (width, height) = (data.width(), data.height());
                let mut cells = Vec::with_capacity(width as usize * height as usize);
                for row in 0..height {
                    for col in 0..width {
                        let cell = match data.get_tile(col as i32, row as i32) {
                            Some(tile) => adapter.tile_image(tile.get_tileset(), tile.id())?,
                            None => None,
                        };
                        cells.push(cell);
                    }
                }
                tile_map.tile_layers.push(TileLayer::new(
                    layer.name.clone(),
                    width,
                    height,
                    layer.visible,
                    convert_properties(&layer.properties),
                    cells,
                ));
            }
            LayerType::Tiles(_) => {
                return Err(TileMapError::Infinite {
                    key: key.to_string(),
                })
            }
            LayerType::Objects(group) => {
                let mut objects = Vec::new();
                for object in group.objects() {
                    objects.push(adapter.object(&object)?);
                }
                tile_map.object_groups.push(ObjectGroup {
                    name: layer.name.clone(),
                    properties: convert_properties(&layer.properties),
                    objects,
                });
            }
            LayerType::Group(group) => {
                let mut children: Vec<tiled::Layer<'_>> = group.layers().collect();
                children.reverse();
                pending.extend(children);
            }
            _ => debug!(map = key, layer = %layer.name, "map_layer_skipped"),
        }
    }

    Ok(tile_map)
}

struct MapAdapter<'a> {
    assets_dir: &'a Path,
    key: &'a str,
}

impl MapAdapter<'_> {
    fn tile_image(&self, tileset: &Tileset, id: u32) -> Result<Option<TileImage>, TileMapError> {
        if let Some(image) = &tileset.image {
            let columns = tileset.columns.max(1);
            let region = SpriteRegion {
                x: tileset.margin + (id % columns) * (tileset.tile_width + tileset.spacing),
                y: tileset.margin + (id / columns) * (tileset.tile_height + tileset.spacing),
                w: tileset.tile_width,
                h: tileset.tile_height,
            };
            return Ok(Some(TileImage {
                key: self.image_key(&image.source)?,
                region: Some(region),
            }));
        }

        let source = tileset
            .get_tile(id)
            .and_then(|tile| tile.image.as_ref().map(|image| image.source.clone()));
        match source {
            Some(source) => Ok(Some(TileImage {
                key: self.image_key(&source)?,
                region: None,
            })),
            None => {
                debug!(map = self.key, tileset = %tileset.name, tile = id, "tile_without_image");
                Ok(None)
            }
        }
    }

    fn object(&self, object: &tiled::Object<'_>) -> Result<MapObject, TileMapError> {
        let (mut width, mut height) = match &object.shape {
            ObjectShape::Rect { width, height } | ObjectShape::Ellipse { width, height } => {
                (*width, *height)
            }
            _ => (0.0, 0.0),
        };
        let mut y = object.y;
        let mut tile = None;

        // Tile objects are anchored bottom-left.
        if let Some(layer_tile) = object.get_tile() {
            let tileset = layer_tile.get_tileset();
            if width <= 0.0 || height <= 0.0 {
                width = tileset.tile_width as f32;
                height = tileset.tile_height as f32;
            }
            y -= height;
            tile = self.tile_image(tileset, layer_tile.id())?;
        }

        Ok(MapObject {
            id: object.id(),
            name: object.name.clone(),
            kind: object.user_type.clone(),
            x: object.x,
            y,
            width,
            height,
            tile,
            properties: convert_properties(&object.properties),
        })
    }

    /// `tiled` joins image sources onto the referencing file's directory;
    /// fold that back into an asset key.
    fn image_key(&self, source: &Path) -> Result<String, TileMapError> {
        let relative =
            source
                .strip_prefix(self.assets_dir)
                .map_err(|_| TileMapError::ImageOutsideRoot {
                    key: self.key.to_string(),
                    path: source.to_path_buf(),
                })?;
        let segments: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        resolve_relative_key("", &segments.join("/")).map_err(|source_err| {
            TileMapError::ImagePath {
                key: self.key.to_string(),
                path: source.to_path_buf(),
                source: source_err,
            }
        })
    }
}

fn convert_properties(properties: &tiled::Properties) -> Properties {
    properties
        .iter()
        .filter_map(|(name, value)| {
            let value = match value {
                tiled::PropertyValue::BoolValue(value) => PropertyValue::Bool(*value),
                tiled::PropertyValue::IntValue(value) => PropertyValue::Int(i64::from(*value)),
                tiled::PropertyValue::FloatValue(value) => {
                    PropertyValue::Float(f64::from(*value))
                }
                tiled::PropertyValue::StringValue(value)
                | tiled::PropertyValue::FileValue(value) => PropertyValue::String(value.clone()),
                _ => return None,
            };
            Some((name.clone(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    const EMBEDDED_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" renderorder="right-down" width="3" height="2" tilewidth="64" tileheight="64" infinite="0">
 <properties>
  <property name="background" value="graphics/backgrounds/sky.png"/>
  <property name="parallax_speed" type="float" value="0.25"/>
 </properties>
 <tileset firstgid="1" name="terrain" tilewidth="64" tileheight="64" spacing="2" margin="1" tilecount="4" columns="2">
  <image source="../graphics/tilesets/terrain.png" width="131" height="131"/>
 </tileset>
 <layer id="1" name="Ground" width="3" height="2">
  <data encoding="csv">
1,2,0,
2147483652,1,1
</data>
 </layer>
 <objectgroup id="2" name="Objects">
  <object id="7" name="tree" type="Decor" x="10" y="20" width="30" height="40"/>
  <object id="8" gid="3" x="128" y="192" width="64" height="64"/>
 </objectgroup>
 <group id="4" name="Markers">
  <objectgroup id="3" name="Doors">
   <object id="9" type="Door" x="0" y="0" width="64" height="32">
    <properties>
     <property name="target" value="hall.tmx"/>
     <property name="spawn_x" type="int" value="96"/>
    </properties>
   </object>
  </objectgroup>
 </group>
</map>
"#;

    #[test]
    fn flattens_layers_objects_and_sheet_regions() {
        let temp = TempDir::new().expect("tempdir");
        write_file(&temp.path().join("maps/room.tmx"), EMBEDDED_MAP);

        let map = load_tile_map(temp.path(), "maps/room.tmx").expect("map");

        assert_eq!((map.width, map.height), (3, 2));
        assert_eq!(map.pixel_width(), 192);
        assert_eq!(
            map.property("parallax_speed").and_then(PropertyValue::as_f64),
            Some(0.25)
        );

        let ground = map.tile_layer("Ground").expect("ground");
        let flipped = ground.image_at(0, 1).expect("flipped cell");
        assert_eq!(flipped.key, "graphics/tilesets/terrain.png");
        assert_eq!(
            flipped.region,
            Some(SpriteRegion {
                x: 67,
                y: 67,
                w: 64,
                h: 64
            })
        );
        assert_eq!(ground.image_at(2, 0), None);
        assert_eq!(ground.tiles().count(), 5);

        let objects = map.object_group("Objects").expect("objects");
        assert_eq!(objects.objects[0].kind, "Decor");
        assert_eq!(objects.objects[0].rect().top(), 20.0);
        assert!(objects.objects[0].tile.is_none());
        let tile_object = &objects.objects[1];
        assert_eq!(tile_object.y, 128.0, "tile objects use top-left");
        assert_eq!(
            tile_object.tile.as_ref().and_then(|tile| tile.region),
            Some(SpriteRegion {
                x: 1,
                y: 67,
                w: 64,
                h: 64
            })
        );

        let door = &map.object_group("Doors").expect("grouped doors").objects[0];
        assert_eq!(door.kind, "Door");
        assert_eq!(
            door.property("target").and_then(PropertyValue::as_str),
            Some("hall.tmx")
        );
        assert_eq!(door.property("spawn_x"), Some(&PropertyValue::Int(96)));
    }

    #[test]
    fn external_collection_tileset_resolves_images_relative_to_tsx() {
        let temp = TempDir::new().expect("tempdir");
        write_file(
            &temp.path().join("tilesets/items.tsx"),
            r#"<?xml version="1.0" encoding="UTF-8"?>
<tileset version="1.10" name="items" tilewidth="64" tileheight="64" tilecount="1" columns="0">
 <tile id="0">
  <image source="../graphics/stickers/sticker_1_64x64.png" width="64" height="64"/>
 </tile>
</tileset>
"#,
        );
        write_file(
            &temp.path().join("maps/shop.tmx"),
            r#"<map version="1.10" orientation="orthogonal" width="1" height="1" tilewidth="64" tileheight="64">
 <tileset firstgid="10" source="../tilesets/items.tsx"/>
 <layer name="Ground" width="1" height="1"><data encoding="csv">10</data></layer>
 <objectgroup name="Objects"><object id="1" gid="10" x="0" y="64"/></objectgroup>
</map>"#,
        );

        let map = load_tile_map(temp.path(), "maps/shop.tmx").expect("map");
        let image = map
            .tile_layer("Ground")
            .and_then(|layer| layer.image_at(0, 0))
            .expect("cell");
        assert_eq!(image.key, "graphics/stickers/sticker_1_64x64.png");
        assert_eq!(image.region, None);

        let sized_from_tileset = &map.object_group("Objects").expect("objects").objects[0];
        assert_eq!(
            (sized_from_tileset.y, sized_from_tileset.width, sized_from_tileset.height),
            (0.0, 64.0, 64.0)
        );
    }

    #[test]
    fn infinite_maps_are_rejected() {
        let temp = TempDir::new().expect("tempdir");
        write_file(
            &temp.path().join("maps/endless.tmx"),
            r#"<map version="1.10" orientation="orthogonal" width="1" height="1" tilewidth="64" tileheight="64" infinite="1"/>"#,
        );

        let error = load_tile_map(temp.path(), "maps/endless.tmx").expect_err("must fail");
        assert!(matches!(error, TileMapError::Infinite { .. }));
    }

    #[test]
    fn missing_or_malformed_files_report_the_path() {
        let temp = TempDir::new().expect("tempdir");
        let missing = load_tile_map(temp.path(), "maps/none.tmx").expect_err("missing");
        assert!(matches!(missing, TileMapError::Load { .. }));
        assert!(missing.to_string().contains("none.tmx"));

        write_file(&temp.path().join("maps/bad.tmx"), "<map>\n<layer></map>");
        let malformed = load_tile_map(temp.path(), "maps/bad.tmx").expect_err("malformed");
        assert!(matches!(malformed, TileMapError::Load { .. }));
    }

    #[test]
    fn keys_and_image_paths_must_stay_inside_the_assets_root() {
        let temp = TempDir::new().expect("tempdir");
        let bad_key = load_tile_map(temp.path(), "../maps/room.tmx").expect_err("bad key");
        assert!(matches!(bad_key, TileMapError::InvalidKey { .. }));

        write_file(
            &temp.path().join("maps/escape.tmx"),
            r#"<map version="1.10" orientation="orthogonal" width="1" height="1" tilewidth="64" tileheight="64">
 <tileset firstgid="1" name="x" tilewidth="64" tileheight="64" tilecount="1" columns="1">
  <image source="../../outside.png" width="64" height="64"/>
 </tileset>
 <layer name="Ground" width="1" height="1"><data encoding="csv">1</data></layer>
</map>"#,
        );
        let error = load_tile_map(temp.path(), "maps/escape.tmx").expect_err("must fail");
        assert!(matches!(error, TileMapError::ImagePath { .. }));
    }
}
