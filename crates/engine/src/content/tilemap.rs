use std::collections::BTreeMap;

use crate::app::{Rect, SpriteRegion};

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view; string values that parse as numbers are accepted too,
    /// since map editors often leave custom properties untyped.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(value) => Some(*value as f64),
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::String(value) => value.trim().parse().ok(),
            PropertyValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(value) => Some(*value),
            PropertyValue::String(value) => match value.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

pub type Properties = BTreeMap<String, PropertyValue>;

/// Image for one tile: an asset key plus the cell inside a sheet, if the
/// tileset is a single image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub key: String,
    pub region: Option<SpriteRegion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    pub properties: Properties,
    cells: Vec<Option<TileImage>>,
}

impl TileLayer {
    pub(crate) fn new(
        name: String,
        width: u32,
        height: u32,
        visible: bool,
        properties: Properties,
        cells: Vec<Option<TileImage>>,
    ) -> Self {
        Self {
            name,
            width,
            height,
            visible,
            properties,
            cells,
        }
    }

    /// `None` for empty cells and out-of-range coordinates.
    pub fn image_at(&self, col: u32, row: u32) -> Option<&TileImage> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let index = row as usize * self.width as usize + col as usize;
        self.cells.get(index).and_then(Option::as_ref)
    }

    /// Non-empty cells in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (u32, u32, &TileImage)> + '_ {
        let width = self.width.max(1);
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            cell.as_ref()
                .map(|image| (index as u32 % width, index as u32 / width, image))
        })
    }

    pub fn bool_property(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(PropertyValue::as_bool)
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Image of a tile object.
    pub tile: Option<TileImage>,
    pub properties: Properties,
}

impl MapObject {
    /// Bounds with a top-left origin. Tile objects are stored that way too.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectGroup {
    pub name: String,
    pub properties: Properties,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileMap {
    pub key: String,
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub properties: Properties,
    pub tile_layers: Vec<TileLayer>,
    pub object_groups: Vec<ObjectGroup>,
}

impl TileMap {
    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|layer| layer.name == name)
    }

    pub fn object_group(&self, name: &str) -> Option<&ObjectGroup> {
        self.object_groups.iter().find(|group| group.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn pixel_width(&self) -> u32 {
        self.width.saturating_mul(self.tile_width)
    }

    pub fn pixel_height(&self) -> u32 {
        self.height.saturating_mul(self.tile_height)
    }

    /// File stem of the map key, used as the room name.
    pub fn stem(&self) -> &str {
        let file_name = self.key.rsplit('/').next().unwrap_or(&self.key);
        file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_lookup_skips_empty_and_out_of_range_cells() {
        let grass = TileImage {
            key: "graphics/tilesets/terrain.png".to_string(),
            region: Some(SpriteRegion {
                x: 0,
                y: 0,
                w: 64,
                h: 64,
            }),
        };
        let rock = TileImage {
            key: "graphics/objects/rock.png".to_string(),
            region: None,
        };
        let layer = TileLayer::new(
            "Ground".to_string(),
            2,
            2,
            true,
            Properties::new(),
            vec![Some(grass.clone()), None, None, Some(rock.clone())],
        );

        assert_eq!(layer.image_at(0, 0), Some(&grass));
        assert_eq!(layer.image_at(1, 0), None);
        assert_eq!(layer.image_at(1, 1), Some(&rock));
        assert_eq!(layer.image_at(2, 0), None);
        assert_eq!(
            layer.tiles().collect::<Vec<_>>(),
            vec![(0, 0, &grass), (1, 1, &rock)]
        );
    }

    #[test]
    fn property_views_accept_untyped_strings() {
        assert_eq!(PropertyValue::String("12".to_string()).as_f64(), Some(12.0));
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::String("true".to_string()).as_bool(), Some(true));
        assert_eq!(PropertyValue::Float(1.0).as_bool(), None);
    }

    #[test]
    fn stem_strips_directory_and_extension() {
        let map = TileMap {
            key: "maps/forest_gate.tmx".to_string(),
            width: 0,
            height: 0,
            tile_width: 64,
            tile_height: 64,
            properties: Properties::new(),
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
        };
        assert_eq!(map.stem(), "forest_gate");
    }
}
