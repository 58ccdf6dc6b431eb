use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use super::tilemap::TileMap;
use super::tmx::{load_tile_map, TileMapError};

/// Parsed maps keyed by asset key. Each file is read at most once until
/// [`MapCache::clear`].
#[derive(Debug)]
pub struct MapCache {
    assets_dir: PathBuf,
    maps: HashMap<String, Arc<TileMap>>,
}

impl MapCache {
    pub fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            maps: HashMap::new(),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    pub fn get_or_load(&mut self, key: &str) -> Result<Arc<TileMap>, TileMapError> {
        if let Some(map) = self.maps.get(key) {
            return Ok(Arc::clone(map));
        }

        let map = Arc::new(load_tile_map(&self.assets_dir, key)?);
        info!(
            map = key,
            width = map.width,
            height = map.height,
            tile_layers = map.tile_layers.len(),
            object_groups = map.object_groups.len(),
            "map_loaded"
        );
        self.maps.insert(key.to_string(), Arc::clone(&map));
        Ok(map)
    }

    pub fn clear(&mut self) {
        self.maps.clear();
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}
