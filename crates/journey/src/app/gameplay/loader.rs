use std::path::PathBuf;
use std::sync::Arc;

use engine::{MapCache, TileMap, TileMapError};

/// Source of room maps, keyed by asset key.
pub(crate) trait RoomLoader {
    fn load_room(&mut self, map_key: &str) -> Result<Arc<TileMap>, TileMapError>;
}

/// Reads TMX files under the assets directory, parsing each at most once.
#[derive(Debug)]
pub(crate) struct DiskRoomLoader {
    cache: MapCache,
}

impl DiskRoomLoader {
    pub(crate) fn new(assets_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache: MapCache::new(assets_dir),
        }
    }
}

impl RoomLoader for DiskRoomLoader {
    fn load_room(&mut self, map_key: &str) -> Result<Arc<TileMap>, TileMapError> {
        self.cache.get_or_load(map_key)
    }
}
