mod atomic_io;
mod cache;
mod discovery;
mod tilemap;
mod tmx;

pub use atomic_io::write_text_atomic;
pub use cache::MapCache;
pub use discovery::discover_png_keys;
pub use tilemap::{
    MapObject, ObjectGroup, Properties, PropertyValue, TileImage, TileLayer, TileMap,
};
pub use tmx::{load_tile_map, TileMapError};
