//! Room exploration: the player walks tile maps, picks up stickers and moves
//! between rooms through doors.

mod collision;
mod doors;
mod inventory;
mod items;
mod loader;
mod notifier;
mod player;
mod reach;
mod room;
mod scene_impl;
mod session;
mod transition;


pub(crate) use loader::DiskRoomLoader;
pub(crate) use player::AnimationFrames;
pub(crate) use scene_impl::GameplayScene;
pub(crate) use session::{Session, SessionError};

/// World units per map tile.
pub(crate) const TILE_SIZE: f32 = 64.0;
pub(crate) const START_MAP_KEY: &str = "maps/corridor.tmx";
pub(crate) const STICKERS_DIR_KEY: &str = "graphics/stickers";

/// File name of an asset key without its extension.
pub(crate) fn asset_stem(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or(key);
    file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name)
}
