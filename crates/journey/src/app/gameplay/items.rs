use engine::{Rect, SpriteRef};

use super::inventory::{normalize_item_id, Inventory};

/// Pickup needs overlap with the player's visual rect and centres this close.
pub(crate) const PICKUP_RADIUS: f32 = 100.0;

/// A collectible placed in a room's map.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CollectibleSpawn {
    /// Image file stem, possibly with a size suffix.
    pub(crate) raw_id: String,
    pub(crate) rect: Rect,
    pub(crate) sprite: SpriteRef,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ActiveItem {
    /// Stable within one room build.
    pub(crate) instance: u32,
    pub(crate) id: String,
    pub(crate) rect: Rect,
    pub(crate) sprite: SpriteRef,
}

/// Collectibles whose inventory entry is not yet picked.
pub(crate) fn spawn_items(spawns: &[CollectibleSpawn], inventory: &Inventory) -> Vec<ActiveItem> {
    spawns
        .iter()
        .enumerate()
        .filter(|(_, spawn)| !inventory.is_picked(&spawn.raw_id))
        .map(|(index, spawn)| ActiveItem {
            instance: index as u32,
            id: normalize_item_id(&spawn.raw_id).to_string(),
            rect: spawn.rect,
            sprite: spawn.sprite.clone(),
        })
        .collect()
}

/// Removes and returns the items the player picks up this tick, marking each
/// one picked in the inventory.
pub(crate) fn check_pickups(
    player_visual: Rect,
    items: &mut Vec<ActiveItem>,
    inventory: &mut Inventory,
) -> Vec<ActiveItem> {
    let player_center = player_visual.center();
    let (picked, remaining): (Vec<_>, Vec<_>) = items.drain(..).partition(|item| {
        item.rect.intersects(&player_visual)
            && item.rect.center().distance(player_center) <= PICKUP_RADIUS
    });
    *items = remaining;
    for item in &picked {
        inventory.pickup(&item.id, &item.sprite.key);
    }
    picked
}
