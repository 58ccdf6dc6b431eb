use std::collections::HashMap;

use engine::{OverlayKind, ScreenAnchor, ScreenOverlay, SpriteRef};

pub(crate) const ITEMS_PER_PAGE: usize = 8;
pub(crate) const BOOK_SPRITE_KEY: &str = "graphics/ui/inventory_book.png";
pub(crate) const ARROW_PREV_SPRITE_KEY: &str = "graphics/ui/arrow_book_left.png";
pub(crate) const ARROW_NEXT_SPRITE_KEY: &str = "graphics/ui/arrow_book_right.png";
const BOOK_SIZE: (u32, u32) = (600, 500);
const STICKER_SIZE: u32 = 96;
const ARROW_SIZE: u32 = 32;
const ARROW_MARGIN: i32 = 20;
/// Top-left of each sticker slot, relative to the book's top-left corner.
const STICKER_SLOTS: [(i32, i32); ITEMS_PER_PAGE] = [
    (60, 60),
    (340, 60),
    (160, 140),
    (450, 130),
    (60, 260),
    (340, 260),
    (150, 340),
    (450, 340),
];

/// Strips a trailing `_<digits>x<digits>` size suffix: `sticker_1_64x64`
/// becomes `sticker_1`.
pub(crate) fn normalize_item_id(raw: &str) -> &str {
    let Some((base, suffix)) = raw.rsplit_once('_') else {
        return raw;
    };
    let Some((width, height)) = suffix.split_once('x') else {
        return raw;
    };
    let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if is_number(width) && is_number(height) {
        base
    } else {
        raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InventoryItem {
    pub(crate) id: String,
    pub(crate) sprite_key: String,
    pub(crate) picked: bool,
}

impl InventoryItem {
    /// Full colour once picked, desaturated until then.
    pub(crate) fn display_sprite(&self) -> SpriteRef {
        SpriteRef::new(self.sprite_key.clone()).with_grayscale(!self.picked)
    }
}

/// Session-wide record of every collectible seen, keyed by normalized id
/// and kept in registration order.
#[derive(Debug, Clone, Default)]
pub(crate) struct Inventory {
    items: HashMap<String, InventoryItem>,
    order: Vec<String>,
    is_open: bool,
    current_page: usize,
}

impl Inventory {
    /// Adds a grey slot for `raw_id`. Returns false if the id was already
    /// known; an existing slot is never reset.
    pub(crate) fn register(&mut self, raw_id: &str, sprite_key: &str) -> bool {
        let id = normalize_item_id(raw_id);
        if self.items.contains_key(id) {
            return false;
        }
        self.items.insert(
            id.to_string(),
            InventoryItem {
                id: id.to_string(),
                sprite_key: sprite_key.to_string(),
                picked: false,
            },
        );
        self.order.push(id.to_string());
        true
    }

    /// Marks the item picked, registering it first if needed.
    pub(crate) fn pickup(&mut self, raw_id: &str, sprite_key: &str) {
        self.register(raw_id, sprite_key);
        if let Some(item) = self.items.get_mut(normalize_item_id(raw_id)) {
            item.picked = true;
        }
    }

    pub(crate) fn is_picked(&self, raw_id: &str) -> bool {
        self.get(raw_id).is_some_and(|item| item.picked)
    }

    pub(crate) fn get(&self, raw_id: &str) -> Option<&InventoryItem> {
        self.items.get(normalize_item_id(raw_id))
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn picked_count(&self) -> usize {
        self.items.values().filter(|item| item.picked).count()
    }

    pub(crate) fn num_pages(&self) -> usize {
        self.order.len().div_ceil(ITEMS_PER_PAGE)
    }

    pub(crate) fn current_page(&self) -> usize {
        self.current_page
    }

    pub(crate) fn next_page(&mut self) {
        if self.current_page + 1 < self.num_pages() {
            self.current_page += 1;
        }
    }

    pub(crate) fn prev_page(&mut self) {
        self.current_page = self.current_page.saturating_sub(1);
    }

    pub(crate) fn is_open(&self) -> bool {
        self.is_open
    }

    pub(crate) fn toggle(&mut self) -> bool {
        self.is_open = !self.is_open;
        self.is_open
    }

    pub(crate) fn page_items(&self) -> impl Iterator<Item = &InventoryItem> + '_ {
        self.order
            .iter()
            .skip(self.current_page * ITEMS_PER_PAGE)
            .take(ITEMS_PER_PAGE)
            .filter_map(|id| self.items.get(id))
    }

    /// The open book with the current page's stickers, centred on screen.
    pub(crate) fn overlays(&self) -> Vec<ScreenOverlay> {
        if !self.is_open {
            return Vec::new();
        }

        let mut overlays = vec![ScreenOverlay::new(
            OverlayKind::Sprite(SpriteRef::new(BOOK_SPRITE_KEY)),
            ScreenAnchor::Center,
        )
        .with_size(BOOK_SIZE)];

        let book_left = -(BOOK_SIZE.0 as i32) / 2;
        let book_top = -(BOOK_SIZE.1 as i32) / 2;
        let half_sticker = STICKER_SIZE as i32 / 2;
        for (item, (slot_x, slot_y)) in self.page_items().zip(STICKER_SLOTS) {
            overlays.push(
                ScreenOverlay::new(
                    OverlayKind::Sprite(item.display_sprite()),
                    ScreenAnchor::Center,
                )
                .with_offset((
                    book_left + slot_x + half_sticker,
                    book_top + slot_y + half_sticker,
                ))
                .with_size((STICKER_SIZE, STICKER_SIZE)),
            );
        }

        if self.num_pages() > 1 {
            let arrow_x = book_left.abs() - ARROW_MARGIN - ARROW_SIZE as i32 / 2;
            let arrow_y = book_top.abs() - ARROW_MARGIN - ARROW_SIZE as i32 / 2;
            for (key, x) in [
                (ARROW_PREV_SPRITE_KEY, -arrow_x),
                (ARROW_NEXT_SPRITE_KEY, arrow_x),
            ] {
                overlays.push(
                    ScreenOverlay::new(OverlayKind::Sprite(SpriteRef::new(key)), ScreenAnchor::Center)
                        .with_offset((x, arrow_y))
                        .with_size((ARROW_SIZE, ARROW_SIZE)),
                );
            }
        }
        overlays
    }
}
