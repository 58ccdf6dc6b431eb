use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use crate::app::{
    OverlayKind, Rect, RenderableKind, SceneWorld, ScreenAnchor, ScreenOverlay, SpriteRef,
    SpriteRegion, Vec2,
};
use crate::asset_keys::validate_asset_key;

use super::{camera_offset, depth_sorted_indices, parallax_offset, world_to_screen, Viewport};

const CLEAR_COLOR: [u8; 4] = [18, 20, 26, 255];
const PLACEHOLDER_COLOR: [u8; 4] = [220, 80, 200, 255];

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenRectPx {
    left: i32,
    top: i32,
    width: u32,
    height: u32,
}

impl ScreenRectPx {
    fn from_world(rect: &Rect, offset: Vec2) -> Self {
        let (left, top) = world_to_screen(rect.top_left(), offset);
        Self {
            left,
            top,
            width: rect.w.round().max(1.0) as u32,
            height: rect.h.round().max(1.0) as u32,
        }
    }
}

pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: HashSet<String>,
    draw_indices: Vec<usize>,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: HashMap::new(),
            warned_missing_sprite_keys: HashSet::new(),
            draw_indices: Vec::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub(crate) fn render_world(&mut self, world: &SceneWorld) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let viewport = self.viewport;
        let asset_root = self.asset_root.as_path();
        let sprite_cache = &mut self.sprite_cache;
        let warned = &mut self.warned_missing_sprite_keys;
        let draw_indices = &mut self.draw_indices;
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }

        let offset = camera_offset(world.camera().target, viewport);

        for layer in world.parallax_layers() {
            let Some(sprite) =
                resolve_cached_sprite(sprite_cache, warned, asset_root, &layer.sprite.key)
            else {
                continue;
            };
            let (left, top) = world_to_screen(Vec2::ZERO, parallax_offset(offset, layer.speed));
            let (width, height) = natural_size(sprite, layer.sprite.region);
            draw_sprite(
                frame,
                viewport,
                ScreenRectPx {
                    left,
                    top,
                    width,
                    height,
                },
                sprite,
                &layer.sprite,
                u8::MAX,
            );
        }

        depth_sorted_indices(world.entities(), draw_indices);
        for index in draw_indices.iter().copied() {
            let entity = &world.entities()[index];
            let dest = ScreenRectPx::from_world(&entity.rect, offset);
            if !intersects_viewport(dest, viewport) {
                continue;
            }
            match &entity.renderable.kind {
                RenderableKind::Hidden => {}
                RenderableKind::Solid(color) => fill_rect(frame, viewport, dest, *color, u8::MAX),
                RenderableKind::Sprite(sprite_ref) => {
                    match resolve_cached_sprite(sprite_cache, warned, asset_root, &sprite_ref.key)
                    {
                        Some(sprite) => {
                            draw_sprite(frame, viewport, dest, sprite, sprite_ref, u8::MAX)
                        }
                        None => fill_rect(frame, viewport, dest, PLACEHOLDER_COLOR, u8::MAX),
                    }
                }
            }
        }

        for overlay in world.overlays() {
            draw_overlay(frame, viewport, overlay, sprite_cache, warned, asset_root);
        }

        self.pixels.render()
    }
}

fn draw_overlay(
    frame: &mut [u8],
    viewport: Viewport,
    overlay: &ScreenOverlay,
    sprite_cache: &mut HashMap<String, Option<LoadedSprite>>,
    warned: &mut HashSet<String>,
    asset_root: &Path,
) {
    if overlay.alpha == 0 {
        return;
    }
    match &overlay.kind {
        OverlayKind::Solid(color) => {
            let size = overlay.size.unwrap_or((viewport.width, viewport.height));
            let dest = overlay_dest_rect(overlay.anchor, overlay.offset, size, viewport);
            fill_rect(frame, viewport, dest, *color, overlay.alpha);
        }
        OverlayKind::Sprite(sprite_ref) => {
            let Some(sprite) =
                resolve_cached_sprite(sprite_cache, warned, asset_root, &sprite_ref.key)
            else {
                return;
            };
            let size = overlay
                .size
                .unwrap_or_else(|| natural_size(sprite, sprite_ref.region));
            let dest = overlay_dest_rect(overlay.anchor, overlay.offset, size, viewport);
            draw_sprite(frame, viewport, dest, sprite, sprite_ref, overlay.alpha);
        }
    }
}

fn overlay_dest_rect(
    anchor: ScreenAnchor,
    offset: (i32, i32),
    size: (u32, u32),
    viewport: Viewport,
) -> ScreenRectPx {
    let (width, height) = size;
    let centered_left = viewport.width as i32 / 2 - width as i32 / 2 + offset.0;
    match anchor {
        ScreenAnchor::FullScreen => ScreenRectPx {
            left: 0,
            top: 0,
            width: viewport.width,
            height: viewport.height,
        },
        ScreenAnchor::Center => ScreenRectPx {
            left: centered_left,
            top: viewport.height as i32 / 2 - height as i32 / 2 + offset.1,
            width,
            height,
        },
        ScreenAnchor::TopCenter => ScreenRectPx {
            left: centered_left,
            top: offset.1,
            width,
            height,
        },
        ScreenAnchor::BottomCenter => ScreenRectPx {
            left: centered_left,
            top: viewport.height as i32 - height as i32 + offset.1,
            width,
            height,
        },
    }
}

fn intersects_viewport(rect: ScreenRectPx, viewport: Viewport) -> bool {
    rect.left < viewport.width as i32
        && rect.top < viewport.height as i32
        && rect.left + rect.width as i32 > 0
        && rect.top + rect.height as i32 > 0
}

fn natural_size(sprite: &LoadedSprite, region: Option<SpriteRegion>) -> (u32, u32) {
    let source = source_region(sprite, region);
    (source.w.max(1), source.h.max(1))
}

fn source_region(sprite: &LoadedSprite, region: Option<SpriteRegion>) -> SpriteRegion {
    let full = SpriteRegion {
        x: 0,
        y: 0,
        w: sprite.width,
        h: sprite.height,
    };
    let Some(region) = region else {
        return full;
    };
    if region.x >= sprite.width || region.y >= sprite.height {
        return full;
    }
    SpriteRegion {
        x: region.x,
        y: region.y,
        w: region.w.min(sprite.width - region.x),
        h: region.h.min(sprite.height - region.y),
    }
}

fn resolve_cached_sprite<'a>(
    cache: &'a mut HashMap<String, Option<LoadedSprite>>,
    warned_missing_sprite_keys: &mut HashSet<String>,
    asset_root: &Path,
    key: &str,
) -> Option<&'a LoadedSprite> {
    if !cache.contains_key(key) {
        let loaded = match validate_asset_key(key) {
            Ok(()) => {
                let path = asset_root.join(key);
                match load_sprite_rgba(&path) {
                    Ok(sprite) => Some(sprite),
                    Err(reason) => {
                        warn_sprite_load_once(
                            warned_missing_sprite_keys,
                            key,
                            Some(path.as_path()),
                            reason.as_str(),
                        );
                        None
                    }
                }
            }
            Err(error) => {
                let reason = format!("invalid_key:{error}");
                warn_sprite_load_once(warned_missing_sprite_keys, key, None, reason.as_str());
                None
            }
        };
        cache.insert(key.to_string(), loaded);
    }
    cache.get(key).and_then(Option::as_ref)
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(
    warned_keys: &mut HashSet<String>,
    key: &str,
    resolved_path: Option<&Path>,
    reason: &str,
) {
    if !warned_keys.insert(key.to_string()) {
        return;
    }
    let path_display = resolved_path
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<unresolved>".to_string());
    warn!(
        sprite_key = key,
        path = %path_display,
        reason = reason,
        "renderer_sprite_load_failed"
    );
}

fn luminance(rgb: [u8; 3]) -> u8 {
    let value = 0.3 * rgb[0] as f32 + 0.59 * rgb[1] as f32 + 0.11 * rgb[2] as f32;
    value.round().clamp(0.0, 255.0) as u8
}

fn blend_pixel_clipped(
    frame: &mut [u8],
    width: usize,
    x: i32,
    y: i32,
    color: [u8; 4],
    opacity: u8,
) {
    if x < 0 || y < 0 || x as usize >= width {
        return;
    }
    let Some(byte_offset) = (y as usize)
        .checked_mul(width)
        .and_then(|row| row.checked_add(x as usize))
        .and_then(|pixel| pixel.checked_mul(4))
    else {
        return;
    };
    let Some(dst) = frame.get_mut(byte_offset..byte_offset + 4) else {
        return;
    };
    let alpha = color[3] as u32 * opacity as u32 / 255;
    if alpha == 0 {
        return;
    }
    if alpha == 255 {
        dst[..3].copy_from_slice(&color[..3]);
        dst[3] = 255;
        return;
    }
    for channel in 0..3 {
        let src = color[channel] as u32;
        let existing = dst[channel] as u32;
        dst[channel] = ((src * alpha + existing * (255 - alpha)) / 255) as u8;
    }
    dst[3] = 255;
}

fn fill_rect(frame: &mut [u8], viewport: Viewport, dest: ScreenRectPx, color: [u8; 4], opacity: u8) {
    let left = dest.left.max(0);
    let top = dest.top.max(0);
    let right = (dest.left + dest.width as i32).min(viewport.width as i32);
    let bottom = (dest.top + dest.height as i32).min(viewport.height as i32);
    for y in top..bottom {
        for x in left..right {
            blend_pixel_clipped(frame, viewport.width as usize, x, y, color, opacity);
        }
    }
}

/// Nearest-neighbour blit of `sprite` (or its region) stretched to `dest`.
fn draw_sprite(
    frame: &mut [u8],
    viewport: Viewport,
    dest: ScreenRectPx,
    sprite: &LoadedSprite,
    sprite_ref: &SpriteRef,
    opacity: u8,
) {
    if sprite.width == 0 || sprite.height == 0 || dest.width == 0 || dest.height == 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let source = source_region(sprite, sprite_ref.region);
    let draw_left = dest.left.max(0);
    let draw_top = dest.top.max(0);
    let draw_right = (dest.left + dest.width as i32).min(viewport.width as i32);
    let draw_bottom = (dest.top + dest.height as i32).min(viewport.height as i32);
    if draw_left >= draw_right || draw_top >= draw_bottom {
        return;
    }

    let x_scale = source.w as f32 / dest.width as f32;
    let y_scale = source.h as f32 / dest.height as f32;
    let sprite_width = sprite.width as usize;

    for out_y in draw_top..draw_bottom {
        let dy = (out_y - dest.top) as f32;
        let src_y = ((dy * y_scale).floor() as u32).min(source.h - 1) + source.y;
        let row_offset = src_y as usize * sprite_width * 4;

        for out_x in draw_left..draw_right {
            let dx = (out_x - dest.left) as f32;
            let src_x = ((dx * x_scale).floor() as u32).min(source.w - 1) + source.x;
            let src_offset = row_offset + src_x as usize * 4;
            let mut color = [
                sprite.rgba[src_offset],
                sprite.rgba[src_offset + 1],
                sprite.rgba[src_offset + 2],
                sprite.rgba[src_offset + 3],
            ];
            if sprite_ref.grayscale {
                let gray = luminance([color[0], color[1], color[2]]);
                color = [gray, gray, gray, color[3]];
            }
            blend_pixel_clipped(frame, viewport.width as usize, out_x, out_y, color, opacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 4,
        height: 4,
    };

    fn blank_frame(viewport: Viewport) -> Vec<u8> {
        vec![0; viewport.width as usize * viewport.height as usize * 4]
    }

    fn pixel(frame: &[u8], viewport: Viewport, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * viewport.width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    fn two_by_two_sprite() -> LoadedSprite {
        LoadedSprite {
            width: 2,
            height: 2,
            rgba: vec![
                255, 0, 0, 255, //
                0, 255, 0, 255, //
                0, 0, 255, 255, //
                10, 10, 10, 0,
            ],
        }
    }

    #[test]
    fn overlay_anchors_place_rect_relative_to_viewport() {
        let viewport = Viewport {
            width: 800,
            height: 600,
        };
        let center = overlay_dest_rect(ScreenAnchor::Center, (10, -20), (200, 100), viewport);
        assert_eq!((center.left, center.top), (310, 230));

        let top = overlay_dest_rect(ScreenAnchor::TopCenter, (0, 16), (200, 100), viewport);
        assert_eq!((top.left, top.top), (300, 16));

        let bottom = overlay_dest_rect(ScreenAnchor::BottomCenter, (0, -30), (200, 100), viewport);
        assert_eq!((bottom.left, bottom.top), (300, 470));

        let full = overlay_dest_rect(ScreenAnchor::FullScreen, (5, 5), (1, 1), viewport);
        assert_eq!((full.width, full.height), (800, 600));
    }

    #[test]
    fn sprite_is_stretched_to_destination_rect() {
        let mut frame = blank_frame(VIEWPORT);
        let dest = ScreenRectPx {
            left: 0,
            top: 0,
            width: 4,
            height: 4,
        };
        draw_sprite(
            &mut frame,
            VIEWPORT,
            dest,
            &two_by_two_sprite(),
            &SpriteRef::new("test.png"),
            u8::MAX,
        );

        assert_eq!(pixel(&frame, VIEWPORT, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 2, 0), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 0, 3), [0, 0, 255, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 3, 3), [0, 0, 0, 0]);
    }

    #[test]
    fn sprite_region_selects_sheet_cell() {
        let mut frame = blank_frame(VIEWPORT);
        let sprite_ref = SpriteRef::new("sheet.png").with_region(Some(SpriteRegion {
            x: 1,
            y: 0,
            w: 1,
            h: 1,
        }));
        let dest = ScreenRectPx {
            left: 0,
            top: 0,
            width: 2,
            height: 2,
        };
        draw_sprite(
            &mut frame,
            VIEWPORT,
            dest,
            &two_by_two_sprite(),
            &sprite_ref,
            u8::MAX,
        );

        assert_eq!(pixel(&frame, VIEWPORT, 0, 0), [0, 255, 0, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 1, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn grayscale_uses_luminance_weights() {
        let mut frame = blank_frame(VIEWPORT);
        let dest = ScreenRectPx {
            left: 0,
            top: 0,
            width: 2,
            height: 2,
        };
        draw_sprite(
            &mut frame,
            VIEWPORT,
            dest,
            &two_by_two_sprite(),
            &SpriteRef::new("test.png").with_grayscale(true),
            u8::MAX,
        );

        assert_eq!(pixel(&frame, VIEWPORT, 0, 0), [77, 77, 77, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 1, 0), [150, 150, 150, 255]);
    }

    #[test]
    fn fill_rect_blends_and_clips() {
        let mut frame = blank_frame(VIEWPORT);
        let dest = ScreenRectPx {
            left: -2,
            top: 3,
            width: 10,
            height: 10,
        };
        fill_rect(&mut frame, VIEWPORT, dest, [200, 100, 0, 255], 128);

        assert_eq!(pixel(&frame, VIEWPORT, 0, 3), [100, 50, 0, 255]);
        assert_eq!(pixel(&frame, VIEWPORT, 0, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn offscreen_rect_is_culled() {
        let off = ScreenRectPx {
            left: 4,
            top: 0,
            width: 2,
            height: 2,
        };
        let partially = ScreenRectPx {
            left: -1,
            top: -1,
            width: 2,
            height: 2,
        };
        assert!(!intersects_viewport(off, VIEWPORT));
        assert!(intersects_viewport(partially, VIEWPORT));
    }

    #[test]
    fn sprite_cache_loads_png_and_remembers_missing_keys() {
        let temp = TempDir::new().expect("tempdir");
        let dir = temp.path().join("graphics");
        std::fs::create_dir_all(&dir).expect("mkdir");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]))
            .save(dir.join("rock.png"))
            .expect("save png");

        let mut cache = HashMap::new();
        let mut warned = HashSet::new();
        let sprite = resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "graphics/rock.png")
            .expect("sprite");
        assert_eq!((sprite.width, sprite.height), (3, 2));

        assert!(
            resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "graphics/none.png")
                .is_none()
        );
        assert!(
            resolve_cached_sprite(&mut cache, &mut warned, temp.path(), "../escape.png").is_none()
        );
        assert_eq!(warned.len(), 2);
        assert_eq!(cache.len(), 3);
    }
}
