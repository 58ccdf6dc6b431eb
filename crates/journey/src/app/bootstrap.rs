use std::io;
use std::rc::Rc;

use engine::{discover_png_keys, resolve_app_paths, LoopConfig, Scene, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{self, AnimationFrames, DiskRoomLoader, GameplayScene, Session, SessionError};
use super::settings;
use super::title::TitleScene;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Paths(#[from] StartupError),
    #[error("discover player animation frames: {0}")]
    PlayerFrames(#[source] io::Error),
    #[error("discover stickers: {0}")]
    Stickers(#[source] io::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) title_scene: Box<dyn Scene>,
    pub(crate) gameplay_scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Journey Startup ===");

    let paths = resolve_app_paths()?;
    let settings = settings::load_or_init(&paths.config_path);
    info!(
        root = %paths.root.display(),
        width = settings.resolution[0],
        height = settings.resolution[1],
        fps = settings.fps,
        fullscreen = settings.fullscreen,
        "settings_loaded"
    );

    let frames =
        AnimationFrames::discover(&paths.assets_dir).map_err(BootstrapError::PlayerFrames)?;
    let sticker_keys = discover_png_keys(&paths.assets_dir, gameplay::STICKERS_DIR_KEY)
        .map_err(BootstrapError::Stickers)?;
    let session = Session::start(
        DiskRoomLoader::new(&paths.assets_dir),
        Rc::new(frames),
        &sticker_keys,
        gameplay::START_MAP_KEY,
    )?;

    let config = LoopConfig {
        window_width: settings.resolution[0],
        window_height: settings.resolution[1],
        fullscreen: settings.fullscreen,
        max_render_fps: settings.render_fps_cap(),
        asset_root: paths.assets_dir,
        ..LoopConfig::default()
    };

    Ok(AppWiring {
        config,
        title_scene: Box::new(TitleScene),
        gameplay_scene: Box::new(GameplayScene::new(session)),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
