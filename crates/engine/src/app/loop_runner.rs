use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, WindowBuilder};

use super::input::ActionStates;
use super::scene::SceneMachine;
use super::{InputAction, InputSnapshot, Renderer, Scene, SceneCommand, SceneKey};

const STATS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub fullscreen: bool,
    pub ticks_per_second: u32,
    /// Longer frames are treated as this long, so a stall never replays
    /// seconds of simulation.
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    /// `None` presents as fast as the event loop redraws.
    pub max_render_fps: Option<u32>,
    pub asset_root: PathBuf,
    pub initial_scene: SceneKey,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Journey".to_string(),
            window_width: 1280,
            window_height: 720,
            fullscreen: false,
            ticks_per_second: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_render_fps: None,
            asset_root: PathBuf::from("assets"),
            initial_scene: SceneKey::Title,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and drives the title and gameplay scenes until one of
/// them quits or the window closes.
pub fn run_app(
    config: LoopConfig,
    title_scene: Box<dyn Scene>,
    gameplay_scene: Box<dyn Scene>,
) -> Result<(), AppError> {
    let mut scenes = SceneMachine::new(title_scene, gameplay_scene, config.initial_scene);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let mut window_builder = WindowBuilder::new()
        .with_title(config.window_title.clone())
        .with_inner_size(LogicalSize::new(
            config.window_width as f64,
            config.window_height as f64,
        ));
    if config.fullscreen {
        window_builder = window_builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = Arc::new(
        window_builder
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), config.asset_root.clone())
        .map_err(AppError::CreateRenderer)?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut pacer = FramePacer::new(&config);
    let size = window.inner_size();
    let mut keyboard = KeyboardState::new(size.width, size.height);
    let mut stats = FrameStats::starting_at(Instant::now());

    scenes.load_active();
    scenes.apply_pending_active();
    info!(
        scene = ?scenes.active_scene(),
        entity_count = scenes.active_world().entity_count(),
        tick_seconds = pacer.tick_seconds(),
        render_fps_cap = config.max_render_fps.unwrap_or(0),
        fullscreen = config.fullscreen,
        "scene_loaded"
    );

    let mut last_frame = Instant::now();
    let mut last_present = Instant::now();
    let mut applied_title: Option<String> = None;

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    keyboard.quit_requested = true;
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    let size = window.inner_size();
                    keyboard.window_size = (size.width, size.height);
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                    }
                }
                WindowEvent::Focused(false) => keyboard.held.clear(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if let Some(action) = action_for_key(event.physical_key) {
                        keyboard.apply(action, event.state);
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let budget = pacer.advance(now.saturating_duration_since(last_frame));
                    last_frame = now;

                    for _ in 0..budget.ticks {
                        let input = keyboard.take_snapshot();
                        let command = scenes.update_active(pacer.tick_seconds(), &input);
                        scenes.apply_pending_active();
                        match command {
                            SceneCommand::None => {}
                            SceneCommand::SwitchTo(next) => {
                                if scenes.switch_to(next) {
                                    scenes.apply_pending_active();
                                    info!(
                                        scene = ?scenes.active_scene(),
                                        entity_count = scenes.active_world().entity_count(),
                                        "scene_switched"
                                    );
                                }
                            }
                            SceneCommand::Quit => {
                                info!(reason = "scene_command", "shutdown_requested");
                                window_target.exit();
                                return;
                            }
                        }
                    }
                    if budget.dropped > Duration::ZERO {
                        warn!(
                            dropped_ms = budget.dropped.as_millis() as u64,
                            max_ticks_per_frame = pacer.max_ticks,
                            "sim_backlog_dropped"
                        );
                    }

                    let delay = pacer.present_delay(last_present.elapsed());
                    if delay > Duration::ZERO {
                        thread::sleep(delay);
                    }
                    scenes.render_active();
                    if let Err(error) = renderer.render_world(scenes.active_world()) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    last_present = Instant::now();

                    let title = scenes.window_title_active();
                    if title != applied_title {
                        window.set_title(title.as_deref().unwrap_or(&config.window_title));
                        applied_title = title;
                    }

                    stats.record_frame(budget);
                    if let Some(report) = stats.take_report(now) {
                        info!(
                            fps = report.fps,
                            tps = report.tps,
                            clamped_frames = report.clamped_frames,
                            scene = ?scenes.active_scene(),
                            entity_count = scenes.active_world().entity_count(),
                            "loop_stats"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => {
                scenes.shutdown_all();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

/// Ticks owed for one frame, plus the backlog thrown away once the
/// per-frame tick cap was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TickBudget {
    ticks: u32,
    dropped: Duration,
}

/// Fixed-timestep bookkeeping: turns wall-clock frame time into whole
/// simulation ticks and paces presents under an optional fps cap.
#[derive(Debug)]
struct FramePacer {
    tick: Duration,
    max_frame_delta: Duration,
    max_ticks: u32,
    present_interval: Option<Duration>,
    backlog: Duration,
}

impl FramePacer {
    fn new(config: &LoopConfig) -> Self {
        let ticks_per_second = config.ticks_per_second.max(1);
        Self {
            tick: Duration::from_secs_f64(1.0 / f64::from(ticks_per_second)),
            max_frame_delta: config.max_frame_delta,
            max_ticks: config.max_ticks_per_frame.max(1),
            present_interval: config
                .max_render_fps
                .filter(|fps| *fps > 0)
                .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps))),
            backlog: Duration::ZERO,
        }
    }

    fn tick_seconds(&self) -> f32 {
        self.tick.as_secs_f32()
    }

    fn advance(&mut self, frame_time: Duration) -> TickBudget {
        self.backlog = self
            .backlog
            .saturating_add(frame_time.min(self.max_frame_delta));
        let mut ticks = 0;
        while self.backlog >= self.tick && ticks < self.max_ticks {
            self.backlog -= self.tick;
            ticks += 1;
        }
        let dropped = if self.backlog >= self.tick {
            std::mem::take(&mut self.backlog)
        } else {
            Duration::ZERO
        };
        TickBudget { ticks, dropped }
    }

    fn present_delay(&self, since_last_present: Duration) -> Duration {
        self.present_interval
            .map(|interval| interval.saturating_sub(since_last_present))
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct StatsReport {
    fps: f32,
    tps: f32,
    clamped_frames: u32,
}

/// Frame and tick counts over a rolling [`STATS_INTERVAL`] window.
#[derive(Debug)]
struct FrameStats {
    window_start: Instant,
    frames: u32,
    ticks: u32,
    clamped_frames: u32,
}

impl FrameStats {
    fn starting_at(window_start: Instant) -> Self {
        Self {
            window_start,
            frames: 0,
            ticks: 0,
            clamped_frames: 0,
        }
    }

    fn record_frame(&mut self, budget: TickBudget) {
        self.frames += 1;
        self.ticks += budget.ticks;
        if budget.dropped > Duration::ZERO {
            self.clamped_frames += 1;
        }
    }

    fn take_report(&mut self, now: Instant) -> Option<StatsReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < STATS_INTERVAL {
            return None;
        }
        let seconds = elapsed.as_secs_f32();
        let report = StatsReport {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            clamped_frames: self.clamped_frames,
        };
        *self = Self::starting_at(now);
        Some(report)
    }
}

/// Held keys plus press edges not yet handed to a tick.
#[derive(Debug, Default)]
struct KeyboardState {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
    window_size: (u32, u32),
}

impl KeyboardState {
    fn new(width: u32, height: u32) -> Self {
        Self {
            window_size: (width, height),
            ..Self::default()
        }
    }

    /// OS key repeat arrives as repeated presses; only the first one while
    /// the key is held counts as an edge.
    fn apply(&mut self, action: InputAction, state: ElementState) {
        let down = state == ElementState::Pressed;
        if down && !self.held.is_down(action) {
            self.pressed.set(action, true);
        }
        self.held.set(action, down);
    }

    fn take_snapshot(&mut self) -> InputSnapshot {
        let (width, height) = self.window_size;
        let snapshot =
            InputSnapshot::new(self.quit_requested, self.held, self.pressed, width, height);
        self.pressed.clear();
        snapshot
    }
}

fn action_for_key(key: PhysicalKey) -> Option<InputAction> {
    let PhysicalKey::Code(code) = key else {
        return None;
    };
    Some(match code {
        KeyCode::KeyW | KeyCode::ArrowUp => InputAction::MoveUp,
        KeyCode::KeyS | KeyCode::ArrowDown => InputAction::MoveDown,
        KeyCode::KeyA | KeyCode::ArrowLeft => InputAction::MoveLeft,
        KeyCode::KeyD | KeyCode::ArrowRight => InputAction::MoveRight,
        KeyCode::KeyE => InputAction::Interact,
        KeyCode::KeyI => InputAction::ToggleInventory,
        KeyCode::Escape => InputAction::ToggleMenu,
        KeyCode::KeyR => InputAction::Reload,
        KeyCode::Enter | KeyCode::NumpadEnter | KeyCode::Space => InputAction::Confirm,
        KeyCode::PageUp | KeyCode::BracketLeft => InputAction::PagePrev,
        KeyCode::PageDown | KeyCode::BracketRight => InputAction::PageNext,
        _ => return None,
    })
}
