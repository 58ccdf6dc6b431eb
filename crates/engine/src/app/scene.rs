use std::ops::{Add, AddAssign, Mul, Sub};

use super::input::{ActionStates, InputAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SceneKey {
    Title,
    Gameplay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    SwitchTo(SceneKey),
    Quit,
}

/// Input state for one fixed tick. `is_down` reports held keys, `was_pressed`
/// reports keys that went down since the previous tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    held: ActionStates,
    pressed: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        held: ActionStates,
        pressed: ActionStates,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            held,
            pressed,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.held.is_down(action)
    }

    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed.is_down(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.held.set(action, is_down);
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.held.set(action, true);
        self.pressed.set(action, true);
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length_squared(self) -> f32 {
        self.x * self.x + self.y * self.y
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    pub fn normalized_or_zero(self) -> Vec2 {
        let length = self.length();
        if length > f32::EPSILON {
            Vec2::new(self.x / length, self.y / length)
        } else {
            Vec2::ZERO
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// Axis-aligned rectangle in world pixels, y growing downward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(center: Vec2, w: f32, h: f32) -> Self {
        Self::new(center.x - w * 0.5, center.y - h * 0.5, w, h)
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn top_left(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn set_left(&mut self, left: f32) {
        self.x = left;
    }

    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.w;
    }

    pub fn set_top(&mut self, top: f32) {
        self.y = top;
    }

    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.h;
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.w * 0.5;
        self.y = center.y - self.h * 0.5;
    }

    /// Grows (or shrinks, for negative deltas) around the current center.
    pub fn inflate(&self, dw: f32, dh: f32) -> Rect {
        let w = (self.w + dw).max(0.0);
        let h = (self.h + dh).max(0.0);
        Rect::from_center(self.center(), w, h)
    }

    /// Strict overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    pub fn translated(&self, delta: Vec2) -> Rect {
        Rect::new(self.x + delta.x, self.y + delta.y, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Camera2D {
    pub target: Vec2,
}

/// Sub-rectangle of a sprite sheet, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRef {
    pub key: String,
    pub region: Option<SpriteRegion>,
    pub grayscale: bool,
}

impl SpriteRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            region: None,
            grayscale: false,
        }
    }

    pub fn with_region(mut self, region: Option<SpriteRegion>) -> Self {
        self.region = region;
        self
    }

    pub fn with_grayscale(mut self, grayscale: bool) -> Self {
        self.grayscale = grayscale;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderableKind {
    Hidden,
    Solid([u8; 4]),
    Sprite(SpriteRef),
}

/// Ground sprites always draw beneath object sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DrawLayer {
    Ground,
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderableDesc {
    pub kind: RenderableKind,
    pub layer: DrawLayer,
    pub debug_name: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxLayer {
    pub sprite: SpriteRef,
    pub speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenAnchor {
    FullScreen,
    Center,
    TopCenter,
    BottomCenter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayKind {
    Sprite(SpriteRef),
    Solid([u8; 4]),
}

/// Screen-space element drawn after the world, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenOverlay {
    pub kind: OverlayKind,
    pub anchor: ScreenAnchor,
    pub offset: (i32, i32),
    pub size: Option<(u32, u32)>,
    pub alpha: u8,
}

impl ScreenOverlay {
    pub fn new(kind: OverlayKind, anchor: ScreenAnchor) -> Self {
        Self {
            kind,
            anchor,
            offset: (0, 0),
            size: None,
            alpha: u8::MAX,
        }
    }

    pub fn with_offset(mut self, offset: (i32, i32)) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_size(mut self, size: (u32, u32)) -> Self {
        self.size = Some(size);
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub rect: Rect,
    pub renderable: RenderableDesc,
    applied_spawn_order: u64,
}

impl Entity {
    pub fn applied_spawn_order(&self) -> u64 {
        self.applied_spawn_order
    }
}

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    allocator: EntityIdAllocator,
    entities: Vec<Entity>,
    pending_spawns: Vec<Entity>,
    pending_despawns: Vec<EntityId>,
    next_applied_spawn_order: u64,
    camera: Camera2D,
    parallax_layers: Vec<ParallaxLayer>,
    overlays: Vec<ScreenOverlay>,
}

impl SceneWorld {
    pub fn spawn(&mut self, rect: Rect, renderable: RenderableDesc) -> EntityId {
        let id = self.allocator.allocate();
        self.pending_spawns.push(Entity {
            id,
            rect,
            renderable,
            applied_spawn_order: 0,
        });
        id
    }

    pub fn despawn(&mut self, id: EntityId) -> bool {
        let exists_now = self.entities.iter().any(|entity| entity.id == id);
        let pending_spawn = self.pending_spawns.iter().any(|entity| entity.id == id);
        if !exists_now && !pending_spawn {
            return false;
        }
        self.pending_despawns.push(id);
        true
    }

    pub fn apply_pending(&mut self) {
        if !self.pending_despawns.is_empty() {
            self.pending_despawns.sort_by_key(|id| id.0);
            self.pending_despawns.dedup();
            let pending = &self.pending_despawns;
            let is_doomed = |entity: &Entity| {
                pending
                    .binary_search_by_key(&entity.id.0, |id| id.0)
                    .is_ok()
            };
            self.entities.retain(|entity| !is_doomed(entity));
            self.pending_spawns.retain(|entity| !is_doomed(entity));
            self.pending_despawns.clear();
        }

        for mut entity in self.pending_spawns.drain(..) {
            entity.applied_spawn_order = self.next_applied_spawn_order;
            self.next_applied_spawn_order = self.next_applied_spawn_order.saturating_add(1);
            self.entities.push(entity);
        }
    }

    pub fn clear(&mut self) {
        self.entities.clear();
        self.pending_spawns.clear();
        self.pending_despawns.clear();
        self.next_applied_spawn_order = 0;
        self.camera = Camera2D::default();
        self.parallax_layers.clear();
        self.overlays.clear();
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn find_entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|entity| entity.id == id)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn set_camera_target(&mut self, target: Vec2) {
        self.camera.target = target;
    }

    pub fn parallax_layers(&self) -> &[ParallaxLayer] {
        &self.parallax_layers
    }

    pub fn set_parallax_layers(&mut self, layers: Vec<ParallaxLayer>) {
        self.parallax_layers = layers;
    }

    pub fn overlays(&self) -> &[ScreenOverlay] {
        &self.overlays
    }

    /// Replaces the screen overlays; scenes rebuild them every tick.
    pub fn set_overlays(&mut self, overlays: Vec<ScreenOverlay>) {
        self.overlays = overlays;
    }
}

pub trait Scene {
    fn load(&mut self, world: &mut SceneWorld);
    fn update(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand;
    fn render(&mut self, world: &SceneWorld);
    fn unload(&mut self, world: &mut SceneWorld);
    fn window_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }
}

pub(crate) struct SceneMachine {
    title: SceneRuntime,
    gameplay: SceneRuntime,
    active_scene: SceneKey,
}

impl SceneMachine {
    pub(crate) fn new(
        title: Box<dyn Scene>,
        gameplay: Box<dyn Scene>,
        active_scene: SceneKey,
    ) -> Self {
        Self {
            title: SceneRuntime::new(title),
            gameplay: SceneRuntime::new(gameplay),
            active_scene,
        }
    }

    pub(crate) fn active_scene(&self) -> SceneKey {
        self.active_scene
    }

    pub(crate) fn load_active(&mut self) {
        self.load_scene_if_needed(self.active_scene);
    }

    pub(crate) fn update_active(
        &mut self,
        fixed_dt_seconds: f32,
        input: &InputSnapshot,
    ) -> SceneCommand {
        let runtime = self.active_runtime_mut();
        let (scene, world) = (&mut runtime.scene, &mut runtime.world);
        scene.update(fixed_dt_seconds, input, world)
    }

    pub(crate) fn apply_pending_active(&mut self) {
        self.active_runtime_mut().world.apply_pending();
    }

    pub(crate) fn render_active(&mut self) {
        let runtime = self.active_runtime_mut();
        runtime.scene.render(&runtime.world);
    }

    pub(crate) fn active_world(&self) -> &SceneWorld {
        &self.active_runtime_ref().world
    }

    pub(crate) fn window_title_active(&self) -> Option<String> {
        let runtime = self.active_runtime_ref();
        runtime.scene.window_title(&runtime.world)
    }

    pub(crate) fn switch_to(&mut self, next_scene: SceneKey) -> bool {
        if self.active_scene == next_scene {
            return false;
        }

        self.load_scene_if_needed(next_scene);
        self.active_scene = next_scene;
        true
    }

    pub(crate) fn shutdown_all(&mut self) {
        for runtime in [&mut self.title, &mut self.gameplay] {
            if runtime.is_loaded {
                let (scene, world) = (&mut runtime.scene, &mut runtime.world);
                scene.unload(world);
                runtime.world.clear();
                runtime.is_loaded = false;
            }
        }
    }

    fn load_scene_if_needed(&mut self, key: SceneKey) {
        let runtime = self.runtime_mut(key);
        if runtime.is_loaded {
            return;
        }
        {
            let (scene, world) = (&mut runtime.scene, &mut runtime.world);
            scene.load(world);
        }
        runtime.is_loaded = true;
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        self.runtime_mut(self.active_scene)
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        self.runtime_ref(self.active_scene)
    }

    fn runtime_mut(&mut self, key: SceneKey) -> &mut SceneRuntime {
        match key {
            SceneKey::Title => &mut self.title,
            SceneKey::Gameplay => &mut self.gameplay,
        }
    }

    fn runtime_ref(&self, key: SceneKey) -> &SceneRuntime {
        match key {
            SceneKey::Title => &self.title,
            SceneKey::Gameplay => &self.gameplay,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn solid(name: &'static str) -> RenderableDesc {
        RenderableDesc {
            kind: RenderableKind::Solid([255, 0, 0, 255]),
            layer: DrawLayer::Object,
            debug_name: name,
        }
    }

    struct TestScene {
        spawn_count: usize,
        loads: Rc<Cell<u32>>,
        updates: Rc<Cell<u32>>,
    }

    impl TestScene {
        fn new(spawn_count: usize) -> Self {
            Self {
                spawn_count,
                loads: Rc::new(Cell::new(0)),
                updates: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Scene for TestScene {
        fn load(&mut self, world: &mut SceneWorld) {
            self.loads.set(self.loads.get() + 1);
            for index in 0..self.spawn_count {
                world.spawn(Rect::new(index as f32, 0.0, 1.0, 1.0), solid("test"));
            }
            world.apply_pending();
        }

        fn update(
            &mut self,
            _fixed_dt_seconds: f32,
            _input: &InputSnapshot,
            _world: &mut SceneWorld,
        ) -> SceneCommand {
            self.updates.set(self.updates.get() + 1);
            SceneCommand::None
        }

        fn render(&mut self, _world: &SceneWorld) {}

        fn unload(&mut self, _world: &mut SceneWorld) {}
    }

    #[test]
    fn allocator_never_reuses_ids() {
        let mut allocator = EntityIdAllocator::default();
        let first = allocator.allocate();
        let second = allocator.allocate();
        let third = allocator.allocate();

        assert_eq!(first.0, 0);
        assert_eq!(second.0, 1);
        assert_eq!(third.0, 2);
    }

    #[test]
    fn scene_world_spawn_and_despawn_updates_count() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Rect::new(0.0, 0.0, 8.0, 8.0), solid("spawned"));
        world.apply_pending();
        assert_eq!(world.entity_count(), 1);

        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
        assert!(!world.despawn(id));
    }

    #[test]
    fn scene_world_duplicate_pending_despawns_are_safe_and_idempotent() {
        let mut world = SceneWorld::default();
        let doomed = world.spawn(Rect::default(), solid("doomed"));
        let survivor = world.spawn(Rect::new(3.0, 1.0, 1.0, 1.0), solid("survivor"));
        world.apply_pending();

        assert!(world.despawn(doomed));
        assert!(world.despawn(doomed));
        world.apply_pending();

        assert_eq!(world.entity_count(), 1);
        assert!(world.find_entity(doomed).is_none());
        assert!(world.find_entity(survivor).is_some());
    }

    #[test]
    fn despawn_of_pending_spawn_never_materializes() {
        let mut world = SceneWorld::default();
        let id = world.spawn(Rect::default(), solid("transient"));
        assert!(world.despawn(id));
        world.apply_pending();
        assert_eq!(world.entity_count(), 0);
    }

    #[test]
    fn applied_spawn_order_follows_spawn_calls() {
        let mut world = SceneWorld::default();
        let first = world.spawn(Rect::default(), solid("first"));
        let second = world.spawn(Rect::default(), solid("second"));
        world.apply_pending();

        let first_order = world.find_entity(first).expect("first").applied_spawn_order();
        let second_order = world
            .find_entity(second)
            .expect("second")
            .applied_spawn_order();
        assert!(first_order < second_order);
    }

    #[test]
    fn clear_resets_camera_parallax_and_overlays() {
        let mut world = SceneWorld::default();
        world.spawn(Rect::default(), solid("a"));
        world.apply_pending();
        world.set_camera_target(Vec2::new(5.0, 5.0));
        world.set_parallax_layers(vec![ParallaxLayer {
            sprite: SpriteRef::new("graphics/bg.png"),
            speed: 0.5,
        }]);
        world.set_overlays(vec![ScreenOverlay::new(
            OverlayKind::Solid([0, 0, 0, 255]),
            ScreenAnchor::FullScreen,
        )]);

        world.clear();

        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.camera().target, Vec2::ZERO);
        assert!(world.parallax_layers().is_empty());
        assert!(world.overlays().is_empty());
    }

    #[test]
    fn switch_loads_target_once_and_keeps_entities() {
        let title = TestScene::new(1);
        let gameplay = TestScene::new(2);
        let gameplay_loads = Rc::clone(&gameplay.loads);
        let mut machine = SceneMachine::new(Box::new(title), Box::new(gameplay), SceneKey::Title);
        machine.load_active();

        assert_eq!(gameplay_loads.get(), 0);
        assert!(machine.switch_to(SceneKey::Gameplay));
        assert_eq!(gameplay_loads.get(), 1);
        assert_eq!(machine.active_world().entity_count(), 2);

        assert!(machine.switch_to(SceneKey::Title));
        assert!(machine.switch_to(SceneKey::Gameplay));
        assert_eq!(gameplay_loads.get(), 1);
        assert_eq!(machine.active_world().entity_count(), 2);
        assert!(!machine.switch_to(SceneKey::Gameplay));
    }

    #[test]
    fn inactive_scene_does_not_update() {
        let title = TestScene::new(0);
        let gameplay = TestScene::new(0);
        let title_updates = Rc::clone(&title.updates);
        let gameplay_updates = Rc::clone(&gameplay.updates);
        let mut machine = SceneMachine::new(Box::new(title), Box::new(gameplay), SceneKey::Title);
        machine.load_active();

        machine.update_active(1.0 / 60.0, &InputSnapshot::empty());
        machine.update_active(1.0 / 60.0, &InputSnapshot::empty());

        assert_eq!(title_updates.get(), 2);
        assert_eq!(gameplay_updates.get(), 0);
    }

    #[test]
    fn rect_touching_edges_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let c = Rect::new(9.5, 9.5, 10.0, 10.0);

        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn inflate_keeps_center_and_shrinks_symmetrically() {
        let visual = Rect::new(100.0, 200.0, 128.0, 128.0);
        let hitbox = visual.inflate(-60.0, -90.0);

        assert_eq!(hitbox.center(), visual.center());
        assert_eq!(hitbox.w, 68.0);
        assert_eq!(hitbox.h, 38.0);
    }

    #[test]
    fn normalized_diagonal_has_unit_length() {
        let diagonal = Vec2::new(1.0, -1.0).normalized_or_zero();
        assert!((diagonal.length() - 1.0).abs() < 0.0001);
        assert_eq!(Vec2::ZERO.normalized_or_zero(), Vec2::ZERO);
    }

    #[test]
    fn input_snapshot_builder_sets_pressed_and_held() {
        let snapshot = InputSnapshot::empty()
            .with_action_pressed(InputAction::Interact)
            .with_action_down(InputAction::MoveLeft, true)
            .with_window_size((800, 600));

        assert!(snapshot.was_pressed(InputAction::Interact));
        assert!(snapshot.is_down(InputAction::Interact));
        assert!(snapshot.is_down(InputAction::MoveLeft));
        assert!(!snapshot.was_pressed(InputAction::MoveLeft));
        assert_eq!(snapshot.window_size(), (800, 600));
    }
}
