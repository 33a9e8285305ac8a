use tracing::{debug, info};

use crate::assembly::{
    AssemblyUnit, FeedbackSink, NodeArena, NodeHandle, SoundKind, UnitId, Vec2, VisualState,
};

use super::rendering::{screen_to_world, Viewport};
use super::InputSnapshot;

/// Half width/height of a shaft in world units, side view.
pub const SHAFT_HALF_EXTENTS: Vec2 = Vec2 { x: 0.12, y: 0.8 };
/// Half width/height of a cap in world units, side view.
pub const CAP_HALF_EXTENTS: Vec2 = Vec2 { x: 0.4, y: 0.2 };

pub const DEFAULT_PIXELS_PER_WORLD: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera2D {
    pub position: Vec2,
    pub pixels_per_world: f32,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            position: Vec2 { x: 0.0, y: 2.0 },
            pixels_per_world: DEFAULT_PIXELS_PER_WORLD,
        }
    }
}

/// Axis-aligned world rectangle drawn under the bolts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateRect {
    pub min: Vec2,
    pub max: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitVisual {
    pub unit: UnitId,
    pub cap: NodeHandle,
    pub shaft: NodeHandle,
    pub material: VisualState,
    pub hidden: bool,
}

/// Material state of every bolt. Doubles as the feedback sink: materials are
/// stored for the renderer and sound cues are logged.
#[derive(Debug, Clone, Default)]
pub struct UnitVisuals {
    entries: Vec<UnitVisual>,
    sounds_played: u32,
    last_sound: Option<SoundKind>,
}

impl UnitVisuals {
    pub fn push(&mut self, unit: &AssemblyUnit) {
        self.entries.push(UnitVisual {
            unit: unit.id(),
            cap: unit.cap(),
            shaft: unit.shaft(),
            material: VisualState::Original,
            hidden: false,
        });
    }

    pub fn get(&self, unit: UnitId) -> Option<&UnitVisual> {
        self.entries.iter().find(|visual| visual.unit == unit)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &UnitVisual> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_hidden(&mut self, unit: UnitId, hidden: bool) {
        if let Some(visual) = self.entries.iter_mut().find(|visual| visual.unit == unit) {
            visual.hidden = hidden;
        }
    }

    pub fn show_all(&mut self) {
        for visual in &mut self.entries {
            visual.hidden = false;
        }
    }

    pub fn sounds_played(&self) -> u32 {
        self.sounds_played
    }

    pub fn last_sound(&self) -> Option<SoundKind> {
        self.last_sound
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl FeedbackSink for UnitVisuals {
    fn apply_material(&mut self, unit: UnitId, visual: VisualState) {
        match self.entries.iter_mut().find(|entry| entry.unit == unit) {
            Some(entry) => entry.material = visual,
            None => debug!(unit = unit.0, ?visual, "material_for_unknown_unit"),
        }
    }

    fn play_sound(&mut self, kind: SoundKind) {
        self.sounds_played = self.sounds_played.saturating_add(1);
        self.last_sound = Some(kind);
        info!(sound = ?kind, "sound_cue");
    }
}

#[derive(Debug, Default)]
pub struct SceneWorld {
    nodes: NodeArena,
    visuals: UnitVisuals,
    camera: Camera2D,
    plate: Option<PlateRect>,
    hold_progress: Option<(UnitId, f32)>,
}

impl SceneWorld {
    pub fn nodes(&self) -> &NodeArena {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut NodeArena {
        &mut self.nodes
    }

    pub fn visuals(&self) -> &UnitVisuals {
        &self.visuals
    }

    pub fn visuals_mut(&mut self) -> &mut UnitVisuals {
        &mut self.visuals
    }

    /// Nodes and the feedback sink borrowed together for a board tick.
    pub fn split_mut(&mut self) -> (&mut NodeArena, &mut UnitVisuals) {
        (&mut self.nodes, &mut self.visuals)
    }

    pub fn camera(&self) -> &Camera2D {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera2D {
        &mut self.camera
    }

    pub fn plate(&self) -> Option<PlateRect> {
        self.plate
    }

    pub fn set_plate(&mut self, plate: PlateRect) {
        self.plate = Some(plate);
    }

    pub fn hold_progress(&self) -> Option<(UnitId, f32)> {
        self.hold_progress
    }

    pub fn set_hold_progress(&mut self, progress: Option<(UnitId, f32)>) {
        self.hold_progress = progress;
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Topmost visible unit whose cap or shaft rectangle contains the cursor.
    pub fn pick_unit_at_cursor(
        &self,
        cursor_position_px: Vec2,
        window_size: (u32, u32),
    ) -> Option<UnitId> {
        let viewport = Viewport {
            width: window_size.0,
            height: window_size.1,
        };
        let cursor = screen_to_world(cursor_position_px, &self.camera, viewport);

        self.visuals
            .iter()
            .rev()
            .filter(|visual| !visual.hidden)
            .find(|visual| {
                [(visual.cap, CAP_HALF_EXTENTS), (visual.shaft, SHAFT_HALF_EXTENTS)]
                    .into_iter()
                    .any(|(handle, half)| {
                        self.nodes.world_position(handle).is_some_and(|center| {
                            (cursor.x - center.x).abs() <= half.x
                                && (cursor.y - center.y).abs() <= half.y
                        })
                    })
            })
            .map(|visual| visual.unit)
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
    fn unload(&mut self, world: &mut SceneWorld);
    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        None
    }
}

pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    world: SceneWorld,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            world: SceneWorld::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) {
        if self.is_loaded {
            return;
        }
        self.scene.load(&mut self.world);
        self.is_loaded = true;
    }

    pub(crate) fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if !self.is_loaded {
            return SceneCommand::None;
        }
        self.scene.update(fixed_dt_seconds, input, &mut self.world)
    }

    pub(crate) fn world(&self) -> &SceneWorld {
        &self.world
    }

    pub(crate) fn title(&self) -> Option<String> {
        self.scene.debug_title(&self.world)
    }

    pub(crate) fn shutdown(&mut self) {
        if self.is_loaded {
            self.scene.unload(&mut self.world);
            self.world.clear();
            self.is_loaded = false;
        }
    }
}
