use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use torque_engine::{
    AimProvider, AssemblyBoard, AssemblyUnit, BoardError, Choreographer, CueStep, FeedbackSink,
    FixedStepClock, InputAction, InputSnapshot, NodeError, NodePose, PickedUnit, PlateRect,
    PointerSample, Scene, SceneCommand, SceneWorld, SequenceEvent, SoundKind, TickSource, UnitId,
    UnitState, Vec2, Vec3,
};
use tracing::{debug, error, info, warn};

use super::config::{LayoutConfig, PuzzleConfig};

const TUTORIAL_INTRO_TRACK: &str = "tutorial_intro";
const TUTORIAL_WRAP_UP_TRACK: &str = "tutorial_wrap_up";
const GUIDED_PREVIEW_TRACK: &str = "guided_preview";
const GUIDED_WRAP_UP_TRACK: &str = "guided_wrap_up";
const TUTORIAL_LEAD_IN_SECONDS: f32 = 1.0;
const TUTORIAL_FOCUS_DELAY_SECONDS: f32 = 1.0;
const GUIDED_PREVIEW_DELAY_SECONDS: f32 = 2.0;
const WRAP_UP_PAUSE_SECONDS: f32 = 1.5;
const WRAP_UP_SETTLE_SECONDS: f32 = 1.0;
const PLATE_MARGIN: f32 = 0.8;

include!("tutorial.rs");
include!("orchestrator.rs");
include!("scene_impl.rs");

pub(crate) fn build_scene(config: PuzzleConfig) -> Box<dyn Scene> {
    Box::new(PuzzleScene::new(config))
}
