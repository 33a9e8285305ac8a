mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{screen_to_world, world_to_screen, Renderer, Viewport};
pub use scene::{
    Camera2D, PlateRect, Scene, SceneCommand, SceneWorld, UnitVisual, UnitVisuals,
    CAP_HALF_EXTENTS, DEFAULT_PIXELS_PER_WORLD, SHAFT_HALF_EXTENTS,
};
