//! Ordered-interaction core: gesture controllers, the sequence validator and
//! the reversible tightening animator, all driven one tick at a time.

mod animator;
mod board;
mod choreography;
mod clock;
mod config;
mod feedback;
mod interaction;
mod math;
mod node;
mod sequence;
mod unit;

#[cfg(test)]
pub(crate) use feedback::testing;

pub use animator::{InteractionSession, ProgressAnimator};
pub use board::{AssemblyBoard, BoardError};
pub use choreography::{Choreographer, CueStep};
pub use clock::{FixedStepClock, TickSource};
pub use config::{ConfigValueError, InteractionConfig, TighteningConfig};
pub use feedback::{FeedbackSink, NullFeedback, SoundKind, VisualState};
pub use interaction::{
    next_transition, AimProvider, GestureEffect, GestureEvent, InteractionContext,
    InteractionController, PickedUnit, PointerSample, Transition,
};
pub use math::{clamp01, lerp, lerp_vec3, smoothstep, Axis, Mat3, Vec2, Vec3};
pub use node::{NodeArena, NodeError, NodeHandle, NodePose, PositionSpace};
pub use sequence::{SequenceError, SequenceEvent, SequenceValidator};
pub use unit::{AssemblyUnit, UnitId, UnitState};
