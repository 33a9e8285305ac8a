use tracing::{debug, trace};

use super::animator::ProgressAnimator;
use super::config::InteractionConfig;
use super::feedback::{FeedbackSink, VisualState};
use super::math::{clamp01, Vec2};
use super::node::NodeArena;
use super::sequence::SequenceValidator;
use super::unit::{AssemblyUnit, UnitId, UnitState};

/// Pointer state sampled once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerSample {
    pub pressed_now: bool,
    pub just_pressed: bool,
    pub just_released: bool,
    pub screen_position: Option<Vec2>,
}

pub trait AimProvider {
    fn does_ray_hit_unit(&self, unit: UnitId) -> bool;
}

/// Aim result resolved before the tick: the unit under the pointer, if any.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickedUnit(pub Option<UnitId>);

impl AimProvider for PickedUnit {
    fn does_ray_hit_unit(&self, unit: UnitId) -> bool {
        self.0 == Some(unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    Press,
    AimLost,
    Hold { threshold_reached: bool },
    Release { threshold_reached: bool },
    Accepted,
    Rejected,
    FeedbackElapsed,
    Highlight(bool),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEffect {
    None,
    BeginSession,
    RollBack,
    Track,
    TrackAndValidate,
    /// Validate on release; an acceptance re-dispatches the release.
    Validate,
    Finalize,
    Restore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: UnitState,
    pub effect: GestureEffect,
}

const fn to(next: UnitState, effect: GestureEffect) -> Option<Transition> {
    Some(Transition { next, effect })
}

/// The complete gesture table. Pairs not listed are ignored.
pub const fn next_transition(state: UnitState, event: GestureEvent) -> Option<Transition> {
    use GestureEffect as E;
    use GestureEvent as Ev;
    use UnitState as S;

    match (state, event) {
        (_, Ev::Reset) => to(S::Idle, E::Restore),
        (S::Tightened, _) => None,

        (S::Idle | S::Highlighted | S::Wrong, Ev::Press) => to(S::Selected, E::BeginSession),

        (S::Selected | S::Correct, Ev::AimLost) => to(S::Idle, E::RollBack),

        (S::Selected, Ev::Hold { threshold_reached: false }) => to(S::Selected, E::Track),
        (S::Selected, Ev::Hold { threshold_reached: true }) => {
            to(S::Selected, E::TrackAndValidate)
        }
        (S::Correct, Ev::Hold { .. }) => to(S::Correct, E::Track),

        (S::Selected, Ev::Accepted) => to(S::Correct, E::None),
        (S::Selected, Ev::Rejected) => to(S::Wrong, E::RollBack),

        (S::Selected, Ev::Release { threshold_reached: false }) => to(S::Idle, E::RollBack),
        (S::Selected, Ev::Release { threshold_reached: true }) => to(S::Selected, E::Validate),
        (S::Correct, Ev::Release { .. }) => to(S::Tightened, E::Finalize),

        (S::Wrong, Ev::FeedbackElapsed) => to(S::Idle, E::None),

        (S::Idle, Ev::Highlight(true)) => to(S::Highlighted, E::None),
        (S::Highlighted, Ev::Highlight(false)) => to(S::Idle, E::None),

        _ => None,
    }
}

/// Collaborators a controller needs for one tick, passed in explicitly.
pub struct InteractionContext<'a> {
    pub config: &'a InteractionConfig,
    pub validator: &'a mut SequenceValidator,
    pub animator: &'a mut ProgressAnimator,
    pub nodes: &'a mut NodeArena,
    pub feedback: &'a mut dyn FeedbackSink,
}

/// Per-unit press/hold/release driver.
#[derive(Debug, Clone)]
pub struct InteractionController {
    unit: AssemblyUnit,
    press_started_at: Option<f64>,
    has_validated: bool,
    wrong_since: Option<f64>,
}

impl InteractionController {
    pub fn new(unit: AssemblyUnit) -> Self {
        Self {
            unit,
            press_started_at: None,
            has_validated: false,
            wrong_since: None,
        }
    }

    pub fn unit(&self) -> &AssemblyUnit {
        &self.unit
    }

    pub fn id(&self) -> UnitId {
        self.unit.id()
    }

    pub fn state(&self) -> UnitState {
        self.unit.state()
    }

    pub fn tightened(&self) -> bool {
        self.unit.tightened()
    }

    pub fn has_validated(&self) -> bool {
        self.has_validated
    }

    /// Hold progress in [0, 1] while a gesture is live.
    pub fn hold_fraction(&self, now: f64, config: &InteractionConfig) -> Option<f32> {
        if !self.unit.state().holds_session() {
            return None;
        }
        let started = self.press_started_at?;
        Some(clamp01(
            ((now - started) / f64::from(config.hold_duration_seconds)) as f32,
        ))
    }

    pub fn tick(
        &mut self,
        sample: &PointerSample,
        aimed: bool,
        now: f64,
        ctx: &mut InteractionContext<'_>,
    ) {
        match self.unit.state() {
            UnitState::Tightened => return,
            UnitState::Wrong => {
                let elapsed = self.wrong_since.map_or(f64::INFINITY, |since| now - since);
                if elapsed >= f64::from(ctx.config.wrong_feedback_seconds) {
                    self.dispatch(GestureEvent::FeedbackElapsed, now, 0.0, ctx);
                }
            }
            _ => {}
        }

        if !self.unit.state().holds_session() {
            if sample.just_pressed && aimed {
                self.dispatch(GestureEvent::Press, now, 0.0, ctx);
            }
            return;
        }

        let releasing = sample.just_released || !sample.pressed_now;
        // While held, aim loss wins over progress and validation within a tick.
        // A release is judged on elapsed time alone.
        if !aimed && !releasing {
            self.dispatch(GestureEvent::AimLost, now, 0.0, ctx);
            return;
        }

        let hold = f64::from(ctx.config.hold_duration_seconds);
        let elapsed = self.press_started_at.map_or(0.0, |started| now - started);
        let threshold_reached = elapsed >= hold;
        let fraction = clamp01((elapsed / hold) as f32);
        let event = if releasing {
            GestureEvent::Release { threshold_reached }
        } else {
            GestureEvent::Hold { threshold_reached }
        };
        self.dispatch(event, now, fraction, ctx);
    }

    pub fn set_highlighted(&mut self, highlighted: bool, ctx: &mut InteractionContext<'_>) {
        self.dispatch(GestureEvent::Highlight(highlighted), 0.0, 0.0, ctx);
    }

    /// Clears `tightened`, drops any session and restores the saved pose and
    /// original material.
    pub fn reset_unit(&mut self, ctx: &mut InteractionContext<'_>) {
        self.dispatch(GestureEvent::Reset, 0.0, 0.0, ctx);
    }

    fn dispatch(
        &mut self,
        event: GestureEvent,
        now: f64,
        fraction: f32,
        ctx: &mut InteractionContext<'_>,
    ) {
        let previous = self.unit.state();
        let Some(transition) = next_transition(previous, event) else {
            trace!(
                unit = self.unit.id().0,
                state = previous.as_token(),
                ?event,
                "gesture_ignored"
            );
            return;
        };
        self.enter(transition.next, now, ctx);
        self.apply(transition.effect, now, fraction, ctx);
    }

    fn enter(&mut self, next: UnitState, now: f64, ctx: &mut InteractionContext<'_>) {
        let previous = self.unit.state();
        match next {
            UnitState::Tightened => self.unit.mark_tightened(),
            other => self.unit.set_state(other),
        }
        if next == UnitState::Wrong {
            self.wrong_since = Some(now);
        }
        if previous != next {
            debug!(
                unit = self.unit.id().0,
                from = previous.as_token(),
                to = next.as_token(),
                "unit_state_changed"
            );
            if next != UnitState::Tightened {
                ctx.feedback
                    .apply_material(self.unit.id(), VisualState::from(next));
            }
        }
    }

    fn apply(
        &mut self,
        effect: GestureEffect,
        now: f64,
        fraction: f32,
        ctx: &mut InteractionContext<'_>,
    ) {
        let id = self.unit.id();
        match effect {
            GestureEffect::None => {}
            GestureEffect::BeginSession => {
                self.press_started_at = Some(now);
                self.has_validated = false;
                ctx.animator.start(&self.unit, ctx.nodes);
            }
            GestureEffect::RollBack => {
                self.press_started_at = None;
                ctx.animator.cancel(id, ctx.nodes);
            }
            GestureEffect::Track => {
                ctx.animator.update(id, fraction, ctx.nodes);
            }
            GestureEffect::TrackAndValidate => {
                ctx.animator.update(id, fraction, ctx.nodes);
                if !self.has_validated {
                    self.validate(now, ctx);
                }
            }
            GestureEffect::Validate => {
                if self.validate(now, ctx) {
                    self.dispatch(
                        GestureEvent::Release {
                            threshold_reached: true,
                        },
                        now,
                        1.0,
                        ctx,
                    );
                }
            }
            GestureEffect::Finalize => {
                self.press_started_at = None;
                ctx.animator.complete(id, ctx.nodes, ctx.feedback);
            }
            GestureEffect::Restore => {
                self.press_started_at = None;
                self.has_validated = false;
                self.wrong_since = None;
                self.unit.clear();
                ctx.animator.restore_unit_pose(&self.unit, ctx.nodes);
                ctx.feedback.apply_material(id, VisualState::Original);
            }
        }
    }

    fn validate(&mut self, now: f64, ctx: &mut InteractionContext<'_>) -> bool {
        let accepted = ctx.validator.validate(self.unit.id());
        if accepted {
            self.has_validated = true;
            self.dispatch(GestureEvent::Accepted, now, 1.0, ctx);
        } else {
            self.dispatch(GestureEvent::Rejected, now, 0.0, ctx);
        }
        accepted
    }
}
