use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::config::TighteningConfig;
use super::feedback::{FeedbackSink, VisualState};
use super::math::{lerp, lerp_vec3, smoothstep, Vec3};
use super::node::{NodeArena, NodeHandle, NodePose, PositionSpace};
use super::unit::{AssemblyUnit, UnitId};

/// Start/target pose data for one unit's animation. Positions are in the
/// configured `PositionSpace`; rotation is a scalar delta on one cap axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionSession {
    pub start_cap_pos: Vec3,
    pub target_cap_pos: Vec3,
    pub start_shaft_pos: Vec3,
    pub target_shaft_pos: Vec3,
    pub start_rotation: Vec3,
    pub target_rotation_delta: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimedPhase {
    LowerShaft,
    Settle,
    TurnCap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drive {
    /// Driven by external progress every tick, linear law.
    Gesture,
    /// Driven by elapsed time, smoothstep law.
    Timed { phase: TimedPhase, elapsed: f32 },
}

#[derive(Debug, Clone, Copy)]
struct LiveAnimation {
    cap: NodeHandle,
    shaft: NodeHandle,
    session: InteractionSession,
    cap_local_start: NodePose,
    shaft_local_start: NodePose,
    drive: Drive,
}

#[derive(Debug, Clone)]
pub struct ProgressAnimator {
    config: TighteningConfig,
    live: BTreeMap<UnitId, LiveAnimation>,
    initial_poses: BTreeMap<NodeHandle, NodePose>,
}

impl ProgressAnimator {
    pub fn new(config: TighteningConfig) -> Self {
        Self {
            config,
            live: BTreeMap::new(),
            initial_poses: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &TighteningConfig {
        &self.config
    }

    /// Live gesture session for `unit`, if any. Timed runs are not reported.
    pub fn session(&self, unit: UnitId) -> Option<&InteractionSession> {
        self.live
            .get(&unit)
            .filter(|live| live.drive == Drive::Gesture)
            .map(|live| &live.session)
    }

    pub fn has_session(&self, unit: UnitId) -> bool {
        self.session(unit).is_some()
    }

    pub fn is_animating(&self, unit: UnitId) -> bool {
        self.live.contains_key(&unit)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Captures the current pose of both nodes and begins a gesture session.
    /// Any prior animation for the unit is rolled back first.
    pub fn start(&mut self, unit: &AssemblyUnit, nodes: &mut NodeArena) -> bool {
        if self.live.contains_key(&unit.id()) {
            self.cancel(unit.id(), nodes);
        }
        let Some(live) = self.capture(unit, nodes, Drive::Gesture) else {
            return false;
        };
        debug!(unit = unit.id().0, "tightening_session_started");
        self.live.insert(unit.id(), live);
        true
    }

    /// Linear interpolation of both nodes toward their targets.
    pub fn update(&mut self, unit: UnitId, fraction: f32, nodes: &mut NodeArena) {
        let Some(live) = self.live.get(&unit) else {
            return;
        };
        if live.drive != Drive::Gesture {
            return;
        }
        let live = *live;
        let space = self.config.position_space;
        let session = &live.session;
        let shaft = lerp_vec3(session.start_shaft_pos, session.target_shaft_pos, fraction);
        let cap = lerp_vec3(session.start_cap_pos, session.target_cap_pos, fraction);
        nodes.set_position(live.shaft, space, shaft);
        nodes.set_position(live.cap, space, cap);
        let turned = lerp(0.0, session.target_rotation_delta, fraction);
        nodes.set_euler_degrees(live.cap, self.rotated(session.start_rotation, turned));
    }

    /// Restores both nodes to the exact pose captured at start.
    pub fn cancel(&mut self, unit: UnitId, nodes: &mut NodeArena) {
        let Some(live) = self.live.remove(&unit) else {
            return;
        };
        nodes.set_local_pose(live.shaft, live.shaft_local_start);
        nodes.set_local_pose(live.cap, live.cap_local_start);
        debug!(unit = unit.0, "tightening_session_cancelled");
    }

    /// Snaps both nodes to their targets and signals the tightened visual.
    pub fn complete(
        &mut self,
        unit: UnitId,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) {
        let Some(live) = self.live.remove(&unit) else {
            return;
        };
        self.write_targets(&live, nodes);
        feedback.apply_material(unit, VisualState::Tightened);
        debug!(unit = unit.0, "tightening_session_completed");
    }

    /// Choreographed lower-then-turn run driven by `advance_timed`. A live
    /// gesture session is completed on the spot instead.
    pub fn start_timed(
        &mut self,
        unit: &AssemblyUnit,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) -> bool {
        match self.live.get(&unit.id()).map(|live| live.drive) {
            Some(Drive::Gesture) => {
                self.complete(unit.id(), nodes, feedback);
                return true;
            }
            Some(Drive::Timed { .. }) => return false,
            None => {}
        }
        let drive = Drive::Timed {
            phase: TimedPhase::LowerShaft,
            elapsed: 0.0,
        };
        let Some(live) = self.capture(unit, nodes, drive) else {
            return false;
        };
        debug!(unit = unit.id().0, "timed_tightening_started");
        self.live.insert(unit.id(), live);
        true
    }

    /// Steps every timed run by `dt` seconds and returns the units that
    /// finished this call.
    pub fn advance_timed(
        &mut self,
        dt: f32,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) -> Vec<UnitId> {
        let timed_units = self
            .live
            .iter()
            .filter(|(_, live)| matches!(live.drive, Drive::Timed { .. }))
            .map(|(unit, _)| *unit)
            .collect::<Vec<_>>();

        let mut finished = Vec::new();
        for unit in timed_units {
            let Some(mut live) = self.live.get(&unit).copied() else {
                continue;
            };
            if self.step_timed(&mut live, dt.max(0.0), nodes) {
                self.live.remove(&unit);
                feedback.apply_material(unit, VisualState::Tightened);
                debug!(unit = unit.0, "timed_tightening_finished");
                finished.push(unit);
            } else {
                self.live.insert(unit, live);
            }
        }
        finished
    }

    pub fn save_initial_poses<'a>(
        &mut self,
        units: impl IntoIterator<Item = &'a AssemblyUnit>,
        nodes: &NodeArena,
    ) {
        self.initial_poses.clear();
        for unit in units {
            for handle in [unit.cap(), unit.shaft()] {
                match nodes.local_pose(handle) {
                    Some(pose) => {
                        self.initial_poses.insert(handle, pose);
                    }
                    None => warn!(
                        unit = unit.id().0,
                        node = handle.index(),
                        "initial_pose_node_missing"
                    ),
                }
            }
        }
        debug!(nodes = self.initial_poses.len(), "initial_poses_saved");
    }

    /// Drops every live animation and writes the saved initial poses back.
    pub fn reset_all_positions(&mut self, nodes: &mut NodeArena) {
        self.live.clear();
        if self.initial_poses.is_empty() {
            warn!("reset_without_saved_poses");
            return;
        }
        for (handle, pose) in &self.initial_poses {
            nodes.set_local_pose(*handle, *pose);
        }
        debug!(nodes = self.initial_poses.len(), "positions_reset");
    }

    pub fn restore_unit_pose(&mut self, unit: &AssemblyUnit, nodes: &mut NodeArena) {
        self.cancel(unit.id(), nodes);
        for handle in [unit.cap(), unit.shaft()] {
            if let Some(pose) = self.initial_poses.get(&handle) {
                nodes.set_local_pose(handle, *pose);
            }
        }
    }

    pub fn stop_timed(&mut self, nodes: &mut NodeArena) {
        let timed_units = self
            .live
            .iter()
            .filter(|(_, live)| matches!(live.drive, Drive::Timed { .. }))
            .map(|(unit, _)| *unit)
            .collect::<Vec<_>>();
        for unit in timed_units {
            self.cancel(unit, nodes);
        }
    }

    fn capture(&self, unit: &AssemblyUnit, nodes: &NodeArena, drive: Drive) -> Option<LiveAnimation> {
        let space = self.config.position_space;
        let captured = (|| {
            let cap_local_start = nodes.local_pose(unit.cap())?;
            let shaft_local_start = nodes.local_pose(unit.shaft())?;
            let start_cap_pos = nodes.position(unit.cap(), space)?;
            let start_shaft_pos = nodes.position(unit.shaft(), space)?;
            let cap_world_height = nodes.world_position(unit.cap())?.y;
            let shaft_world_height = nodes.world_position(unit.shaft())?.y;
            Some(LiveAnimation {
                cap: unit.cap(),
                shaft: unit.shaft(),
                session: InteractionSession {
                    start_cap_pos,
                    target_cap_pos: project_height(
                        start_cap_pos,
                        cap_world_height,
                        self.config.cap_target_height,
                        space,
                    ),
                    start_shaft_pos,
                    target_shaft_pos: project_height(
                        start_shaft_pos,
                        shaft_world_height,
                        self.config.shaft_target_height,
                        space,
                    ),
                    start_rotation: cap_local_start.euler_degrees,
                    target_rotation_delta: self.config.rotation_degrees,
                },
                cap_local_start,
                shaft_local_start,
                drive,
            })
        })();
        if captured.is_none() {
            warn!(
                unit = unit.id().0,
                cap = unit.cap().index(),
                shaft = unit.shaft().index(),
                "tightening_nodes_missing"
            );
        }
        captured
    }

    fn write_targets(&self, live: &LiveAnimation, nodes: &mut NodeArena) {
        let space = self.config.position_space;
        let session = &live.session;
        nodes.set_position(live.shaft, space, session.target_shaft_pos);
        nodes.set_position(live.cap, space, session.target_cap_pos);
        nodes.set_euler_degrees(
            live.cap,
            self.rotated(session.start_rotation, session.target_rotation_delta),
        );
    }

    fn rotated(&self, start: Vec3, delta: f32) -> Vec3 {
        let axis = self.config.rotation_axis;
        start.with_component(axis, start.component(axis) + delta)
    }

    fn phase_duration(&self, phase: TimedPhase) -> f32 {
        match phase {
            TimedPhase::LowerShaft => self.config.shaft_lower_seconds,
            TimedPhase::Settle => self.config.settle_pause_seconds,
            TimedPhase::TurnCap => self.config.cap_turn_seconds,
        }
    }

    /// Returns true once the last phase has ended.
    fn step_timed(&self, live: &mut LiveAnimation, mut dt: f32, nodes: &mut NodeArena) -> bool {
        let Drive::Timed {
            mut phase,
            mut elapsed,
        } = live.drive
        else {
            return false;
        };
        loop {
            let duration = self.phase_duration(phase);
            let remaining = duration - elapsed;
            if dt < remaining {
                elapsed += dt;
                self.apply_timed_progress(live, phase, smoothstep(elapsed / duration), nodes);
                live.drive = Drive::Timed { phase, elapsed };
                return false;
            }
            dt -= remaining.max(0.0);
            self.apply_timed_progress(live, phase, 1.0, nodes);
            let next = match phase {
                TimedPhase::LowerShaft => TimedPhase::Settle,
                TimedPhase::Settle => TimedPhase::TurnCap,
                TimedPhase::TurnCap => {
                    self.write_targets(live, nodes);
                    return true;
                }
            };
            phase = next;
            elapsed = 0.0;
        }
    }

    fn apply_timed_progress(
        &self,
        live: &LiveAnimation,
        phase: TimedPhase,
        eased: f32,
        nodes: &mut NodeArena,
    ) {
        let space = self.config.position_space;
        let session = &live.session;
        match phase {
            TimedPhase::LowerShaft => {
                let shaft = if eased >= 1.0 {
                    session.target_shaft_pos
                } else {
                    lerp_vec3(session.start_shaft_pos, session.target_shaft_pos, eased)
                };
                nodes.set_position(live.shaft, space, shaft);
            }
            TimedPhase::Settle => {}
            TimedPhase::TurnCap => {
                let cap = if eased >= 1.0 {
                    session.target_cap_pos
                } else {
                    lerp_vec3(session.start_cap_pos, session.target_cap_pos, eased)
                };
                nodes.set_position(live.cap, space, cap);
                let turned = lerp(0.0, session.target_rotation_delta, eased);
                nodes.set_euler_degrees(live.cap, self.rotated(session.start_rotation, turned));
            }
        }
    }
}

/// Moves `start` vertically by the gap between the node's world height and
/// `target_height`, in whichever representation `space` names.
fn project_height(start: Vec3, world_height: f32, target_height: f32, space: PositionSpace) -> Vec3 {
    match space {
        PositionSpace::World => Vec3 {
            y: target_height,
            ..start
        },
        PositionSpace::Local => Vec3 {
            y: start.y - (world_height - target_height),
            ..start
        },
    }
}
