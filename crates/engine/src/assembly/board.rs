use std::collections::BTreeSet;

use thiserror::Error;
use tracing::{debug, info};

use super::animator::ProgressAnimator;
use super::config::{ConfigValueError, InteractionConfig, TighteningConfig};
use super::feedback::FeedbackSink;
use super::interaction::{AimProvider, InteractionContext, InteractionController, PointerSample};
use super::node::NodeArena;
use super::sequence::{format_order, SequenceError, SequenceEvent, SequenceValidator};
use super::unit::{AssemblyUnit, UnitId, UnitState};

#[derive(Debug, Error)]
pub enum BoardError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Config(#[from] ConfigValueError),
    #[error("unit {0} is bound more than once")]
    DuplicateBinding(UnitId),
    #[error("unit {0} is in the order but has no node binding")]
    Unbound(UnitId),
    #[error("unit {0} is bound but missing from the order")]
    Unordered(UnitId),
}

/// Every unit's controller plus the shared validator and animator.
#[derive(Debug, Clone)]
pub struct AssemblyBoard {
    interaction: InteractionConfig,
    validator: SequenceValidator,
    animator: ProgressAnimator,
    controllers: Vec<InteractionController>,
    input_locked: bool,
}

impl AssemblyBoard {
    pub fn new(
        units: Vec<AssemblyUnit>,
        order: Vec<UnitId>,
        interaction: InteractionConfig,
        tightening: TighteningConfig,
    ) -> Result<Self, BoardError> {
        interaction.validate()?;
        tightening.validate()?;
        let validator = SequenceValidator::new(order)?;

        let mut bound = BTreeSet::new();
        for unit in &units {
            if !bound.insert(unit.id()) {
                return Err(BoardError::DuplicateBinding(unit.id()));
            }
        }
        let ordered = validator.original_order().iter().copied().collect::<BTreeSet<_>>();
        if let Some(missing) = ordered.difference(&bound).next() {
            return Err(BoardError::Unbound(*missing));
        }
        if let Some(extra) = bound.difference(&ordered).next() {
            return Err(BoardError::Unordered(*extra));
        }

        let mut controllers = units
            .into_iter()
            .map(InteractionController::new)
            .collect::<Vec<_>>();
        controllers.sort_by_key(InteractionController::id);
        info!(
            units = controllers.len(),
            order = %format_order(validator.original_order()),
            "assembly_board_ready"
        );

        Ok(Self {
            interaction,
            validator,
            animator: ProgressAnimator::new(tightening),
            controllers,
            input_locked: false,
        })
    }

    pub fn interaction_config(&self) -> &InteractionConfig {
        &self.interaction
    }

    pub fn validator(&self) -> &SequenceValidator {
        &self.validator
    }

    pub fn validator_mut(&mut self) -> &mut SequenceValidator {
        &mut self.validator
    }

    pub fn animator(&self) -> &ProgressAnimator {
        &self.animator
    }

    pub fn animator_mut(&mut self) -> &mut ProgressAnimator {
        &mut self.animator
    }

    pub fn controllers(&self) -> &[InteractionController] {
        &self.controllers
    }

    pub fn unit_ids(&self) -> Vec<UnitId> {
        self.controllers.iter().map(InteractionController::id).collect()
    }

    pub fn controller(&self, unit: UnitId) -> Option<&InteractionController> {
        self.controllers.iter().find(|controller| controller.id() == unit)
    }

    pub fn unit_state(&self, unit: UnitId) -> Option<UnitState> {
        self.controller(unit).map(InteractionController::state)
    }

    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    pub fn set_input_locked(&mut self, locked: bool) {
        if self.input_locked != locked {
            debug!(locked, "board_input_lock_changed");
        }
        self.input_locked = locked;
    }

    pub fn tick(
        &mut self,
        sample: &PointerSample,
        aim: &dyn AimProvider,
        now: f64,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) {
        if self.input_locked {
            return;
        }
        let Self {
            interaction,
            validator,
            animator,
            controllers,
            ..
        } = self;
        let mut ctx = InteractionContext {
            config: interaction,
            validator,
            animator,
            nodes,
            feedback,
        };
        for controller in controllers.iter_mut() {
            let aimed = aim.does_ray_hit_unit(controller.id());
            controller.tick(sample, aimed, now, &mut ctx);
        }
    }

    /// Unit currently being held and its hold progress.
    pub fn held_progress(&self, now: f64) -> Option<(UnitId, f32)> {
        self.controllers.iter().find_map(|controller| {
            controller
                .hold_fraction(now, &self.interaction)
                .map(|fraction| (controller.id(), fraction))
        })
    }

    pub fn set_highlight(
        &mut self,
        unit: UnitId,
        highlighted: bool,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) {
        self.for_units(nodes, feedback, |controller, ctx| {
            if controller.id() == unit {
                controller.set_highlighted(highlighted, ctx);
            }
        });
    }

    pub fn clear_highlights(&mut self, nodes: &mut NodeArena, feedback: &mut dyn FeedbackSink) {
        self.for_units(nodes, feedback, |controller, ctx| {
            controller.set_highlighted(false, ctx);
        });
    }

    pub fn reset_unit(
        &mut self,
        unit: UnitId,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
    ) {
        self.for_units(nodes, feedback, |controller, ctx| {
            if controller.id() == unit {
                controller.reset_unit(ctx);
            }
        });
    }

    pub fn reset_all_units(&mut self, nodes: &mut NodeArena, feedback: &mut dyn FeedbackSink) {
        self.for_units(nodes, feedback, |controller, ctx| controller.reset_unit(ctx));
        debug!(units = self.controllers.len(), "units_reset");
    }

    pub fn save_initial_poses(&mut self, nodes: &NodeArena) {
        let units = self.controllers.iter().map(InteractionController::unit);
        self.animator.save_initial_poses(units, nodes);
    }

    pub fn reset_all_positions(&mut self, nodes: &mut NodeArena) {
        self.animator.reset_all_positions(nodes);
    }

    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        self.validator.drain_events()
    }

    fn for_units(
        &mut self,
        nodes: &mut NodeArena,
        feedback: &mut dyn FeedbackSink,
        mut visit: impl FnMut(&mut InteractionController, &mut InteractionContext<'_>),
    ) {
        let Self {
            interaction,
            validator,
            animator,
            controllers,
            ..
        } = self;
        let mut ctx = InteractionContext {
            config: interaction,
            validator,
            animator,
            nodes,
            feedback,
        };
        for controller in controllers.iter_mut() {
            visit(controller, &mut ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::feedback::testing::RecordingFeedback;
    use crate::assembly::interaction::PickedUnit;
    use crate::assembly::math::Vec3;
    use crate::assembly::node::NodePose;

    fn pose(x: f32, y: f32) -> NodePose {
        NodePose {
            position: Vec3::new(x, y, 0.0),
            euler_degrees: Vec3::ZERO,
        }
    }

    fn build(ids: &[u32], order: &[u32]) -> (NodeArena, Result<AssemblyBoard, BoardError>) {
        let mut nodes = NodeArena::default();
        let mut units = Vec::new();
        for (slot, id) in ids.iter().enumerate() {
            let root = nodes
                .insert(format!("bolt_{id}"), None, pose(slot as f32 * 2.0, 0.0))
                .expect("root");
            let shaft = nodes
                .insert(format!("bolt_{id}/shaft"), Some(root), pose(0.0, 2.2))
                .expect("shaft");
            let cap = nodes
                .insert(format!("bolt_{id}/cap"), Some(root), pose(0.0, 2.6))
                .expect("cap");
            units.push(AssemblyUnit::new(UnitId(*id), cap, shaft));
        }
        let board = AssemblyBoard::new(
            units,
            order.iter().copied().map(UnitId).collect(),
            InteractionConfig::default(),
            TighteningConfig::default(),
        );
        (nodes, board)
    }

    fn press() -> PointerSample {
        PointerSample {
            pressed_now: true,
            just_pressed: true,
            ..PointerSample::default()
        }
    }

    fn held() -> PointerSample {
        PointerSample {
            pressed_now: true,
            ..PointerSample::default()
        }
    }

    fn release() -> PointerSample {
        PointerSample {
            just_released: true,
            ..PointerSample::default()
        }
    }

    fn tighten(
        board: &mut AssemblyBoard,
        nodes: &mut NodeArena,
        feedback: &mut RecordingFeedback,
        unit: u32,
        start: f64,
    ) {
        let aim = PickedUnit(Some(UnitId(unit)));
        board.tick(&press(), &aim, start, nodes, feedback);
        board.tick(&held(), &aim, start + 1.0, nodes, feedback);
        board.tick(&release(), &aim, start + 1.1, nodes, feedback);
    }

    #[test]
    fn mismatched_bindings_are_rejected() {
        assert!(matches!(build(&[1, 2], &[1, 2, 3]).1, Err(BoardError::Unbound(UnitId(3)))));
        assert!(matches!(build(&[1, 2, 3], &[1, 2]).1, Err(BoardError::Unordered(UnitId(3)))));
        assert!(matches!(
            build(&[1, 1], &[1]).1,
            Err(BoardError::DuplicateBinding(UnitId(1)))
        ));
        assert!(matches!(
            build(&[1, 2], &[1, 1]).1,
            Err(BoardError::Sequence(SequenceError::DuplicateUnit(UnitId(1))))
        ));
    }

    #[test]
    fn only_the_aimed_unit_reacts_to_a_press() {
        let (mut nodes, board) = build(&[1, 2, 3], &[2, 1, 3]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();

        board.tick(&press(), &PickedUnit(Some(UnitId(2))), 0.0, &mut nodes, &mut feedback);
        assert_eq!(board.unit_state(UnitId(2)), Some(UnitState::Selected));
        assert_eq!(board.unit_state(UnitId(1)), Some(UnitState::Idle));
        assert_eq!(board.held_progress(0.5), Some((UnitId(2), 0.5)));
    }

    #[test]
    fn full_order_completes_once() {
        let (mut nodes, board) = build(&[1, 2, 3], &[2, 1, 3]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();

        for (index, unit) in [2, 1, 3].into_iter().enumerate() {
            tighten(&mut board, &mut nodes, &mut feedback, unit, index as f64 * 2.0);
        }
        let events = board.drain_events();
        assert_eq!(
            events.iter().filter(|e| **e == SequenceEvent::SequenceCompleted).count(),
            1
        );
        assert!(board.controllers().iter().all(InteractionController::tightened));
    }

    #[test]
    fn tutorial_limit_reports_limit_not_completion() {
        let (mut nodes, board) = build(&[1, 2, 3, 4], &[4, 3, 2, 1]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();
        board
            .validator_mut()
            .set_sub_sequence(vec![UnitId(1), UnitId(3)])
            .expect("sub");
        board.validator_mut().set_limit(2);

        tighten(&mut board, &mut nodes, &mut feedback, 1, 0.0);
        tighten(&mut board, &mut nodes, &mut feedback, 3, 2.0);
        let events = board.drain_events();
        assert!(events.contains(&SequenceEvent::LimitReached { step: 2 }));
        assert!(!events.contains(&SequenceEvent::SequenceCompleted));
    }

    #[test]
    fn reset_restores_units_and_positions() {
        let (mut nodes, board) = build(&[1, 2], &[1, 2]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();
        board.save_initial_poses(&nodes);
        let before = nodes.clone();

        tighten(&mut board, &mut nodes, &mut feedback, 1, 0.0);
        assert_eq!(board.unit_state(UnitId(1)), Some(UnitState::Tightened));

        board.reset_all_positions(&mut nodes);
        board.reset_all_units(&mut nodes, &mut feedback);
        for controller in board.controllers() {
            let unit = controller.unit();
            assert_eq!(nodes.local_pose(unit.cap()), before.local_pose(unit.cap()));
            assert_eq!(nodes.local_pose(unit.shaft()), before.local_pose(unit.shaft()));
            assert!(!unit.tightened());
        }
    }

    #[test]
    fn locked_board_ignores_input() {
        let (mut nodes, board) = build(&[1], &[1]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();
        board.set_input_locked(true);
        board.tick(&press(), &PickedUnit(Some(UnitId(1))), 0.0, &mut nodes, &mut feedback);
        assert_eq!(board.unit_state(UnitId(1)), Some(UnitState::Idle));
    }

    #[test]
    fn highlight_targets_one_unit() {
        let (mut nodes, board) = build(&[1, 2], &[1, 2]);
        let mut board = board.expect("board");
        let mut feedback = RecordingFeedback::default();
        board.set_highlight(UnitId(2), true, &mut nodes, &mut feedback);
        assert_eq!(board.unit_state(UnitId(2)), Some(UnitState::Highlighted));
        assert_eq!(board.unit_state(UnitId(1)), Some(UnitState::Idle));
        board.clear_highlights(&mut nodes, &mut feedback);
        assert_eq!(board.unit_state(UnitId(2)), Some(UnitState::Idle));
    }

    #[test]
    fn invalid_interaction_config_is_rejected() {
        let result = AssemblyBoard::new(
            Vec::new(),
            vec![UnitId(1)],
            InteractionConfig {
                hold_duration_seconds: -1.0,
                ..InteractionConfig::default()
            },
            TighteningConfig::default(),
        );
        assert!(matches!(result, Err(BoardError::Config(_))));
    }
}
