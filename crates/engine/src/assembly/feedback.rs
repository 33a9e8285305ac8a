use super::unit::{UnitId, UnitState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum VisualState {
    #[default]
    Original,
    Highlighted,
    Selected,
    Correct,
    Wrong,
    Tightened,
}

impl From<UnitState> for VisualState {
    fn from(state: UnitState) -> Self {
        match state {
            UnitState::Idle => Self::Original,
            UnitState::Highlighted => Self::Highlighted,
            UnitState::Selected => Self::Selected,
            UnitState::Correct => Self::Correct,
            UnitState::Wrong => Self::Wrong,
            UnitState::Tightened => Self::Tightened,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Correct,
    Wrong,
}

/// Material and audio collaborator. Implementations must tolerate redundant
/// calls with the same state.
pub trait FeedbackSink {
    fn apply_material(&mut self, unit: UnitId, visual: VisualState);
    fn play_sound(&mut self, kind: SoundKind);
}

/// Sink for headless use; drops every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn apply_material(&mut self, _unit: UnitId, _visual: VisualState) {}

    fn play_sound(&mut self, _kind: SoundKind) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingFeedback {
        pub(crate) materials: Vec<(UnitId, VisualState)>,
        pub(crate) sounds: Vec<SoundKind>,
    }

    impl RecordingFeedback {
        pub(crate) fn last_material(&self, unit: UnitId) -> Option<VisualState> {
            self.materials
                .iter()
                .rev()
                .find(|(id, _)| *id == unit)
                .map(|(_, visual)| *visual)
        }
    }

    impl FeedbackSink for RecordingFeedback {
        fn apply_material(&mut self, unit: UnitId, visual: VisualState) {
            self.materials.push((unit, visual));
        }

        fn play_sound(&mut self, kind: SoundKind) {
            self.sounds.push(kind);
        }
    }
}
