use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(pub u32);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UnitState {
    #[default]
    Idle,
    Highlighted,
    Selected,
    Correct,
    Wrong,
    Tightened,
}

impl UnitState {
    /// States in which a gesture session may be live.
    pub fn holds_session(self) -> bool {
        matches!(self, Self::Selected | Self::Correct)
    }

    pub fn as_token(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Highlighted => "highlighted",
            Self::Selected => "selected",
            Self::Correct => "correct",
            Self::Wrong => "wrong",
            Self::Tightened => "tightened",
        }
    }
}

/// One fastener pair. The cap/shaft pairing is declared once at setup and
/// never re-discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyUnit {
    id: UnitId,
    cap: NodeHandle,
    shaft: NodeHandle,
    state: UnitState,
    tightened: bool,
}

impl AssemblyUnit {
    pub fn new(id: UnitId, cap: NodeHandle, shaft: NodeHandle) -> Self {
        Self {
            id,
            cap,
            shaft,
            state: UnitState::Idle,
            tightened: false,
        }
    }

    pub fn id(&self) -> UnitId {
        self.id
    }

    pub fn cap(&self) -> NodeHandle {
        self.cap
    }

    pub fn shaft(&self) -> NodeHandle {
        self.shaft
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn tightened(&self) -> bool {
        self.tightened
    }

    pub(crate) fn set_state(&mut self, state: UnitState) {
        self.state = state;
    }

    pub(crate) fn mark_tightened(&mut self) {
        self.tightened = true;
        self.state = UnitState::Tightened;
    }

    pub(crate) fn clear(&mut self) {
        self.tightened = false;
        self.state = UnitState::Idle;
    }
}
