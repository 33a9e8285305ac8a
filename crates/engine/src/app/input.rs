use crate::assembly::{PointerSample, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    Restart,
    TogglePause,
    Quit,
}

const ACTION_COUNT: usize = 3;

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::Restart => 0,
            InputAction::TogglePause => 1,
            InputAction::Quit => 2,
        }
    }
}

/// Key state per action with press edges that survive until the next tick
/// snapshot consumes them.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionEdges {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionEdges {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn take_pressed(&mut self) -> [bool; ACTION_COUNT] {
        std::mem::take(&mut self.pressed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InputSnapshot {
    quit_requested: bool,
    pointer: PointerSample,
    actions_pressed: [bool; ACTION_COUNT],
    window_size: (u32, u32),
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::new(false, PointerSample::default(), [false; ACTION_COUNT], (0, 0))
    }

    pub(crate) fn new(
        quit_requested: bool,
        pointer: PointerSample,
        actions_pressed: [bool; ACTION_COUNT],
        window_size: (u32, u32),
    ) -> Self {
        Self {
            quit_requested,
            pointer,
            actions_pressed,
            window_size,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn pointer(&self) -> &PointerSample {
        &self.pointer
    }

    pub fn cursor_position_px(&self) -> Option<Vec2> {
        self.pointer.screen_position
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    pub fn action_pressed(&self, action: InputAction) -> bool {
        self.actions_pressed[action.index()]
    }

    pub fn with_quit_requested(mut self) -> Self {
        self.quit_requested = true;
        self
    }

    pub fn with_pointer(mut self, pointer: PointerSample) -> Self {
        self.pointer = pointer;
        self
    }

    pub fn with_action_pressed(mut self, action: InputAction, pressed: bool) -> Self {
        self.actions_pressed[action.index()] = pressed;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_size = window_size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_key_reports_a_single_edge() {
        let mut edges = ActionEdges::default();
        edges.set(InputAction::Restart, true);
        edges.set(InputAction::Restart, true);
        assert!(edges.take_pressed()[InputAction::Restart.index()]);

        edges.set(InputAction::Restart, true);
        assert!(!edges.take_pressed()[InputAction::Restart.index()]);

        edges.set(InputAction::Restart, false);
        edges.set(InputAction::Restart, true);
        assert!(edges.take_pressed()[InputAction::Restart.index()]);
    }

    #[test]
    fn builder_sets_action_edges() {
        let snapshot = InputSnapshot::empty().with_action_pressed(InputAction::TogglePause, true);
        assert!(snapshot.action_pressed(InputAction::TogglePause));
        assert!(!snapshot.action_pressed(InputAction::Restart));
    }
}
