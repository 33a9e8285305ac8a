#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameOverReason {
    AttemptsExhausted,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionPhase {
    Tutorial,
    TutorialWrapUp,
    Guided,
    GuidedWrapUp,
    Unaided,
    Completed,
    GameOver(GameOverReason),
}

impl SessionPhase {
    fn as_token(self) -> &'static str {
        match self {
            Self::Tutorial => "tutorial",
            Self::TutorialWrapUp => "tutorial_wrap_up",
            Self::Guided => "guided",
            Self::GuidedWrapUp => "guided_wrap_up",
            Self::Unaided => "unaided",
            Self::Completed => "completed",
            Self::GameOver(_) => "game_over",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Tutorial | Self::TutorialWrapUp => "Tutorial",
            Self::Guided | Self::GuidedWrapUp => "Guided",
            Self::Unaided => "Unaided",
            Self::Completed => "Complete",
            Self::GameOver(GameOverReason::AttemptsExhausted) => "Out of attempts",
            Self::GameOver(GameOverReason::TimedOut) => "Time up",
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::GameOver(_))
    }

    /// Phases in which the clock runs and wrong selections cost an attempt.
    fn is_scored(self) -> bool {
        matches!(self, Self::Guided | Self::Unaided)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SessionRules {
    tutorial_unit_count: usize,
    time_limit_seconds: f32,
    guided_max_attempts: u32,
    unaided_max_attempts: u32,
    timing: HighlightTiming,
}

impl SessionRules {
    fn from_config(config: &PuzzleConfig) -> Self {
        Self {
            tutorial_unit_count: config.tutorial_unit_count,
            time_limit_seconds: config.time_limit_seconds,
            guided_max_attempts: config.guided_max_attempts,
            unaided_max_attempts: config.unaided_max_attempts,
            timing: HighlightTiming {
                on_seconds: config.highlight_seconds,
                gap_seconds: config.highlight_interval_seconds,
            },
        }
    }
}

/// Runs tutorial, guided and unaided play on top of the assembly board:
/// phases, attempts, the clock and every timed transition.
#[derive(Debug)]
struct SessionOrchestrator {
    rules: SessionRules,
    board: AssemblyBoard,
    cues: Choreographer<SessionCue>,
    picker: TutorialPicker,
    clock: FixedStepClock,
    phase: SessionPhase,
    tutorial_units: Vec<UnitId>,
    guide_active: bool,
    elapsed_seconds: f32,
    attempts: u32,
    attempt_limit: u32,
    paused: bool,
}

impl SessionOrchestrator {
    fn new(config: &PuzzleConfig, units: Vec<AssemblyUnit>) -> Result<Self, BoardError> {
        let board = AssemblyBoard::new(
            units,
            config.canonical_units(),
            config.interaction,
            config.tightening,
        )?;
        Ok(Self {
            rules: SessionRules::from_config(config),
            board,
            cues: Choreographer::default(),
            picker: TutorialPicker::new(config.tutorial_seed),
            clock: FixedStepClock::default(),
            phase: SessionPhase::Tutorial,
            tutorial_units: Vec::new(),
            guide_active: false,
            elapsed_seconds: 0.0,
            attempts: 0,
            attempt_limit: 0,
            paused: false,
        })
    }

    /// Captures the rest poses and starts the tutorial.
    fn begin(&mut self, world: &mut SceneWorld) {
        self.board.save_initial_poses(world.nodes());
        self.start_tutorial(world);
    }

    #[cfg(test)]
    fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[cfg(test)]
    fn board(&self) -> &AssemblyBoard {
        &self.board
    }

    #[cfg(test)]
    fn tutorial_units(&self) -> &[UnitId] {
        &self.tutorial_units
    }

    #[cfg(test)]
    fn attempts(&self) -> u32 {
        self.attempts
    }

    #[cfg(test)]
    fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    #[cfg(test)]
    fn is_paused(&self) -> bool {
        self.paused
    }

    #[cfg(test)]
    fn is_guiding(&self) -> bool {
        self.guide_active
    }

    fn toggle_pause(&mut self) {
        self.paused = !self.paused;
        info!(paused = self.paused, phase = self.phase.as_token(), "session_pause_toggled");
    }

    fn restart(&mut self, world: &mut SceneWorld) {
        info!(phase = self.phase.as_token(), "session_restart");
        self.cues.stop_all();
        self.paused = false;
        self.board.validator_mut().reset();
        let (nodes, visuals) = world.split_mut();
        self.board.reset_all_positions(nodes);
        self.board.reset_all_units(nodes, visuals);
        visuals.show_all();
        self.start_tutorial(world);
    }

    fn tick(
        &mut self,
        dt: f32,
        pointer: &PointerSample,
        aim: &dyn AimProvider,
        world: &mut SceneWorld,
    ) {
        if self.paused {
            return;
        }
        self.clock.advance(dt);
        let now = self.clock.now();

        let (nodes, visuals) = world.split_mut();
        self.board.tick(pointer, aim, now, nodes, visuals);
        for event in self.board.drain_events() {
            self.handle_event(event, world);
        }
        for cue in self.cues.advance(self.clock.delta_time()) {
            self.apply_cue(cue, world);
        }
        self.refresh_guide(world);
        self.accrue_time();
        self.lock_when_settled();
        world.set_hold_progress(self.board.held_progress(now));
    }

    fn start_tutorial(&mut self, world: &mut SceneWorld) {
        self.cues.stop_all();
        self.guide_active = false;
        self.elapsed_seconds = 0.0;
        self.attempts = 0;
        self.attempt_limit = 0;

        let units = self.board.unit_ids();
        let tutorial = self.picker.pick(&units, self.rules.tutorial_unit_count);
        self.board.validator_mut().reset();
        if let Err(error) = self.board.validator_mut().set_sub_sequence(tutorial.clone()) {
            warn!(error = %error, "tutorial_unavailable");
            self.end_tutorial(world);
            return;
        }
        self.board.validator_mut().set_limit(tutorial.len() as i64);

        let (nodes, visuals) = world.split_mut();
        visuals.show_all();
        self.board.reset_all_units(nodes, visuals);
        self.board.set_input_locked(false);
        self.enter_phase(SessionPhase::Tutorial);
        info!(units = %format_units(&tutorial), "tutorial_started");
        self.cues.play(
            TUTORIAL_INTRO_TRACK,
            tutorial_intro_track(&tutorial, self.rules.timing),
        );
        self.tutorial_units = tutorial;
    }

    fn end_tutorial(&mut self, world: &mut SceneWorld) {
        self.cues.stop_all();
        let validator = self.board.validator_mut();
        validator.clear_limit();
        validator.reset();

        let (nodes, visuals) = world.split_mut();
        visuals.show_all();
        self.board.reset_all_units(nodes, visuals);
        self.board.set_input_locked(false);
        self.tutorial_units.clear();
        self.guide_active = false;
        self.elapsed_seconds = 0.0;
        self.attempts = 0;
        self.attempt_limit = self.rules.guided_max_attempts;
        self.enter_phase(SessionPhase::Guided);

        let order = self.board.validator().canonical_order().to_vec();
        self.cues.play(
            GUIDED_PREVIEW_TRACK,
            guided_preview_track(&order, self.rules.timing),
        );
    }

    fn start_unaided(&mut self, world: &mut SceneWorld) {
        self.cues.stop_all();
        self.guide_active = false;
        self.board.validator_mut().reset();
        let (nodes, visuals) = world.split_mut();
        self.board.clear_highlights(nodes, visuals);
        self.elapsed_seconds = 0.0;
        self.attempts = 0;
        self.attempt_limit = self.rules.unaided_max_attempts;
        self.enter_phase(SessionPhase::Unaided);
    }

    fn handle_event(&mut self, event: SequenceEvent, world: &mut SceneWorld) {
        if self.phase.is_terminal() {
            debug!(?event, phase = self.phase.as_token(), "event_after_session_end");
            return;
        }
        match event {
            SequenceEvent::CorrectSelected(_) => {
                world.visuals_mut().play_sound(SoundKind::Correct);
            }
            SequenceEvent::WrongSelected(unit) => self.register_wrong(unit, world),
            SequenceEvent::LimitReached { step } => {
                if self.phase != SessionPhase::Tutorial {
                    debug!(step, phase = self.phase.as_token(), "limit_outside_tutorial");
                    return;
                }
                info!(step, "tutorial_limit_reached");
                self.cues.stop_all();
                self.enter_phase(SessionPhase::TutorialWrapUp);
                self.cues.play(TUTORIAL_WRAP_UP_TRACK, tutorial_wrap_up_track());
            }
            SequenceEvent::SequenceCompleted => match self.phase {
                SessionPhase::Guided => {
                    self.cues.stop_all();
                    self.guide_active = false;
                    self.enter_phase(SessionPhase::GuidedWrapUp);
                    self.cues.play(GUIDED_WRAP_UP_TRACK, guided_wrap_up_track());
                }
                SessionPhase::Unaided => {
                    self.enter_phase(SessionPhase::Completed);
                    info!(
                        elapsed_seconds = self.elapsed_seconds,
                        attempts = self.attempts,
                        "session_completed"
                    );
                }
                other => debug!(phase = other.as_token(), "sequence_completed_ignored"),
            },
        }
    }

    fn register_wrong(&mut self, unit: UnitId, world: &mut SceneWorld) {
        if !self.phase.is_scored() {
            debug!(unit = unit.0, phase = self.phase.as_token(), "wrong_selection_not_counted");
            return;
        }
        self.attempts = self.attempts.saturating_add(1);
        world.visuals_mut().play_sound(SoundKind::Wrong);
        info!(
            unit = unit.0,
            attempts = self.attempts,
            max_attempts = self.attempt_limit,
            "attempt_failed"
        );
        if self.attempt_limit > 0 && self.attempts >= self.attempt_limit {
            self.game_over(GameOverReason::AttemptsExhausted);
        }
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.cues.stop_all();
        self.guide_active = false;
        self.enter_phase(SessionPhase::GameOver(reason));
        info!(
            reason = ?reason,
            elapsed_seconds = self.elapsed_seconds,
            attempts = self.attempts,
            "session_over"
        );
    }

    fn apply_cue(&mut self, cue: SessionCue, world: &mut SceneWorld) {
        debug!(?cue, "session_cue");
        match cue {
            SessionCue::HideNonTutorialUnits => {
                let visuals = world.visuals_mut();
                for unit in self.board.unit_ids() {
                    if !self.tutorial_units.contains(&unit) {
                        visuals.set_hidden(unit, true);
                    }
                }
            }
            SessionCue::Highlight { unit, on } => {
                let (nodes, visuals) = world.split_mut();
                self.board.set_highlight(unit, on, nodes, visuals);
            }
            SessionCue::ResetPositions => self.board.reset_all_positions(world.nodes_mut()),
            SessionCue::EndTutorial => self.end_tutorial(world),
            SessionCue::ResetBoard => {
                let (nodes, visuals) = world.split_mut();
                self.board.reset_all_positions(nodes);
                self.board.reset_all_units(nodes, visuals);
            }
            SessionCue::StartUnaided => self.start_unaided(world),
            SessionCue::BeginGuide => {
                self.guide_active = true;
                info!("guided_hints_enabled");
            }
        }
    }

    /// Keeps exactly the next expected unit highlighted while guiding.
    fn refresh_guide(&mut self, world: &mut SceneWorld) {
        if !self.guide_active || self.phase != SessionPhase::Guided {
            return;
        }
        let next = self.board.validator().next_expected();
        let states = self
            .board
            .controllers()
            .iter()
            .map(|controller| (controller.id(), controller.state()))
            .collect::<Vec<_>>();
        let (nodes, visuals) = world.split_mut();
        for (unit, state) in states {
            let wanted = next == Some(unit);
            if wanted && state == UnitState::Idle {
                self.board.set_highlight(unit, true, nodes, visuals);
            } else if !wanted && state == UnitState::Highlighted {
                self.board.set_highlight(unit, false, nodes, visuals);
            }
        }
    }

    fn accrue_time(&mut self) {
        if !self.phase.is_scored() {
            return;
        }
        self.elapsed_seconds += self.clock.delta_time();
        let limit = self.rules.time_limit_seconds;
        if limit > 0.0 && self.elapsed_seconds >= limit {
            self.game_over(GameOverReason::TimedOut);
        }
    }

    /// Terminal phases lock input once no gesture is mid-flight, so the last
    /// accepted unit still finishes tightening.
    fn lock_when_settled(&mut self) {
        if !self.phase.is_terminal() || self.board.is_input_locked() {
            return;
        }
        let settled = self
            .board
            .controllers()
            .iter()
            .all(|controller| !controller.state().holds_session());
        if settled {
            self.board.set_input_locked(true);
        }
    }

    fn enter_phase(&mut self, phase: SessionPhase) {
        if self.phase != phase {
            info!(
                from = self.phase.as_token(),
                to = phase.as_token(),
                "session_phase_changed"
            );
        }
        self.phase = phase;
    }

    fn time_remaining(&self) -> Option<f32> {
        let limit = self.rules.time_limit_seconds;
        (limit > 0.0).then(|| (limit - self.elapsed_seconds).max(0.0))
    }

    fn hud_text(&self) -> String {
        let validator = self.board.validator();
        let mut text = format!(
            "Torque | {} | {}/{}",
            self.phase.title(),
            validator.current_step(),
            validator.effective_length()
        );
        if !matches!(
            self.phase,
            SessionPhase::Tutorial | SessionPhase::TutorialWrapUp
        ) {
            text.push_str(&format!(" | {}", format_clock(self.elapsed_seconds)));
            if let Some(remaining) = self.time_remaining() {
                text.push_str(&format!(" ({} left)", format_clock(remaining)));
            }
            if self.attempt_limit > 0 {
                text.push_str(&format!(
                    " | attempts {}/{}",
                    self.attempts, self.attempt_limit
                ));
            } else {
                text.push_str(&format!(" | attempts {}", self.attempts));
            }
        }
        if self.paused {
            text.push_str(" | paused");
        }
        if self.phase.is_terminal() {
            text.push_str(" | R to restart");
        }
        text
    }
}

fn format_clock(seconds: f32) -> String {
    let total = seconds.max(0.0).floor() as u32;
    format!("{:02}:{:02}", total / 60, total % 60)
}

fn format_units(units: &[UnitId]) -> String {
    units
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
