/// Draws the random tutorial subset. Seeded runs repeat the same subsets.
#[derive(Debug, Clone)]
struct TutorialPicker {
    rng: StdRng,
}

impl TutorialPicker {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Up to `count` distinct units, ascending by id.
    fn pick(&mut self, units: &[UnitId], count: usize) -> Vec<UnitId> {
        let mut chosen = units
            .choose_multiple(&mut self.rng, count.min(units.len()))
            .copied()
            .collect::<Vec<_>>();
        chosen.sort();
        chosen
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SessionCue {
    HideNonTutorialUnits,
    Highlight { unit: UnitId, on: bool },
    ResetPositions,
    EndTutorial,
    ResetBoard,
    StartUnaided,
    BeginGuide,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct HighlightTiming {
    on_seconds: f32,
    gap_seconds: f32,
}

fn highlight_cycle(units: &[UnitId], timing: HighlightTiming) -> Vec<CueStep<SessionCue>> {
    units
        .iter()
        .flat_map(|unit| {
            [
                CueStep::Cue(SessionCue::Highlight {
                    unit: *unit,
                    on: true,
                }),
                CueStep::Wait(timing.on_seconds),
                CueStep::Cue(SessionCue::Highlight {
                    unit: *unit,
                    on: false,
                }),
                CueStep::Wait(timing.gap_seconds),
            ]
        })
        .collect()
}

fn tutorial_intro_track(tutorial: &[UnitId], timing: HighlightTiming) -> Vec<CueStep<SessionCue>> {
    let mut steps = vec![
        CueStep::Wait(TUTORIAL_LEAD_IN_SECONDS),
        CueStep::Cue(SessionCue::HideNonTutorialUnits),
    ];
    steps.extend(highlight_cycle(tutorial, timing));
    steps.push(CueStep::Wait(TUTORIAL_FOCUS_DELAY_SECONDS));
    if let Some(first) = tutorial.first() {
        steps.push(CueStep::Cue(SessionCue::Highlight {
            unit: *first,
            on: true,
        }));
    }
    steps
}

fn guided_preview_track(order: &[UnitId], timing: HighlightTiming) -> Vec<CueStep<SessionCue>> {
    let mut steps = vec![CueStep::Wait(GUIDED_PREVIEW_DELAY_SECONDS)];
    steps.extend(highlight_cycle(order, timing));
    steps.push(CueStep::Cue(SessionCue::BeginGuide));
    steps
}

fn tutorial_wrap_up_track() -> Vec<CueStep<SessionCue>> {
    vec![
        CueStep::Wait(WRAP_UP_PAUSE_SECONDS),
        CueStep::Cue(SessionCue::ResetPositions),
        CueStep::Wait(WRAP_UP_SETTLE_SECONDS),
        CueStep::Cue(SessionCue::EndTutorial),
    ]
}

fn guided_wrap_up_track() -> Vec<CueStep<SessionCue>> {
    vec![
        CueStep::Wait(WRAP_UP_PAUSE_SECONDS),
        CueStep::Cue(SessionCue::ResetBoard),
        CueStep::Wait(WRAP_UP_SETTLE_SECONDS),
        CueStep::Cue(SessionCue::StartUnaided),
    ]
}
