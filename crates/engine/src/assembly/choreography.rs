use std::collections::VecDeque;

use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum CueStep<C> {
    Wait(f32),
    Cue(C),
}

#[derive(Debug, Clone)]
struct CueTrack<C> {
    label: &'static str,
    steps: VecDeque<CueStep<C>>,
    waited: f32,
}

/// Multi-tick waits with saved resume state. Nothing runs in the
/// background; `advance` is the only thing that moves a track forward.
#[derive(Debug, Clone)]
pub struct Choreographer<C> {
    tracks: Vec<CueTrack<C>>,
}

impl<C> Default for Choreographer<C> {
    fn default() -> Self {
        Self { tracks: Vec::new() }
    }
}

impl<C> Choreographer<C> {
    pub fn play(&mut self, label: &'static str, steps: impl IntoIterator<Item = CueStep<C>>) {
        let steps = steps.into_iter().collect::<VecDeque<_>>();
        debug!(track = label, steps = steps.len(), "cue_track_started");
        self.tracks.push(CueTrack {
            label,
            steps,
            waited: 0.0,
        });
    }

    pub fn is_idle(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn is_playing(&self, label: &str) -> bool {
        self.tracks.iter().any(|track| track.label == label)
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Stops every track at once.
    pub fn stop_all(&mut self) {
        if !self.tracks.is_empty() {
            debug!(tracks = self.tracks.len(), "cue_tracks_stopped");
        }
        self.tracks.clear();
    }

    /// Returns cues that became due, in track then step order. Time left
    /// over after a finished wait carries into the next wait.
    pub fn advance(&mut self, dt: f32) -> Vec<C> {
        let mut due = Vec::new();
        for track in &mut self.tracks {
            let mut budget = track.waited + dt.max(0.0);
            track.waited = 0.0;
            while let Some(step) = track.steps.front() {
                match step {
                    CueStep::Wait(seconds) => {
                        let seconds = seconds.max(0.0);
                        if budget < seconds {
                            track.waited = budget;
                            break;
                        }
                        budget -= seconds;
                        track.steps.pop_front();
                    }
                    CueStep::Cue(_) => {
                        if let Some(CueStep::Cue(cue)) = track.steps.pop_front() {
                            due.push(cue);
                        }
                    }
                }
            }
        }
        self.tracks.retain(|track| {
            let done = track.steps.is_empty();
            if done {
                debug!(track = track.label, "cue_track_finished");
            }
            !done
        });
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_cues_fire_on_first_advance() {
        let mut choreo = Choreographer::default();
        choreo.play("intro", [CueStep::Cue(1), CueStep::Cue(2), CueStep::Wait(1.0), CueStep::Cue(3)]);
        assert_eq!(choreo.advance(0.0), vec![1, 2]);
        assert!(choreo.is_playing("intro"));
    }

    #[test]
    fn waits_accumulate_across_ticks() {
        let mut choreo = Choreographer::default();
        choreo.play("cycle", [CueStep::Wait(1.0), CueStep::Cue("on")]);
        assert!(choreo.advance(0.4).is_empty());
        assert!(choreo.advance(0.4).is_empty());
        assert_eq!(choreo.advance(0.4), vec!["on"]);
        assert!(choreo.is_idle());
    }

    #[test]
    fn leftover_time_carries_into_following_waits() {
        let mut choreo = Choreographer::default();
        choreo.play(
            "cycle",
            [
                CueStep::Wait(0.5),
                CueStep::Cue('a'),
                CueStep::Wait(0.5),
                CueStep::Cue('b'),
                CueStep::Wait(0.5),
                CueStep::Cue('c'),
            ],
        );
        assert_eq!(choreo.advance(1.2), vec!['a', 'b']);
        assert_eq!(choreo.advance(0.3), vec!['c']);
    }

    #[test]
    fn stop_all_cancels_pending_cues() {
        let mut choreo = Choreographer::default();
        choreo.play("one", [CueStep::Wait(1.0), CueStep::Cue(1)]);
        choreo.play("two", [CueStep::Wait(2.0), CueStep::Cue(2)]);
        assert_eq!(choreo.track_count(), 2);
        choreo.stop_all();
        assert!(choreo.advance(5.0).is_empty());
        assert!(choreo.is_idle());
    }

    #[test]
    fn parallel_tracks_fire_in_start_order() {
        let mut choreo = Choreographer::default();
        choreo.play("late", [CueStep::Wait(1.0), CueStep::Cue("late")]);
        choreo.play("early", [CueStep::Wait(0.5), CueStep::Cue("early")]);
        assert_eq!(choreo.advance(1.0), vec!["late", "early"]);
    }
}
