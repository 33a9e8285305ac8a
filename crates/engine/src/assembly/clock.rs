/// Time as seen by one logical tick.
pub trait TickSource {
    fn now(&self) -> f64;
    fn delta_time(&self) -> f32;
}

/// Simulation clock advanced explicitly by the tick scheduler. Paused time
/// never accrues.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedStepClock {
    now: f64,
    last_dt: f32,
    ticks: u64,
}

impl FixedStepClock {
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.now += f64::from(dt);
        self.last_dt = dt;
        self.ticks += 1;
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl TickSource for FixedStepClock {
    fn now(&self) -> f64 {
        self.now
    }

    fn delta_time(&self) -> f32 {
        self.last_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_time_and_ticks() {
        let mut clock = FixedStepClock::default();
        clock.advance(0.25);
        clock.advance(0.5);
        assert_eq!(clock.now(), 0.75);
        assert_eq!(clock.delta_time(), 0.5);
        assert_eq!(clock.ticks(), 2);
    }

    #[test]
    fn bad_deltas_do_not_move_time() {
        let mut clock = FixedStepClock::default();
        clock.advance(-1.0);
        clock.advance(f32::NAN);
        assert_eq!(clock.now(), 0.0);
    }
}
