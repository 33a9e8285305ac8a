use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::unit::UnitId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    CorrectSelected(UnitId),
    WrongSelected(UnitId),
    /// Whole, non-limited sequence finished.
    SequenceCompleted,
    /// A sub-limit was reached. Never accompanied by `SequenceCompleted`.
    LimitReached { step: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("unit order must not be empty")]
    Empty,
    #[error("unit {0} appears more than once in the order")]
    DuplicateUnit(UnitId),
}

/// Ordered-selection validator with a restorable sub-sequence.
///
/// `original_order` is captured once at construction and is the only restore
/// target; sub-sequences replace the whole working order and never touch it.
#[derive(Debug, Clone)]
pub struct SequenceValidator {
    canonical_order: Vec<UnitId>,
    original_order: Vec<UnitId>,
    current_step: usize,
    sub_limit: Option<usize>,
    events: Vec<SequenceEvent>,
}

impl SequenceValidator {
    pub fn new(order: Vec<UnitId>) -> Result<Self, SequenceError> {
        check_order(&order)?;
        info!(order = %format_order(&order), "sequence_configured");
        Ok(Self {
            original_order: order.clone(),
            canonical_order: order,
            current_step: 0,
            sub_limit: None,
            events: Vec::new(),
        })
    }

    pub fn effective_length(&self) -> usize {
        match self.sub_limit {
            Some(limit) => limit.min(self.canonical_order.len()),
            None => self.canonical_order.len(),
        }
    }

    pub fn validate(&mut self, unit: UnitId) -> bool {
        let max_steps = self.effective_length();
        if self.current_step >= max_steps {
            debug!(
                unit = unit.0,
                step = self.current_step,
                max_steps,
                "selection_after_exhaustion"
            );
            return false;
        }

        let expected = self.canonical_order[self.current_step];
        if unit != expected {
            info!(
                unit = unit.0,
                expected = expected.0,
                step = self.current_step,
                "selection_rejected"
            );
            self.events.push(SequenceEvent::WrongSelected(unit));
            return false;
        }

        self.current_step += 1;
        info!(
            unit = unit.0,
            step = self.current_step,
            max_steps,
            "selection_accepted"
        );
        self.events.push(SequenceEvent::CorrectSelected(unit));
        if self.current_step == max_steps {
            if self.sub_limit.is_some() {
                info!(step = self.current_step, "sequence_limit_reached");
                self.events.push(SequenceEvent::LimitReached {
                    step: self.current_step,
                });
            } else {
                info!(step = self.current_step, "sequence_completed");
                self.events.push(SequenceEvent::SequenceCompleted);
            }
        }
        true
    }

    pub fn next_expected(&self) -> Option<UnitId> {
        if self.current_step >= self.effective_length() {
            return None;
        }
        self.canonical_order.get(self.current_step).copied()
    }

    pub fn reset(&mut self) {
        self.current_step = 0;
        self.sub_limit = None;
        self.restore_original();
    }

    pub fn set_sub_sequence(&mut self, order: Vec<UnitId>) -> Result<(), SequenceError> {
        check_order(&order)?;
        debug!(order = %format_order(&order), "sub_sequence_set");
        self.canonical_order = order;
        self.current_step = 0;
        Ok(())
    }

    /// Non-positive limits mean "no limit".
    pub fn set_limit(&mut self, limit: i64) {
        self.sub_limit = usize::try_from(limit).ok().filter(|value| *value > 0);
        if let Some(value) = self.sub_limit {
            if value > self.canonical_order.len() {
                warn!(
                    limit = value,
                    order_len = self.canonical_order.len(),
                    "sequence_limit_exceeds_order"
                );
            }
        }
        self.current_step = 0;
    }

    pub fn clear_limit(&mut self) {
        self.sub_limit = None;
        self.current_step = 0;
        self.restore_original();
    }

    pub fn is_completed(&self) -> bool {
        self.current_step >= self.effective_length()
    }

    pub fn is_limit_reached(&self) -> bool {
        self.sub_limit.is_some() && self.is_completed()
    }

    pub fn progress_fraction(&self) -> f32 {
        let len = self.effective_length();
        if len == 0 {
            return 1.0;
        }
        self.current_step as f32 / len as f32
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// `-1` when unlimited, matching the external contract.
    pub fn sub_limit(&self) -> i64 {
        self.sub_limit.map_or(-1, |value| value as i64)
    }

    pub fn canonical_order(&self) -> &[UnitId] {
        &self.canonical_order
    }

    pub fn original_order(&self) -> &[UnitId] {
        &self.original_order
    }

    pub fn drain_events(&mut self) -> Vec<SequenceEvent> {
        std::mem::take(&mut self.events)
    }

    fn restore_original(&mut self) {
        self.canonical_order.clone_from(&self.original_order);
    }
}

fn check_order(order: &[UnitId]) -> Result<(), SequenceError> {
    if order.is_empty() {
        return Err(SequenceError::Empty);
    }
    let mut seen = HashSet::with_capacity(order.len());
    for unit in order {
        if !seen.insert(*unit) {
            return Err(SequenceError::DuplicateUnit(*unit));
        }
    }
    Ok(())
}

pub(crate) fn format_order(order: &[UnitId]) -> String {
    order
        .iter()
        .map(|unit| unit.0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
