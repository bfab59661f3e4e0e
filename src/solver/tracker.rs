use hashbrown::HashMap;

use super::grid::{Day, Slot, TimeRange};
use crate::enrollment::StudentKey;

/// Per-student, per-day record of the periods already taken within one attempt.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    occupied: HashMap<(StudentKey, Day), Vec<TimeRange>>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupies(&self, student: StudentKey, slot: Slot) -> bool {
        self.occupied
            .get(&(student, slot.day))
            .is_some_and(|times| times.contains(&slot.time))
    }

    pub fn day_load(&self, student: StudentKey, day: Day) -> usize {
        self.occupied.get(&(student, day)).map_or(0, Vec::len)
    }

    pub fn record(&mut self, student: StudentKey, slot: Slot) {
        self.occupied
            .entry((student, slot.day))
            .or_default()
            .push(slot.time);
    }
}
