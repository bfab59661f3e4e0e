use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::grid::{Slot, SlotGrid};
use super::penalty::load_penalty;
use super::tracker::LoadTracker;
use crate::enrollment::{Course, EnrollmentIndex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Index into the enrollment index's course list.
    pub course: usize,
    pub slot: Slot,
    pub room: u32,
}

/// Courses placed by one attempt, in placement order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub placements: Vec<Placement>,
}

impl Assignment {
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

/// An attempt that hit a course with no feasible slot.
#[derive(Debug, Clone)]
pub struct Infeasible {
    pub partial: Assignment,
    pub blocked: usize,
}

/// Random stream for one attempt. Every attempt of a run gets its own
/// stream of the same seed, so attempts can run in any order or in parallel.
pub fn attempt_rng(seed: u64, attempt: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(attempt as u64);
    rng
}

/// One randomized greedy pass over every course.
///
/// Courses are visited in a random order. For each course the slots are
/// shuffled and scored; the feasible slot with the lowest score wins, the
/// earliest candidate breaking ties. The pass stops at the first course
/// without any feasible slot.
pub fn attempt<R: Rng>(
    index: &EnrollmentIndex,
    grid: &SlotGrid,
    room_count: u32,
    rng: &mut R,
) -> Result<Assignment, Infeasible> {
    let mut tracker = LoadTracker::new();
    let mut assignment = Assignment {
        placements: Vec::with_capacity(index.courses().len()),
    };

    let mut order: Vec<usize> = (0..index.courses().len()).collect();
    order.shuffle(rng);

    let mut candidates = grid.slots().to_vec();

    for course_idx in order {
        let course = index.course(course_idx);
        candidates.shuffle(rng);

        let Some((slot, _)) = best_slot(course, &candidates, &tracker) else {
            return Err(Infeasible {
                partial: assignment,
                blocked: course_idx,
            });
        };

        let room = rng.random_range(1..=room_count.max(1));
        for &student in &course.students {
            tracker.record(student, slot);
        }
        assignment.placements.push(Placement {
            course: course_idx,
            slot,
            room,
        });
    }

    Ok(assignment)
}

/// Lowest-scoring feasible candidate, first one encountered on ties.
pub fn best_slot(course: &Course, candidates: &[Slot], tracker: &LoadTracker) -> Option<(Slot, i64)> {
    let mut best: Option<(Slot, i64)> = None;

    for &slot in candidates {
        if let Some(score) = score_slot(course, slot, tracker) {
            if best.is_none_or(|(_, lowest)| score < lowest) {
                best = Some((slot, score));
            }
        }
    }

    best
}

/// Total penalty of placing `course` at `slot`, or `None` when any enrolled
/// student already sits in that slot or is at the daily cap.
pub fn score_slot(course: &Course, slot: Slot, tracker: &LoadTracker) -> Option<i64> {
    let mut total = 0;

    for &student in &course.students {
        if tracker.occupies(student, slot) {
            return None;
        }
        let existing = tracker.day_load(student, slot.day);
        if existing >= SlotGrid::DAILY_CAP {
            return None;
        }
        total += load_penalty(existing);
    }

    Some(total)
}
