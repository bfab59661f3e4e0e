//! Soft-constraint scoring for a candidate slot.
//!
//! Priority, strongest first: fill an empty day, bring a one-class day up to
//! two, leave a satisfied day alone, keep a nearly full day free.

/// Contribution of one student to a slot's score, given how many classes
/// that student already has on the slot's day. Lower is better.
pub fn load_penalty(existing: usize) -> i64 {
    match existing {
        0 => -1000,
        1 => -500,
        2 => 100,
        _ => 500,
    }
}
