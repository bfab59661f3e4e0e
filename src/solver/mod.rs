//! Randomized restart solver placing every course in one weekly slot.

pub mod attempt;
pub mod driver;
pub mod grid;
pub mod penalty;
pub mod tracker;

pub use attempt::Assignment;
pub use driver::{RestartSolver, SolveOutcome, SolverParameters};
pub use grid::{Day, Slot, SlotGrid, TimeRange};
