use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;
use tokio::sync::{broadcast, watch};

use super::attempt::{attempt, attempt_rng, Assignment, Infeasible};
use super::grid::SlotGrid;
use crate::enrollment::EnrollmentIndex;
use crate::error::InputError;
use crate::models::AttemptStatus;

pub const DEFAULT_RESTART_BUDGET: usize = 100;
pub const DEFAULT_ROOM_COUNT: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverParameters {
    pub restart_budget: usize,
    /// Drawn at random when absent; the seed actually used is reported back.
    pub seed: Option<u64>,
    pub parallel: bool,
    pub room_count: u32,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            restart_budget: DEFAULT_RESTART_BUDGET,
            seed: None,
            parallel: false,
            room_count: DEFAULT_ROOM_COUNT,
        }
    }
}

/// Result of a solving run. `complete == false` means some courses are
/// missing from `assignment` and are listed in `unplaced`.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub assignment: Assignment,
    pub complete: bool,
    pub cancelled: bool,
    /// Number of attempts started, counting the successful one.
    pub attempts: usize,
    pub seed: u64,
    /// Course indexes absent from `assignment`, in name order.
    pub unplaced: Vec<usize>,
}

enum RunResult {
    Solved { attempt: usize, assignment: Assignment },
    Exhausted { last: Option<(usize, Infeasible)>, cancelled: bool },
}

pub struct RestartSolver<'a> {
    index: &'a EnrollmentIndex,
    grid: SlotGrid,
    parameters: SolverParameters,
    status_tx: Option<broadcast::Sender<AttemptStatus>>,
    stop_rx: Option<watch::Receiver<bool>>,
}

impl<'a> RestartSolver<'a> {
    pub fn new(index: &'a EnrollmentIndex, parameters: SolverParameters) -> Self {
        Self {
            index,
            grid: SlotGrid::new(),
            parameters,
            status_tx: None,
            stop_rx: None,
        }
    }

    pub fn with_status(mut self, status_tx: broadcast::Sender<AttemptStatus>) -> Self {
        self.status_tx = Some(status_tx);
        self
    }

    pub fn with_stop(mut self, stop_rx: watch::Receiver<bool>) -> Self {
        self.stop_rx = Some(stop_rx);
        self
    }

    /// Runs attempts until one places every course or the budget is spent.
    ///
    /// Malformed enrollments are rejected before the first attempt.
    pub fn solve(&self) -> Result<SolveOutcome, InputError> {
        self.index.validate(&self.grid)?;

        let seed = self.parameters.seed.unwrap_or_else(rand::random);
        let budget = self.parameters.restart_budget.max(1);
        let start = Instant::now();

        info!(
            "Solving timetable: {} courses, {} students, budget {}, seed {}, parallel {}",
            self.index.courses().len(),
            self.index.students().len(),
            budget,
            seed,
            self.parameters.parallel
        );

        let run = if self.parameters.parallel {
            self.run_parallel(seed, budget, &start)
        } else {
            self.run_sequential(seed, budget, &start)
        };

        let outcome = match run {
            RunResult::Solved { attempt, assignment } => {
                info!(
                    "Timetable complete after {} attempt(s) in {:.2?}",
                    attempt + 1,
                    start.elapsed()
                );
                SolveOutcome {
                    assignment,
                    complete: true,
                    cancelled: false,
                    attempts: attempt + 1,
                    seed,
                    unplaced: Vec::new(),
                }
            }
            RunResult::Exhausted { last, cancelled } => {
                let (attempts, assignment) = match last {
                    Some((n, infeasible)) => (n + 1, infeasible.partial),
                    None => (0, Assignment::default()),
                };
                let unplaced = self.unplaced(&assignment);
                let complete = unplaced.is_empty();
                if cancelled {
                    warn!("Solving stopped after {} attempt(s); {} course(s) unplaced", attempts, unplaced.len());
                } else {
                    warn!(
                        "Restart budget exhausted after {} attempt(s); returning partial timetable with {} course(s) unplaced",
                        attempts,
                        unplaced.len()
                    );
                }
                SolveOutcome {
                    assignment,
                    complete,
                    cancelled,
                    attempts,
                    seed,
                    unplaced,
                }
            }
        };

        self.send_status(AttemptStatus {
            attempt: outcome.attempts,
            placed: outcome.assignment.len(),
            total_courses: self.index.courses().len(),
            success: outcome.complete,
            elapsed_ms: start.elapsed().as_millis() as u64,
            is_finished: true,
        });

        Ok(outcome)
    }

    fn run_sequential(&self, seed: u64, budget: usize, start: &Instant) -> RunResult {
        let mut last = None;

        for n in 0..budget {
            if self.stop_requested() {
                info!("Stop requested before attempt {}", n + 1);
                return RunResult::Exhausted { last, cancelled: true };
            }

            match self.run_attempt(seed, n, start) {
                Ok(assignment) => return RunResult::Solved { attempt: n, assignment },
                Err(infeasible) => last = Some((n, infeasible)),
            }
        }

        RunResult::Exhausted { last, cancelled: false }
    }

    /// Attempts run on the rayon pool; the lowest-numbered success wins, so
    /// the outcome matches a sequential run with the same seed.
    fn run_parallel(&self, seed: u64, budget: usize, start: &Instant) -> RunResult {
        let highest_run = AtomicUsize::new(0);
        let stopped = AtomicBool::new(false);

        let found = (0..budget).into_par_iter().find_map_first(|n| {
            if self.stop_requested() {
                stopped.store(true, Ordering::Relaxed);
                return None;
            }
            let result = self.run_attempt(seed, n, start);
            highest_run.fetch_max(n + 1, Ordering::Relaxed);
            result.ok().map(|assignment| (n, assignment))
        });

        if let Some((attempt, assignment)) = found {
            return RunResult::Solved { attempt, assignment };
        }

        let cancelled = stopped.load(Ordering::Relaxed);
        let last = match highest_run.load(Ordering::Relaxed) {
            0 => None,
            ran => {
                // Replay the last attempt that ran from its own stream.
                let n = ran - 1;
                let mut rng = attempt_rng(seed, n);
                match attempt(self.index, &self.grid, self.parameters.room_count, &mut rng) {
                    Ok(assignment) => return RunResult::Solved { attempt: n, assignment },
                    Err(infeasible) => Some((n, infeasible)),
                }
            }
        };

        RunResult::Exhausted { last, cancelled }
    }

    fn run_attempt(&self, seed: u64, n: usize, start: &Instant) -> Result<Assignment, Infeasible> {
        let mut rng = attempt_rng(seed, n);
        let result = attempt(self.index, &self.grid, self.parameters.room_count, &mut rng);

        let placed = match &result {
            Ok(assignment) => assignment.len(),
            Err(infeasible) => {
                debug!(
                    "Attempt {} failed: no feasible slot for '{}' after placing {} course(s)",
                    n + 1,
                    self.index.course(infeasible.blocked).name,
                    infeasible.partial.len()
                );
                infeasible.partial.len()
            }
        };

        self.send_status(AttemptStatus {
            attempt: n + 1,
            placed,
            total_courses: self.index.courses().len(),
            success: result.is_ok(),
            elapsed_ms: start.elapsed().as_millis() as u64,
            is_finished: false,
        });

        result
    }

    fn unplaced(&self, assignment: &Assignment) -> Vec<usize> {
        let mut placed = vec![false; self.index.courses().len()];
        for placement in &assignment.placements {
            placed[placement.course] = true;
        }
        placed
            .iter()
            .enumerate()
            .filter(|&(_, &is_placed)| !is_placed)
            .map(|(i, _)| i)
            .collect()
    }

    fn stop_requested(&self) -> bool {
        self.stop_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    fn send_status(&self, status: AttemptStatus) {
        if let Some(tx) = &self.status_tx {
            // Nobody listening is fine.
            let _ = tx.send(status);
        }
    }
}
