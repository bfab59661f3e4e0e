use serde::{Deserialize, Serialize};

use crate::enrollment::{CourseRecord, StudentRecord};
use crate::solver::SolverParameters;

#[derive(Debug, Deserialize, Clone)]
pub struct CourseRequest {
    pub name: String,
    #[serde(default)]
    pub instructor: Option<String>,
    pub students: Vec<String>,
}

impl From<CourseRequest> for CourseRecord {
    fn from(req: CourseRequest) -> Self {
        CourseRecord {
            name: req.name,
            instructor: req.instructor,
            students: req.students.into_iter().map(StudentRecord::with_id).collect(),
        }
    }
}

/// Per-request overrides of the configured solver defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SolveParameters {
    pub restart_budget: Option<usize>,
    pub seed: Option<u64>,
    pub parallel: Option<bool>,
    pub room_count: Option<u32>,
}

impl SolveParameters {
    pub fn resolve(&self, defaults: &SolverParameters) -> SolverParameters {
        SolverParameters {
            restart_budget: self.restart_budget.unwrap_or(defaults.restart_budget),
            seed: self.seed.or(defaults.seed),
            parallel: self.parallel.unwrap_or(defaults.parallel),
            room_count: self.room_count.unwrap_or(defaults.room_count),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TimetableRequest {
    pub courses: Vec<CourseRequest>,
    #[serde(default)]
    pub parameters: SolveParameters,
}

/// Progress event broadcast after every attempt and once when solving ends.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttemptStatus {
    pub attempt: usize,
    pub placed: usize,
    pub total_courses: usize,
    pub success: bool,
    pub elapsed_ms: u64,
    pub is_finished: bool,
}
