//! Output timetable: the solver's assignment projected to printable records.

use std::collections::HashSet;

use hashbrown::HashMap;
use serde::Serialize;

use crate::enrollment::{EnrollmentIndex, StudentKey};
use crate::solver::{Assignment, Day, Slot, SlotGrid, SolveOutcome, TimeRange};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimetableEntry {
    pub course: String,
    pub instructor: String,
    pub day: Day,
    pub time_range: TimeRange,
    pub room_label: String,
}

/// Constraint audit of an assignment, counted over every student.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstraintReport {
    /// Extra courses sharing a student's slot.
    pub clashes: usize,
    /// (student, day) pairs above the daily cap.
    pub daily_cap_violations: usize,
    /// (student, day) pairs with exactly one class.
    pub single_class_days: usize,
    /// (student, day) pairs with no class, for students with any class at all.
    pub leave_days: usize,
}

impl ConstraintReport {
    pub fn check(index: &EnrollmentIndex, assignment: &Assignment) -> Self {
        let mut per_slot: HashMap<(StudentKey, Slot), usize> = HashMap::new();
        let mut per_day: HashMap<(StudentKey, Day), usize> = HashMap::new();

        for placement in &assignment.placements {
            for &student in &index.course(placement.course).students {
                *per_slot.entry((student, placement.slot)).or_insert(0) += 1;
                *per_day.entry((student, placement.slot.day)).or_insert(0) += 1;
            }
        }

        let clashes: usize = per_slot.values().map(|&n| n.saturating_sub(1)).sum();
        let daily_cap_violations = per_day
            .values()
            .filter(|&&n| n > SlotGrid::DAILY_CAP)
            .count();
        let single_class_days = per_day.values().filter(|&&n| n == 1).count();

        let busy_students: HashSet<StudentKey> = per_day.keys().map(|&(s, _)| s).collect();
        let leave_days = busy_students.len() * Day::ALL.len() - per_day.len();

        Self {
            clashes,
            daily_cap_violations,
            single_class_days,
            leave_days,
        }
    }

    pub fn is_clash_free(&self) -> bool {
        self.clashes == 0 && self.daily_cap_violations == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timetable {
    /// Callers must check this before presenting the timetable as final.
    pub complete: bool,
    pub cancelled: bool,
    pub attempts: usize,
    pub seed: u64,
    pub entries: Vec<TimetableEntry>,
    pub unplaced: Vec<String>,
    pub report: ConstraintReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSchedule {
    pub student_id: String,
    pub student_name: Option<String>,
    /// Mirrors the timetable's flag; a partial timetable yields a partial schedule.
    pub complete: bool,
    pub entries: Vec<TimetableEntry>,
}

impl Timetable {
    /// Entries are ordered by day, time range, then course name.
    pub fn project(index: &EnrollmentIndex, outcome: &SolveOutcome) -> Self {
        let mut entries: Vec<TimetableEntry> = outcome
            .assignment
            .placements
            .iter()
            .map(|p| {
                let course = index.course(p.course);
                TimetableEntry {
                    course: course.name.clone(),
                    instructor: course.instructor.clone(),
                    day: p.slot.day,
                    time_range: p.slot.time,
                    room_label: format!("CR-{}", p.room),
                }
            })
            .collect();
        entries.sort_by(|a, b| {
            (a.day, a.time_range, &a.course).cmp(&(b.day, b.time_range, &b.course))
        });

        Self {
            complete: outcome.complete,
            cancelled: outcome.cancelled,
            attempts: outcome.attempts,
            seed: outcome.seed,
            entries,
            unplaced: outcome
                .unplaced
                .iter()
                .map(|&i| index.course(i).name.clone())
                .collect(),
            report: ConstraintReport::check(index, &outcome.assignment),
        }
    }

    /// Personal schedule of one student, or `None` for an unknown id.
    pub fn for_student(&self, index: &EnrollmentIndex, raw_id: &str) -> Option<StudentSchedule> {
        let key = index.find_student(raw_id)?;
        let enrolled: HashSet<&str> = index
            .courses_of(key)
            .map(|i| index.course(i).name.as_str())
            .collect();

        let student = index.student(key);
        Some(StudentSchedule {
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            complete: self.complete,
            entries: self
                .entries
                .iter()
                .filter(|e| enrolled.contains(e.course.as_str()))
                .cloned()
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::{CourseRecord, StudentRecord};
    use crate::solver::attempt::Placement;
    use crate::solver::{RestartSolver, SolverParameters};

    fn index() -> EnrollmentIndex {
        EnrollmentIndex::build(vec![
            CourseRecord {
                name: "Marketing".into(),
                instructor: Some("Prof. Sen".into()),
                students: vec![
                    StudentRecord { id: "h001".into(), name: Some("Aakriti".into()) },
                    StudentRecord::with_id("h002"),
                ],
            },
            CourseRecord {
                name: "Accounting".into(),
                instructor: None,
                students: vec![StudentRecord::with_id("H001")],
            },
            CourseRecord {
                name: "Strategy".into(),
                instructor: None,
                students: vec![StudentRecord::with_id("H002")],
            },
        ])
        .unwrap()
    }

    fn slot(day: Day, time: TimeRange) -> Slot {
        Slot { day, time }
    }

    #[test]
    fn projection_is_sorted_and_idempotent() {
        let index = index();
        let outcome = RestartSolver::new(
            &index,
            SolverParameters {
                seed: Some(3),
                ..SolverParameters::default()
            },
        )
        .solve()
        .unwrap();

        let first = Timetable::project(&index, &outcome);
        let second = Timetable::project(&index, &outcome);

        assert_eq!(first, second);
        assert!(first.complete);
        assert_eq!(first.entries.len(), 3);
        assert!(first
            .entries
            .windows(2)
            .all(|w| (w[0].day, w[0].time_range) <= (w[1].day, w[1].time_range)));
        assert!(first.entries.iter().all(|e| e.room_label.starts_with("CR-")));
        assert!(first.report.is_clash_free());
    }

    #[test]
    fn student_view_only_lists_enrolled_courses() {
        let index = index();
        let outcome = RestartSolver::new(
            &index,
            SolverParameters {
                seed: Some(8),
                ..SolverParameters::default()
            },
        )
        .solve()
        .unwrap();
        let timetable = Timetable::project(&index, &outcome);

        let schedule = timetable.for_student(&index, " h001 ").unwrap();
        let mut courses: Vec<_> = schedule.entries.iter().map(|e| e.course.as_str()).collect();
        courses.sort_unstable();

        assert_eq!(schedule.student_id, "H001");
        assert_eq!(schedule.student_name.as_deref(), Some("Aakriti"));
        assert_eq!(courses, vec!["Accounting", "Marketing"]);
        assert!(timetable.for_student(&index, "nobody").is_none());
    }

    #[test]
    fn report_counts_clashes_and_day_shapes() {
        let index = index();
        // Accounting and Marketing share H001 and the same slot.
        let assignment = Assignment {
            placements: vec![
                Placement { course: 0, slot: slot(Day::Monday, TimeRange::First), room: 1 },
                Placement { course: 1, slot: slot(Day::Monday, TimeRange::First), room: 2 },
                Placement { course: 2, slot: slot(Day::Tuesday, TimeRange::Second), room: 3 },
            ],
        };

        let report = ConstraintReport::check(&index, &assignment);

        assert_eq!(report.clashes, 1);
        assert_eq!(report.daily_cap_violations, 0);
        // H001: Monday x2. H002: Monday x1, Tuesday x1.
        assert_eq!(report.single_class_days, 2);
        assert_eq!(report.leave_days, 4 + 3);
        assert!(!report.is_clash_free());
    }

    #[test]
    fn entries_serialize_the_room_label_field() {
        let entry = TimetableEntry {
            course: "Marketing".into(),
            instructor: "Prof. Sen".into(),
            day: Day::Monday,
            time_range: TimeRange::First,
            room_label: "CR-2".into(),
        };

        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["room_label"], "CR-2");
        assert!(json.get("room").is_none());
    }

    #[test]
    fn partial_outcome_lists_unplaced_names() {
        let index = index();
        let outcome = SolveOutcome {
            assignment: Assignment {
                placements: vec![Placement {
                    course: 1,
                    slot: slot(Day::Friday, TimeRange::Fourth),
                    room: 4,
                }],
            },
            complete: false,
            cancelled: false,
            attempts: 100,
            seed: 1,
            unplaced: vec![0, 2],
        };

        let timetable = Timetable::project(&index, &outcome);

        assert!(!timetable.complete);
        assert_eq!(timetable.unplaced, vec!["Accounting", "Strategy"]);
        assert_eq!(timetable.entries[0].course, "Marketing");
        assert_eq!(timetable.entries[0].room_label, "CR-4");
        assert_eq!(timetable.entries[0].instructor, "Prof. Sen");
        assert!(!timetable.for_student(&index, "H002").unwrap().complete);
    }
}
