//! Course enrollment index consumed by the solver.
//!
//! Built once from course records (JSON requests or roster files). Student
//! identifiers are normalized here so the solver never sees raw input.

use std::collections::{BTreeMap, BTreeSet};

use hashbrown::HashMap;
use log::{debug, warn};

use crate::error::InputError;
use crate::solver::grid::SlotGrid;

pub type StudentKey = usize;

pub const UNKNOWN_INSTRUCTOR: &str = "Unknown";

/// A course as delivered by an ingestion source, before normalization.
#[derive(Debug, Clone, Default)]
pub struct CourseRecord {
    pub name: String,
    pub instructor: Option<String>,
    pub students: Vec<StudentRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct StudentRecord {
    pub id: String,
    pub name: Option<String>,
}

impl StudentRecord {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), name: None }
    }
}

#[derive(Debug, Clone)]
pub struct Student {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Course {
    pub name: String,
    pub instructor: String,
    pub students: Vec<StudentKey>,
}

#[derive(Debug, Clone, Default)]
pub struct EnrollmentIndex {
    courses: Vec<Course>,
    students: Vec<Student>,
    by_id: HashMap<String, StudentKey>,
}

/// Trims and upper-cases a raw student identifier.
pub fn normalize_student_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl EnrollmentIndex {
    /// Builds the index. Records sharing a subject name are merged; the last
    /// non-blank instructor wins. Courses are kept in name order.
    pub fn build<I>(records: I) -> Result<Self, InputError>
    where
        I: IntoIterator<Item = CourseRecord>,
    {
        let mut students: Vec<Student> = Vec::new();
        let mut by_id: HashMap<String, StudentKey> = HashMap::new();
        let mut merged: BTreeMap<String, (Option<String>, BTreeSet<StudentKey>)> = BTreeMap::new();

        for record in records {
            let name = record.name.trim().to_string();
            if name.is_empty() {
                return Err(InputError::UnnamedCourse);
            }

            let entry = merged.entry(name).or_default();
            if let Some(instructor) = record
                .instructor
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty() && i != UNKNOWN_INSTRUCTOR)
            {
                entry.0 = Some(instructor);
            }

            for raw in record.students {
                let id = normalize_student_id(&raw.id);
                if id.is_empty() {
                    continue;
                }
                let key = *by_id.entry(id.clone()).or_insert_with(|| {
                    students.push(Student { id, name: None });
                    students.len() - 1
                });
                if let Some(display) = raw.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
                    students[key].name.get_or_insert(display);
                }
                entry.1.insert(key);
            }
        }

        let courses: Vec<Course> = merged
            .into_iter()
            .map(|(name, (instructor, enrolled))| Course {
                name,
                instructor: instructor.unwrap_or_else(|| UNKNOWN_INSTRUCTOR.to_string()),
                students: enrolled.into_iter().collect(),
            })
            .collect();

        debug!(
            "Enrollment index built: {} courses, {} students",
            courses.len(),
            students.len()
        );

        Ok(Self { courses, students, by_id })
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, index: usize) -> &Course {
        &self.courses[index]
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn student(&self, key: StudentKey) -> &Student {
        &self.students[key]
    }

    /// Looks a student up by a raw (unnormalized) identifier.
    pub fn find_student(&self, raw_id: &str) -> Option<StudentKey> {
        self.by_id.get(&normalize_student_id(raw_id)).copied()
    }

    /// Courses a student is enrolled in, by course index.
    pub fn courses_of(&self, student: StudentKey) -> impl Iterator<Item = usize> + '_ {
        self.courses
            .iter()
            .enumerate()
            .filter(move |(_, c)| c.students.binary_search(&student).is_ok())
            .map(|(i, _)| i)
    }

    /// Rejects enrollment structures no number of restarts can place.
    pub fn validate(&self, grid: &SlotGrid) -> Result<(), InputError> {
        if let Some(course) = self.courses.iter().find(|c| c.students.is_empty()) {
            warn!("Course '{}' has no enrolled students", course.name);
            return Err(InputError::EmptyEnrollment {
                course: course.name.clone(),
            });
        }

        let mut load = vec![0usize; self.students.len()];
        for course in &self.courses {
            for &student in &course.students {
                load[student] += 1;
            }
        }

        let capacity = grid.student_capacity();
        if let Some((key, &courses)) = load.iter().enumerate().find(|&(_, &n)| n > capacity) {
            let student = self.students[key].id.clone();
            warn!(
                "Student {} is enrolled in {} courses, more than the {} the week can host",
                student, courses, capacity
            );
            return Err(InputError::OverSubscribed {
                student,
                courses,
                capacity,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, instructor: Option<&str>, ids: &[&str]) -> CourseRecord {
        CourseRecord {
            name: name.to_string(),
            instructor: instructor.map(str::to_string),
            students: ids.iter().map(|id| StudentRecord::with_id(*id)).collect(),
        }
    }

    #[test]
    fn normalizes_ids_and_merges_duplicate_subjects() {
        let index = EnrollmentIndex::build(vec![
            record("Operations Research", None, &[" h001-24 ", "H002-24"]),
            record("Operations Research", Some("Dr. Rao"), &["H001-24", "h003-24"]),
            record("Finance", Some("  "), &["H002-24"]),
        ])
        .unwrap();

        assert_eq!(index.courses().len(), 2);
        let finance = &index.courses()[0];
        assert_eq!(finance.name, "Finance");
        assert_eq!(finance.instructor, UNKNOWN_INSTRUCTOR);

        let or = &index.courses()[1];
        assert_eq!(or.instructor, "Dr. Rao");
        assert_eq!(or.students.len(), 3);
        assert_eq!(index.students().len(), 3);

        let key = index.find_student("h001-24").unwrap();
        assert_eq!(index.student(key).id, "H001-24");
        assert_eq!(index.courses_of(key).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn blank_ids_are_dropped() {
        let index = EnrollmentIndex::build(vec![record("Stats", None, &["", "  ", "s1"])]).unwrap();
        assert_eq!(index.courses()[0].students.len(), 1);
    }

    #[test]
    fn unnamed_course_is_rejected() {
        let err = EnrollmentIndex::build(vec![record("  ", None, &["s1"])]).unwrap_err();
        assert!(matches!(err, InputError::UnnamedCourse));
    }

    #[test]
    fn empty_enrollment_is_malformed() {
        let index = EnrollmentIndex::build(vec![
            record("Stats", None, &["s1"]),
            record("Ghost", None, &[]),
        ])
        .unwrap();

        let err = index.validate(&SlotGrid::new()).unwrap_err();
        assert!(matches!(err, InputError::EmptyEnrollment { ref course } if course == "Ghost"));
    }

    #[test]
    fn oversubscribed_student_is_malformed() {
        let records = (0..21).map(|i| record(&format!("C{i:02}"), None, &["S1"]));
        let index = EnrollmentIndex::build(records).unwrap();

        match index.validate(&SlotGrid::new()) {
            Err(InputError::OverSubscribed { student, courses, capacity }) => {
                assert_eq!(student, "S1");
                assert_eq!(courses, 21);
                assert_eq!(capacity, 20);
            }
            other => panic!("unexpected validation result: {other:?}"),
        }
    }

    #[test]
    fn twenty_courses_for_one_student_is_allowed() {
        let records = (0..20).map(|i| record(&format!("C{i:02}"), None, &["S1"]));
        let index = EnrollmentIndex::build(records).unwrap();
        assert!(index.validate(&SlotGrid::new()).is_ok());
    }
}
