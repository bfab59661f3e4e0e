//! Reader for per-course roster CSV files.
//!
//! A roster starts with a loose preamble (subject line, `Faculty Name` line,
//! mail-group line) followed by a student table whose header carries
//! `Student ID` and `Student Name` columns:
//!
//! ```text
//! Operations Research,,
//! Faculty Name,Dr. Rao,
//! Group Mail ID,or@example.edu,
//! SN,Student ID,Student Name
//! 1,h001-24,Aakriti
//! ```

use std::io::Cursor;

use log::{debug, warn};
use polars::prelude::*;

use crate::enrollment::{normalize_student_id, CourseRecord, StudentRecord};
use crate::error::RosterError;

const PREAMBLE_LINES: usize = 10;
const ID_COLUMN: &str = "Student ID";
const NAME_COLUMN: &str = "Student Name";

/// Parses one roster file. `file_name` supplies the subject when the
/// preamble does not name one. A file without a student table yields a
/// course with no students.
pub fn parse_roster(file_name: &str, text: &str) -> Result<CourseRecord, RosterError> {
    let lines: Vec<&str> = text.lines().collect();

    let mut faculty = None;
    let mut header = None;
    for (i, line) in lines.iter().take(PREAMBLE_LINES).enumerate() {
        if line.contains("Faculty Name") {
            if let Some(name) = line.split(',').nth(1).map(str::trim).filter(|f| !f.is_empty()) {
                faculty = Some(name.to_string());
            }
        }
        if line.contains(ID_COLUMN) && line.contains(NAME_COLUMN) {
            header = Some(i);
            break;
        }
    }

    let subject = lines[..header.unwrap_or(0)]
        .iter()
        .filter(|line| !line.contains("Faculty Name") && !line.contains("Group Mail ID"))
        .filter_map(|line| line.split(',').next())
        .map(str::trim)
        .filter(|first| !first.is_empty() && *first != "SN" && *first != "Serial No.")
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| subject_from_file_name(file_name));

    let students = match header {
        Some(i) => read_students(lines[i..].join("\n")).map_err(|source| RosterError::Table {
            file: file_name.to_string(),
            source,
        })?,
        None => {
            warn!("Roster '{}' has no Student ID / Student Name table", file_name);
            Vec::new()
        }
    };

    debug!(
        "Roster '{}': subject '{}', faculty {:?}, {} students",
        file_name,
        subject,
        faculty,
        students.len()
    );

    Ok(CourseRecord {
        name: subject,
        instructor: faculty,
        students,
    })
}

/// Reads the student table, header line first. Every column is kept as text
/// so numeric-looking ids are not reformatted.
fn read_students(table: String) -> PolarsResult<Vec<StudentRecord>> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .with_parse_options(CsvParseOptions::default().with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(table.into_bytes()))
        .finish()?;

    // Header cells may carry stray spaces around the column names.
    let column = |wanted: &str| {
        df.get_columns()
            .iter()
            .find(|c| c.name().trim() == wanted)
            .map(|c| c.str())
            .transpose()
    };
    let (Some(ids), Some(names)) = (column(ID_COLUMN)?, column(NAME_COLUMN)?) else {
        return Ok(Vec::new());
    };

    Ok(ids
        .into_iter()
        .zip(names.into_iter())
        .filter_map(|(id, name)| {
            let id = normalize_student_id(id?);
            if id.is_empty() || id == "NAN" {
                return None;
            }
            let name = name.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
            Some(StudentRecord { id, name })
        })
        .collect())
}

/// `"dir/Operations Research.csv"` -> `"Operations Research"`.
pub fn subject_from_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    base.split('.').next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROSTER: &str = "\
Operations Research,,
Faculty Name, Dr. Rao ,
Group Mail ID,or-2024@example.edu,
SN,Student ID , Student Name
1, h001-24 ,Aakriti Sharma
2,H002-24,\"Menon, Rahul\"
3,,Nobody
4,nan,Missing

5,h003-24,
";

    #[test]
    fn reads_subject_faculty_and_students() {
        let course = parse_roster("or.csv", ROSTER).unwrap();

        assert_eq!(course.name, "Operations Research");
        assert_eq!(course.instructor.as_deref(), Some("Dr. Rao"));

        let ids: Vec<_> = course.students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["H001-24", "H002-24", "H003-24"]);
        assert_eq!(course.students[0].name.as_deref(), Some("Aakriti Sharma"));
        assert_eq!(course.students[1].name.as_deref(), Some("Menon, Rahul"));
        assert_eq!(course.students[2].name, None);
    }

    #[test]
    fn falls_back_to_file_name_and_unknown_faculty() {
        let text = "SN,Student ID,Student Name\n1,h010,Priya\n";
        let course = parse_roster("rosters/Business Law.csv", text).unwrap();

        assert_eq!(course.name, "Business Law");
        assert_eq!(course.instructor, None);
        assert_eq!(course.students.len(), 1);
    }

    #[test]
    fn serial_number_lines_are_not_subjects() {
        let text = "Corporate Finance\nSerial No.,x\nFaculty Name,\nSN,Student ID,Student Name\n1,a1,A\n";
        let course = parse_roster("cf.csv", text).unwrap();

        assert_eq!(course.name, "Corporate Finance");
        assert_eq!(course.instructor, None);
    }

    #[test]
    fn file_without_table_has_no_students() {
        let course = parse_roster("Ethics.csv", "Ethics\nFaculty Name,Dr. Iyer\n").unwrap();

        assert_eq!(course.name, "Ethics");
        assert_eq!(course.instructor.as_deref(), Some("Dr. Iyer"));
        assert!(course.students.is_empty());
    }

    #[test]
    fn quoted_name_may_span_lines() {
        let text = "Ethics\nSN,Student ID,Student Name\n1,e01,\"Rao,\nKiran\"\n2,e02,Meera\n";
        let course = parse_roster("ethics.csv", text).unwrap();

        let ids: Vec<_> = course.students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["E01", "E02"]);
        assert_eq!(course.students[0].name.as_deref(), Some("Rao,\nKiran"));
    }

    #[test]
    fn numeric_ids_are_kept_as_text() {
        let text = "SN,Student ID,Student Name\n1,007,Bond\n";
        let course = parse_roster("spy.csv", text).unwrap();

        assert_eq!(course.students[0].id, "007");
    }
}
