use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;
use types::{
    Config, Course, CourseId, DayOfWeek, GroupId, PreferenceSet, ProfessorId, Room, RoomId, Row,
    Semester, Warning,
};

use crate::error::SchemaError;

fn cell<'a>(row: &'a Row, index: usize, field: &str) -> Result<&'a str, SchemaError> {
    match row.get(field).map(|s| s.trim()) {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(SchemaError::new(index, field, "missing required field")),
    }
}

fn parse_cell<T>(row: &Row, index: usize, field: &str) -> Result<T, SchemaError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = cell(row, index, field)?;
    raw.parse()
        .map_err(|e| SchemaError::new(index, field, format!("cannot parse '{raw}': {e}")))
}

fn positive(value: u32, row: usize, field: &str) -> Result<u32, SchemaError> {
    if value == 0 {
        Err(SchemaError::new(row, field, "must be at least 1"))
    } else {
        Ok(value)
    }
}

pub fn normalize_courses(
    rows: &[Row],
    semester: Semester,
    config: &Config,
) -> Result<Vec<Course>, SchemaError> {
    let cols = &config.columns;

    struct Parsed {
        department: String,
        grade: u8,
        subject: String,
        professor: ProfessorId,
        enrollment: u32,
        duration_hours: u8,
    }

    let mut parsed = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let department = cell(row, i, &cols.department)?.to_string();
        let grade: u8 = parse_cell(row, i, &cols.grade)?;
        let subject = cell(row, i, &cols.subject)?.to_string();
        let professor = ProfessorId(cell(row, i, &cols.professor_id)?.to_string());
        let enrollment = positive(parse_cell(row, i, &cols.enrollment)?, i, &cols.enrollment)?;
        let credit_hours: u8 = parse_cell(row, i, &cols.credit_hours)?;
        if credit_hours == 0 {
            return Err(SchemaError::new(i, &cols.credit_hours, "must be at least 1"));
        }
        let duration_hours = if semester == Semester::Second && grade == 3 {
            credit_hours * 2
        } else {
            credit_hours
        };
        parsed.push(Parsed {
            department,
            grade,
            subject,
            professor,
            enrollment,
            duration_hours,
        });
    }

    let mut section_counters: HashMap<(String, String, u8), u8> = HashMap::new();
    let mut courses = Vec::with_capacity(parsed.len());
    for p in parsed {
        let key = (p.department.clone(), p.subject.clone(), p.grade);
        let counter = section_counters.entry(key).or_insert(0);
        let section = (b'A' + *counter) as char;
        *counter += 1;

        courses.push(Course {
            id: CourseId(format!("{}-{}{}", p.subject, p.grade, section)),
            group: GroupId(format!("{}-{}{}", p.department, p.grade, section)),
            subject: p.subject,
            grade: p.grade,
            section,
            department: p.department,
            professor: p.professor,
            enrollment: p.enrollment,
            duration_hours: p.duration_hours,
        });
    }
    Ok(courses)
}

pub fn normalize_rooms(rows: &[Row], config: &Config) -> Result<Vec<Room>, SchemaError> {
    let cols = &config.columns;
    let mut rooms = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let id = RoomId(cell(row, i, &cols.room_id)?.to_string());
        let capacity = match row.get(&cols.capacity).map(|s| s.trim()) {
            None | Some("") => config.default_capacity,
            Some(raw) => {
                let parsed: u32 = raw.parse().map_err(|e| {
                    SchemaError::new(i, &cols.capacity, format!("cannot parse '{raw}': {e}"))
                })?;
                positive(parsed, i, &cols.capacity)?
            }
        };
        rooms.push(Room { id, capacity });
    }
    Ok(rooms)
}

pub fn normalize_prefs(
    room_rows: Option<&[Row]>,
    day_rows: Option<&[Row]>,
    config: &Config,
) -> (PreferenceSet, Vec<Warning>) {
    let cols = &config.columns;
    let mut prefs = PreferenceSet::default();
    let mut warnings = Vec::new();

    let downgrade = |warnings: &mut Vec<Warning>, row: usize, message: String| {
        warn!(row, %message, "ignoring malformed preference row");
        warnings.push(Warning {
            row: Some(row),
            message,
        });
    };

    for (i, row) in room_rows.unwrap_or_default().iter().enumerate() {
        let professor = match cell(row, i, &cols.professor_id) {
            Ok(p) => ProfessorId(p.to_string()),
            Err(e) => {
                downgrade(&mut warnings, i, format!("preferred room: {e}"));
                continue;
            }
        };
        match cell(row, i, &cols.room_id) {
            Ok(r) => {
                prefs.rooms.insert((professor, RoomId(r.to_string())));
            }
            Err(e) => downgrade(&mut warnings, i, format!("preferred room: {e}")),
        }
    }

    for (i, row) in day_rows.unwrap_or_default().iter().enumerate() {
        let professor = match cell(row, i, &cols.professor_id) {
            Ok(p) => ProfessorId(p.to_string()),
            Err(e) => {
                downgrade(&mut warnings, i, format!("preferred day: {e}"));
                continue;
            }
        };
        let raw_day = match cell(row, i, &cols.day) {
            Ok(d) => d,
            Err(e) => {
                downgrade(&mut warnings, i, format!("preferred day: {e}"));
                continue;
            }
        };
        match DayOfWeek::from_str(raw_day) {
            Ok(day) => {
                prefs.days.insert((professor, day));
            }
            Err(e) => downgrade(&mut warnings, i, format!("preferred day: {e}")),
        }
    }

    (prefs, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn course_row(department: &str, grade: &str, subject: &str, prof: &str) -> Row {
        row(&[
            ("department", department),
            ("grade", grade),
            ("subject", subject),
            ("professor_id", prof),
            ("credit_hours", "2"),
            ("enrollment", "30"),
        ])
    }

    #[test]
    fn sections_assigned_in_record_order_per_bucket() {
        let rows = vec![
            course_row("CS", "1", "Calculus", "P1"),
            course_row("CS", "1", "Calculus", "P2"),
            course_row("CS", "2", "Calculus", "P1"),
            course_row("EE", "1", "Calculus", "P3"),
            course_row("CS", "1", "Calculus", "P4"),
        ];
        let courses = normalize_courses(&rows, Semester::First, &Config::default()).unwrap();
        let sections: Vec<char> = courses.iter().map(|c| c.section).collect();
        assert_eq!(sections, vec!['A', 'B', 'A', 'A', 'C']);
        assert_eq!(courses[0].id.0, "Calculus-1A");
        assert_eq!(courses[1].id.0, "Calculus-1B");
        assert_eq!(courses[0].group.0, "CS-1A");
        assert_eq!(courses[3].group.0, "EE-1A");
    }

    #[test]
    fn semester_two_doubles_third_grade_only() {
        let rows = vec![
            course_row("CS", "3", "Compilers", "P1"),
            course_row("CS", "2", "Networks", "P2"),
        ];
        let courses = normalize_courses(&rows, Semester::Second, &Config::default()).unwrap();
        assert_eq!(courses[0].duration_hours, 4);
        assert_eq!(courses[1].duration_hours, 2);

        let courses = normalize_courses(&rows, Semester::First, &Config::default()).unwrap();
        assert_eq!(courses[0].duration_hours, 2);
    }

    #[test]
    fn missing_field_reports_row_and_field() {
        let mut bad = course_row("CS", "1", "Calculus", "P1");
        bad.remove("enrollment");
        let rows = vec![course_row("CS", "1", "Algebra", "P2"), bad];
        let err = normalize_courses(&rows, Semester::First, &Config::default()).unwrap_err();
        assert_eq!(err.row, 1);
        assert_eq!(err.field, "enrollment");
    }

    #[test]
    fn unparseable_grade_is_a_schema_error() {
        let rows = vec![course_row("CS", "first", "Calculus", "P1")];
        let err = normalize_courses(&rows, Semester::First, &Config::default()).unwrap_err();
        assert_eq!(err.field, "grade");
    }

    #[test]
    fn room_capacity_defaults_when_absent() {
        let rows = vec![
            row(&[("room_id", "101"), ("capacity", "40")]),
            row(&[("room_id", "102")]),
            row(&[("room_id", "103"), ("capacity", "")]),
        ];
        let rooms = normalize_rooms(&rows, &Config::default()).unwrap();
        assert_eq!(rooms[0].capacity, 40);
        assert_eq!(rooms[1].capacity, 50);
        assert_eq!(rooms[2].capacity, 50);
    }

    #[test]
    fn malformed_prefs_downgrade_to_warnings() {
        let room_rows = vec![
            row(&[("professor_id", "P1"), ("room_id", "101")]),
            row(&[("professor_id", "P2")]),
        ];
        let day_rows = vec![
            row(&[("professor_id", "P1"), ("day", "Fri")]),
            row(&[("professor_id", "P1"), ("day", "Caturday")]),
        ];
        let (prefs, warnings) =
            normalize_prefs(Some(&room_rows), Some(&day_rows), &Config::default());
        assert_eq!(prefs.rooms.len(), 1);
        assert_eq!(prefs.days.len(), 1);
        assert!(prefs.prefers_day(&ProfessorId("P1".into()), DayOfWeek::Fri));
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].row, Some(1));
    }

    #[test]
    fn absent_pref_inputs_mean_no_preference() {
        let (prefs, warnings) = normalize_prefs(None, None, &Config::default());
        assert!(prefs.rooms.is_empty());
        assert!(prefs.days.is_empty());
        assert!(warnings.is_empty());
    }

    #[test]
    fn pref_for_unknown_professor_is_not_an_error() {
        let room_rows = vec![row(&[("professor_id", "GHOST"), ("room_id", "101")])];
        let (prefs, warnings) = normalize_prefs(Some(&room_rows), None, &Config::default());
        assert_eq!(prefs.rooms.len(), 1);
        assert!(warnings.is_empty());
    }
}
