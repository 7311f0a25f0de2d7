use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use types::{
    CourseId, DayOfWeek, GroupId, Instance, Placement, ProfessorId, RoomId, SolveResult,
    SolveStatus,
};

use crate::grid::TimeGrid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CellEntry {
    pub course: CourseId,
    pub subject: String,
    pub professor: ProfessorId,
    pub room: RoomId,
    pub span: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "entry", rename_all = "snake_case")]
pub enum Cell {
    Free,
    Covered,
    Start(CellEntry),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridRow {
    pub hour: u8,
    pub cells: Vec<Cell>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GroupGrid {
    pub group: GroupId,
    pub days: Vec<DayOfWeek>,
    pub rows: Vec<GridRow>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnassignedGrade {
    pub grade: u8,
    pub subjects: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimetableReport {
    pub status: SolveStatus,
    pub groups: Vec<GroupGrid>,
    pub unassigned: Vec<UnassignedGrade>,
}

pub fn render(instance: &Instance, result: &SolveResult, grid: &TimeGrid) -> TimetableReport {
    let course_by_id: HashMap<&str, &types::Course> = instance
        .courses
        .iter()
        .map(|c| (c.id.0.as_str(), c))
        .collect();

    let unassigned_ids: Vec<&CourseId> = if result.status.has_schedule() {
        result.unassigned.iter().collect()
    } else {
        instance.courses.iter().map(|c| &c.id).collect()
    };

    let mut by_grade: BTreeMap<u8, Vec<String>> = BTreeMap::new();
    for id in unassigned_ids {
        if let Some(course) = course_by_id.get(id.0.as_str()) {
            let subjects = by_grade.entry(course.grade).or_default();
            if !subjects.contains(&course.subject) {
                subjects.push(course.subject.clone());
            }
        }
    }
    let unassigned = by_grade
        .into_iter()
        .map(|(grade, subjects)| UnassignedGrade { grade, subjects })
        .collect();

    let mut groups: Vec<GroupGrid> = Vec::new();
    if result.status.has_schedule() {
        let mut by_group: BTreeMap<&str, Vec<&Placement>> = BTreeMap::new();
        for p in &result.placements {
            if let Some(course) = course_by_id.get(p.course.0.as_str()) {
                by_group.entry(course.group.0.as_str()).or_default().push(p);
            }
        }

        for (group, placements) in by_group {
            let mut rows: Vec<GridRow> = grid
                .hours()
                .map(|hour| GridRow {
                    hour,
                    cells: vec![Cell::Free; DayOfWeek::ALL.len()],
                })
                .collect();

            for p in placements {
                let course = course_by_id[p.course.0.as_str()];
                let day = p.day.index();
                let start = grid.hour_index(p.start_hour);
                rows[start].cells[day] = Cell::Start(CellEntry {
                    course: p.course.clone(),
                    subject: course.subject.clone(),
                    professor: course.professor.clone(),
                    room: p.room.clone(),
                    span: p.duration_hours,
                });
                for covered in start + 1..start + usize::from(p.duration_hours) {
                    rows[covered].cells[day] = Cell::Covered;
                }
            }

            groups.push(GroupGrid {
                group: GroupId(group.to_string()),
                days: DayOfWeek::ALL.to_vec(),
                rows,
            });
        }
    }

    TimetableReport {
        status: result.status,
        groups,
        unassigned,
    }
}

pub fn placements_of(report: &TimetableReport) -> Vec<Placement> {
    let mut placements = Vec::new();
    for group in &report.groups {
        for row in &group.rows {
            for (day_idx, cell) in row.cells.iter().enumerate() {
                if let Cell::Start(entry) = cell {
                    placements.push(Placement {
                        course: entry.course.clone(),
                        room: entry.room.clone(),
                        day: group.days[day_idx],
                        start_hour: row.hour,
                        duration_hours: entry.span,
                    });
                }
            }
        }
    }
    placements
}

const CELL_WIDTH: usize = 24;

fn pad(s: &str) -> String {
    let truncated: String = s.chars().take(CELL_WIDTH - 2).collect();
    format!("{truncated:<width$}", width = CELL_WIDTH)
}

pub fn render_text(report: &TimetableReport) -> String {
    let mut out = String::new();

    for group in &report.groups {
        let _ = writeln!(out, "group {}", group.group);
        let mut header = String::from("       ");
        for day in &group.days {
            header.push_str(&pad(&day.to_string()));
        }
        let _ = writeln!(out, "{}", header.trim_end());
        for row in &group.rows {
            let mut line = format!("{:>2}:00  ", row.hour);
            for cell in &row.cells {
                let text = match cell {
                    Cell::Free => String::from("."),
                    Cell::Covered => String::from("|"),
                    Cell::Start(entry) => {
                        format!("{} {} ({})", entry.subject, entry.room, entry.professor)
                    }
                };
                line.push_str(&pad(&text));
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
        out.push('\n');
    }

    if !report.unassigned.is_empty() {
        let _ = writeln!(out, "unassigned courses:");
        for entry in &report.unassigned {
            let _ = writeln!(
                out,
                "  grade {}: {}",
                entry.grade,
                entry.subjects.join(", ")
            );
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Course, PreferenceSet, Room, Warning};

    fn course(id: &str, subject: &str, grade: u8, group: &str, prof: &str, duration: u8) -> Course {
        Course {
            id: CourseId(id.into()),
            subject: subject.into(),
            grade,
            section: 'A',
            department: "CS".into(),
            professor: ProfessorId(prof.into()),
            enrollment: 20,
            duration_hours: duration,
            group: GroupId(group.into()),
        }
    }

    fn instance() -> Instance {
        Instance {
            courses: vec![
                course("Calculus-1A", "Calculus", 1, "CS-1A", "P1", 2),
                course("Algebra-1A", "Algebra", 1, "CS-1A", "P2", 1),
            ],
            rooms: vec![Room {
                id: RoomId("101".into()),
                capacity: 30,
            }],
            prefs: PreferenceSet::default(),
        }
    }

    fn result(placements: Vec<Placement>, unassigned: Vec<CourseId>) -> SolveResult {
        SolveResult {
            status: SolveStatus::Optimal,
            placements,
            unassigned,
            objective: 0.0,
            solver_status: String::new(),
            warnings: Vec::<Warning>::new(),
        }
    }

    fn grid() -> TimeGrid {
        TimeGrid::new(types::GridConfig::default())
    }

    #[test]
    fn start_and_covered_cells_are_laid_out() {
        let placements = vec![
            Placement {
                course: CourseId("Calculus-1A".into()),
                room: RoomId("101".into()),
                day: DayOfWeek::Mon,
                start_hour: 10,
                duration_hours: 2,
            },
            Placement {
                course: CourseId("Algebra-1A".into()),
                room: RoomId("101".into()),
                day: DayOfWeek::Wed,
                start_hour: 9,
                duration_hours: 1,
            },
        ];
        let report = render(&instance(), &result(placements, vec![]), &grid());

        assert_eq!(report.groups.len(), 1);
        let g = &report.groups[0];
        assert_eq!(g.group.0, "CS-1A");
        assert_eq!(g.rows.len(), 9);
        assert!(matches!(g.rows[1].cells[0], Cell::Start(ref e) if e.span == 2));
        assert_eq!(g.rows[2].cells[0], Cell::Covered);
        assert_eq!(g.rows[3].cells[0], Cell::Free);
        assert!(matches!(g.rows[0].cells[2], Cell::Start(_)));
    }

    #[test]
    fn rendered_grid_round_trips_to_placements() {
        let placements = vec![
            Placement {
                course: CourseId("Calculus-1A".into()),
                room: RoomId("101".into()),
                day: DayOfWeek::Fri,
                start_hour: 13,
                duration_hours: 2,
            },
            Placement {
                course: CourseId("Algebra-1A".into()),
                room: RoomId("101".into()),
                day: DayOfWeek::Mon,
                start_hour: 9,
                duration_hours: 1,
            },
        ];
        let report = render(&instance(), &result(placements.clone(), vec![]), &grid());
        let mut recovered = placements_of(&report);
        recovered.sort_by(|a, b| a.course.cmp(&b.course));
        let mut expected = placements;
        expected.sort_by(|a, b| a.course.cmp(&b.course));
        assert_eq!(recovered, expected);
    }

    #[test]
    fn infeasible_reports_every_course_unassigned() {
        let mut r = result(vec![], vec![]);
        r.status = SolveStatus::Infeasible;
        let report = render(&instance(), &r, &grid());
        assert!(report.groups.is_empty());
        assert_eq!(report.unassigned.len(), 1);
        assert_eq!(report.unassigned[0].grade, 1);
        assert_eq!(report.unassigned[0].subjects, vec!["Calculus", "Algebra"]);
    }

    #[test]
    fn unassigned_grouped_by_grade() {
        let mut inst = instance();
        inst.courses
            .push(course("Compilers-3A", "Compilers", 3, "CS-3A", "P3", 2));
        let r = result(
            vec![Placement {
                course: CourseId("Calculus-1A".into()),
                room: RoomId("101".into()),
                day: DayOfWeek::Mon,
                start_hour: 9,
                duration_hours: 2,
            }],
            vec![
                CourseId("Algebra-1A".into()),
                CourseId("Compilers-3A".into()),
            ],
        );
        let report = render(&inst, &r, &grid());
        assert_eq!(report.unassigned.len(), 2);
        assert_eq!(report.unassigned[0].grade, 1);
        assert_eq!(report.unassigned[0].subjects, vec!["Algebra"]);
        assert_eq!(report.unassigned[1].grade, 3);
    }

    #[test]
    fn report_tree_survives_json() {
        let placements = vec![Placement {
            course: CourseId("Calculus-1A".into()),
            room: RoomId("101".into()),
            day: DayOfWeek::Tue,
            start_hour: 11,
            duration_hours: 2,
        }];
        let report = render(&instance(), &result(placements, vec![]), &grid());
        let json = serde_json::to_string(&report).unwrap();
        let back: TimetableReport = serde_json::from_str(&json).unwrap();
        assert_eq!(placements_of(&back), placements_of(&report));
    }

    #[test]
    fn text_rendering_mentions_courses_and_gaps() {
        let placements = vec![Placement {
            course: CourseId("Calculus-1A".into()),
            room: RoomId("101".into()),
            day: DayOfWeek::Mon,
            start_hour: 9,
            duration_hours: 2,
        }];
        let report = render(&instance(), &result(placements, vec![]), &grid());
        let text = render_text(&report);
        assert!(text.contains("group CS-1A"));
        assert!(text.contains("Calculus 101 (P1)"));
        assert!(text.contains("Mon"));
    }
}
