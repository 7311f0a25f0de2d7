pub mod audit;
pub mod error;
pub mod grid;
pub mod report;
pub mod schema;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

pub use error::{EngineError, SchemaError, ValidationError};
pub use types::{
    Config, Course, CourseId, DayOfWeek, GroupId, Instance, Placement, PreferenceSet, ProfessorId,
    Room, RoomId, Row, Semester, SolveResult, SolveStatus, Warning, Weights,
};

use grid::TimeGrid;

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub trait Solver {
    fn solve(
        &self,
        instance: &Instance,
        config: &Config,
        cancel: Option<&CancelToken>,
    ) -> anyhow::Result<SolveResult>;
}

pub fn validate(instance: &Instance) -> Result<(), ValidationError> {
    let mut errors: Vec<String> = Vec::new();

    let mut seen_courses = HashSet::new();
    for c in &instance.courses {
        if !seen_courses.insert(c.id.0.as_str()) {
            errors.push(format!("duplicate course id: {}", c.id));
        }
        if c.enrollment == 0 {
            errors.push(format!("course {} has enrollment=0", c.id));
        }
        if c.duration_hours == 0 {
            errors.push(format!("course {} has duration=0", c.id));
        }
    }

    let mut seen_rooms = HashSet::new();
    for r in &instance.rooms {
        if !seen_rooms.insert(r.id.0.as_str()) {
            errors.push(format!("duplicate room id: {}", r.id));
        }
        if r.capacity == 0 {
            errors.push(format!("room {} has capacity=0", r.id));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

pub fn build_instance(
    course_rows: &[Row],
    room_rows: &[Row],
    pref_room_rows: Option<&[Row]>,
    pref_day_rows: Option<&[Row]>,
    semester: Semester,
    config: &Config,
) -> Result<(Instance, Vec<Warning>), EngineError> {
    let courses = schema::normalize_courses(course_rows, semester, config)?;
    let rooms = schema::normalize_rooms(room_rows, config)?;
    let (prefs, warnings) = schema::normalize_prefs(pref_room_rows, pref_day_rows, config);

    let instance = Instance {
        courses,
        rooms,
        prefs,
    };
    validate(&instance)?;
    info!(
        courses = instance.courses.len(),
        rooms = instance.rooms.len(),
        "instance normalized"
    );
    Ok((instance, warnings))
}

pub fn solve_instance(
    instance: &Instance,
    config: &Config,
    solver: &dyn Solver,
    cancel: Option<&CancelToken>,
) -> Result<SolveResult, EngineError> {
    let result = solver
        .solve(instance, config, cancel)
        .map_err(EngineError::Solver)?;

    if result.status.has_schedule() {
        let grid = TimeGrid::new(config.grid);
        audit::check_placements(instance, &result.placements, &result.unassigned, &grid)
            .map_err(EngineError::Invariant)?;
    }
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
pub fn solve(
    course_rows: &[Row],
    room_rows: &[Row],
    pref_room_rows: Option<&[Row]>,
    pref_day_rows: Option<&[Row]>,
    semester: Semester,
    config: &Config,
    solver: &dyn Solver,
    cancel: Option<&CancelToken>,
) -> Result<SolveResult, EngineError> {
    let (instance, warnings) = build_instance(
        course_rows,
        room_rows,
        pref_room_rows,
        pref_day_rows,
        semester,
        config,
    )?;
    let mut result = solve_instance(&instance, config, solver, cancel)?;

    let mut all_warnings = warnings;
    all_warnings.append(&mut result.warnings);
    result.warnings = all_warnings;
    Ok(result)
}
