use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}
id_newtype!(ProfessorId);
id_newtype!(GroupId);
id_newtype!(RoomId);
id_newtype!(CourseId);

pub type Row = BTreeMap<String, String>;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 5] = [
        DayOfWeek::Mon,
        DayOfWeek::Tue,
        DayOfWeek::Wed,
        DayOfWeek::Thu,
        DayOfWeek::Fri,
    ];

    pub fn index(self) -> usize {
        match self {
            DayOfWeek::Mon => 0,
            DayOfWeek::Tue => 1,
            DayOfWeek::Wed => 2,
            DayOfWeek::Thu => 3,
            DayOfWeek::Fri => 4,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayOfWeek::Mon => "Mon",
            DayOfWeek::Tue => "Tue",
            DayOfWeek::Wed => "Wed",
            DayOfWeek::Thu => "Thu",
            DayOfWeek::Fri => "Fri",
        };
        f.write_str(s)
    }
}

impl FromStr for DayOfWeek {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(DayOfWeek::Mon),
            "tue" | "tuesday" => Ok(DayOfWeek::Tue),
            "wed" | "wednesday" => Ok(DayOfWeek::Wed),
            "thu" | "thursday" => Ok(DayOfWeek::Thu),
            "fri" | "friday" => Ok(DayOfWeek::Fri),
            other => Err(format!("not a weekday: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn from_number(n: u8) -> Option<Semester> {
        match n {
            1 => Some(Semester::First),
            2 => Some(Semester::Second),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Course {
    pub id: CourseId,
    pub subject: String,
    pub grade: u8,
    pub section: char,
    pub department: String,
    pub professor: ProfessorId,
    pub enrollment: u32,
    pub duration_hours: u8,
    pub group: GroupId,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub id: RoomId,
    pub capacity: u32,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PreferenceSet {
    #[serde(default)]
    pub rooms: HashSet<(ProfessorId, RoomId)>,
    #[serde(default)]
    pub days: HashSet<(ProfessorId, DayOfWeek)>,
}

impl PreferenceSet {
    pub fn prefers_room(&self, professor: &ProfessorId, room: &RoomId) -> bool {
        self.rooms.contains(&(professor.clone(), room.clone()))
    }

    pub fn prefers_day(&self, professor: &ProfessorId, day: DayOfWeek) -> bool {
        self.days.contains(&(professor.clone(), day))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
    pub courses: Vec<Course>,
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub prefs: PreferenceSet,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Placement {
    pub course: CourseId,
    pub room: RoomId,
    pub day: DayOfWeek,
    pub start_hour: u8,
    pub duration_hours: u8,
}

impl Placement {
    pub fn end_hour(&self) -> u8 {
        self.start_hour + self.duration_hours
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    SolverError,
}

impl SolveStatus {
    pub fn has_schedule(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Feasible => "feasible",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::SolverError => "solver_error",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Warning {
    pub row: Option<usize>,
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub placements: Vec<Placement>,
    pub unassigned: Vec<CourseId>,
    pub objective: f64,
    pub solver_status: String,
    #[serde(default)]
    pub warnings: Vec<Warning>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Weights {
    pub size: f64,
    pub room_pref: f64,
    pub day_pref: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            size: 50.0,
            room_pref: 100.0,
            day_pref: 25.0,
        }
    }
}

impl Weights {
    pub fn capacity_penalty(&self, enrollment: u32, capacity: u32) -> f64 {
        if enrollment > capacity {
            f64::from(enrollment - capacity) * self.size * 5.0
        } else if f64::from(capacity) > 1.5 * f64::from(enrollment) {
            f64::from(capacity - enrollment) * self.size * 0.1
        } else {
            0.0
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    pub hour_min: u8,
    pub hour_end: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hour_min: 9,
            hour_end: 18,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMap {
    pub department: String,
    pub grade: String,
    pub subject: String,
    pub professor_id: String,
    pub credit_hours: String,
    pub enrollment: String,
    pub room_id: String,
    pub capacity: String,
    pub day: String,
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self {
            department: "department".into(),
            grade: "grade".into(),
            subject: "subject".into(),
            professor_id: "professor_id".into(),
            credit_hours: "credit_hours".into(),
            enrollment: "enrollment".into(),
            room_id: "room_id".into(),
            capacity: "capacity".into(),
            day: "day".into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub time_limit_secs: Option<u64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub grid: GridConfig,
    pub weights: Weights,
    pub columns: ColumnMap,
    pub solver: SolverConfig,
    pub default_capacity: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            weights: Weights::default(),
            columns: ColumnMap::default(),
            solver: SolverConfig::default(),
            default_capacity: 50,
        }
    }
}
