use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use solver_milp::MilpSolver;
use tt_core::grid::TimeGrid;
use tt_core::{report, EngineError, Row, Semester, SolveStatus};
use types::Config;

const EXIT_INFEASIBLE: u8 = 2;
const EXIT_SCHEMA: u8 = 3;
const EXIT_SOLVER: u8 = 4;

#[derive(Parser)]
#[command(name = "tt", version, about = "University weekly timetable solver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Assign courses to rooms and weekly slots from CSV sheets
    Solve(SolveArgs),
}

#[derive(Args)]
struct SolveArgs {
    /// Course sheet: department, grade, subject, professor_id, credit_hours, enrollment
    #[arg(long, value_name = "PATH")]
    courses: PathBuf,

    /// Room sheet: room_id and optional capacity
    #[arg(long, value_name = "PATH")]
    rooms: PathBuf,

    /// Optional professor_id / room_id preference sheet
    #[arg(long = "prefs-rooms", value_name = "PATH")]
    prefs_rooms: Option<PathBuf>,

    /// Optional professor_id / day preference sheet
    #[arg(long = "prefs-days", value_name = "PATH")]
    prefs_days: Option<PathBuf>,

    /// Semester 2 doubles the duration of third-grade courses
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=2))]
    semester: u8,

    /// Stop CBC after this many seconds and keep the best incumbent
    #[arg(long = "time-limit", value_name = "SECS")]
    time_limit: Option<u64>,

    /// Emit the report tree as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Weight of capacity mismatch per occupied hour
    #[arg(long = "w-size", value_name = "W")]
    w_size: Option<f64>,

    /// Reward for placing a course in a professor's preferred room
    #[arg(long = "w-room-pref", value_name = "W")]
    w_room_pref: Option<f64>,

    /// Reward for placing a course on a professor's preferred day
    #[arg(long = "w-day-pref", value_name = "W")]
    w_day_pref: Option<f64>,

    /// Capacity assumed for rooms whose sheet omits one
    #[arg(long = "default-capacity", value_name = "N")]
    default_capacity: Option<u32>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Solve(args) => match run_solve(&args) {
            Ok(code) => code,
            Err(e) => {
                error!("{e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))?;
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("cannot read {}", path.display()))?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn config_from(args: &SolveArgs) -> Config {
    let mut config = Config::default();
    config.solver.time_limit_secs = args.time_limit;
    if let Some(w) = args.w_size {
        config.weights.size = w;
    }
    if let Some(w) = args.w_room_pref {
        config.weights.room_pref = w;
    }
    if let Some(w) = args.w_day_pref {
        config.weights.day_pref = w;
    }
    if let Some(n) = args.default_capacity {
        config.default_capacity = n;
    }
    config
}

fn run_solve(args: &SolveArgs) -> Result<ExitCode> {
    let config = config_from(args);
    let semester = Semester::from_number(args.semester)
        .context("semester must be 1 or 2")?;

    let course_rows = read_rows(&args.courses)?;
    let room_rows = read_rows(&args.rooms)?;
    let pref_room_rows = args.prefs_rooms.as_deref().map(read_rows).transpose()?;
    let pref_day_rows = args.prefs_days.as_deref().map(read_rows).transpose()?;

    let (instance, warnings) = match tt_core::build_instance(
        &course_rows,
        &room_rows,
        pref_room_rows.as_deref(),
        pref_day_rows.as_deref(),
        semester,
        &config,
    ) {
        Ok(built) => built,
        Err(e @ (EngineError::Schema(_) | EngineError::Validation(_))) => {
            error!("{e}");
            return Ok(ExitCode::from(EXIT_SCHEMA));
        }
        Err(e) => return Err(e.into()),
    };
    for w in &warnings {
        warn!(row = w.row, "{}", w.message);
    }

    let result = tt_core::solve_instance(&instance, &config, &MilpSolver::new(), None)?;

    let grid = TimeGrid::new(config.grid);
    let rendered = report::render(&instance, &result, &grid);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        println!(
            "status: {} ({}), objective: {}",
            result.status, result.solver_status, result.objective
        );
        print!("{}", report::render_text(&rendered));
    }

    let code = match result.status {
        SolveStatus::Optimal | SolveStatus::Feasible => ExitCode::SUCCESS,
        SolveStatus::Infeasible => ExitCode::from(EXIT_INFEASIBLE),
        SolveStatus::SolverError => ExitCode::from(EXIT_SOLVER),
    };
    Ok(code)
}
