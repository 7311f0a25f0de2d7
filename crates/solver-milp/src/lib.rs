mod milp_core;

use std::time::{Duration, Instant};

use good_lp::{default_solver, ProblemVariables, ResolutionError, Solution, SolverModel};
use tracing::info;

use tt_core::grid::TimeGrid;
use tt_core::{CancelToken, Solver};
use types::{Config, Instance, SolveResult, SolveStatus};

use milp_core::{
    add_contiguity_constraints, add_cover_constraints, add_group_conflict_constraints,
    add_professor_conflict_constraints, add_room_binding_constraints,
    add_room_conflict_constraints, add_single_start_constraints, build_objective, build_prep,
    declare_vars, extract_placements,
};

pub struct MilpSolver;

impl MilpSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MilpSolver {
    fn default() -> Self {
        Self::new()
    }
}

fn all_unassigned(instance: &Instance) -> Vec<types::CourseId> {
    instance.courses.iter().map(|c| c.id.clone()).collect()
}

impl Solver for MilpSolver {
    fn solve(
        &self,
        instance: &Instance,
        config: &Config,
        cancel: Option<&CancelToken>,
    ) -> anyhow::Result<SolveResult> {
        let grid = TimeGrid::new(config.grid);
        let prep = build_prep(instance, grid, config.weights);

        if cancel.is_some_and(|c| c.is_cancelled()) {
            return Ok(SolveResult {
                status: SolveStatus::SolverError,
                placements: vec![],
                unassigned: all_unassigned(instance),
                objective: 0.0,
                solver_status: "cancelled before dispatch".into(),
                warnings: vec![],
            });
        }

        let mut pvars = ProblemVariables::new();
        let v = declare_vars(&prep, &mut pvars);
        let objective = build_objective(&prep, &v);
        info!(
            courses = instance.courses.len(),
            rooms = instance.rooms.len(),
            slots = grid.num_hours() * types::DayOfWeek::ALL.len(),
            "building weekly timetable model"
        );

        let mut model = pvars.minimise(objective.clone()).using(default_solver);
        if let Some(secs) = config.solver.time_limit_secs {
            model.set_parameter("seconds", &secs.to_string());
        }
        model = add_single_start_constraints(model, &prep, &v);
        model = add_contiguity_constraints(model, &prep, &v);
        model = add_cover_constraints(model, &prep, &v);
        model = add_room_binding_constraints(model, &prep, &v);
        model = add_room_conflict_constraints(model, &prep, &v);
        model = add_professor_conflict_constraints(model, &prep, &v);
        model = add_group_conflict_constraints(model, &prep, &v);

        let started = Instant::now();
        match model.solve() {
            Ok(sol) => {
                let elapsed = started.elapsed();
                let (placements, unassigned) = extract_placements(&prep, &v, &sol);
                let objective_value = sol.eval(objective);

                let cancelled = cancel.is_some_and(|c| c.is_cancelled());
                let truncated = config
                    .solver
                    .time_limit_secs
                    .is_some_and(|secs| elapsed >= Duration::from_secs(secs));
                let (status, text) = if cancelled {
                    (SolveStatus::Feasible, "cancelled; best incumbent returned")
                } else if truncated {
                    (SolveStatus::Feasible, "time limit reached; best incumbent returned")
                } else {
                    (SolveStatus::Optimal, "optimal")
                };

                info!(
                    placements = placements.len(),
                    unassigned = unassigned.len(),
                    objective = objective_value,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "solve finished"
                );
                Ok(SolveResult {
                    status,
                    placements,
                    unassigned,
                    objective: objective_value,
                    solver_status: text.into(),
                    warnings: vec![],
                })
            }
            Err(ResolutionError::Infeasible) => Ok(SolveResult {
                status: SolveStatus::Infeasible,
                placements: vec![],
                unassigned: all_unassigned(instance),
                objective: 0.0,
                solver_status: "infeasible".into(),
                warnings: vec![],
            }),
            Err(e) => Ok(SolveResult {
                status: SolveStatus::SolverError,
                placements: vec![],
                unassigned: all_unassigned(instance),
                objective: 0.0,
                solver_status: e.to_string(),
                warnings: vec![],
            }),
        }
    }
}
