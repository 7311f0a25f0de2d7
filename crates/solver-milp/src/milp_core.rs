use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable};

use tt_core::audit::slot_weight;
use tt_core::grid::TimeGrid;
use types::{CourseId, DayOfWeek, Instance, Placement, Weights};

// flat (course, room, day, hour) table; a None slot is a variable the model
// never created and is zero by construction
pub(crate) struct VarTable {
    rooms: usize,
    days: usize,
    hours: usize,
    slots: Vec<Option<Variable>>,
}

impl VarTable {
    fn new(courses: usize, rooms: usize, days: usize, hours: usize) -> Self {
        Self {
            rooms,
            days,
            hours,
            slots: vec![None; courses * rooms * days * hours],
        }
    }

    fn index(&self, c: usize, r: usize, d: usize, h: usize) -> usize {
        ((c * self.rooms + r) * self.days + d) * self.hours + h
    }

    pub fn get(&self, c: usize, r: usize, d: usize, h: usize) -> Option<Variable> {
        self.slots[self.index(c, r, d, h)]
    }

    fn set(&mut self, c: usize, r: usize, d: usize, h: usize, var: Variable) {
        let i = self.index(c, r, d, h);
        self.slots[i] = Some(var);
    }
}

pub(crate) struct Prep<'a> {
    pub inst: &'a Instance,
    pub grid: TimeGrid,
    pub weights: Weights,
    pub professors: Vec<(&'a str, Vec<usize>)>,
    pub groups: Vec<(&'a str, Vec<usize>)>,
    fits_room: Vec<bool>,
}

impl Prep<'_> {
    pub fn fits(&self, c: usize, r: usize) -> bool {
        self.fits_room[c * self.inst.rooms.len() + r]
    }
}

pub(crate) fn build_prep<'a>(inst: &'a Instance, grid: TimeGrid, weights: Weights) -> Prep<'a> {
    let mut professors: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();

    for (ci, c) in inst.courses.iter().enumerate() {
        let pid = c.professor.0.as_str();
        match professors.iter_mut().find(|(p, _)| *p == pid) {
            Some(entry) => entry.1.push(ci),
            None => professors.push((pid, vec![ci])),
        }

        let gid = c.group.0.as_str();
        match groups.iter_mut().find(|(g, _)| *g == gid) {
            Some(entry) => entry.1.push(ci),
            None => groups.push((gid, vec![ci])),
        }
    }

    let mut fits_room = vec![false; inst.courses.len() * inst.rooms.len()];
    for (ci, c) in inst.courses.iter().enumerate() {
        for (ri, r) in inst.rooms.iter().enumerate() {
            fits_room[ci * inst.rooms.len() + ri] = c.enrollment <= r.capacity;
        }
    }

    Prep {
        inst,
        grid,
        weights,
        professors,
        groups,
        fits_room,
    }
}

pub(crate) struct Vars {
    pub occupy: VarTable,
    pub start: VarTable,
    pub uses_room: Vec<Option<Variable>>,
}

pub(crate) fn declare_vars(prep: &Prep, pv: &mut ProblemVariables) -> Vars {
    let nc = prep.inst.courses.len();
    let nr = prep.inst.rooms.len();
    let nd = DayOfWeek::ALL.len();
    let nh = prep.grid.num_hours();

    let mut occupy = VarTable::new(nc, nr, nd, nh);
    let mut start = VarTable::new(nc, nr, nd, nh);
    let mut uses_room = vec![None; nc * nr];

    for (ci, course) in prep.inst.courses.iter().enumerate() {
        for ri in 0..nr {
            if !prep.fits(ci, ri) {
                continue;
            }
            uses_room[ci * nr + ri] = Some(pv.add(good_lp::variable().binary()));
            for di in 0..nd {
                for (hi, hour) in prep.grid.hours().enumerate() {
                    occupy.set(ci, ri, di, hi, pv.add(good_lp::variable().binary()));
                    if prep.grid.fits(hour, course.duration_hours) {
                        start.set(ci, ri, di, hi, pv.add(good_lp::variable().binary()));
                    }
                }
            }
        }
    }

    Vars {
        occupy,
        start,
        uses_room,
    }
}

pub(crate) fn build_objective(prep: &Prep, v: &Vars) -> Expression {
    let mut objective = Expression::from(0.0);
    for (ci, course) in prep.inst.courses.iter().enumerate() {
        for (ri, room) in prep.inst.rooms.iter().enumerate() {
            if !prep.fits(ci, ri) {
                continue;
            }
            for (di, day) in DayOfWeek::ALL.into_iter().enumerate() {
                let w = slot_weight(course, room, day, &prep.inst.prefs, &prep.weights);
                if w == 0.0 {
                    continue;
                }
                for hi in 0..prep.grid.num_hours() {
                    if let Some(x) = v.occupy.get(ci, ri, di, hi) {
                        objective = objective + w * x;
                    }
                }
            }
        }
    }
    objective
}

pub(crate) fn add_single_start_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    for ci in 0..prep.inst.courses.len() {
        let mut sum = Expression::from(0.0);
        for ri in 0..prep.inst.rooms.len() {
            for di in 0..DayOfWeek::ALL.len() {
                for hi in 0..prep.grid.num_hours() {
                    if let Some(y) = v.start.get(ci, ri, di, hi) {
                        sum = sum + y;
                    }
                }
            }
        }
        model = model.with(sum.eq(1.0));
    }
    model
}

pub(crate) fn add_contiguity_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    for (ci, course) in prep.inst.courses.iter().enumerate() {
        for ri in 0..prep.inst.rooms.len() {
            for di in 0..DayOfWeek::ALL.len() {
                for hi in 0..prep.grid.num_hours() {
                    let Some(y) = v.start.get(ci, ri, di, hi) else {
                        continue;
                    };
                    for k in 0..usize::from(course.duration_hours) {
                        if let Some(x) = v.occupy.get(ci, ri, di, hi + k) {
                            model = model.with((y - x).leq(0.0));
                        }
                    }
                }
            }
        }
    }
    model
}

pub(crate) fn add_cover_constraints<M: SolverModel>(mut model: M, prep: &Prep, v: &Vars) -> M {
    for (ci, course) in prep.inst.courses.iter().enumerate() {
        let span = usize::from(course.duration_hours);
        for ri in 0..prep.inst.rooms.len() {
            for di in 0..DayOfWeek::ALL.len() {
                for hi in 0..prep.grid.num_hours() {
                    let Some(x) = v.occupy.get(ci, ri, di, hi) else {
                        continue;
                    };
                    let mut covering = Expression::from(0.0);
                    let lo = hi.saturating_sub(span - 1);
                    for h0 in lo..=hi {
                        if let Some(y) = v.start.get(ci, ri, di, h0) {
                            covering = covering + y;
                        }
                    }
                    model = model.with((covering - x).geq(0.0));
                }
            }
        }
    }
    model
}

pub(crate) fn add_room_binding_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    let nr = prep.inst.rooms.len();
    for (ci, course) in prep.inst.courses.iter().enumerate() {
        let mut room_sum = Expression::from(0.0);
        for ri in 0..nr {
            let Some(z) = v.uses_room[ci * nr + ri] else {
                continue;
            };
            room_sum = room_sum + z;

            let mut occupancy = Expression::from(0.0);
            for di in 0..DayOfWeek::ALL.len() {
                for hi in 0..prep.grid.num_hours() {
                    if let Some(x) = v.occupy.get(ci, ri, di, hi) {
                        occupancy = occupancy + x;
                    }
                }
            }
            model = model.with((occupancy - f64::from(course.duration_hours) * z).leq(0.0));
        }
        model = model.with(room_sum.eq(1.0));
    }
    model
}

pub(crate) fn add_room_conflict_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    for ri in 0..prep.inst.rooms.len() {
        for di in 0..DayOfWeek::ALL.len() {
            for hi in 0..prep.grid.num_hours() {
                let mut sum = Expression::from(0.0);
                for ci in 0..prep.inst.courses.len() {
                    if let Some(x) = v.occupy.get(ci, ri, di, hi) {
                        sum = sum + x;
                    }
                }
                model = model.with(sum.leq(1.0));
            }
        }
    }
    model
}

pub(crate) fn add_professor_conflict_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    for (_, courses) in &prep.professors {
        model = add_party_conflict_constraints(model, prep, v, courses);
    }
    model
}

pub(crate) fn add_group_conflict_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
) -> M {
    for (_, courses) in &prep.groups {
        model = add_party_conflict_constraints(model, prep, v, courses);
    }
    model
}

fn add_party_conflict_constraints<M: SolverModel>(
    mut model: M,
    prep: &Prep,
    v: &Vars,
    courses: &[usize],
) -> M {
    if courses.len() < 2 {
        return model;
    }
    for di in 0..DayOfWeek::ALL.len() {
        for hi in 0..prep.grid.num_hours() {
            let mut sum = Expression::from(0.0);
            for &ci in courses {
                for ri in 0..prep.inst.rooms.len() {
                    if let Some(x) = v.occupy.get(ci, ri, di, hi) {
                        sum = sum + x;
                    }
                }
            }
            model = model.with(sum.leq(1.0));
        }
    }
    model
}

pub(crate) fn extract_placements(
    prep: &Prep,
    v: &Vars,
    sol: &impl Solution,
) -> (Vec<Placement>, Vec<CourseId>) {
    let mut placements = Vec::new();
    let mut unassigned = Vec::new();

    for (ci, course) in prep.inst.courses.iter().enumerate() {
        let mut found = None;
        'search: for ri in 0..prep.inst.rooms.len() {
            for di in 0..DayOfWeek::ALL.len() {
                for hi in 0..prep.grid.num_hours() {
                    if let Some(y) = v.start.get(ci, ri, di, hi) {
                        if sol.value(y) > 0.5 {
                            found = Some((ri, di, hi));
                            break 'search;
                        }
                    }
                }
            }
        }
        match found {
            Some((ri, di, hi)) => placements.push(Placement {
                course: course.id.clone(),
                room: prep.inst.rooms[ri].id.clone(),
                day: DayOfWeek::ALL[di],
                start_hour: prep.grid.hour_at(hi),
                duration_hours: course.duration_hours,
            }),
            None => unassigned.push(course.id.clone()),
        }
    }

    placements.sort_by(|a, b| {
        (a.day.index(), a.start_hour, &a.room.0).cmp(&(b.day.index(), b.start_hour, &b.room.0))
    });
    (placements, unassigned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::{Course, GridConfig, GroupId, PreferenceSet, ProfessorId, Room, RoomId};

    fn course(id: &str, professor: &str, group: &str, duration: u8, enrollment: u32) -> Course {
        Course {
            id: CourseId(id.into()),
            subject: id.into(),
            grade: 1,
            section: 'A',
            department: "CS".into(),
            professor: ProfessorId(professor.into()),
            enrollment,
            duration_hours: duration,
            group: GroupId(group.into()),
        }
    }

    fn room(id: &str, capacity: u32) -> Room {
        Room {
            id: RoomId(id.into()),
            capacity,
        }
    }

    fn grid() -> TimeGrid {
        TimeGrid::new(GridConfig::default())
    }

    #[test]
    fn var_table_round_trips_the_linear_index() {
        let mut pv = ProblemVariables::new();
        let mut table = VarTable::new(2, 3, 5, 9);
        let a = pv.add(good_lp::variable().binary());
        let b = pv.add(good_lp::variable().binary());
        table.set(0, 0, 0, 0, a);
        table.set(1, 2, 4, 8, b);
        assert!(table.get(0, 0, 0, 0).is_some());
        assert!(table.get(1, 2, 4, 8).is_some());
        assert!(table.get(0, 2, 4, 8).is_none());
        assert!(table.get(1, 2, 4, 7).is_none());
    }

    #[test]
    fn prep_indexes_parties_in_input_order() {
        let inst = Instance {
            courses: vec![
                course("A-1A", "P2", "CS-1A", 1, 10),
                course("B-1A", "P1", "CS-1B", 1, 10),
                course("C-1A", "P2", "CS-1A", 1, 10),
            ],
            rooms: vec![room("101", 30)],
            prefs: PreferenceSet::default(),
        };
        let prep = build_prep(&inst, grid(), Weights::default());
        let ids: Vec<&str> = prep.professors.iter().map(|(p, _)| *p).collect();
        assert_eq!(ids, vec!["P2", "P1"]);
        assert_eq!(prep.professors[0].1, vec![0, 2]);
        assert_eq!(prep.groups[0].1, vec![0, 2]);
    }

    #[test]
    fn capacity_excludes_variables_structurally() {
        let inst = Instance {
            courses: vec![course("A-1A", "P1", "CS-1A", 1, 40)],
            rooms: vec![room("101", 30), room("102", 60)],
            prefs: PreferenceSet::default(),
        };
        let prep = build_prep(&inst, grid(), Weights::default());
        assert!(!prep.fits(0, 0));
        assert!(prep.fits(0, 1));

        let mut pv = ProblemVariables::new();
        let v = declare_vars(&prep, &mut pv);
        assert!(v.uses_room[0].is_none());
        assert!(v.uses_room[1].is_some());
        assert!(v.occupy.get(0, 0, 0, 0).is_none());
        assert!(v.occupy.get(0, 1, 0, 0).is_some());
    }

    #[test]
    fn starts_past_end_of_day_are_never_declared() {
        let inst = Instance {
            courses: vec![course("A-1A", "P1", "CS-1A", 3, 10)],
            rooms: vec![room("101", 30)],
            prefs: PreferenceSet::default(),
        };
        let prep = build_prep(&inst, grid(), Weights::default());
        let mut pv = ProblemVariables::new();
        let v = declare_vars(&prep, &mut pv);
        assert!(v.start.get(0, 0, 0, 6).is_some());
        assert!(v.start.get(0, 0, 0, 7).is_none());
        assert!(v.start.get(0, 0, 0, 8).is_none());
        assert!(v.occupy.get(0, 0, 0, 8).is_some());
    }
}
