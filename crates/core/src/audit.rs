use std::collections::{HashMap, HashSet};

use types::{Course, CourseId, DayOfWeek, Instance, Placement, PreferenceSet, Room, Weights};

use crate::grid::TimeGrid;

pub fn slot_weight(
    course: &Course,
    room: &Room,
    day: DayOfWeek,
    prefs: &PreferenceSet,
    weights: &Weights,
) -> f64 {
    let mut w = weights.capacity_penalty(course.enrollment, room.capacity);
    if prefs.prefers_room(&course.professor, &room.id) {
        w -= weights.room_pref;
    }
    if prefs.prefers_day(&course.professor, day) {
        w -= weights.day_pref;
    }
    w
}

pub fn objective_of(instance: &Instance, placements: &[Placement], weights: &Weights) -> f64 {
    let course_by_id: HashMap<&str, &Course> = instance
        .courses
        .iter()
        .map(|c| (c.id.0.as_str(), c))
        .collect();
    let room_by_id: HashMap<&str, &Room> = instance
        .rooms
        .iter()
        .map(|r| (r.id.0.as_str(), r))
        .collect();

    let mut total = 0.0;
    for p in placements {
        let (Some(course), Some(room)) = (
            course_by_id.get(p.course.0.as_str()),
            room_by_id.get(p.room.0.as_str()),
        ) else {
            continue;
        };
        let per_hour = slot_weight(course, room, p.day, &instance.prefs, weights);
        total += per_hour * f64::from(p.duration_hours);
    }
    total
}

pub fn check_placements(
    instance: &Instance,
    placements: &[Placement],
    unassigned: &[CourseId],
    grid: &TimeGrid,
) -> Result<(), String> {
    let mut errors: Vec<String> = Vec::new();

    let course_by_id: HashMap<&str, &Course> = instance
        .courses
        .iter()
        .map(|c| (c.id.0.as_str(), c))
        .collect();
    let room_by_id: HashMap<&str, &Room> = instance
        .rooms
        .iter()
        .map(|r| (r.id.0.as_str(), r))
        .collect();

    let mut placed: HashMap<&str, u32> = HashMap::new();
    let mut room_busy: HashSet<(&str, DayOfWeek, u8)> = HashSet::new();
    let mut professor_busy: HashSet<(&str, DayOfWeek, u8)> = HashSet::new();
    let mut group_busy: HashSet<(&str, DayOfWeek, u8)> = HashSet::new();

    for p in placements {
        let course = match course_by_id.get(p.course.0.as_str()) {
            Some(c) => *c,
            None => {
                errors.push(format!("placement refers to unknown course {}", p.course));
                continue;
            }
        };
        let room = match room_by_id.get(p.room.0.as_str()) {
            Some(r) => *r,
            None => {
                errors.push(format!("placement refers to unknown room {}", p.room));
                continue;
            }
        };

        *placed.entry(course.id.0.as_str()).or_default() += 1;

        if p.duration_hours != course.duration_hours {
            errors.push(format!(
                "course {} placed for {}h but requires {}h",
                course.id, p.duration_hours, course.duration_hours
            ));
        }
        if !grid.fits(p.start_hour, p.duration_hours) {
            errors.push(format!(
                "course {} at {}:00 for {}h runs past the end of day",
                course.id, p.start_hour, p.duration_hours
            ));
        }
        if course.enrollment > room.capacity {
            errors.push(format!(
                "course {} ({} students) placed in room {} (capacity {})",
                course.id, course.enrollment, room.id, room.capacity
            ));
        }

        for hour in p.start_hour..p.end_hour() {
            if !room_busy.insert((room.id.0.as_str(), p.day, hour)) {
                errors.push(format!(
                    "room {} double-booked on {} at {}:00",
                    room.id, p.day, hour
                ));
            }
            if !professor_busy.insert((course.professor.0.as_str(), p.day, hour)) {
                errors.push(format!(
                    "professor {} double-booked on {} at {}:00",
                    course.professor, p.day, hour
                ));
            }
            if !group_busy.insert((course.group.0.as_str(), p.day, hour)) {
                errors.push(format!(
                    "group {} double-booked on {} at {}:00",
                    course.group, p.day, hour
                ));
            }
        }
    }

    let unassigned_set: HashSet<&str> = unassigned.iter().map(|c| c.0.as_str()).collect();
    for course in &instance.courses {
        let n = placed.get(course.id.0.as_str()).copied().unwrap_or(0);
        let skipped = unassigned_set.contains(course.id.0.as_str());
        match (n, skipped) {
            (0, true) | (1, false) => {}
            (0, false) => errors.push(format!("course {} is neither placed nor unassigned", course.id)),
            (_, true) => errors.push(format!("course {} is both placed and unassigned", course.id)),
            (n, false) => errors.push(format!("course {} placed {n} times", course.id)),
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors.join("; "))
    }
}
