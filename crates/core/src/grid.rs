use types::{DayOfWeek, GridConfig};

#[derive(Clone, Copy, Debug)]
pub struct TimeGrid {
    pub hour_min: u8,
    pub hour_end: u8,
}

impl TimeGrid {
    pub fn new(cfg: GridConfig) -> Self {
        debug_assert!(cfg.hour_min < cfg.hour_end);
        Self {
            hour_min: cfg.hour_min,
            hour_end: cfg.hour_end,
        }
    }

    pub fn hours(&self) -> impl Iterator<Item = u8> {
        self.hour_min..self.hour_end
    }

    pub fn num_hours(&self) -> usize {
        usize::from(self.hour_end - self.hour_min)
    }

    pub fn hour_index(&self, hour: u8) -> usize {
        usize::from(hour - self.hour_min)
    }

    pub fn hour_at(&self, index: usize) -> u8 {
        self.hour_min + index as u8
    }

    pub fn contains(&self, hour: u8) -> bool {
        hour >= self.hour_min && hour < self.hour_end
    }

    pub fn fits(&self, start_hour: u8, duration_hours: u8) -> bool {
        self.contains(start_hour)
            && u16::from(start_hour) + u16::from(duration_hours) <= u16::from(self.hour_end)
    }

    pub fn slots(&self) -> impl Iterator<Item = (DayOfWeek, u8)> + '_ {
        DayOfWeek::ALL
            .into_iter()
            .flat_map(move |day| self.hours().map(move |hour| (day, hour)))
    }
}
