//! Steep climb and descent detection from consecutive-point grade.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::Route;

/// A contiguous climb or descent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SteepSection {
    pub start_index: usize,
    pub end_index: usize,
    pub start_km: f64,
    pub end_km: f64,
    pub distance_m: f64,
    /// Meters, negative for descents
    pub elevation_change: f64,
    /// Percent, negative for descents
    pub avg_grade: f64,
    /// Steepest single step in percent, negative for descents
    pub max_grade: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SteepSections {
    pub climbs: Vec<SteepSection>,
    pub descents: Vec<SteepSection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

struct Run {
    direction: Direction,
    start_index: usize,
    end_index: usize,
    distance_m: f64,
    elevation_change: f64,
    max_grade: f64,
}

impl Run {
    fn start(direction: Direction, from: usize, to: usize, distance_m: f64, delta: f64) -> Self {
        Self {
            direction,
            start_index: from,
            end_index: to,
            distance_m,
            elevation_change: delta,
            max_grade: delta / distance_m,
        }
    }

    fn extend(&mut self, to: usize, distance_m: f64, delta: f64) {
        let grade = delta / distance_m;
        self.end_index = to;
        self.distance_m += distance_m;
        self.elevation_change += delta;
        if grade.abs() > self.max_grade.abs() {
            self.max_grade = grade;
        }
    }

    fn into_section(self, cumulative: &[f64]) -> SteepSection {
        SteepSection {
            start_index: self.start_index,
            end_index: self.end_index,
            start_km: cumulative[self.start_index],
            end_km: cumulative[self.end_index],
            distance_m: self.distance_m,
            elevation_change: self.elevation_change,
            avg_grade: self.elevation_change / self.distance_m * 100.0,
            max_grade: self.max_grade * 100.0,
        }
    }
}

/// Find climbs and descents steeper than `min_grade` (a fraction, 0.05 = 5%)
/// and at least `min_length_m` long.
///
/// A missing elevation ends the current run. Zero-distance steps are skipped.
pub fn detect_steep_sections(route: &Route, min_length_m: f64, min_grade: f64) -> SteepSections {
    let cumulative = route.cumulative_distances();
    let mut sections = SteepSections::default();
    let mut current: Option<Run> = None;

    let close = |run: Option<Run>, sections: &mut SteepSections| {
        let Some(run) = run else { return };
        if run.distance_m < min_length_m {
            return;
        }
        let direction = run.direction;
        let section = run.into_section(&cumulative);
        match direction {
            Direction::Up => sections.climbs.push(section),
            Direction::Down => sections.descents.push(section),
        }
    };

    for i in 1..cumulative.len() {
        let distance_m = (cumulative[i] - cumulative[i - 1]) * 1000.0;
        if distance_m <= 0.0 {
            continue;
        }

        let prev = route.elevations.get(i - 1).copied().flatten();
        let curr = route.elevations.get(i).copied().flatten();
        let (Some(prev), Some(curr)) = (prev, curr) else {
            close(current.take(), &mut sections);
            continue;
        };

        let delta = curr - prev;
        let grade = delta / distance_m;
        let direction = if grade >= min_grade {
            Some(Direction::Up)
        } else if grade <= -min_grade {
            Some(Direction::Down)
        } else {
            None
        };

        match (&mut current, direction) {
            (Some(run), Some(d)) if run.direction == d => run.extend(i, distance_m, delta),
            (slot, Some(d)) => {
                close(slot.take(), &mut sections);
                *slot = Some(Run::start(d, i - 1, i, distance_m, delta));
            }
            (slot, None) => close(slot.take(), &mut sections),
        }
    }
    close(current.take(), &mut sections);

    debug!(
        "[Steep] '{}': {} climbs, {} descents (min {:.0} m at {:.1}%)",
        route.id,
        sections.climbs.len(),
        sections.descents.len(),
        min_length_m,
        min_grade * 100.0
    );
    sections
}
