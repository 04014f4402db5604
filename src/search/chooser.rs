use indexmap::IndexSet;

use crate::geometry::{Heading, Point};

use super::grid::OccupancyIndex;

/// A chosen move: the destination cell and the heading used to get there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub point: Point,
    pub heading: Heading,
}

/// Greedy one-step lookahead towards a target cell.
#[derive(Clone, Copy, Debug)]
pub struct StepChooser<'a> {
    index: &'a OccupancyIndex,
}

impl<'a> StepChooser<'a> {
    pub fn new(index: &'a OccupancyIndex) -> Self {
        StepChooser { index }
    }

    /// A destination is admissible when it is a track cell not yet visited
    /// in the current attempt.
    pub fn admits(&self, point: Point, visited: &IndexSet<Point>) -> bool {
        self.index.is_track(point) && !visited.contains(&point)
    }

    /// Among the admissible candidates, the one closest to `target` by
    /// Manhattan distance. Candidates are tried in order and a later one only
    /// replaces the kept one when strictly closer.
    pub fn choose(
        &self,
        candidates: &[Heading],
        current: Point,
        target: Point,
        visited: &IndexSet<Point>,
    ) -> Option<Step> {
        let mut best: Option<(i32, Step)> = None;

        for &heading in candidates {
            let point = current.step(heading);
            if !self.admits(point, visited) {
                continue;
            }

            let distance = point.manhattan_distance(&target);
            if best.map_or(true, |(best_distance, _)| distance < best_distance) {
                best = Some((distance, Step { point, heading }));
            }
        }

        best.map(|(_, step)| step)
    }
}
