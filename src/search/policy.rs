use indexmap::IndexSet;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::geometry::{Heading, Point};

use super::chooser::{Step, StepChooser};

/// Decides which of the remaining successor headings a walk takes next.
pub trait HeadingPolicy {
    fn pick(
        &mut self,
        chooser: &StepChooser<'_>,
        candidates: &mut [Heading],
        current: Point,
        target: Point,
        visited: &IndexSet<Point>,
    ) -> Option<Step>;
}

impl<P: HeadingPolicy + ?Sized> HeadingPolicy for &mut P {
    fn pick(
        &mut self,
        chooser: &StepChooser<'_>,
        candidates: &mut [Heading],
        current: Point,
        target: Point,
        visited: &IndexSet<Point>,
    ) -> Option<Step> {
        (**self).pick(chooser, candidates, current, target, visited)
    }
}

/// Deterministic: the step chooser's nearest-to-target pick.
#[derive(Clone, Copy, Debug, Default)]
pub struct Greedy;

impl HeadingPolicy for Greedy {
    fn pick(
        &mut self,
        chooser: &StepChooser<'_>,
        candidates: &mut [Heading],
        current: Point,
        target: Point,
        visited: &IndexSet<Point>,
    ) -> Option<Step> {
        chooser.choose(candidates, current, target, visited)
    }
}

/// Uniformly random among the admissible successors, ignoring the target.
#[derive(Clone, Debug)]
pub struct Randomized<R> {
    rng: R,
}

impl<R: Rng> Randomized<R> {
    pub fn new(rng: R) -> Self {
        Randomized { rng }
    }
}

impl<R: Rng> HeadingPolicy for Randomized<R> {
    fn pick(
        &mut self,
        chooser: &StepChooser<'_>,
        candidates: &mut [Heading],
        current: Point,
        _target: Point,
        visited: &IndexSet<Point>,
    ) -> Option<Step> {
        candidates.shuffle(&mut self.rng);
        candidates
            .iter()
            .map(|&heading| Step {
                point: current.step(heading),
                heading,
            })
            .find(|step| chooser.admits(step.point, visited))
    }
}
