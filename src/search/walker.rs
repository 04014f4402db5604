use hashbrown::HashSet;
use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::error::{Result, SearchError};
use crate::geometry::{Heading, Point};

use super::chooser::{Step, StepChooser};
use super::grid::OccupancyIndex;
use super::policy::{Greedy, HeadingPolicy};
use super::types::{Path, PathNode, WalkConfig};

#[derive(Clone, Debug, PartialEq)]
pub enum WalkState {
    Searching,
    Backtracking,
    Succeeded,
    Failed(SearchError),
}

impl WalkState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WalkState::Succeeded | WalkState::Failed(_))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Walk {
    pub path: Path,
    pub failure: Option<SearchError>,
    pub backtracks: usize,
    pub steps: usize,
}

impl Walk {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.path.node_count()
    }

    pub fn into_loop(self) -> Result<Path> {
        match self.failure {
            None => Ok(self.path),
            Some(error) => Err(error),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Frame {
    /// Bit per heading already tried from this node.
    tried: u8,
    /// A loop closed below this node but was too small.
    span_rejected: bool,
}

impl Frame {
    fn has_tried(&self, heading: Heading) -> bool {
        self.tried & (1 << heading as u8) != 0
    }

    fn mark_tried(&mut self, heading: Heading) {
        self.tried |= 1 << heading as u8;
    }
}

/// Single-direction loop search with a backtrack stack.
///
/// The walk starts on `start`, steps once along the initial heading onto the
/// split edge and then tries to come back to `start` arriving with that same
/// heading. Arrival states that led nowhere are remembered for the rest of
/// the attempt. States that only failed because the loop they closed was too
/// small stay usable from other routes.
pub struct Walker<'a, P> {
    index: &'a OccupancyIndex,
    chooser: StepChooser<'a>,
    policy: P,
    config: WalkConfig,
    target: Point,
    initial_heading: Heading,
    current: Point,
    heading: Heading,
    path: Path,
    frames: Vec<Frame>,
    visited: IndexSet<Point>,
    dead_ends: HashSet<PathNode>,
    backtracks: usize,
    steps: usize,
    state: WalkState,
}

impl<'a, P: HeadingPolicy> Walker<'a, P> {
    pub fn new(
        index: &'a OccupancyIndex,
        start: Point,
        heading: Heading,
        policy: P,
        config: WalkConfig,
    ) -> Result<Self> {
        if !index.is_track(start) {
            return Err(SearchError::StartOffTrack(start));
        }

        let mut walker = Walker {
            index,
            chooser: StepChooser::new(index),
            policy,
            config,
            target: start,
            initial_heading: heading,
            current: start,
            heading,
            path: Path::new(vec![PathNode::new(start, heading)]),
            frames: vec![Frame::default()],
            visited: IndexSet::new(),
            dead_ends: HashSet::new(),
            backtracks: 0,
            steps: 0,
            state: WalkState::Searching,
        };

        let edge = start.step(heading);
        if index.is_track(edge) {
            walker.advance(Step { point: edge, heading });
        } else {
            // Nothing to backtrack into.
            walker.state = walker.exhausted();
        }

        Ok(walker)
    }

    pub fn state(&self) -> &WalkState {
        &self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn node_count(&self) -> usize {
        self.path.node_count()
    }

    pub fn step(&mut self) -> &WalkState {
        if self.state.is_terminal() {
            return &self.state;
        }
        if let Some(max_steps) = self.config.max_steps {
            if self.steps >= max_steps {
                self.state = self.exhausted();
                return &self.state;
            }
        }
        self.steps += 1;

        let current = self.current;
        let frame = self.frames.last().copied().unwrap_or_default();
        let mut candidates = [Heading::North; 3];
        let mut count = 0;
        for heading in self.heading.successors() {
            if !frame.has_tried(heading) && !self.dead_ends.contains(&PathNode::new(current.step(heading), heading)) {
                candidates[count] = heading;
                count += 1;
            }
        }

        let picked = self
            .policy
            .pick(&self.chooser, &mut candidates[..count], current, self.target, &self.visited);

        if let (Some(step), Some(frame)) = (picked, self.frames.last_mut()) {
            frame.mark_tried(step.heading);
        }

        match picked {
            Some(step) if step.point == self.target => {
                if step.heading != self.initial_heading {
                    trace!(heading = %step.heading, "reached the start with the wrong heading");
                    self.dead_ends.insert(PathNode::new(step.point, step.heading));
                    self.count_backtrack();
                } else if self.closes_loop() {
                    self.path.push(PathNode::new(step.point, step.heading));
                    self.current = step.point;
                    self.heading = step.heading;
                    self.state = WalkState::Succeeded;
                } else {
                    trace!(nodes = self.path.node_count(), "loop too small, trying other routes");
                    if let Some(frame) = self.frames.last_mut() {
                        frame.span_rejected = true;
                    }
                    self.count_backtrack();
                }
            }
            Some(step) => self.advance(step),
            None => self.backtrack(),
        }

        &self.state
    }

    pub fn run(mut self) -> Walk {
        while !self.step().is_terminal() {}

        let failure = match self.state {
            WalkState::Failed(error) => Some(error),
            _ => None,
        };
        debug!(
            target_cell = ?self.target,
            heading = %self.initial_heading,
            nodes = self.path.node_count(),
            backtracks = self.backtracks,
            succeeded = failure.is_none(),
            "walk finished"
        );

        Walk {
            path: self.path,
            failure,
            backtracks: self.backtracks,
            steps: self.steps,
        }
    }

    fn advance(&mut self, step: Step) {
        self.path.push(PathNode::new(step.point, step.heading));
        self.frames.push(Frame::default());
        self.visited.insert(step.point);
        self.current = step.point;
        self.heading = step.heading;
        self.state = WalkState::Searching;
    }

    fn backtrack(&mut self) {
        let error = SearchError::NoAdvance { at: self.current };
        trace!(%error, "backtracking");

        // The start cell and the split edge are fixed.
        if self.path.len() <= 2 {
            self.backtracks += 1;
            self.state = self.exhausted();
            return;
        }

        if let Some(dead_end) = self.path.pop() {
            self.visited.pop();
            let frame = self.frames.pop().unwrap_or_default();
            if frame.span_rejected {
                if let Some(parent) = self.frames.last_mut() {
                    parent.span_rejected = true;
                }
            } else {
                self.dead_ends.insert(dead_end);
            }
        }
        if let Some(last) = self.path.last() {
            self.current = last.point;
            self.heading = last.heading;
        }
        self.count_backtrack();
    }

    fn count_backtrack(&mut self) {
        self.backtracks += 1;
        self.state = if self.backtracks > self.config.backtrack_limit {
            self.exhausted()
        } else {
            WalkState::Backtracking
        };
    }

    fn exhausted(&self) -> WalkState {
        WalkState::Failed(SearchError::BacktrackExhausted {
            backtracks: self.backtracks,
            limit: self.config.backtrack_limit,
        })
    }

    fn closes_loop(&self) -> bool {
        match self.path.bounding_box() {
            Some((min, max)) => self.index.covers_span(min, max, self.config.min_span),
            None => false,
        }
    }
}

pub fn greedy_walk(index: &OccupancyIndex, start: Point, heading: Heading, config: WalkConfig) -> Result<Walk> {
    Ok(Walker::new(index, start, heading, Greedy, config)?.run())
}

/// Greedy loop search that only reports closed loops.
pub fn find_loop(index: &OccupancyIndex, start: Point, heading: Heading, config: WalkConfig) -> Result<Path> {
    greedy_walk(index, start, heading, config)?.into_loop()
}
