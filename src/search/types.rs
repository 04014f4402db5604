use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SearchError};
use crate::geometry::{Heading, Point};

use super::grid::OccupancyIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathNode {
    pub point: Point,
    pub heading: Heading,
}

impl PathNode {
    pub const fn new(point: Point, heading: Heading) -> Self {
        PathNode { point, heading }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Path {
    nodes: Vec<PathNode>,
}

impl Path {
    pub fn new(nodes: Vec<PathNode>) -> Self {
        Path { nodes }
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<PathNode> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<&PathNode> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&PathNode> {
        self.nodes.last()
    }

    pub fn points(&self) -> Vec<Point> {
        self.nodes.iter().map(|node| node.point).collect()
    }

    pub fn position(&self, point: Point) -> Option<usize> {
        self.nodes.iter().position(|node| node.point == point)
    }

    pub fn is_closed(&self) -> bool {
        match (self.nodes.first(), self.nodes.last()) {
            (Some(first), Some(last)) => self.nodes.len() > 1 && first.point == last.point,
            _ => false,
        }
    }

    /// Every step moves one cell along its arrival heading and turns by at
    /// most 45° from the previous one.
    pub fn is_heading_legal(&self) -> bool {
        self.nodes.windows(2).all(|pair| {
            pair[0].heading.is_successor(pair[1].heading) && pair[0].point.step(pair[1].heading) == pair[1].point
        })
    }

    /// Splits the path at `index`; the node at `index` ends the first half and
    /// starts the second one.
    pub fn split_at(&self, index: usize) -> Option<(Path, Path)> {
        if index >= self.nodes.len() {
            return None;
        }
        Some((
            Path::new(self.nodes[..=index].to_vec()),
            Path::new(self.nodes[index..].to_vec()),
        ))
    }

    pub fn bounding_box(&self) -> Option<(Point, Point)> {
        let first = self.nodes.first()?.point;
        Some(self.nodes.iter().fold((first, first), |(min, max), node| {
            (
                Point::new(min.x.min(node.point.x), min.y.min(node.point.y)),
                Point::new(max.x.max(node.point.x), max.y.max(node.point.y)),
            )
        }))
    }

    pub(crate) fn push(&mut self, node: PathNode) {
        self.nodes.push(node);
    }

    pub(crate) fn pop(&mut self) -> Option<PathNode> {
        self.nodes.pop()
    }
}

/// Exclusive acceptance window on loop length: a loop of `n` steps is
/// accepted when `low < n < high`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub low: usize,
    pub high: usize,
}

impl SearchBounds {
    pub fn new(low: usize, high: usize) -> Result<Self> {
        if low >= high {
            return Err(SearchError::InvalidBounds { low, high });
        }
        Ok(SearchBounds { low, high })
    }

    /// Window of `(0, track cells / 2)`, a loop around an annular band rarely
    /// needs more than half of its cells.
    pub fn for_track(index: &OccupancyIndex) -> Self {
        SearchBounds {
            low: 0,
            high: (index.track_count() / 2).max(1),
        }
    }

    pub fn accepts(&self, node_count: usize) -> bool {
        node_count > self.low && node_count < self.high
    }

    pub fn with_high(self, high: usize) -> Self {
        SearchBounds { low: self.low, high }
    }
}

impl fmt::Display for SearchBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalkConfig {
    pub backtrack_limit: usize,
    pub max_steps: Option<usize>,
    /// Fraction of the track extent a loop must cover on at least one axis.
    pub min_span: f64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            backtrack_limit: 100,
            max_steps: None,
            min_span: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Window for the first round; later rounds only accept loops shorter
    /// than the best one found so far.
    pub bounds: SearchBounds,
    pub trials_per_round: usize,
    pub max_rounds: usize,
    pub improvement_threshold: f64,
    pub attempts_per_trial: usize,
    pub walk: WalkConfig,
    pub seed: Option<u64>,
}

impl ConvergenceConfig {
    pub fn new(bounds: SearchBounds) -> Self {
        ConvergenceConfig {
            bounds,
            trials_per_round: default_trials_per_round(),
            max_rounds: 20,
            improvement_threshold: 0.001,
            attempts_per_trial: 1000,
            walk: WalkConfig {
                min_span: 0.9,
                ..WalkConfig::default()
            },
            seed: None,
        }
    }

    pub fn for_track(index: &OccupancyIndex) -> Self {
        ConvergenceConfig::new(SearchBounds::for_track(index))
    }
}

fn default_trials_per_round() -> usize {
    std::thread::available_parallelism()
        .map(|cores| cores.get() / 2)
        .unwrap_or(1)
        .max(1)
}
