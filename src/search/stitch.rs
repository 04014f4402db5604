use std::cmp::Reverse;

use hashbrown::HashSet;
use tracing::{debug, trace, warn};

use crate::error::{Result, SearchError};
use crate::geometry::{Heading, Point};

use super::grid::OccupancyIndex;
use super::policy::Greedy;
use super::types::{Path, PathNode, WalkConfig};
use super::walker::{Walk, Walker};

#[derive(Clone, Debug, PartialEq)]
pub struct Stitch {
    pub path: Path,
    pub splice: Point,
    pub splice_index: usize,
    pub forward: Walk,
    pub backward: Walk,
}

impl Stitch {
    pub fn node_count(&self) -> usize {
        self.path.node_count()
    }

    pub fn halves(&self) -> Option<(Path, Path)> {
        self.path.split_at(self.splice_index)
    }
}

/// Runs one greedy walk each way around the track from the split edge
/// `start → start + heading` and joins them at the backward walk's cell
/// farthest from `start`.
///
/// Both walks contribute whatever path they hold when they stop, closed or
/// not. Splice cells are tried from farthest to nearest; the first one giving
/// a heading-legal loop that visits no cell twice wins.
pub fn stitch_loop(index: &OccupancyIndex, start: Point, heading: Heading, config: WalkConfig) -> Result<Stitch> {
    let forward = Walker::new(index, start, heading, Greedy, config)?.run();

    let edge = start.step(heading);
    if !index.is_track(edge) {
        warn!(?start, %heading, "split edge leaves the track");
        return Err(SearchError::SpliceNotFound);
    }
    let backward = Walker::new(index, edge, heading.opposite(), Greedy, config)?.run();

    let candidates = splice_candidates(backward.path.nodes(), start);
    let (splice_index, path) = candidates
        .iter()
        .find_map(|&k| join_at(&forward.path, backward.path.nodes(), k))
        .ok_or_else(|| {
            debug!(candidates = candidates.len(), "no splice cell gives a legal loop");
            SearchError::SpliceNotFound
        })?;

    let splice = path.nodes()[splice_index].point;
    debug!(
        ?splice,
        nodes = path.node_count(),
        forward_closed = forward.succeeded(),
        backward_closed = backward.succeeded(),
        "stitched loop"
    );

    Ok(Stitch {
        path,
        splice,
        splice_index,
        forward,
        backward,
    })
}

/// Backward-walk nodes past its own split edge, farthest from `origin`
/// first, earliest first on ties.
fn splice_candidates(nodes: &[PathNode], origin: Point) -> Vec<usize> {
    let mut candidates: Vec<usize> = (2..nodes.len()).collect();
    candidates.sort_by_key(|&i| Reverse(nodes[i].point.manhattan_distance(&origin)));
    candidates
}

fn join_at(forward: &Path, backward: &[PathNode], k: usize) -> Option<(usize, Path)> {
    let cell = backward[k].point;
    let j = forward.position(cell).filter(|&j| j >= 2)?;

    let mut nodes: Vec<PathNode> = forward.nodes()[..=j].to_vec();
    for i in (2..=k).rev() {
        nodes.push(PathNode::new(backward[i - 1].point, backward[i].heading.opposite()));
    }
    let path = Path::new(nodes);

    let mut seen = HashSet::new();
    let simple = path.nodes()[1..].iter().all(|node| seen.insert(node.point));
    if !simple || !path.is_heading_legal() {
        trace!(?cell, simple, "splice rejected");
        return None;
    }
    Some((j, path))
}
