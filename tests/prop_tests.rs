use hashbrown::HashSet;
use indexmap::IndexSet;
use proptest::prelude::*;

use trackloop_core::search::{greedy_walk, stitch_loop, OccupancyIndex, StepChooser, WalkConfig};
use trackloop_core::{Heading, Point};

fn heading() -> impl Strategy<Value = Heading> {
    prop::sample::select(Heading::ALL.to_vec())
}

fn grid() -> impl Strategy<Value = Vec<Vec<bool>>> {
    (2usize..8, 2usize..8).prop_flat_map(|(width, height)| {
        prop::collection::vec(prop::collection::vec(prop::bool::weighted(0.7), width), height)
    })
}

/// A non-empty track plus one of its cells.
fn track_and_start() -> impl Strategy<Value = (OccupancyIndex, Point)> {
    (grid(), any::<prop::sample::Index>()).prop_filter_map("grid has no track cells", |(rows, pick)| {
        let index = OccupancyIndex::from_rows(&rows).ok()?;
        let start = *pick.get(index.cells());
        Some((index, start))
    })
}

proptest! {
    #[test]
    fn successors_are_three_distinct_turns(h in heading()) {
        let successors = h.successors();
        prop_assert_eq!(successors[1], h);
        prop_assert_ne!(successors[0], successors[2]);
        prop_assert!(!successors.contains(&h.opposite()));
        for next in successors {
            prop_assert!(h.is_successor(next));
        }
    }

    #[test]
    fn opposite_is_an_involution(h in heading()) {
        prop_assert_eq!(h.opposite().opposite(), h);
        prop_assert_ne!(h.opposite(), h);
        let (dx, dy) = h.step();
        prop_assert_eq!(h.opposite().step(), (-dx, -dy));
    }

    #[test]
    fn chooser_only_returns_unvisited_track_cells(
        (index, current) in track_and_start(),
        h in heading(),
        target in (0i32..8, 0i32..8),
        visited_mask in prop::collection::vec(any::<bool>(), 64),
    ) {
        let chooser = StepChooser::new(&index);
        let visited: IndexSet<Point> = index
            .cells()
            .iter()
            .zip(visited_mask)
            .filter(|(_, visited)| *visited)
            .map(|(cell, _)| *cell)
            .collect();

        if let Some(step) = chooser.choose(&h.successors(), current, target.into(), &visited) {
            prop_assert!(index.is_track(step.point));
            prop_assert!(!visited.contains(&step.point));
            prop_assert!(h.is_successor(step.heading));
            prop_assert_eq!(current.step(step.heading), step.point);
        }
    }

    #[test]
    fn greedy_walks_are_idempotent((index, start) in track_and_start(), h in heading()) {
        let first = greedy_walk(&index, start, h, WalkConfig::default()).unwrap();
        let second = greedy_walk(&index, start, h, WalkConfig::default()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn succeeded_walks_are_closed_and_legal((index, start) in track_and_start(), h in heading()) {
        let walk = greedy_walk(&index, start, h, WalkConfig::default()).unwrap();
        if walk.succeeded() {
            prop_assert!(walk.path.is_closed());
            prop_assert!(walk.path.is_heading_legal());
            prop_assert_eq!(walk.path.first().unwrap().heading, h);
            prop_assert_eq!(walk.path.last().unwrap().heading, h);
            prop_assert!(walk.path.points().iter().all(|point| index.is_track(*point)));
        }
    }

    #[test]
    fn stitched_loops_are_simple_closed_and_legal((index, start) in track_and_start(), h in heading()) {
        if let Ok(stitch) = stitch_loop(&index, start, h, WalkConfig::default()) {
            let path = &stitch.path;
            prop_assert!(path.is_closed());
            prop_assert!(path.is_heading_legal());
            prop_assert_eq!(path.first().unwrap().point, start);
            prop_assert!(path.points().iter().all(|point| index.is_track(*point)));

            let mut seen = HashSet::new();
            prop_assert!(path.nodes()[1..].iter().all(|node| seen.insert(node.point)));
            prop_assert_eq!(path.nodes()[stitch.splice_index].point, stitch.splice);
        }
    }
}
