mod common;

use trackloop_core::search::{
    converge_loop, converge_loop_with, find_loop, greedy_walk, stitch_loop, ConvergenceConfig, OccupancyIndex,
    SearchBounds, SequentialDispatcher, WalkConfig,
};
use trackloop_core::{Heading, Point, SearchError};

use common::{corners, ring, ring_cells};

#[test]
fn square_ring_closes_along_its_traversable_perimeter() {
    let index = ring(5);
    let starts = [
        (Point::new(2, 0), Heading::East),
        (Point::new(2, 0), Heading::West),
        (Point::new(0, 2), Heading::North),
        (Point::new(4, 2), Heading::South),
    ];
    for (start, heading) in starts {
        let path = find_loop(&index, start, heading, WalkConfig::default()).unwrap();

        assert!(path.is_closed());
        assert!(path.is_heading_legal());
        // Corners would need a 90° turn, so the loop is the 12-cell octagon.
        assert_eq!(path.node_count(), 12);
        assert!(corners(5).iter().all(|corner| path.position(*corner).is_none()));
    }
}

#[test]
fn ring_loop_runs_either_way_round() {
    let index = ring(5);
    let path = find_loop(&index, Point::new(2, 4), Heading::West, WalkConfig::default()).unwrap();
    assert_eq!(path.node_count(), 12);
    assert_eq!(path.first().unwrap().point, Point::new(2, 4));
    assert_eq!(path.last().unwrap().heading, Heading::West);
}

#[test]
fn start_beside_a_corner_cannot_close() {
    // The split edge (4, 0) is a corner with no legal way out.
    let index = ring(5);
    let walk = greedy_walk(&index, Point::new(3, 0), Heading::East, WalkConfig::default()).unwrap();
    assert!(matches!(walk.failure, Some(SearchError::BacktrackExhausted { .. })));
}

#[test]
fn single_cell_reports_exhaustion() {
    let index = OccupancyIndex::from_ascii("1").unwrap();
    for heading in Heading::ALL {
        let walk = greedy_walk(&index, Point::new(0, 0), heading, WalkConfig::default()).unwrap();
        assert!(!walk.succeeded());
        assert!(matches!(walk.failure, Some(SearchError::BacktrackExhausted { .. })));
    }
    assert!(matches!(
        find_loop(&index, Point::new(0, 0), Heading::North, WalkConfig::default()),
        Err(SearchError::BacktrackExhausted { .. })
    ));
}

#[test]
fn stitched_loop_stays_on_its_own_ring() {
    let mut cells = ring_cells(7, Point::new(0, 0));
    cells.extend(ring_cells(5, Point::new(10, 1)));
    let index = OccupancyIndex::from_cells(cells).unwrap();
    let own_ring = ring_cells(7, Point::new(0, 0));

    let stitch = stitch_loop(&index, Point::new(3, 0), Heading::East, WalkConfig::default()).unwrap();

    assert!(stitch.path.points().iter().all(|point| own_ring.contains(point)));
    assert_eq!(stitch.node_count(), 20);
}

#[test]
fn stitch_round_trip_rebuilds_the_loop_from_its_halves() {
    let index = ring(7);
    let stitch = stitch_loop(&index, Point::new(2, 0), Heading::East, WalkConfig::default()).unwrap();

    assert!(stitch.forward.succeeded());
    assert!(stitch.backward.succeeded());
    assert_eq!(stitch.splice, Point::new(5, 6));
    assert_eq!(stitch.splice_index, 9);
    assert_eq!(stitch.node_count(), 20);
    assert!(stitch.path.is_closed());
    assert!(stitch.path.is_heading_legal());

    let (head, tail) = stitch.halves().unwrap();
    assert_eq!(head.last().unwrap().point, stitch.splice);
    assert_eq!(tail.first().unwrap().point, stitch.splice);

    let mut rebuilt = head.into_nodes();
    rebuilt.extend(tail.nodes().iter().skip(1));
    assert_eq!(rebuilt, stitch.path.nodes());
}

#[test]
fn stitch_falls_back_to_a_nearer_splice_when_the_farthest_turns_too_sharply() {
    let index = OccupancyIndex::from_ascii(
        "1100001
         1111100
         1101110
         1010010
         0111101
         0111011
         1111111",
    )
    .unwrap();

    let stitch = stitch_loop(&index, Point::new(2, 5), Heading::NorthWest, WalkConfig::default()).unwrap();

    assert!(stitch.path.is_closed());
    assert!(stitch.path.is_heading_legal());
    assert_eq!(stitch.splice, Point::new(1, 1));
    assert_eq!(stitch.splice_index, 4);
    assert_eq!(stitch.node_count(), 12);
    assert_eq!(stitch.path.last().unwrap().heading, Heading::West);
}

#[test]
fn stitch_on_a_ring_too_tight_to_splice() {
    // Closing the backward walk needs the corner (4, 0), so it backtracks
    // all the way onto its split edge.
    let index = ring(5);
    let result = stitch_loop(&index, Point::new(2, 0), Heading::East, WalkConfig::default());
    assert_eq!(result.unwrap_err(), SearchError::SpliceNotFound);
}

#[test]
fn randomized_search_converges_to_the_perimeter() {
    let index = ring(5);
    let ring_length = index.track_count();
    let mut config = ConvergenceConfig::new(SearchBounds::new(0, ring_length * 2).unwrap());
    config.trials_per_round = 4;
    config.seed = Some(2024);

    let report = converge_loop(&index, Point::new(2, 0), Heading::East, &config).unwrap();

    assert_eq!(report.node_count(), 12);
    assert!(report.rounds.len() <= config.max_rounds);
    assert!(report.path.is_closed());
    assert!(report.path.is_heading_legal());
    assert_eq!(report.rounds[0].bounds, SearchBounds::new(0, 32).unwrap());
    // The second round cannot beat the octagon and stops the search.
    assert_eq!(report.rounds.len(), 2);
    assert_eq!(report.rounds[1].accepted, 0);
    assert_eq!(report.rounds[1].improvement, 0.0);

    let sequential =
        converge_loop_with(&index, Point::new(2, 0), Heading::East, &config, &SequentialDispatcher).unwrap();
    assert_eq!(sequential, report);
}

#[test]
fn snapped_start_finds_a_loop() {
    let index = ring(7);
    let start = index.nearest_track_cell(Point::new(3, 1)).unwrap();
    assert_eq!(start, Point::new(3, 0));
    let path = find_loop(&index, start, Heading::East, WalkConfig::default()).unwrap();
    assert_eq!(path.node_count(), 20);
}
