#![allow(dead_code)]

use trackloop_core::search::OccupancyIndex;
use trackloop_core::Point;

/// Border cells of an `n × n` square whose top-left corner is `origin`.
pub fn ring_cells(n: i32, origin: Point) -> Vec<Point> {
    let mut cells = Vec::new();
    for y in 0..n {
        for x in 0..n {
            if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
                cells.push(Point::new(origin.x + x, origin.y + y));
            }
        }
    }
    cells
}

pub fn ring(n: i32) -> OccupancyIndex {
    OccupancyIndex::from_cells(ring_cells(n, Point::new(0, 0))).unwrap()
}

pub fn corners(n: i32) -> [Point; 4] {
    [
        Point::new(0, 0),
        Point::new(n - 1, 0),
        Point::new(0, n - 1),
        Point::new(n - 1, n - 1),
    ]
}
