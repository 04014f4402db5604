use std::fmt;

use rstar::RTree;

use crate::error::{Result, SearchError};
use crate::geometry::Point;

const MAX_MASK_CELLS: u64 = 1 << 26;

#[derive(Clone)]
pub struct OccupancyIndex {
    min: Point,
    max: Point,
    width: usize,
    height: usize,
    mask: Vec<bool>,
    cells: Vec<Point>,
    tree: RTree<Point>,
}

impl OccupancyIndex {
    pub fn from_cells<I>(cells: I) -> Result<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let points: Vec<Point> = cells.into_iter().collect();
        if points.is_empty() {
            return Err(SearchError::EmptyTrack);
        }

        let mut min = points[0];
        let mut max = points[0];
        for point in &points {
            min.x = min.x.min(point.x);
            min.y = min.y.min(point.y);
            max.x = max.x.max(point.x);
            max.y = max.y.max(point.y);
        }

        // Every track cell needs all eight neighbours representable.
        let in_range = [min.x, min.y, max.x, max.y]
            .iter()
            .all(|&v| v > i32::MIN && v < i32::MAX);
        let width = (i64::from(max.x) - i64::from(min.x) + 1) as u64;
        let height = (i64::from(max.y) - i64::from(min.y) + 1) as u64;
        let size = match width.checked_mul(height) {
            Some(size) if in_range && size <= MAX_MASK_CELLS => size as usize,
            _ => return Err(SearchError::TrackTooLarge { min, max }),
        };
        let (width, height) = (width as usize, height as usize);
        let mut mask = vec![false; size];
        let mut unique = Vec::with_capacity(points.len());

        for point in points {
            let index = (point.y - min.y) as usize * width + (point.x - min.x) as usize;
            if !mask[index] {
                mask[index] = true;
                unique.push(point);
            }
        }

        Ok(OccupancyIndex {
            min,
            max,
            width,
            height,
            mask,
            tree: RTree::bulk_load(unique.clone()),
            cells: unique,
        })
    }

    pub fn from_rows<R>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[bool]>,
    {
        let cells = rows.iter().enumerate().flat_map(|(y, row)| {
            row.as_ref()
                .iter()
                .enumerate()
                .filter(|(_, occupied)| **occupied)
                .map(move |(x, _)| Point::new(x as i32, y as i32))
        });
        Self::from_cells(cells)
    }

    /// Parses the text grid format: one row per line, `1` or `#` for track,
    /// `0` or `.` for background. Spaces are ignored, blank lines skipped.
    pub fn from_ascii(text: &str) -> Result<Self> {
        let mut cells = Vec::new();
        let mut y = 0;

        for (line_number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut x = 0;
            for c in line.chars() {
                match c {
                    '1' | '#' => {
                        cells.push(Point::new(x, y));
                        x += 1;
                    }
                    '0' | '.' => x += 1,
                    ' ' | '\t' | '\r' => {}
                    other => {
                        return Err(SearchError::InvalidGrid {
                            line: line_number + 1,
                            reason: format!("unexpected character {:?}", other),
                        })
                    }
                }
            }
            y += 1;
        }

        Self::from_cells(cells)
    }

    pub fn from_coordinate_lists(xs: &[i32], ys: &[i32]) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(SearchError::MismatchedCoordinates {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        Self::from_cells(xs.iter().zip(ys).map(|(&x, &y)| Point::new(x, y)))
    }

    fn mask_index(&self, point: Point) -> Option<usize> {
        if point.x < self.min.x || point.x > self.max.x || point.y < self.min.y || point.y > self.max.y {
            return None;
        }
        Some((point.y - self.min.y) as usize * self.width + (point.x - self.min.x) as usize)
    }

    pub fn is_track(&self, point: Point) -> bool {
        self.mask_index(point).map_or(false, |index| self.mask[index])
    }

    pub fn track_count(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Point] {
        &self.cells
    }

    pub fn extent(&self) -> (Point, Point) {
        (self.min, self.max)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether a box spanning `min..=max` covers at least `fraction` of the
    /// track extent on at least one axis. An axis of zero extent counts as
    /// covered.
    pub fn covers_span(&self, min: Point, max: Point, fraction: f64) -> bool {
        if fraction <= 0.0 {
            return true;
        }
        let ratio = |span: i32, full: i32| {
            if full == 0 {
                1.0
            } else {
                span as f64 / full as f64
            }
        };
        let x_ratio = ratio(max.x - min.x, self.max.x - self.min.x);
        let y_ratio = ratio(max.y - min.y, self.max.y - self.min.y);
        x_ratio >= fraction || y_ratio >= fraction
    }

    pub fn nearest_track_cell(&self, point: Point) -> Option<Point> {
        self.tree.nearest_neighbor(&point).copied()
    }
}

impl fmt::Debug for OccupancyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OccupancyIndex")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("track_count", &self.cells.len())
            .finish()
    }
}
