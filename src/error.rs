use thiserror::Error;

use crate::geometry::Point;
use crate::search::SearchBounds;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    #[error("no legal successor from {at:?}")]
    NoAdvance { at: Point },

    #[error("backtrack budget exhausted after {backtracks} backtracks (limit {limit})")]
    BacktrackExhausted { backtracks: usize, limit: usize },

    #[error("cannot find path: the two walks share no splice cell")]
    SpliceNotFound,

    #[error("no loop found within bounds {bounds} after {rounds} rounds")]
    RoundEmpty { rounds: usize, bounds: SearchBounds },

    #[error("start cell {0:?} is not a track cell")]
    StartOffTrack(Point),

    #[error("invalid search bounds: low {low} must be below high {high}")]
    InvalidBounds { low: usize, high: usize },

    #[error("track has no occupied cells")]
    EmptyTrack,

    #[error("track extent {min:?}..={max:?} is too large for an occupancy grid")]
    TrackTooLarge { min: Point, max: Point },

    #[error("invalid grid at line {line}: {reason}")]
    InvalidGrid { line: usize, reason: String },

    #[error("unknown heading {0:?}, expected one of N, NE, E, SE, S, SW, W, NW")]
    InvalidHeading(String),

    #[error("coordinate lists differ in length: {xs} x values, {ys} y values")]
    MismatchedCoordinates { xs: usize, ys: usize },
}

pub type Result<T> = std::result::Result<T, SearchError>;
