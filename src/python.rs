use std::path::PathBuf;

use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use tracing::level_filters::LevelFilter;

use crate::error::SearchError;
use crate::geometry::{Heading, Point};
use crate::lib_tracing::{LibTracer, TracingConfig};
use crate::search::{self, ConvergenceConfig, ConvergenceReport, OccupancyIndex, Path, SearchBounds, WalkConfig};

impl From<SearchError> for PyErr {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::StartOffTrack(_)
            | SearchError::InvalidBounds { .. }
            | SearchError::EmptyTrack
            | SearchError::TrackTooLarge { .. }
            | SearchError::InvalidGrid { .. }
            | SearchError::InvalidHeading(_)
            | SearchError::MismatchedCoordinates { .. } => PyValueError::new_err(error.to_string()),
            _ => PyRuntimeError::new_err(error.to_string()),
        }
    }
}

type DirectedCell = (i32, i32, &'static str);

fn directed_cells(path: &Path) -> Vec<DirectedCell> {
    path.nodes()
        .iter()
        .map(|node| (node.point.x, node.point.y, node.heading.abbreviation()))
        .collect()
}

fn track(cells: Vec<(i32, i32)>) -> PyResult<OccupancyIndex> {
    Ok(OccupancyIndex::from_cells(cells.into_iter().map(Point::from))?)
}

fn walk_config(backtrack_limit: usize, min_span: f64) -> WalkConfig {
    WalkConfig {
        backtrack_limit,
        min_span,
        ..WalkConfig::default()
    }
}

/// Greedy loop through `start`, as `(x, y, heading)` triples.
#[pyfunction]
#[pyo3(signature = (cells, start, heading, backtrack_limit = 100, min_span = 0.0))]
fn find_loop(
    py: Python<'_>,
    cells: Vec<(i32, i32)>,
    start: (i32, i32),
    heading: String,
    backtrack_limit: usize,
    min_span: f64,
) -> PyResult<Vec<DirectedCell>> {
    let index = track(cells)?;
    let heading: Heading = heading.parse()?;
    let config = walk_config(backtrack_limit, min_span);
    let path = py.allow_threads(|| search::find_loop(&index, start.into(), heading, config))?;
    Ok(directed_cells(&path))
}

#[pyfunction]
#[pyo3(signature = (cells, start, heading, backtrack_limit = 100))]
fn stitch_loop(
    py: Python<'_>,
    cells: Vec<(i32, i32)>,
    start: (i32, i32),
    heading: String,
    backtrack_limit: usize,
) -> PyResult<Vec<DirectedCell>> {
    let index = track(cells)?;
    let heading: Heading = heading.parse()?;
    let config = walk_config(backtrack_limit, 0.0);
    let stitch = py.allow_threads(|| search::stitch_loop(&index, start.into(), heading, config))?;
    Ok(directed_cells(&stitch.path))
}

#[pyclass]
pub struct ConvergenceResult {
    report: ConvergenceReport,
}

#[pymethods]
impl ConvergenceResult {
    #[getter]
    fn path(&self) -> Vec<DirectedCell> {
        directed_cells(&self.report.path)
    }

    #[getter]
    fn node_count(&self) -> usize {
        self.report.node_count()
    }

    #[getter]
    fn seed(&self) -> u64 {
        self.report.seed
    }

    /// `(round, high, trials, accepted, best, improvement_pct)` per round.
    #[getter]
    fn rounds(&self) -> Vec<(usize, usize, usize, usize, usize, f64)> {
        self.report
            .rounds
            .iter()
            .map(|round| {
                (
                    round.round,
                    round.bounds.high,
                    round.trials,
                    round.accepted,
                    round.best,
                    round.improvement * 100.0,
                )
            })
            .collect()
    }

    fn write_trace(&self, path: PathBuf) -> PyResult<()> {
        search::write_trace(&self.report, &path).map_err(|e| {
            PyIOError::new_err(format!("Failed to write search trace to {}: {}", path.display(), e))
        })
    }
}

#[pyfunction]
#[pyo3(signature = (
    cells,
    start,
    heading,
    low = None,
    high = None,
    trials_per_round = None,
    max_rounds = 20,
    improvement_threshold = 0.001,
    attempts_per_trial = 1000,
    min_span = 0.9,
    seed = None
))]
#[allow(clippy::too_many_arguments)]
fn converge_loop(
    py: Python<'_>,
    cells: Vec<(i32, i32)>,
    start: (i32, i32),
    heading: String,
    low: Option<usize>,
    high: Option<usize>,
    trials_per_round: Option<usize>,
    max_rounds: usize,
    improvement_threshold: f64,
    attempts_per_trial: usize,
    min_span: f64,
    seed: Option<u64>,
) -> PyResult<ConvergenceResult> {
    let index = track(cells)?;
    let heading: Heading = heading.parse()?;

    let default_bounds = SearchBounds::for_track(&index);
    let bounds = SearchBounds::new(low.unwrap_or(default_bounds.low), high.unwrap_or(default_bounds.high))?;
    let mut config = ConvergenceConfig::new(bounds);
    if let Some(trials) = trials_per_round {
        config.trials_per_round = trials;
    }
    config.max_rounds = max_rounds;
    config.improvement_threshold = improvement_threshold;
    config.attempts_per_trial = attempts_per_trial;
    config.walk.min_span = min_span;
    config.seed = seed;

    let report = py.allow_threads(|| search::converge_loop(&index, start.into(), heading, &config))?;
    Ok(ConvergenceResult { report })
}

#[pyclass(name = "LibTracer")]
pub struct PyLibTracer {
    tracer: LibTracer,
}

#[pymethods]
impl PyLibTracer {
    #[new]
    #[pyo3(signature = (level = None, debug_log = None, flame_graph = None))]
    fn new(level: Option<String>, debug_log: Option<PathBuf>, flame_graph: Option<PathBuf>) -> PyResult<Self> {
        let level = level.unwrap_or_else(|| "info".to_string());
        let stdout_level: LevelFilter = level
            .parse()
            .map_err(|e| PyValueError::new_err(format!("invalid log level {level:?}: {e}")))?;
        let config = TracingConfig {
            stdout_level,
            debug_log,
            flame_graph,
        };
        let tracer = LibTracer::install(&config).map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(PyLibTracer { tracer })
    }

    fn flush(&self) -> PyResult<()> {
        self.tracer.flush().map_err(|e| PyIOError::new_err(e.to_string()))
    }
}

pub(crate) fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ConvergenceResult>()?;
    m.add_class::<PyLibTracer>()?;
    m.add_function(wrap_pyfunction!(find_loop, m)?)?;
    m.add_function(wrap_pyfunction!(stitch_loop, m)?)?;
    m.add_function(wrap_pyfunction!(converge_loop, m)?)?;
    Ok(())
}
