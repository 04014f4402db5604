use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SearchError};
use crate::geometry::{Heading, Point};

use super::dispatch::{RayonDispatcher, TrialDispatcher};
use super::grid::OccupancyIndex;
use super::policy::Randomized;
use super::types::{ConvergenceConfig, Path, SearchBounds};
use super::walker::Walker;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSummary {
    pub round: usize,
    pub bounds: SearchBounds,
    pub trials: usize,
    pub accepted: usize,
    pub round_best: Option<usize>,
    pub best: usize,
    /// `|previous − best| / previous`.
    pub improvement: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub path: Path,
    pub rounds: Vec<RoundSummary>,
    pub seed: u64,
    pub config: ConvergenceConfig,
}

impl ConvergenceReport {
    pub fn node_count(&self) -> usize {
        self.path.node_count()
    }
}

pub fn converge_loop(
    index: &OccupancyIndex,
    start: Point,
    heading: Heading,
    config: &ConvergenceConfig,
) -> Result<ConvergenceReport> {
    converge_loop_with(index, start, heading, config, &RayonDispatcher)
}

/// Runs rounds of randomized trials, tightening the upper bound to the best
/// loop found so far, until a round improves by no more than the configured
/// threshold or the round cap is hit.
pub fn converge_loop_with<D: TrialDispatcher>(
    index: &OccupancyIndex,
    start: Point,
    heading: Heading,
    config: &ConvergenceConfig,
    dispatcher: &D,
) -> Result<ConvergenceReport> {
    if !index.is_track(start) {
        return Err(SearchError::StartOffTrack(start));
    }
    let mut bounds = SearchBounds::new(config.bounds.low, config.bounds.high)?;
    let seed = config.seed.unwrap_or_else(rand::random);
    let trials = config.trials_per_round.max(1);

    info!(?start, %heading, %bounds, trials, seed, "starting loop search");

    let mut best: Option<Path> = None;
    let mut previous = bounds.high as f64;
    let mut rounds = Vec::new();

    for round in 1..=config.max_rounds {
        let results = dispatcher.dispatch(trials, |trial| {
            run_trial(index, start, heading, config, bounds, trial_seed(seed, round, trial))
        });

        let accepted = results.iter().filter(|result| result.is_some()).count();
        let round_best = results.into_iter().flatten().min_by_key(|path| path.node_count());
        let round_best_len = round_best.as_ref().map(|path| path.node_count());

        if let Some(path) = round_best {
            if best.as_ref().map_or(true, |current| path.node_count() < current.node_count()) {
                best = Some(path);
            }
        }

        let best_len = match &best {
            Some(path) => path.node_count(),
            None => {
                info!(round, %bounds, "no loop found within bounds");
                return Err(SearchError::RoundEmpty { rounds: round, bounds });
            }
        };

        let improvement = (previous - best_len as f64).abs() / previous;
        info!(
            round,
            accepted,
            best = best_len,
            improvement_pct = improvement * 100.0,
            "round finished"
        );
        rounds.push(RoundSummary {
            round,
            bounds,
            trials,
            accepted,
            round_best: round_best_len,
            best: best_len,
            improvement,
        });

        if improvement <= config.improvement_threshold || best_len <= bounds.low + 1 {
            break;
        }
        previous = best_len as f64;
        bounds = bounds.with_high(best_len);
    }

    match best {
        Some(path) => Ok(ConvergenceReport {
            path,
            rounds,
            seed,
            config: *config,
        }),
        None => Err(SearchError::RoundEmpty { rounds: 0, bounds }),
    }
}

fn run_trial(
    index: &OccupancyIndex,
    start: Point,
    heading: Heading,
    config: &ConvergenceConfig,
    bounds: SearchBounds,
    seed: u64,
) -> Option<Path> {
    let mut policy = Randomized::new(StdRng::seed_from_u64(seed));

    for attempt in 0..config.attempts_per_trial {
        let walk = Walker::new(index, start, heading, &mut policy, config.walk).ok()?.run();
        if walk.succeeded() && bounds.accepts(walk.node_count()) {
            debug!(attempt, nodes = walk.node_count(), "trial accepted a loop");
            return Some(walk.path);
        }
    }
    None
}

/// Seed of one trial, fixed for a given `(seed, round, trial)` on every
/// platform and toolchain.
fn trial_seed(seed: u64, round: usize, trial: usize) -> u64 {
    splitmix64(splitmix64(splitmix64(seed) ^ round as u64) ^ trial as u64)
}

fn splitmix64(value: u64) -> u64 {
    let mut z = value.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::dispatch::SequentialDispatcher;

    fn ring() -> OccupancyIndex {
        OccupancyIndex::from_ascii(
            "1111111
             1000001
             1000001
             1000001
             1000001
             1000001
             1111111",
        )
        .unwrap()
    }

    fn config(bounds: SearchBounds) -> ConvergenceConfig {
        ConvergenceConfig {
            trials_per_round: 4,
            attempts_per_trial: 50,
            seed: Some(42),
            ..ConvergenceConfig::new(bounds)
        }
    }

    #[test]
    fn trial_seeds_differ_per_round_and_trial() {
        assert_ne!(trial_seed(1, 1, 0), trial_seed(1, 1, 1));
        assert_ne!(trial_seed(1, 1, 0), trial_seed(1, 2, 0));
        assert_eq!(trial_seed(1, 1, 0), trial_seed(1, 1, 0));
    }

    #[test]
    fn trial_seeds_are_pinned() {
        assert_eq!(splitmix64(0), 0xE220_A839_7B1D_CDAF);
        assert_eq!(trial_seed(1, 1, 0), 0x5775_264A_9A7E_1B09);
        assert_eq!(trial_seed(42, 3, 7), 0xAB2F_9774_6E2E_A953);
    }

    #[test]
    fn seeded_search_is_reproducible_across_dispatchers() {
        let index = ring();
        let config = config(SearchBounds::new(0, 48).unwrap());

        let parallel = converge_loop(&index, Point::new(2, 0), Heading::East, &config).unwrap();
        let sequential =
            converge_loop_with(&index, Point::new(2, 0), Heading::East, &config, &SequentialDispatcher).unwrap();

        assert_eq!(parallel, sequential);
        assert!(parallel.path.is_closed());
        assert!(parallel.path.is_heading_legal());
    }

    #[test]
    fn later_rounds_only_accept_shorter_loops() {
        let index = ring();
        let report =
            converge_loop(&index, Point::new(2, 0), Heading::East, &config(SearchBounds::new(0, 48).unwrap())).unwrap();

        assert_eq!(report.rounds[0].bounds.high, 48);
        for pair in report.rounds.windows(2) {
            assert_eq!(pair[1].bounds.high, pair[0].best);
            assert!(pair[1].best <= pair[0].best);
        }
        assert_eq!(report.node_count(), report.rounds.last().unwrap().best);
    }

    #[test]
    fn empty_first_round_reports_round_empty() {
        let index = ring();
        // Every loop on this ring is 20 steps long.
        let bounds = SearchBounds::new(0, 20).unwrap();
        let error = converge_loop(&index, Point::new(2, 0), Heading::East, &config(bounds)).unwrap_err();
        assert_eq!(error, SearchError::RoundEmpty { rounds: 1, bounds });
    }

    #[test]
    fn invalid_inputs_are_rejected_before_dispatch() {
        let index = ring();
        let mut bad_bounds = config(SearchBounds::new(0, 10).unwrap());
        bad_bounds.bounds = SearchBounds { low: 10, high: 3 };
        assert_eq!(
            converge_loop(&index, Point::new(2, 0), Heading::East, &bad_bounds).unwrap_err(),
            SearchError::InvalidBounds { low: 10, high: 3 }
        );

        let config = config(SearchBounds::new(0, 10).unwrap());
        assert_eq!(
            converge_loop(&index, Point::new(3, 3), Heading::East, &config).unwrap_err(),
            SearchError::StartOffTrack(Point::new(3, 3))
        );
    }
}
