use rayon::prelude::*;

/// Runs a batch of independent trials and hands back every result, in trial
/// order, once all of them have finished.
pub trait TrialDispatcher {
    fn dispatch<T, F>(&self, trials: usize, run: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync;
}

/// Trials run on rayon's global pool.
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonDispatcher;

impl TrialDispatcher for RayonDispatcher {
    fn dispatch<T, F>(&self, trials: usize, run: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        (0..trials).into_par_iter().map(run).collect()
    }
}

/// Trials run one after another on the calling thread.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequentialDispatcher;

impl TrialDispatcher for SequentialDispatcher {
    fn dispatch<T, F>(&self, trials: usize, run: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Send + Sync,
    {
        (0..trials).map(run).collect()
    }
}
