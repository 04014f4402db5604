mod chooser;
mod converge;
mod dispatch;
mod grid;
mod policy;
mod stitch;
mod trace;
mod types;
mod walker;

pub use chooser::{Step, StepChooser};
pub use converge::{converge_loop, converge_loop_with, ConvergenceReport, RoundSummary};
pub use dispatch::{RayonDispatcher, SequentialDispatcher, TrialDispatcher};
pub use grid::OccupancyIndex;
pub use policy::{Greedy, HeadingPolicy, Randomized};
pub use stitch::{stitch_loop, Stitch};
pub use trace::{trace_json, write_trace, TraceError};
pub use types::{ConvergenceConfig, Path, PathNode, SearchBounds, WalkConfig};
pub use walker::{find_loop, greedy_walk, Walk, WalkState, Walker};
