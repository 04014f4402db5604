use std::fs;
use std::io;
use std::path::Path as FsPath;

use serde_json::json;
use thiserror::Error;

use super::converge::ConvergenceReport;

#[derive(Error, Debug)]
pub enum TraceError {
    #[error("failed to write search trace: {0}")]
    Io(#[from] io::Error),
    #[error("failed to serialize search trace: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Per-round series of a convergence search plus the loop it settled on.
pub fn trace_json(report: &ConvergenceReport) -> serde_json::Value {
    let rounds: Vec<serde_json::Value> = report
        .rounds
        .iter()
        .map(|round| {
            json!({
                "round": round.round,
                "low": round.bounds.low,
                "high": round.bounds.high,
                "trials": round.trials,
                "accepted": round.accepted,
                "round_best": round.round_best,
                "best": round.best,
                "improvement_pct": round.improvement * 100.0,
            })
        })
        .collect();

    let path: Vec<serde_json::Value> = report
        .path
        .nodes()
        .iter()
        .map(|node| json!({ "x": node.point.x, "y": node.point.y, "heading": node.heading.abbreviation() }))
        .collect();

    json!({
        "seed": report.seed,
        "config": report.config,
        "node_count": report.node_count(),
        "rounds": rounds,
        "path": path,
    })
}

pub fn write_trace(report: &ConvergenceReport, path: impl AsRef<FsPath>) -> Result<(), TraceError> {
    let serialized = serde_json::to_string_pretty(&trace_json(report))?;
    fs::write(path, serialized)?;
    Ok(())
}
