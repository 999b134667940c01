use thiserror::Error;

/// Errors surfaced by the factory and belts solvers.
///
/// A detected infeasibility is never represented here — it is reported as
/// a structured `"infeasible"` output document (spec.md §7: "recoverable
/// conditions... become structured outputs").
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("malformed input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("solver failure: {0}")]
    SolverFailure(String),
}

pub type PlanResult<T> = Result<T, PlanError>;
