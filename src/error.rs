//! # `error` – Failure kinds of the search core
//!
//! The crate distinguishes three families of failures:
//!
//! * **Recoverable, caller-facing** – represented by [`SearchError`] and
//!   surfaced through `Result`. A configuration incoherence is fatal before
//!   the first generation; an evaluator failure aborts the run unless the
//!   caller drops the offending solution before environmental selection; an
//!   empty input list aborts the command that required it.
//! * **Programmer errors** – shape disagreements between fitness objects
//!   (`FitnessShape`) and out-of-range objective indices (`InvalidIndex`).
//!   The search cannot proceed meaningfully after one of these, so they
//!   panic at the offending call site with a message naming the kind.
//! * **Control signals** – the driver's transition to `Finished` is plain
//!   state-machine control flow, never an error value.

use thiserror::Error;

/// Boxed source error raised by a user objective.
pub type ObjectiveFailure = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Incoherent configuration (missing key, wrong number of objectives,
    /// negative probability, zero population, …). Always fatal and always
    /// raised before the first generation.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An objective raised while evaluating a solution. Carries the index of
    /// the offending objective and the position of the solution inside the
    /// evaluated list.
    #[error("objective {objective} failed on solution {solution}: {source}")]
    Evaluator {
        objective: usize,
        solution: usize,
        #[source]
        source: ObjectiveFailure,
    },

    /// An operation received an empty list where at least one solution is
    /// required.
    #[error("{operation} requires a non-empty population")]
    InvalidPopulation { operation: &'static str },
}

impl SearchError {
    pub(crate) fn invalid_population(operation: &'static str) -> Self {
        SearchError::InvalidPopulation { operation }
    }
}
