//! # `evaluator` – From Genomes to Solutions
//!
//! The evaluator is where user-supplied domain logic meets the core data
//! structures. It owns the declared [`Objective`] list, an optional
//! aggregate constraint function, an optional acceptability predicate and
//! the fitness prototype the active strategy asked for. `evaluate_all`
//! clones the prototype onto each genome, invokes every objective in
//! declared order and hands back fully formed [`Solution`]s.
//!
//! Two scheduling modes share the same contract. Sequential evaluation
//! walks the list in order. Parallel evaluation fans out over rayon; the
//! ordering of results still matches the input list, objective instances
//! must be free of shared mutable state, and the evaluation counter — an
//! atomic — is monotonic, approximate while a phase runs and exact once
//! `evaluate_all` returns.

use std::sync::atomic::{AtomicUsize, Ordering};

use derive_builder::Builder;
use rayon::prelude::*;

use crate::error::{ObjectiveFailure, SearchError};
use crate::fitness::Fitness;
use crate::solution::Solution;

/// One scalar objective over an opaque genome.
pub trait Objective<G>: Send + Sync {
    fn evaluate(&self, genome: &G) -> Result<f64, ObjectiveFailure>;

    /// Orientation: `true` when larger values are better.
    fn maximize(&self) -> bool {
        false
    }

    /// Declared value bounds, when the problem states them.
    fn bounds(&self) -> Option<(f64, f64)> {
        None
    }
}

/// Plain closures act as minimised, unbounded objectives.
impl<G, F> Objective<G> for F
where
    F: Fn(&G) -> f64 + Send + Sync,
{
    fn evaluate(&self, genome: &G) -> Result<f64, ObjectiveFailure> {
        Ok(self(genome))
    }
}

/// Closure objective with explicit orientation and bounds.
pub struct ObjectiveFunction<F> {
    function: F,
    maximize: bool,
    bounds: Option<(f64, f64)>,
}

impl<F> ObjectiveFunction<F> {
    pub fn minimizing(function: F) -> Self {
        Self {
            function,
            maximize: false,
            bounds: None,
        }
    }

    pub fn maximizing(function: F) -> Self {
        Self {
            function,
            maximize: true,
            bounds: None,
        }
    }

    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.bounds = Some((min, max));
        self
    }
}

impl<G, F> Objective<G> for ObjectiveFunction<F>
where
    F: Fn(&G) -> f64 + Send + Sync,
{
    fn evaluate(&self, genome: &G) -> Result<f64, ObjectiveFailure> {
        Ok((self.function)(genome))
    }

    fn maximize(&self) -> bool {
        self.maximize
    }

    fn bounds(&self) -> Option<(f64, f64)> {
        self.bounds
    }
}

/// Aggregate degree of infeasibility; values ≤ 0 mean feasible.
pub trait ConstraintFunction<G>: Send + Sync {
    fn violation(&self, genome: &G) -> f64;
}

impl<G, F> ConstraintFunction<G> for F
where
    F: Fn(&G) -> f64 + Send + Sync,
{
    fn violation(&self, genome: &G) -> f64 {
        self(genome)
    }
}

/// Predicate marking a fitness as good enough to stop the whole run.
pub type AcceptancePredicate = Box<dyn Fn(&Fitness) -> bool + Send + Sync>;

/// Scheduling of one `evaluate_all` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    #[default]
    Sequential,
    Parallel,
}

/// Evaluator owning objectives, constraint function, acceptance predicate
/// and the strategy's fitness prototype.
#[derive(Builder)]
#[builder(pattern = "owned")]
pub struct FitnessEvaluator<G> {
    #[builder(setter(each(name = "objective")))]
    objectives: Vec<Box<dyn Objective<G>>>,
    #[builder(default, setter(strip_option))]
    constraints: Option<Box<dyn ConstraintFunction<G>>>,
    #[builder(default, setter(strip_option))]
    acceptance: Option<AcceptancePredicate>,
    #[builder(default)]
    mode: EvaluationMode,
    #[builder(setter(skip), default)]
    prototype: Option<Fitness>,
    #[builder(setter(skip), default = "AtomicUsize::new(0)")]
    evaluations: AtomicUsize,
}

impl<G> FitnessEvaluator<G> {
    pub fn num_objectives(&self) -> usize {
        self.objectives.len()
    }

    /// Maximization flag per declared objective position.
    pub fn senses(&self) -> Vec<bool> {
        self.objectives.iter().map(|o| o.maximize()).collect()
    }

    /// Declared bounds per objective position.
    pub fn objective_bounds(&self) -> Vec<Option<(f64, f64)>> {
        self.objectives.iter().map(|o| o.bounds()).collect()
    }

    /// Installs the extended fitness the active strategy wants stamped.
    ///
    /// # Panics
    /// With a `FitnessShape` message when the prototype disagrees with the
    /// declared number of objectives.
    #[track_caller]
    pub fn set_prototype(&mut self, prototype: Fitness) {
        assert_eq!(
            prototype.num_objectives(),
            self.objectives.len(),
            "FitnessShape: prototype carries M = {}, evaluator declares {} objectives",
            prototype.num_objectives(),
            self.objectives.len()
        );
        self.prototype = Some(prototype);
    }

    /// Total number of solutions evaluated so far. Monotonic; exact between
    /// phases.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn prototype_fitness(&self) -> Fitness {
        self.prototype
            .clone()
            .unwrap_or_else(|| Fitness::objectives(self.objectives.len()))
    }

    fn evaluate_one(&self, position: usize, genome: G) -> Result<Solution<G>, SearchError> {
        let mut fitness = self.prototype_fitness();
        for (index, objective) in self.objectives.iter().enumerate() {
            let value = objective
                .evaluate(&genome)
                .map_err(|source| SearchError::Evaluator {
                    objective: index,
                    solution: position,
                    source,
                })?;
            fitness.set_objective_value(index, value);
        }
        if let Some(constraints) = &self.constraints {
            fitness.set_violation(constraints.violation(&genome).max(0.0));
        }
        if let Some(acceptance) = &self.acceptance {
            if acceptance(&fitness) {
                fitness.set_acceptable(true);
            }
        }
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(Solution::new(genome, fitness))
    }

    /// Evaluates a single genome.
    pub fn evaluate(&self, genome: G) -> Result<Solution<G>, SearchError> {
        self.evaluate_one(0, genome)
    }

    /// Evaluates a whole list, preserving input order in the result.
    pub fn evaluate_all(&self, genomes: Vec<G>) -> Result<Vec<Solution<G>>, SearchError>
    where
        G: Send + Sync,
    {
        match self.mode {
            EvaluationMode::Sequential => genomes
                .into_iter()
                .enumerate()
                .map(|(position, genome)| self.evaluate_one(position, genome))
                .collect(),
            EvaluationMode::Parallel => genomes
                .into_par_iter()
                .enumerate()
                .map(|(position, genome)| self.evaluate_one(position, genome))
                .collect(),
        }
    }
}
