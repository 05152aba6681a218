//! # `comparator` – Dominance and Preference Algebra
//!
//! Two abstraction levels. An [`ObjectiveComparator`] orders a single scalar
//! objective with orientation controlled by its maximization flag. A
//! [`FitnessComparator`] orders whole M-dimensional fitness values: Pareto
//! dominance, lexicographic preference, the aggregated scalar, or
//! ε-dominance over hypercube coordinates. [`SolutionComparator`] finally
//! wraps a fitness comparator with solution-level semantics — single-axis
//! comparison and the two feasibility-aware policies.
//!
//! All comparisons return `+1`, `0` or `-1`, positive meaning the first
//! argument is preferred. Inputs disagreeing on M (or missing a required
//! extension) are a programmer error and panic with a `FitnessShape`
//! message.

use crate::fitness::Fitness;

/// Component comparator over one scalar objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveComparator {
    pub maximize: bool,
}

impl ObjectiveComparator {
    pub fn new(maximize: bool) -> Self {
        Self { maximize }
    }

    /// `+1` when `a` is better than `b` under this orientation.
    pub fn compare(&self, a: f64, b: f64) -> i32 {
        let sign = match a.partial_cmp(&b) {
            Some(std::cmp::Ordering::Greater) => 1,
            Some(std::cmp::Ordering::Less) => -1,
            _ => 0,
        };
        if self.maximize { sign } else { -sign }
    }

    fn compare_i64(&self, a: i64, b: i64) -> i32 {
        let sign = match a.cmp(&b) {
            std::cmp::Ordering::Greater => 1,
            std::cmp::Ordering::Less => -1,
            std::cmp::Ordering::Equal => 0,
        };
        if self.maximize { sign } else { -sign }
    }
}

/// Builds one component comparator per objective from the maximization flags.
pub fn component_comparators(senses: &[bool]) -> Vec<ObjectiveComparator> {
    senses.iter().map(|&m| ObjectiveComparator::new(m)).collect()
}

/// Comparator over whole fitness values.
#[derive(Debug, Clone)]
pub enum FitnessComparator {
    /// Strict Pareto dominance: `0` on any sign disagreement, otherwise the
    /// common sign with `0` treated as neutral.
    Pareto { components: Vec<ObjectiveComparator> },
    /// First non-zero component along the declared objective order decides.
    Lexicographic { components: Vec<ObjectiveComparator> },
    /// Compares the aggregated scalar value.
    ScalarValue { maximize: bool },
    /// Pareto dominance over hypercube coordinates; a coarser equivalence.
    Epsilon { components: Vec<ObjectiveComparator> },
}

impl FitnessComparator {
    pub fn pareto(senses: &[bool]) -> Self {
        FitnessComparator::Pareto {
            components: component_comparators(senses),
        }
    }

    pub fn lexicographic(senses: &[bool]) -> Self {
        FitnessComparator::Lexicographic {
            components: component_comparators(senses),
        }
    }

    pub fn epsilon(senses: &[bool]) -> Self {
        FitnessComparator::Epsilon {
            components: component_comparators(senses),
        }
    }

    /// `+1` when `a` is preferred, `-1` when `b` is, `0` otherwise.
    #[track_caller]
    pub fn compare(&self, a: &Fitness, b: &Fitness) -> i32 {
        match self {
            FitnessComparator::Pareto { components } => {
                check_shape(a, b, components.len());
                pareto_sign(
                    components
                        .iter()
                        .enumerate()
                        .map(|(i, c)| c.compare(a.objective_value(i), b.objective_value(i))),
                )
            }
            FitnessComparator::Lexicographic { components } => {
                check_shape(a, b, components.len());
                components
                    .iter()
                    .enumerate()
                    .map(|(i, c)| c.compare(a.objective_value(i), b.objective_value(i)))
                    .find(|&sign| sign != 0)
                    .unwrap_or(0)
            }
            FitnessComparator::ScalarValue { maximize } => {
                let (va, vb) = match (a.value(), b.value()) {
                    (Some(va), Some(vb)) => (va, vb),
                    _ => panic!("FitnessShape: scalar-value comparison requires both scalars set"),
                };
                ObjectiveComparator::new(*maximize).compare(va, vb)
            }
            FitnessComparator::Epsilon { components } => {
                let ca = &a.hypercube().coordinates;
                let cb = &b.hypercube().coordinates;
                assert!(
                    ca.len() == components.len() && cb.len() == components.len(),
                    "FitnessShape: hypercube coordinates disagree with the declared M = {}",
                    components.len()
                );
                pareto_sign(
                    components
                        .iter()
                        .zip(ca.iter().zip(cb.iter()))
                        .map(|(c, (&xa, &xb))| c.compare_i64(xa, xb)),
                )
            }
        }
    }
}

/// Folds component signs into the Pareto verdict: any disagreement is
/// incomparability, otherwise the common sign survives.
fn pareto_sign(signs: impl Iterator<Item = i32>) -> i32 {
    let mut verdict = 0;
    for sign in signs {
        if sign == 0 {
            continue;
        }
        if verdict == 0 {
            verdict = sign;
        } else if verdict != sign {
            return 0;
        }
    }
    verdict
}

#[track_caller]
fn check_shape(a: &Fitness, b: &Fitness, expected: usize) {
    assert!(
        a.num_objectives() == expected && b.num_objectives() == expected,
        "FitnessShape: comparator configured for M = {expected}, inputs carry M = {} and {}",
        a.num_objectives(),
        b.num_objectives()
    );
}

/// Solution-level comparator: a fitness comparator plus feasibility policy.
#[derive(Debug, Clone)]
pub enum SolutionComparator {
    /// Pure delegation.
    Plain(FitnessComparator),
    /// Compares a single declared objective dimension.
    ByObjective {
        index: usize,
        component: ObjectiveComparator,
    },
    /// Feasible beats infeasible; two infeasibles are equivalent.
    Constrained(FitnessComparator),
    /// Feasible beats infeasible; between two infeasibles the smaller degree
    /// of infeasibility wins.
    ConstrainedByViolation(FitnessComparator),
}

impl SolutionComparator {
    #[track_caller]
    pub fn compare(&self, a: &Fitness, b: &Fitness) -> i32 {
        match self {
            SolutionComparator::Plain(inner) => inner.compare(a, b),
            SolutionComparator::ByObjective { index, component } => {
                component.compare(a.objective_value(*index), b.objective_value(*index))
            }
            SolutionComparator::Constrained(inner) => {
                match (a.is_feasible(), b.is_feasible()) {
                    (true, true) => inner.compare(a, b),
                    (true, false) => 1,
                    (false, true) => -1,
                    (false, false) => 0,
                }
            }
            SolutionComparator::ConstrainedByViolation(inner) => {
                match (a.is_feasible(), b.is_feasible()) {
                    (true, true) => inner.compare(a, b),
                    (true, false) => 1,
                    (false, true) => -1,
                    (false, false) => {
                        let va = a.violation().unwrap_or(0.0);
                        let vb = b.violation().unwrap_or(0.0);
                        // Smaller violation is closer to feasibility.
                        ObjectiveComparator::new(false).compare(va, vb)
                    }
                }
            }
        }
    }
}
