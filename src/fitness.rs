//! # `fitness` – Multi-Objective Fitness Algebra
//!
//! A [`Fitness`] carries the M objective values of one solution together
//! with the optional aggregated scalar, the acceptability flag that drives
//! early termination, the aggregate constraint violation, and a
//! strategy-specific [`Extension`].
//!
//! Extensions are additive: each strategy declares the variant it needs via
//! its fitness prototype, the evaluator stamps a clone of that prototype on
//! every solution it evaluates, and the strategy later mutates the variant
//! fields in place. Reading a variant the prototype did not declare is a
//! programmer error and panics with a `FitnessShape` message — the search
//! cannot proceed once a strategy observes fields nobody computed.
//!
//! Equality is value equality over `(M, values, scalar)`; extensions and
//! flags are bookkeeping, not identity.

use ndarray::Array1;

/// Per-strategy fitness payload. `None` for strategies that only need the
/// raw objective vector.
#[derive(Debug, Clone, Default)]
pub enum Extension {
    #[default]
    None,
    /// Non-domination rank and crowding distance (fronts + crowding family).
    Ranked(RankedFields),
    /// Normalised objectives and reference-direction association
    /// (reference-point niching family).
    Reference(ReferenceFields),
    /// Strength, raw fitness and k-NN density (strength family).
    Strength(StrengthFields),
    /// Integer hypercube coordinates (ε-dominance family).
    Hypercube(HypercubeFields),
    /// Grid coordinates, ranking and density fields (grid family).
    Grid(GridFields),
    /// Adaptive-grid location plus insertion sequence ((1+1) archive family).
    Location(LocationFields),
}

impl Extension {
    fn kind(&self) -> &'static str {
        match self {
            Extension::None => "None",
            Extension::Ranked(_) => "Ranked",
            Extension::Reference(_) => "Reference",
            Extension::Strength(_) => "Strength",
            Extension::Hypercube(_) => "Hypercube",
            Extension::Grid(_) => "Grid",
            Extension::Location(_) => "Location",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedFields {
    pub rank: usize,
    pub crowding: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceFields {
    pub rank: usize,
    pub normalized: Array1<f64>,
    pub reference_index: usize,
    pub perpendicular: f64,
}

impl Default for ReferenceFields {
    fn default() -> Self {
        Self {
            rank: 0,
            normalized: Array1::zeros(0),
            reference_index: 0,
            perpendicular: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrengthFields {
    /// S(x): number of pool members this solution dominates.
    pub strength: usize,
    /// R(x): sum of the strengths of the dominators.
    pub raw: f64,
    /// D(x) = 1 / (σ_k + 2).
    pub density: f64,
    /// F(x) = R(x) + D(x); smaller is better.
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HypercubeFields {
    pub coordinates: Vec<i64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridFields {
    pub coordinates: Vec<i64>,
    /// GR(x) = Σᵢ gᵢ(x), possibly penalised during selection.
    pub ranking: i64,
    /// Distance from the objective vector to the cell's best corner.
    pub coordinate_distance: f64,
    /// Accumulated grid crowding of the neighbourhood.
    pub crowding: f64,
    /// Penalty degree applied by the layered-selection punishment step.
    pub penalty: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationFields {
    /// Cell code in the adaptive grid over the archive's bounding box.
    pub location: usize,
    /// Monotonic insertion number, the deterministic eviction tie-break.
    pub sequence: u64,
}

/// Multi-objective fitness value attached to every evaluated solution.
#[derive(Debug, Clone)]
pub struct Fitness {
    values: Array1<f64>,
    scalar: Option<f64>,
    acceptable: bool,
    violation: Option<f64>,
    extension: Extension,
}

impl Fitness {
    /// Prototype with `num_objectives` zeroed values and no extension.
    pub fn objectives(num_objectives: usize) -> Self {
        Self {
            values: Array1::zeros(num_objectives),
            scalar: None,
            acceptable: false,
            violation: None,
            extension: Extension::None,
        }
    }

    /// Prototype builder: fixes the extension variant the evaluator stamps.
    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extension = extension;
        self
    }

    pub fn num_objectives(&self) -> usize {
        self.values.len()
    }

    pub fn objective_values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Value of objective `index`.
    ///
    /// # Panics
    /// With an `InvalidIndex` message when `index` is outside `[0, M)`.
    #[track_caller]
    pub fn objective_value(&self, index: usize) -> f64 {
        self.check_index(index);
        self.values[index]
    }

    /// Replaces the whole objective vector.
    ///
    /// # Panics
    /// With a `FitnessShape` message when the replacement changes M.
    #[track_caller]
    pub fn set_objective_values(&mut self, values: Array1<f64>) {
        assert_eq!(
            values.len(),
            self.values.len(),
            "FitnessShape: expected {} objective values, got {}",
            self.values.len(),
            values.len()
        );
        self.values = values;
    }

    /// Overwrites objective `index`.
    ///
    /// # Panics
    /// With an `InvalidIndex` message when `index` is outside `[0, M)`.
    #[track_caller]
    pub fn set_objective_value(&mut self, index: usize, value: f64) {
        self.check_index(index);
        self.values[index] = value;
    }

    /// Aggregated scalar value, when a scalarisation produced one.
    pub fn value(&self) -> Option<f64> {
        self.scalar
    }

    pub fn set_value(&mut self, value: f64) {
        self.scalar = Some(value);
    }

    pub fn is_acceptable(&self) -> bool {
        self.acceptable
    }

    pub fn set_acceptable(&mut self, acceptable: bool) {
        self.acceptable = acceptable;
    }

    /// Aggregate degree of infeasibility; `None` means unconstrained.
    pub fn violation(&self) -> Option<f64> {
        self.violation
    }

    pub fn set_violation(&mut self, violation: f64) {
        self.violation = Some(violation);
    }

    pub fn is_feasible(&self) -> bool {
        match self.violation {
            Some(value) => value <= 0.0,
            None => true,
        }
    }

    pub fn extension(&self) -> &Extension {
        &self.extension
    }

    pub fn extension_mut(&mut self) -> &mut Extension {
        &mut self.extension
    }

    #[track_caller]
    fn check_index(&self, index: usize) {
        assert!(
            index < self.values.len(),
            "InvalidIndex: objective index {} outside [0, {})",
            index,
            self.values.len()
        );
    }

    #[track_caller]
    fn wrong_extension(&self, wanted: &'static str) -> ! {
        panic!(
            "FitnessShape: strategy read the {wanted} extension but the active prototype \
             carries {}",
            self.extension.kind()
        );
    }
}

macro_rules! extension_accessors {
    ($get:ident, $get_mut:ident, $variant:ident, $fields:ty, $name:literal) => {
        impl Fitness {
            #[track_caller]
            pub fn $get(&self) -> &$fields {
                match &self.extension {
                    Extension::$variant(fields) => fields,
                    _ => self.wrong_extension($name),
                }
            }

            #[track_caller]
            pub fn $get_mut(&mut self) -> &mut $fields {
                if !matches!(self.extension, Extension::$variant(_)) {
                    self.wrong_extension($name);
                }
                match &mut self.extension {
                    Extension::$variant(fields) => fields,
                    _ => unreachable!(),
                }
            }
        }
    };
}

extension_accessors!(ranked, ranked_mut, Ranked, RankedFields, "Ranked");
extension_accessors!(reference, reference_mut, Reference, ReferenceFields, "Reference");
extension_accessors!(strength, strength_mut, Strength, StrengthFields, "Strength");
extension_accessors!(hypercube, hypercube_mut, Hypercube, HypercubeFields, "Hypercube");
extension_accessors!(grid, grid_mut, Grid, GridFields, "Grid");
extension_accessors!(location, location_mut, Location, LocationFields, "Location");

impl PartialEq for Fitness {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len()
            && self.values == other.values
            && self.scalar == other.scalar
    }
}
