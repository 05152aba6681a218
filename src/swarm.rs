//! # `swarm` – Multi-Objective Particle Swarms
//!
//! The swarm counterpart of the strategy layer. A [`Particle`] carries its
//! current position (a real-vector genome with fitness), its velocity and
//! its personal-best memory. A [`SwarmStrategy`] supplies the velocity
//! update, the optional turbulence operator and the leader-archive
//! maintenance; the swarm driver wires them into the move / disturb /
//! refresh cycle.
//!
//! [`MultiObjectivePso`] is the concrete strategy: inertia plus cognitive
//! and social pulls towards the personal best and a leader, velocity
//! clamped to a fraction of the variable range, leaders kept as a
//! crowding-truncated non-dominated archive, and a leader-selection policy
//! per flavour — crowding tournament, sigma similarity, or a density
//! roulette over leader grid cells.

use ndarray::Array1;
use ordered_float::OrderedFloat;
use rand_distr::{Distribution, Normal};

use crate::comparator::{FitnessComparator, SolutionComparator};
use crate::commands::{GridSpec, HypercubePartitioner, NonDominatedExtractor};
use crate::fitness::Fitness;
use crate::random::RandomGenerator;
use crate::solution::{Solution, fitness_matrix};
use crate::species::RealSpecies;
use crate::strategy::StrategyContext;

/// Real-vector genome of the swarm family.
pub type RealGenome = Array1<f64>;

/// One particle: current solution, velocity and personal-best memory.
#[derive(Debug, Clone)]
pub struct Particle {
    pub solution: Solution<RealGenome>,
    pub velocity: Array1<f64>,
    pub best: Solution<RealGenome>,
}

impl Particle {
    pub fn new(solution: Solution<RealGenome>) -> Self {
        let velocity = Array1::zeros(solution.genome.len());
        let best = solution.clone();
        Self {
            solution,
            velocity,
            best,
        }
    }
}

/// Capability set of one multi-objective PSO flavour.
pub trait SwarmStrategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
    }

    /// Comparator driving the personal-best memory update.
    fn solution_comparator(&self, senses: &[bool]) -> SolutionComparator {
        SolutionComparator::Plain(FitnessComparator::pareto(senses))
    }

    /// Initial leader set from the evaluated swarm.
    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        swarm: &[Particle],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<RealGenome>>;

    /// New velocity of one particle.
    fn velocity_update(
        &mut self,
        ctx: &StrategyContext,
        particle: &Particle,
        leaders: &[Solution<RealGenome>],
        species: &RealSpecies,
        rng: &mut impl RandomGenerator,
    ) -> Array1<f64>;

    /// Disturbed positions `(particle index, new genome)`; empty when the
    /// flavour carries no turbulence.
    fn turbulence(
        &mut self,
        ctx: &StrategyContext,
        swarm: &[Particle],
        species: &RealSpecies,
        rng: &mut impl RandomGenerator,
    ) -> Vec<(usize, RealGenome)>;

    /// Refreshes the leader archive from the moved swarm.
    fn update_leaders(
        &mut self,
        ctx: &StrategyContext,
        swarm: &[Particle],
        leaders: Vec<Solution<RealGenome>>,
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<RealGenome>>;
}

/// Leader-selection policy of [`MultiObjectivePso`].
#[derive(Debug, Clone)]
pub enum LeaderPolicy {
    /// Binary tournament on crowding distance among leaders.
    CrowdingTournament,
    /// Leader whose sigma vector is closest to the particle's.
    Sigma,
    /// Roulette weighted by the inverse density of leader grid cells.
    DensityRoulette { divisions: usize },
}

#[derive(Debug, Clone)]
pub struct MultiObjectivePso {
    policy: LeaderPolicy,
    inertia: (f64, f64),
    cognitive: (f64, f64),
    social: (f64, f64),
    /// Velocity bound as a fraction of the per-variable range.
    velocity_clamp: f64,
    leader_capacity: usize,
    turbulence_rate: f64,
    turbulence_sigma: f64,
    leader_crowding: Vec<f64>,
}

impl MultiObjectivePso {
    pub fn new(policy: LeaderPolicy, leader_capacity: usize) -> Self {
        assert!(leader_capacity > 0, "leader capacity must be positive");
        Self {
            policy,
            inertia: (0.1, 0.5),
            cognitive: (1.5, 2.0),
            social: (1.5, 2.0),
            velocity_clamp: 0.5,
            leader_capacity,
            turbulence_rate: 0.0,
            turbulence_sigma: 0.1,
            leader_crowding: Vec::new(),
        }
    }

    pub fn with_inertia(mut self, min: f64, max: f64) -> Self {
        self.inertia = (min, max);
        self
    }

    pub fn with_coefficients(mut self, cognitive: (f64, f64), social: (f64, f64)) -> Self {
        self.cognitive = cognitive;
        self.social = social;
        self
    }

    /// Enables turbulence: each particle is re-seeded with Gaussian noise
    /// of relative width `sigma` with probability `rate`.
    pub fn with_turbulence(mut self, rate: f64, sigma: f64) -> Self {
        assert!((0.0..=1.0).contains(&rate), "turbulence rate is a probability");
        self.turbulence_rate = rate;
        self.turbulence_sigma = sigma;
        self
    }

    pub fn with_velocity_clamp(mut self, fraction: f64) -> Self {
        self.velocity_clamp = fraction;
        self
    }

    /// Sigma vector of an objective vector: pairwise normalised
    /// differences of squares, the similarity measure of the sigma method.
    fn sigma_vector(values: &Array1<f64>) -> Vec<f64> {
        let m = values.len();
        let mut sigma = Vec::with_capacity(m * (m - 1) / 2);
        for i in 0..m {
            for j in (i + 1)..m {
                let (a, b) = (values[i] * values[i], values[j] * values[j]);
                let denominator = a + b;
                sigma.push(if denominator > 0.0 {
                    (a - b) / denominator
                } else {
                    0.0
                });
            }
        }
        sigma
    }

    fn pick_leader<'a>(
        &self,
        particle: &Particle,
        leaders: &'a [Solution<RealGenome>],
        rng: &mut impl RandomGenerator,
    ) -> &'a Solution<RealGenome> {
        match &self.policy {
            LeaderPolicy::CrowdingTournament => {
                let a = rng.gen_range_usize(0, leaders.len());
                let b = rng.gen_range_usize(0, leaders.len());
                let ca = self.leader_crowding.get(a).copied().unwrap_or(0.0);
                let cb = self.leader_crowding.get(b).copied().unwrap_or(0.0);
                if ca >= cb { &leaders[a] } else { &leaders[b] }
            }
            LeaderPolicy::Sigma => {
                let own = Self::sigma_vector(particle.solution.fitness.objective_values());
                leaders
                    .iter()
                    .min_by_key(|leader| {
                        let theirs =
                            Self::sigma_vector(leader.fitness.objective_values());
                        let distance: f64 = own
                            .iter()
                            .zip(theirs.iter())
                            .map(|(&x, &y)| (x - y) * (x - y))
                            .sum();
                        OrderedFloat(distance)
                    })
                    .expect("non-empty leader set")
            }
            LeaderPolicy::DensityRoulette { divisions } => {
                let matrix = fitness_matrix(leaders);
                let m = matrix.ncols();
                let mut lower = Vec::with_capacity(m);
                let mut upper = Vec::with_capacity(m);
                for objective in 0..m {
                    let column = matrix.column(objective);
                    let lo = column.iter().cloned().fold(f64::INFINITY, f64::min);
                    let up = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                    lower.push(lo);
                    upper.push(if up > lo { up } else { lo + 1.0 });
                }
                let partitioner = HypercubePartitioner::new(GridSpec::Divisions {
                    per_axis: *divisions,
                    lower,
                    upper,
                })
                .expect("derived grid spec is valid");

                let cells: Vec<Vec<i64>> = (0..leaders.len())
                    .map(|i| partitioner.cell_of(&matrix.row(i)))
                    .collect();
                let weights: Vec<f64> = cells
                    .iter()
                    .map(|cell| {
                        let occupancy = cells.iter().filter(|c| *c == cell).count();
                        1.0 / occupancy as f64
                    })
                    .collect();
                let total: f64 = weights.iter().sum();
                let mut draw = rng.gen_unit() * total;
                for (index, &weight) in weights.iter().enumerate() {
                    draw -= weight;
                    if draw <= 0.0 {
                        return &leaders[index];
                    }
                }
                &leaders[leaders.len() - 1]
            }
        }
    }
}

impl SwarmStrategy for MultiObjectivePso {
    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        swarm: &[Particle],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<RealGenome>> {
        self.update_leaders(ctx, swarm, Vec::new(), rng)
    }

    fn velocity_update(
        &mut self,
        _ctx: &StrategyContext,
        particle: &Particle,
        leaders: &[Solution<RealGenome>],
        species: &RealSpecies,
        rng: &mut impl RandomGenerator,
    ) -> Array1<f64> {
        let leader = if leaders.is_empty() {
            &particle.best
        } else {
            self.pick_leader(particle, leaders, rng)
        };

        let w = rng.gen_range_f64(self.inertia.0, self.inertia.1);
        let c1 = rng.gen_range_f64(self.cognitive.0, self.cognitive.1);
        let c2 = rng.gen_range_f64(self.social.0, self.social.1);
        let r1 = rng.gen_unit();
        let r2 = rng.gen_unit();

        let mut velocity = Array1::zeros(particle.velocity.len());
        for i in 0..velocity.len() {
            let pull_best = particle.best.genome[i] - particle.solution.genome[i];
            let pull_leader = leader.genome[i] - particle.solution.genome[i];
            let mut v = w * particle.velocity[i] + c1 * r1 * pull_best + c2 * r2 * pull_leader;
            let bound =
                self.velocity_clamp * (species.upper()[i] - species.lower()[i]);
            v = v.clamp(-bound, bound);
            velocity[i] = v;
        }
        velocity
    }

    fn turbulence(
        &mut self,
        _ctx: &StrategyContext,
        swarm: &[Particle],
        species: &RealSpecies,
        rng: &mut impl RandomGenerator,
    ) -> Vec<(usize, RealGenome)> {
        if self.turbulence_rate <= 0.0 {
            return Vec::new();
        }
        let mut disturbed = Vec::new();
        for (index, particle) in swarm.iter().enumerate() {
            if !rng.gen_bool(self.turbulence_rate) {
                continue;
            }
            let mut genome = particle.solution.genome.clone();
            for (i, value) in genome.iter_mut().enumerate() {
                let range = species.upper()[i] - species.lower()[i];
                let noise = Normal::new(0.0, self.turbulence_sigma * range)
                    .expect("positive standard deviation");
                *value += noise.sample(rng.rng());
            }
            species.clamp(&mut genome);
            disturbed.push((index, genome));
        }
        disturbed
    }

    fn update_leaders(
        &mut self,
        ctx: &StrategyContext,
        swarm: &[Particle],
        leaders: Vec<Solution<RealGenome>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<RealGenome>> {
        let mut pool = leaders;
        pool.extend(swarm.iter().map(|p| p.solution.clone()));
        if pool.is_empty() {
            return pool;
        }
        let mut extractor = NonDominatedExtractor::new(fitness_matrix(&pool), &ctx.senses);
        extractor
            .execute()
            .expect("non-empty pool cannot fail extraction");
        let mut leaders: Vec<Solution<RealGenome>> = extractor
            .front()
            .iter()
            .map(|&i| pool[i].clone())
            .collect();

        let crowding = crate::strategy::front_crowding(&leaders, ctx);
        if leaders.len() > self.leader_capacity {
            let mut order: Vec<usize> = (0..leaders.len()).collect();
            order.sort_by_key(|&i| std::cmp::Reverse(OrderedFloat(crowding[i])));
            order.truncate(self.leader_capacity);
            order.sort_unstable();
            let crowding: Vec<f64> = order.iter().map(|&i| crowding[i]).collect();
            leaders = order.into_iter().map(|i| leaders[i].clone()).collect();
            self.leader_crowding = crowding;
        } else {
            self.leader_crowding = crowding.to_vec();
        }
        leaders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SearchRandomGenerator;
    use ndarray::array;

    fn particle(position: &[f64], values: &[f64]) -> Particle {
        let mut fitness = Fitness::objectives(values.len());
        fitness.set_objective_values(Array1::from(values.to_vec()));
        Particle::new(Solution::new(Array1::from(position.to_vec()), fitness))
    }

    fn context() -> StrategyContext {
        StrategyContext::new(2, vec![false, false], vec![None, None], 4, 50, usize::MAX)
    }

    #[test]
    fn velocity_respects_the_clamp() {
        let mut strategy =
            MultiObjectivePso::new(LeaderPolicy::CrowdingTournament, 8).with_velocity_clamp(0.1);
        let ctx = context();
        let species = RealSpecies::uniform(2, 0.0, 10.0).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(31));

        let swarm = vec![particle(&[0.0, 0.0], &[1.0, 1.0])];
        let leaders = vec![Solution::new(array![10.0, 10.0], {
            let mut f = Fitness::objectives(2);
            f.set_objective_values(array![0.0, 0.0]);
            f
        })];
        let velocity =
            strategy.velocity_update(&ctx, &swarm[0], &leaders, &species, &mut rng);
        for &v in velocity.iter() {
            assert!(v.abs() <= 1.0 + 1e-12, "clamp is 0.1 × range = 1.0");
        }
    }

    #[test]
    fn leaders_are_non_dominated_and_capped() {
        let mut strategy = MultiObjectivePso::new(LeaderPolicy::CrowdingTournament, 3);
        let ctx = context();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(31));
        let swarm: Vec<Particle> = (0..6)
            .map(|i| {
                let t = i as f64;
                particle(&[t, t], &[t, 5.0 - t])
            })
            .collect();
        let leaders = strategy.initialize(&ctx, &swarm, &mut rng);
        assert_eq!(leaders.len(), 3);
        assert_eq!(strategy.leader_crowding.len(), 3);
        // The extremes survive crowding truncation.
        assert!(
            leaders
                .iter()
                .any(|l| l.fitness.objective_values() == &array![0.0, 5.0])
        );
        assert!(
            leaders
                .iter()
                .any(|l| l.fitness.objective_values() == &array![5.0, 0.0])
        );
    }

    #[test]
    fn sigma_vector_matches_the_two_objective_formula() {
        let sigma = MultiObjectivePso::sigma_vector(&array![3.0, 4.0]);
        // (9 - 16) / (9 + 16) = -0.28
        assert!((sigma[0] + 0.28).abs() < 1e-12);
    }

    #[test]
    fn sigma_policy_picks_the_aligned_leader() {
        let strategy = MultiObjectivePso::new(LeaderPolicy::Sigma, 8);
        let mut rng = SearchRandomGenerator::new_from_seed(Some(31));
        let follower = particle(&[0.0, 0.0], &[1.0, 0.1]);
        let leaders = vec![
            Solution::new(array![0.0, 0.0], {
                let mut f = Fitness::objectives(2);
                f.set_objective_values(array![2.0, 0.2]);
                f
            }),
            Solution::new(array![0.0, 0.0], {
                let mut f = Fitness::objectives(2);
                f.set_objective_values(array![0.2, 2.0]);
                f
            }),
        ];
        let picked = strategy.pick_leader(&follower, &leaders, &mut rng);
        // The particle's direction matches the first leader's.
        assert_eq!(picked.fitness.objective_values(), &array![2.0, 0.2]);
    }

    #[test]
    fn turbulence_disturbs_within_bounds() {
        let mut strategy =
            MultiObjectivePso::new(LeaderPolicy::CrowdingTournament, 8).with_turbulence(1.0, 0.3);
        let ctx = context();
        let species = RealSpecies::uniform(2, -1.0, 1.0).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(31));
        let swarm = vec![particle(&[0.5, -0.5], &[1.0, 1.0]); 4];
        let disturbed = strategy.turbulence(&ctx, &swarm, &species, &mut rng);
        assert_eq!(disturbed.len(), 4, "rate 1.0 disturbs every particle");
        for (_, genome) in &disturbed {
            for &v in genome.iter() {
                assert!((-1.0..=1.0).contains(&v));
            }
        }
    }

    #[test]
    fn zero_turbulence_rate_is_a_no_op() {
        let mut strategy = MultiObjectivePso::new(LeaderPolicy::CrowdingTournament, 8);
        let ctx = context();
        let species = RealSpecies::uniform(2, -1.0, 1.0).unwrap();
        let mut rng = SearchRandomGenerator::new_from_seed(Some(31));
        let swarm = vec![particle(&[0.0, 0.0], &[1.0, 1.0])];
        assert!(strategy.turbulence(&ctx, &swarm, &species, &mut rng).is_empty());
    }
}
