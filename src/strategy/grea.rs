//! GrEA: grid-based evolutionary selection for many objectives.
//!
//! Follows S. Yang, M. Li, X. Liu & J. Zheng, "A Grid-Based Evolutionary
//! Algorithm for Many-Objective Optimization", IEEE TEC 17(5), 2013. Each
//! objective axis is cut into K equal divisions over the current front's
//! (slightly widened) range; a solution's grid coordinates induce its grid
//! ranking GR (coordinate sum), grid coordinate-point distance GCPD and
//! grid crowding distance GCD. The overflowing front is consumed by a
//! layered findout-and-punish loop: the best (GR, GCD, GCPD) candidate is
//! taken, then cell mates, grid-dominated candidates and grid neighbours
//! of the winner are penalised so selection spreads across cells.

use ndarray::Array2;

use crate::fitness::{Extension, Fitness, GridFields};
use crate::random::RandomGenerator;
use crate::solution::{Solution, merged};
use crate::strategy::{StrategyContext, Strategy, binary_tournament, non_dominated_subset, oriented_matrix};
use crate::commands::PopulationSplitter;
use crate::comparator::FitnessComparator;

#[derive(Debug, Clone)]
pub struct GreaStrategy {
    divisions: usize,
}

/// Grid environment of one front: coordinates plus the derived measures.
struct FrontGrid {
    coordinates: Vec<Vec<i64>>,
    ranking: Vec<i64>,
    coordinate_distance: Vec<f64>,
}

impl GreaStrategy {
    pub fn new(divisions: usize) -> Self {
        assert!(divisions > 0, "grid divisions must be positive");
        Self { divisions }
    }

    /// Builds the grid over one front's oriented objective rows. The range
    /// is widened by half a cell on each side, as the algorithm prescribes.
    fn front_grid(&self, rows: &Array2<f64>) -> FrontGrid {
        let (n, m) = (rows.nrows(), rows.ncols());
        let k = self.divisions as f64;
        let mut lower = vec![0.0; m];
        let mut width = vec![0.0; m];
        for objective in 0..m {
            let column = rows.column(objective);
            let min = column.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = column.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let span = (max - min).max(1e-12);
            lower[objective] = min - span / (2.0 * k);
            width[objective] = (span + span / k) / k;
        }

        let mut coordinates = Vec::with_capacity(n);
        let mut ranking = Vec::with_capacity(n);
        let mut coordinate_distance = Vec::with_capacity(n);
        for row in rows.rows() {
            let mut cell = Vec::with_capacity(m);
            let mut gcpd = 0.0;
            for (objective, &value) in row.iter().enumerate() {
                let coordinate = (((value - lower[objective]) / width[objective]).floor() as i64)
                    .clamp(0, self.divisions as i64 - 1);
                let corner = lower[objective] + coordinate as f64 * width[objective];
                let gap = (value - corner) / width[objective];
                gcpd += gap * gap;
                cell.push(coordinate);
            }
            ranking.push(cell.iter().sum());
            coordinates.push(cell);
            coordinate_distance.push(gcpd.sqrt());
        }
        FrontGrid {
            coordinates,
            ranking,
            coordinate_distance,
        }
    }

    fn grid_difference(a: &[i64], b: &[i64]) -> i64 {
        a.iter().zip(b.iter()).map(|(&x, &y)| (x - y).abs()).sum()
    }

    fn grid_dominates(a: &[i64], b: &[i64]) -> bool {
        let mut strictly = false;
        for (&x, &y) in a.iter().zip(b.iter()) {
            if x > y {
                return false;
            }
            if x < y {
                strictly = true;
            }
        }
        strictly
    }

    /// Layered findout-and-punish selection of `needed` members out of one
    /// overflowing front. Returns positions into the front, and stamps the
    /// grid fields of every front member.
    fn grid_select<G: Clone>(
        &self,
        front: &mut [Solution<G>],
        rows: &Array2<f64>,
        needed: usize,
    ) -> Vec<usize> {
        let grid = self.front_grid(rows);
        let n = front.len();
        let m = rows.ncols() as i64;

        let mut adjusted: Vec<i64> = grid.ranking.clone();
        let mut crowding: Vec<f64> = vec![0.0; n];
        let mut penalty: Vec<i64> = vec![0; n];
        let mut pending: Vec<usize> = (0..n).collect();
        let mut picked: Vec<usize> = Vec::with_capacity(needed);

        while picked.len() < needed {
            let mut best = pending[0];
            for &candidate in pending.iter().skip(1) {
                let better = (adjusted[candidate], crowding[candidate], grid.coordinate_distance[candidate])
                    .partial_cmp(&(adjusted[best], crowding[best], grid.coordinate_distance[best]))
                    .map(|o| o == std::cmp::Ordering::Less)
                    .unwrap_or(false);
                if better {
                    best = candidate;
                }
            }
            pending.retain(|&p| p != best);
            picked.push(best);

            // Punishment: spread the next picks away from the winner's
            // neighbourhood.
            for &p in &pending {
                let difference =
                    Self::grid_difference(&grid.coordinates[best], &grid.coordinates[p]);
                if difference == 0 {
                    adjusted[p] += m + 2;
                } else if Self::grid_dominates(&grid.coordinates[best], &grid.coordinates[p]) {
                    adjusted[p] += m;
                } else if difference < m {
                    penalty[p] = penalty[p].max(m - difference);
                    adjusted[p] = adjusted[p].max(grid.ranking[p] + penalty[p]);
                    crowding[p] += (m - difference) as f64;
                }
            }
        }

        for (position, solution) in front.iter_mut().enumerate() {
            let fields = solution.fitness.grid_mut();
            fields.coordinates = grid.coordinates[position].clone();
            fields.ranking = adjusted[position];
            fields.coordinate_distance = grid.coordinate_distance[position];
            fields.crowding = crowding[position];
            fields.penalty = penalty[position];
        }
        picked
    }

    /// Stamps plain (unpunished) grid fields, used outside selection.
    fn stamp_fields<G: Clone>(&self, solutions: &mut [Solution<G>], rows: &Array2<f64>) {
        if solutions.is_empty() {
            return;
        }
        let grid = self.front_grid(rows);
        for (position, solution) in solutions.iter_mut().enumerate() {
            let fields = solution.fitness.grid_mut();
            fields.coordinates = grid.coordinates[position].clone();
            fields.ranking = grid.ranking[position];
            fields.coordinate_distance = grid.coordinate_distance[position];
            fields.crowding = 0.0;
            fields.penalty = 0;
        }
    }
}

impl<G: Clone> Strategy<G> for GreaStrategy {
    fn fitness_prototype(&self, num_objectives: usize) -> Fitness {
        Fitness::objectives(num_objectives)
            .with_extension(Extension::Grid(GridFields::default()))
    }

    fn initialize(
        &mut self,
        ctx: &StrategyContext,
        population: &mut Vec<Solution<G>>,
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let oriented = oriented_matrix(population, &ctx.senses);
        self.stamp_fields(population, &oriented);
        non_dominated_subset(ctx, population, &[])
    }

    fn mating_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        _archive: &[Solution<G>],
        rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let pareto = FitnessComparator::pareto(&ctx.senses);
        (0..2 * ctx.target_size)
            .map(|_| {
                binary_tournament(population, rng, |a, b| {
                    match pareto.compare(&a.fitness, &b.fitness) {
                        0 => {
                            // Incomparable: smaller grid ranking wins, then
                            // lower grid crowding.
                            let ga = a.fitness.grid();
                            let gb = b.fitness.grid();
                            if ga.ranking != gb.ranking {
                                if ga.ranking < gb.ranking { 1 } else { -1 }
                            } else if ga.crowding < gb.crowding {
                                1
                            } else if gb.crowding < ga.crowding {
                                -1
                            } else {
                                0
                            }
                        }
                        sign => sign,
                    }
                })
                .clone()
            })
            .collect()
    }

    fn environmental_selection(
        &mut self,
        ctx: &StrategyContext,
        population: &[Solution<G>],
        offspring: &[Solution<G>],
        _archive: &[Solution<G>],
        _rng: &mut impl RandomGenerator,
    ) -> Vec<Solution<G>> {
        let mut pool = merged(population, offspring);
        let oriented = oriented_matrix(&pool, &ctx.senses);
        self.stamp_fields(&mut pool, &oriented);

        let minimised = vec![false; ctx.num_objectives];
        let mut splitter = PopulationSplitter::new(oriented.clone(), &minimised);
        splitter
            .execute()
            .expect("non-empty pool cannot fail front splitting");

        let mut survivors: Vec<Solution<G>> = Vec::with_capacity(ctx.target_size);
        for front in splitter.fronts() {
            let remaining = ctx.target_size - survivors.len();
            if remaining == 0 {
                break;
            }
            if front.len() <= remaining {
                survivors.extend(front.iter().map(|&index| pool[index].clone()));
                continue;
            }
            let mut members: Vec<Solution<G>> =
                front.iter().map(|&index| pool[index].clone()).collect();
            let rows = oriented.select(ndarray::Axis(0), front);
            let picked = self.grid_select(&mut members, &rows, remaining);
            survivors.extend(picked.into_iter().map(|position| members[position].clone()));
            break;
        }
        survivors
    }
}
