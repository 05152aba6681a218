use mosa::commands::{
    CrowdingDistanceCalculator, DasDennisVectorGenerator, NonDominatedExtractor,
    ObjectiveScaler, PopulationSplitter, UniformVectorGenerator,
};
use mosa::comparator::{FitnessComparator, SolutionComparator};
use mosa::fitness::Fitness;
use ndarray::{Array1, array};

fn fitness(values: &[f64]) -> Fitness {
    let mut f = Fitness::objectives(values.len());
    f.set_objective_values(Array1::from(values.to_vec()));
    f
}

#[test]
fn extraction_on_the_seven_point_population() {
    // Maximising both objectives, (5,5) dominates everything else.
    let fitness = array![
        [5.0, 5.0],
        [1.0, 1.0],
        [3.0, 4.0],
        [2.0, 1.0],
        [1.0, 2.0],
        [4.0, 3.0],
        [0.0, 0.0],
    ];
    let mut extractor = NonDominatedExtractor::new(fitness, &[true, true]);
    extractor.execute().unwrap();
    assert_eq!(extractor.front(), &[0]);
}

#[test]
fn front_splitting_on_the_nine_point_population() {
    let fitness = array![
        [5.0, 5.0],
        [4.0, 6.0],
        [6.0, 4.0],
        [1.0, 1.0],
        [3.0, 4.0],
        [2.0, 1.0],
        [1.0, 2.0],
        [4.0, 3.0],
        [0.0, 0.0],
    ];
    let mut splitter = PopulationSplitter::new(fitness, &[true, true]);
    splitter.execute().unwrap();
    let sizes: Vec<usize> = splitter.fronts().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![3, 2, 2, 1, 1]);
}

#[test]
fn das_dennis_vector_counts() {
    let cases: [(usize, usize, Option<usize>, usize); 4] = [
        (3, 12, None, 91),
        (5, 6, None, 210),
        (3, 2, Some(1), 9),
        (8, 3, Some(2), 156),
    ];
    for (m, outer, inner, expected) in cases {
        let mut generator = DasDennisVectorGenerator::new(m, outer);
        if let Some(inner) = inner {
            generator = generator.with_inner_divisions(inner);
        }
        generator.execute().unwrap();
        assert_eq!(
            generator.vectors().nrows(),
            expected,
            "M={m}, p1={outer}, p2={inner:?}"
        );
        for row in generator.vectors().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }
}

#[test]
fn uniform_vector_counts() {
    for (m, h, expected) in [(2usize, 149usize, 150usize), (3, 25, 351), (4, 12, 455)] {
        let mut generator = UniformVectorGenerator::new(m, h);
        generator.execute().unwrap();
        assert_eq!(generator.vectors().nrows(), expected, "M={m}, H={h}");
    }
}

#[test]
fn crowding_on_a_front_with_duplicates() {
    let front = array![[0.0, 1.0], [0.5, 0.5], [1.0, 0.0], [0.5, 0.5]];
    let mut calculator =
        CrowdingDistanceCalculator::new(front, array![0.0, 0.0], array![1.0, 1.0]);
    calculator.execute().unwrap();
    let distances = calculator.distances();
    assert!(distances[0].is_infinite());
    assert!(distances[2].is_infinite());
    assert_eq!(distances[1], 1.0);
    assert_eq!(distances[3], 1.0);
}

#[test]
fn scaling_round_trip_restores_the_matrix() {
    let matrix = array![[1.5, -4.0], [2.5, 0.0], [3.0, 4.0]];
    let min = array![1.0, -5.0];
    let max = array![3.0, 5.0];

    let mut scaler = ObjectiveScaler::new(matrix.clone(), min.clone(), max.clone());
    scaler.execute().unwrap();
    let mut back = ObjectiveScaler::new(scaler.scaled().clone(), min, max).inverse();
    back.execute().unwrap();

    for (restored, original) in back.scaled().iter().zip(matrix.iter()) {
        assert!((restored - original).abs() < 1e-12);
    }
}

#[test]
fn constrained_comparison_scenarios() {
    let pareto = FitnessComparator::pareto(&[false, false]);

    // Two infeasibles with degrees 1 and 2: the degree-aware variant
    // prefers the smaller degree.
    let mut degree_one = fitness(&[0.0, 0.0]);
    let mut degree_two = fitness(&[0.0, 0.0]);
    degree_one.set_violation(1.0);
    degree_two.set_violation(2.0);
    let by_violation = SolutionComparator::ConstrainedByViolation(pareto.clone());
    assert_eq!(by_violation.compare(&degree_one, &degree_two), 1);

    // Equal degrees under the plain variant: equivalent.
    let mut a = fitness(&[1.0, 1.0]);
    let mut b = fitness(&[9.0, 9.0]);
    a.set_violation(3.0);
    b.set_violation(3.0);
    let plain = SolutionComparator::Constrained(pareto);
    assert_eq!(plain.compare(&a, &b), 0);
    assert_eq!(plain.compare(&b, &a), 0);
}

#[test]
fn pareto_comparator_is_consistent_over_a_pool() {
    let cmp = FitnessComparator::pareto(&[true, true]);
    let pool: Vec<Fitness> = [
        [5.0, 5.0],
        [1.0, 1.0],
        [3.0, 4.0],
        [2.0, 1.0],
        [1.0, 2.0],
        [4.0, 3.0],
        [0.0, 0.0],
    ]
    .iter()
    .map(|v| fitness(v))
    .collect();

    for a in &pool {
        for b in &pool {
            assert_eq!(
                cmp.compare(a, b) + cmp.compare(b, a),
                0,
                "dominance verdicts must be antisymmetric"
            );
        }
    }
}
