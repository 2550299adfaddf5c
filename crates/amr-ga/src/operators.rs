//! Genetic operators: population init, tournament selection, one-point crossover,
//! point mutation.

use amr_core::SimRng;

pub type Chromosome = Vec<usize>;

pub fn initialize_population(
    population_size: usize,
    chromosome_len: usize,
    robot_count: usize,
    rng: &mut SimRng,
) -> Vec<Chromosome> {
    (0..population_size)
        .map(|_| (0..chromosome_len).map(|_| rng.randrange(robot_count)).collect())
        .collect()
}

/// Selects the best (lowest score) of `k` randomly drawn indices.
pub fn tournament_select(fitnesses: &[f64], rng: &mut SimRng, k: usize) -> usize {
    let mut best = rng.randrange(fitnesses.len());
    for _ in 1..k {
        let candidate = rng.randrange(fitnesses.len());
        if fitnesses[candidate] < fitnesses[best]
            || (fitnesses[candidate] == fitnesses[best] && candidate < best)
        {
            best = candidate;
        }
    }
    best
}

/// One-point crossover. Chromosomes of length <= 1 are returned unchanged (no valid
/// crossover point exists).
pub fn crossover(a: &Chromosome, b: &Chromosome, rng: &mut SimRng) -> (Chromosome, Chromosome) {
    let len = a.len();
    if len <= 1 {
        return (a.clone(), b.clone());
    }
    let point = 1 + rng.randrange(len - 1);
    let mut child_a = a[..point].to_vec();
    child_a.extend_from_slice(&b[point..]);
    let mut child_b = b[..point].to_vec();
    child_b.extend_from_slice(&a[point..]);
    (child_a, child_b)
}

pub fn mutate(chromosome: &mut Chromosome, robot_count: usize, mutation_rate: f64, rng: &mut SimRng) {
    for gene in chromosome.iter_mut() {
        if rng.gen_f64() < mutation_rate {
            *gene = rng.randrange(robot_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_population_shape_and_bounds() {
        let mut rng = SimRng::new(1);
        let pop = initialize_population(4, 6, 3, &mut rng);
        assert_eq!(pop.len(), 4);
        for chromo in &pop {
            assert_eq!(chromo.len(), 6);
            assert!(chromo.iter().all(|&g| g < 3));
        }
    }

    #[test]
    fn test_tournament_select_prefers_lower_fitness() {
        let mut rng = SimRng::new(2);
        let fitnesses = vec![100.0, 1.0, 50.0, 200.0];
        // Run many trials; the champion (index 1) should win more often than it loses.
        let wins: usize = (0..200)
            .filter(|_| tournament_select(&fitnesses, &mut rng, 3) == 1)
            .count();
        assert!(wins > 0);
    }

    #[test]
    fn test_crossover_single_gene_chromosome_unchanged() {
        let mut rng = SimRng::new(3);
        let a = vec![1];
        let b = vec![2];
        let (ca, cb) = crossover(&a, &b, &mut rng);
        assert_eq!(ca, a);
        assert_eq!(cb, b);
    }

    #[test]
    fn test_crossover_preserves_length_and_swaps_tail() {
        let mut rng = SimRng::new(4);
        let a = vec![0, 0, 0, 0];
        let b = vec![1, 1, 1, 1];
        let (ca, cb) = crossover(&a, &b, &mut rng);
        assert_eq!(ca.len(), 4);
        assert_eq!(cb.len(), 4);
        assert_ne!(ca, a);
    }

    #[test]
    fn test_mutate_zero_rate_is_noop() {
        let mut rng = SimRng::new(5);
        let mut chromo = vec![0, 1, 2, 0];
        let before = chromo.clone();
        mutate(&mut chromo, 3, 0.0, &mut rng);
        assert_eq!(chromo, before);
    }
}
