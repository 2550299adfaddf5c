//! The GA optimization loop, grounded in the original
//! `ga/optimizer.py`. Deterministic: identical inputs and seed produce byte-identical
//! output.

use crate::operators::{crossover, initialize_population, mutate, tournament_select, Chromosome};
use amr_core::{JobId, RobotId, SimRng};
use amr_entities::{sort_key, Job, Robot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub job_id: JobId,
    pub robot_id: RobotId,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeMeta {
    pub best_score: f64,
    pub generations: u32,
    pub population_size: u32,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct GaParams {
    pub population_size: usize,
    pub generations: u32,
    pub elite_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    pub service_time_s: f64,
}

pub fn optimize(
    robots: &[Robot],
    jobs: &[Job],
    seed: u64,
    params: &GaParams,
) -> (Vec<Assignment>, OptimizeMeta) {
    let meta_skeleton = |best_score: f64| OptimizeMeta {
        best_score,
        generations: params.generations,
        population_size: params.population_size as u32,
        seed,
    };

    if jobs.is_empty() {
        return (Vec::new(), meta_skeleton(0.0));
    }
    if robots.is_empty() {
        return (Vec::new(), meta_skeleton(1.0e9));
    }

    let mut sorted_robots: Vec<&Robot> = robots.iter().collect();
    sorted_robots.sort_by(|a, b| a.id.cmp(&b.id));
    let mut sorted_jobs: Vec<&Job> = jobs.iter().collect();
    sorted_jobs.sort_by_key(|j| sort_key(j));

    let robot_count = sorted_robots.len();
    let chromosome_len = sorted_jobs.len();

    let mut rng = SimRng::new(seed);
    let mut population = initialize_population(params.population_size, chromosome_len, robot_count, &mut rng);

    let mut best_chromosome: Option<Chromosome> = None;
    let mut best_score = f64::INFINITY;

    for _generation in 0..params.generations {
        let scores: Vec<f64> = population
            .iter()
            .map(|c| amr_fitness::evaluate(c, robots, jobs, params.service_time_s).total_score)
            .collect();

        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| {
            scores[a]
                .partial_cmp(&scores[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });

        if scores[order[0]] < best_score {
            best_score = scores[order[0]];
            best_chromosome = Some(population[order[0]].clone());
        }

        let elite_count = params.elite_size.min(population.len());
        let mut next_population: Vec<Chromosome> =
            order[..elite_count].iter().map(|&i| population[i].clone()).collect();

        while next_population.len() < params.population_size {
            let pa = tournament_select(&scores, &mut rng, 3);
            let pb = tournament_select(&scores, &mut rng, 3);
            let (mut child_a, mut child_b) = if rng.gen_bool(params.crossover_rate) {
                crossover(&population[pa], &population[pb], &mut rng)
            } else {
                (population[pa].clone(), population[pb].clone())
            };
            mutate(&mut child_a, robot_count, params.mutation_rate, &mut rng);
            next_population.push(child_a);
            if next_population.len() < params.population_size {
                mutate(&mut child_b, robot_count, params.mutation_rate, &mut rng);
                next_population.push(child_b);
            }
        }

        population = next_population;
    }

    let best = best_chromosome.unwrap_or_else(|| population[0].clone());
    let result = amr_fitness::evaluate(&best, robots, jobs, params.service_time_s);

    let mut assignments: Vec<Assignment> = sorted_jobs
        .iter()
        .enumerate()
        .map(|(k, job)| {
            let gene = best.get(k).copied().unwrap_or(0);
            let robot_id = sorted_robots[gene % robot_count].id;
            let score = *result.per_job_scores.get(&job.id).unwrap_or(&0.0);
            Assignment {
                job_id: job.id.clone(),
                robot_id,
                score,
            }
        })
        .collect();

    assignments.sort_by(|a, b| a.job_id.cmp(&b.job_id).then(a.robot_id.cmp(&b.robot_id)));

    (assignments, meta_skeleton(result.total_score))
}
