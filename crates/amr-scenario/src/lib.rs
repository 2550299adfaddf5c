//! The scenario generator, grounded in the original
//! `sim/world.py`: deterministic draw order from a seeded PRNG, plus a SHA-256
//! content hash over the canonical JSON of the generated fleet.

use amr_core::{CoreError, CoreResult, JobId, RobotId, SimRng};
use amr_entities::{Job, Robot, ScaleMap};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub struct GenerateParams {
    pub seed: u64,
    pub scale: String,
    pub world_size: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub robots_override: Option<u32>,
    pub jobs_override: Option<u32>,
}

pub struct Scenario {
    pub robots: Vec<Robot>,
    pub jobs: Vec<Job>,
    pub scenario_hash: String,
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

pub fn generate(params: &GenerateParams) -> CoreResult<Scenario> {
    let scale_map = ScaleMap::new().with_overrides(params.robots_override, params.jobs_override)?;
    let counts = scale_map.get(&params.scale)?;

    if params.world_size <= 0.0 {
        return Err(CoreError::Validation("world_size must be positive".into()));
    }

    let mut rng = SimRng::new(params.seed);

    let mut robots = Vec::with_capacity(counts.robots as usize);
    for i in 1..=counts.robots {
        let x = round3(rng.uniform_real(0.0, params.world_size));
        let y = round3(rng.uniform_real(0.0, params.world_size));
        let speed = round3(rng.uniform_real(params.speed_min, params.speed_max));
        robots.push(Robot::new(RobotId(i), x, y, speed));
    }

    let mut jobs = Vec::with_capacity(counts.jobs as usize);
    for j in 1..=counts.jobs {
        let pickup_x = round3(rng.uniform_real(0.0, params.world_size));
        let pickup_y = round3(rng.uniform_real(0.0, params.world_size));
        let dropoff_x = round3(rng.uniform_real(0.0, params.world_size));
        let dropoff_y = round3(rng.uniform_real(0.0, params.world_size));
        let deadline_ts = 120 + 12 * j as i64 + rng.randint_inclusive(0, 20);
        let priority = rng.randint_inclusive(1, 5) as u8;

        jobs.push(Job::new(
            JobId::from(format!("job_{j}")),
            (pickup_x, pickup_y),
            (dropoff_x, dropoff_y),
            deadline_ts,
            priority,
        ));
    }

    let scenario_hash = compute_scenario_hash(params.seed, &params.scale, &robots, &jobs);

    Ok(Scenario {
        robots,
        jobs,
        scenario_hash,
    })
}

#[derive(Serialize)]
struct JobHashView<'a> {
    id: &'a str,
    pickup_x: f64,
    pickup_y: f64,
    dropoff_x: f64,
    dropoff_y: f64,
    deadline_ts: i64,
    priority: u8,
}

#[derive(Serialize)]
struct HashPayload<'a> {
    seed: u64,
    scale: &'a str,
    robots: &'a [Robot],
    jobs: Vec<JobHashView<'a>>,
}

/// SHA-256 of the canonical (sorted-key, compact-separator) JSON encoding of
/// `{seed, scale, robots, jobs}`. `serde_json::Value`/`Map`
/// without the `preserve_order` feature already sorts keys, and `to_string` is
/// already compact, so serializing through `serde_json::Value` gives the canonical
/// form for free.
fn compute_scenario_hash(seed: u64, scale: &str, robots: &[Robot], jobs: &[Job]) -> String {
    let job_views: Vec<JobHashView> = jobs
        .iter()
        .map(|j| JobHashView {
            id: j.id.as_str(),
            pickup_x: j.pickup.0,
            pickup_y: j.pickup.1,
            dropoff_x: j.dropoff.0,
            dropoff_y: j.dropoff.1,
            deadline_ts: j.deadline_ts,
            priority: j.priority,
        })
        .collect();

    let payload = HashPayload {
        seed,
        scale,
        robots,
        jobs: job_views,
    };

    let value = serde_json::to_value(&payload).expect("scenario payload is always serializable");
    let canonical = serde_json::to_string(&value).expect("Value serialization cannot fail");

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(seed: u64, scale: &str) -> GenerateParams {
        GenerateParams {
            seed,
            scale: scale.to_string(),
            world_size: 100.0,
            speed_min: 1.0,
            speed_max: 2.0,
            robots_override: None,
            jobs_override: None,
        }
    }

    #[test]
    fn test_scale_counts_match_preset() {
        let scenario = generate(&params(42, "small")).unwrap();
        assert_eq!(scenario.robots.len(), 5);
        assert_eq!(scenario.jobs.len(), 25);
    }

    #[test]
    fn test_unknown_scale_rejected() {
        assert!(generate(&params(42, "huge")).is_err());
    }

    #[test]
    fn test_determinism_same_seed_same_scenario_hash() {
        let a = generate(&params(42, "mini")).unwrap();
        let b = generate(&params(42, "mini")).unwrap();
        assert_eq!(a.scenario_hash, b.scenario_hash);
        assert_eq!(a.robots[0].x, b.robots[0].x);
        assert_eq!(a.jobs[0].deadline_ts, b.jobs[0].deadline_ts);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(&params(1, "mini")).unwrap();
        let b = generate(&params(2, "mini")).unwrap();
        assert_ne!(a.scenario_hash, b.scenario_hash);
    }

    #[test]
    fn test_generated_values_within_world_bounds() {
        let scenario = generate(&params(7, "demo")).unwrap();
        for r in &scenario.robots {
            assert!(r.x >= 0.0 && r.x <= 100.0);
            assert!(r.y >= 0.0 && r.y <= 100.0);
            assert!(r.speed >= 1.0 && r.speed <= 2.0);
            assert_eq!(r.battery, 100.0);
        }
        for j in &scenario.jobs {
            assert!(j.priority >= 1 && j.priority <= 5);
            assert!(j.deadline_ts >= 120);
        }
    }

    #[test]
    fn test_joint_override_changes_counts() {
        let mut p = params(42, "demo");
        p.robots_override = Some(3);
        p.jobs_override = Some(4);
        let scenario = generate(&p).unwrap();
        assert_eq!(scenario.robots.len(), 3);
        assert_eq!(scenario.jobs.len(), 4);
    }

    #[test]
    fn test_lone_override_rejected() {
        let mut p = params(42, "demo");
        p.robots_override = Some(3);
        assert!(generate(&p).is_err());
    }
}
