//! Built-in load, stress, and growth configurations.

use loadlab_lib::backend::TaskTypeDistribution;
use loadlab_lib::capacity::GrowthScenario;
use loadlab_lib::loadtest::{LoadTestConfig, Thresholds};
use loadlab_lib::stress::{StressScenario, StressSuite};

/// Which built-in plan to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// Short run with small actor counts, for smoke-testing the pipeline
    Quick,
    /// Full run with the complete stress ladder
    Full,
}

fn load_config(actors: usize, duration_ms: u64, seed: u64) -> LoadTestConfig {
    LoadTestConfig {
        concurrent_actors: actors,
        test_duration_ms: duration_ms,
        tasks_per_actor: 5,
        task_distribution: TaskTypeDistribution::default(),
        thresholds: Thresholds::default(),
        ramp_up_ms: duration_ms / 6,
        ramp_down_ms: duration_ms / 12,
        seed,
    }
}

fn scenario(
    name: &str,
    description: &str,
    actors: usize,
    duration_ms: u64,
    seed: u64,
    expected_failure_threshold: f64,
) -> StressScenario {
    StressScenario {
        name: name.to_string(),
        description: description.to_string(),
        config: load_config(actors, duration_ms, seed),
        expected_failure_threshold,
    }
}

/// Standalone load tests run before the stress suite.
pub fn load_configs(profile: Profile, seed: u64) -> Vec<LoadTestConfig> {
    match profile {
        Profile::Quick => vec![
            load_config(10, 3_000, seed),
            load_config(25, 3_000, seed + 1),
        ],
        Profile::Full => vec![
            load_config(50, 30_000, seed),
            load_config(100, 30_000, seed + 1),
            load_config(200, 30_000, seed + 2),
        ],
    }
}

/// The stress ladder: increasing actor counts, ending past the expected limit.
pub fn stress_suite(profile: Profile, seed: u64) -> StressSuite {
    let scenarios = match profile {
        Profile::Quick => vec![
            scenario("baseline", "nominal load", 10, 2_000, seed + 10, 0.02),
            scenario("moderate", "double nominal", 20, 2_000, seed + 11, 0.05),
            scenario("heavy", "sustained heavy load", 40, 2_000, seed + 12, 0.10),
        ],
        Profile::Full => vec![
            scenario("baseline", "nominal load", 50, 20_000, seed + 10, 0.02),
            scenario("moderate", "double nominal", 100, 20_000, seed + 11, 0.05),
            scenario("heavy", "sustained heavy load", 250, 20_000, seed + 12, 0.10),
            scenario("breaking", "past the expected limit", 500, 20_000, seed + 13, 0.25),
        ],
    };
    StressSuite {
        name: format!("{:?}-stress", profile).to_lowercase(),
        scenarios,
        max_concurrent_tests: 2,
    }
}

/// Growth scenarios expanded into capacity plans.
pub fn growth_scenarios() -> Vec<GrowthScenario> {
    let mut conservative = GrowthScenario::flat("conservative", 0.05, 1.3);
    conservative.description = "5% monthly growth, mild holiday peak".to_string();
    conservative.seasonal_factors[10] = 1.2;
    conservative.seasonal_factors[11] = 1.4;

    let mut aggressive = GrowthScenario::flat("aggressive", 0.20, 1.5);
    aggressive.description = "20% monthly growth after a marketing push".to_string();

    vec![conservative, aggressive]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_ladder_is_ascending() {
        for profile in [Profile::Quick, Profile::Full] {
            let suite = stress_suite(profile, 1);
            let counts: Vec<usize> = suite
                .scenarios
                .iter()
                .map(|s| s.config.concurrent_actors)
                .collect();
            let mut sorted = counts.clone();
            sorted.sort_unstable();
            assert_eq!(counts, sorted);
        }
    }

    #[test]
    fn test_growth_scenarios_validate() {
        for scenario in growth_scenarios() {
            assert!(scenario.validate().is_ok());
        }
    }
}
