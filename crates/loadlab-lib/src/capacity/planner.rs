//! Resource projection, scaling strategy, and growth-plan expansion.

use super::{
    ArchitecturalAlternative, CapacityModel, CapacityPlan, CostModel, GrowthScenario, Milestone,
    ResourceRequirements, ScalingProjection, ScalingStrategy,
};
use crate::benchmark::BenchmarkSuite;
use crate::error::LabError;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::{debug, info};

/// Reference instance shape used for sizing and cost: 4 vCPU / 16 GB.
pub const REFERENCE_INSTANCE_TYPE: &str = "standard-4x16";
const REFERENCE_CPU_CORES: f64 = 4.0;
const REFERENCE_MEMORY_GB: f64 = 16.0;
const HOURS_PER_MONTH: f64 = 720.0;
const PLAN_MONTHS: usize = 12;

/// Capacity planner over a calibratable resource model and a cost model.
#[derive(Debug, Clone, Default)]
pub struct CapacityPlanner {
    model: CapacityModel,
    costs: CostModel,
}

impl CapacityPlanner {
    pub fn new(model: CapacityModel, costs: CostModel) -> Self {
        Self { model, costs }
    }

    pub fn model(&self) -> &CapacityModel {
        &self.model
    }

    pub fn costs_mut(&mut self) -> &mut CostModel {
        &mut self.costs
    }

    /// Project resources, instances, cost, and strategy for a target user
    /// count. Pure with respect to planner state: identical inputs and
    /// model state yield identical output.
    pub fn project(&self, target_users: u64, current_users: u64) -> ScalingProjection {
        let resources = self.required_resources(target_users);
        let required_instances = self.required_instances(&resources);
        let estimated_monthly_cost = self.monthly_cost(required_instances, resources.storage_gb);

        let ratio = if current_users == 0 {
            f64::INFINITY
        } else {
            target_users as f64 / current_users as f64
        };
        let strategy = strategy_for_ratio(ratio);
        let timeline = timeline_for_ratio(ratio);
        let risks = risks_for(target_users, strategy);
        let recommendations = recommendations_for(target_users, strategy);

        debug!(
            target_users,
            current_users,
            required_instances,
            strategy = ?strategy,
            estimated_monthly_cost,
            "Built scaling projection"
        );

        ScalingProjection {
            target_users,
            current_users,
            resources,
            required_instances,
            estimated_monthly_cost,
            strategy,
            timeline,
            risks,
            recommendations,
        }
    }

    /// Expand a growth scenario into a 12-month capacity plan.
    pub fn plan(
        &self,
        scenario: &GrowthScenario,
        current_users: u64,
    ) -> Result<CapacityPlan, LabError> {
        scenario.validate()?;

        let started = Utc::now();
        let mut users = current_users as f64;
        let mut monthly_projections = Vec::with_capacity(PLAN_MONTHS);
        let mut milestones = Vec::new();
        let mut previous_instances = 0u32;

        for month in 0..PLAN_MONTHS {
            users *= 1.0 + scenario.monthly_growth_rate;
            let peak_users =
                (users * scenario.seasonal_factors[month] * scenario.peak_multiplier).ceil() as u64;

            let projection = self.project(peak_users, current_users);
            if projection.required_instances > previous_instances {
                milestones.push(Milestone {
                    date: started + ChronoDuration::days(30 * (month as i64 + 1)),
                    projected_users: peak_users,
                    action: format!(
                        "Scale from {} to {} instances",
                        previous_instances, projection.required_instances
                    ),
                    estimated_monthly_cost: projection.estimated_monthly_cost,
                });
            }
            previous_instances = projection.required_instances;
            monthly_projections.push(projection);
        }

        let total_annual_cost = round_cents(
            monthly_projections
                .iter()
                .map(|p| p.estimated_monthly_cost)
                .sum(),
        );
        let final_users = monthly_projections
            .last()
            .map(|p| p.target_users)
            .unwrap_or(current_users);

        info!(
            scenario = %scenario.name,
            current_users,
            final_users,
            total_annual_cost,
            milestones = milestones.len(),
            "Expanded growth scenario into capacity plan"
        );

        Ok(CapacityPlan {
            id: format!("plan-{}", Utc::now().timestamp_millis()),
            scenario: scenario.clone(),
            monthly_projections,
            total_annual_cost,
            technical_risks: plan_technical_risks(final_users),
            business_risks: plan_business_risks(scenario),
            mitigations: plan_mitigations(final_users),
            milestones,
            alternatives: plan_alternatives(final_users),
        })
    }

    /// Recalibrate per-user memory and CPU scaling factors from observed
    /// benchmark history. No-op when the history carries no usable suite.
    pub fn calibrate(&mut self, history: &[BenchmarkSuite]) {
        let Some((peak_mem_mb, peak_cpu_pct, user_limit)) =
            history.iter().rev().find_map(|suite| {
                let mem = suite.metric("peak_memory_mb")?.value;
                let cpu = suite.metric("peak_cpu_percent")?.value;
                let limit = suite.metric("breaking_point_actors")?.value;
                (limit > 0.0).then_some((mem, cpu, limit))
            })
        else {
            return;
        };

        self.model.per_user.memory_gb = peak_mem_mb / 1024.0 / user_limit;
        self.model.per_user.cpu_cores = peak_cpu_pct / 100.0 * REFERENCE_CPU_CORES / user_limit;

        info!(
            memory_gb_per_user = self.model.per_user.memory_gb,
            cpu_cores_per_user = self.model.per_user.cpu_cores,
            observed_user_limit = user_limit,
            "Calibrated capacity model from benchmark history"
        );
    }

    fn required_resources(&self, target_users: u64) -> ResourceRequirements {
        let overhead =
            (1.0 + self.model.system_overhead) * self.model.redundancy_factor * (1.0 + self.model.peak_buffer);
        let users = target_users as f64;
        let scaled = |base: f64, per_user: f64| ((base + users * per_user) * overhead).ceil();
        ResourceRequirements {
            cpu_cores: scaled(self.model.baseline.cpu_cores, self.model.per_user.cpu_cores),
            memory_gb: scaled(self.model.baseline.memory_gb, self.model.per_user.memory_gb),
            storage_gb: scaled(self.model.baseline.storage_gb, self.model.per_user.storage_gb),
            network_mbps: scaled(
                self.model.baseline.network_mbps,
                self.model.per_user.network_mbps,
            ),
        }
    }

    fn required_instances(&self, resources: &ResourceRequirements) -> u32 {
        let by_cpu = (resources.cpu_cores / REFERENCE_CPU_CORES).ceil() as u32;
        let by_memory = (resources.memory_gb / REFERENCE_MEMORY_GB).ceil() as u32;
        by_cpu.max(by_memory).max(1)
    }

    fn monthly_cost(&self, instances: u32, storage_gb: f64) -> f64 {
        let hourly = self
            .costs
            .instance_hourly
            .get(REFERENCE_INSTANCE_TYPE)
            .copied()
            .unwrap_or(0.0);
        let storage_rate = self
            .costs
            .storage_monthly_per_gb
            .get("ssd")
            .copied()
            .unwrap_or(0.0);
        let services: f64 = self.costs.additional_services.values().sum();
        round_cents(instances as f64 * hourly * HOURS_PER_MONTH + storage_gb * storage_rate + services)
    }
}

fn strategy_for_ratio(ratio: f64) -> ScalingStrategy {
    if ratio <= 2.0 {
        ScalingStrategy::Vertical
    } else if ratio <= 5.0 {
        ScalingStrategy::Hybrid
    } else {
        ScalingStrategy::Horizontal
    }
}

fn timeline_for_ratio(ratio: f64) -> String {
    let timeline = if ratio <= 1.5 {
        "1-2 weeks"
    } else if ratio <= 3.0 {
        "3-4 weeks"
    } else if ratio <= 5.0 {
        "1-2 months"
    } else {
        "2-3 months"
    };
    timeline.to_string()
}

fn risks_for(target_users: u64, strategy: ScalingStrategy) -> Vec<String> {
    let mut risks = Vec::new();
    if target_users > 1_000 {
        risks.push("Database connections may become a bottleneck".to_string());
    }
    if target_users > 5_000 {
        risks.push("Single-region deployment limits further scaling; sharding likely required".to_string());
    }
    if strategy == ScalingStrategy::Horizontal {
        risks.push("Horizontal scaling adds load-balancer and state-distribution complexity".to_string());
    }
    risks
}

fn recommendations_for(target_users: u64, strategy: ScalingStrategy) -> Vec<String> {
    let mut recs = Vec::new();
    match strategy {
        ScalingStrategy::Vertical => {
            recs.push("Upgrade existing instances to a larger shape".to_string());
        }
        ScalingStrategy::Hybrid => {
            recs.push("Combine larger instances with additional replicas behind a load balancer".to_string());
        }
        ScalingStrategy::Horizontal => {
            recs.push("Add instances behind a load balancer and externalize session state".to_string());
        }
    }
    if target_users > 1_000 {
        recs.push("Introduce connection pooling and read replicas for the database".to_string());
    }
    if target_users > 5_000 {
        recs.push("Evaluate data sharding and multi-region deployment".to_string());
    }
    recs
}

fn plan_technical_risks(final_users: u64) -> Vec<String> {
    let mut risks = vec!["Projected growth assumes per-user resource cost stays linear".to_string()];
    risks.extend(risks_for(final_users, strategy_for_ratio(f64::INFINITY)));
    risks
}

fn plan_business_risks(scenario: &GrowthScenario) -> Vec<String> {
    let mut risks = Vec::new();
    if scenario.monthly_growth_rate > 0.15 {
        risks.push("Aggressive growth assumptions may overshoot actual demand".to_string());
    }
    if scenario.peak_multiplier > 2.0 {
        risks.push("High peak multiplier means most provisioned capacity sits idle off-peak".to_string());
    }
    if risks.is_empty() {
        risks.push("Underestimating seasonal peaks would degrade user experience".to_string());
    }
    risks
}

fn plan_mitigations(final_users: u64) -> Vec<String> {
    let mut mitigations = vec![
        "Re-run load tests quarterly and recalibrate the capacity model".to_string(),
        "Automate scale-out triggers from observed utilization".to_string(),
    ];
    if final_users > 1_000 {
        mitigations.push("Stage database capacity upgrades ahead of projected milestones".to_string());
    }
    mitigations
}

fn plan_alternatives(final_users: u64) -> Vec<ArchitecturalAlternative> {
    let mut alternatives = vec![ArchitecturalAlternative {
        name: "Autoscaling groups with smaller instances".to_string(),
        cost_delta: -0.15,
        tradeoffs: "Lower steady-state cost; slower response to sudden spikes".to_string(),
    }];
    if final_users > 1_000 {
        alternatives.push(ArchitecturalAlternative {
            name: "Managed serverless task processing".to_string(),
            cost_delta: 0.10,
            tradeoffs: "Removes instance management; per-request pricing dominates at sustained load"
                .to_string(),
        });
    }
    alternatives
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::benchmark::{BenchmarkMetric, MetricStatus, Trend};

    fn planner() -> CapacityPlanner {
        CapacityPlanner::default()
    }

    #[test]
    fn test_projection_is_idempotent() {
        let planner = planner();
        let a = planner.project(500, 100);
        let b = planner.project(500, 100);
        assert_eq!(a.resources, b.resources);
        assert_eq!(a.required_instances, b.required_instances);
        assert_eq!(a.estimated_monthly_cost, b.estimated_monthly_cost);
        assert_eq!(a.strategy, b.strategy);
    }

    #[test]
    fn test_strategy_thresholds() {
        let planner = planner();
        assert_eq!(planner.project(150, 100).strategy, ScalingStrategy::Vertical);
        assert_eq!(planner.project(400, 100).strategy, ScalingStrategy::Hybrid);
        assert_eq!(
            planner.project(1_000, 100).strategy,
            ScalingStrategy::Horizontal
        );
    }

    #[test]
    fn test_timeline_thresholds() {
        let planner = planner();
        assert_eq!(planner.project(150, 100).timeline, "1-2 weeks");
        assert_eq!(planner.project(300, 100).timeline, "3-4 weeks");
        assert_eq!(planner.project(400, 100).timeline, "1-2 months");
        assert_eq!(planner.project(1_000, 100).timeline, "2-3 months");
    }

    #[test]
    fn test_resource_formula_rounds_up_per_dimension() {
        let planner = planner();
        let projection = planner.project(100, 100);
        // (4 + 100*0.01) * 1.2 * 1.5 * 1.3 = 11.7 -> 12 cores
        assert_eq!(projection.resources.cpu_cores, 12.0);
        // (8 + 100*0.05) * 2.34 = 30.42 -> 31 GB
        assert_eq!(projection.resources.memory_gb, 31.0);
        // instances = max(ceil(12/4), ceil(31/16)) = 3
        assert_eq!(projection.required_instances, 3);
    }

    #[test]
    fn test_cost_is_rounded_to_cents() {
        let planner = planner();
        let projection = planner.project(100, 100);
        let cents = projection.estimated_monthly_cost * 100.0;
        assert!((cents - cents.round()).abs() < 1e-9);
        assert!(projection.estimated_monthly_cost > 0.0);
    }

    #[test]
    fn test_zero_current_users_does_not_panic() {
        let planner = planner();
        let projection = planner.project(500, 0);
        assert_eq!(projection.strategy, ScalingStrategy::Horizontal);
        assert_eq!(projection.timeline, "2-3 months");
    }

    #[test]
    fn test_large_targets_accumulate_risks() {
        let planner = planner();
        let projection = planner.project(10_000, 100);
        assert!(projection.risks.iter().any(|r| r.contains("Database")));
        assert!(projection.risks.iter().any(|r| r.contains("sharding")));
    }

    #[test]
    fn test_flat_growth_plan_users_strictly_increase() {
        let planner = planner();
        let scenario = GrowthScenario::flat("steady", 0.10, 1.2);
        let plan = planner.plan(&scenario, 200).expect("valid scenario");
        assert_eq!(plan.monthly_projections.len(), 12);
        for pair in plan.monthly_projections.windows(2) {
            assert!(pair[1].target_users > pair[0].target_users);
        }
        assert!(plan.total_annual_cost > 0.0);
    }

    #[test]
    fn test_plan_milestones_mark_instance_increases() {
        let planner = planner();
        let scenario = GrowthScenario::flat("rapid", 0.25, 1.5);
        let plan = planner.plan(&scenario, 500).expect("valid scenario");
        // First month always scales up from zero instances.
        assert!(!plan.milestones.is_empty());
        for milestone in &plan.milestones {
            assert!(milestone.action.starts_with("Scale from"));
        }
    }

    #[test]
    fn test_plan_rejects_invalid_scenario() {
        let planner = planner();
        let mut scenario = GrowthScenario::flat("bad", 0.1, 1.0);
        scenario.seasonal_factors[0] = -1.0;
        assert!(planner.plan(&scenario, 100).is_err());
    }

    fn suite_with(metrics: Vec<BenchmarkMetric>) -> BenchmarkSuite {
        BenchmarkSuite {
            id: "bench-test".to_string(),
            name: "calibration".to_string(),
            timestamp: Utc::now(),
            version: "1.0.0".to_string(),
            environment: "test".to_string(),
            metrics,
            overall_score: 90.0,
            previous_score: None,
        }
    }

    fn metric(name: &str, value: f64) -> BenchmarkMetric {
        BenchmarkMetric {
            name: name.to_string(),
            value,
            unit: String::new(),
            threshold: 0.0,
            status: MetricStatus::Pass,
            trend: Trend::Stable,
        }
    }

    #[test]
    fn test_calibrate_overwrites_per_user_factors() {
        let mut planner = planner();
        let suite = suite_with(vec![
            metric("peak_memory_mb", 2_048.0),
            metric("peak_cpu_percent", 50.0),
            metric("breaking_point_actors", 400.0),
        ]);
        planner.calibrate(&[suite]);
        assert!((planner.model().per_user.memory_gb - 2.0 / 400.0).abs() < 1e-12);
        assert!((planner.model().per_user.cpu_cores - 2.0 / 400.0).abs() < 1e-12);
    }

    #[test]
    fn test_calibrate_is_noop_without_usable_history() {
        let mut planner = planner();
        let before = planner.model().per_user.clone();
        planner.calibrate(&[]);
        planner.calibrate(&[suite_with(vec![metric("peak_memory_mb", 1_000.0)])]);
        assert_eq!(planner.model().per_user, before);
    }
}
