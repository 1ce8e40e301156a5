//! Capacity planning
//!
//! A calibratable resource/cost model that turns target user counts into
//! resource, instance, and cost projections, and expands growth scenarios
//! into 12-month capacity plans with milestones, risks, and alternatives.

mod planner;

pub use planner::{CapacityPlanner, REFERENCE_INSTANCE_TYPE};

use crate::error::LabError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-dimension resource requirements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub cpu_cores: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub network_mbps: f64,
}

/// Calibratable model of resource needs as a function of user count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityModel {
    pub baseline_users: u64,
    pub baseline: ResourceRequirements,
    /// Per-user scaling factor per resource dimension.
    pub per_user: ResourceRequirements,
    /// Fractional overhead, e.g. 0.2 for 20%.
    pub system_overhead: f64,
    /// Multiplier for redundant capacity.
    pub redundancy_factor: f64,
    /// Fractional buffer for peak load, e.g. 0.3 for 30%.
    pub peak_buffer: f64,
}

impl Default for CapacityModel {
    fn default() -> Self {
        Self {
            baseline_users: 100,
            baseline: ResourceRequirements {
                cpu_cores: 4.0,
                memory_gb: 8.0,
                storage_gb: 50.0,
                network_mbps: 100.0,
            },
            per_user: ResourceRequirements {
                cpu_cores: 0.01,
                memory_gb: 0.05,
                storage_gb: 0.1,
                network_mbps: 0.5,
            },
            system_overhead: 0.2,
            redundancy_factor: 1.5,
            peak_buffer: 0.3,
        }
    }
}

/// Unit costs, mutable via explicit update calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    /// Hourly cost per instance type.
    pub instance_hourly: BTreeMap<String, f64>,
    /// Monthly cost per GB per storage type.
    pub storage_monthly_per_gb: BTreeMap<String, f64>,
    /// Cost per transferred GB.
    pub transfer_per_gb: f64,
    /// Flat monthly costs for additional services.
    pub additional_services: BTreeMap<String, f64>,
}

impl Default for CostModel {
    fn default() -> Self {
        let mut instance_hourly = BTreeMap::new();
        instance_hourly.insert("standard-4x16".to_string(), 0.40);
        instance_hourly.insert("compute-8x32".to_string(), 0.85);
        let mut storage_monthly_per_gb = BTreeMap::new();
        storage_monthly_per_gb.insert("ssd".to_string(), 0.10);
        let mut additional_services = BTreeMap::new();
        additional_services.insert("load_balancer".to_string(), 25.0);
        additional_services.insert("monitoring".to_string(), 50.0);
        Self {
            instance_hourly,
            storage_monthly_per_gb,
            transfer_per_gb: 0.09,
            additional_services,
        }
    }
}

impl CostModel {
    pub fn set_instance_cost(&mut self, instance_type: impl Into<String>, hourly: f64) {
        self.instance_hourly.insert(instance_type.into(), hourly);
    }

    pub fn set_storage_cost(&mut self, storage_type: impl Into<String>, monthly_per_gb: f64) {
        self.storage_monthly_per_gb
            .insert(storage_type.into(), monthly_per_gb);
    }

    pub fn set_service_cost(&mut self, service: impl Into<String>, monthly: f64) {
        self.additional_services.insert(service.into(), monthly);
    }
}

/// Vertical, horizontal, or hybrid scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingStrategy {
    Vertical,
    Horizontal,
    Hybrid,
}

/// Projection for one target user count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalingProjection {
    pub target_users: u64,
    pub current_users: u64,
    pub resources: ResourceRequirements,
    pub required_instances: u32,
    pub estimated_monthly_cost: f64,
    pub strategy: ScalingStrategy,
    pub timeline: String,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

/// A named growth scenario to expand into a 12-month plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthScenario {
    pub name: String,
    pub description: String,
    pub timeframe: String,
    /// Fractional monthly growth, e.g. 0.1 for 10%.
    pub monthly_growth_rate: f64,
    pub peak_multiplier: f64,
    /// Exactly one positive factor per month.
    pub seasonal_factors: [f64; 12],
}

impl GrowthScenario {
    /// Flat seasonality helper.
    pub fn flat(name: impl Into<String>, monthly_growth_rate: f64, peak_multiplier: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            timeframe: "12 months".to_string(),
            monthly_growth_rate,
            peak_multiplier,
            seasonal_factors: [1.0; 12],
        }
    }

    pub fn validate(&self) -> Result<(), LabError> {
        if self.seasonal_factors.iter().any(|f| *f <= 0.0) {
            return Err(LabError::InvalidConfig(format!(
                "growth scenario '{}' has non-positive seasonal factors",
                self.name
            )));
        }
        if self.peak_multiplier <= 0.0 {
            return Err(LabError::InvalidConfig(format!(
                "growth scenario '{}' has non-positive peak multiplier",
                self.name
            )));
        }
        Ok(())
    }
}

/// Scaling milestone inside a capacity plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub date: DateTime<Utc>,
    pub projected_users: u64,
    pub action: String,
    pub estimated_monthly_cost: f64,
}

/// Alternative architecture with its cost delta and tradeoffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchitecturalAlternative {
    pub name: String,
    /// Relative monthly cost change, e.g. -0.2 for 20% cheaper.
    pub cost_delta: f64,
    pub tradeoffs: String,
}

/// 12-month expansion of one growth scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityPlan {
    pub id: String,
    pub scenario: GrowthScenario,
    pub monthly_projections: Vec<ScalingProjection>,
    pub total_annual_cost: f64,
    pub technical_risks: Vec<String>,
    pub business_risks: Vec<String>,
    pub mitigations: Vec<String>,
    pub milestones: Vec<Milestone>,
    pub alternatives: Vec<ArchitecturalAlternative>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_scenario_rejects_bad_factors() {
        let mut scenario = GrowthScenario::flat("bad", 0.1, 1.2);
        scenario.seasonal_factors[4] = 0.0;
        assert!(matches!(
            scenario.validate(),
            Err(LabError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_growth_scenario_flat_is_valid() {
        assert!(GrowthScenario::flat("ok", 0.05, 1.5).validate().is_ok());
    }

    #[test]
    fn test_cost_model_updates() {
        let mut costs = CostModel::default();
        costs.set_instance_cost("standard-4x16", 0.55);
        assert_eq!(costs.instance_hourly["standard-4x16"], 0.55);
        costs.set_service_cost("cdn", 80.0);
        assert_eq!(costs.additional_services["cdn"], 80.0);
    }
}
