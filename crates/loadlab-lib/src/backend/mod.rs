//! Task-processing backend interface
//!
//! The load lab drives exactly one external collaborator: the task-processing
//! backend. This module defines the narrow trait surface the entire pipeline
//! calls through, plus the wire types that cross it. The in-process
//! [`SimulatedBackend`] is the default implementation; a harness that wants to
//! drive a real backend implements [`TaskBackend`] itself.

mod simulated;

pub use simulated::{SimulatedBackend, SimulatedBackendConfig};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use async_trait::async_trait;

/// Kind of synthetic task an actor can enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Harvesting,
    Crafting,
    Combat,
}

/// A task accepted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub actor_id: u64,
    pub kind: TaskKind,
    pub description: String,
    /// Nominal processing duration assigned by the backend.
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// Harvesting activity requested by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityDescriptor {
    pub name: String,
    pub resource: String,
    pub tier: u32,
}

/// Crafting recipe requested by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDescriptor {
    pub name: String,
    pub tier: u32,
    pub crafting_time_ms: u64,
}

/// Combat encounter requested by an actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyDescriptor {
    pub name: String,
    pub level: u32,
    pub health: u32,
}

/// Core attribute block for a simulated actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActorStats {
    pub strength: u32,
    pub agility: u32,
    pub intellect: u32,
    pub stamina: u32,
}

/// Derived combat attributes for a simulated actor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombatStats {
    pub attack: u32,
    pub defense: u32,
}

/// Snapshot of one actor's queue as seen by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queued_tasks: usize,
    pub current_task: Option<Task>,
    pub is_running: bool,
}

/// Failure taxonomy for backend operations.
///
/// Result artifacts key their error-taxonomy maps by [`BackendError::class`].
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("backend operation timed out")]
    Timeout,

    #[error("task queue for actor {actor_id} is full")]
    QueueFull { actor_id: u64 },

    #[error("task {task_id} not found")]
    TaskNotFound { task_id: u64 },

    #[error("internal backend error: {0}")]
    Internal(String),
}

impl BackendError {
    /// Stable class name used as the error-taxonomy key.
    pub fn class(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::QueueFull { .. } => "queue_full",
            Self::TaskNotFound { .. } => "task_not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Narrow interface to the task-processing backend.
///
/// Retry and backoff, if desired, belong to the implementation behind this
/// trait; the pipeline itself never retries.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    async fn add_harvesting_task(
        &self,
        actor_id: u64,
        activity: &ActivityDescriptor,
        stats: &ActorStats,
    ) -> Result<Task, BackendError>;

    async fn add_crafting_task(
        &self,
        actor_id: u64,
        recipe: &RecipeDescriptor,
        stats: &ActorStats,
        workstation_bonus: f64,
        materials: &[String],
    ) -> Result<Task, BackendError>;

    async fn add_combat_task(
        &self,
        actor_id: u64,
        enemy: &EnemyDescriptor,
        stats: &ActorStats,
        level: u32,
        combat: &CombatStats,
    ) -> Result<Task, BackendError>;

    async fn get_queue_status(&self, actor_id: u64) -> Result<QueueStatus, BackendError>;

    async fn remove_task(&self, actor_id: u64, task_id: u64) -> Result<(), BackendError>;

    async fn reorder_tasks(&self, actor_id: u64, ordered: &[u64]) -> Result<(), BackendError>;

    /// Best-effort stop of everything queued for one actor. Errors from this
    /// call are swallowed during ramp-down only.
    async fn stop_all_tasks(&self, actor_id: u64) -> Result<(), BackendError>;
}

/// Relative weights for the synthetic task mix.
///
/// Weights are normalized at draw time, so they need not sum to one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTypeDistribution {
    pub harvesting: f64,
    pub crafting: f64,
    pub combat: f64,
}

impl Default for TaskTypeDistribution {
    fn default() -> Self {
        Self {
            harvesting: 0.4,
            crafting: 0.35,
            combat: 0.25,
        }
    }
}

impl TaskTypeDistribution {
    /// Draw one task kind according to the normalized weights.
    ///
    /// Falls back to harvesting when all weights are zero.
    pub fn pick<R: Rng>(&self, rng: &mut R) -> TaskKind {
        let total = self.harvesting + self.crafting + self.combat;
        if total <= 0.0 {
            return TaskKind::Harvesting;
        }
        let roll = rng.gen::<f64>() * total;
        if roll < self.harvesting {
            TaskKind::Harvesting
        } else if roll < self.harvesting + self.crafting {
            TaskKind::Crafting
        } else {
            TaskKind::Combat
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_error_classes_are_stable() {
        assert_eq!(BackendError::Timeout.class(), "timeout");
        assert_eq!(BackendError::QueueFull { actor_id: 1 }.class(), "queue_full");
        assert_eq!(
            BackendError::TaskNotFound { task_id: 9 }.class(),
            "task_not_found"
        );
        assert_eq!(BackendError::Internal("x".into()).class(), "internal");
    }

    #[test]
    fn test_distribution_respects_weights() {
        let dist = TaskTypeDistribution {
            harvesting: 1.0,
            crafting: 0.0,
            combat: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            assert_eq!(dist.pick(&mut rng), TaskKind::Harvesting);
        }
    }

    #[test]
    fn test_distribution_zero_weights_falls_back() {
        let dist = TaskTypeDistribution {
            harvesting: 0.0,
            crafting: 0.0,
            combat: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(dist.pick(&mut rng), TaskKind::Harvesting);
    }

    #[test]
    fn test_distribution_covers_all_kinds() {
        let dist = TaskTypeDistribution::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(dist.pick(&mut rng));
        }
        assert_eq!(seen.len(), 3);
    }
}
