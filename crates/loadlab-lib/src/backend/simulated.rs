//! In-process simulated task backend
//!
//! Keeps a per-actor task queue in memory and injects failures from a seeded
//! random model, so the whole pipeline runs deterministically in one process
//! without generating real traffic.

use super::{
    ActivityDescriptor, ActorStats, BackendError, CombatStats, EnemyDescriptor, QueueStatus,
    RecipeDescriptor, Task, TaskBackend, TaskKind,
};
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::debug;

/// Tuning for the simulated backend.
#[derive(Debug, Clone)]
pub struct SimulatedBackendConfig {
    /// Probability that any single operation fails.
    pub failure_rate: f64,
    /// Backend-side queue capacity per actor.
    pub queue_capacity: usize,
    /// Seed for the failure model.
    pub seed: u64,
}

impl Default for SimulatedBackendConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.01,
            queue_capacity: 100,
            seed: 0,
        }
    }
}

#[derive(Debug, Default)]
struct ActorQueue {
    tasks: Vec<Task>,
    is_running: bool,
}

/// Simulated task-processing backend.
pub struct SimulatedBackend {
    config: SimulatedBackendConfig,
    queues: Mutex<HashMap<u64, ActorQueue>>,
    rng: Mutex<StdRng>,
    next_task_id: AtomicU64,
}

impl SimulatedBackend {
    pub fn new(config: SimulatedBackendConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            queues: Mutex::new(HashMap::new()),
            rng: Mutex::new(rng),
            next_task_id: AtomicU64::new(1),
        }
    }

    /// A backend that never fails, for tests that need clean runs.
    pub fn reliable() -> Self {
        Self::new(SimulatedBackendConfig {
            failure_rate: 0.0,
            ..SimulatedBackendConfig::default()
        })
    }

    /// Roll the failure model once. Timeouts and internal errors are the two
    /// injected classes; queue-full and not-found arise from queue state.
    fn maybe_fail(&self) -> Result<(), BackendError> {
        let roll: f64 = self.rng.lock().expect("rng poisoned").gen();
        if roll < self.config.failure_rate {
            if roll < self.config.failure_rate / 2.0 {
                Err(BackendError::Timeout)
            } else {
                Err(BackendError::Internal("simulated fault".to_string()))
            }
        } else {
            Ok(())
        }
    }

    fn enqueue(
        &self,
        actor_id: u64,
        kind: TaskKind,
        description: String,
        duration_ms: u64,
    ) -> Result<Task, BackendError> {
        self.maybe_fail()?;

        let mut queues = self.queues.lock().expect("queues poisoned");
        let queue = queues.entry(actor_id).or_default();
        if queue.tasks.len() >= self.config.queue_capacity {
            return Err(BackendError::QueueFull { actor_id });
        }

        let task = Task {
            id: self.next_task_id.fetch_add(1, Ordering::Relaxed),
            actor_id,
            kind,
            description,
            duration_ms,
            created_at: Utc::now(),
        };
        queue.tasks.push(task.clone());
        queue.is_running = true;
        Ok(task)
    }
}

#[async_trait]
impl TaskBackend for SimulatedBackend {
    async fn add_harvesting_task(
        &self,
        actor_id: u64,
        activity: &ActivityDescriptor,
        _stats: &ActorStats,
    ) -> Result<Task, BackendError> {
        self.enqueue(
            actor_id,
            TaskKind::Harvesting,
            format!("harvest {} ({})", activity.resource, activity.name),
            1_000 + u64::from(activity.tier) * 500,
        )
    }

    async fn add_crafting_task(
        &self,
        actor_id: u64,
        recipe: &RecipeDescriptor,
        _stats: &ActorStats,
        workstation_bonus: f64,
        _materials: &[String],
    ) -> Result<Task, BackendError> {
        let duration = (recipe.crafting_time_ms as f64 / workstation_bonus.max(0.1)) as u64;
        self.enqueue(
            actor_id,
            TaskKind::Crafting,
            format!("craft {}", recipe.name),
            duration,
        )
    }

    async fn add_combat_task(
        &self,
        actor_id: u64,
        enemy: &EnemyDescriptor,
        _stats: &ActorStats,
        level: u32,
        _combat: &CombatStats,
    ) -> Result<Task, BackendError> {
        let duration = 2_000 + u64::from(enemy.level.saturating_sub(level)) * 300;
        self.enqueue(
            actor_id,
            TaskKind::Combat,
            format!("fight {}", enemy.name),
            duration,
        )
    }

    async fn get_queue_status(&self, actor_id: u64) -> Result<QueueStatus, BackendError> {
        self.maybe_fail()?;
        let queues = self.queues.lock().expect("queues poisoned");
        let status = match queues.get(&actor_id) {
            Some(q) => QueueStatus {
                queued_tasks: q.tasks.len(),
                current_task: q.tasks.first().cloned(),
                is_running: q.is_running,
            },
            None => QueueStatus {
                queued_tasks: 0,
                current_task: None,
                is_running: false,
            },
        };
        Ok(status)
    }

    async fn remove_task(&self, actor_id: u64, task_id: u64) -> Result<(), BackendError> {
        self.maybe_fail()?;
        let mut queues = self.queues.lock().expect("queues poisoned");
        let queue = queues
            .get_mut(&actor_id)
            .ok_or(BackendError::TaskNotFound { task_id })?;
        let before = queue.tasks.len();
        queue.tasks.retain(|t| t.id != task_id);
        if queue.tasks.len() == before {
            return Err(BackendError::TaskNotFound { task_id });
        }
        Ok(())
    }

    async fn reorder_tasks(&self, actor_id: u64, ordered: &[u64]) -> Result<(), BackendError> {
        self.maybe_fail()?;
        let mut queues = self.queues.lock().expect("queues poisoned");
        if let Some(queue) = queues.get_mut(&actor_id) {
            queue
                .tasks
                .sort_by_key(|t| ordered.iter().position(|id| *id == t.id).unwrap_or(usize::MAX));
        }
        Ok(())
    }

    async fn stop_all_tasks(&self, actor_id: u64) -> Result<(), BackendError> {
        let mut queues = self.queues.lock().expect("queues poisoned");
        if let Some(queue) = queues.remove(&actor_id) {
            debug!(actor_id, dropped = queue.tasks.len(), "Stopped all tasks");
        }
        Ok(())
    }
}
