//! Actor simulator
//!
//! One synthetic concurrent user driving randomized operations against the
//! task backend. Each actor owns a capped private queue and per-actor
//! counters; every operation runs through a measurement wrapper that counts
//! the request, accumulates latency, and records failures without swallowing
//! them.

use crate::backend::{
    ActivityDescriptor, ActorStats, BackendError, CombatStats, EnemyDescriptor, RecipeDescriptor,
    Task, TaskBackend, TaskKind, TaskTypeDistribution,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Default cap on an actor's private queue.
pub const DEFAULT_QUEUE_CAP: usize = 50;

/// Maximum random pair swaps per reorder operation.
const MAX_REORDER_SWAPS: usize = 3;

#[derive(Debug, Clone, Copy)]
enum ActorAction {
    AddTask,
    InspectQueue,
    ReorderSubset,
    CancelRandom,
}

/// One simulated concurrent user.
pub struct ActorSimulator {
    pub id: u64,
    pub is_active: bool,
    pub request_count: u64,
    pub error_count: u64,
    pub response_time_sum_ms: f64,
    /// Error counts keyed by [`BackendError::class`].
    pub error_classes: HashMap<String, u64>,
    /// Tasks successfully submitted to the backend.
    pub tasks_submitted: u64,
    pub max_queue_len: usize,
    queue_len_sum: u64,
    queue_len_samples: u64,
    queue: Vec<Task>,
    queue_cap: usize,
    stats: ActorStats,
    dist: TaskTypeDistribution,
    rng: StdRng,
    backend: Arc<dyn TaskBackend>,
}

impl ActorSimulator {
    pub fn new(
        id: u64,
        seed: u64,
        dist: TaskTypeDistribution,
        backend: Arc<dyn TaskBackend>,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let stats = ActorStats {
            strength: rng.gen_range(10..60),
            agility: rng.gen_range(10..60),
            intellect: rng.gen_range(10..60),
            stamina: rng.gen_range(10..60),
        };
        Self {
            id,
            is_active: true,
            request_count: 0,
            error_count: 0,
            response_time_sum_ms: 0.0,
            error_classes: HashMap::new(),
            tasks_submitted: 0,
            max_queue_len: 0,
            queue_len_sum: 0,
            queue_len_samples: 0,
            queue: Vec::new(),
            queue_cap: DEFAULT_QUEUE_CAP,
            stats,
            dist,
            rng,
            backend,
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Mean queue length across every measured operation.
    pub fn average_queue_len(&self) -> f64 {
        if self.queue_len_samples == 0 {
            0.0
        } else {
            self.queue_len_sum as f64 / self.queue_len_samples as f64
        }
    }

    /// Seed the queue with an initial task mix drawn from the configured
    /// distribution. Submission failures are recorded in the counters, not
    /// propagated.
    pub async fn seed_initial_tasks(&mut self, count: usize) {
        for _ in 0..count {
            let kind = self.dist.pick(&mut self.rng);
            if let Err(e) = self.add_task_of_kind(kind).await {
                trace!(actor_id = self.id, error = %e, "Initial task seeding failed");
            }
        }
    }

    /// One randomized activity tick. The failure is propagated to the caller
    /// after being recorded.
    pub async fn tick(&mut self) -> Result<(), BackendError> {
        if !self.is_active {
            return Ok(());
        }
        let action = match self.rng.gen_range(0..4u8) {
            0 => ActorAction::AddTask,
            1 => ActorAction::InspectQueue,
            2 => ActorAction::ReorderSubset,
            _ => ActorAction::CancelRandom,
        };
        match action {
            ActorAction::AddTask => self.add_random_task().await,
            ActorAction::InspectQueue => self.inspect_queue().await,
            ActorAction::ReorderSubset => self.reorder_subset().await,
            ActorAction::CancelRandom => self.cancel_random().await,
        }
    }

    async fn add_random_task(&mut self) -> Result<(), BackendError> {
        // No-op at capacity.
        if self.queue.len() >= self.queue_cap {
            return Ok(());
        }
        let kind = self.dist.pick(&mut self.rng);
        self.add_task_of_kind(kind).await
    }

    async fn add_task_of_kind(&mut self, kind: TaskKind) -> Result<(), BackendError> {
        if self.queue.len() >= self.queue_cap {
            return Ok(());
        }
        let start = Instant::now();
        let result = match kind {
            TaskKind::Harvesting => {
                let activity = ActivityDescriptor {
                    name: "gathering".to_string(),
                    resource: ["oak", "iron", "herbs", "fish"][self.rng.gen_range(0..4)]
                        .to_string(),
                    tier: self.rng.gen_range(1..5),
                };
                self.backend
                    .add_harvesting_task(self.id, &activity, &self.stats)
                    .await
            }
            TaskKind::Crafting => {
                let recipe = RecipeDescriptor {
                    name: ["sword", "potion", "armor", "tool"][self.rng.gen_range(0..4)]
                        .to_string(),
                    tier: self.rng.gen_range(1..5),
                    crafting_time_ms: self.rng.gen_range(2_000..10_000),
                };
                let bonus = 1.0 + self.rng.gen::<f64>() * 0.5;
                let materials = vec!["ore".to_string(), "wood".to_string()];
                self.backend
                    .add_crafting_task(self.id, &recipe, &self.stats, bonus, &materials)
                    .await
            }
            TaskKind::Combat => {
                let enemy = EnemyDescriptor {
                    name: ["wolf", "bandit", "golem", "wyvern"][self.rng.gen_range(0..4)]
                        .to_string(),
                    level: self.rng.gen_range(1..50),
                    health: self.rng.gen_range(50..500),
                };
                let combat = CombatStats {
                    attack: self.stats.strength + self.stats.agility / 2,
                    defense: self.stats.stamina,
                };
                let level = self.rng.gen_range(1..50);
                self.backend
                    .add_combat_task(self.id, &enemy, &self.stats, level, &combat)
                    .await
            }
        };
        let result = match result {
            Ok(task) => {
                self.queue.push(task);
                self.tasks_submitted += 1;
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.observe(start, result)
    }

    async fn inspect_queue(&mut self) -> Result<(), BackendError> {
        let start = Instant::now();
        let result = self.backend.get_queue_status(self.id).await.map(|_| ());
        self.observe(start, result)
    }

    /// Shuffle up to three random pairs when at least two tasks are queued.
    async fn reorder_subset(&mut self) -> Result<(), BackendError> {
        if self.queue.len() < 2 {
            return Ok(());
        }
        for _ in 0..MAX_REORDER_SWAPS {
            let a = self.rng.gen_range(0..self.queue.len());
            let b = self.rng.gen_range(0..self.queue.len());
            self.queue.swap(a, b);
        }
        let ordered: Vec<u64> = self.queue.iter().map(|t| t.id).collect();
        let start = Instant::now();
        let result = self.backend.reorder_tasks(self.id, &ordered).await;
        self.observe(start, result)
    }

    async fn cancel_random(&mut self) -> Result<(), BackendError> {
        if self.queue.is_empty() {
            return Ok(());
        }
        let idx = self.rng.gen_range(0..self.queue.len());
        let task_id = self.queue[idx].id;
        let start = Instant::now();
        let result = self.backend.remove_task(self.id, task_id).await;
        if result.is_ok() {
            self.queue.remove(idx);
        }
        self.observe(start, result)
    }

    /// Measurement wrapper: counts the request, accumulates latency, records
    /// failures, and hands the result back untouched.
    fn observe(&mut self, start: Instant, result: Result<(), BackendError>) -> Result<(), BackendError> {
        self.request_count += 1;
        self.response_time_sum_ms += start.elapsed().as_secs_f64() * 1_000.0;
        self.queue_len_sum += self.queue.len() as u64;
        self.queue_len_samples += 1;
        self.max_queue_len = self.max_queue_len.max(self.queue.len());
        if let Err(e) = &result {
            self.error_count += 1;
            *self
                .error_classes
                .entry(e.class().to_string())
                .or_insert(0) += 1;
        }
        result
    }
}
