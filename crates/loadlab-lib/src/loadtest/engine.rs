//! Four-phase load test engine
//!
//! RampUp -> Sustain -> RampDown -> Analyze. Actors are owned exclusively by
//! the engine invocation running them; the metrics sampler runs on its own
//! timer and is shut down deterministically when the sustain phase ends.
//! A failure anywhere in the phases is caught at the top level, recorded as a
//! critical error, and the invocation still yields a best-effort result.

use super::analysis::{self, ResourceSample, Totals};
use super::{LoadTestConfig, LoadTestResult};
use crate::backend::TaskBackend;
use crate::observability::LabMetrics;
use crate::sim::{ActorSimulator, Clock, NoiseGenerator, ResourceModel, SeededNoise};
use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

/// Number of steps the ramp phases are split into.
const RAMP_STEPS: usize = 10;

/// Pause between activity rounds during sustain.
const ROUND_PAUSE: Duration = Duration::from_millis(100);

/// Cadence of the metrics sampler.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

type ActorMap = HashMap<u64, Arc<Mutex<ActorSimulator>>>;

/// Runs one load test configuration end to end.
pub struct LoadTestEngine {
    backend: Arc<dyn TaskBackend>,
    clock: Arc<dyn Clock>,
    model: ResourceModel,
    running: Arc<AtomicBool>,
}

impl LoadTestEngine {
    pub fn new(backend: Arc<dyn TaskBackend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            model: ResourceModel::default(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Override the parametric resource model.
    pub fn with_model(mut self, model: ResourceModel) -> Self {
        self.model = model;
        self
    }

    /// Cooperative stop. Checked at round boundaries only; in-flight
    /// operations finish and ramp-down still executes.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Handle for stopping a running test from another task.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Run the full four-phase state machine for one configuration.
    pub async fn run(&self, config: LoadTestConfig) -> LoadTestResult {
        let test_id = format!("load-{}", Utc::now().timestamp_millis());
        let started_at = Utc::now();
        let start_ms = self.clock.now_ms();
        info!(
            test_id = %test_id,
            actors = config.concurrent_actors,
            duration_ms = config.test_duration_ms,
            "Starting load test"
        );

        self.running.store(true, Ordering::SeqCst);
        let mut actors: ActorMap = HashMap::new();
        let samples: Arc<StdMutex<Vec<ResourceSample>>> = Arc::new(StdMutex::new(Vec::new()));
        let active_count = Arc::new(AtomicUsize::new(0));
        let mut totals = Totals::default();
        let mut critical_errors = Vec::new();

        let outcome = self
            .execute(&config, &mut actors, &samples, &active_count, &mut totals)
            .await;
        if let Err(e) = outcome {
            warn!(test_id = %test_id, error = %e, "Load test phase failed; finalizing partial result");
            critical_errors.push(format!("{e:#}"));
        }

        // Absorb any actors still alive if ramp-down was cut short.
        for (_, arc) in actors.drain() {
            let actor = arc.lock().await;
            totals.absorb(&actor);
        }
        self.running.store(false, Ordering::SeqCst);

        let elapsed_ms = self.clock.now_ms().saturating_sub(start_ms);
        let metrics = LabMetrics::handle();
        metrics.inc_load_tests();
        metrics.add_actor_operations(totals.requests);
        metrics.add_operation_errors(totals.errors);

        let sample_snapshot = samples.lock().expect("samples poisoned").clone();
        let result = analysis::finalize(
            test_id,
            config,
            totals,
            &sample_snapshot,
            elapsed_ms,
            critical_errors,
            started_at,
        );
        info!(
            test_id = %result.test_id,
            total_requests = result.total_requests,
            error_rate = result.error_rate(),
            "Load test complete"
        );
        result
    }

    async fn execute(
        &self,
        config: &LoadTestConfig,
        actors: &mut ActorMap,
        samples: &Arc<StdMutex<Vec<ResourceSample>>>,
        active_count: &Arc<AtomicUsize>,
        totals: &mut Totals,
    ) -> Result<()> {
        self.ramp_up(config, actors, active_count).await?;
        self.sustain(config, actors, samples, active_count).await?;
        self.ramp_down(config, actors, active_count, totals).await?;
        Ok(())
    }

    /// Create actors in RAMP_STEPS batches, seeding each with its initial
    /// task mix, sleeping between steps.
    async fn ramp_up(
        &self,
        config: &LoadTestConfig,
        actors: &mut ActorMap,
        active_count: &Arc<AtomicUsize>,
    ) -> Result<()> {
        let target = config.concurrent_actors;
        let per_step = target.div_ceil(RAMP_STEPS);
        let step_pause = Duration::from_millis(config.ramp_up_ms / RAMP_STEPS as u64);
        let mut next_id: u64 = 1;

        for step in 0..RAMP_STEPS {
            let goal = ((step + 1) * per_step).min(target);
            while actors.len() < goal {
                let seed = config.seed.wrapping_mul(0x9E37_79B9).wrapping_add(next_id);
                let mut actor = ActorSimulator::new(
                    next_id,
                    seed,
                    config.task_distribution.clone(),
                    Arc::clone(&self.backend),
                );
                actor.seed_initial_tasks(config.tasks_per_actor).await;
                actors.insert(next_id, Arc::new(Mutex::new(actor)));
                next_id += 1;
            }
            active_count.store(actors.len(), Ordering::SeqCst);
            debug!(step, active = actors.len(), "Ramp-up step complete");
            self.clock.sleep(step_pause).await;
        }
        Ok(())
    }

    /// Run concurrent activity rounds until the duration elapses or the stop
    /// flag is cleared, sampling metrics on a fixed cadence the whole time.
    async fn sustain(
        &self,
        config: &LoadTestConfig,
        actors: &ActorMap,
        samples: &Arc<StdMutex<Vec<ResourceSample>>>,
        active_count: &Arc<AtomicUsize>,
    ) -> Result<()> {
        let (shutdown_tx, _) = broadcast::channel::<()>(1);
        let sampler = tokio::spawn(sample_loop(
            Arc::clone(&self.clock),
            self.model.clone(),
            Box::new(SeededNoise::new(config.seed.wrapping_add(0xA5A5))),
            Arc::clone(active_count),
            Arc::clone(samples),
            shutdown_tx.subscribe(),
        ));

        let deadline = self.clock.now_ms() + config.test_duration_ms;
        while self.running.load(Ordering::SeqCst) && self.clock.now_ms() < deadline {
            let ticks = actors.values().cloned().map(|actor| async move {
                let mut actor = actor.lock().await;
                actor.tick().await
            });
            let results = join_all(ticks).await;
            let failures = results.iter().filter(|r| r.is_err()).count();
            if failures > 0 {
                debug!(failures, round_size = results.len(), "Activity round had failures");
            }
            self.clock.sleep(ROUND_PAUSE).await;
        }

        // Deterministic sampler shutdown regardless of how sustain ended.
        let _ = shutdown_tx.send(());
        sampler.await.map_err(|e| anyhow::anyhow!("sampler task panicked: {e}"))?;
        Ok(())
    }

    /// Remove actors in the same step cadence as ramp-up, in reverse.
    /// `stop_all_tasks` is best-effort here; cleanup errors are ignored.
    async fn ramp_down(
        &self,
        config: &LoadTestConfig,
        actors: &mut ActorMap,
        active_count: &Arc<AtomicUsize>,
        totals: &mut Totals,
    ) -> Result<()> {
        let per_step = config.concurrent_actors.div_ceil(RAMP_STEPS);
        let step_pause = Duration::from_millis(config.ramp_down_ms / RAMP_STEPS as u64);

        for _ in 0..RAMP_STEPS {
            let mut ids: Vec<u64> = actors.keys().copied().collect();
            ids.sort_unstable_by(|a, b| b.cmp(a));
            for id in ids.into_iter().take(per_step) {
                if let Some(arc) = actors.remove(&id) {
                    if let Err(e) = self.backend.stop_all_tasks(id).await {
                        debug!(actor_id = id, error = %e, "Ignoring cleanup error at ramp-down");
                    }
                    let mut actor = arc.lock().await;
                    actor.is_active = false;
                    totals.absorb(&actor);
                }
            }
            active_count.store(actors.len(), Ordering::SeqCst);
            if actors.is_empty() {
                break;
            }
            self.clock.sleep(step_pause).await;
        }
        Ok(())
    }
}

/// Fixed-interval metrics sampler. Runs independently of the activity loop and
/// exits on the shutdown signal.
async fn sample_loop(
    clock: Arc<dyn Clock>,
    model: ResourceModel,
    mut noise: Box<dyn NoiseGenerator>,
    active_count: Arc<AtomicUsize>,
    samples: Arc<StdMutex<Vec<ResourceSample>>>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = clock.sleep(SAMPLE_INTERVAL) => {
                let actors = active_count.load(Ordering::SeqCst);
                let sample = ResourceSample {
                    memory_mb: model.memory_mb(actors, noise.as_mut()),
                    cpu_percent: model.cpu_percent(actors, noise.as_mut()),
                };
                samples.lock().expect("samples poisoned").push(sample);
            }
            _ = shutdown.recv() => {
                debug!("Metrics sampler shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{SimulatedBackend, SimulatedBackendConfig};
    use crate::sim::VirtualClock;
    use async_trait::async_trait;

    /// Delegates to a virtual clock but panics on the sampler cadence,
    /// standing in for an unexpected background-task fault.
    struct FaultyClock {
        inner: VirtualClock,
    }

    #[async_trait]
    impl Clock for FaultyClock {
        async fn sleep(&self, dur: Duration) {
            if dur == SAMPLE_INTERVAL {
                panic!("injected clock fault");
            }
            self.inner.sleep(dur).await;
        }

        fn now_ms(&self) -> u64 {
            self.inner.now_ms()
        }
    }

    fn quick_config(actors: usize) -> LoadTestConfig {
        LoadTestConfig {
            concurrent_actors: actors,
            test_duration_ms: 2_000,
            tasks_per_actor: 2,
            ramp_up_ms: 1_000,
            ramp_down_ms: 1_000,
            seed: 42,
            ..LoadTestConfig::default()
        }
    }

    fn engine_with(failure_rate: f64) -> LoadTestEngine {
        let backend = Arc::new(SimulatedBackend::new(SimulatedBackendConfig {
            failure_rate,
            queue_capacity: 200,
            seed: 1,
        }));
        LoadTestEngine::new(backend, Arc::new(VirtualClock::new()))
    }

    #[tokio::test]
    async fn test_run_produces_consistent_totals() {
        let engine = engine_with(0.0);
        let result = engine.run(quick_config(10)).await;
        assert!(result.total_requests > 0);
        assert_eq!(
            result.successful_requests + result.failed_requests,
            result.total_requests
        );
        assert!(result.average_response_time_ms <= result.p95_response_time_ms);
        assert!(result.p95_response_time_ms <= result.p99_response_time_ms);
        assert!(result.critical_errors.is_empty());
    }

    #[tokio::test]
    async fn test_zero_actors_complete_cleanly() {
        let engine = engine_with(0.0);
        let result = engine.run(quick_config(0)).await;
        assert_eq!(result.total_requests, 0);
        assert_eq!(result.queue.throughput_per_sec, 0.0);
        assert!(result.critical_errors.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failures_do_not_abort_the_round() {
        let engine = engine_with(0.3);
        let result = engine.run(quick_config(8)).await;
        // Failures are tolerated and recorded, never fatal.
        assert!(result.failed_requests > 0);
        assert!(result.total_requests > result.failed_requests);
        assert!(!result.error_taxonomy.is_empty());
        assert!(result.critical_errors.is_empty());
    }

    #[tokio::test]
    async fn test_phase_fault_still_yields_partial_result() {
        let backend = Arc::new(SimulatedBackend::new(SimulatedBackendConfig {
            failure_rate: 0.0,
            queue_capacity: 200,
            seed: 1,
        }));
        let clock = FaultyClock {
            inner: VirtualClock::new(),
        };
        let engine = LoadTestEngine::new(backend, Arc::new(clock));
        let result = engine.run(quick_config(4)).await;
        // The sampler fault is recorded, not propagated, and the actors that
        // ramped up still contribute their counters to the totals.
        assert_eq!(result.critical_errors.len(), 1);
        assert!(result.critical_errors[0].contains("sampler task panicked"));
        assert!(result.total_requests > 0);
        assert_eq!(
            result.successful_requests + result.failed_requests,
            result.total_requests
        );
    }

    #[tokio::test]
    async fn test_sampler_collects_resource_peaks() {
        let engine = engine_with(0.0);
        let result = engine.run(quick_config(10)).await;
        // The parametric model always reports at least the base figures.
        assert!(result.peaks.peak_memory_mb > 0.0);
        assert!(result.peaks.peak_cpu_percent > 0.0);
    }

    #[tokio::test]
    async fn test_stop_flag_ends_sustain_early() {
        let engine = engine_with(0.0);
        let flag = engine.stop_flag();
        let mut config = quick_config(4);
        config.test_duration_ms = 3_600_000;

        let handle = {
            let stop = Arc::clone(&flag);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                stop.store(false, Ordering::SeqCst);
            })
        };
        let result = engine.run(config).await;
        handle.await.unwrap();
        // Ramp-down still executed: every actor's counters are in the totals.
        assert!(result.total_requests > 0);
    }
}
