//! Probe job scheduling.
//!
//! Each job gets its own interval timer task, so a slow or hung probe never
//! delays another job's ticks. Runs execute in separately spawned tasks; a
//! per-job semaphore caps how many instances of the same job may be in
//! flight, and a tick that arrives while the ceiling is reached is skipped,
//! never replayed. A panic inside a run is caught at the JoinHandle
//! boundary and converted into the probe's failure metric.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::probes::Probe;

/// Immutable description of one scheduled probe job.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Job name used in logs
    pub name: &'static str,
    /// Time between ticks
    pub interval: Duration,
    /// Maximum concurrent runs of this job
    pub max_instances: usize,
}

impl JobSpec {
    /// Create a job descriptor.
    pub fn new(name: &'static str, interval: Duration, max_instances: usize) -> Self {
        Self { name, interval, max_instances }
    }
}

/// Drives probes at independent fixed intervals until shut down.
pub struct Scheduler {
    shutdown: watch::Receiver<bool>,
    jobs: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Create a scheduler that stops accepting ticks once `true` is sent on
    /// the shutdown channel.
    pub fn new(shutdown: watch::Receiver<bool>) -> Self {
        Self { shutdown, jobs: Vec::new() }
    }

    /// Start the timer loop for one job.
    ///
    /// The first tick fires immediately so metrics become available right
    /// after boot; later ticks are wall-clock based and missed ticks are
    /// skipped rather than replayed.
    pub fn schedule(&mut self, spec: JobSpec, probe: Arc<dyn Probe>) {
        let mut shutdown = self.shutdown.clone();
        let handle = tokio::spawn(async move {
            let permits = Arc::new(Semaphore::new(spec.max_instances));
            let mut ticker = interval(spec.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                job = spec.name,
                interval_secs = spec.interval.as_secs_f64(),
                max_instances = spec.max_instances,
                "job scheduled"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown.changed() => {
                        info!(job = spec.name, "job timer stopped");
                        break;
                    }
                }

                // Concurrency ceiling: a tick with no free permit is dropped.
                let permit = match permits.clone().try_acquire_owned() {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!(
                            job = spec.name,
                            max_instances = spec.max_instances,
                            "concurrency ceiling reached, skipping tick"
                        );
                        continue;
                    }
                };

                let probe = Arc::clone(&probe);
                tokio::spawn(async move {
                    let _permit = permit;
                    let worker = tokio::spawn({
                        let probe = Arc::clone(&probe);
                        async move { probe.run().await }
                    });
                    if let Err(err) = worker.await {
                        if err.is_panic() {
                            error!(job = probe.name(), "probe run panicked, recording failure");
                            probe.record_fault();
                        }
                    }
                });
            }
        });
        self.jobs.push(handle);
    }

    /// Wait for every job timer loop to finish.
    ///
    /// Loops only finish after the shutdown channel fires; in-flight runs
    /// are abandoned, which is safe because every registry mutation is an
    /// atomic single-instrument operation.
    pub async fn join(self) {
        for handle in self.jobs {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Probe double that tracks run and fault counts and can be made slow
    /// or panicky.
    struct FakeProbe {
        runs: AtomicUsize,
        faults: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
        run_duration: Duration,
        panics: bool,
    }

    impl FakeProbe {
        fn new(run_duration: Duration) -> Self {
            Self {
                runs: AtomicUsize::new(0),
                faults: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
                run_duration,
                panics: false,
            }
        }

        fn panicking() -> Self {
            let mut probe = Self::new(Duration::ZERO);
            probe.panics = true;
            probe
        }
    }

    #[async_trait::async_trait]
    impl Probe for FakeProbe {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            if self.panics {
                self.active.fetch_sub(1, Ordering::SeqCst);
                panic!("boom");
            }
            tokio::time::sleep(self.run_duration).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
        }

        fn record_fault(&self) {
            self.faults.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn first_run_fires_promptly() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Scheduler::new(rx);
        let probe = Arc::new(FakeProbe::new(Duration::ZERO));

        // Interval far longer than the test; only the immediate tick runs.
        scheduler.schedule(JobSpec::new("slow-interval", Duration::from_secs(3600), 1), probe.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(probe.runs.load(Ordering::SeqCst), 1);

        let _ = tx.send(true);
        scheduler.join().await;
    }

    #[tokio::test]
    async fn concurrency_ceiling_is_never_exceeded() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Scheduler::new(rx);
        // Runs outlive many ticks, so the ceiling is hit immediately.
        let probe = Arc::new(FakeProbe::new(Duration::from_millis(400)));

        scheduler.schedule(JobSpec::new("busy", Duration::from_millis(20), 2), probe.clone());

        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = tx.send(true);
        scheduler.join().await;

        assert!(probe.max_active.load(Ordering::SeqCst) <= 2);
        // Excess ticks were dropped, not deferred into a burst: far fewer
        // runs than the ~15 ticks the interval produced.
        let runs = probe.runs.load(Ordering::SeqCst);
        assert!((2..=3).contains(&runs), "expected dropped ticks, got {} runs", runs);
    }

    #[tokio::test]
    async fn panicking_probe_is_isolated() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Scheduler::new(rx);
        let probe = Arc::new(FakeProbe::panicking());

        scheduler.schedule(JobSpec::new("panicky", Duration::from_millis(30), 1), probe.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = tx.send(true);
        scheduler.join().await;

        let runs = probe.runs.load(Ordering::SeqCst);
        let faults = probe.faults.load(Ordering::SeqCst);
        // The loop survived the first panic and kept ticking. The last
        // run's fault may still be in flight when the loop stops.
        assert!(runs >= 2, "job loop died after a panic (runs = {})", runs);
        assert!(faults >= runs - 1 && faults <= runs);
    }

    #[tokio::test]
    async fn jobs_tick_independently() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Scheduler::new(rx);
        // One hung job must not stop the other from ticking.
        let hung = Arc::new(FakeProbe::new(Duration::from_secs(30)));
        let brisk = Arc::new(FakeProbe::new(Duration::ZERO));

        scheduler.schedule(JobSpec::new("hung", Duration::from_millis(20), 1), hung.clone());
        scheduler.schedule(JobSpec::new("brisk", Duration::from_millis(20), 1), brisk.clone());

        tokio::time::sleep(Duration::from_millis(250)).await;
        let _ = tx.send(true);
        scheduler.join().await;

        assert_eq!(hung.runs.load(Ordering::SeqCst), 1);
        assert!(brisk.runs.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test]
    async fn shutdown_stops_new_ticks() {
        let (tx, rx) = watch::channel(false);
        let mut scheduler = Scheduler::new(rx);
        let probe = Arc::new(FakeProbe::new(Duration::ZERO));

        scheduler.schedule(JobSpec::new("stoppable", Duration::from_millis(20), 1), probe.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
        scheduler.join().await;

        let runs_at_shutdown = probe.runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(probe.runs.load(Ordering::SeqCst), runs_at_shutdown);
    }
}
