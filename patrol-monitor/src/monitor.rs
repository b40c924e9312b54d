//! The `Monitor`: one probe/filter/action pipeline running on a timer, with
//! its own start/stop lifecycle and failing-state tracking.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use patrol_plugin::action::Actor;
use patrol_plugin::filter::Filter;
use patrol_plugin::probe::{ProbeContext, Prober};
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::MonitorError;

/// Sentinel id for a [`Monitor`] that has not been registered yet.
pub const UNREGISTERED_ID: i64 = -1;

struct Pipeline {
    probe: Box<dyn Prober>,
    filter: Option<StdMutex<Box<dyn Filter>>>,
    actions: Vec<Box<dyn Actor>>,
}

/// A one-shot, multi-waiter "has the loop task returned yet?" signal.
///
/// Plain `tokio::sync::Notify` alone is not safe for this: `notify_waiters`
/// only wakes tasks that are already registered, so a `stop` call that
/// starts waiting after the loop has already finished would hang forever.
/// Checking `done` both before and after registering interest (the
/// `enable`/recheck dance below) closes that window.
struct Finished {
    done: AtomicBool,
    notify: Notify,
}

impl Finished {
    fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    fn mark_done(&self) {
        self.done.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    async fn wait(&self) {
        if self.done.load(Ordering::SeqCst) {
            return;
        }
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.done.load(Ordering::SeqCst) {
            return;
        }
        notified.await;
    }
}

/// A loop task's cancellation handle plus its shared termination signal.
/// Held behind an `Arc` so every concurrent `stop` call can cancel and wait
/// on the same instance rather than only the first caller to claim it.
struct RunningHandle {
    token: CancellationToken,
    finished: Arc<Finished>,
}

/// A single monitored resource: a probe, an optional filter, zero or more
/// actions, an acceptance band, and the timing parameters that drive the
/// control loop.
///
/// A `Monitor` is built once by the factory and then either sits idle or
/// runs a background loop task, started and stopped independently of
/// registration. Plugin instances live for the lifetime of the `Monitor`
/// that owns them; stopping and restarting reuses the same instances rather
/// than reconstructing them.
pub struct Monitor {
    id: AtomicI64,
    name: String,
    pipeline: Arc<Pipeline>,
    interval: Duration,
    timeout: Duration,
    min: f64,
    max: f64,
    failing: Arc<AtomicBool>,
    handle: Mutex<Option<Arc<RunningHandle>>>,
}

impl Monitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        probe: Box<dyn Prober>,
        filter: Option<Box<dyn Filter>>,
        actions: Vec<Box<dyn Actor>>,
        interval: Duration,
        timeout: Duration,
        min: f64,
        max: f64,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: AtomicI64::new(UNREGISTERED_ID),
            name: name.into(),
            pipeline: Arc::new(Pipeline {
                probe,
                filter: filter.map(StdMutex::new),
                actions,
            }),
            interval,
            timeout,
            min,
            max,
            failing: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
        })
    }

    pub fn id(&self) -> i64 {
        self.id.load(Ordering::Relaxed)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Whether the monitor's last classified sample fell outside its
    /// acceptance band. Read without synchronizing against the loop task by
    /// design: a caller may observe a value that is one sample stale.
    pub fn failing(&self) -> bool {
        self.failing.load(Ordering::Relaxed)
    }

    /// Whether a loop task is currently running for this monitor.
    pub async fn running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    pub(crate) fn set_id(&self, id: i64) {
        self.id.store(id, Ordering::Relaxed);
    }

    /// Start the control loop. Fails with [`MonitorError::AlreadyStarted`]
    /// if a loop is already running; otherwise spawns one and returns
    /// immediately, without waiting for the first probe.
    pub async fn start(self: &Arc<Self>) -> Result<(), MonitorError> {
        let mut guard = self.handle.lock().await;
        if guard.is_some() {
            return Err(MonitorError::AlreadyStarted);
        }

        let token = CancellationToken::new();
        let finished = Arc::new(Finished::new());
        let running = Arc::new(RunningHandle {
            token: token.clone(),
            finished: Arc::clone(&finished),
        });
        let running_for_task = Arc::clone(&running);

        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            run_loop(Arc::clone(&monitor), token).await;
            finished.mark_done();

            // Clear the handle ourselves: covers both a normal loop exit
            // (nobody else is going to clear it) and an abandoned startup
            // (an action's `init` failed before the first probe), while
            // leaving a handle a concurrent `start` already replaced alone.
            let mut guard = monitor.handle.lock().await;
            if guard.as_ref().is_some_and(|r| Arc::ptr_eq(r, &running_for_task)) {
                *guard = None;
            }
        });

        *guard = Some(running);
        info!(monitor = %self.name, "monitor started");
        Ok(())
    }

    /// Stop the control loop and wait for it to finish. Idempotent: calling
    /// `stop` on a monitor that isn't running is a no-op. Safe to call
    /// concurrently: every caller clones the same running handle, so all of
    /// them cancel (cancellation itself is idempotent) and wait on the same
    /// termination signal rather than only the first caller blocking while
    /// the rest return early.
    pub async fn stop(&self) {
        let running = self.handle.lock().await.clone();
        if let Some(running) = running {
            debug!(monitor = %self.name, "stopping monitor");
            running.token.cancel();
            running.finished.wait().await;
            self.failing.store(false, Ordering::Relaxed);
            info!(monitor = %self.name, "monitor stopped");
        }
    }
}

async fn run_loop(monitor: Arc<Monitor>, token: CancellationToken) {
    let pipeline = Arc::clone(&monitor.pipeline);
    let labels = [("monitor_name", monitor.name.clone())];

    if let Some(filter) = &pipeline.filter {
        filter.lock().expect("filter mutex poisoned").init();
    }

    for action in &pipeline.actions {
        if let Err(e) = action.init(&monitor.name).await {
            error!(monitor = %monitor.name, error = %e, "action init failed, abandoning startup");
            metrics::counter!("monitor_action_error_total", &labels).increment(1);
            return;
        }
    }

    let mut failed_at: Option<Instant> = None;

    loop {
        let sleep = tokio::time::sleep(monitor.interval);
        tokio::pin!(sleep);

        let deadline = Instant::now() + monitor.timeout;
        let probe_token = token.child_token();
        let timer = {
            let probe_token = probe_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep_until(deadline).await;
                probe_token.cancel();
            })
        };

        let ctx = ProbeContext::new(deadline, probe_token);
        let value = pipeline.probe.probe(&ctx).await;
        timer.abort();

        metrics::counter!("monitor_probe_total", &labels).increment(1);

        if token.is_cancelled() {
            return;
        }

        let value = match &pipeline.filter {
            Some(filter) => filter.lock().expect("filter mutex poisoned").put(value),
            None => value,
        };

        let in_band = !value.is_nan() && value >= monitor.min && value <= monitor.max;

        if !in_band {
            if failed_at.is_none() {
                failed_at = Some(Instant::now());
                monitor.failing.store(true, Ordering::Relaxed);
                warn!(monitor = %monitor.name, value, "monitor entered failing state");
                metrics::counter!("monitor_fail_total", &labels).increment(1);
                for action in &pipeline.actions {
                    if let Err(e) = action.fail(&monitor.name, value).await {
                        error!(monitor = %monitor.name, error = %e, "fail action errored");
                        metrics::counter!("monitor_action_error_total", &labels).increment(1);
                    }
                }
            }
        } else if let Some(since) = failed_at.take() {
            let duration = since.elapsed();
            monitor.failing.store(false, Ordering::Relaxed);
            warn!(monitor = %monitor.name, duration_secs = duration.as_secs_f64(), "monitor recovered");
            metrics::counter!("monitor_recover_total", &labels).increment(1);
            for action in &pipeline.actions {
                if let Err(e) = action.recover(&monitor.name, duration).await {
                    error!(monitor = %monitor.name, error = %e, "recover action errored");
                    metrics::counter!("monitor_action_error_total", &labels).increment(1);
                }
            }
        }

        tokio::select! {
            _ = token.cancelled() => return,
            _ = &mut sleep => {}
        }
    }
}
