use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::registry::Registry;

/// The context passed to every probe invocation.
///
/// It always carries a deadline (`now + timeout` of the owning monitor) and
/// a cancellation signal that fires either when that deadline elapses or
/// when the owning monitor is stopped. A well-behaved probe races its work
/// against [`ProbeContext::cancelled`] and returns promptly when it fires.
#[derive(Clone)]
pub struct ProbeContext {
    deadline: Instant,
    token: CancellationToken,
}

impl ProbeContext {
    pub fn new(deadline: Instant, token: CancellationToken) -> Self {
        Self { deadline, token }
    }

    /// The instant by which the probe is expected to have returned.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Resolves once the deadline has elapsed or the monitor was stopped.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// A configured probe: something that, invoked on a schedule, produces a
/// float describing the state of an external resource.
///
/// By convention `0.0` means healthy and `1.0` means failed, but any value
/// compared against the monitor's acceptance band is valid.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Produce one sample. Must return promptly once `ctx.cancelled()`
    /// resolves; the returned value is discarded in that case.
    async fn probe(&self, ctx: &ProbeContext) -> f64;

    /// A short human-readable description, used in logs.
    fn describe(&self) -> String;
}

pub type ProbeRegistry = Registry<dyn Prober>;

pub fn new_registry() -> ProbeRegistry {
    Registry::new("probe")
}
