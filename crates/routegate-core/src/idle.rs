//! Idle-time scheduling capability
//!
//! The prefetch scheduler defers background loads until the host reports
//! that it is idle, bounded by a timeout hint. Hosts that cannot report
//! idleness get a fixed timer delay instead. The choice is made once, at
//! construction, through [`IdleStrategy`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Delay substituted when no idle primitive is available
pub const FALLBACK_DELAY: Duration = Duration::from_millis(200);

/// Why an idle wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdleWake {
    /// Host reported idle
    Idle,
    /// Timeout hint elapsed before the host went idle
    TimedOut,
    /// Fixed fallback delay elapsed
    Fallback,
}

/// Suspends until the execution context is otherwise idle
#[async_trait::async_trait]
pub trait IdleScheduler: Send + Sync + fmt::Debug {
    /// Resolve once idle, or once `timeout_hint` has elapsed
    async fn wait_idle(&self, timeout_hint: Duration) -> IdleWake;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Host-side handle for publishing idleness
///
/// Cloning shares the same underlying state.
#[derive(Debug, Clone)]
pub struct IdleSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl IdleSignal {
    /// Create signal, initially busy
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Publish idle state
    #[inline]
    pub fn set_idle(&self, idle: bool) {
        self.tx.send_replace(idle);
    }

    /// Current idle state
    #[inline]
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for IdleSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Idle scheduling driven by the host's [`IdleSignal`]
#[derive(Debug, Clone)]
pub struct HostIdle {
    signal: IdleSignal,
}

impl HostIdle {
    /// Create from host signal
    #[inline]
    #[must_use]
    pub fn new(signal: IdleSignal) -> Self {
        Self { signal }
    }
}

#[async_trait::async_trait]
impl IdleScheduler for HostIdle {
    async fn wait_idle(&self, timeout_hint: Duration) -> IdleWake {
        let mut rx = self.signal.subscribe();
        let waited = tokio::time::timeout(timeout_hint, async {
            rx.wait_for(|idle| *idle).await.is_ok()
        })
        .await;

        match waited {
            Ok(_) => IdleWake::Idle,
            Err(_) => IdleWake::TimedOut,
        }
    }

    fn name(&self) -> &'static str {
        "host-idle"
    }
}

/// Fixed-delay substitute for hosts without an idle primitive
///
/// The timeout hint is ignored; every wait lasts exactly `delay`.
#[derive(Debug, Clone, Copy)]
pub struct TimerFallback {
    delay: Duration,
}

impl TimerFallback {
    /// Create with delay
    #[inline]
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Configured delay
    #[inline]
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for TimerFallback {
    fn default() -> Self {
        Self::new(FALLBACK_DELAY)
    }
}

#[async_trait::async_trait]
impl IdleScheduler for TimerFallback {
    async fn wait_idle(&self, _timeout_hint: Duration) -> IdleWake {
        tokio::time::sleep(self.delay).await;
        IdleWake::Fallback
    }

    fn name(&self) -> &'static str {
        "timer-fallback"
    }
}

/// Idle capability selected at construction
#[derive(Debug, Clone)]
pub enum IdleStrategy {
    /// Host publishes idleness
    Host(IdleSignal),
    /// No idle primitive; wait a fixed delay
    Timer(Duration),
}

impl IdleStrategy {
    /// Pick host idleness when available, the timer otherwise
    #[must_use]
    pub fn select(host: Option<IdleSignal>, fallback_delay: Duration) -> Self {
        match host {
            Some(signal) => Self::Host(signal),
            None => Self::Timer(fallback_delay),
        }
    }

    /// Timer with the default [`FALLBACK_DELAY`]
    #[inline]
    #[must_use]
    pub fn fallback() -> Self {
        Self::Timer(FALLBACK_DELAY)
    }

    /// Build the scheduler
    #[must_use]
    pub fn into_scheduler(self) -> Arc<dyn IdleScheduler> {
        let scheduler: Arc<dyn IdleScheduler> = match self {
            Self::Host(signal) => Arc::new(HostIdle::new(signal)),
            Self::Timer(delay) => Arc::new(TimerFallback::new(delay)),
        };
        tracing::debug!(idle = scheduler.name(), "idle capability selected");
        scheduler
    }
}

impl From<IdleStrategy> for Arc<dyn IdleScheduler> {
    fn from(value: IdleStrategy) -> Self {
        value.into_scheduler()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn host_idle_resolves_when_already_idle() {
        let signal = IdleSignal::new();
        signal.set_idle(true);
        let idle = HostIdle::new(signal);

        let start = Instant::now();
        assert_eq!(idle.wait_idle(Duration::from_secs(2)).await, IdleWake::Idle);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn host_idle_times_out_when_busy() {
        let idle = HostIdle::new(IdleSignal::new());

        let start = Instant::now();
        assert_eq!(
            idle.wait_idle(Duration::from_millis(500)).await,
            IdleWake::TimedOut
        );
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn host_idle_wakes_on_signal() {
        let signal = IdleSignal::new();
        let idle = HostIdle::new(signal.clone());

        let publisher = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            signal.set_idle(true);
        });

        let start = Instant::now();
        assert_eq!(idle.wait_idle(Duration::from_secs(2)).await, IdleWake::Idle);
        assert!(start.elapsed() < Duration::from_secs(2));
        publisher.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fallback_ignores_hint() {
        let timer = TimerFallback::default();

        let start = Instant::now();
        assert_eq!(timer.wait_idle(Duration::from_secs(10)).await, IdleWake::Fallback);
        let elapsed = start.elapsed();
        assert!(elapsed >= FALLBACK_DELAY);
        assert!(elapsed < Duration::from_secs(10));
    }

    #[test]
    fn strategy_selection() {
        let host = IdleStrategy::select(Some(IdleSignal::new()), FALLBACK_DELAY);
        assert_eq!(host.into_scheduler().name(), "host-idle");

        let timer = IdleStrategy::select(None, FALLBACK_DELAY);
        assert_eq!(timer.into_scheduler().name(), "timer-fallback");
    }

    #[test]
    fn signal_state_is_shared() {
        let signal = IdleSignal::new();
        let clone = signal.clone();
        assert!(!signal.is_idle());
        clone.set_idle(true);
        assert!(signal.is_idle());
    }
}
