//! Simulation context implementing FaultContext for deterministic drills.

use async_trait::async_trait;
use faultline_env::{FaultContext, LogLevel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A side effect observed by the simulation context.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A suspension, stamped with the virtual time it started at.
    Slept { at: Duration, duration: Duration },

    /// A log record emitted on behalf of a route.
    Logged {
        at: Duration,
        level: LogLevel,
        route: String,
        message: String,
    },
}

/// Simulation context backed by a virtual clock and an event journal.
///
/// This implements `FaultContext` using:
/// - A virtual clock that sleeps advance instantly
/// - A fixed master seed
/// - A journal of every sleep and log record, for assertions
pub struct SimContext {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (nanoseconds since simulation start)
    virtual_time_ns: Arc<Mutex<u64>>,

    /// Every side effect, in the order it happened
    journal: Arc<Mutex<Vec<SimEvent>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl SimContext {
    /// Creates a new SimContext with the given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            virtual_time_ns: Arc::new(Mutex::new(0)),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates an Arc-wrapped context for sharing.
    pub fn shared(seed: u64) -> Arc<Self> {
        Arc::new(Self::new(seed))
    }

    /// Advances virtual time by the given duration, saturating at `u64::MAX` ns.
    pub fn advance_time(&self, duration: Duration) {
        let mut time = lock(&self.virtual_time_ns);
        *time = time.saturating_add(saturating_nanos(duration));
    }

    /// Moves virtual time forward to `deadline`; never moves it back.
    fn advance_to(&self, deadline: Duration) {
        let mut time = lock(&self.virtual_time_ns);
        *time = (*time).max(saturating_nanos(deadline));
    }

    /// Returns the current virtual time in nanoseconds.
    pub fn time_ns(&self) -> u64 {
        *lock(&self.virtual_time_ns)
    }

    /// Copy of the journal.
    pub fn journal(&self) -> Vec<SimEvent> {
        lock(&self.journal).clone()
    }

    /// Number of journal entries so far.
    pub fn journal_len(&self) -> usize {
        lock(&self.journal).len()
    }

    /// Journal entries recorded at or after `index`.
    pub fn events_since(&self, index: usize) -> Vec<SimEvent> {
        lock(&self.journal).iter().skip(index).cloned().collect()
    }

    /// Messages of every log record, in emission order.
    pub fn log_messages(&self) -> Vec<String> {
        lock(&self.journal)
            .iter()
            .filter_map(|event| match event {
                SimEvent::Logged { message, .. } => Some(message.clone()),
                SimEvent::Slept { .. } => None,
            })
            .collect()
    }

    /// Sum of every recorded sleep.
    pub fn total_slept(&self) -> Duration {
        lock(&self.journal)
            .iter()
            .map(|event| match event {
                SimEvent::Slept { duration, .. } => *duration,
                SimEvent::Logged { .. } => Duration::ZERO,
            })
            .sum()
    }
}

impl Clone for SimContext {
    fn clone(&self) -> Self {
        Self {
            seed: self.seed,
            virtual_time_ns: Arc::clone(&self.virtual_time_ns),
            journal: Arc::clone(&self.journal),
        }
    }
}

#[async_trait]
impl FaultContext for SimContext {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.time_ns())
    }

    async fn sleep(&self, duration: Duration) {
        let at = self.now();
        lock(&self.journal).push(SimEvent::Slept { at, duration });

        // Siblings polled in the same pass start their sleeps at `at` too
        tokio::task::yield_now().await;

        // Overlapping sleeps end at the latest deadline, they do not add up
        self.advance_to(at.checked_add(duration).unwrap_or(Duration::MAX));
    }

    fn emit_log(&self, level: LogLevel, route: &str, message: &str) {
        if level == LogLevel::None {
            return;
        }
        let at = self.now();
        lock(&self.journal).push(SimEvent::Logged {
            at,
            level,
            route: route.to_string(),
            message: message.to_string(),
        });
    }

    fn seed(&self) -> Option<u64> {
        Some(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_context_time() {
        let ctx = SimContext::new(42);
        assert_eq!(ctx.now(), Duration::ZERO);

        ctx.advance_time(Duration::from_secs(1));
        assert_eq!(ctx.now(), Duration::from_secs(1));

        ctx.advance_time(Duration::from_millis(500));
        assert_eq!(ctx.now(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_sleep_advances_virtual_clock() {
        let ctx = SimContext::new(42);
        ctx.sleep(Duration::from_secs(3600)).await;

        assert_eq!(ctx.now(), Duration::from_secs(3600));
        assert_eq!(
            ctx.journal(),
            vec![SimEvent::Slept {
                at: Duration::ZERO,
                duration: Duration::from_secs(3600)
            }]
        );
    }

    #[tokio::test]
    async fn test_huge_sleeps_saturate_the_clock() {
        let ctx = SimContext::new(42);
        let huge = Duration::from_millis(u64::MAX / 1000);

        ctx.sleep(huge).await;
        ctx.sleep(huge).await;
        ctx.advance_time(Duration::from_secs(1));

        assert_eq!(ctx.time_ns(), u64::MAX);
        assert_eq!(ctx.journal().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_sleeps_overlap() {
        let ctx = SimContext::new(42);
        tokio::join!(ctx.sleep(Duration::from_millis(30)), ctx.sleep(Duration::from_millis(50)));

        assert_eq!(ctx.now(), Duration::from_millis(50));
    }

    #[test]
    fn test_logs_are_journaled() {
        let ctx = SimContext::new(1);
        ctx.emit_log(LogLevel::Warning, "/orders", "first");
        ctx.emit_log(LogLevel::None, "/orders", "dropped");
        ctx.emit_log(LogLevel::Error, "*", "second");

        assert_eq!(ctx.log_messages(), vec!["first", "second"]);
        assert_eq!(ctx.events_since(1).len(), 1);
    }

    #[test]
    fn test_sim_context_seed() {
        let ctx = SimContext::new(12345);
        assert_eq!(ctx.seed(), Some(12345));
    }

    #[test]
    fn test_sim_context_clone_shares_state() {
        let ctx1 = SimContext::new(42);
        let ctx2 = ctx1.clone();

        ctx1.advance_time(Duration::from_secs(5));
        ctx1.emit_log(LogLevel::Information, "*", "shared");

        // Both should see the same time and journal
        assert_eq!(ctx1.now(), ctx2.now());
        assert_eq!(ctx2.log_messages(), vec!["shared"]);
    }
}
