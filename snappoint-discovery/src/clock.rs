//! Time and cancellation seams for the ingestion loop.
//!
//! Provider pacing waits go through a [`Clock`] so tests can advance virtual
//! time instead of sleeping. An [`IngestBudget`] bounds the loop with an
//! optional deadline and a shared [`CancellationToken`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of the current instant and of blocking waits.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> Instant;

    /// Block for `duration`.
    fn sleep(&self, duration: Duration);
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Wall-clock time with real thread sleeps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock whose `sleep` advances time instantly.
///
/// Every requested sleep is recorded for later inspection.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    state: Mutex<ManualState>,
}

#[derive(Debug, Default)]
struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock frozen at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(ManualState::default()),
        }
    }

    /// Move time forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        let mut state = self.lock();
        state.elapsed = state.elapsed.saturating_add(duration);
    }

    /// Total virtual time elapsed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Sleeps requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let elapsed = self.lock().elapsed;
        self.origin.checked_add(elapsed).unwrap_or(self.origin)
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.lock();
        state.elapsed = state.elapsed.saturating_add(duration);
        state.sleeps.push(duration);
    }
}

/// Shared flag used to stop an ingestion run between pages.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Why an [`IngestBudget`] refused further work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetExhausted {
    /// The token was cancelled.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

/// Upper bound on how long an ingestion run may keep paging.
#[derive(Debug, Clone, Default)]
pub struct IngestBudget {
    deadline: Option<Instant>,
    cancel: CancellationToken,
}

impl IngestBudget {
    /// No deadline and a fresh cancellation token.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Stop once `deadline` has passed.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Observe `cancel` between pages.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The configured deadline.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fail when cancelled or when `now` has reached the deadline.
    pub fn check(&self, now: Instant) -> Result<(), BudgetExhausted> {
        if self.cancel.is_cancelled() {
            return Err(BudgetExhausted::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            return Err(BudgetExhausted::DeadlineExceeded);
        }
        Ok(())
    }

    /// Shorten `wait` so that it ends no later than the deadline.
    #[must_use]
    pub fn clamp_wait(&self, now: Instant, wait: Duration) -> Duration {
        self.deadline
            .map_or(wait, |deadline| wait.min(deadline.saturating_duration_since(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn manual_clock_records_sleeps() {
        let clock = ManualClock::new();
        let start = clock.now();
        clock.sleep(Duration::from_secs(2));
        clock.sleep(Duration::from_secs(2));
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(4));
        assert_eq!(clock.sleeps(), [Duration::from_secs(2); 2]);
    }

    #[rstest]
    fn advance_does_not_record_a_sleep() {
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.elapsed(), Duration::from_secs(5));
        assert!(clock.sleeps().is_empty());
    }

    #[rstest]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let budget = IngestBudget::unbounded().with_cancellation(token.clone());
        assert!(budget.check(Instant::now()).is_ok());
        token.cancel();
        assert_eq!(
            budget.check(Instant::now()),
            Err(BudgetExhausted::Cancelled)
        );
    }

    #[rstest]
    fn deadline_is_inclusive() {
        let clock = ManualClock::new();
        let budget = IngestBudget::unbounded().with_deadline(clock.now() + Duration::from_secs(3));
        clock.advance(Duration::from_secs(2));
        assert!(budget.check(clock.now()).is_ok());
        clock.advance(Duration::from_secs(1));
        assert_eq!(
            budget.check(clock.now()),
            Err(BudgetExhausted::DeadlineExceeded)
        );
    }

    #[rstest]
    #[case(None, Duration::from_secs(2))]
    #[case(Some(Duration::from_secs(5)), Duration::from_secs(2))]
    #[case(Some(Duration::from_millis(500)), Duration::from_millis(500))]
    #[case(Some(Duration::ZERO), Duration::ZERO)]
    fn waits_are_clamped_to_the_deadline(
        #[case] remaining: Option<Duration>,
        #[case] expected: Duration,
    ) {
        let now = Instant::now();
        let budget = remaining.map_or_else(IngestBudget::unbounded, |left| {
            IngestBudget::unbounded().with_deadline(now + left)
        });
        assert_eq!(budget.clamp_wait(now, Duration::from_secs(2)), expected);
    }
}
