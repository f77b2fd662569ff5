//! A cancellable, resettable quiet-period timer.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// Fires once after `delay` has passed since the most recent
/// [`arm`](Debounce::arm).
///
/// Meant to be polled from a `tokio::select!` loop that owns it:
/// [`fired`](Debounce::fired) is cancel-safe, and an unarmed debounce never
/// completes. Dropping the owner drops the pending timer.
#[derive(Debug)]
pub(crate) struct Debounce {
    delay: Duration,
    deadline: Option<Pin<Box<Sleep>>>,
}

impl Debounce {
    pub(crate) fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Start the quiet period, or restart it if one is already pending.
    pub(crate) fn arm(&mut self) {
        let at = Instant::now() + self.delay;
        match self.deadline.as_mut() {
            Some(sleep) => sleep.as_mut().reset(at),
            None => self.deadline = Some(Box::pin(tokio::time::sleep_until(at))),
        }
    }

    /// Drop the pending deadline, if any.
    pub(crate) fn cancel(&mut self) {
        self.deadline = None;
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve when the armed deadline passes, disarming it.
    pub(crate) async fn fired(&mut self) {
        match self.deadline.as_mut() {
            Some(sleep) => {
                sleep.as_mut().await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let mut debounce = Debounce::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.arm();
        debounce.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(300));
        assert!(!debounce.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_extends_the_quiet_period() {
        let mut debounce = Debounce::new(Duration::from_millis(300));
        let start = Instant::now();
        debounce.arm();
        tokio::time::sleep(Duration::from_millis(200)).await;
        debounce.arm();
        debounce.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_debounce_never_fires() {
        let mut debounce = Debounce::new(Duration::from_millis(10));
        debounce.arm();
        debounce.cancel();
        assert!(!debounce.is_armed());

        let outcome = tokio::time::timeout(Duration::from_secs(5), debounce.fired()).await;
        assert!(outcome.is_err(), "cancelled debounce should stay pending");
    }

    #[tokio::test(start_paused = true)]
    async fn losing_a_select_keeps_the_deadline() {
        let mut debounce = Debounce::new(Duration::from_millis(100));
        let start = Instant::now();
        debounce.arm();

        tokio::select! {
            () = debounce.fired() => panic!("should not fire before the other branch"),
            () = tokio::time::sleep(Duration::from_millis(40)) => {}
        }
        assert!(debounce.is_armed());

        debounce.fired().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
