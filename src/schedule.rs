//! Timing policies for rebuilding a surface: a quiet-window debouncer for
//! resize and option changes, and a bounded retry for surfaces measured
//! before the host finished its layout.

use std::time::{Duration, Instant};

pub const REBUILD_QUIET_WINDOW: Duration = Duration::from_millis(150);
pub const RETRY_INITIAL_DELAY: Duration = Duration::from_millis(50);
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Coalesces bursts of rebuild requests into one. Only the latest request
/// survives, and it fires once no newer request arrived for the quiet window.
#[derive(Clone, Debug)]
pub struct RebuildDebouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Default for RebuildDebouncer<T> {
    fn default() -> Self {
        Self::new(REBUILD_QUIET_WINDOW)
    }
}

impl<T> RebuildDebouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn request(&mut self, request: T, now: Instant) {
        self.pending = Some((request, now));
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(request, _)| request)
    }

    /// Time left until the pending request fires, if any.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, at)| self.window.saturating_sub(now.saturating_duration_since(*at)))
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) >= self.window);
        if !due {
            return None;
        }
        self.pending.take().map(|(request, _)| request)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl<T: Copy + PartialEq> RebuildDebouncer<T> {
    /// Requests `observed` when it differs from the pending request, or from
    /// `current` when nothing is pending. `force` requests it regardless.
    /// Returns whether a request was made. Repeating an unchanged value keeps
    /// the original quiet window running.
    pub fn request_if_changed(&mut self, observed: T, current: T, force: bool, now: Instant) -> bool {
        let baseline = self.pending().copied().unwrap_or(current);
        if !force && observed == baseline {
            return false;
        }
        self.request(observed, now);
        true
    }
}

#[derive(Clone, Debug)]
pub struct RetryBackoff {
    initial: Duration,
    max_attempts: u32,
    attempts: u32,
    due: Option<Instant>,
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(RETRY_INITIAL_DELAY, RETRY_MAX_ATTEMPTS)
    }
}

impl RetryBackoff {
    pub fn new(initial: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max_attempts,
            attempts: 0,
            due: None,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Delay before the next attempt: the initial delay doubled once per
    /// attempt already made.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        Some(self.initial * 2_u32.pow(self.attempts))
    }

    /// Arms the next attempt. Returns false once the attempt cap is reached.
    pub fn schedule(&mut self, now: Instant) -> bool {
        if self.due.is_some() {
            return true;
        }
        let Some(delay) = self.next_delay() else {
            return false;
        };
        self.attempts += 1;
        self.due = Some(now + delay);
        true
    }

    /// Consumes the armed attempt once its delay has passed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.due {
            Some(due) if now >= due => {
                self.due = None;
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.due = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_of_requests_fires_once_with_latest() {
        let start = Instant::now();
        let mut debouncer = RebuildDebouncer::default();
        for (step, width) in [100, 200, 300, 400, 500].into_iter().enumerate() {
            let now = start + Duration::from_millis(step as u64 * 30);
            debouncer.request(width, now);
            assert_eq!(debouncer.poll(now), None);
        }

        let last = start + Duration::from_millis(120);
        assert_eq!(debouncer.poll(last + Duration::from_millis(149)), None);
        assert_eq!(debouncer.poll(last + REBUILD_QUIET_WINDOW), Some(500));
        assert_eq!(debouncer.poll(last + Duration::from_secs(5)), None);
    }

    #[test]
    fn remaining_counts_down() {
        let start = Instant::now();
        let mut debouncer = RebuildDebouncer::default();
        assert_eq!(debouncer.remaining(start), None);
        debouncer.request((), start);
        assert_eq!(
            debouncer.remaining(start + Duration::from_millis(100)),
            Some(Duration::from_millis(50))
        );
        debouncer.cancel();
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn steady_size_never_requests() {
        let start = Instant::now();
        let mut debouncer = RebuildDebouncer::default();
        for frame in 0..20u64 {
            let now = start + Duration::from_millis(frame * 16);
            assert!(!debouncer.request_if_changed(800, 800, false, now));
            assert_eq!(debouncer.poll(now), None);
        }
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn repeated_frames_at_new_size_do_not_restart_window() {
        let start = Instant::now();
        let mut debouncer = RebuildDebouncer::default();
        assert!(debouncer.request_if_changed(900, 800, false, start));

        let mut fired = Vec::new();
        for frame in 1..=10u64 {
            let now = start + Duration::from_millis(frame * 16);
            assert!(!debouncer.request_if_changed(900, 800, false, now));
            fired.extend(debouncer.poll(now));
        }
        assert_eq!(fired, vec![900]);
    }

    #[test]
    fn forced_request_fires_at_unchanged_size() {
        let start = Instant::now();
        let mut debouncer = RebuildDebouncer::default();
        assert!(debouncer.request_if_changed(800, 800, true, start));
        assert_eq!(debouncer.poll(start + REBUILD_QUIET_WINDOW), Some(800));
    }

    #[test]
    fn retry_delays_double_until_cap() {
        let mut backoff = RetryBackoff::default();
        let mut now = Instant::now();
        let mut delays = Vec::new();
        while let Some(delay) = backoff.next_delay() {
            delays.push(delay.as_millis());
            assert!(backoff.schedule(now));
            assert!(!backoff.take_due(now));
            now += delay;
            assert!(backoff.take_due(now));
        }
        assert_eq!(delays, vec![50, 100, 200, 400, 800]);
        assert!(backoff.is_exhausted());
        assert!(!backoff.schedule(now));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(RETRY_INITIAL_DELAY));
    }
}
