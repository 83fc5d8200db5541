//! Per-player tap admission.
//!
//! A fixed one-second bucket: the count resets whenever the wall-clock second changes. A burst
//! straddling a second boundary can therefore admit up to twice the cap.

/// The second a player last tapped in and how many taps were admitted during it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TapWindow {
    pub second: u64,
    pub used: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Admission {
    pub accepted: u32,
    pub rejected: u32,
}

impl Admission {
    /// Nothing was admitted.
    pub fn throttled(&self) -> bool {
        self.accepted == 0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TapThrottler {
    cap: u32,
}

impl TapThrottler {
    pub fn new(cap: u32) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> u32 {
        self.cap
    }

    /// Admits up to the remaining budget of `current_second` and advances `window`.
    pub fn admit(&self, window: &mut TapWindow, requested: u32, current_second: u64) -> Admission {
        let used = if window.second == current_second {
            window.used
        } else {
            0
        };
        let allowed = self.cap.saturating_sub(used);
        let accepted = requested.min(allowed);
        let rejected = requested - accepted;

        window.second = current_second;
        window.used = used + accepted;

        Admission { accepted, rejected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_second_accumulates() {
        let throttler = TapThrottler::new(10);
        let mut window = TapWindow::default();

        let first = throttler.admit(&mut window, 7, 100);
        assert_eq!(first, Admission { accepted: 7, rejected: 0 });
        assert!(!first.throttled());

        let second = throttler.admit(&mut window, 5, 100);
        assert_eq!(second, Admission { accepted: 3, rejected: 2 });
        assert!(!second.throttled());

        let third = throttler.admit(&mut window, 1, 100);
        assert_eq!(third, Admission { accepted: 0, rejected: 1 });
        assert!(third.throttled());
        assert_eq!(window, TapWindow { second: 100, used: 10 });
    }

    #[test]
    fn test_new_second_resets_budget() {
        let throttler = TapThrottler::new(10);
        let mut window = TapWindow { second: 100, used: 10 };

        let admission = throttler.admit(&mut window, 12, 101);
        assert_eq!(admission, Admission { accepted: 10, rejected: 2 });
        assert_eq!(window, TapWindow { second: 101, used: 10 });
    }

    #[test]
    fn test_cumulative_never_exceeds_cap() {
        let throttler = TapThrottler::new(10);
        let mut window = TapWindow::default();
        let mut total = 0;
        for requested in [3, 1, 50, 2, 9] {
            total += throttler.admit(&mut window, requested, 5).accepted;
        }
        assert_eq!(total, 10);
    }

    #[test]
    fn test_zero_cap_is_clamped() {
        let throttler = TapThrottler::new(0);
        assert_eq!(throttler.cap(), 1);
        let mut window = TapWindow::default();
        assert_eq!(throttler.admit(&mut window, 3, 1).accepted, 1);
    }

    #[test]
    fn test_stale_overfull_window_is_ignored() {
        // A window from an earlier second never blocks the current one.
        let throttler = TapThrottler::new(10);
        let mut window = TapWindow { second: 1, used: 40 };
        assert_eq!(throttler.admit(&mut window, 4, 2).accepted, 4);
    }
}
