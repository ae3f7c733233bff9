//! Deadline-Abstraktion für tick-basierte Zeitprüfungen
//!
//! Zeitstempel sind Millisekunden seit Boot, geliefert vom Scheduler.

/// Vergangene Zeit seit `since`; rückwärts laufende Zeit zählt als 0
pub fn elapsed_since(now_ms: u64, since_ms: u64) -> u64 {
    now_ms.saturating_sub(since_ms)
}

/// Periodischer Trigger: fällig sobald mehr als `period_ms` seit dem
/// letzten Reset vergangen sind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    last_ms: u64,
}

impl Interval {
    pub const fn new(period_ms: u64, start_ms: u64) -> Self {
        Self {
            period_ms,
            last_ms: start_ms,
        }
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        elapsed_since(now_ms, self.last_ms) > self.period_ms
    }

    pub fn reset(&mut self, now_ms: u64) {
        self.last_ms = now_ms;
    }

    /// Prüft und setzt in einem Schritt zurück
    pub fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.reset(now_ms);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_not_due_at_boundary() {
        let interval = Interval::new(1000, 0);
        assert!(!interval.is_due(1000));
        assert!(interval.is_due(1001));
    }

    #[test]
    fn test_interval_poll_resets() {
        let mut interval = Interval::new(1000, 0);
        assert!(interval.poll(1500));
        assert!(!interval.poll(2000));
        assert!(interval.poll(2501));
    }

    #[test]
    fn test_elapsed_since_clock_going_backwards() {
        assert_eq!(elapsed_since(10, 20), 0);
        assert_eq!(elapsed_since(30, 20), 10);
    }
}
