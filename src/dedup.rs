//! Duplicate-notification suppression.
//!
//! One notification per watched call per window, however many matching lines
//! or targets arrive in between. Time is injected by the caller so the gate
//! is deterministic under test.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// How many windows an idle entry survives before `sweep` drops it.
const SWEEP_WINDOWS: i32 = 4;

/// Rolling per-call cooldown keyed on the normalized call sign.
#[derive(Debug)]
pub struct DedupGate {
    window: Duration,
    last_sent: HashMap<String, DateTime<Utc>>,
}

impl DedupGate {
    /// Create a gate with the given window in minutes.
    pub fn new(window_minutes: u64) -> Self {
        Self {
            window: Duration::minutes(window_minutes as i64),
            last_sent: HashMap::new(),
        }
    }

    /// Decide whether a notification for this call may go out at `now`.
    ///
    /// Allows and records `now` when there is no record or the record is at
    /// least one window old. A suppressed call keeps its original record, so
    /// repeated suppressed spots cannot postpone the next allowed send.
    pub fn should_send(&mut self, normalized_call: &str, now: DateTime<Utc>) -> bool {
        if let Some(&last) = self.last_sent.get(normalized_call)
            && now - last < self.window
        {
            return false;
        }
        self.last_sent.insert(normalized_call.to_string(), now);
        true
    }

    /// Drop records old enough that they can no longer suppress anything.
    ///
    /// Keeps the map bounded over a long-running process.
    pub fn sweep(&mut self, now: DateTime<Utc>) {
        let horizon = self.window * SWEEP_WINDOWS;
        self.last_sent.retain(|_, last| now - *last < horizon);
    }

    /// Number of calls currently tracked.
    pub fn len(&self) -> usize {
        self.last_sent.len()
    }

    /// Whether no calls are tracked.
    pub fn is_empty(&self) -> bool {
        self.last_sent.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_first_send_is_allowed() {
        let mut gate = DedupGate::new(30);
        assert!(gate.should_send("VK3ABC", t0()));
    }

    #[test]
    fn test_suppressed_within_window_allowed_after() {
        let mut gate = DedupGate::new(30);
        assert!(gate.should_send("VK3ABC", t0()));
        assert!(!gate.should_send("VK3ABC", t0() + Duration::minutes(29)));
        assert!(gate.should_send("VK3ABC", t0() + Duration::minutes(31)));
    }

    #[test]
    fn test_suppression_does_not_refresh_record() {
        let mut gate = DedupGate::new(30);
        assert!(gate.should_send("VK3ABC", t0()));
        // Suppressed attempts right up to the edge must not push the window out.
        assert!(!gate.should_send("VK3ABC", t0() + Duration::minutes(15)));
        assert!(!gate.should_send("VK3ABC", t0() + Duration::minutes(29)));
        assert!(gate.should_send("VK3ABC", t0() + Duration::minutes(30)));
    }

    #[test]
    fn test_calls_are_independent() {
        let mut gate = DedupGate::new(30);
        assert!(gate.should_send("VK3ABC", t0()));
        assert!(gate.should_send("K1ABC", t0() + Duration::minutes(1)));
        assert!(!gate.should_send("VK3ABC", t0() + Duration::minutes(2)));
    }

    #[test]
    fn test_sweep_drops_stale_entries_only() {
        let mut gate = DedupGate::new(30);
        gate.should_send("OLD1", t0());
        gate.should_send("FRESH", t0() + Duration::minutes(110));
        assert_eq!(gate.len(), 2);

        // OLD1 is past four windows at t0+121min; FRESH is not.
        gate.sweep(t0() + Duration::minutes(121));
        assert_eq!(gate.len(), 1);
        assert!(!gate.should_send("FRESH", t0() + Duration::minutes(125)));
        assert!(gate.should_send("OLD1", t0() + Duration::minutes(125)));
    }
}
