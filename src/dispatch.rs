//! Per-line processing: classify, parse, match, dedup, notify.
//!
//! The dispatcher owns the dedup gate and the recipient list; the connection
//! layer only hands it raw lines. Time is injected so the whole pipeline can
//! run against a fabricated clock in tests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::classify::normalize_call;
use crate::dedup::DedupGate;
use crate::notifier::Notifier;
use crate::parser::{is_structured_line, parse_spot};
use crate::stats::WatchStats;
use crate::target::{Target, any_target_matches};

/// Routes each inbound line through the spot pipeline.
pub struct SpotDispatcher<N> {
    targets: Vec<Target>,
    recipients: Vec<String>,
    dedup: DedupGate,
    notifier: N,
    stats: Arc<WatchStats>,
}

impl<N: Notifier> SpotDispatcher<N> {
    /// Create a dispatcher over the configured targets and recipients.
    pub fn new(
        targets: Vec<Target>,
        recipients: Vec<String>,
        dedup: DedupGate,
        notifier: N,
        stats: Arc<WatchStats>,
    ) -> Self {
        Self {
            targets,
            recipients,
            dedup,
            notifier,
            stats,
        }
    }

    /// Process one line from the cluster session.
    ///
    /// Returns the number of recipients the notification reached. Structured
    /// lines run the full parse/match/dedup path; everything else is
    /// diagnostic output and only logged.
    pub async fn handle_line(&mut self, line: &str, now: DateTime<Utc>) -> usize {
        self.stats.record_line(line.len() as u64);

        let line = line.trim();
        if line.is_empty() {
            return 0;
        }
        if !is_structured_line(line) {
            self.stats.record_raw_line();
            debug!("cluster: {}", line);
            return 0;
        }

        let Some(spot) = parse_spot(line) else {
            self.stats.record_parse_anomaly();
            debug!("short spot record: {}", line);
            return 0;
        };
        self.stats.record_spot(&spot);

        if !any_target_matches(&self.targets, &spot) {
            return 0;
        }
        self.stats.record_match();

        let call = normalize_call(&spot.call);
        if !self.dedup.should_send(&call, now) {
            self.stats.record_suppressed();
            debug!("dedup: suppressed repeat notification for {}", call);
            return 0;
        }

        info!("spot matched: {}", spot);
        let text = spot.notification_text();
        let mut delivered = 0;
        for recipient in &self.recipients {
            match self.notifier.send(recipient, &text).await {
                Ok(()) => {
                    self.stats.record_notification();
                    delivered += 1;
                }
                Err(e) => {
                    self.stats.record_notify_failure();
                    warn!("notification to chat {} failed: {}", recipient, e);
                }
            }
        }
        delivered
    }

    /// Evict dedup records too old to suppress anything.
    pub fn sweep_dedup(&mut self, now: DateTime<Utc>) {
        let before = self.dedup.len();
        self.dedup.sweep(now);
        let dropped = before - self.dedup.len();
        if dropped > 0 {
            debug!("dedup sweep dropped {} stale entries", dropped);
        }
    }
}
