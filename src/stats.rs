//! Statistics tracking for the watcher pipeline.
//!
//! Counts every stage a line can reach: received, classified as raw text,
//! parsed, matched, suppressed by dedup, and delivered (or not) to
//! recipients, with per-band and per-mode breakdowns.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::spot::Spot;

/// Thread-safe statistics collector for the watcher.
#[derive(Debug)]
pub struct WatchStats {
    /// Lines received from the cluster session
    pub lines_total: AtomicU64,

    /// Lines without the structured-spot prefix (diagnostic text)
    pub raw_lines: AtomicU64,

    /// Structured lines parsed into spots
    pub spots_parsed: AtomicU64,

    /// Structured lines that failed to parse (short records)
    pub parse_anomalies: AtomicU64,

    /// Spots that matched at least one target
    pub matches: AtomicU64,

    /// Matched spots suppressed by the dedup window
    pub suppressed: AtomicU64,

    /// Notifications delivered successfully
    pub notifications_sent: AtomicU64,

    /// Per-recipient delivery failures
    pub notify_failures: AtomicU64,

    /// Session reconnects observed
    pub reconnects: AtomicU64,

    /// Total bytes of raw input processed
    pub bytes_processed: AtomicU64,

    /// Parsed spots per band
    spots_by_band: RwLock<HashMap<String, u64>>,

    /// Parsed spots per mode
    spots_by_mode: RwLock<HashMap<String, u64>>,

    /// When stats collection started
    start_time: Instant,
}

impl WatchStats {
    /// Create a new statistics collector.
    pub fn new() -> Self {
        Self {
            lines_total: AtomicU64::new(0),
            raw_lines: AtomicU64::new(0),
            spots_parsed: AtomicU64::new(0),
            parse_anomalies: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            suppressed: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            notify_failures: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            bytes_processed: AtomicU64::new(0),
            spots_by_band: RwLock::new(HashMap::new()),
            spots_by_mode: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record a line received from the session.
    pub fn record_line(&self, bytes: u64) {
        self.lines_total.fetch_add(1, Ordering::Relaxed);
        self.bytes_processed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a diagnostic (non-spot) line.
    pub fn record_raw_line(&self) {
        self.raw_lines.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successfully parsed spot.
    pub fn record_spot(&self, spot: &Spot) {
        self.spots_parsed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut map) = self.spots_by_band.write() {
            *map.entry(spot.band.to_string()).or_insert(0) += 1;
        }
        if let Ok(mut map) = self.spots_by_mode.write() {
            *map.entry(spot.mode.to_string()).or_insert(0) += 1;
        }
    }

    /// Record a structured line that did not parse.
    pub fn record_parse_anomaly(&self) {
        self.parse_anomalies.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a spot that matched a target.
    pub fn record_match(&self) {
        self.matches.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a dedup suppression.
    pub fn record_suppressed(&self) {
        self.suppressed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a delivered notification.
    pub fn record_notification(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed delivery attempt.
    pub fn record_notify_failure(&self) {
        self.notify_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a session reconnect.
    pub fn record_reconnect(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the elapsed time since stats collection started.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Generate a summary report.
    pub fn summary(&self) -> StatsSummary {
        let spots_by_band = self
            .spots_by_band
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();
        let spots_by_mode = self
            .spots_by_mode
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();

        StatsSummary {
            elapsed_secs: self.elapsed().as_secs_f64(),
            lines_total: self.lines_total.load(Ordering::Relaxed),
            raw_lines: self.raw_lines.load(Ordering::Relaxed),
            spots_parsed: self.spots_parsed.load(Ordering::Relaxed),
            parse_anomalies: self.parse_anomalies.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            notifications_sent: self.notifications_sent.load(Ordering::Relaxed),
            notify_failures: self.notify_failures.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            bytes_processed: self.bytes_processed.load(Ordering::Relaxed),
            spots_by_band,
            spots_by_mode,
        }
    }
}

impl Default for WatchStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of collected statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub elapsed_secs: f64,
    pub lines_total: u64,
    pub raw_lines: u64,
    pub spots_parsed: u64,
    pub parse_anomalies: u64,
    pub matches: u64,
    pub suppressed: u64,
    pub notifications_sent: u64,
    pub notify_failures: u64,
    pub reconnects: u64,
    pub bytes_processed: u64,
    pub spots_by_band: HashMap<String, u64>,
    pub spots_by_mode: HashMap<String, u64>,
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f, "                 DX WATCH STATISTICS")?;
        writeln!(f, "═══════════════════════════════════════════════════════")?;
        writeln!(f)?;
        writeln!(f, "Runtime: {:.1}s", self.elapsed_secs)?;
        writeln!(f, "Lines received: {}", self.lines_total)?;
        writeln!(f, "Raw (non-spot) lines: {}", self.raw_lines)?;
        writeln!(f, "Spots parsed: {}", self.spots_parsed)?;
        writeln!(f, "Parse anomalies: {}", self.parse_anomalies)?;
        writeln!(f, "Target matches: {}", self.matches)?;
        writeln!(f, "Suppressed (dedup): {}", self.suppressed)?;
        writeln!(
            f,
            "Notifications: {} sent, {} failed",
            self.notifications_sent, self.notify_failures
        )?;
        writeln!(f, "Reconnects: {}", self.reconnects)?;
        writeln!(f, "Bytes processed: {} KB", self.bytes_processed / 1024)?;
        writeln!(f)?;

        if !self.spots_by_band.is_empty() {
            writeln!(f, "Spots by Band:")?;
            let mut bands: Vec<_> = self.spots_by_band.iter().collect();
            bands.sort_by(|a, b| b.1.cmp(a.1));
            for (band, count) in bands {
                writeln!(f, "  {}: {}", band, count)?;
            }
            writeln!(f)?;
        }

        if !self.spots_by_mode.is_empty() {
            writeln!(f, "Spots by Mode:")?;
            let mut modes: Vec<_> = self.spots_by_mode.iter().collect();
            modes.sort_by(|a, b| b.1.cmp(a.1));
            for (mode, count) in modes {
                writeln!(f, "  {}: {}", mode, count)?;
            }
        }

        Ok(())
    }
}
