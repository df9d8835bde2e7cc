//! dx-watch - A DX cluster watcher that forwards matching spots to Telegram.
//!
//! This crate provides:
//! - An async telnet client for the cluster session, with keepalive and
//!   watchdog-driven reconnect
//! - A parser for VE7CC-format spot records
//! - Watch rules, duplicate suppression, and Telegram delivery
//!
//! # Example
//!
//! ```rust
//! use dx_watch::{classify, parser::parse_spot};
//!
//! let line = "CC^14074.0^VK3ABC^2024-01-01^10:00^FT8 CQ^W1AW";
//! let spot = parse_spot(line).expect("failed to parse spot");
//!
//! assert_eq!(spot.band, "20m");
//! assert_eq!(classify::normalize_call(&spot.call), "VK3ABC");
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod dedup;
pub mod dispatch;
pub mod metrics;
pub mod notifier;
pub mod parser;
pub mod spot;
pub mod stats;
pub mod target;

pub use client::{ClusterClient, ClusterClientConfig, ClusterError, ClusterEvent};
pub use config::{ChatIds, Config};
pub use dedup::DedupGate;
pub use dispatch::SpotDispatcher;
pub use notifier::{Notifier, NotifyError, TelegramNotifier};
pub use parser::{is_structured_line, parse_spot};
pub use spot::Spot;
pub use stats::{StatsSummary, WatchStats};
pub use target::{Target, any_target_matches};
