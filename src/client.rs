//! Telnet client for the DX cluster session.
//!
//! Handles the TCP connection to the cluster, the call-sign login and
//! session-configuration commands, and the read loop with its keepalive and
//! watchdog timers. Lines are streamed to the consumer over a channel; every
//! failure path ends in a fixed-delay reconnect.

use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info};

/// Default DX cluster port.
pub const DEFAULT_PORT: u16 = 7373;

/// Session-configuration commands sent in order after login: skimmer spots,
/// FT8 spots, announcements, and the structured spot format.
const SESSION_COMMANDS: &[&str] = &["set/skimmer", "set/ft8", "set/announce on", "set/ve7cc 1"];

/// Harmless status request used to keep an idle session alive.
const KEEPALIVE_COMMAND: &str = "sh/dx 1";

/// Pause between the login line and the session commands, giving the
/// cluster time to accept the call sign.
const LOGIN_SETTLE: Duration = Duration::from_secs(1);

/// Failures of the cluster session.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),

    #[error("connection closed by remote")]
    ConnectionClosed,

    #[error("no inbound activity for {0:?}, forcing reconnect")]
    Idle(Duration),
}

/// Configuration for the cluster client.
#[derive(Debug, Clone)]
pub struct ClusterClientConfig {
    /// Hostname of the cluster node.
    pub host: String,

    /// Port number.
    pub port: u16,

    /// Operator call sign sent as the login line.
    pub callsign: String,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Bound on each individual line read.
    pub read_timeout: Duration,

    /// Idle time after which a keepalive command is sent.
    pub keepalive_after: Duration,

    /// Idle time after which the session is torn down and reconnected.
    pub watchdog_after: Duration,

    /// Whether to automatically reconnect on disconnect.
    pub auto_reconnect: bool,

    /// Fixed delay between reconnection attempts.
    pub reconnect_delay: Duration,
}

impl Default for ClusterClientConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            callsign: "NOCALL".to_string(),
            connect_timeout: Duration::from_secs(60),
            read_timeout: Duration::from_secs(60),
            keepalive_after: Duration::from_secs(600),
            watchdog_after: Duration::from_secs(900),
            auto_reconnect: true,
            reconnect_delay: Duration::from_secs(10),
        }
    }
}

impl ClusterClientConfig {
    /// Create a new configuration with the given callsign.
    pub fn with_callsign(callsign: impl Into<String>) -> Self {
        Self {
            callsign: callsign.into(),
            ..Default::default()
        }
    }

    /// Set the host and port.
    pub fn with_server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }
}

/// Events from the cluster client.
#[derive(Debug)]
pub enum ClusterEvent {
    /// A line was received from the cluster.
    Line(String),

    /// Session established and configured.
    Connected,

    /// Session was lost.
    Disconnected(String),

    /// An error occurred.
    Error(String),
}

/// What an idle read iteration should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdleAction {
    Wait,
    Keepalive,
    Reconnect,
}

/// Evaluate the keepalive and watchdog timers after a read timeout.
///
/// The watchdog arms off inbound activity only; sending a keepalive must not
/// disarm it, otherwise a half-dead session that still accepts writes would
/// never be torn down.
pub(crate) fn idle_action(
    now: Instant,
    last_line: Instant,
    last_keepalive: Instant,
    keepalive_after: Duration,
    watchdog_after: Duration,
) -> IdleAction {
    let idle = now.duration_since(last_line);
    if idle >= watchdog_after {
        return IdleAction::Reconnect;
    }
    if idle >= keepalive_after && now.duration_since(last_keepalive) >= keepalive_after {
        return IdleAction::Keepalive;
    }
    IdleAction::Wait
}

/// Async DX cluster telnet client.
pub struct ClusterClient {
    config: ClusterClientConfig,
}

impl ClusterClient {
    /// Create a new cluster client with the given configuration.
    pub fn new(config: ClusterClientConfig) -> Self {
        Self { config }
    }

    /// Connect to the cluster and start streaming lines.
    ///
    /// Returns a receiver channel of [`ClusterEvent`]s. The connection loop
    /// runs in a background task and reconnects on its own.
    pub async fn connect(self) -> mpsc::Receiver<ClusterEvent> {
        let (tx, rx) = mpsc::channel(1000);

        tokio::spawn(async move {
            self.run_connection_loop(tx).await;
        });

        rx
    }

    /// Run the main connection loop with fixed-backoff reconnect.
    async fn run_connection_loop(self, tx: mpsc::Sender<ClusterEvent>) {
        loop {
            match self.connect_and_stream(&tx).await {
                Ok(()) => {
                    info!("event receiver dropped, stopping connection loop");
                    break;
                }
                Err(e) => {
                    error!("cluster session failed: {}", e);
                    let _ = tx.send(ClusterEvent::Error(e.to_string())).await;
                }
            }

            let _ = tx
                .send(ClusterEvent::Disconnected("session lost".to_string()))
                .await;

            if !self.config.auto_reconnect {
                break;
            }

            info!(
                "reconnecting in {} seconds...",
                self.config.reconnect_delay.as_secs()
            );
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    /// Run one session: connect, log in, configure, then stream lines until
    /// a transport failure or the watchdog fires.
    ///
    /// `Ok(())` means the event receiver went away and the loop should stop.
    async fn connect_and_stream(&self, tx: &mpsc::Sender<ClusterEvent>) -> Result<(), ClusterError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("connecting to DX cluster {}...", addr);

        let stream = timeout(self.config.connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| ClusterError::ConnectTimeout(self.config.connect_timeout))??;

        info!("connected to {}", addr);

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut line_buf = String::with_capacity(256);

        // Login, settle, then session configuration.
        writer
            .write_all(format!("{}\n", self.config.callsign).as_bytes())
            .await?;
        writer.flush().await?;
        tokio::time::sleep(LOGIN_SETTLE).await;
        for cmd in SESSION_COMMANDS {
            writer.write_all(format!("{cmd}\n").as_bytes()).await?;
        }
        writer.flush().await?;

        let _ = tx.send(ClusterEvent::Connected).await;

        let mut last_line = Instant::now();
        let mut last_keepalive = last_line;

        loop {
            line_buf.clear();

            match timeout(self.config.read_timeout, reader.read_line(&mut line_buf)).await {
                Ok(Ok(0)) => {
                    return Err(ClusterError::ConnectionClosed);
                }
                Ok(Ok(_n)) => {
                    last_line = Instant::now();
                    let line = line_buf.trim_end();
                    if tx.send(ClusterEvent::Line(line.to_string())).await.is_err() {
                        // Receiver dropped
                        return Ok(());
                    }
                }
                Ok(Err(e)) => {
                    return Err(ClusterError::Transport(e));
                }
                Err(_) => {
                    let now = Instant::now();
                    match idle_action(
                        now,
                        last_line,
                        last_keepalive,
                        self.config.keepalive_after,
                        self.config.watchdog_after,
                    ) {
                        IdleAction::Reconnect => {
                            return Err(ClusterError::Idle(now.duration_since(last_line)));
                        }
                        IdleAction::Keepalive => {
                            debug!(
                                "idle for {:?}, sending keepalive",
                                now.duration_since(last_line)
                            );
                            writer
                                .write_all(format!("{KEEPALIVE_COMMAND}\n").as_bytes())
                                .await?;
                            writer.flush().await?;
                            last_keepalive = now;
                        }
                        IdleAction::Wait => {}
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClusterClientConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.callsign, "NOCALL");
        assert!(config.auto_reconnect);
        assert!(config.keepalive_after < config.watchdog_after);
    }

    #[test]
    fn test_config_builder() {
        let config =
            ClusterClientConfig::with_callsign("IK0XYZ").with_server("cluster.example.net", 7300);

        assert_eq!(config.callsign, "IK0XYZ");
        assert_eq!(config.host, "cluster.example.net");
        assert_eq!(config.port, 7300);
    }

    #[test]
    fn test_idle_action_below_keepalive_waits() {
        let t0 = Instant::now();
        let keepalive = Duration::from_secs(600);
        let watchdog = Duration::from_secs(900);

        let action = idle_action(t0 + Duration::from_secs(300), t0, t0, keepalive, watchdog);
        assert_eq!(action, IdleAction::Wait);
    }

    #[test]
    fn test_idle_action_keepalive_due() {
        let t0 = Instant::now();
        let keepalive = Duration::from_secs(600);
        let watchdog = Duration::from_secs(900);

        let action = idle_action(t0 + Duration::from_secs(600), t0, t0, keepalive, watchdog);
        assert_eq!(action, IdleAction::Keepalive);
    }

    #[test]
    fn test_idle_action_keepalive_not_repeated() {
        let t0 = Instant::now();
        let keepalive = Duration::from_secs(600);
        let watchdog = Duration::from_secs(900);

        // A keepalive already went out at +600s; at +700s another is not due.
        let action = idle_action(
            t0 + Duration::from_secs(700),
            t0,
            t0 + Duration::from_secs(600),
            keepalive,
            watchdog,
        );
        assert_eq!(action, IdleAction::Wait);
    }

    #[test]
    fn test_idle_action_watchdog_fires_despite_keepalive() {
        let t0 = Instant::now();
        let keepalive = Duration::from_secs(600);
        let watchdog = Duration::from_secs(900);

        // Keepalive went out at +600s but nothing came back; the watchdog
        // still fires at +900s of inbound silence.
        let action = idle_action(
            t0 + Duration::from_secs(900),
            t0,
            t0 + Duration::from_secs(600),
            keepalive,
            watchdog,
        );
        assert_eq!(action, IdleAction::Reconnect);
    }

    #[tokio::test]
    async fn test_watchdog_forces_disconnect_after_silence() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // A server that greets once and then goes silent while keeping the
        // socket open, so only the watchdog can end the session.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"Welcome to the test cluster\n")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(socket);
        });

        let config = ClusterClientConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            callsign: "N0CALL".to_string(),
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_millis(50),
            keepalive_after: Duration::from_millis(150),
            watchdog_after: Duration::from_millis(400),
            auto_reconnect: false,
            reconnect_delay: Duration::from_millis(10),
        };

        let client = ClusterClient::new(config);
        let mut events = client.connect().await;

        let mut saw_connected = false;
        let mut saw_disconnect = false;
        while let Some(event) = events.recv().await {
            match event {
                ClusterEvent::Connected => saw_connected = true,
                ClusterEvent::Disconnected(_) => {
                    saw_disconnect = true;
                    break;
                }
                _ => {}
            }
        }

        assert!(saw_connected);
        assert!(saw_disconnect);
    }
}
