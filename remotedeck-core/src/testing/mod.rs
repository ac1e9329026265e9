//! Connection reachability testing
//!
//! A best-effort TCP connect to `host:port` with a fixed timeout. The probe
//! says nothing about whether the remote service or credentials work.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::debug;

use crate::models::ConnectionProfile;

/// Default probe timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a reachability probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionTestResult {
    pub success: bool,
    /// Elapsed time in milliseconds
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub details: String,
}

/// TCP reachability tester
#[derive(Debug, Clone, Copy)]
pub struct ConnectionTester {
    timeout: Duration,
}

impl ConnectionTester {
    /// Creates a tester with the default 5 second timeout
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the probe timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probes `profile.host:profile.port`
    ///
    /// Always resolves within the timeout; failures are reported in the
    /// result.
    pub async fn test(&self, profile: &ConnectionProfile) -> ConnectionTestResult {
        self.probe(&profile.host, profile.port).await
    }

    /// Probes an address; `host` may be a name, IPv4 or bare IPv6 literal
    pub async fn probe(&self, host: &str, port: u16) -> ConnectionTestResult {
        self.probe_with(host, port, TcpStream::connect((host, port)))
            .await
    }

    async fn probe_with<C, S>(&self, host: &str, port: u16, connect: C) -> ConnectionTestResult
    where
        C: Future<Output = std::io::Result<S>>,
    {
        let target = display_target(host, port);
        let started = Instant::now();
        let result = timeout(self.timeout, connect).await;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let error = match result {
            Ok(Ok(_stream)) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("Connection timed out or port unreachable".to_string()),
        };
        debug!(%target, response_time_ms, ok = error.is_none(), "Reachability probe");

        match error {
            None => ConnectionTestResult {
                success: true,
                response_time_ms,
                error: None,
                details: format!("Host {target} reachable"),
            },
            Some(error) => ConnectionTestResult {
                success: false,
                response_time_ms,
                error: Some(error),
                details: format!("Cannot connect to {target}"),
            },
        }
    }

    /// Probes many profiles concurrently, results in input order
    pub async fn test_batch(&self, profiles: &[ConnectionProfile]) -> Vec<ConnectionTestResult> {
        join_all(profiles.iter().map(|profile| self.test(profile))).await
    }
}

/// `host:port`, with IPv6 literals bracketed
fn display_target(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

impl Default for ConnectionTester {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectionType;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_reachable_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let result = ConnectionTester::new().probe("127.0.0.1", port).await;
        assert!(result.success);
        assert!(result.error.is_none());
        assert_eq!(result.details, format!("Host 127.0.0.1:{port} reachable"));
    }

    #[tokio::test]
    async fn test_closed_port_fails_within_timeout() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let tester = ConnectionTester::new().with_timeout(Duration::from_millis(500));

        let started = Instant::now();
        let result = tester.probe("127.0.0.1", port).await;
        assert!(!result.success);
        assert!(result.error.is_some());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_hanging_connect_times_out() {
        let tester = ConnectionTester::new().with_timeout(Duration::from_millis(50));
        let result = tester
            .probe_with(
                "10.255.255.1",
                22,
                std::future::pending::<std::io::Result<TcpStream>>(),
            )
            .await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Connection timed out or port unreachable")
        );
        assert!(result.response_time_ms >= 50);
        assert_eq!(result.details, "Cannot connect to 10.255.255.1:22");
    }

    #[tokio::test]
    async fn test_ipv6_literal() {
        assert_eq!(display_target("::1", 22), "[::1]:22");
        assert_eq!(display_target("db.local", 22), "db.local:22");

        // Hosts without IPv6 loopback cannot run the rest
        let Ok(listener) = TcpListener::bind("[::1]:0").await else {
            return;
        };
        let port = listener.local_addr().unwrap().port();
        let result = ConnectionTester::new().probe("::1", port).await;
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.details, format!("Host [::1]:{port} reachable"));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().port();
        let profiles = vec![
            ConnectionProfile::new("open", ConnectionType::Ssh, "127.0.0.1", open),
            ConnectionProfile::new("bad", ConnectionType::Ssh, "host.invalid", 22),
        ];

        let results = ConnectionTester::new()
            .with_timeout(Duration::from_secs(2))
            .test_batch(&profiles)
            .await;
        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
    }
}
