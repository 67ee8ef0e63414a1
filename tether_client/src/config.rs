// Client configuration and endpoint parsing.
//
// The connection target arrives from the embedding application as a
// `scheme://host:port` string (the scheme names the socket protocol; the
// bundled transport speaks `tcp`). Parsing it is the one synchronous,
// fallible step of client construction — everything network-related after
// that is absorbed by the reconnect loop and never surfaces as an error.

use std::time::Duration;

use thiserror::Error;

/// Endpoint parse failure. A configuration error, reported at construction
/// time — unlike network conditions, which are never raised to the caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint `{0}`: expected scheme://host:port")]
    InvalidEndpoint(String),
    #[error("unsupported scheme `{0}`: the bundled transport speaks tcp")]
    UnsupportedScheme(String),
    #[error("invalid port in endpoint `{0}`")]
    InvalidPort(String),
}

/// A parsed `tcp://host:port` connection target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse a `scheme://host:port` string.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let Some((scheme, rest)) = text.split_once("://") else {
            return Err(ConfigError::InvalidEndpoint(text.into()));
        };
        if scheme != "tcp" {
            return Err(ConfigError::UnsupportedScheme(scheme.into()));
        }
        let Some((host, port)) = rest.rsplit_once(':') else {
            return Err(ConfigError::InvalidEndpoint(text.into()));
        };
        if host.is_empty() {
            return Err(ConfigError::InvalidEndpoint(text.into()));
        }
        let port = port
            .parse()
            .map_err(|_| ConfigError::InvalidPort(text.into()))?;
        Ok(Self::new(host, port))
    }

    /// `host:port` form for socket connection.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Tunables for a [`SyncClient`](crate::SyncClient).
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Connection target.
    pub endpoint: Endpoint,
    /// Room joined on every (re)connect.
    pub room_name: String,
    /// Cap on dial, handshake send, and graceful close. Zero disables the
    /// cap (OS defaults apply).
    pub io_timeout: Duration,
    /// Upper bound on one send-duty wait; the duty re-checks session state
    /// at least this often even with an idle queue.
    pub wake_interval: Duration,
    /// Pause between reconnect attempts. Zero retries immediately.
    pub reconnect_delay: Duration,
}

impl ClientConfig {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::new("127.0.0.1", 3000),
            room_name: "broadcast".into(),
            io_timeout: Duration::from_secs(5),
            wake_interval: Duration::from_secs(1),
            reconnect_delay: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tcp_endpoint() {
        let ep = Endpoint::parse("tcp://sync.example.net:3000").unwrap();
        assert_eq!(ep.host, "sync.example.net");
        assert_eq!(ep.port, 3000);
        assert_eq!(ep.authority(), "sync.example.net:3000");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(matches!(
            Endpoint::parse("127.0.0.1:3000"),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(
            Endpoint::parse("ws://127.0.0.1:3000"),
            Err(ConfigError::UnsupportedScheme(s)) if s == "ws"
        ));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(matches!(
            Endpoint::parse("tcp://127.0.0.1:notaport"),
            Err(ConfigError::InvalidPort(_))
        ));
        assert!(matches!(
            Endpoint::parse("tcp://127.0.0.1"),
            Err(ConfigError::InvalidEndpoint(_))
        ));
    }
}
