// Shared helpers for the end-to-end sync tests.
//
// Keeps the scenarios in `tests/` focused: start a relay on an OS-assigned
// port, build real TCP clients against it with test-friendly timings, and
// poll a client's event stream with a deadline. Everything here uses the
// same code paths as a live deployment — the only test-specific knobs are
// the shortened delays.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tether_client::{ClientConfig, Endpoint, SyncClient, SyncEvent};
use tether_relay::RelayHandle;
use tether_relay::server::{RelayConfig, start_relay};

/// Upper bound on any single wait in a scenario.
pub const PATIENCE: Duration = Duration::from_secs(5);

/// Start a relay on a free localhost port.
pub fn start_test_relay() -> (RelayHandle, SocketAddr) {
    let config = RelayConfig {
        bind: "127.0.0.1".into(),
        port: 0,
        max_clients: 8,
    };
    let (handle, addr) = start_relay(config).expect("relay failed to start");
    // Give the listener thread a moment to start.
    std::thread::sleep(Duration::from_millis(50));
    (handle, addr)
}

/// A real TCP client pointed at the test relay.
pub fn test_client(addr: SocketAddr, room: &str) -> SyncClient {
    let mut config = ClientConfig::new(Endpoint::new(addr.ip().to_string(), addr.port()));
    config.room_name = room.into();
    config.reconnect_delay = Duration::from_millis(50);
    SyncClient::new(config)
}

/// Poll until an event matches the predicate, or give up after `PATIENCE`.
pub fn poll_until(
    client: &SyncClient,
    mut pred: impl FnMut(&SyncEvent) -> bool,
) -> Option<SyncEvent> {
    let start = Instant::now();
    while start.elapsed() < PATIENCE {
        for event in client.poll() {
            if pred(&event) {
                return Some(event);
            }
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    None
}

/// Wait out the relay's accept/EnterRoom processing. A client's `Connected`
/// event only means its own handshake was written; the relay may not have
/// registered the peer's room membership yet.
pub fn settle() {
    std::thread::sleep(Duration::from_millis(200));
}
