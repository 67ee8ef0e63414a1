// tether_client — resilient object-sync client for the tether relay.
//
// The client keeps a process's shared-object poses loosely synchronized
// through a relay over an unreliable long-lived socket. Callers never touch
// the network: they enqueue outbound poses and poll inbound events, while a
// background worker owns the connection, survives disconnects, and replays
// whatever was queued during an outage.
//
// Module overview:
// - `config.rs`:     `ClientConfig` and `tcp://host:port` endpoint parsing.
// - `queue.rs`:      The outbound queue — two FIFO lanes, a condvar wake
//                    signal, and the session-close flag.
// - `transport.rs`:  `Dialer`/`FrameReader`/`FrameWriter` seam plus the
//                    bundled length-delimited TCP transport.
// - `session.rs`:    One physical connection: dial, EnterRoom handshake,
//                    concurrent send/receive duties, joined teardown.
// - `supervisor.rs`: The reconnect loop and the shared state flags.
// - `client.rs`:     `SyncClient`, the thread-safe facade.
//
// Concurrency model: arbitrary caller threads write the queue; exactly one
// send duty reads it. The facade's methods never block — the only blocking
// points in the crate are the send duty's condvar wait and the receive
// duty's socket read. Network failures never cross the facade; they are
// logged and absorbed by the reconnect loop.

pub mod client;
pub mod config;
pub mod transport;

mod queue;
mod session;
mod supervisor;

pub use client::{SyncClient, SyncEvent};
pub use config::{ClientConfig, ConfigError, Endpoint};
pub use transport::{Dialer, Frame, FrameReader, FrameWriter};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock helper: poisoning only ever means a peer thread panicked, and every
/// structure we guard stays coherent across a panic, so waiters continue.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
