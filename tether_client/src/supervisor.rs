// Reconnect Supervisor: the background worker's outer loop.
//
// `while !terminate { reopen queue; fresh UserId; run session }` —
// reconnection is unconditional and infinite; only a terminate request ends
// the loop. The queue and the event channel outlive every session; only the
// socket and the UserId are replaced across the boundary, so items queued
// during an outage are delivered by the next session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use log::{debug, info};
use rand::RngCore;
use rand::rngs::OsRng;
use tether_protocol::UserId;

use crate::client::SyncEvent;
use crate::config::ClientConfig;
use crate::queue::OutboundQueue;
use crate::session;
use crate::transport::Dialer;

/// Flags shared between the facade, the supervisor, and the session duties.
pub(crate) struct ClientState {
    terminate_requested: AtomicBool,
    reconnect_requested: AtomicBool,
}

impl ClientState {
    pub(crate) fn new() -> Self {
        Self {
            terminate_requested: AtomicBool::new(false),
            reconnect_requested: AtomicBool::new(false),
        }
    }

    pub(crate) fn request_terminate(&self) {
        self.terminate_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn terminate_requested(&self) -> bool {
        self.terminate_requested.load(Ordering::SeqCst)
    }

    /// Set by a session duty observing a dead connection.
    pub(crate) fn request_reconnect(&self) {
        self.reconnect_requested.store(true, Ordering::SeqCst);
    }

    /// Consume a pending reconnect request.
    pub(crate) fn take_reconnect_request(&self) -> bool {
        self.reconnect_requested.swap(false, Ordering::SeqCst)
    }

    /// Re-arm for a fresh `connect()`.
    pub(crate) fn reset(&self) {
        self.terminate_requested.store(false, Ordering::SeqCst);
        self.reconnect_requested.store(false, Ordering::SeqCst);
    }
}

/// Body of the background worker thread. Returns once terminated.
pub(crate) fn run(
    dialer: &mut dyn Dialer,
    queue: &Arc<OutboundQueue>,
    events: &Sender<SyncEvent>,
    state: &Arc<ClientState>,
    config: &ClientConfig,
) {
    while !state.terminate_requested() {
        queue.reopen();
        // A disconnect that raced the reopen would have had its close
        // signal erased; re-check before dialing.
        if state.terminate_requested() {
            break;
        }
        let user_id = fresh_user_id();
        debug!("starting session as user {}", user_id.0);
        session::run(dialer, user_id, queue, events, state, config);

        if state.terminate_requested() {
            break;
        }
        if state.take_reconnect_request() {
            info!("reconnecting in {:?}", config.reconnect_delay);
        }
        if !config.reconnect_delay.is_zero() {
            thread::sleep(config.reconnect_delay);
        }
    }
    debug!("supervisor loop ended");
}

/// Fresh 16-bit session identity from OS entropy, one per physical
/// connection, so the relay can tell reconnect instances apart.
fn fresh_user_id() -> UserId {
    let mut bytes = [0u8; 2];
    OsRng.fill_bytes(&mut bytes);
    UserId(u16::from_le_bytes(bytes))
}
