// Public client facade.
//
// `SyncClient` is the one object an application holds: construct it, share
// it by reference, and call it from any thread — there is no process-wide
// instance. Every entry point is non-blocking: enqueues append to the
// outbound queue and signal the send duty; connect/disconnect flip state
// and hand off to the background worker.
//
// Inbound traffic follows the two-hop pattern: the network thread pushes
// decoded `SyncEvent`s into a channel, and the consumer drains them with
// `poll()` on its own schedule (e.g. once per tick). Network timing never
// re-enters caller code.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use log::debug;
use tether_protocol::{ObjectId, Pose, UserId};

use crate::config::ClientConfig;
use crate::lock;
use crate::queue::OutboundQueue;
use crate::supervisor::{self, ClientState};
use crate::transport::{Dialer, TcpDialer};

/// Inbound notifications, drained with [`SyncClient::poll`].
#[derive(Clone, Debug, PartialEq)]
pub enum SyncEvent {
    /// A session entered its room (handshake sent).
    Connected { user_id: UserId },
    /// The active session closed. The supervisor keeps reconnecting unless
    /// `disconnect()` was requested.
    Disconnected,
    /// Another client announced a new shared object.
    ObjectPlaced { pose: Pose },
    /// A shared object's pose changed.
    ObjectUpdated { id: ObjectId, pose: Pose },
}

/// Thread-safe handle to the object-sync client.
pub struct SyncClient {
    config: ClientConfig,
    queue: Arc<OutboundQueue>,
    state: Arc<ClientState>,
    events_tx: Sender<SyncEvent>,
    events_rx: Mutex<Receiver<SyncEvent>>,
    dialer: Arc<Mutex<Option<Box<dyn Dialer>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl SyncClient {
    /// Client over the bundled TCP transport described by
    /// `config.endpoint`.
    pub fn new(config: ClientConfig) -> Self {
        let dialer = Box::new(TcpDialer::new(config.endpoint.clone(), config.io_timeout));
        Self::with_dialer(config, dialer)
    }

    /// Client over an injected transport. The dialer is reused across
    /// `connect()` calls for the lifetime of the client.
    pub fn with_dialer(config: ClientConfig, dialer: Box<dyn Dialer>) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            config,
            queue: Arc::new(OutboundQueue::new()),
            state: Arc::new(ClientState::new()),
            events_tx,
            events_rx: Mutex::new(events_rx),
            dialer: Arc::new(Mutex::new(Some(dialer))),
            worker: Mutex::new(None),
        }
    }

    /// Start (or resume) the reconnect loop. Idempotent: a no-op while the
    /// background worker is alive, checked against the worker handle itself
    /// rather than a flag that could go stale. A `connect()` racing a
    /// still-unwinding `disconnect()` may therefore also no-op; call again
    /// after observing [`SyncEvent::Disconnected`].
    pub fn connect(&self) {
        let mut worker = lock(&self.worker);
        if let Some(handle) = worker.as_ref() {
            if !handle.is_finished() {
                debug!("connect: worker already running");
                return;
            }
        }

        self.state.reset();
        let queue = Arc::clone(&self.queue);
        let state = Arc::clone(&self.state);
        let events = self.events_tx.clone();
        let config = self.config.clone();
        let dialer_slot = Arc::clone(&self.dialer);
        *worker = Some(thread::spawn(move || {
            let Some(mut dialer) = lock(&dialer_slot).take() else {
                return;
            };
            supervisor::run(dialer.as_mut(), &queue, &events, &state, &config);
            *lock(&dialer_slot) = Some(dialer);
        }));
    }

    /// Request graceful shutdown. Fire-and-forget: returns immediately;
    /// observe [`SyncEvent::Disconnected`] for completion.
    pub fn disconnect(&self) {
        self.state.request_terminate();
        self.queue.signal_close();
    }

    /// Queue a new-object announcement. Never blocks. Delivery is
    /// best-effort: while no session is active the item waits in the queue.
    pub fn place_object(&self, pose: Pose) {
        self.queue.enqueue_placement(pose);
    }

    /// Queue a transform update for the object identified by `id`. Never
    /// blocks; same best-effort contract as [`Self::place_object`].
    pub fn send_transform(&self, id: ObjectId, pose: Pose) {
        self.queue.enqueue_update(id, pose);
    }

    /// Drain all pending inbound events without blocking.
    pub fn poll(&self) -> Vec<SyncEvent> {
        let rx = lock(&self.events_rx);
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }
}
