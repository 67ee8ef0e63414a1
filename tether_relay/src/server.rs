// TCP server and main event loop for the relay.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main
//   thread.
// - **Reader threads** (one per client): call `framing::read_frame()` in a
//   loop and send `InternalEvent::FrameFrom` with the raw text. On
//   error/EOF they send `InternalEvent::Disconnected`.
// - **Main thread**: owns the `Roster`, receives events from the channel,
//   and dispatches them: EnterRoom frames mutate membership, object frames
//   are forwarded verbatim to the sender's room, unknown modes are dropped.
//   `recv_timeout` bounds how long a shutdown request can go unnoticed.
//
// The main thread is the only writer to client sockets (via
// `Roster::forward`); reader threads only read. This avoids concurrent
// read/write on the same `TcpStream`, which is safe on most platforms but
// fragile.
//
// Shutdown: the main thread checks a `keep_running` flag (cleared by
// `RelayHandle::stop`) and breaks out of the event loop.

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tether_protocol::framing::read_frame;
use tether_protocol::{Mode, WireMessage, codec};

use crate::room::{ClientId, Roster};

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    FrameFrom {
        client_id: ClientId,
        text: String,
    },
    Disconnected {
        client_id: ClientId,
    },
}

/// Handle returned by `start_relay` to control the running server.
pub struct RelayHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RelayHandle {
    /// Signal the relay to stop and wait for the main loop to exit.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a relay server.
pub struct RelayConfig {
    pub bind: String,
    pub port: u16,
    pub max_clients: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3000,
            max_clients: 64,
        }
    }
}

/// Start the relay server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used to
/// let the OS pick a free port).
pub fn start_relay(config: RelayConfig) -> std::io::Result<(RelayHandle, SocketAddr)> {
    let listener = TcpListener::bind(format!("{}:{}", config.bind, config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    info!("relay listening on {addr}");
    let thread = thread::spawn(move || {
        run_relay(listener, config, keep_running_clone);
    });

    Ok((
        RelayHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main relay loop. Runs until `keep_running` is cleared.
fn run_relay(listener: TcpListener, config: RelayConfig, keep_running: Arc<AtomicBool>) {
    let mut roster = Roster::new();
    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Non-blocking listener so the accept thread can check keep_running
    // periodically.
    listener.set_nonblocking(true).ok();

    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                handle_event(&mut roster, event, &tx, &keep_running, config.max_clients);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut roster, event, &tx, &keep_running, config.max_clients);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // Nothing waiting; loop around and re-check keep_running.
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Dispatch a single event to the roster.
fn handle_event(
    roster: &mut Roster,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
    max_clients: usize,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            if roster.len() >= max_clients {
                warn!("refusing connection: at capacity ({max_clients})");
                return; // dropping the stream closes it
            }
            // Roster keeps a write half; the reader thread owns the
            // original stream.
            let write_half = match stream.try_clone() {
                Ok(s) => s,
                Err(e) => {
                    warn!("failed to split connection: {e}");
                    return;
                }
            };
            let client_id = roster.add_client(write_half);

            let tx_reader = tx.clone();
            let keep_running_reader = keep_running.clone();
            thread::spawn(move || {
                reader_loop(
                    BufReader::new(stream),
                    client_id,
                    tx_reader,
                    keep_running_reader,
                );
            });
        }
        InternalEvent::FrameFrom { client_id, text } => {
            dispatch_frame(roster, client_id, &text);
        }
        InternalEvent::Disconnected { client_id } => {
            roster.remove_client(client_id);
        }
    }
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    client_id: ClientId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_frame(&mut reader) {
            Ok(text) => {
                if tx.send(InternalEvent::FrameFrom { client_id, text }).is_err() {
                    break; // Main loop is gone
                }
            }
            Err(_) => {
                // Read error or EOF — disconnect.
                let _ = tx.send(InternalEvent::Disconnected { client_id });
                break;
            }
        }
    }
}

/// Route one frame by its mode. Only EnterRoom is fully decoded; object
/// traffic is forwarded verbatim — the relay never inspects pose payloads.
fn dispatch_frame(roster: &mut Roster, client_id: ClientId, text: &str) {
    match codec::decode_mode(text) {
        Mode::EnterRoom => match codec::decode(text) {
            Ok(WireMessage::EnterRoom { room_name, user_id }) => {
                debug!("user {} is client {}", user_id.0, client_id.0);
                roster.enter_room(client_id, room_name);
            }
            Ok(_) => {}
            Err(e) => warn!("dropping malformed EnterRoom frame: {e}"),
        },
        Mode::PlaceObject | Mode::UpdateObject => roster.forward(client_id, text),
        Mode::Unknown => {
            warn!("dropping frame with unknown mode from client {}", client_id.0);
        }
    }
}
