// Connection Session: one physical connection attempt, dial to close.
//
// State machine per connection: Dialing → Handshaking → Active → Closing →
// Closed. Dial or handshake failure short-circuits to Closed with a
// reconnect request; retrying is the supervisor's job, never the session's.
//
// While Active, two duties run concurrently:
// - The **send duty** (its own thread) owns the writer half: wait for work,
//   drain placements, then drain updates, encoding and sending each in
//   enqueue order. On exit it performs the bounded graceful close, which
//   also unblocks the receive duty.
// - The **receive duty** (the supervisor's thread) owns the reader half:
//   blocking read, route by `decode_mode`, emit events for object frames.
//   A malformed frame costs only itself.
//
// Teardown joins the send duty before returning, so at most one session
// ever holds the queue's reader side and `Closed` is only reported once
// both duties are gone.

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use tether_protocol::{Mode, UserId, WireMessage, codec};

use crate::client::SyncEvent;
use crate::config::ClientConfig;
use crate::queue::{OutboundQueue, Wake};
use crate::supervisor::ClientState;
use crate::transport::{Dialer, Frame, FrameReader, FrameWriter};

/// Run one session to completion. Returns once both duties have exited.
pub(crate) fn run(
    dialer: &mut dyn Dialer,
    user_id: UserId,
    queue: &Arc<OutboundQueue>,
    events: &Sender<SyncEvent>,
    state: &Arc<ClientState>,
    config: &ClientConfig,
) {
    // Dialing.
    let (reader, mut writer) = match dialer.dial() {
        Ok(halves) => halves,
        Err(e) => {
            info!("dial failed: {e}");
            state.request_reconnect();
            return;
        }
    };

    // Handshaking: exactly one EnterRoom, fire-and-forget — the protocol
    // defines no reply, so success is assumed once the send completes.
    let hello = WireMessage::EnterRoom {
        room_name: config.room_name.clone(),
        user_id,
    };
    let hello_text = match codec::encode(&hello) {
        Ok(text) => text,
        Err(e) => {
            warn!("handshake encode failed: {e}");
            state.request_reconnect();
            return;
        }
    };
    if let Err(e) = writer.write_frame(&hello_text) {
        info!("handshake send failed: {e}");
        state.request_reconnect();
        return;
    }

    // Active.
    debug!(
        "entered room {:?} as user {}",
        config.room_name, user_id.0
    );
    let _ = events.send(SyncEvent::Connected { user_id });

    let send_queue = Arc::clone(queue);
    let send_state = Arc::clone(state);
    let wake_interval = config.wake_interval;
    let send_duty = thread::spawn(move || {
        send_loop(writer, &send_queue, &send_state, wake_interval);
    });

    recv_loop(reader, events, queue, state);

    // Closing: the receive duty is done. Wake the send duty so it closes
    // the socket and exits, and only then report Closed upward.
    queue.signal_close();
    let _ = send_duty.join();
    let _ = events.send(SyncEvent::Disconnected);
}

/// Send duty: drain the queue to the wire until the close signal.
fn send_loop(
    mut writer: Box<dyn FrameWriter>,
    queue: &OutboundQueue,
    state: &ClientState,
    wake_interval: Duration,
) {
    loop {
        match queue.wait_for_work(wake_interval) {
            Wake::Closed => break,
            Wake::Work | Wake::TimedOut => {}
        }
        // The wake timeout bounds how long a terminate request that lost
        // its close signal can go unnoticed.
        if state.terminate_requested() {
            break;
        }
        if !flush_queues(writer.as_mut(), queue) {
            break;
        }
    }
    // Bounded-effort graceful close; failure is success-with-warning and
    // teardown continues either way.
    if let Err(e) = writer.close() {
        debug!("graceful close failed: {e}");
    }
}

/// Drain both lanes in placement-before-update order. Returns false once
/// the socket is dead; the item that hit the error is dropped and the
/// unsent tail is requeued for the next session.
fn flush_queues(writer: &mut dyn FrameWriter, queue: &OutboundQueue) -> bool {
    let mut placements = queue.drain_placements();
    while let Some(pose) = placements.pop_front() {
        if !send_message(writer, &WireMessage::PlaceObject { pose }) {
            queue.requeue_placements(placements);
            queue.signal_close();
            return false;
        }
    }

    let mut updates = queue.drain_updates();
    while let Some((id, pose)) = updates.pop_front() {
        if !send_message(writer, &WireMessage::UpdateObject { id, pose }) {
            queue.requeue_updates(updates);
            queue.signal_close();
            return false;
        }
    }
    true
}

/// Encode and send one message. Returns false when the connection is dead.
fn send_message(writer: &mut dyn FrameWriter, message: &WireMessage) -> bool {
    let text = match codec::encode(message) {
        Ok(text) => text,
        Err(e) => {
            // The frame is unsendable but the connection is fine.
            warn!("dropping unencodable message: {e}");
            return true;
        }
    };
    if let Err(e) = writer.write_frame(&text) {
        warn!("send failed, dropping in-flight message: {e}");
        return false;
    }
    true
}

/// Receive duty: blocking read loop until the socket closes or errors.
fn recv_loop(
    mut reader: Box<dyn FrameReader>,
    events: &Sender<SyncEvent>,
    queue: &OutboundQueue,
    state: &ClientState,
) {
    loop {
        match reader.read_frame() {
            Ok(Frame::Text(text)) => dispatch_frame(&text, events),
            Ok(Frame::Binary(bytes)) => {
                // The protocol has no binary frames.
                debug!("ignoring {}-byte binary frame", bytes.len());
            }
            Err(e) => {
                if state.terminate_requested() {
                    debug!("receive loop closing: {e}");
                } else {
                    info!("connection lost: {e}");
                    state.request_reconnect();
                }
                break;
            }
        }
    }
    queue.signal_close();
}

/// Route one inbound text frame. Malformed frames are logged and dropped;
/// nothing that arrives on the wire can take the receive duty down.
fn dispatch_frame(text: &str, events: &Sender<SyncEvent>) {
    match codec::decode_mode(text) {
        Mode::UpdateObject => match codec::decode(text) {
            Ok(WireMessage::UpdateObject { id, pose }) => {
                let _ = events.send(SyncEvent::ObjectUpdated { id, pose });
            }
            Ok(_) => {}
            Err(e) => warn!("dropping malformed UpdateObject frame: {e}"),
        },
        Mode::PlaceObject => match codec::decode(text) {
            Ok(WireMessage::PlaceObject { pose }) => {
                let _ = events.send(SyncEvent::ObjectPlaced { pose });
            }
            Ok(_) => {}
            Err(e) => warn!("dropping malformed PlaceObject frame: {e}"),
        },
        Mode::EnterRoom => debug!("ignoring EnterRoom frame from server"),
        Mode::Unknown => warn!("dropping frame with unknown mode"),
    }
}
