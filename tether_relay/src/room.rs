// Room roster for the relay.
//
// Tracks connected clients, the buffered write half of each socket, and
// which room each client has entered. All mutation happens through methods
// called from the server's single-threaded main loop — no internal locking.
//
// Forwarding writes frames verbatim: the relay never re-encodes or inspects
// object payloads. A write error on one client is logged and tolerated —
// that client's reader thread will detect the broken pipe and emit the
// disconnect that removes it from the roster.

use std::collections::BTreeMap;
use std::io::BufWriter;
use std::net::TcpStream;

use log::{debug, info, warn};
use tether_protocol::framing::write_frame;

/// Relay-local id for one connected socket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u32);

struct ClientHandle {
    writer: BufWriter<TcpStream>,
    /// Set once the client's EnterRoom frame arrives. Frames from clients
    /// that never entered a room go nowhere.
    room: Option<String>,
}

/// All connected clients and their room membership.
pub struct Roster {
    clients: BTreeMap<ClientId, ClientHandle>,
    next_id: u32,
}

impl Roster {
    pub fn new() -> Self {
        Self {
            clients: BTreeMap::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Register a new connection (write half). Room membership comes later,
    /// with the client's EnterRoom frame.
    pub fn add_client(&mut self, stream: TcpStream) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.clients.insert(
            id,
            ClientHandle {
                writer: BufWriter::new(stream),
                room: None,
            },
        );
        debug!("client {} connected", id.0);
        id
    }

    pub fn remove_client(&mut self, id: ClientId) {
        if let Some(handle) = self.clients.remove(&id) {
            match handle.room {
                Some(room) => info!("client {} left room {room:?}", id.0),
                None => debug!("client {} disconnected before entering a room", id.0),
            }
        }
    }

    pub fn enter_room(&mut self, id: ClientId, room_name: String) {
        if let Some(handle) = self.clients.get_mut(&id) {
            info!("client {} entered room {room_name:?}", id.0);
            handle.room = Some(room_name);
        }
    }

    /// Forward a raw frame to every other member of the sender's room.
    pub fn forward(&mut self, from: ClientId, text: &str) {
        let Some(room) = self.clients.get(&from).and_then(|h| h.room.clone()) else {
            debug!("dropping frame from client {}: not in a room", from.0);
            return;
        };
        for (id, handle) in &mut self.clients {
            if *id == from || handle.room.as_deref() != Some(room.as_str()) {
                continue;
            }
            if let Err(e) = write_frame(&mut handle.writer, text) {
                warn!("write to client {} failed: {e}", id.0);
            }
        }
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}
