// tether_relay — broadcast relay coordinator for tether object sync.
//
// The relay is a thin message broker: it accepts TCP connections from sync
// clients, records which room each client entered, and forwards object
// frames (PlaceObject, UpdateObject) verbatim to every other member of that
// room. It never inspects pose payloads and holds no object state — all
// sync semantics live in the clients.
//
// Module overview:
// - `room.rs`:   The roster — connected clients, their buffered write
//                halves, room membership, and verbatim forwarding.
// - `server.rs`: TCP listener, reader threads (one per client), and the
//                main event loop. Uses `std::net` with a thread-per-reader
//                architecture and an `mpsc` channel funneling events into
//                the single-threaded `Roster`.
//
// Dependencies: `tether_protocol` (shared frame types, mode probe, and
// framing). No dependency on the client crate.
//
// The relay can run as a standalone binary (`main.rs`) or be embedded in a
// test or host process via the library API (`start_relay`).

pub mod room;
pub mod server;

pub use server::{RelayConfig, RelayHandle, start_relay};
