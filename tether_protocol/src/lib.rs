// tether_protocol — wire protocol for the tether object-sync relay.
//
// This crate defines the message vocabulary, JSON codec, and stream framing
// shared by the sync client (`tether_client`) and the relay coordinator
// (`tether_relay`). It has no I/O of its own beyond `Read`/`Write` framing
// and no dependency on either side's runtime.
//
// Module overview:
// - `types.rs`:   Pose value types (`Vec3`, `Quat`, `Pose`) and newtype ids
//                 (`ObjectId`, `UserId`).
// - `message.rs`: The `WireMessage` enum — flat JSON frames discriminated
//                 by a top-level `mode` string field.
// - `codec.rs`:   `decode_mode` (partial probe used for routing) plus full
//                 encode/decode.
// - `framing.rs`: Length-delimited text framing over any `Read`/`Write`
//                 stream: 4-byte big-endian length prefix, then the JSON
//                 payload.
//
// Design decisions:
// - **Flat JSON text frames.** The relay's peers discriminate on a
//   top-level `mode` string; field order and unknown extra keys must never
//   matter, so routing goes through a tolerant probe (`decode_mode`) before
//   any full parse.
// - **No async runtime.** Uses `std::io::Read`/`Write` for framing,
//   compatible with blocking TCP streams and buffered wrappers.

pub mod codec;
pub mod framing;
pub mod message;
pub mod types;

pub use codec::{Mode, decode, decode_mode, encode};
pub use framing::{MAX_FRAME_SIZE, read_frame, write_frame};
pub use message::WireMessage;
pub use types::{ObjectId, Pose, Quat, UserId, Vec3};
