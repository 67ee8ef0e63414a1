// Protocol frames for client-relay communication.
//
// One enum covers the whole vocabulary. Every frame is flat JSON with a
// top-level `mode` string as the discriminator — the serde internally-tagged
// representation, e.g.
//
//   {"mode":"UpdateObject","id":7,"position":{"x":0,"y":0,"z":0},...}
//
// Pose fields are flattened into the frame (no nested "pose" object). Field
// order on the wire is never significant; receivers must tolerate unknown
// extra keys (see `codec::decode_mode`).

use serde::{Deserialize, Serialize};

use crate::types::{ObjectId, Pose, UserId};

/// A protocol frame, discriminated by its `mode` field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum WireMessage {
    /// Join a named broadcast room. Sent exactly once per physical
    /// connection, before any other traffic. Fire-and-forget: no reply is
    /// defined, so room entry cannot be rejected in this protocol.
    EnterRoom {
        #[serde(rename = "roomName")]
        room_name: String,
        #[serde(rename = "userId")]
        user_id: UserId,
    },
    /// Announce a new shared object to the room. Carries no id — identity
    /// is assigned by relay/convention downstream.
    PlaceObject {
        #[serde(flatten)]
        pose: Pose,
    },
    /// Mutate an existing shared object identified by `id`.
    UpdateObject {
        id: ObjectId,
        #[serde(flatten)]
        pose: Pose,
    },
}
