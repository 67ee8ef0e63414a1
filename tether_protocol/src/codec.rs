// JSON codec and mode routing.
//
// Receivers route frames in two steps: `decode_mode` pulls out only the
// `mode` discriminator (a partial probe deserialization that ignores every
// other key), then `decode` fully parses the payload for the chosen handler.
// The probe must survive any field ordering, extra whitespace, and unknown
// keys, and it maps every failure to `Mode::Unknown` — a frame can be
// garbage without ever disturbing the receive loop.

use serde::Deserialize;

use crate::message::WireMessage;

/// Frame discriminator, extracted independently of full payload parsing.
///
/// `Unknown` is the sentinel for a missing `mode` field, an unrecognized
/// value, or unparseable JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    EnterRoom,
    PlaceObject,
    UpdateObject,
    Unknown,
}

/// Probe type: only the `mode` field, everything else ignored.
#[derive(Deserialize)]
struct ModeProbe {
    mode: Option<String>,
}

/// Extract the `mode` field of a text frame.
pub fn decode_mode(text: &str) -> Mode {
    let Ok(probe) = serde_json::from_str::<ModeProbe>(text) else {
        return Mode::Unknown;
    };
    match probe.mode.as_deref() {
        Some("EnterRoom") => Mode::EnterRoom,
        Some("PlaceObject") => Mode::PlaceObject,
        Some("UpdateObject") => Mode::UpdateObject,
        _ => Mode::Unknown,
    }
}

/// Serialize a message to its JSON text frame.
pub fn encode(message: &WireMessage) -> serde_json::Result<String> {
    serde_json::to_string(message)
}

/// Fully parse a text frame once its mode is known.
pub fn decode(text: &str) -> serde_json::Result<WireMessage> {
    serde_json::from_str(text)
}
