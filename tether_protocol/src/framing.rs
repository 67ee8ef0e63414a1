// Length-delimited text framing over TCP.
//
// The relay protocol is a stream of text frames; over a raw byte stream the
// frame boundary is a 4-byte big-endian length prefix followed by the UTF-8
// JSON payload. `MAX_FRAME_SIZE` bounds allocation against malformed or
// malicious length prefixes — sync frames are a few hundred bytes, so 64 KB
// is generous headroom.

use std::io::{self, Read, Write};

/// Maximum allowed frame size (64 KB). Pose frames are tiny; anything near
/// this limit is a corrupt length prefix, not a real message.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

/// Write one text frame: 4-byte big-endian length, then the payload.
pub fn write_frame<W: Write>(writer: &mut W, text: &str) -> io::Result<()> {
    let len = text.len();
    if len > MAX_FRAME_SIZE as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }
    #[expect(clippy::cast_possible_truncation)]
    let len_bytes = (len as u32).to_be_bytes();
    writer.write_all(&len_bytes)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Read one text frame: 4-byte big-endian length, then the payload.
///
/// Returns `UnexpectedEof` if the stream closes before or during a frame,
/// `InvalidData` if the length exceeds `MAX_FRAME_SIZE`. Payload bytes that
/// are not valid UTF-8 are replaced lossily — the JSON parse downstream
/// rejects the frame without tearing down the stream.
pub fn read_frame<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} bytes (max {MAX_FRAME_SIZE})"),
        ));
    }
    let mut buf = vec![0u8; len as usize];
    reader.read_exact(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn roundtrip_simple_frame() {
        let original = r#"{"mode":"EnterRoom","roomName":"broadcast","userId":9}"#;
        let mut buf = Vec::new();
        write_frame(&mut buf, original).unwrap();

        let mut cursor = Cursor::new(&buf);
        let recovered = read_frame(&mut cursor).unwrap();
        assert_eq!(recovered, original);
    }

    #[test]
    fn roundtrip_empty_frame() {
        let mut buf = Vec::new();
        write_frame(&mut buf, "").unwrap();

        let mut cursor = Cursor::new(&buf);
        let recovered = read_frame(&mut cursor).unwrap();
        assert_eq!(recovered, "");
    }

    #[test]
    fn rejects_oversized_write() {
        let big = "x".repeat(MAX_FRAME_SIZE as usize + 1);
        let mut buf = Vec::new();
        let err = write_frame(&mut buf, &big).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_oversized_read() {
        // Craft a length prefix that exceeds MAX_FRAME_SIZE.
        let fake_len = (MAX_FRAME_SIZE + 1).to_be_bytes();
        let mut cursor = Cursor::new(fake_len.to_vec());
        let err = read_frame(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn read_unexpected_eof() {
        // Only 2 bytes where 4 are needed for the length prefix.
        let mut cursor = Cursor::new(vec![0u8, 1]);
        let err = read_frame(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_fatal() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.extend_from_slice(&[0xFF, 0xFE, 0xFD]);

        let mut cursor = Cursor::new(&buf);
        let recovered = read_frame(&mut cursor).unwrap();
        assert_eq!(recovered, "\u{FFFD}\u{FFFD}\u{FFFD}");
    }

    #[test]
    fn multiple_frames_in_sequence() {
        let frames = ["first", "second", "third"];
        let mut buf = Vec::new();
        for frame in &frames {
            write_frame(&mut buf, frame).unwrap();
        }

        let mut cursor = Cursor::new(&buf);
        for expected in &frames {
            let recovered = read_frame(&mut cursor).unwrap();
            assert_eq!(recovered, *expected);
        }
    }
}
