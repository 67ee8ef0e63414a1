// Protocol-level smoke test for the relay.
//
// Starts a relay on localhost and drives it with plain framed TCP sockets —
// no sync-client code involved. Exercises room entry, forwarding within a
// room, room isolation, and tolerance of junk frames.

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use tether_protocol::framing::{read_frame, write_frame};
use tether_protocol::{ObjectId, Pose, Quat, UserId, Vec3, WireMessage, codec};
use tether_relay::server::{RelayConfig, start_relay};

/// Helper: encode and send a message over a framed TCP stream.
fn send(writer: &mut BufWriter<TcpStream>, msg: &WireMessage) {
    let text = codec::encode(msg).unwrap();
    write_frame(writer, &text).unwrap();
}

/// Helper: receive and decode one message from a framed TCP stream.
fn recv(reader: &mut BufReader<TcpStream>) -> WireMessage {
    let text = read_frame(reader).unwrap();
    codec::decode(&text).unwrap()
}

/// Connect to the relay and enter a room. Returns the reader/writer pair.
fn connect_and_enter(
    addr: SocketAddr,
    room: &str,
    user_id: u16,
) -> (BufReader<TcpStream>, BufWriter<TcpStream>) {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let reader_stream = stream.try_clone().unwrap();
    let mut writer = BufWriter::new(stream);
    let reader = BufReader::new(reader_stream);

    send(
        &mut writer,
        &WireMessage::EnterRoom {
            room_name: room.into(),
            user_id: UserId(user_id),
        },
    );

    (reader, writer)
}

fn start_test_relay() -> (tether_relay::RelayHandle, SocketAddr) {
    let config = RelayConfig {
        bind: "127.0.0.1".into(),
        port: 0, // OS picks a free port
        max_clients: 8,
    };
    let (handle, addr) = start_relay(config).unwrap();
    // Give the listener thread a moment to start.
    std::thread::sleep(Duration::from_millis(50));
    (handle, addr)
}

fn sample_pose(x: f32) -> Pose {
    Pose::new(Vec3::new(x, 0.0, 0.0), Quat::IDENTITY, Vec3::ONE)
}

#[test]
fn frames_are_forwarded_within_a_room_but_not_echoed() {
    let (handle, addr) = start_test_relay();

    let (mut reader_a, mut writer_a) = connect_and_enter(addr, "workshop", 1);
    let (mut reader_b, _writer_b) = connect_and_enter(addr, "workshop", 2);

    // Let the relay process both EnterRoom frames.
    std::thread::sleep(Duration::from_millis(200));

    let update = WireMessage::UpdateObject {
        id: ObjectId(7),
        pose: sample_pose(1.0),
    };
    send(&mut writer_a, &update);
    assert_eq!(recv(&mut reader_b), update);

    let place = WireMessage::PlaceObject {
        pose: sample_pose(2.0),
    };
    send(&mut writer_a, &place);
    assert_eq!(recv(&mut reader_b), place);

    // The sender gets no echo of its own frames.
    reader_a
        .get_ref()
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    assert!(read_frame(&mut reader_a).is_err());

    handle.stop();
}

#[test]
fn rooms_are_isolated() {
    let (handle, addr) = start_test_relay();

    let (_reader_a, mut writer_a) = connect_and_enter(addr, "alpha", 1);
    let (mut reader_b, _writer_b) = connect_and_enter(addr, "beta", 2);

    std::thread::sleep(Duration::from_millis(200));

    send(
        &mut writer_a,
        &WireMessage::UpdateObject {
            id: ObjectId(1),
            pose: sample_pose(1.0),
        },
    );

    // Nothing crosses the room boundary.
    reader_b
        .get_ref()
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    assert!(read_frame(&mut reader_b).is_err());

    handle.stop();
}

#[test]
fn junk_frames_do_not_kill_the_relay() {
    let (handle, addr) = start_test_relay();

    let (_reader_a, mut writer_a) = connect_and_enter(addr, "workshop", 1);
    let (mut reader_b, _writer_b) = connect_and_enter(addr, "workshop", 2);

    std::thread::sleep(Duration::from_millis(200));

    // Unknown mode, bare garbage, and a mode-less object — all dropped.
    write_frame(writer_a.get_mut(), r#"{"mode":"Bogus"}"#).unwrap();
    write_frame(writer_a.get_mut(), "not json").unwrap();
    write_frame(writer_a.get_mut(), r#"{"id":9}"#).unwrap();

    // A valid frame after the junk still goes through.
    let update = WireMessage::UpdateObject {
        id: ObjectId(3),
        pose: sample_pose(3.0),
    };
    send(&mut writer_a, &update);
    assert_eq!(recv(&mut reader_b), update);

    handle.stop();
}

#[test]
fn frames_before_entering_a_room_go_nowhere() {
    let (handle, addr) = start_test_relay();

    // A connects but never enters a room.
    let stream = TcpStream::connect(addr).unwrap();
    let mut writer_a = BufWriter::new(stream);

    let (mut reader_b, _writer_b) = connect_and_enter(addr, "workshop", 2);
    std::thread::sleep(Duration::from_millis(200));

    send(
        &mut writer_a,
        &WireMessage::UpdateObject {
            id: ObjectId(1),
            pose: sample_pose(1.0),
        },
    );

    reader_b
        .get_ref()
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    assert!(read_frame(&mut reader_b).is_err());

    handle.stop();
}
