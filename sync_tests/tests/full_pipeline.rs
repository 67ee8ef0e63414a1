// End-to-end tests for the sync pipeline.
//
// Each test starts a real relay, connects real `SyncClient`s over localhost
// TCP, and verifies the full path: enqueue → send duty → relay forwarding →
// receive duty → polled event. These exercise exactly the code a live
// deployment runs; the fake-transport tests in `tether_client` cover the
// failure choreography that needs deterministic timing.

use sync_tests::{poll_until, settle, start_test_relay, test_client};
use tether_client::SyncEvent;
use tether_protocol::{ObjectId, Pose, Quat, Vec3};

fn pose_at(x: f32, y: f32, z: f32) -> Pose {
    Pose::new(Vec3::new(x, y, z), Quat::IDENTITY, Vec3::ONE)
}

#[test]
fn placements_reach_other_clients_in_the_room() {
    let (handle, addr) = start_test_relay();
    let alice = test_client(addr, "broadcast");
    let bob = test_client(addr, "broadcast");

    alice.connect();
    bob.connect();
    poll_until(&alice, |e| matches!(e, SyncEvent::Connected { .. })).expect("alice connects");
    poll_until(&bob, |e| matches!(e, SyncEvent::Connected { .. })).expect("bob connects");
    settle();

    alice.place_object(pose_at(1.0, 2.0, 3.0));

    let event = poll_until(&bob, |e| matches!(e, SyncEvent::ObjectPlaced { .. }))
        .expect("placement should reach bob");
    assert_eq!(
        event,
        SyncEvent::ObjectPlaced {
            pose: pose_at(1.0, 2.0, 3.0)
        }
    );

    alice.disconnect();
    bob.disconnect();
    handle.stop();
}

#[test]
fn updates_reach_other_clients_but_never_echo() {
    let (handle, addr) = start_test_relay();
    let alice = test_client(addr, "broadcast");
    let bob = test_client(addr, "broadcast");

    alice.connect();
    bob.connect();
    poll_until(&alice, |e| matches!(e, SyncEvent::Connected { .. })).expect("alice connects");
    poll_until(&bob, |e| matches!(e, SyncEvent::Connected { .. })).expect("bob connects");
    settle();

    alice.send_transform(ObjectId(7), pose_at(4.0, 5.0, 6.0));

    let event = poll_until(&bob, |e| matches!(e, SyncEvent::ObjectUpdated { .. }))
        .expect("update should reach bob");
    assert_eq!(
        event,
        SyncEvent::ObjectUpdated {
            id: ObjectId(7),
            pose: pose_at(4.0, 5.0, 6.0)
        }
    );

    // The relay never echoes a frame back to its sender.
    std::thread::sleep(std::time::Duration::from_millis(200));
    assert!(
        !alice
            .poll()
            .iter()
            .any(|e| matches!(e, SyncEvent::ObjectUpdated { .. })),
        "alice must not receive her own update"
    );

    alice.disconnect();
    bob.disconnect();
    handle.stop();
}

#[test]
fn rooms_are_isolated_end_to_end() {
    let (handle, addr) = start_test_relay();
    let alice = test_client(addr, "alpha");
    let bob = test_client(addr, "beta");

    alice.connect();
    bob.connect();
    poll_until(&alice, |e| matches!(e, SyncEvent::Connected { .. })).expect("alice connects");
    poll_until(&bob, |e| matches!(e, SyncEvent::Connected { .. })).expect("bob connects");
    settle();

    alice.send_transform(ObjectId(1), pose_at(1.0, 0.0, 0.0));

    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(
        !bob.poll()
            .iter()
            .any(|e| matches!(e, SyncEvent::ObjectUpdated { .. })),
        "frames must not cross rooms"
    );

    alice.disconnect();
    bob.disconnect();
    handle.stop();
}

#[test]
fn items_enqueued_before_connecting_arrive_after_the_handshake() {
    let (handle, addr) = start_test_relay();
    let alice = test_client(addr, "broadcast");
    let bob = test_client(addr, "broadcast");

    bob.connect();
    poll_until(&bob, |e| matches!(e, SyncEvent::Connected { .. })).expect("bob connects");
    settle();

    // Queued while fully offline; must survive until a session exists.
    alice.place_object(pose_at(9.0, 9.0, 9.0));
    alice.connect();

    let event = poll_until(&bob, |e| matches!(e, SyncEvent::ObjectPlaced { .. }))
        .expect("queued placement should arrive once alice connects");
    assert_eq!(
        event,
        SyncEvent::ObjectPlaced {
            pose: pose_at(9.0, 9.0, 9.0)
        }
    );

    alice.disconnect();
    bob.disconnect();
    handle.stop();
}

#[test]
fn graceful_disconnect_reports_and_goes_quiet() {
    let (handle, addr) = start_test_relay();
    let alice = test_client(addr, "broadcast");

    alice.connect();
    poll_until(&alice, |e| matches!(e, SyncEvent::Connected { .. })).expect("alice connects");

    alice.disconnect();
    poll_until(&alice, |e| matches!(e, SyncEvent::Disconnected))
        .expect("disconnect should be observable");

    // No reconnect after a requested termination.
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(
        !alice
            .poll()
            .iter()
            .any(|e| matches!(e, SyncEvent::Connected { .. })),
        "client must stay down after disconnect"
    );

    handle.stop();
}
