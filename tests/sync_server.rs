mod common;

use common::*;

use serde_json::json;

use wsdash::config::{MAX_CLIENTS, QUEUE_CAPACITY, SCRATCH_SIZE};
use wsdash::error::CapacityError;
use wsdash::{ClientId, Config, Error, Level, Reading, StatusSnapshot, Target};

fn close_code(payload: &[u8]) -> u16 { u16::from_be_bytes([payload[0], payload[1]]) }

#[test]
fn handshake_opens_client() {
    let mut h = Harness::new();
    let peer = h.open_client();

    assert_eq!(h.server.client_count(), 1);
    assert_eq!(h.events.take(), vec![Event::Connect(ClientId(0), peer.addr)]);
    assert!(!peer.is_closed());
}

#[test]
fn handshake_split_across_ticks() {
    let mut h = Harness::new();
    let mut peer = h.net.connect();
    let request = upgrade_request();
    let (first, second) = request.as_bytes().split_at(30);

    peer.send(first);
    h.server.update();
    assert!(peer.response().is_none());
    assert_eq!(h.server.client_count(), 0);

    peer.send(second);
    h.server.update();
    assert!(peer.response().unwrap().starts_with("HTTP/1.1 101"));
    assert_eq!(h.server.client_count(), 1);
}

#[test]
fn bad_handshake_is_not_announced() {
    let mut h = Harness::new();
    let mut peer = h.net.connect();
    peer.send(b"GET /ws HTTP/1.1\r\nHost: x\r\nUpgrade: websocket\r\n\r\n");
    h.server.update();

    assert!(peer.response().unwrap().starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(peer.is_closed());
    assert!(h.events.take().is_empty());
    assert_eq!(h.server.client_count(), 0);
}

#[test]
fn fifth_client_is_refused() {
    let mut h = Harness::new();
    let mut peers: Vec<Peer> = (0..MAX_CLIENTS).map(|_| h.open_client()).collect();
    assert_eq!(h.server.client_count(), MAX_CLIENTS);

    let mut extra = h.net.connect();
    extra.send_upgrade();
    h.server.update();

    let response = extra.response().unwrap();
    assert!(response.starts_with("HTTP/1.1 503 Service Unavailable\r\n"));
    assert!(extra.is_closed());
    assert_eq!(h.server.rejected_connections(), 1);
    assert_eq!(h.server.client_count(), MAX_CLIENTS);

    // the others keep working
    h.server.enqueue_log(Level::Info, "test", "still here").unwrap();
    h.server.update();
    for peer in peers.iter_mut() {
        assert!(!peer.is_closed());
        assert_eq!(peer.messages()[0]["message"], "still here");
    }
}

#[test]
fn broadcast_skips_pending_handshake() {
    let mut h = Harness::new();
    let mut open = h.open_client();

    let mut pending = h.net.connect();
    pending.send(&upgrade_request().as_bytes()[..20]);
    h.server.update();

    h.server.enqueue_log(Level::Info, "test", "one").unwrap();
    h.server.update();

    assert_eq!(open.messages().len(), 1);
    assert!(pending.response().is_none());
    assert!(pending.frames().is_empty());

    // late joiners do not see old messages
    pending.send(&upgrade_request().as_bytes()[20..]);
    h.server.update();
    assert!(pending.response().is_some());
    assert!(pending.frames().is_empty());
}

#[test]
fn broadcast_queued_during_handshake_skips_newcomer() {
    let mut h = Harness::new();
    let mut open = h.open_client();

    let mut joining = h.net.connect();
    joining.send(&upgrade_request().as_bytes()[..20]);
    h.server.update();

    // queued while the handshake is still pending, sent in the tick that
    // completes it
    h.server.enqueue_log(Level::Info, "test", "old").unwrap();
    joining.send(&upgrade_request().as_bytes()[20..]);
    h.server.update();

    assert!(joining.response().is_some());
    assert!(joining.frames().is_empty());
    assert_eq!(open.messages()[0]["message"], "old");

    h.server.enqueue_log(Level::Info, "test", "new").unwrap();
    h.server.update();
    assert_eq!(joining.messages()[0]["message"], "new");
    assert_eq!(open.messages()[0]["message"], "new");
}

#[test]
fn unicast_does_not_follow_slot_to_new_client() {
    let mut h = Harness::new();
    let gone = h.open_client();
    gone.hang_up();
    h.server.update();
    assert_eq!(h.server.client_count(), 0);

    h.server.enqueue(b"{\"for\":\"old\"}", Target::Client(ClientId(0))).unwrap();

    // takes slot 0, the queue drains in the same tick
    let mut newcomer = h.open_client();
    assert!(newcomer.frames().is_empty());

    h.server.enqueue(b"{\"for\":\"new\"}", Target::Client(ClientId(0))).unwrap();
    h.server.update();
    assert_eq!(newcomer.messages(), vec![json!({"for": "new"})]);
}

#[test]
fn unicast_reaches_one_client() {
    let mut h = Harness::new();
    let mut a = h.open_client();
    let mut b = h.open_client();

    h.server.enqueue(b"{\"to\":\"b\"}", Target::Client(ClientId(1))).unwrap();
    // nobody holds slot 3
    h.server.enqueue(b"{\"to\":\"nobody\"}", Target::Client(ClientId(3))).unwrap();
    h.server.update();

    assert!(a.frames().is_empty());
    assert_eq!(b.messages(), vec![json!({"to": "b"})]);
}

#[test]
fn queue_overflow_drops_newest() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    for i in 0..QUEUE_CAPACITY {
        h.server.enqueue_log(Level::Debug, "test", &i.to_string()).unwrap();
    }
    let e = h.server.enqueue_log(Level::Debug, "test", "overflow").unwrap_err();
    assert!(matches!(e, Error::Capacity(CapacityError::QueueFull)));
    assert_eq!(h.server.dropped_messages(), 1);

    h.server.update();
    let messages = peer.messages();
    assert_eq!(messages.len(), QUEUE_CAPACITY);
    for (i, m) in messages.iter().enumerate() {
        assert_eq!(m["message"], i.to_string());
    }

    // the queue is usable again
    h.server.enqueue_log(Level::Debug, "test", "after").unwrap();
    h.server.update();
    assert_eq!(peer.messages()[0]["message"], "after");
}

#[test]
fn oversized_message_is_refused() {
    let mut h = Harness::new();
    let long = "x".repeat(600);
    let e = h.server.enqueue_log(Level::Info, "test", &long).unwrap_err();
    assert!(matches!(e, Error::Capacity(CapacityError::PayloadTooLarge)));
    assert_eq!(h.server.dropped_messages(), 0);
}

#[test]
fn frame_split_across_reads() {
    let mut h = Harness::new();
    let peer = h.open_client();

    let frame = client_frame(OP_TEXT, b"set_channel 2 on");
    let (first, second) = frame.split_at(5);

    peer.send(first);
    h.server.update();
    assert!(h.commands.take().is_empty());

    peer.send(second);
    h.server.update();
    assert_eq!(
        h.commands.take(),
        vec![("set_channel".to_string(), Some("2 on".to_string()), ClientId(0))]
    );
}

#[test]
fn frames_right_after_handshake() {
    let mut h = Harness::new();
    let peer = h.net.connect();

    let mut bytes = upgrade_request().into_bytes();
    bytes.extend(client_frame(OP_TEXT, br#"{"command":"set_channel","params":"1 off"}"#));
    bytes.extend(client_frame(OP_TEXT, b"set_channel 3 on"));
    peer.send(&bytes);
    h.server.update();

    let commands = h.commands.take();
    assert_eq!(commands.len(), 2);
    assert_eq!(commands[0].1.as_deref(), Some("1 off"));
    assert_eq!(commands[1].1.as_deref(), Some("3 on"));
}

#[test]
fn ping_gets_pong() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send_frame(OP_PING, b"heartbeat");
    h.server.update();

    assert_eq!(peer.frames(), vec![(OP_PONG, b"heartbeat".to_vec())]);
    assert!(!peer.is_closed());
}

#[test]
fn binary_and_pong_are_ignored() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send_frame(OP_BINARY, &[1, 2, 3]);
    peer.send_frame(OP_PONG, b"");
    h.server.update();

    assert!(peer.frames().is_empty());
    assert!(h.commands.take().is_empty());
    assert_eq!(h.server.client_count(), 1);
}

#[test]
fn close_is_echoed() {
    let mut h = Harness::new();
    let mut peer = h.open_client();
    h.events.take();

    peer.send_frame(OP_CLOSE, &1000_u16.to_be_bytes());
    h.server.update();

    let frames = peer.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, OP_CLOSE);
    assert_eq!(close_code(&frames[0].1), 1000);

    assert!(peer.is_closed());
    assert_eq!(h.server.client_count(), 0);
    assert_eq!(h.events.take(), vec![Event::Disconnect(ClientId(0), peer.addr)]);
}

#[test]
fn unmasked_frame_is_a_protocol_error() {
    let mut h = Harness::new();
    let mut peer = h.open_client();
    h.events.take();

    peer.send(b"\x81\x02hi");
    h.server.update();

    let frames = peer.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, OP_CLOSE);
    assert_eq!(close_code(&frames[0].1), 1002);
    assert!(peer.is_closed());
    assert_eq!(h.events.take(), vec![Event::Disconnect(ClientId(0), peer.addr)]);
}

#[test]
fn fragmented_message_is_a_protocol_error() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    let mut frame = client_frame(OP_TEXT, b"status");
    // clear FIN
    frame[0] &= 0x7f;
    peer.send(&frame);
    h.server.update();

    let frames = peer.frames();
    assert_eq!(close_code(&frames[0].1), 1002);
    assert!(peer.is_closed());
}

#[test]
fn oversized_frame_is_refused() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send(&client_frame(OP_TEXT, &vec![b'a'; SCRATCH_SIZE + 100]));
    h.server.update();

    let frames = peer.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(close_code(&frames[0].1), 1009);
    assert!(peer.is_closed());
    assert!(h.commands.take().is_empty());
}

#[test]
fn oversized_frame_head_is_refused_at_once() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    // announces 4000 bytes, only three follow
    peer.send(&[0x81, 0x80 | 126, 0x0f, 0xa0, 1, 2, 3, 4, b'a', b'b', b'c']);
    h.server.update();

    let frames = peer.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].0, OP_CLOSE);
    assert_eq!(close_code(&frames[0].1), 1009);
    assert!(peer.is_closed());
    assert_eq!(h.server.client_count(), 0);
}

#[test]
fn builtin_status_is_unicast() {
    let mut h = Harness::new();
    let mut asker = h.open_client();
    let mut other = h.open_client();
    h.clock.advance(2500);

    asker.send_text("status");
    h.server.update();

    let messages = asker.messages();
    assert_eq!(messages.len(), 1);
    let status = &messages[0];
    assert_eq!(status["type"], "status");
    assert_eq!(status["channels"], json!([true, false, true, true]));
    // channels 1, 3 and 4
    assert_eq!(status["voltage"], 36.0);
    assert_eq!(status["current"], 4.0);
    assert_eq!(status["uptime_ms"], 2500);
    assert_eq!(status["clients"], 2);

    assert!(other.frames().is_empty());
    assert!(h.commands.take().is_empty());
}

#[test]
fn builtin_channels() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send_text(r#"{"command":"get_channels"}"#);
    h.server.update();

    let messages = peer.messages();
    assert_eq!(messages.len(), 4);
    for (i, m) in messages.iter().enumerate() {
        assert_eq!(m["type"], "channel_data");
        assert_eq!(m["channel"], i + 1);
        assert_eq!(m["voltage"], 12.0);
    }
}

#[test]
fn unknown_command_gets_warning() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send_text("reboot now");
    h.server.update();

    assert_eq!(
        h.commands.take(),
        vec![("reboot".to_string(), Some("now".to_string()), ClientId(0))]
    );
    let messages = peer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], "log");
    assert_eq!(messages[0]["level"], "warn");
    assert_eq!(messages[0]["message"], "unknown command: reboot");
}

#[test]
fn malformed_command_keeps_connection() {
    let mut h = Harness::new();
    let mut peer = h.open_client();

    peer.send_text("{\"command\":");
    peer.send_frame(OP_TEXT, b"\xff\xfe");
    h.server.update();

    let messages = peer.messages();
    assert_eq!(messages.len(), 2);
    for m in &messages {
        assert_eq!(m["level"], "error");
    }
    assert!(!peer.is_closed());
    assert_eq!(h.server.client_count(), 1);
}

#[test]
fn status_published_on_interval() {
    let mut h = Harness::with_config(Config::default().status_interval_ms(1000));
    let mut peer = h.open_client();

    h.clock.advance(999);
    h.server.update();
    assert!(peer.messages().is_empty());

    h.clock.advance(1);
    h.server.update();
    let messages = peer.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], "status");
    assert_eq!(messages[0]["clients"], 1);

    h.clock.advance(500);
    h.server.update();
    assert!(peer.messages().is_empty());
}

#[test]
fn channel_data_broadcast() {
    let mut h = Harness::new();
    let mut a = h.open_client();
    let mut b = h.open_client();

    let reading = Reading {
        voltage: 11.5,
        current: 0.25,
    };
    h.server.enqueue_channel_data(3, reading).unwrap();
    h.server.update();

    let expected = json!({"type": "channel_data", "channel": 3, "voltage": 11.5, "current": 0.25});
    assert_eq!(a.messages(), vec![expected.clone()]);
    assert_eq!(b.messages(), vec![expected]);
}

#[test]
fn status_from_caller_is_broadcast() {
    let mut h = Harness::new();
    let mut a = h.open_client();
    let mut b = h.open_client();

    let snapshot = StatusSnapshot {
        channels: [true, true, false, false],
        voltage: 24.5,
        current: 0.25,
        uptime_ms: 61000,
        clients: 2,
    };
    h.server.enqueue_status(&snapshot).unwrap();
    h.server.update();

    let expected = json!({
        "type": "status",
        "channels": [true, true, false, false],
        "voltage": 24.5,
        "current": 0.25,
        "uptime_ms": 61000,
        "clients": 2,
    });
    assert_eq!(a.messages(), vec![expected.clone()]);
    assert_eq!(b.messages(), vec![expected]);
}

#[test]
fn idle_client_times_out() {
    let mut h = Harness::with_config(Config::default().status_interval_ms(0).idle_timeout_ms(5000));
    let quiet = h.open_client();
    let chatty = h.open_client();
    h.events.take();

    h.clock.advance(3000);
    chatty.send_frame(OP_PING, b"");
    h.server.update();

    h.clock.advance(2000);
    h.server.update();

    assert!(quiet.is_closed());
    assert!(!chatty.is_closed());
    assert_eq!(h.events.take(), vec![Event::Disconnect(ClientId(0), quiet.addr)]);
}

#[test]
fn peer_hang_up_fires_disconnect_once() {
    let mut h = Harness::new();
    let peer = h.open_client();
    h.events.take();

    peer.hang_up();
    h.server.update();
    h.server.update();

    assert!(peer.is_closed());
    assert_eq!(h.events.take(), vec![Event::Disconnect(ClientId(0), peer.addr)]);

    // the slot is reused
    let again = h.open_client();
    assert_eq!(h.events.take(), vec![Event::Connect(ClientId(0), again.addr)]);
}

#[test]
fn send_failure_closes_one_slot() {
    let mut h = Harness::new();
    let broken = h.open_client();
    let mut fine = h.open_client();

    broken.fail_writes();
    h.server.enqueue_log(Level::Info, "test", "hello").unwrap();
    h.server.update();

    assert!(broken.is_closed());
    assert!(!fine.is_closed());
    assert_eq!(fine.messages().len(), 1);
    assert_eq!(h.server.client_count(), 1);
}

#[test]
fn stop_closes_everyone() {
    let mut h = Harness::new();
    let mut peers = vec![h.open_client(), h.open_client()];
    h.events.take();

    h.server.stop();
    assert!(!h.server.is_running());
    // the listener is gone
    assert!(h.server.local_addr().is_err());

    let events = h.events.take();
    assert_eq!(events.len(), 2);
    for peer in peers.iter_mut() {
        assert!(peer.is_closed());
        let frames = peer.frames();
        assert_eq!(frames[0].0, OP_CLOSE);
        assert_eq!(close_code(&frames[0].1), 1001);
    }

    // nothing is accepted afterwards
    let mut late = h.net.connect();
    late.send_upgrade();
    h.server.update();
    assert!(late.response().is_none());
    assert_eq!(h.server.client_count(), 0);
}
