use std::thread;
use std::time::Duration;

use zonewatch::{
    AnchorPolicy, BoundingBox, CrossingDirection, DetectionFrame, DirectionMapping, EventType,
    MonitorConfig, Point, TrackedDetection, TrackerId, ZoneEventMessage, ZoneKind, ZoneMonitor,
    SCHEMA_VERSION,
};

fn det(tracker: u64, anchor: [f64; 2]) -> TrackedDetection {
    TrackedDetection::new(
        tracker,
        0u32,
        0.75,
        BoundingBox::around(Point::from(anchor), AnchorPolicy::BottomCenter, 40.0, 80.0),
    )
}

fn monitor(stream_capacity: usize) -> ZoneMonitor {
    let config = MonitorConfig::builder()
        .source_id(12)
        .stream_capacity(stream_capacity)
        .region("lobby", [[100.0, 200.0], [300.0, 200.0], [300.0, 400.0], [100.0, 400.0]])
        .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
        .build()
        .unwrap();
    ZoneMonitor::new(config).unwrap()
}

#[test]
fn test_message_json_shape() {
    let mut mon = monitor(16);
    let stream = mon.subscribe();

    let opening = vec![det(1, [200.0, 300.0]), det(2, [600.0, 500.0]), det(3, [700.0, 600.0])];
    let closing = vec![det(1, [200.0, 300.0]), det(2, [600.0, 580.0]), det(3, [700.0, 500.0])];
    mon.process_frame(&DetectionFrame::new(1, opening)).unwrap();
    mon.process_frame(&DetectionFrame::new(2, closing)).unwrap();

    let first = stream.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first.zones.len(), 1, "no crossings on the first frame");

    let msg = stream.recv_timeout(Duration::from_secs(1)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();

    assert_eq!(value["schema_version"], SCHEMA_VERSION);
    assert_eq!(value["frame_id"], 2);
    assert_eq!(value["source_id"], 12);
    assert!(value["timestamp"].is_string());

    let zones = value["zones"].as_array().unwrap();
    assert_eq!(zones.len(), 3);

    assert_eq!(zones[0]["zone_id"], "lobby");
    assert_eq!(zones[0]["zone_type"], "region");
    assert_eq!(zones[0]["event_type"], "inside");
    assert!(zones[0].get("crossing_direction").is_none());
    assert_eq!(zones[0]["stats"]["current_count"], 1);
    assert!(zones[0]["stats"]["total_in"].is_null());
    assert_eq!(zones[0]["triggered_by"], serde_json::json!([1]));

    assert_eq!(zones[1]["zone_id"], "door");
    assert_eq!(zones[1]["zone_type"], "boundary");
    assert_eq!(zones[1]["event_type"], "crossing");
    assert_eq!(zones[1]["crossing_direction"], "in");
    assert_eq!(zones[1]["triggered_by"], serde_json::json!([2]));
    assert_eq!(zones[1]["stats"]["total_in"], 1);
    assert_eq!(zones[1]["stats"]["total_out"], 1);
    assert!(zones[1]["stats"]["current_count"].is_null());

    assert_eq!(zones[2]["crossing_direction"], "out");
    assert_eq!(zones[2]["triggered_by"], serde_json::json!([3]));
}

#[test]
fn test_decoded_message_matches_typed_view() {
    let mut mon = monitor(16);
    let stream = mon.subscribe();
    mon.process_frame(&DetectionFrame::new(1, vec![det(9, [500.0, 500.0])])).unwrap();
    mon.process_frame(&DetectionFrame::new(2, vec![det(9, [500.0, 580.0])])).unwrap();

    let sent = stream.drain().pop().unwrap();
    let decoded = ZoneEventMessage::from_json(&sent.to_json().unwrap()).unwrap();
    assert_eq!(decoded, sent);

    let crossings = decoded.zones_by_kind(ZoneKind::Boundary);
    assert_eq!(crossings.len(), 1);
    assert_eq!(crossings[0].event_type, EventType::Crossing);
    assert_eq!(crossings[0].crossing_direction, Some(CrossingDirection::In));
    assert_eq!(crossings[0].triggered_by, vec![TrackerId::new(9)]);
}

#[test]
fn test_every_subscriber_gets_every_message() {
    let mut mon = monitor(16);
    let a = mon.subscribe();
    let b = mon.subscribe();
    assert_ne!(a.subscription_id(), b.subscription_id());

    for frame_id in 0..4 {
        mon.process_frame(&DetectionFrame::new(frame_id, vec![])).unwrap();
    }
    assert_eq!(a.len(), 4);
    let ids: Vec<u64> = b.drain().iter().map(|m| m.frame_id).collect();
    assert_eq!(ids, vec![0, 1, 2, 3]);
}

#[test]
fn test_slow_subscriber_never_blocks_frames() {
    let mut mon = monitor(2);
    let slow = mon.subscribe();
    let fast = mon.subscribe();

    let reader = thread::spawn(move || {
        let mut seen = 0;
        while let Ok(msg) = fast.recv_timeout(Duration::from_secs(2)) {
            seen += 1;
            if msg.frame_id == 99 {
                break;
            }
        }
        seen
    });

    for frame_id in 0..100 {
        mon.process_frame(&DetectionFrame::new(frame_id, vec![])).unwrap();
        // Give the reader a chance to keep up.
        if frame_id % 2 == 1 {
            thread::sleep(Duration::from_millis(1));
        }
    }

    assert_eq!(slow.len(), 2);
    assert!(mon.dropped_messages() >= 98);
    assert!(reader.join().unwrap() >= 1);
    assert_eq!(mon.frames_processed(), 100);
}

#[test]
fn test_boundary_only_frames_without_crossings_emit_nothing() {
    let config = MonitorConfig::builder()
        .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
        .build()
        .unwrap();
    let mut mon = ZoneMonitor::new(config).unwrap();
    let stream = mon.subscribe();
    mon.process_frame(&DetectionFrame::new(0, vec![det(1, [10.0, 10.0])])).unwrap();
    assert!(stream.try_recv().unwrap().is_none());
}

#[test]
fn test_dropping_monitor_disconnects_stream() {
    let mut mon = monitor(4);
    let stream = mon.subscribe();
    mon.process_frame(&DetectionFrame::new(0, vec![])).unwrap();
    drop(mon);
    assert!(stream.recv().is_ok());
    assert!(stream.recv().is_err());
}
