use zonewatch::{
    AnchorPolicy, BoundingBox, ClassId, ControlCommand, CrossingDirection, DetectionFrame,
    DirectionMapping, EvictionPolicy, MonitorConfig, Point, TrackedDetection, TrackerId, ZoneId,
    ZoneMonitor,
};

const SQUARE: [[f64; 2]; 4] = [[100.0, 200.0], [300.0, 200.0], [300.0, 400.0], [100.0, 400.0]];

fn det(tracker: u64, class: u32, anchor: [f64; 2]) -> TrackedDetection {
    TrackedDetection::new(
        tracker,
        class,
        0.9,
        BoundingBox::around(Point::from(anchor), AnchorPolicy::BottomCenter, 40.0, 90.0),
    )
}

fn frame(frame_id: u64, detections: Vec<TrackedDetection>) -> DetectionFrame {
    DetectionFrame::new(frame_id, detections)
}

fn zone(id: &str) -> ZoneId {
    ZoneId::new(id).unwrap()
}

fn standard_monitor() -> ZoneMonitor {
    let config = MonitorConfig::builder()
        .region("lobby", SQUARE)
        .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
        .build()
        .unwrap();
    ZoneMonitor::new(config).unwrap()
}

#[test]
fn test_stationary_occupant_is_counted_every_frame() {
    let mut mon = standard_monitor();
    for frame_id in 0..3 {
        let result = mon
            .process_frame(&frame(frame_id, vec![det(1, 0, [200.0, 300.0])]))
            .unwrap();
        let lobby = result.zone("lobby").unwrap();
        assert_eq!(lobby.stats.current_count(), Some(1));
        assert_eq!(lobby.evaluation.inside()[0].tracker_id, TrackerId::new(1));
    }
    assert_eq!(mon.zone_stats("lobby").unwrap().total_count, 1);
}

#[test]
fn test_occupancy_follows_movement_per_class() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(
        0,
        vec![det(1, 0, [150.0, 250.0]), det(2, 0, [250.0, 350.0]), det(3, 2, [200.0, 300.0])],
    ))
    .unwrap();
    let stats = mon.zone_stats("lobby").unwrap();
    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.class_count(ClassId::new(0)), 2);
    assert_eq!(stats.class_count(ClassId::new(2)), 1);

    mon.process_frame(&frame(
        1,
        vec![det(1, 0, [150.0, 250.0]), det(2, 0, [900.0, 350.0]), det(3, 2, [200.0, 300.0])],
    ))
    .unwrap();
    let stats = mon.zone_stats("lobby").unwrap();
    assert_eq!(stats.total_count, 2);
    assert_eq!(stats.class_count(ClassId::new(0)), 1);
}

#[test]
fn test_single_crossing_counts_once() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(7, 0, [500.0, 500.0])])).unwrap();
    let result = mon.process_frame(&frame(1, vec![det(7, 0, [500.0, 580.0])])).unwrap();
    let door = result.zone("door").unwrap();
    assert_eq!(door.evaluation.crossed(CrossingDirection::In), vec![TrackerId::new(7)]);

    // Staying on the far side adds nothing.
    for frame_id in 2..6 {
        mon.process_frame(&frame(frame_id, vec![det(7, 0, [520.0, 600.0])]))
            .unwrap();
    }
    let stats = mon.zone_stats("door").unwrap();
    assert_eq!(stats.total_in, Some(1));
    assert_eq!(stats.total_out, Some(0));
    assert_eq!(stats.total_count, 1);
}

#[test]
fn test_oscillation_counts_each_sign_change_ignoring_the_line() {
    let mut mon = standard_monitor();
    // - 0 + + 0 - + 0 -
    let ys = [500.0, 540.0, 580.0, 590.0, 540.0, 500.0, 600.0, 540.0, 480.0];
    for (frame_id, y) in ys.iter().enumerate() {
        mon.process_frame(&frame(frame_id as u64, vec![det(1, 0, [700.0, *y])]))
            .unwrap();
    }
    let stats = mon.zone_stats("door").unwrap();
    assert_eq!(stats.total_in, Some(2));
    assert_eq!(stats.total_out, Some(2));
}

#[test]
fn test_direction_mapping_inverts_in_and_out() {
    let config = MonitorConfig::builder()
        .boundary("exit", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::NegativeIsIn)
        .build()
        .unwrap();
    let mut mon = ZoneMonitor::new(config).unwrap();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    mon.process_frame(&frame(1, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    let stats = mon.zone_stats("exit").unwrap();
    assert_eq!(stats.total_in, Some(0));
    assert_eq!(stats.total_out, Some(1));
}

#[test]
fn test_reset_zeroes_counters_but_keeps_sides() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    mon.process_frame(&frame(1, vec![det(1, 0, [500.0, 580.0])])).unwrap();

    mon.apply(ControlCommand::ResetZone { zone_id: zone("door") }).unwrap();
    let stats = mon.zone_stats("door").unwrap();
    assert_eq!(stats.total_in, Some(0));
    assert_eq!(stats.total_out, Some(0));
    assert_eq!(mon.zone_info("door").unwrap().tracked_identities, 1);

    // The remembered side still makes the return trip a crossing.
    mon.process_frame(&frame(2, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    assert_eq!(mon.zone_stats("door").unwrap().total_out, Some(1));
}

#[test]
fn test_disable_enable_neither_resets_nor_duplicates() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    mon.process_frame(&frame(1, vec![det(1, 0, [500.0, 580.0])])).unwrap();

    mon.apply(ControlCommand::DisableZone { zone_id: zone("door") }).unwrap();
    for frame_id in 2..5 {
        mon.process_frame(&frame(frame_id, vec![det(1, 0, [500.0, 600.0])]))
            .unwrap();
    }
    mon.apply(ControlCommand::EnableZone { zone_id: zone("door") }).unwrap();
    mon.process_frame(&frame(5, vec![det(1, 0, [500.0, 600.0])])).unwrap();

    let stats = mon.zone_stats("door").unwrap();
    assert_eq!(stats.total_in, Some(1));
    assert_eq!(stats.total_out, Some(0));
}

#[test]
fn test_crossing_while_disabled_is_seen_as_nothing_new() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    mon.apply(ControlCommand::DisableZone { zone_id: zone("door") }).unwrap();
    mon.process_frame(&frame(1, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    mon.apply(ControlCommand::EnableZone { zone_id: zone("door") }).unwrap();
    // The tracker is still remembered on the negative side, so the first
    // enabled frame on the positive side completes the crossing.
    mon.process_frame(&frame(2, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    assert_eq!(mon.zone_stats("door").unwrap().total_in, Some(1));
}

#[test]
fn test_snapshot_is_stable_without_updates() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    mon.process_frame(&frame(1, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    assert_eq!(mon.zone_stats("door").unwrap(), mon.zone_stats("door").unwrap());
}

#[test]
fn test_eviction_forgets_idle_trackers() {
    let config = MonitorConfig::builder()
        .crossing_eviction(EvictionPolicy::AfterIdleEvaluations(3))
        .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
        .build()
        .unwrap();
    let mut mon = ZoneMonitor::new(config).unwrap();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    for frame_id in 1..5 {
        mon.process_frame(&frame(frame_id, vec![])).unwrap();
    }
    assert_eq!(mon.zone_info("door").unwrap().tracked_identities, 0);
    // Reappearing on the other side is a first sighting, not a crossing.
    mon.process_frame(&frame(5, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    assert_eq!(mon.zone_stats("door").unwrap().total_in, Some(0));
}

#[test]
fn test_never_eviction_keeps_returning_trackers() {
    let mut mon = standard_monitor();
    mon.process_frame(&frame(0, vec![det(1, 0, [500.0, 500.0])])).unwrap();
    for frame_id in 1..50 {
        mon.process_frame(&frame(frame_id, vec![])).unwrap();
    }
    mon.process_frame(&frame(50, vec![det(1, 0, [500.0, 580.0])])).unwrap();
    assert_eq!(mon.zone_stats("door").unwrap().total_in, Some(1));
}

#[test]
fn test_anchor_policy_changes_which_point_is_tested() {
    let config = MonitorConfig::builder()
        .anchor(AnchorPolicy::TopCenter)
        .region("lobby", SQUARE)
        .build()
        .unwrap();
    let mut mon = ZoneMonitor::new(config).unwrap();
    // Box top edge inside the square, bottom edge well below it.
    let tall = TrackedDetection::new(1u64, 0u32, 0.9, BoundingBox::new(180.0, 300.0, 220.0, 700.0));
    mon.process_frame(&frame(0, vec![tall])).unwrap();
    assert_eq!(mon.zone_stats("lobby").unwrap().total_count, 1);
}
