use std::alloc::System;

use stats_alloc::{Region, StatsAlloc, INSTRUMENTED_SYSTEM};

use zonewatch::{
    AnchorPolicy, BoundingBox, DetectionFrame, DirectionMapping, MonitorConfig, Point,
    TrackedDetection, ZoneMonitor,
};

#[global_allocator]
static GLOBAL: &StatsAlloc<System> = &INSTRUMENTED_SYSTEM;

const TRACKERS: u64 = 32;

fn frame(frame_id: u64) -> DetectionFrame {
    // Every tracker oscillates across the door line so crossing state is
    // updated on every frame.
    let y = if frame_id % 2 == 0 { 500.0 } else { 580.0 };
    let detections = (0..TRACKERS)
        .map(|t| {
            let x = 50.0 + 50.0 * t as f64;
            TrackedDetection::new(
                t,
                (t % 3) as u32,
                0.8,
                BoundingBox::around(Point::new(x, y), AnchorPolicy::BottomCenter, 30.0, 60.0),
            )
        })
        .collect();
    DetectionFrame::new(frame_id, detections)
}

// Single test in this binary: the allocator stats are process-wide.
#[test]
fn test_crossing_state_does_not_grow_with_a_fixed_population() {
    let config = MonitorConfig::builder()
        .region("left", [[0.0, 400.0], [800.0, 400.0], [800.0, 700.0], [0.0, 700.0]])
        .region("right", [[800.0, 400.0], [1900.0, 400.0], [1900.0, 700.0], [800.0, 700.0]])
        .boundary("door", [0.0, 540.0], [1920.0, 540.0], DirectionMapping::PositiveIsIn)
        .build()
        .unwrap();
    let mut mon = ZoneMonitor::new(config).unwrap();
    let stream = mon.subscribe();

    let frames: Vec<DetectionFrame> = (0..1_200).map(frame).collect();

    // Warm up: fill the crossing map, class maps and anchor buffer.
    for f in &frames[..200] {
        mon.process_frame(f).unwrap();
        let _ = stream.drain();
    }

    let region = Region::new(GLOBAL);
    for f in &frames[200..] {
        let result = mon.process_frame(f).unwrap();
        drop(result);
        let _ = stream.drain();
    }
    let stats = region.change();

    let net = stats.bytes_allocated as i128 - stats.bytes_deallocated as i128;
    assert!(net.abs() <= 64 * 1024, "retained memory grew across 1000 frames: {stats:?}");

    // Generous per-frame budget. The goal is to catch per-tracker leaks, not
    // to pin an exact allocation count.
    assert!(
        stats.allocations <= 1_000 * 400,
        "frame processing allocated too much: {stats:?}"
    );
    assert_eq!(mon.zone_info("door").unwrap().tracked_identities, TRACKERS as usize);
    assert_eq!(mon.zone_stats("door").unwrap().total_count, 1_199 * TRACKERS);
}
