//! Zone-event wire schema.
//!
//! One [`ZoneEventMessage`] is built per processed frame and fanned out to
//! event-stream subscribers. The JSON shape is stable under
//! [`SCHEMA_VERSION`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::detection::TrackerId;
use crate::error::{ZoneError, ZoneResult};
use crate::frame::{CrossingDirection, FrameResult, ZoneEvaluation};
use crate::zone::{ZoneId, ZoneKind};

/// Version tag written into every message.
pub const SCHEMA_VERSION: &str = "1.0";

/// Kind of zone event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    /// Region occupancy report.
    Inside,
    /// Boundary crossings in one direction.
    Crossing,
}

/// Statistics attached to an entry. Fields that do not apply are `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventStats {
    /// Boundary entries only.
    pub total_in: Option<u64>,
    /// Boundary entries only.
    pub total_out: Option<u64>,
    /// Region entries only.
    pub current_count: Option<u64>,
}

/// One zone's event within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventEntry {
    /// Zone that produced the entry.
    pub zone_id: ZoneId,
    /// Region or boundary.
    pub zone_type: ZoneKind,
    /// `inside` for regions, `crossing` for boundaries.
    pub event_type: EventType,
    /// Present on crossing entries only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crossing_direction: Option<CrossingDirection>,
    /// Counter values after this frame.
    pub stats: EventStats,
    /// Identities that produced this entry, in detection order.
    pub triggered_by: Vec<TrackerId>,
}

impl ZoneEventEntry {
    fn check(&self) -> Result<(), String> {
        match (self.event_type, self.crossing_direction) {
            (EventType::Crossing, None) => Err(format!(
                "crossing entry for zone '{}' has no crossing_direction",
                self.zone_id
            )),
            (EventType::Inside, Some(_)) => Err(format!(
                "inside entry for zone '{}' carries a crossing_direction",
                self.zone_id
            )),
            _ => Ok(()),
        }
    }
}

/// Per-frame zone-event message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneEventMessage {
    /// Always [`SCHEMA_VERSION`] when built here.
    pub schema_version: String,
    /// Capture time of the frame.
    pub timestamp: DateTime<Utc>,
    /// Frame the entries were computed from.
    pub frame_id: u64,
    /// Camera / stream the frame came from.
    pub source_id: u32,
    /// Entries in zone evaluation order.
    pub zones: Vec<ZoneEventEntry>,
}

impl ZoneEventMessage {
    /// Builds the message for a processed frame.
    ///
    /// Each region yields one `inside` entry. Each boundary yields one
    /// `crossing` entry per direction that saw at least one crossing.
    #[must_use]
    pub fn from_frame(result: &FrameResult, source_id: u32) -> Self {
        let mut zones = Vec::with_capacity(result.zones.len());
        for zone in &result.zones {
            match &zone.evaluation {
                ZoneEvaluation::Region { inside } => zones.push(ZoneEventEntry {
                    zone_id: zone.zone_id.clone(),
                    zone_type: ZoneKind::Region,
                    event_type: EventType::Inside,
                    crossing_direction: None,
                    stats: EventStats {
                        total_in: None,
                        total_out: None,
                        current_count: Some(zone.stats.total_count),
                    },
                    triggered_by: inside.iter().map(|o| o.tracker_id).collect(),
                }),
                ZoneEvaluation::Boundary { .. } => {
                    for direction in [CrossingDirection::In, CrossingDirection::Out] {
                        let ids = zone.evaluation.crossed(direction);
                        if ids.is_empty() {
                            continue;
                        }
                        zones.push(ZoneEventEntry {
                            zone_id: zone.zone_id.clone(),
                            zone_type: ZoneKind::Boundary,
                            event_type: EventType::Crossing,
                            crossing_direction: Some(direction),
                            stats: EventStats {
                                total_in: zone.stats.total_in,
                                total_out: zone.stats.total_out,
                                current_count: None,
                            },
                            triggered_by: ids,
                        });
                    }
                }
            }
        }

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            timestamp: result.timestamp,
            frame_id: result.frame_id,
            source_id,
            zones,
        }
    }

    /// True when no zone produced an entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First entry for a zone.
    #[must_use]
    pub fn get_zone_by_id(&self, zone_id: &str) -> Option<&ZoneEventEntry> {
        self.zones.iter().find(|z| z.zone_id.as_str() == zone_id)
    }

    /// Every entry produced by zones of the given kind.
    #[must_use]
    pub fn zones_by_kind(&self, kind: ZoneKind) -> Vec<&ZoneEventEntry> {
        self.zones.iter().filter(|z| z.zone_type == kind).collect()
    }

    /// Compact JSON encoding.
    pub fn to_json(&self) -> ZoneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Pretty-printed JSON encoding.
    pub fn to_json_pretty(&self) -> ZoneResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decodes and checks entry consistency.
    pub fn from_json(json: &str) -> ZoneResult<Self> {
        let msg: Self = serde_json::from_str(json)?;
        for entry in &msg.zones {
            entry.check().map_err(ZoneError::serialization)?;
        }
        Ok(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::ZoneCounter;
    use crate::detection::ClassId;
    use crate::frame::{CrossingEvent, Occupant, ZoneFrameResult};

    fn frame() -> FrameResult {
        let region_eval = ZoneEvaluation::Region {
            inside: vec![Occupant {
                tracker_id: TrackerId::new(1),
                class_id: ClassId::new(0),
            }],
        };
        let mut region_counter = ZoneCounter::new(ZoneKind::Region);
        region_counter.update(&region_eval);

        let line_eval = ZoneEvaluation::Boundary {
            crossings: vec![
                CrossingEvent {
                    tracker_id: TrackerId::new(2),
                    class_id: ClassId::new(0),
                    direction: CrossingDirection::In,
                },
                CrossingEvent {
                    tracker_id: TrackerId::new(3),
                    class_id: ClassId::new(2),
                    direction: CrossingDirection::In,
                },
            ],
        };
        let mut line_counter = ZoneCounter::new(ZoneKind::Boundary);
        line_counter.update(&line_eval);

        FrameResult {
            frame_id: 42,
            timestamp: Utc::now(),
            zones: vec![
                ZoneFrameResult {
                    zone_id: ZoneId::new("lobby").unwrap(),
                    evaluation: region_eval,
                    stats: region_counter.snapshot(),
                },
                ZoneFrameResult {
                    zone_id: ZoneId::new("door").unwrap(),
                    evaluation: line_eval,
                    stats: line_counter.snapshot(),
                },
            ],
        }
    }

    #[test]
    fn test_builds_one_entry_per_region_and_direction() {
        let msg = ZoneEventMessage::from_frame(&frame(), 3);
        assert_eq!(msg.schema_version, "1.0");
        assert_eq!(msg.source_id, 3);
        assert_eq!(msg.zones.len(), 2);

        let lobby = msg.get_zone_by_id("lobby").unwrap();
        assert_eq!(lobby.event_type, EventType::Inside);
        assert_eq!(lobby.stats.current_count, Some(1));
        assert_eq!(lobby.stats.total_in, None);
        assert_eq!(lobby.crossing_direction, None);

        let door = msg.get_zone_by_id("door").unwrap();
        assert_eq!(door.crossing_direction, Some(CrossingDirection::In));
        assert_eq!(door.triggered_by, vec![TrackerId::new(2), TrackerId::new(3)]);
        assert_eq!(door.stats.total_in, Some(2));
        assert_eq!(door.stats.total_out, Some(0));
        assert_eq!(door.stats.current_count, None);

        assert_eq!(msg.zones_by_kind(ZoneKind::Boundary).len(), 1);
    }

    #[test]
    fn test_json_shape_uses_nulls_and_omits_direction_for_inside() {
        let msg = ZoneEventMessage::from_frame(&frame(), 0);
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        let lobby = &value["zones"][0];
        assert_eq!(lobby["zone_type"], "region");
        assert_eq!(lobby["event_type"], "inside");
        assert!(lobby.get("crossing_direction").is_none());
        assert!(lobby["stats"]["total_in"].is_null());
        let door = &value["zones"][1];
        assert_eq!(door["crossing_direction"], "in");
        assert!(door["stats"]["current_count"].is_null());
    }

    #[test]
    fn test_decode_rejects_crossing_without_direction() {
        let json = r#"{
            "schema_version": "1.0",
            "timestamp": "2024-01-01T00:00:00Z",
            "frame_id": 1,
            "source_id": 0,
            "zones": [{
                "zone_id": "door",
                "zone_type": "line",
                "event_type": "crossing",
                "stats": {"total_in": 1, "total_out": 0, "current_count": null},
                "triggered_by": [4]
            }]
        }"#;
        let err = ZoneEventMessage::from_json(json).unwrap_err();
        assert!(format!("{err}").contains("no crossing_direction"));
    }

    #[test]
    fn test_decode_accepts_encoded_message() {
        let msg = ZoneEventMessage::from_frame(&frame(), 9);
        let decoded = ZoneEventMessage::from_json(&msg.to_json_pretty().unwrap()).unwrap();
        assert_eq!(decoded, msg);
    }
}
