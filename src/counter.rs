//! Zone statistics aggregation.
//!
//! A [`ZoneCounter`] consumes one [`ZoneEvaluation`] per frame and hands out
//! immutable [`ZoneStats`] snapshots by value. Region counts are gauges;
//! boundary counts only ever grow until [`ZoneCounter::reset`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detection::ClassId;
use crate::frame::{CrossingDirection, ZoneEvaluation};
use crate::zone::ZoneKind;

/// In/out crossing totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CrossingCounts {
    /// Crossings mapped to `in`.
    pub total_in: u64,
    /// Crossings mapped to `out`.
    pub total_out: u64,
}

impl CrossingCounts {
    /// `total_in + total_out`.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total_in + self.total_out
    }

    fn record(&mut self, direction: CrossingDirection) {
        match direction {
            CrossingDirection::In => self.total_in += 1,
            CrossingDirection::Out => self.total_out += 1,
        }
    }
}

/// Point-in-time statistics for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneStats {
    /// Shape the statistics belong to.
    pub zone_type: ZoneKind,
    /// Region: identities inside now. Boundary: `total_in + total_out`.
    pub total_count: u64,
    /// Region: identities inside now per class. Boundary: cumulative crossings per class.
    pub count_per_class: BTreeMap<ClassId, u64>,
    /// Boundary only.
    pub total_in: Option<u64>,
    /// Boundary only.
    pub total_out: Option<u64>,
    /// Boundary only: in/out breakdown per class.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub crossings_per_class: BTreeMap<ClassId, CrossingCounts>,
    /// Frames folded into these statistics since creation or the last reset.
    pub frames_evaluated: u64,
}

impl ZoneStats {
    /// Count for one class, zero when the class was never seen.
    #[must_use]
    pub fn class_count(&self, class_id: ClassId) -> u64 {
        self.count_per_class.get(&class_id).copied().unwrap_or(0)
    }

    /// `count_per_class` keyed by display name.
    ///
    /// Classes without a configured name are labelled `class_<id>`. Classes
    /// sharing a name are summed.
    #[must_use]
    pub fn count_per_label(
        &self,
        class_names: &BTreeMap<ClassId, String>,
    ) -> BTreeMap<String, u64> {
        let mut labelled = BTreeMap::new();
        for (class_id, count) in &self.count_per_class {
            *labelled.entry(class_label(*class_id, class_names)).or_insert(0) += count;
        }
        labelled
    }

    /// Region occupancy, `None` for boundaries.
    #[must_use]
    pub const fn current_count(&self) -> Option<u64> {
        match self.zone_type {
            ZoneKind::Region => Some(self.total_count),
            ZoneKind::Boundary => None,
        }
    }
}

/// Display name for a class, falling back to `class_<id>`.
#[must_use]
pub fn class_label(class_id: ClassId, class_names: &BTreeMap<ClassId, String>) -> String {
    class_names
        .get(&class_id)
        .cloned()
        .unwrap_or_else(|| format!("class_{class_id}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Accumulator {
    #[default]
    Empty,
    Region {
        current: u64,
        per_class: BTreeMap<ClassId, u64>,
    },
    Boundary {
        totals: CrossingCounts,
        per_class: BTreeMap<ClassId, CrossingCounts>,
    },
}

/// Statistics aggregator owned by a single zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneCounter {
    kind: ZoneKind,
    acc: Accumulator,
    frames: u64,
}

impl ZoneCounter {
    /// Creates a zeroed counter for a zone of the given kind.
    #[must_use]
    pub fn new(kind: ZoneKind) -> Self {
        Self {
            kind,
            acc: Accumulator::Empty,
            frames: 0,
        }
    }

    /// Kind of zone this counter aggregates.
    #[must_use]
    pub const fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// Folds one frame's evaluation into the statistics.
    ///
    /// Evaluations of the other kind are ignored.
    pub fn update(&mut self, evaluation: &ZoneEvaluation) {
        match (self.kind, evaluation) {
            (ZoneKind::Region, ZoneEvaluation::Region { inside }) => {
                let mut per_class = match std::mem::take(&mut self.acc) {
                    Accumulator::Region { mut per_class, .. } => {
                        per_class.clear();
                        per_class
                    }
                    _ => BTreeMap::new(),
                };
                for occupant in inside {
                    *per_class.entry(occupant.class_id).or_insert(0) += 1;
                }
                self.acc = Accumulator::Region {
                    current: inside.len() as u64,
                    per_class,
                };
            }
            (ZoneKind::Boundary, ZoneEvaluation::Boundary { crossings }) => {
                if !matches!(self.acc, Accumulator::Boundary { .. }) {
                    self.acc = Accumulator::Boundary {
                        totals: CrossingCounts::default(),
                        per_class: BTreeMap::new(),
                    };
                }
                if let Accumulator::Boundary { totals, per_class } = &mut self.acc {
                    for event in crossings {
                        totals.record(event.direction);
                        per_class.entry(event.class_id).or_default().record(event.direction);
                    }
                }
            }
            _ => return,
        }
        self.frames += 1;
    }

    /// Current statistics. Pure: repeated calls without an update are equal.
    #[must_use]
    pub fn snapshot(&self) -> ZoneStats {
        let (total_count, count_per_class, totals, crossings_per_class) = match &self.acc {
            Accumulator::Empty => (0, BTreeMap::new(), CrossingCounts::default(), BTreeMap::new()),
            Accumulator::Region { current, per_class } => {
                (*current, per_class.clone(), CrossingCounts::default(), BTreeMap::new())
            }
            Accumulator::Boundary { totals, per_class } => (
                totals.total(),
                per_class.iter().map(|(class, c)| (*class, c.total())).collect(),
                *totals,
                per_class.clone(),
            ),
        };
        let boundary = self.kind == ZoneKind::Boundary;
        ZoneStats {
            zone_type: self.kind,
            total_count,
            count_per_class,
            total_in: boundary.then_some(totals.total_in),
            total_out: boundary.then_some(totals.total_out),
            crossings_per_class,
            frames_evaluated: self.frames,
        }
    }

    /// Zeroes every accumulator. Crossing state lives elsewhere and is untouched.
    pub fn reset(&mut self) {
        self.acc = Accumulator::Empty;
        self.frames = 0;
    }
}
