//! Per-identity crossing state for boundary zones.
//!
//! Each tracker id maps to the last definite side it was seen on. A crossing
//! is emitted exactly when a definite reading differs from the stored side.
//! Readings exactly on the line never change state.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::detection::TrackerId;
use crate::frame::CrossingDirection;
use crate::geometry::Side;

/// How a side change maps to an `in` / `out` crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionMapping {
    /// Negative to positive is `in`, positive to negative is `out`.
    #[default]
    PositiveIsIn,
    /// Positive to negative is `in`, negative to positive is `out`.
    NegativeIsIn,
}

impl DirectionMapping {
    /// Direction of a move that ends on side `to`.
    #[must_use]
    pub const fn direction(self, to: Side) -> CrossingDirection {
        match (self, to) {
            (Self::PositiveIsIn, Side::Positive) | (Self::NegativeIsIn, Side::Negative) => {
                CrossingDirection::In
            }
            _ => CrossingDirection::Out,
        }
    }
}

/// When crossing state for silent trackers is discarded.
///
/// `Never` keeps every identity for the life of the zone, so a tracker that
/// reappears on the other side still counts as a crossing. Eviction trades
/// that for bounded memory and must be chosen explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy", content = "evaluations")]
pub enum EvictionPolicy {
    /// Keep state forever.
    #[default]
    Never,
    /// Forget an identity after this many consecutive evaluations without it.
    AfterIdleEvaluations(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    side: Side,
    last_seen: u64,
}

/// Last known side per tracker id for one boundary zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossingTracker {
    mapping: DirectionMapping,
    eviction: EvictionPolicy,
    sides: HashMap<TrackerId, Entry>,
    evaluation: u64,
}

impl CrossingTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new(mapping: DirectionMapping, eviction: EvictionPolicy) -> Self {
        Self {
            mapping,
            eviction,
            sides: HashMap::new(),
            evaluation: 0,
        }
    }

    /// Direction mapping fixed at creation.
    #[must_use]
    pub const fn mapping(&self) -> DirectionMapping {
        self.mapping
    }

    /// Eviction policy fixed at creation.
    #[must_use]
    pub const fn eviction(&self) -> EvictionPolicy {
        self.eviction
    }

    /// Feeds one reading and returns the crossing it completes, if any.
    ///
    /// `None` readings refresh the idle age of a known identity but never
    /// create or change a side.
    pub fn observe(
        &mut self,
        tracker_id: TrackerId,
        reading: Option<Side>,
    ) -> Option<CrossingDirection> {
        let evaluation = self.evaluation;
        let Some(side) = reading else {
            if let Some(entry) = self.sides.get_mut(&tracker_id) {
                entry.last_seen = evaluation;
            }
            return None;
        };

        match self.sides.get_mut(&tracker_id) {
            None => {
                self.sides.insert(
                    tracker_id,
                    Entry {
                        side,
                        last_seen: evaluation,
                    },
                );
                None
            }
            Some(entry) => {
                entry.last_seen = evaluation;
                if entry.side == side {
                    None
                } else {
                    entry.side = side;
                    Some(self.mapping.direction(side))
                }
            }
        }
    }

    /// Last definite side for a tracker, `None` while unknown.
    #[must_use]
    pub fn side_of(&self, tracker_id: TrackerId) -> Option<Side> {
        self.sides.get(&tracker_id).map(|e| e.side)
    }

    /// Number of identities with a known side.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sides.len()
    }

    /// True when no identity has a known side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sides.is_empty()
    }

    /// Keeps only the given identities. Returns how many were dropped.
    pub fn prune(&mut self, active: &[TrackerId]) -> usize {
        let keep: HashSet<TrackerId> = active.iter().copied().collect();
        let before = self.sides.len();
        self.sides.retain(|id, _| keep.contains(id));
        before - self.sides.len()
    }

    /// Closes the current evaluation and applies the eviction policy.
    ///
    /// Called once per evaluation of the owning zone, so idle age only
    /// advances while the zone is enabled. Returns how many identities were
    /// evicted.
    pub fn evict_idle(&mut self) -> usize {
        let current = self.evaluation;
        self.evaluation = self.evaluation.wrapping_add(1);
        let EvictionPolicy::AfterIdleEvaluations(window) = self.eviction else {
            return 0;
        };
        let before = self.sides.len();
        self.sides
            .retain(|_, entry| current.saturating_sub(entry.last_seen) < window);
        before - self.sides.len()
    }

    /// Forgets every identity.
    pub fn clear(&mut self) {
        self.sides.clear();
    }
}

impl Default for CrossingTracker {
    fn default() -> Self {
        Self::new(DirectionMapping::default(), EvictionPolicy::default())
    }
}
