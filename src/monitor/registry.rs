//! Ordered zone registry.
//!
//! Zones are evaluated in registration order. Updates replace a zone in
//! place so its position is kept.

use tracing::info;

use crate::counter::ZoneStats;
use crate::error::{ControlError, ZoneError, ZoneResult};
use crate::geometry::FrameResolution;
use crate::zone::{EvictionPolicy, Zone, ZoneId, ZoneInfo, ZoneSpec};

/// Registration-ordered collection of zones sharing one frame space.
#[derive(Debug, Clone)]
pub struct ZoneRegistry {
    zones: Vec<Zone>,
    frame: FrameResolution,
    eviction: EvictionPolicy,
}

impl ZoneRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(frame: FrameResolution, eviction: EvictionPolicy) -> Self {
        Self {
            zones: Vec::new(),
            frame,
            eviction,
        }
    }

    /// Creates a registry from zones built by a validated config.
    pub(crate) fn with_zones(
        zones: Vec<Zone>,
        frame: FrameResolution,
        eviction: EvictionPolicy,
    ) -> Self {
        for zone in &zones {
            info!(
                zone_id = %zone.id(),
                zone_type = %zone.kind(),
                enabled = zone.is_enabled(),
                "zone registered"
            );
        }
        Self {
            zones,
            frame,
            eviction,
        }
    }

    /// Frame space every zone was validated against.
    #[must_use]
    pub const fn frame(&self) -> FrameResolution {
        self.frame
    }

    /// Number of registered zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True when no zone is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Looks up a zone.
    #[must_use]
    pub fn get(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.iter().find(|z| z.id().as_str() == zone_id)
    }

    fn position(&self, zone_id: &ZoneId) -> Result<usize, ControlError> {
        self.zones
            .iter()
            .position(|z| z.id() == zone_id)
            .ok_or_else(|| ControlError::ZoneNotFound {
                zone_id: zone_id.clone(),
            })
    }

    /// Registers a new zone at the end of the evaluation order.
    pub fn add(&mut self, spec: &ZoneSpec) -> ZoneResult<ZoneInfo> {
        let zone = Zone::from_spec(spec, self.frame, self.eviction)?;
        if self.get(zone.id().as_str()).is_some() {
            return Err(ControlError::ZoneAlreadyExists {
                zone_id: zone.id().clone(),
            }
            .into());
        }
        let info = zone.info();
        info!(
            zone_id = %info.zone_id,
            zone_type = %info.zone_type,
            enabled = info.enabled,
            "zone registered"
        );
        self.zones.push(zone);
        Ok(info)
    }

    /// Removes a zone together with its counter and crossing state.
    pub fn remove(&mut self, zone_id: &ZoneId) -> Result<ZoneInfo, ControlError> {
        let idx = self.position(zone_id)?;
        let zone = self.zones.remove(idx);
        info!(zone_id = %zone_id, "zone removed");
        Ok(zone.info())
    }

    /// Replaces a zone's geometry. The kind must not change; the enabled
    /// flag is kept and counter and crossing state start fresh.
    pub fn update(&mut self, spec: &ZoneSpec) -> ZoneResult<ZoneInfo> {
        let zone_id = ZoneId::new(spec.zone_id.as_str())?;
        let idx = self.position(&zone_id)?;
        let existing = &self.zones[idx];
        if existing.kind() != spec.zone_type {
            return Err(ZoneError::Control(ControlError::ZoneKindMismatch {
                zone_id,
                existing: existing.kind(),
                requested: spec.zone_type,
            }));
        }

        let mut replacement = Zone::from_spec(spec, self.frame, self.eviction)?;
        replacement.set_enabled(existing.is_enabled());
        let info = replacement.info();
        self.zones[idx] = replacement;
        info!(zone_id = %zone_id, zone_type = %info.zone_type, "zone updated");
        Ok(info)
    }

    /// Sets a zone's enabled flag. Returns true when the flag changed.
    pub fn set_enabled(&mut self, zone_id: &ZoneId, enabled: bool) -> Result<bool, ControlError> {
        let idx = self.position(zone_id)?;
        let changed = self.zones[idx].set_enabled(enabled) != enabled;
        if changed {
            if enabled {
                info!(zone_id = %zone_id, "zone enabled");
            } else {
                info!(zone_id = %zone_id, "zone disabled");
            }
        }
        Ok(changed)
    }

    /// Zeroes a zone's statistics. Crossing state is kept.
    pub fn reset(&mut self, zone_id: &ZoneId) -> Result<(), ControlError> {
        let idx = self.position(zone_id)?;
        self.zones[idx].reset_stats();
        info!(zone_id = %zone_id, "zone statistics reset");
        Ok(())
    }

    /// Description of one zone.
    pub fn info(&self, zone_id: &ZoneId) -> Result<ZoneInfo, ControlError> {
        let idx = self.position(zone_id)?;
        Ok(self.zones[idx].info())
    }

    /// Statistics for one zone.
    pub fn stats(&self, zone_id: &ZoneId) -> Result<ZoneStats, ControlError> {
        let idx = self.position(zone_id)?;
        Ok(self.zones[idx].stats())
    }

    /// Every zone, in evaluation order.
    #[must_use]
    pub fn list(&self) -> Vec<ZoneInfo> {
        self.zones.iter().map(Zone::info).collect()
    }

    /// Statistics for every zone, in evaluation order.
    #[must_use]
    pub fn all_stats(&self) -> Vec<(ZoneId, ZoneStats)> {
        self.zones.iter().map(|z| (z.id().clone(), z.stats())).collect()
    }

    pub(crate) fn zones_mut(&mut self) -> impl Iterator<Item = &mut Zone> {
        self.zones.iter_mut()
    }
}
