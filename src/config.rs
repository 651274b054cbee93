//! Monitor configuration.
//!
//! A [`MonitorConfig`] can be deserialized from YAML or JSON, or assembled
//! with [`MonitorConfigBuilder`]. Either way it is validated in one pass that
//! reports every problem it finds.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::crossing::{DirectionMapping, EvictionPolicy};
use crate::detection::{AnchorPolicy, ClassId};
use crate::error::{ConfigErrors, ValidationError, ZoneResult};
use crate::geometry::FrameResolution;
use crate::zone::{Zone, ZoneSpec};

/// Runtime settings for one monitor session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Stream identifier stamped into every zone-event message.
    pub source_id: u32,
    /// Frame coordinate space for detections and zones.
    pub frame_resolution: FrameResolution,
    /// Bounding-box anchor used for every detection.
    pub anchor: AnchorPolicy,
    /// Crossing-state retention for boundary zones.
    pub crossing_eviction: EvictionPolicy,
    /// Max queued control requests.
    pub control_queue_capacity: usize,
    /// Per-subscriber event buffer.
    pub stream_capacity: usize,
    /// Display names for detector classes, used to label statistics.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub class_names: BTreeMap<ClassId, String>,
    /// Zones registered at startup, in evaluation order.
    pub zones: Vec<ZoneSpec>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_id: 0,
            frame_resolution: FrameResolution::default(),
            anchor: AnchorPolicy::default(),
            crossing_eviction: EvictionPolicy::default(),
            control_queue_capacity: 1024,
            stream_capacity: 256,
            class_names: BTreeMap::new(),
            zones: Vec::new(),
        }
    }
}

impl MonitorConfig {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> MonitorConfigBuilder {
        MonitorConfigBuilder::new()
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(yaml: &str) -> ZoneResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> ZoneResult<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses and validates a JSON document.
    pub fn from_json_str(json: &str) -> ZoneResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every setting and every zone, collecting all errors.
    pub fn validate(&self) -> Result<(), ConfigErrors> {
        self.build_zones().map(|_| ())
    }

    /// Validates the config and constructs its zones in declaration order.
    pub fn build_zones(&self) -> Result<Vec<Zone>, ConfigErrors> {
        let mut errors = ConfigErrors::new();

        let frame_ok = match self.frame_resolution.validate() {
            Ok(()) => true,
            Err(e) => {
                errors.push(e);
                false
            }
        };
        if self.control_queue_capacity == 0 {
            errors.push(ValidationError::ZeroCapacity {
                field: "control_queue_capacity".to_string(),
            });
        }
        if self.stream_capacity == 0 {
            errors.push(ValidationError::ZeroCapacity {
                field: "stream_capacity".to_string(),
            });
        }
        for (class_id, name) in &self.class_names {
            if name.trim().is_empty() {
                errors.push(ValidationError::EmptyClassName {
                    class_id: *class_id,
                });
            }
        }
        // A zero window is reported once here; zones are still checked
        // against the smallest valid one.
        let eviction = if self.crossing_eviction == EvictionPolicy::AfterIdleEvaluations(0) {
            errors.push(ValidationError::ZeroEvictionWindow);
            EvictionPolicy::AfterIdleEvaluations(1)
        } else {
            self.crossing_eviction
        };

        let mut zones = Vec::with_capacity(self.zones.len());
        let mut seen = HashSet::with_capacity(self.zones.len());
        for spec in &self.zones {
            if !seen.insert(spec.zone_id.as_str()) {
                errors.push(ValidationError::DuplicateZoneId {
                    zone_id: spec.zone_id.clone(),
                });
                continue;
            }
            // Without a usable frame only the frame-independent checks apply.
            if !frame_ok {
                if let Err(e) = spec.check_shape() {
                    errors.push(e);
                }
                continue;
            }
            match Zone::from_spec(spec, self.frame_resolution, eviction) {
                Ok(zone) => zones.push(zone),
                Err(e) => errors.push(e),
            }
        }

        errors.into_result()?;
        Ok(zones)
    }
}

/// Incremental [`MonitorConfig`] construction with deferred validation.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfigBuilder {
    config: MonitorConfig,
}

impl MonitorConfigBuilder {
    /// Creates a builder holding the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source id.
    #[must_use]
    pub fn source_id(mut self, source_id: u32) -> Self {
        self.config.source_id = source_id;
        self
    }

    /// Set the frame size in pixels.
    #[must_use]
    pub fn frame_resolution(mut self, width: u32, height: u32) -> Self {
        self.config.frame_resolution = FrameResolution { width, height };
        self
    }

    /// Set the anchor policy.
    #[must_use]
    pub fn anchor(mut self, anchor: AnchorPolicy) -> Self {
        self.config.anchor = anchor;
        self
    }

    /// Set the crossing-state eviction policy.
    #[must_use]
    pub fn crossing_eviction(mut self, policy: EvictionPolicy) -> Self {
        self.config.crossing_eviction = policy;
        self
    }

    /// Set the control queue capacity.
    #[must_use]
    pub fn control_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.control_queue_capacity = capacity;
        self
    }

    /// Set the per-subscriber stream capacity.
    #[must_use]
    pub fn stream_capacity(mut self, capacity: usize) -> Self {
        self.config.stream_capacity = capacity;
        self
    }

    /// Name a detector class for labelled statistics.
    #[must_use]
    pub fn class_name(mut self, class_id: impl Into<ClassId>, name: impl Into<String>) -> Self {
        self.config.class_names.insert(class_id.into(), name.into());
        self
    }

    /// Append a zone.
    #[must_use]
    pub fn zone(mut self, spec: ZoneSpec) -> Self {
        self.config.zones.push(spec);
        self
    }

    /// Append a region zone.
    #[must_use]
    pub fn region(
        self,
        zone_id: impl Into<String>,
        vertices: impl IntoIterator<Item = [f64; 2]>,
    ) -> Self {
        self.zone(ZoneSpec::region(zone_id, vertices))
    }

    /// Append a boundary zone.
    #[must_use]
    pub fn boundary(
        self,
        zone_id: impl Into<String>,
        start: [f64; 2],
        end: [f64; 2],
        direction: DirectionMapping,
    ) -> Self {
        self.zone(ZoneSpec::boundary(zone_id, start, end).with_direction(direction))
    }

    /// Validates everything and returns the config, or every error found.
    pub fn build(self) -> Result<MonitorConfig, ConfigErrors> {
        self.config.validate()?;
        Ok(self.config)
    }
}
