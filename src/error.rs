//! Error types for zonewatch.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions. Construction-time problems surface as
//! [`ValidationError`], control-plane problems as [`ControlError`], and
//! [`ZoneError`] wraps both for the public API.

use std::fmt;

use thiserror::Error;

use crate::detection::{ClassId, TrackerId};
use crate::zone::{FrameResolution, ZoneId, ZoneKind};

/// Validation errors raised while constructing zones, configs or frames.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Zone '{zone_id}': polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { zone_id: String, count: usize },

    #[error("Zone '{zone_id}': boundary needs exactly 2 endpoints, got {count}")]
    WrongEndpointCount { zone_id: String, count: usize },

    #[error("Zone '{zone_id}': boundary endpoints coincide at ({x}, {y})")]
    CoincidentEndpoints { zone_id: String, x: f64, y: f64 },

    #[error("Zone '{zone_id}': polygon has zero area")]
    DegeneratePolygon { zone_id: String },

    #[error("Zone '{zone_id}': coordinate {index} is not finite")]
    NonFiniteCoordinate { zone_id: String, index: usize },

    #[error("Zone '{zone_id}': coordinate {index} ({x}, {y}) is outside frame {width}x{height}")]
    CoordinateOutOfFrame {
        zone_id: String,
        index: usize,
        x: f64,
        y: f64,
        width: u32,
        height: u32,
    },

    #[error("Frame resolution must be positive, got {width}x{height}")]
    InvalidFrameResolution { width: u32, height: u32 },

    #[error("Invalid zone id '{zone_id}': {reason}")]
    InvalidZoneId { zone_id: String, reason: String },

    #[error("Zone '{zone_id}' declares frame {zone} but the monitor runs at {monitor}")]
    ResolutionMismatch {
        zone_id: String,
        zone: FrameResolution,
        monitor: FrameResolution,
    },

    #[error("Duplicate zone id '{zone_id}' in configuration")]
    DuplicateZoneId { zone_id: String },

    #[error("Detection for tracker {tracker_id}: confidence {value} is out of range [0.0, 1.0]")]
    ConfidenceOutOfRange { tracker_id: TrackerId, value: f32 },

    #[error("Detection for tracker {tracker_id}: bounding box is malformed ({reason})")]
    InvalidBoundingBox { tracker_id: TrackerId, reason: String },

    #[error("Tracker id {tracker_id} appears more than once in frame {frame_id}")]
    DuplicateTrackerId { tracker_id: TrackerId, frame_id: u64 },

    #[error("Field '{field}' must be greater than zero")]
    ZeroCapacity { field: String },

    #[error("Crossing eviction window must be at least one evaluation")]
    ZeroEvictionWindow,

    #[error("Class {class_id} has an empty display name")]
    EmptyClassName { class_id: ClassId },
}

impl ValidationError {
    /// The zone this error refers to, if any.
    #[must_use]
    pub fn zone_id(&self) -> Option<&str> {
        match self {
            Self::TooFewVertices { zone_id, .. }
            | Self::WrongEndpointCount { zone_id, .. }
            | Self::CoincidentEndpoints { zone_id, .. }
            | Self::DegeneratePolygon { zone_id }
            | Self::NonFiniteCoordinate { zone_id, .. }
            | Self::CoordinateOutOfFrame { zone_id, .. }
            | Self::InvalidZoneId { zone_id, .. }
            | Self::ResolutionMismatch { zone_id, .. }
            | Self::DuplicateZoneId { zone_id } => Some(zone_id),
            _ => None,
        }
    }
}

/// Every validation error collected by a single configuration build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigErrors(Vec<ValidationError>);

impl ConfigErrors {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Records another error.
    pub fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Returns true when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over the recorded errors in discovery order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} configuration error(s)", self.0.len())?;
        for err in &self.0 {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ValidationError> for ConfigErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl IntoIterator for ConfigErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Control-plane errors. None of these affect processing of other zones.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("Zone not found: {zone_id}")]
    ZoneNotFound { zone_id: ZoneId },

    #[error("Zone already exists: {zone_id}")]
    ZoneAlreadyExists { zone_id: ZoneId },

    #[error("Zone '{zone_id}' is a {existing} zone and cannot become a {requested} zone")]
    ZoneKindMismatch {
        zone_id: ZoneId,
        existing: ZoneKind,
        requested: ZoneKind,
    },

    #[error("Command '{command}' not available. Available commands: {available}")]
    CommandNotAvailable { command: String, available: String },

    #[error("Malformed command: {reason}")]
    MalformedCommand { reason: String },

    #[error("Queue full: {path} (capacity {capacity})")]
    QueueFull { path: String, capacity: usize },

    #[error("Channel disconnected: {path}")]
    Disconnected { path: String },

    #[error("Timed out after {duration_ms}ms waiting on {path}")]
    Timeout { path: String, duration_ms: u64 },
}

/// Top-level error type for zonewatch.
#[derive(Debug, Error)]
pub enum ZoneError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigErrors),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ZoneError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Config(_))
    }

    /// Returns true if this is a control-plane error.
    #[must_use]
    pub const fn is_control(&self) -> bool {
        matches!(self, Self::Control(_))
    }

    /// Returns true if a control command referenced a missing zone.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Control(ControlError::ZoneNotFound { .. }))
    }

    /// Returns true if this is an internal error.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    /// Returns true if repeating the call may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Control(ControlError::Timeout { .. } | ControlError::QueueFull { .. })
        )
    }
}

impl From<std::io::Error> for ZoneError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ZoneError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ZoneError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Result type alias for zonewatch operations.
pub type ZoneResult<T> = Result<T, ZoneError>;
