use std::fmt;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ControlError, ZoneError, ZoneResult};
use crate::schema::ZoneEventMessage;

/// Unique identifier for an event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A subscriber's view of the per-frame zone-event messages.
///
/// The buffer is bounded. When it is full the monitor drops new messages for
/// this subscriber instead of waiting. Dropping the stream unsubscribes.
#[derive(Debug)]
pub struct EventStream {
    subscription_id: SubscriptionId,
    rx: Receiver<ZoneEventMessage>,
}

impl EventStream {
    pub(crate) const fn new(
        subscription_id: SubscriptionId,
        rx: Receiver<ZoneEventMessage>,
    ) -> Self {
        Self { subscription_id, rx }
    }

    /// The subscription id backing this stream.
    #[must_use]
    pub const fn subscription_id(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Receive the next message (blocking).
    pub fn recv(&self) -> ZoneResult<ZoneEventMessage> {
        self.rx.recv().map_err(|_| {
            ZoneError::Control(ControlError::Disconnected {
                path: "event_stream".to_string(),
            })
        })
    }

    /// Receive the next message with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> ZoneResult<ZoneEventMessage> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => ZoneError::Control(ControlError::Timeout {
                path: "event_stream".to_string(),
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => ZoneError::Control(ControlError::Disconnected {
                path: "event_stream".to_string(),
            }),
        })
    }

    /// Next buffered message, if any.
    pub fn try_recv(&self) -> ZoneResult<Option<ZoneEventMessage>> {
        match self.rx.try_recv() {
            Ok(msg) => Ok(Some(msg)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ZoneError::Control(ControlError::Disconnected {
                path: "event_stream".to_string(),
            })),
        }
    }

    /// Every message buffered right now, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<ZoneEventMessage> {
        self.rx.try_iter().collect()
    }

    /// Messages waiting in the buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// True when nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
