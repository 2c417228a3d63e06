//! Message contract and envelope for the battle event bus.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Topics for event routing.
///
/// A subscription is keyed by message type *and* topic, so two subscribers of
/// the same type on different topics never see each other's traffic.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum Topic {
    /// Catch-all for messages that declare no topic of their own.
    #[default]
    General,
    /// Battle lifecycle (start, phase changes, end)
    Battle,
    /// Turn boundaries and action selection
    Turn,
    /// Damage, healing and deaths
    Combat,
    /// Status effect bookkeeping
    Effects,
    /// Rendezvous traffic with the presentation layer
    Presentation,
}

/// When a published message reaches its subscribers.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Default, Display, Serialize, Deserialize)]
pub enum DispatchMode {
    /// Delivered synchronously before `publish` returns.
    #[default]
    Immediate,
    /// Appended to a FIFO lane drained by [`super::EventBus::drain_pending`].
    NextFrame,
    /// Bucketed by priority; at most one is delivered per drain.
    Queued,
}

/// Identifier tying a message to the rendezvous or action that produced it.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CorrelationId(pub u64);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "corr-{}", self.0)
    }
}

/// A type that can travel over the [`super::EventBus`].
///
/// The associated constants are per-type defaults; [`PublishOptions`]
/// overrides them for a single publish. Lower `PRIORITY` values are delivered
/// first in the queued lane.
pub trait BusMessage: Send + Sync + 'static {
    const TOPIC: Topic = Topic::General;
    const MODE: DispatchMode = DispatchMode::Immediate;
    const PRIORITY: i32 = 0;
}

/// Per-publish overrides of a message's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOptions {
    pub topic: Option<Topic>,
    pub mode: Option<DispatchMode>,
    pub priority: Option<i32>,
    pub correlation_id: Option<CorrelationId>,
}

impl PublishOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn correlate(mut self, id: impl Into<CorrelationId>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }
}

/// A delivered message together with its routing metadata.
///
/// The payload is shared: every subscriber of one publish sees the same
/// allocation, so envelopes are cheap to clone.
#[derive(Debug)]
pub struct Envelope<T> {
    pub(super) payload: Arc<T>,
    pub(super) topic: Topic,
    pub(super) mode: DispatchMode,
    pub(super) priority: i32,
    pub(super) correlation_id: Option<CorrelationId>,
    pub(super) timestamp: DateTime<Utc>,
    pub(super) sequence: u64,
}

impl<T> Envelope<T> {
    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn correlation_id(&self) -> Option<CorrelationId> {
        self.correlation_id
    }

    /// Wall-clock time of the publish call, not of delivery.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Bus-wide publish counter, strictly increasing.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl<T> Clone for Envelope<T> {
    fn clone(&self) -> Self {
        Self {
            payload: Arc::clone(&self.payload),
            topic: self.topic,
            mode: self.mode,
            priority: self.priority,
            correlation_id: self.correlation_id,
            timestamp: self.timestamp,
            sequence: self.sequence,
        }
    }
}

impl<T> std::ops::Deref for Envelope<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.payload
    }
}
