//! Observability rings: recent events and every decision with its reason code.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

pub const EVENT_RING_LIMIT: usize = 50;
pub const INTENT_RING_LIMIT: usize = 20;

/// Push onto a ring, dropping the oldest entries past `limit`.
pub fn push_bounded<T>(ring: &mut VecDeque<T>, item: T, limit: usize) {
    ring.push_back(item);
    while ring.len() > limit {
        ring.pop_front();
    }
}

/// Drop the oldest entries past `limit`.
pub fn truncate_front<T>(ring: &mut VecDeque<T>, limit: usize) {
    while ring.len() > limit {
        ring.pop_front();
    }
}

/// A telemetry event as remembered for debugging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub turn: u32,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub interesting: bool,
}

/// Which decision surface produced an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IntentChannel {
    Entrance,
    Hint,
    Faction,
}

/// One decision, fired or not, with the reason that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRecord {
    pub turn: u32,
    pub channel: IntentChannel,
    /// `none`, `flavor`, `nudge`, `guard_fine` or `encounter`.
    pub kind: String,
    pub reason: String,
    /// Topic, target or encounter id when something fired.
    #[serde(default)]
    pub detail: Option<String>,
}

impl IntentRecord {
    /// A decision that produced nothing, with the reason it stopped.
    pub fn none(turn: u32, channel: IntentChannel, reason: &str) -> Self {
        Self {
            turn,
            channel,
            kind: "none".to_string(),
            reason: reason.to_string(),
            detail: None,
        }
    }

    /// A decision that surfaced something.
    pub fn fired(turn: u32, channel: IntentChannel, kind: &str, reason: &str, detail: impl Into<String>) -> Self {
        Self {
            turn,
            channel,
            kind: kind.to_string(),
            reason: reason.to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == "none"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DebugLog {
    /// Event type -> times seen.
    pub counters: BTreeMap<String, u32>,
    pub last_event: Option<EventRecord>,
    pub last_events: VecDeque<EventRecord>,
    pub last_intent: Option<IntentRecord>,
    pub intent_history: VecDeque<IntentRecord>,
}

impl DebugLog {
    /// Count an event by kind and keep it in the bounded recent-events ring.
    pub fn record_event(&mut self, record: EventRecord) {
        let count = self.counters.entry(record.kind.clone()).or_insert(0);
        *count = count.saturating_add(1);
        self.last_event = Some(record.clone());
        push_bounded(&mut self.last_events, record, EVENT_RING_LIMIT);
    }

    /// Remember a decision, bounded like the event ring.
    pub fn record_intent(&mut self, record: IntentRecord) {
        self.last_intent = Some(record.clone());
        push_bounded(&mut self.intent_history, record, INTENT_RING_LIMIT);
    }

    /// Most recent decision from a channel.
    pub fn last_intent_for(&self, channel: IntentChannel) -> Option<&IntentRecord> {
        self.intent_history.iter().rev().find(|r| r.channel == channel)
    }

    /// Re-apply the ring bounds after decoding.
    pub fn repair(&mut self) {
        truncate_front(&mut self.last_events, EVENT_RING_LIMIT);
        truncate_front(&mut self.intent_history, INTENT_RING_LIMIT);
    }
}
