//! Closed vocabularies: optional mechanics, how the player relates to them,
//! and how loudly the director may speak.

use serde::{Deserialize, Serialize};

/// Turns after the last use during which a mechanic counts as "tried recently".
pub const TRIED_RECENTLY_TURNS: u32 = 200;

/// Turns after the last use past which a tried mechanic is considered abandoned.
pub const ABANDONED_TURNS: u32 = 600;

/// Dismissals after which the player is taken to be uninterested.
pub const DISMISS_LIMIT: u32 = 3;

/// Optional side mechanics the director may nudge the player toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mechanic {
    QuestBoard,
    Followers,
    Fishing,
    Lockpicking,
}

impl Mechanic {
    /// Every mechanic, in hint tie-break order.
    pub const ALL: [Mechanic; 4] = [
        Mechanic::QuestBoard,
        Mechanic::Followers,
        Mechanic::Fishing,
        Mechanic::Lockpicking,
    ];

    /// Stable identifier used in hint targets and telemetry.
    pub fn id(&self) -> &'static str {
        match self {
            Mechanic::QuestBoard => "questBoard",
            Mechanic::Followers => "followers",
            Mechanic::Fishing => "fishing",
            Mechanic::Lockpicking => "lockpicking",
        }
    }

    /// Parse a telemetry id. Case and separators are ignored, so
    /// `questBoard`, `quest_board` and `QUEST-BOARD` all match.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "questboard" => Some(Mechanic::QuestBoard),
            "followers" | "follower" => Some(Mechanic::Followers),
            "fishing" => Some(Mechanic::Fishing),
            "lockpicking" => Some(Mechanic::Lockpicking),
            _ => None,
        }
    }

    /// Whether the mechanic is reached from inside a settlement.
    pub fn is_town_service(&self) -> bool {
        matches!(self, Mechanic::QuestBoard | Mechanic::Followers)
    }
}

impl std::fmt::Display for Mechanic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Player interaction reported by a `mechanic` telemetry event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MechanicAction {
    Seen,
    Tried,
    Success,
    Failure,
    Dismiss,
}

impl MechanicAction {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "seen" => Some(MechanicAction::Seen),
            "tried" => Some(MechanicAction::Tried),
            "success" => Some(MechanicAction::Success),
            "failure" => Some(MechanicAction::Failure),
            "dismiss" => Some(MechanicAction::Dismiss),
            _ => None,
        }
    }

    /// Whether this action counts as actually using the mechanic.
    pub fn is_use(&self) -> bool {
        matches!(
            self,
            MechanicAction::Tried | MechanicAction::Success | MechanicAction::Failure
        )
    }
}

/// What the player appears to know about a mechanic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KnowledgeState {
    Unseen,
    SeenNotTried,
    Disinterested,
    TriedRecently,
    TriedLongAgo,
}

impl KnowledgeState {
    /// Classify from usage counters.
    ///
    /// `last_used_turn` of `None` on a tried mechanic is read as "used at turn 0".
    pub fn classify(seen: u32, tried: u32, dismiss: u32, last_used_turn: Option<u32>, now: u32) -> Self {
        if tried == 0 {
            if seen == 0 {
                return KnowledgeState::Unseen;
            }
            if dismiss < DISMISS_LIMIT {
                return KnowledgeState::SeenNotTried;
            }
            return KnowledgeState::Disinterested;
        }

        let age = now.saturating_sub(last_used_turn.unwrap_or(0));
        if age > ABANDONED_TURNS || (dismiss >= DISMISS_LIMIT && age > TRIED_RECENTLY_TURNS) {
            KnowledgeState::Disinterested
        } else if age <= TRIED_RECENTLY_TURNS {
            KnowledgeState::TriedRecently
        } else {
            KnowledgeState::TriedLongAgo
        }
    }
}

/// How insistently an intent should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strength {
    Low,
    Medium,
    High,
}
