//! Telemetry events gameplay systems report to the director.

use gm_state::{Mechanic, MechanicAction};
use serde::{Deserialize, Serialize};

/// Event vocabulary. Known types get their own variant; anything else is
/// carried verbatim so hosts can report new telemetry without a release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    ModeEnter,
    EncounterEnter,
    EncounterExit,
    CombatKill,
    QuestComplete,
    CaravanAccepted,
    CaravanCompleted,
    CaravanAttacked,
    Mechanic,
    GuardFinePay,
    GuardFineRefuse,
    Other(String),
}

impl EventKind {
    /// Map a wire event type; unknown types are kept as `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "mode.enter" => EventKind::ModeEnter,
            "encounter.enter" => EventKind::EncounterEnter,
            "encounter.exit" => EventKind::EncounterExit,
            "combat.kill" => EventKind::CombatKill,
            "quest.complete" => EventKind::QuestComplete,
            "caravan.accepted" => EventKind::CaravanAccepted,
            "caravan.completed" => EventKind::CaravanCompleted,
            "caravan.attacked" => EventKind::CaravanAttacked,
            "mechanic" => EventKind::Mechanic,
            "gm.guardFine.pay" => EventKind::GuardFinePay,
            "gm.guardFine.refuse" => EventKind::GuardFineRefuse,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::ModeEnter => "mode.enter",
            EventKind::EncounterEnter => "encounter.enter",
            EventKind::EncounterExit => "encounter.exit",
            EventKind::CombatKill => "combat.kill",
            EventKind::QuestComplete => "quest.complete",
            EventKind::CaravanAccepted => "caravan.accepted",
            EventKind::CaravanCompleted => "caravan.completed",
            EventKind::CaravanAttacked => "caravan.attacked",
            EventKind::Mechanic => "mechanic",
            EventKind::GuardFinePay => "gm.guardFine.pay",
            EventKind::GuardFineRefuse => "gm.guardFine.refuse",
            EventKind::Other(s) => s,
        }
    }

    pub fn is_caravan(&self) -> bool {
        matches!(
            self,
            EventKind::CaravanAccepted | EventKind::CaravanCompleted | EventKind::CaravanAttacked
        )
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::parse(&value)
    }
}

impl From<EventKind> for String {
    fn from(value: EventKind) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn interesting_by_default() -> bool {
    true
}

/// One piece of gameplay telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub turn: u32,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "interesting_by_default")]
    pub interesting: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub mechanic: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl GameEvent {
    /// Create an interesting event with no extra fields.
    pub fn new(kind: EventKind, turn: u32) -> Self {
        Self {
            kind,
            turn,
            scope: None,
            interesting: true,
            tags: Vec::new(),
            mechanic: None,
            action: None,
            success: None,
            reason: None,
            payload: serde_json::Value::Null,
        }
    }

    /// The player entered a mode (town, tavern, dungeon, ...).
    pub fn mode_enter(scope: impl Into<String>, turn: u32) -> Self {
        Self::new(EventKind::ModeEnter, turn).with_scope(scope)
    }

    /// The player killed something.
    pub fn kill<I, T>(tags: I, turn: u32) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(EventKind::CombatKill, turn).with_tags(tags)
    }

    /// The player interacted with an optional mechanic.
    pub fn mechanic(mechanic: Mechanic, action: MechanicAction, turn: u32) -> Self {
        let action = match action {
            MechanicAction::Seen => "seen",
            MechanicAction::Tried => "tried",
            MechanicAction::Success => "success",
            MechanicAction::Failure => "failure",
            MechanicAction::Dismiss => "dismiss",
        };
        let mut event = Self::new(EventKind::Mechanic, turn);
        event.mechanic = Some(mechanic.id().to_string());
        event.action = Some(action.to_string());
        event
    }

    /// Parse loosely-typed telemetry JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_interesting(mut self, interesting: bool) -> Self {
        self.interesting = interesting;
        self
    }

    pub fn with_success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Scope, trimmed and lower-cased.
    pub fn normalized_scope(&self) -> Option<String> {
        self.scope
            .as_deref()
            .map(|s| s.trim().to_ascii_lowercase())
            .filter(|s| !s.is_empty())
    }

    /// The mechanic and action of a `mechanic` event, when both parse.
    pub fn parsed_mechanic(&self) -> Option<(Mechanic, MechanicAction)> {
        let mechanic = Mechanic::parse(self.mechanic.as_deref()?)?;
        let action = MechanicAction::parse(self.action.as_deref()?)?;
        Some((mechanic, action))
    }
}
