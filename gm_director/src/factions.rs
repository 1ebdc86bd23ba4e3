//! Faction travel events: rare scripted encounters armed by reputation.
//!
//! Ingest arms them through the scheduler once a faction's tally crosses its
//! threshold; travel delivers at most one of them.

use gm_state::{ActionStatus, Delivery, GmState, Polarity, ReputationEntry, ScheduledAction};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scheduler `kind` shared by every faction action.
pub const FACTION_ACTION_KIND: &str = "faction";

/// The faction events the director can arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionEventKind {
    GuardFine,
    BanditBounty,
    TrollHunt,
}

/// Reputation needed before an event is armed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub min_observations: u32,
    pub min_score: f64,
}

impl FactionEventKind {
    pub const ALL: [FactionEventKind; 3] = [
        FactionEventKind::GuardFine,
        FactionEventKind::BanditBounty,
        FactionEventKind::TrollHunt,
    ];

    /// Scheduler action id.
    pub fn id(&self) -> &'static str {
        match self {
            FactionEventKind::GuardFine => "faction.guard_fine",
            FactionEventKind::BanditBounty => "faction.bandit_bounty",
            FactionEventKind::TrollHunt => "faction.troll_hunt",
        }
    }

    /// Short name used in slot listings and payloads.
    pub fn name(&self) -> &'static str {
        match self {
            FactionEventKind::GuardFine => "guard_fine",
            FactionEventKind::BanditBounty => "bandit_bounty",
            FactionEventKind::TrollHunt => "troll_hunt",
        }
    }

    /// Accepts either the short name or the scheduler id.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix("faction.").unwrap_or(raw);
        Self::ALL.into_iter().find(|kind| kind.name() == raw)
    }

    pub fn priority(&self) -> i32 {
        match self {
            FactionEventKind::GuardFine => 300,
            FactionEventKind::BanditBounty => 200,
            FactionEventKind::TrollHunt => 100,
        }
    }

    pub fn delivery(&self) -> Delivery {
        match self {
            FactionEventKind::GuardFine => Delivery::Confirm,
            FactionEventKind::BanditBounty | FactionEventKind::TrollHunt => Delivery::Auto,
        }
    }

    /// Reputation needed before the event is armed.
    pub fn threshold(&self) -> Threshold {
        let (min_observations, min_score) = match self {
            FactionEventKind::GuardFine => (3, 0.6),
            FactionEventKind::BanditBounty => (8, 0.8),
            FactionEventKind::TrollHunt => (4, 0.7),
        };
        Threshold {
            min_observations,
            min_score,
        }
    }

    /// Delivery window offsets from the arming turn.
    pub fn window(&self) -> (u32, u32) {
        match self {
            FactionEventKind::GuardFine => (30, 240),
            FactionEventKind::BanditBounty => (50, 300),
            FactionEventKind::TrollHunt => (40, 260),
        }
    }

    /// Encounter the travel layer should run; guard fines are a dialog instead.
    pub fn encounter_id(&self) -> Option<&'static str> {
        match self {
            FactionEventKind::GuardFine => None,
            FactionEventKind::BanditBounty => Some("bandit_bounty"),
            FactionEventKind::TrollHunt => Some("troll_hunt"),
        }
    }

    /// The strongest reputation entry this event reads from.
    fn best_source<'a>(&self, state: &'a GmState) -> Option<&'a ReputationEntry> {
        let sources: Vec<&ReputationEntry> = match self {
            FactionEventKind::GuardFine => ["guard", "town"]
                .iter()
                .filter_map(|name| state.faction(name))
                .collect(),
            FactionEventKind::BanditBounty => state.faction("bandit").into_iter().collect(),
            FactionEventKind::TrollHunt => state
                .family("troll")
                .into_iter()
                .chain(state.faction("troll"))
                .collect(),
        };
        sources.into_iter().fold(None, |best, entry| match best {
            Some(b) if rank(b) >= rank(entry) => Some(b),
            _ => Some(entry),
        })
    }

    /// Whether reputation currently warrants arming this event.
    pub fn is_warranted(&self, state: &GmState) -> bool {
        let threshold = self.threshold();
        self.best_source(state).is_some_and(|entry| {
            entry.seen >= threshold.min_observations
                && entry.score().is_some_and(|score| score >= threshold.min_score)
        })
    }

    fn action(&self, created_turn: u32, earliest: u32, latest: u32) -> ScheduledAction {
        ScheduledAction::new(self.id(), FACTION_ACTION_KIND, created_turn)
            .with_priority(self.priority())
            .with_delivery(self.delivery())
            .with_window(earliest, latest)
            .with_payload(serde_json::json!({ "event": self.name() }))
    }
}

impl std::fmt::Display for FactionEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort key for "best" reputation: score first, then observations.
fn rank(entry: &ReputationEntry) -> (f64, u32) {
    (entry.score().unwrap_or(-1.0), entry.seen)
}

/// What travel should surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FactionTravel {
    None,
    GuardFine,
    Encounter {
        #[serde(rename = "encounterId")]
        encounter_id: String,
    },
}

impl FactionTravel {
    pub fn is_none(&self) -> bool {
        matches!(self, FactionTravel::None)
    }

    /// Travel outcome for a consumed scheduler action.
    pub fn for_action(action: &ScheduledAction) -> Self {
        match FactionEventKind::parse(&action.id) {
            Some(FactionEventKind::GuardFine) => FactionTravel::GuardFine,
            Some(kind) => match kind.encounter_id() {
                Some(encounter_id) => FactionTravel::Encounter {
                    encounter_id: encounter_id.to_string(),
                },
                None => FactionTravel::None,
            },
            None => FactionTravel::None,
        }
    }
}

/// Arm one event if it is not already armed or spent.
pub fn schedule_kind(state: &mut GmState, kind: FactionEventKind, turn: u32) -> bool {
    let (open, close) = kind.window();
    let action = kind.action(turn, turn.saturating_add(open), turn.saturating_add(close));
    let armed = state.scheduler.schedule(action);
    if armed {
        info!("armed faction event {kind} at turn {turn}");
    }
    armed
}

/// Arm every event whose reputation threshold is met. Returns the newly armed kinds.
pub fn evaluate_thresholds(state: &mut GmState, turn: u32) -> Vec<FactionEventKind> {
    let mut armed = Vec::new();
    for kind in FactionEventKind::ALL {
        if kind.is_warranted(state) && schedule_kind(state, kind, turn) {
            armed.push(kind);
        }
    }
    armed
}

/// Arm an event regardless of reputation, deliverable from `turn` on.
pub fn force_schedule(state: &mut GmState, kind: FactionEventKind, turn: u32) {
    debug!("force-scheduling faction event {kind} at turn {turn}");
    state.scheduler.replace(kind.action(turn, turn, 0));
}

/// Read-only view of the per-kind slot status, keyed by kind name.
pub fn faction_event_slots(state: &GmState) -> BTreeMap<&'static str, Option<ActionStatus>> {
    FactionEventKind::ALL
        .into_iter()
        .map(|kind| (kind.name(), state.scheduler.get(kind.id()).map(|a| a.status)))
        .collect()
}

/// Outcome of a guard fine dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuardFineOutcome {
    Pay,
    Refuse,
}

/// Forgive accumulated refusal heat once enough quiet turns have passed.
fn decay_guard_heat(state: &mut GmState, turn: u32, heat_decay_turns: u32) {
    let heat = state.story_flags.guard_heat;
    if heat == 0 {
        return;
    }
    let quiet = state
        .story_flags
        .last_guard_refusal_turn
        .map_or(true, |last| turn.saturating_sub(last) >= heat_decay_turns);
    if quiet {
        let guard = state.faction_mut("guard");
        guard.negative = guard.negative.saturating_sub(heat);
        state.story_flags.guard_heat = 0;
        debug!("guard heat {heat} forgiven at turn {turn}");
    }
}

/// Apply a paid or refused fine to guard and town standing.
pub fn apply_guard_fine_outcome(state: &mut GmState, outcome: GuardFineOutcome, turn: u32, heat_decay_turns: u32) {
    decay_guard_heat(state, turn, heat_decay_turns);
    match outcome {
        GuardFineOutcome::Pay => {
            state.faction_mut("guard").record(Polarity::Positive, turn);
            state.faction_mut("town").record(Polarity::Positive, turn);
        }
        GuardFineOutcome::Refuse => {
            let guard = state.faction_mut("guard");
            guard.record(Polarity::Negative, turn);
            // Heat: the refusal counts twice against the guard.
            guard.negative = guard.negative.saturating_add(1);
            state.faction_mut("town").record(Polarity::Negative, turn);
            state.story_flags.guard_heat = state.story_flags.guard_heat.saturating_add(1);
            state.story_flags.last_guard_refusal_turn = Some(turn);
        }
    }
}
