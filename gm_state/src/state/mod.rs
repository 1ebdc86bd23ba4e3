//! GM state management - the single aggregate holding every pacing datum.

pub mod debug;
pub mod ledger;
pub mod mood;

pub use debug::*;
pub use ledger::*;
pub use mood::*;

use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::SnapshotError;
use crate::rng::RngStream;
use crate::schedule::SchedulerState;

/// Current persisted schema. Snapshots from a newer schema are discarded.
pub const SCHEMA_VERSION: u32 = 3;

/// One-shot story flags.
///
/// The per-kind faction event slots older saves kept here are not stored any
/// more; they are projected from the scheduler on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct StoryFlags {
    pub general_rumor_fired: bool,
    /// Extra guard disfavor accumulated by refusing fines.
    pub guard_heat: u32,
    pub last_guard_refusal_turn: Option<u32>,
}

/// Cooldown cursors for the decision channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Cooldowns {
    pub last_entrance_intent_turn: Option<u32>,
    pub last_hint_intent_turn: Option<u32>,
    /// Town entry count when the last hint fired.
    pub last_hint_intent_town_entry: Option<u32>,
    pub last_action_turn: Option<u32>,
}

/// The complete pacing state of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmState {
    pub schema_version: u32,
    pub enabled: bool,
    pub run_seed: u32,
    pub rng: RngStream,
    pub scheduler: SchedulerState,
    pub mood: Mood,
    pub boredom: Boredom,
    pub stats: Stats,
    pub traits: Traits,
    pub mechanics: MechanicsLedger,
    /// Creature family -> tally.
    pub families: BTreeMap<String, ReputationEntry>,
    /// Faction -> tally.
    pub factions: BTreeMap<String, ReputationEntry>,
    pub story_flags: StoryFlags,
    pub debug: DebugLog,
    pub cooldowns: Cooldowns,
}

impl GmState {
    /// Fresh default state for a run seed.
    pub fn new(run_seed: u32) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            enabled: true,
            run_seed,
            rng: RngStream::seeded(run_seed),
            scheduler: SchedulerState::default(),
            mood: Mood::default(),
            boredom: Boredom::default(),
            stats: Stats::default(),
            traits: Traits::default(),
            mechanics: MechanicsLedger::default(),
            families: BTreeMap::new(),
            factions: BTreeMap::new(),
            story_flags: StoryFlags::default(),
            debug: DebugLog::default(),
            cooldowns: Cooldowns::default(),
        }
    }

    /// Repair every substructure in place.
    ///
    /// Runs at each state boundary (creation from a snapshot, reset). After it
    /// returns every invariant of the aggregate holds.
    pub fn normalize(&mut self) {
        self.schema_version = SCHEMA_VERSION;
        if !self.rng.is_known_algo() {
            warn!("unknown rng algorithm {:?}; reseeding stream", self.rng.algo);
            self.rng = RngStream::seeded(self.run_seed);
        }
        self.boredom.repair();
        self.mood.repair();
        self.scheduler.repair();
        self.debug.repair();
    }

    /// Decode a persisted snapshot for the run with `expected_seed`.
    ///
    /// The header decides acceptance: a newer schema or a foreign run seed
    /// rejects the snapshot outright. Past the header every section is decoded
    /// on its own, and a malformed section falls back to its default instead
    /// of failing the load.
    pub fn from_snapshot(json: &str, expected_seed: u32) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_snapshot_value(value, expected_seed)
    }

    /// Decode an already parsed snapshot.
    ///
    /// Header fields are strict; every other section falls back to its
    /// default on its own when it fails to decode.
    pub fn from_snapshot_value(value: Value, expected_seed: u32) -> Result<Self, SnapshotError> {
        let Value::Object(mut root) = value else {
            return Err(SnapshotError::NotAnObject);
        };

        let version = root
            .get("schemaVersion")
            .and_then(Value::as_u64)
            .ok_or(SnapshotError::MissingVersion)?;
        if version > u64::from(SCHEMA_VERSION) {
            return Err(SnapshotError::SchemaTooNew {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        let seed = root
            .get("runSeed")
            .and_then(Value::as_u64)
            .ok_or(SnapshotError::MissingSeed)?;
        if seed != u64::from(expected_seed) {
            return Err(SnapshotError::SeedMismatch {
                found: seed,
                expected: expected_seed,
            });
        }

        let mut state = GmState::new(expected_seed);
        state.enabled = root.get("enabled").and_then(Value::as_bool).unwrap_or(true);
        state.rng = decode_section(&mut root, "rng", || RngStream::seeded(expected_seed));
        state.scheduler = decode_section(&mut root, "scheduler", SchedulerState::default);
        state.mood = decode_section(&mut root, "mood", Mood::default);
        state.boredom = decode_section(&mut root, "boredom", Boredom::default);
        state.stats = decode_section(&mut root, "stats", Stats::default);
        state.traits = decode_section(&mut root, "traits", Traits::default);
        state.mechanics = decode_section(&mut root, "mechanics", MechanicsLedger::default);
        state.families = decode_section(&mut root, "families", BTreeMap::new);
        state.factions = decode_section(&mut root, "factions", BTreeMap::new);
        state.story_flags = decode_section(&mut root, "storyFlags", StoryFlags::default);
        state.debug = decode_section(&mut root, "debug", DebugLog::default);
        state.cooldowns = decode_section(&mut root, "cooldowns", Cooldowns::default);

        if version < u64::from(SCHEMA_VERSION) {
            info!("upgrading snapshot schema {version} -> {SCHEMA_VERSION} section by section");
        }
        state.normalize();
        Ok(state)
    }

    /// Serialize the whole aggregate for the durable record.
    pub fn to_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Reputation with a faction, if it was ever observed.
    pub fn faction(&self, name: &str) -> Option<&ReputationEntry> {
        self.factions.get(name)
    }

    /// Kill tally for a creature family, if any.
    pub fn family(&self, name: &str) -> Option<&ReputationEntry> {
        self.families.get(name)
    }

    /// Reputation with a faction, created empty on first use.
    pub fn faction_mut(&mut self, name: &str) -> &mut ReputationEntry {
        self.factions.entry(name.to_string()).or_default()
    }

    /// Kill tally for a family, created empty on first use.
    pub fn family_mut(&mut self, name: &str) -> &mut ReputationEntry {
        self.families.entry(name.to_string()).or_default()
    }

    /// The family with the most recorded kills, ties broken by name.
    pub fn most_killed_family(&self) -> Option<(&str, u32)> {
        self.families
            .iter()
            .filter(|(_, entry)| entry.positive > 0)
            .fold(None, |best: Option<(&str, u32)>, (name, entry)| match best {
                Some((_, kills)) if kills >= entry.positive => best,
                _ => Some((name.as_str(), entry.positive)),
            })
    }
}

fn decode_section<T: DeserializeOwned>(root: &mut Map<String, Value>, key: &str, fallback: impl FnOnce() -> T) -> T {
    match root.remove(key) {
        None | Some(Value::Null) => fallback(),
        Some(value) => match serde_json::from_value(value) {
            Ok(section) => section,
            Err(err) => {
                warn!("snapshot section `{key}` is malformed ({err}); using defaults");
                fallback()
            }
        },
    }
}
