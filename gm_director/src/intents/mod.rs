//! Decision channels that propose narrative nudges on scene entry.
//!
//! Each channel returns at most one intent per call and appends its decision,
//! fired or not, to the intent history together with a reason code.

pub mod entrance;
pub mod hint;

use gm_state::{GmState, IntentChannel, IntentRecord, Strength};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{EntranceConfig, HintConfig};

/// Reason codes recorded with every decision.
pub mod reason {
    pub const DISABLED: &str = "disabled";
    pub const RARITY_ENTRY_PERIOD: &str = "rarity.entryPeriod";
    pub const COOLDOWN_TURN: &str = "cooldown.turn";
    pub const COOLDOWN_ENTRY: &str = "cooldown.entry";
    pub const EARLY_GAME: &str = "earlyGame";
    pub const NO_INTENT: &str = "no.intent";
    pub const NO_MECHANIC: &str = "no.mechanic";
    pub const FLAVOR_FAMILY: &str = "flavor.family";
    pub const FLAVOR_VARIETY: &str = "flavor.variety";
    pub const FLAVOR_RUMOR: &str = "flavor.rumor";
    pub const FLAVOR_GENERAL_RUMOR: &str = "flavor.generalRumor";
    pub const HINT_MECHANIC: &str = "hint.mechanic";
}

/// Flavor line proposed when the player enters a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntranceIntent {
    None,
    Flavor {
        topic: String,
        strength: Strength,
        mode: String,
        variant: u32,
    },
}

impl EntranceIntent {
    pub fn is_none(&self) -> bool {
        matches!(self, EntranceIntent::None)
    }
}

/// Nudge toward an optional mechanic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MechanicHint {
    None,
    Nudge {
        target: String,
        strength: Strength,
        variant: u32,
    },
}

impl MechanicHint {
    pub fn is_none(&self) -> bool {
        matches!(self, MechanicHint::None)
    }
}

/// The entrance and hint channels with their tuning.
#[derive(Debug, Clone, Default)]
pub struct IntentChannels {
    pub entrance: EntranceConfig,
    pub hint: HintConfig,
}

impl IntentChannels {
    pub fn new(entrance: EntranceConfig, hint: HintConfig) -> Self {
        Self { entrance, hint }
    }

    /// Decide the entrance channel; the decision is logged in `state`.
    pub fn entrance_intent(&self, state: &mut GmState, mode: &str, turn: u32) -> EntranceIntent {
        entrance::decide(&self.entrance, state, mode, turn)
    }

    /// Decide the hint channel; the decision is logged in `state`.
    pub fn mechanic_hint(&self, state: &mut GmState, turn: u32) -> MechanicHint {
        hint::decide(&self.hint, state, turn)
    }
}

/// Record a decision that produced nothing.
fn record_none(state: &mut GmState, turn: u32, channel: IntentChannel, reason: &str) {
    debug!("{channel:?} channel silent at turn {turn}: {reason}");
    state.debug.record_intent(IntentRecord::none(turn, channel, reason));
}

/// Pick a phrasing for a fired intent from the private stream.
fn draw_variant(state: &mut GmState, variants: u32) -> u32 {
    state.rng.below(variants.max(1))
}
