//! Entrance flavor: a line of color when the player walks into a scene.

use gm_state::{is_settlement, GmState, IntentChannel, IntentRecord, Strength};
use log::debug;

use super::{draw_variant, reason, record_none, EntranceIntent};
use crate::config::EntranceConfig;

/// A chosen topic before it is turned into an intent.
struct Topic {
    name: String,
    strength: Strength,
    reason: &'static str,
}

impl Topic {
    fn low(name: impl Into<String>, reason: &'static str) -> Self {
        Self {
            name: name.into(),
            strength: Strength::Low,
            reason,
        }
    }
}

/// Decide whether entering `mode` at `turn` gets a flavor line.
pub fn decide(config: &EntranceConfig, state: &mut GmState, mode: &str, turn: u32) -> EntranceIntent {
    if !state.enabled {
        return EntranceIntent::None;
    }
    let scope = mode.trim().to_ascii_lowercase();

    if let Some(blocked) = gate(config, state, &scope, turn) {
        record_none(state, turn, IntentChannel::Entrance, blocked);
        return EntranceIntent::None;
    }

    let Some(topic) = choose_topic(config, state) else {
        record_none(state, turn, IntentChannel::Entrance, reason::NO_INTENT);
        return EntranceIntent::None;
    };

    if topic.reason == reason::FLAVOR_GENERAL_RUMOR {
        state.story_flags.general_rumor_fired = true;
    }
    let variant = draw_variant(state, config.variants);
    state.cooldowns.last_entrance_intent_turn = Some(turn);
    state.cooldowns.last_action_turn = Some(turn);
    state.debug.record_intent(IntentRecord::fired(
        turn,
        IntentChannel::Entrance,
        "flavor",
        topic.reason,
        topic.name.clone(),
    ));
    debug!("entrance flavor {} in {scope} at turn {turn}", topic.name);

    EntranceIntent::Flavor {
        topic: topic.name,
        strength: topic.strength,
        mode: scope,
        variant,
    }
}

/// Settlements are rate-limited by entry count, everywhere else by turns.
fn gate(config: &EntranceConfig, state: &GmState, scope: &str, turn: u32) -> Option<&'static str> {
    if is_settlement(scope) {
        let entry = state.stats.entries(scope).max(1);
        let period = config.settlement_entry_period.max(1);
        if (entry - 1) % period != 0 {
            return Some(reason::RARITY_ENTRY_PERIOD);
        }
        return None;
    }
    match state.cooldowns.last_entrance_intent_turn {
        Some(last) if turn.saturating_sub(last) < config.cooldown_turns => Some(reason::COOLDOWN_TURN),
        _ => None,
    }
}

fn choose_topic(config: &EntranceConfig, state: &GmState) -> Option<Topic> {
    let mood = state.mood.primary;
    let boredom = state.boredom.level;
    let restive = mood.is_restive() && boredom > config.restive_boredom;

    if restive {
        if let Some((family, _)) = state.most_killed_family() {
            return Some(Topic {
                name: format!("family:{family}"),
                strength: Strength::Medium,
                reason: reason::FLAVOR_FAMILY,
            });
        }
        return Some(variety_or_rumor(config, state));
    }
    if mood.is_receptive() && boredom > config.receptive_boredom {
        return Some(variety_or_rumor(config, state));
    }
    if !state.story_flags.general_rumor_fired
        && state.stats.total_turns < config.general_rumor_max_turns
        && boredom > config.general_rumor_boredom
    {
        return Some(Topic::low("rumor:general", reason::FLAVOR_GENERAL_RUMOR));
    }
    None
}

/// Suggest a neglected mode when one mode dominates play, else a rumor.
fn variety_or_rumor(config: &EntranceConfig, state: &GmState) -> Topic {
    let stats = &state.stats;
    if stats.total_turns >= config.variety_min_turns && stats.total_turns > 0 {
        if let Some((dominant, turns)) = stats.dominant_mode() {
            let share = f64::from(turns) / f64::from(stats.total_turns);
            if share >= config.variety_dominance {
                if let Some(other) = stats.least_visited_mode(dominant) {
                    return Topic::low(format!("variety:{other}"), reason::FLAVOR_VARIETY);
                }
            }
        }
    }
    Topic::low("rumor", reason::FLAVOR_RUMOR)
}
