//! Mechanic hints: point the player at an optional system they have not tried.

use gm_state::{GmState, IntentChannel, IntentRecord, KnowledgeState, Mechanic, Strength};
use log::debug;

use super::{draw_variant, reason, record_none, MechanicHint};
use crate::config::HintConfig;

const BASE_SCORE: u32 = 5;
const SEEN_NOT_TRIED_BONUS: u32 = 3;
const TOWN_SERVICE_BONUS: u32 = 1;
const FAMILIAR_BONUS: u32 = 1;
/// A mechanic seen more often than this gets the familiarity bonus.
const FAMILIAR_SEEN: u32 = 5;

/// Scored hint candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    mechanic: Mechanic,
    score: u32,
    seen: u32,
}

/// Decide whether to nudge the player toward a mechanic at `turn`.
pub fn decide(config: &HintConfig, state: &mut GmState, turn: u32) -> MechanicHint {
    if !state.enabled {
        return MechanicHint::None;
    }

    if let Some(blocked) = gate(config, state, turn) {
        record_none(state, turn, IntentChannel::Hint, blocked);
        return MechanicHint::None;
    }

    let Some(best) = best_candidate(state, turn) else {
        record_none(state, turn, IntentChannel::Hint, reason::NO_MECHANIC);
        return MechanicHint::None;
    };

    let strength = if best.score >= config.medium_score {
        Strength::Medium
    } else {
        Strength::Low
    };
    let target = format!("mechanic:{}", best.mechanic.id());
    let variant = draw_variant(state, config.variants);
    state.cooldowns.last_hint_intent_turn = Some(turn);
    state.cooldowns.last_hint_intent_town_entry = Some(state.stats.town_entries());
    state.cooldowns.last_action_turn = Some(turn);
    state.debug.record_intent(IntentRecord::fired(
        turn,
        IntentChannel::Hint,
        "nudge",
        reason::HINT_MECHANIC,
        target.clone(),
    ));
    debug!("hint {target} (score {}) at turn {turn}", best.score);

    MechanicHint::Nudge {
        target,
        strength,
        variant,
    }
}

fn gate(config: &HintConfig, state: &GmState, turn: u32) -> Option<&'static str> {
    let town_entries = state.stats.town_entries();
    if state.stats.total_turns < config.early_game_turns && town_entries < config.early_game_town_entries {
        return Some(reason::EARLY_GAME);
    }

    let last = state.cooldowns.last_hint_intent_turn?;
    if last == turn {
        let since = state.cooldowns.last_hint_intent_town_entry.unwrap_or(0);
        if town_entries.saturating_sub(since) < config.entry_cooldown {
            return Some(reason::COOLDOWN_ENTRY);
        }
        return None;
    }
    if turn.saturating_sub(last) < config.cooldown_turns {
        return Some(reason::COOLDOWN_TURN);
    }
    None
}

fn best_candidate(state: &GmState, turn: u32) -> Option<Candidate> {
    let in_town = state.stats.in_town();
    let boredom_bonus = (2.0 * state.boredom.level).round() as u32;

    Mechanic::ALL
        .into_iter()
        .filter_map(|mechanic| {
            let usage = state.mechanics.get(mechanic);
            let knowledge = usage.knowledge(turn);
            if usage.tried > 0
                || matches!(knowledge, KnowledgeState::Disinterested | KnowledgeState::TriedRecently)
            {
                return None;
            }
            let mut score = BASE_SCORE + boredom_bonus;
            if knowledge == KnowledgeState::SeenNotTried {
                score += SEEN_NOT_TRIED_BONUS;
            }
            if in_town && mechanic.is_town_service() {
                score += TOWN_SERVICE_BONUS;
            }
            if usage.seen > FAMILIAR_SEEN {
                score += FAMILIAR_BONUS;
            }
            Some(Candidate {
                mechanic,
                score,
                seen: usage.seen,
            })
        })
        // Strictly better only, so earlier mechanics win full ties.
        .fold(None, |best: Option<Candidate>, candidate| match best {
            Some(b) if (b.score, b.seen) >= (candidate.score, candidate.seen) => Some(b),
            _ => Some(candidate),
        })
}
