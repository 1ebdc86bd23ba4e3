//! Telemetry ingestion: turns gameplay events into counters, reputation and mood.

use gm_state::{EventRecord, GmState, MechanicAction, Polarity, TraitKind};
use log::debug;

use crate::events::{EventKind, GameEvent};
use crate::factions::{self, FactionEventKind, GuardFineOutcome};
use crate::tags::TagSet;

/// Default polarity of an event type when it carries no explicit outcome.
fn default_polarity(kind: &EventKind) -> Polarity {
    match kind {
        EventKind::CombatKill | EventKind::QuestComplete | EventKind::CaravanCompleted => Polarity::Positive,
        EventKind::CaravanAttacked => Polarity::Negative,
        _ => Polarity::Neutral,
    }
}

/// Transient (valence, arousal) impulse of an event, before boredom scaling.
fn mood_impulse(event: &GameEvent) -> Option<(f64, f64)> {
    match event.kind {
        EventKind::CombatKill => Some((0.05, 0.10)),
        EventKind::EncounterEnter => Some((0.0, 0.10)),
        EventKind::QuestComplete => Some((0.15, 0.05)),
        EventKind::CaravanCompleted => Some((0.10, 0.0)),
        EventKind::CaravanAttacked => Some((-0.10, 0.10)),
        EventKind::GuardFineRefuse => Some((-0.05, 0.05)),
        EventKind::Mechanic => match event.parsed_mechanic() {
            Some((_, MechanicAction::Success)) => Some((0.05, 0.0)),
            Some((_, MechanicAction::Failure)) => Some((-0.05, 0.0)),
            _ => None,
        },
        _ => None,
    }
}

/// Applies gameplay telemetry to the GM state.
#[derive(Debug, Clone)]
pub struct EventIngest {
    heat_decay_turns: u32,
}

impl Default for EventIngest {
    fn default() -> Self {
        Self { heat_decay_turns: 300 }
    }
}

impl EventIngest {
    /// `heat_decay_turns` is how long a guard refusal keeps its heat.
    pub fn new(heat_decay_turns: u32) -> Self {
        Self { heat_decay_turns }
    }

    /// Fold one event into `state`. Returns faction events newly armed by it.
    pub fn on_event(&self, state: &mut GmState, event: &GameEvent) -> Vec<FactionEventKind> {
        if !state.enabled {
            return Vec::new();
        }
        let turn = event.turn;
        let scope = event.normalized_scope();

        state.debug.record_event(EventRecord {
            kind: event.kind.as_str().to_string(),
            turn,
            scope: scope.clone(),
            interesting: event.interesting,
        });

        match event.kind {
            EventKind::ModeEnter => {
                if let Some(scope) = scope.as_deref() {
                    state.stats.record_entry(scope);
                }
            }
            EventKind::EncounterEnter => {
                state.stats.encounter_starts = state.stats.encounter_starts.saturating_add(1);
            }
            EventKind::EncounterExit => {
                state.stats.encounter_completions = state.stats.encounter_completions.saturating_add(1);
            }
            EventKind::Mechanic => match event.parsed_mechanic() {
                Some((mechanic, action)) => state.mechanics.get_mut(mechanic).record(action, turn),
                None => debug!(
                    "ignoring mechanic event with {:?}/{:?}",
                    event.mechanic, event.action
                ),
            },
            EventKind::GuardFinePay => {
                factions::apply_guard_fine_outcome(state, GuardFineOutcome::Pay, turn, self.heat_decay_turns)
            }
            EventKind::GuardFineRefuse => {
                factions::apply_guard_fine_outcome(state, GuardFineOutcome::Refuse, turn, self.heat_decay_turns)
            }
            _ => {}
        }

        if event.interesting {
            state.boredom.mark_interesting(event.kind.as_str(), turn);
        }

        self.apply_tags(state, event, turn);

        if let Some((valence, arousal)) = mood_impulse(event) {
            let level = state.boredom.level;
            state.mood.apply_impulse(valence, arousal, level);
            state.mood.settle(level);
        }

        factions::evaluate_thresholds(state, turn)
    }

    fn apply_tags(&self, state: &mut GmState, event: &GameEvent, turn: u32) {
        let tags = TagSet::from_raw(&event.tags);
        let polarity = event
            .success
            .map(Polarity::from_success)
            .unwrap_or_else(|| default_polarity(&event.kind));

        if event.kind == EventKind::CombatKill && tags.is_troll() {
            state.traits.get_mut(TraitKind::TrollSlayer).record(Polarity::Positive, turn);
        }
        if tags.has_faction("bandit") && (tags.has_context("town") || tags.has_context("castle")) {
            state.traits.get_mut(TraitKind::TownProtector).record(polarity, turn);
        }
        if event.kind.is_caravan() {
            state.traits.get_mut(TraitKind::CaravanAlly).record(polarity, turn);
        }

        if event.kind == EventKind::CombatKill {
            for family in tags.creature_families() {
                state.family_mut(family).record(polarity, turn);
            }
        } else {
            for family in tags.families() {
                state.family_mut(family).record(polarity, turn);
            }
        }
        // Guard fine outcomes already updated guard and town reputation.
        if !matches!(event.kind, EventKind::GuardFinePay | EventKind::GuardFineRefuse) {
            for faction in tags.factions() {
                state.faction_mut(faction).record(polarity, turn);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_state::Mechanic;

    fn ingest(state: &mut GmState, event: GameEvent) -> Vec<FactionEventKind> {
        EventIngest::default().on_event(state, &event)
    }

    #[test]
    fn test_mode_enter_counts() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::mode_enter("Town", 3));
        ingest(&mut state, GameEvent::mode_enter("town", 4));
        assert_eq!(state.stats.town_entries(), 2);
        assert!(state.stats.in_town());
        assert_eq!(state.debug.counters["mode.enter"], 2);
        assert_eq!(state.debug.last_events.len(), 2);
    }

    #[test]
    fn test_kill_updates_families_and_traits() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::kill(["family:troll", "faction:bandit", "context:town"], 8));
        assert_eq!(state.traits.troll_slayer.positive, 1);
        assert_eq!(state.traits.town_protector.positive, 1);
        assert_eq!(state.families["troll"].positive, 1);
        assert_eq!(state.factions["bandit"].positive, 1);
        assert_eq!(state.boredom.last_interesting_turn, Some(8));
    }

    #[test]
    fn test_explicit_success_overrides_polarity() {
        let mut state = GmState::new(1);
        ingest(
            &mut state,
            GameEvent::new(EventKind::QuestComplete, 2)
                .with_tag("faction:guard")
                .with_success(false),
        );
        assert_eq!(state.factions["guard"].negative, 1);
        assert_eq!(state.factions["guard"].positive, 0);
    }

    #[test]
    fn test_caravan_ally() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::new(EventKind::CaravanAccepted, 1));
        ingest(&mut state, GameEvent::new(EventKind::CaravanCompleted, 2));
        ingest(&mut state, GameEvent::new(EventKind::CaravanAttacked, 3));
        let ally = state.traits.caravan_ally;
        assert_eq!((ally.seen, ally.positive, ally.negative), (3, 1, 1));
    }

    #[test]
    fn test_mechanic_usage() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::mechanic(Mechanic::Lockpicking, MechanicAction::Seen, 4));
        ingest(&mut state, GameEvent::mechanic(Mechanic::Lockpicking, MechanicAction::Failure, 9));
        let usage = state.mechanics.lockpicking;
        assert_eq!((usage.seen, usage.failure), (1, 1));
        assert_eq!(usage.first_seen_turn, Some(4));
        assert_eq!(usage.last_used_turn, Some(9));
        assert!(state.mood.transient_valence < 0.0);
    }

    #[test]
    fn test_uninteresting_event_keeps_timer() {
        let mut state = GmState::new(1);
        state.boredom.turns_since_last_interesting_event = 40;
        ingest(&mut state, GameEvent::mode_enter("dungeon", 5).with_interesting(false));
        assert_eq!(state.boredom.turns_since_last_interesting_event, 40);
    }

    #[test]
    fn test_mood_impulse_scaled_by_boredom() {
        let mut state = GmState::new(1);
        state.boredom.level = 1.0;
        ingest(&mut state, GameEvent::new(EventKind::CaravanAttacked, 1));
        assert!((state.mood.transient_valence + 0.15).abs() < 1e-12);
        assert!((state.mood.transient_arousal - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_guard_refusal_event() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::new(EventKind::GuardFineRefuse, 12));
        assert_eq!(state.factions["guard"].negative, 2);
        assert_eq!(state.story_flags.guard_heat, 1);
    }

    #[test]
    fn test_tagged_guard_refusal_counts_once() {
        let mut state = GmState::new(1);
        ingest(
            &mut state,
            GameEvent::new(EventKind::GuardFineRefuse, 12)
                .with_tag("faction:guard")
                .with_tag("faction:town"),
        );
        assert_eq!(state.factions["guard"].negative, 2);
        assert_eq!(state.factions["guard"].seen, 1);
        assert_eq!(state.factions["town"].negative, 1);
    }

    #[test]
    fn test_kind_tagged_troll_kills_arm_hunt() {
        let mut state = GmState::new(1);
        let mut armed = Vec::new();
        for turn in 0..4 {
            armed.extend(ingest(&mut state, GameEvent::kill(["kind:troll"], turn)));
        }
        assert_eq!(state.families["troll"].positive, 4);
        assert_eq!(state.traits.troll_slayer.positive, 4);
        assert_eq!(armed, vec![FactionEventKind::TrollHunt]);
    }

    #[test]
    fn test_kill_with_kind_and_family_counts_once() {
        let mut state = GmState::new(1);
        ingest(&mut state, GameEvent::kill(["kind:troll", "family:troll"], 3));
        assert_eq!(state.families["troll"].seen, 1);
    }

    #[test]
    fn test_threshold_arms_bounty() {
        let mut state = GmState::new(1);
        let mut armed = Vec::new();
        for turn in 0..8 {
            armed.extend(ingest(&mut state, GameEvent::kill(["faction:bandit"], turn)));
        }
        assert_eq!(armed, vec![FactionEventKind::BanditBounty]);
        assert!(state.scheduler.get("faction.bandit_bounty").is_some());
    }

    #[test]
    fn test_disabled_is_inert() {
        let mut state = GmState::new(1);
        state.enabled = false;
        let before = state.clone();
        assert!(ingest(&mut state, GameEvent::kill(["family:troll"], 1)).is_empty());
        assert_eq!(state, before);
    }
}
