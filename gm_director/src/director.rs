//! The director session: one run's GM state with its tuning and storage.

use gm_state::{ActionStatus, GmState, IntentChannel, IntentRecord, RunId, ScheduledAction};
use log::{debug, info, warn};
use std::collections::BTreeMap;

use crate::config::DirectorConfig;
use crate::events::GameEvent;
use crate::factions::{self, FactionEventKind, FactionTravel, FACTION_ACTION_KIND};
use crate::ingest::EventIngest;
use crate::intents::{EntranceIntent, IntentChannels, MechanicHint};
use crate::persist::{MemoryStore, Persister, SnapshotStore};
use crate::turn::TurnEngine;

/// Host-owned pacing director for one run.
///
/// Every decision method degrades to a safe default; storage failures are
/// logged and never surface.
#[derive(Debug)]
pub struct Director<S: SnapshotStore = MemoryStore> {
    run_id: RunId,
    config: DirectorConfig,
    state: GmState,
    store: S,
    persister: Persister,
    turn_engine: TurnEngine,
    ingest: EventIngest,
    channels: IntentChannels,
}

impl Director<MemoryStore> {
    /// A director with default tuning and in-memory storage.
    pub fn in_memory(run_id: RunId) -> Self {
        Self::open(run_id, DirectorConfig::default(), MemoryStore::new())
    }
}

impl<S: SnapshotStore> Director<S> {
    /// Open a run, rehydrating its state from `store` when a matching record exists.
    pub fn open(run_id: RunId, config: DirectorConfig, store: S) -> Self {
        let persister = Persister::new(config.persist.record_key.clone(), config.persist.min_turns_between_saves);
        let state = persister.load(&store, run_id.seed());
        info!("GM director opened for run {run_id}");
        Self {
            run_id,
            turn_engine: TurnEngine::new(config.boredom),
            ingest: EventIngest::new(config.scheduler.heat_decay_turns),
            channels: IntentChannels::new(config.entrance, config.hint),
            config,
            state,
            store,
            persister,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn config(&self) -> &DirectorConfig {
        &self.config
    }

    pub fn state(&self) -> &GmState {
        &self.state
    }

    /// Mutable access for tooling. Changes are persisted on the next due save.
    pub fn state_mut(&mut self) -> &mut GmState {
        self.persister.mark_dirty();
        &mut self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    /// Kill switch. A disabled director keeps its state but decides nothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.state.enabled != enabled {
            info!("GM director {}", if enabled { "enabled" } else { "disabled" });
            self.state.enabled = enabled;
            self.persister.mark_dirty();
        }
    }

    /// Advance boredom and mood for `turn` spent in `mode`.
    pub fn tick(&mut self, turn: u32, mode: &str) {
        if self.turn_engine.tick(&mut self.state, turn, mode) {
            self.persister.mark_dirty();
            self.persister.save_if_due(&mut self.store, &self.state, turn);
        }
    }

    /// Feed one telemetry event. Returns faction events it armed.
    pub fn on_event(&mut self, event: &GameEvent) -> Vec<FactionEventKind> {
        if !self.state.enabled {
            return Vec::new();
        }
        let armed = self.ingest.on_event(&mut self.state, event);
        self.persister.mark_dirty();
        self.persister.save_if_due(&mut self.store, &self.state, event.turn);
        armed
    }

    /// Flavor for entering `mode` at `turn`, if the director wants to speak.
    pub fn entrance_intent(&mut self, mode: &str, turn: u32) -> EntranceIntent {
        let intent = self.channels.entrance_intent(&mut self.state, mode, turn);
        self.after_decision(turn);
        intent
    }

    /// A nudge toward an optional mechanic, if one is due.
    pub fn mechanic_hint(&mut self, turn: u32) -> MechanicHint {
        let hint = self.channels.mechanic_hint(&mut self.state, turn);
        self.after_decision(turn);
        hint
    }

    fn after_decision(&mut self, turn: u32) {
        if self.state.enabled {
            self.persister.mark_dirty();
            self.persister.save_if_due(&mut self.store, &self.state, turn);
        }
    }

    /// The scheduler's pick for `turn`, after expiring closed windows.
    pub fn pick_next(&mut self, turn: u32) -> Option<ScheduledAction> {
        self.pick_matching(turn, |_| true)
    }

    fn pick_matching<F>(&mut self, turn: u32, accept: F) -> Option<ScheduledAction>
    where
        F: Fn(&ScheduledAction) -> bool,
    {
        if !self.state.enabled {
            return None;
        }
        let expired = self.state.scheduler.refresh(turn);
        if !expired.is_empty() {
            debug!("expired scheduled actions at turn {turn}: {expired:?}");
            self.persister.mark_dirty();
        }
        self.state
            .scheduler
            .pick_next_where(turn, &self.config.scheduler.rate_limits, accept)
            .cloned()
    }

    /// Mark an action delivered and persist immediately.
    pub fn consume(&mut self, id: &str, turn: u32) -> Option<ScheduledAction> {
        if !self.state.enabled {
            return None;
        }
        let consumed = self.state.scheduler.consume(id, turn)?;
        self.state.cooldowns.last_action_turn = Some(turn);
        self.persister.mark_dirty();
        if !self.persister.force_save(&mut self.store, &self.state, turn) {
            warn!("consumed `{id}` at turn {turn} but could not persist it");
        }
        Some(consumed)
    }

    /// Deliver at most one faction event on travel.
    ///
    /// Only faction actions are considered; other scheduled work stays pending.
    pub fn next_faction_travel(&mut self, turn: u32) -> FactionTravel {
        if !self.state.enabled {
            return FactionTravel::None;
        }
        let Some(action) = self.pick_matching(turn, |action| action.kind == FACTION_ACTION_KIND) else {
            self.state
                .debug
                .record_intent(IntentRecord::none(turn, IntentChannel::Faction, "no.action"));
            return FactionTravel::None;
        };
        let travel = FactionTravel::for_action(&action);
        if self.consume(&action.id, turn).is_none() {
            return FactionTravel::None;
        }
        let kind = match &travel {
            FactionTravel::None => "none",
            FactionTravel::GuardFine => "guard_fine",
            FactionTravel::Encounter { .. } => "encounter",
        };
        self.state.debug.record_intent(IntentRecord::fired(
            turn,
            IntentChannel::Faction,
            kind,
            "scheduler.pick",
            action.id.clone(),
        ));
        info!("delivering {} at turn {turn}", action.id);
        travel
    }

    /// Arm a faction event now, bypassing reputation thresholds.
    pub fn force_schedule(&mut self, kind: FactionEventKind, turn: u32) {
        factions::force_schedule(&mut self.state, kind, turn);
        self.persister.mark_dirty();
    }

    /// Per-kind faction slot status, derived from the scheduler.
    pub fn faction_event_slots(&self) -> BTreeMap<&'static str, Option<ActionStatus>> {
        factions::faction_event_slots(&self.state)
    }

    /// Start a new run: the durable record is cleared and state starts fresh.
    pub fn reset(&mut self, run_id: RunId) {
        let enabled = self.state.enabled;
        self.persister.clear(&mut self.store);
        self.run_id = run_id;
        self.state = GmState::new(run_id.seed());
        self.state.enabled = enabled;
        self.state.normalize();
        info!("GM director reset for run {run_id}");
    }

    /// The current state as snapshot JSON.
    pub fn snapshot_json(&self) -> Option<String> {
        match self.state.to_snapshot() {
            Ok(json) => Some(json),
            Err(err) => {
                warn!("could not serialize GM state: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::persist::NullStore;

    fn director(seed: u128) -> Director {
        Director::in_memory(RunId::from_u128(seed))
    }

    #[test]
    fn test_open_fresh_and_rehydrate() {
        let run = RunId::from_u128(77);
        let mut first = Director::in_memory(run);
        first.on_event(&GameEvent::mode_enter("town", 1));
        let store = first.store().clone();
        assert_eq!(store.writes(), 1);

        let second = Director::open(run, DirectorConfig::default(), store);
        assert_eq!(second.state().stats.town_entries(), 1);
    }

    #[test]
    fn test_other_run_starts_fresh() {
        let mut first = director(1);
        first.on_event(&GameEvent::mode_enter("town", 1));
        let store = first.store().clone();
        let other = Director::open(RunId::from_u128(2), DirectorConfig::default(), store);
        assert_eq!(other.state().stats.town_entries(), 0);
    }

    #[test]
    fn test_save_at_most_once_per_turn() {
        let mut gm = director(3);
        gm.tick(1, "dungeon");
        gm.on_event(&GameEvent::new(EventKind::EncounterEnter, 1));
        gm.tick(1, "dungeon");
        assert_eq!(gm.store().writes(), 1);
        gm.tick(2, "dungeon");
        assert_eq!(gm.store().writes(), 2);
    }

    #[test]
    fn test_force_scheduled_guard_fine_delivers_once() {
        let mut gm = director(4);
        gm.force_schedule(FactionEventKind::GuardFine, 10);
        assert_eq!(gm.faction_event_slots()["guard_fine"], Some(ActionStatus::Scheduled));
        assert_eq!(gm.next_faction_travel(10), FactionTravel::GuardFine);
        assert_eq!(gm.next_faction_travel(10), FactionTravel::None);
        assert_eq!(gm.faction_event_slots()["guard_fine"], Some(ActionStatus::Consumed));
    }

    #[test]
    fn test_travel_leaves_other_actions_pending() {
        let mut gm = director(11);
        gm.state_mut()
            .scheduler
            .schedule(ScheduledAction::new("tooling.marker", "tooling", 0).with_priority(999));
        assert!(gm.next_faction_travel(5).is_none());
        let marker = gm.state().scheduler.get("tooling.marker").unwrap();
        assert!(marker.status.is_pending());
        assert!(gm.state().scheduler.history.is_empty());

        gm.force_schedule(FactionEventKind::GuardFine, 5);
        assert_eq!(gm.next_faction_travel(5), FactionTravel::GuardFine);
        assert!(gm.state().scheduler.get("tooling.marker").unwrap().status.is_pending());
        assert_eq!(gm.pick_next(6).unwrap().id, "tooling.marker");
    }

    #[test]
    fn test_consume_persists_immediately() {
        let mut gm = director(5);
        gm.force_schedule(FactionEventKind::TrollHunt, 10);
        let writes = gm.store().writes();
        assert!(gm.consume("faction.troll_hunt", 10).is_some());
        assert_eq!(gm.store().writes(), writes + 1);
        let saved = gm.store().get("gm.state").unwrap();
        let restored = GmState::from_snapshot(saved, gm.state().run_seed).unwrap();
        assert_eq!(
            restored.scheduler.get("faction.troll_hunt").unwrap().status,
            ActionStatus::Consumed
        );
    }

    #[test]
    fn test_disabled_director_is_inert() {
        let mut gm = director(6);
        gm.set_enabled(false);
        let before = gm.state().clone();
        gm.tick(1, "town");
        gm.on_event(&GameEvent::kill(["family:troll"], 1));
        assert!(gm.entrance_intent("town", 1).is_none());
        assert!(gm.mechanic_hint(1).is_none());
        assert!(gm.next_faction_travel(1).is_none());
        assert_eq!(gm.state(), &before);
    }

    #[test]
    fn test_reset_clears_record() {
        let mut gm = director(7);
        gm.on_event(&GameEvent::mode_enter("town", 1));
        assert!(gm.store().get("gm.state").is_some());
        gm.set_enabled(false);
        gm.reset(RunId::from_u128(8));
        assert!(gm.store().get("gm.state").is_none());
        assert_eq!(gm.state().run_seed, RunId::from_u128(8).seed());
        assert_eq!(gm.state().stats.town_entries(), 0);
        assert!(!gm.is_enabled());
    }

    #[test]
    fn test_null_store_never_fails_decisions() {
        let mut gm = Director::open(RunId::from_u128(9), DirectorConfig::default(), NullStore);
        gm.force_schedule(FactionEventKind::BanditBounty, 0);
        assert_eq!(
            gm.next_faction_travel(0),
            FactionTravel::Encounter {
                encounter_id: "bandit_bounty".to_string()
            }
        );
    }

    #[test]
    fn test_snapshot_json_matches_state() {
        let gm = director(10);
        let json = gm.snapshot_json().unwrap();
        assert_eq!(GmState::from_snapshot(&json, gm.state().run_seed).unwrap(), *gm.state());
    }
}
