//! Per-turn boredom and mood dynamics.

use gm_state::{GmState, BOREDOM_HORIZON_TURNS};
use log::trace;

use crate::config::BoredomConfig;

/// Advances boredom and mood once per host tick.
#[derive(Debug, Clone, Default)]
pub struct TurnEngine {
    config: BoredomConfig,
}

impl TurnEngine {
    pub fn new(config: BoredomConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Apply one tick for `turn` spent in `mode`.
    ///
    /// Turn counters move only the first time a turn index is seen; the
    /// smoothing step runs on every call. Returns whether the state changed.
    pub fn tick(&self, state: &mut GmState, turn: u32, mode: &str) -> bool {
        if !state.enabled {
            return false;
        }

        if state.stats.last_tick_turn != Some(turn) {
            let boredom = &mut state.boredom;
            if boredom.last_interesting_turn != Some(turn) {
                boredom.turns_since_last_interesting_event =
                    boredom.turns_since_last_interesting_event.saturating_add(1);
            }
            boredom.turns_since_last_interesting_event =
                boredom.turns_since_last_interesting_event.min(BOREDOM_HORIZON_TURNS);
            state.mood.decay_transient(self.config.transient_decay);
            state.stats.record_turn(&mode.trim().to_ascii_lowercase());
            state.stats.last_tick_turn = Some(turn);
        }

        state.boredom.smooth(self.config.smoothing_rate);
        state.mood.settle(state.boredom.level);
        state.mood.last_updated_turn = Some(turn);
        trace!(
            "tick {turn}: boredom {:.3}, mood {}",
            state.boredom.level,
            state.mood.primary
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gm_state::MoodLabel;

    #[test]
    fn test_tick_counts_turns_once() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        engine.tick(&mut state, 1, "dungeon");
        engine.tick(&mut state, 1, "dungeon");
        engine.tick(&mut state, 2, "Town");
        assert_eq!(state.stats.total_turns, 2);
        assert_eq!(state.stats.mode_turns["dungeon"], 1);
        assert_eq!(state.stats.mode_turns["town"], 1);
        assert_eq!(state.boredom.turns_since_last_interesting_event, 2);
        assert_eq!(state.mood.last_updated_turn, Some(2));
    }

    #[test]
    fn test_interesting_turn_does_not_count() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        state.boredom.mark_interesting("combat.kill", 5);
        engine.tick(&mut state, 5, "dungeon");
        assert_eq!(state.boredom.turns_since_last_interesting_event, 0);
        engine.tick(&mut state, 6, "dungeon");
        assert_eq!(state.boredom.turns_since_last_interesting_event, 1);
    }

    #[test]
    fn test_turns_since_is_clamped() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        state.boredom.turns_since_last_interesting_event = BOREDOM_HORIZON_TURNS;
        engine.tick(&mut state, 1, "dungeon");
        assert_eq!(state.boredom.turns_since_last_interesting_event, BOREDOM_HORIZON_TURNS);
    }

    #[test]
    fn test_transient_decays_per_new_turn() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        state.mood.transient_valence = 0.5;
        engine.tick(&mut state, 1, "dungeon");
        engine.tick(&mut state, 1, "dungeon");
        assert!((state.mood.transient_valence - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_saturated_boredom_turns_stern() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        state.boredom.turns_since_last_interesting_event = BOREDOM_HORIZON_TURNS;
        state.boredom.last_interesting_turn = Some(0);
        for _ in 0..60 {
            engine.tick(&mut state, 0, "dungeon");
        }
        assert!(state.boredom.level > 0.97);
        assert_eq!(state.mood.primary, MoodLabel::Stern);
    }

    #[test]
    fn test_disabled_is_inert() {
        let engine = TurnEngine::with_defaults();
        let mut state = GmState::new(1);
        state.enabled = false;
        let before = state.clone();
        assert!(!engine.tick(&mut state, 1, "dungeon"));
        assert_eq!(state, before);
    }
}
