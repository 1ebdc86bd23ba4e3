//! Telemetry ledgers: play statistics, reputation tallies and mechanic usage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::mechanics::{KnowledgeState, Mechanic, MechanicAction};

/// Scope name under which town visits are counted.
pub const TOWN_SCOPE: &str = "town";

/// Scopes that count as settlements for pacing purposes.
pub const SETTLEMENT_SCOPES: [&str; 2] = ["town", "tavern"];

/// Whether a scope is a settlement (town or tavern).
pub fn is_settlement(scope: &str) -> bool {
    SETTLEMENT_SCOPES.contains(&scope)
}

/// Direction of a reputation observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    /// Positive on success, negative otherwise.
    pub fn from_success(success: bool) -> Self {
        if success {
            Polarity::Positive
        } else {
            Polarity::Negative
        }
    }
}

/// Tally of observations about a trait, creature family or faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReputationEntry {
    pub seen: u32,
    pub positive: u32,
    pub negative: u32,
    pub last_updated_turn: Option<u32>,
}

impl ReputationEntry {
    /// Record one observation.
    pub fn record(&mut self, polarity: Polarity, turn: u32) {
        self.seen = self.seen.saturating_add(1);
        match polarity {
            Polarity::Positive => self.positive = self.positive.saturating_add(1),
            Polarity::Negative => self.negative = self.negative.saturating_add(1),
            Polarity::Neutral => {}
        }
        self.last_updated_turn = Some(turn);
    }

    /// (positive - negative) / (positive + negative); `None` without any
    /// polarized observation.
    pub fn score(&self) -> Option<f64> {
        let total = u64::from(self.positive) + u64::from(self.negative);
        if total == 0 {
            return None;
        }
        Some((f64::from(self.positive) - f64::from(self.negative)) / total as f64)
    }
}

/// Player usage of one optional mechanic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MechanicUsage {
    pub seen: u32,
    pub tried: u32,
    pub success: u32,
    pub failure: u32,
    pub dismiss: u32,
    pub first_seen_turn: Option<u32>,
    pub last_used_turn: Option<u32>,
}

impl MechanicUsage {
    /// Count one interaction. The first one sets `first_seen_turn`; uses also
    /// move `last_used_turn`.
    pub fn record(&mut self, action: MechanicAction, turn: u32) {
        let counter = match action {
            MechanicAction::Seen => &mut self.seen,
            MechanicAction::Tried => &mut self.tried,
            MechanicAction::Success => &mut self.success,
            MechanicAction::Failure => &mut self.failure,
            MechanicAction::Dismiss => &mut self.dismiss,
        };
        *counter = counter.saturating_add(1);
        if self.first_seen_turn.is_none() {
            self.first_seen_turn = Some(turn);
        }
        if action.is_use() {
            self.last_used_turn = Some(turn);
        }
    }

    /// How well the player knows this mechanic at `now`.
    pub fn knowledge(&self, now: u32) -> KnowledgeState {
        KnowledgeState::classify(self.seen, self.tried, self.dismiss, self.last_used_turn, now)
    }
}

/// Usage of every optional mechanic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MechanicsLedger {
    pub fishing: MechanicUsage,
    pub lockpicking: MechanicUsage,
    pub quest_board: MechanicUsage,
    pub followers: MechanicUsage,
}

impl MechanicsLedger {
    /// Usage for one mechanic.
    pub fn get(&self, mechanic: Mechanic) -> &MechanicUsage {
        match mechanic {
            Mechanic::Fishing => &self.fishing,
            Mechanic::Lockpicking => &self.lockpicking,
            Mechanic::QuestBoard => &self.quest_board,
            Mechanic::Followers => &self.followers,
        }
    }

    pub fn get_mut(&mut self, mechanic: Mechanic) -> &mut MechanicUsage {
        match mechanic {
            Mechanic::Fishing => &mut self.fishing,
            Mechanic::Lockpicking => &mut self.lockpicking,
            Mechanic::QuestBoard => &mut self.quest_board,
            Mechanic::Followers => &mut self.followers,
        }
    }
}

/// Player-character traits the director tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TraitKind {
    TrollSlayer,
    TownProtector,
    CaravanAlly,
}

/// Reputation tallies for each tracked trait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Traits {
    pub troll_slayer: ReputationEntry,
    pub town_protector: ReputationEntry,
    pub caravan_ally: ReputationEntry,
}

impl Traits {
    /// Tally for one trait.
    pub fn get(&self, kind: TraitKind) -> &ReputationEntry {
        match kind {
            TraitKind::TrollSlayer => &self.troll_slayer,
            TraitKind::TownProtector => &self.town_protector,
            TraitKind::CaravanAlly => &self.caravan_ally,
        }
    }

    pub fn get_mut(&mut self, kind: TraitKind) -> &mut ReputationEntry {
        match kind {
            TraitKind::TrollSlayer => &mut self.troll_slayer,
            TraitKind::TownProtector => &mut self.town_protector,
            TraitKind::CaravanAlly => &mut self.caravan_ally,
        }
    }
}

/// Play statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Stats {
    pub total_turns: u32,
    /// Mode -> turns spent in it.
    pub mode_turns: BTreeMap<String, u32>,
    /// Mode -> times entered.
    pub mode_entries: BTreeMap<String, u32>,
    pub encounter_starts: u32,
    pub encounter_completions: u32,
    pub current_mode: Option<String>,
    pub last_tick_turn: Option<u32>,
}

impl Stats {
    /// Times a scope has been entered.
    pub fn entries(&self, scope: &str) -> u32 {
        self.mode_entries.get(scope).copied().unwrap_or(0)
    }

    pub fn town_entries(&self) -> u32 {
        self.entries(TOWN_SCOPE)
    }

    /// Count an entry into `scope` and make it the current mode.
    ///
    /// Returns the entry count including this one.
    pub fn record_entry(&mut self, scope: &str) -> u32 {
        let count = self.mode_entries.entry(scope.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        self.current_mode = Some(scope.to_string());
        *count
    }

    /// Count one turn spent in `mode`.
    pub fn record_turn(&mut self, mode: &str) {
        self.total_turns = self.total_turns.saturating_add(1);
        let count = self.mode_turns.entry(mode.to_string()).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Whether the player is currently in town.
    pub fn in_town(&self) -> bool {
        self.current_mode.as_deref() == Some(TOWN_SCOPE)
    }

    /// The mode holding the most turns, ties broken by name.
    pub fn dominant_mode(&self) -> Option<(&str, u32)> {
        self.mode_turns
            .iter()
            .fold(None, |best: Option<(&str, u32)>, (mode, turns)| match best {
                Some((_, best_turns)) if best_turns >= *turns => best,
                _ => Some((mode.as_str(), *turns)),
            })
    }

    /// The least-visited known mode other than `exclude`, ties broken by name.
    pub fn least_visited_mode(&self, exclude: &str) -> Option<&str> {
        let known = self.mode_turns.keys().chain(self.mode_entries.keys());
        let mut best: Option<(&str, u32)> = None;
        for mode in known {
            if mode == exclude {
                continue;
            }
            let turns = self.mode_turns.get(mode).copied().unwrap_or(0);
            match best {
                Some((name, best_turns)) if best_turns < turns || (best_turns == turns && name <= mode.as_str()) => {}
                _ => best = Some((mode.as_str(), turns)),
            }
        }
        best.map(|(mode, _)| mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reputation_score() {
        let mut entry = ReputationEntry::default();
        assert_eq!(entry.score(), None);
        entry.record(Polarity::Positive, 1);
        entry.record(Polarity::Positive, 2);
        entry.record(Polarity::Positive, 3);
        entry.record(Polarity::Negative, 4);
        entry.record(Polarity::Neutral, 5);
        assert_eq!(entry.seen, 5);
        assert!((entry.score().unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(entry.last_updated_turn, Some(5));
    }

    #[test]
    fn test_mechanic_usage_turns() {
        let mut usage = MechanicUsage::default();
        usage.record(MechanicAction::Seen, 4);
        usage.record(MechanicAction::Tried, 9);
        usage.record(MechanicAction::Dismiss, 12);
        assert_eq!(usage.first_seen_turn, Some(4));
        assert_eq!(usage.last_used_turn, Some(9));
        assert_eq!(usage.seen, 1);
        assert_eq!(usage.tried, 1);
        assert_eq!(usage.dismiss, 1);
    }

    #[test]
    fn test_stats_entries_and_turns() {
        let mut stats = Stats::default();
        assert_eq!(stats.record_entry("town"), 1);
        assert_eq!(stats.record_entry("town"), 2);
        stats.record_turn("town");
        assert_eq!(stats.town_entries(), 2);
        assert_eq!(stats.total_turns, 1);
        assert!(stats.in_town());
    }

    #[test]
    fn test_dominant_and_least_visited() {
        let mut stats = Stats::default();
        for _ in 0..80 {
            stats.record_turn("dungeon");
        }
        for _ in 0..15 {
            stats.record_turn("town");
        }
        for _ in 0..5 {
            stats.record_turn("overworld");
        }
        stats.record_entry("tavern");
        assert_eq!(stats.dominant_mode(), Some(("dungeon", 80)));
        assert_eq!(stats.least_visited_mode("dungeon"), Some("tavern"));
    }

    #[test]
    fn test_settlement_scopes() {
        assert!(is_settlement("town"));
        assert!(is_settlement("tavern"));
        assert!(!is_settlement("dungeon"));
    }
}
