//! Deterministic scheduler for long-horizon GM actions.
//!
//! Actions are units of delayed work with a delivery window
//! `[earliest_turn, latest_turn]` (latest 0 = unbounded), a priority and a
//! delivery mode. Each call to `pick_next` arbitrates among the pending actions
//! whose window contains the turn, subject to three rate limits:
//! - at most one delivery per turn unless the action opts out,
//! - `auto` deliveries spaced by a minimum number of turns,
//! - a cap on deliveries in a trailing window.
//!
//! **Critical constraint: determinism.** The winner is fully ordered by
//! (priority desc, earliest_turn asc, created_turn asc, id asc). Actions live
//! in a `BTreeMap`, never a `HashMap`, so iteration order never leaks into
//! results.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::state::debug::{push_bounded, truncate_front};

/// Delivery records kept for rate limiting.
pub const HISTORY_LIMIT: usize = 32;

/// Lifecycle of a scheduled action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Scheduled,
    Ready,
    Consumed,
    Expired,
    Cancelled,
}

impl ActionStatus {
    /// Still waiting to be delivered.
    pub fn is_pending(&self) -> bool {
        matches!(self, ActionStatus::Scheduled | ActionStatus::Ready)
    }
}

/// How the presentation layer should surface an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    /// Fires on its own.
    Auto,
    /// Needs the player to accept or decline.
    Confirm,
    /// Shown as a map marker the player may visit.
    Marker,
}

/// A unit of delayed GM work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledAction {
    pub id: String,
    pub kind: String,
    pub status: ActionStatus,
    pub priority: i32,
    pub delivery: Delivery,
    #[serde(default)]
    pub allow_multiple_per_turn: bool,
    pub created_turn: u32,
    pub earliest_turn: u32,
    /// 0 means the window never closes.
    #[serde(default)]
    pub latest_turn: u32,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl ScheduledAction {
    /// Create a pending action with an unbounded window opening at `created_turn`.
    pub fn new(id: impl Into<String>, kind: impl Into<String>, created_turn: u32) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            status: ActionStatus::Scheduled,
            priority: 0,
            delivery: Delivery::Auto,
            allow_multiple_per_turn: false,
            created_turn,
            earliest_turn: created_turn,
            latest_turn: 0,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_window(mut self, earliest_turn: u32, latest_turn: u32) -> Self {
        self.earliest_turn = earliest_turn;
        self.latest_turn = latest_turn;
        self
    }

    pub fn with_multiple_per_turn(mut self, allow: bool) -> Self {
        self.allow_multiple_per_turn = allow;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Whether `turn` falls inside the delivery window.
    pub fn window_contains(&self, turn: u32) -> bool {
        turn >= self.earliest_turn && (self.latest_turn == 0 || turn <= self.latest_turn)
    }

    /// Whether the window has closed for good.
    pub fn is_overdue(&self, turn: u32) -> bool {
        self.latest_turn != 0 && turn > self.latest_turn
    }

    /// Arbitration order: `Less` means `self` wins.
    fn precedence(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.earliest_turn.cmp(&other.earliest_turn))
            .then_with(|| self.created_turn.cmp(&other.created_turn))
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// One past delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub turn: u32,
    pub id: String,
}

/// Rate limits applied by `pick_next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    /// Minimum turns between two `auto` deliveries.
    pub auto_spacing_turns: u32,
    /// Length of the trailing window for the delivery cap.
    pub window_turns: u32,
    /// Deliveries allowed inside the trailing window.
    pub max_per_window: usize,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            auto_spacing_turns: 20,
            window_turns: 200,
            max_per_window: 4,
        }
    }
}

impl RateLimits {
    /// The delivery cap actually enforced: history keeps at most
    /// `HISTORY_LIMIT` records, so larger caps saturate there.
    pub fn effective_cap(&self) -> usize {
        self.max_per_window.min(HISTORY_LIMIT)
    }
}

/// Persistent scheduler state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerState {
    pub actions: BTreeMap<String, ScheduledAction>,
    /// Pending action ids in scheduling order.
    pub queue: Vec<String>,
    pub history: VecDeque<DeliveryRecord>,
    pub last_auto_turn: Option<u32>,
}

impl SchedulerState {
    /// An empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an action by id, whatever its status.
    pub fn get(&self, id: &str) -> Option<&ScheduledAction> {
        self.actions.get(id)
    }

    /// Pending actions in queue order.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledAction> {
        self.queue.iter().filter_map(|id| self.actions.get(id))
    }

    /// Schedule an action unless its id is already pending or consumed.
    ///
    /// Expired or cancelled slots are re-armed. Returns whether anything changed.
    pub fn schedule(&mut self, action: ScheduledAction) -> bool {
        if let Some(existing) = self.actions.get(&action.id) {
            if existing.status.is_pending() || existing.status == ActionStatus::Consumed {
                return false;
            }
        }
        self.replace(action);
        true
    }

    /// Insert or overwrite an action unconditionally, leaving it pending.
    pub fn replace(&mut self, mut action: ScheduledAction) {
        if !action.status.is_pending() {
            action.status = ActionStatus::Scheduled;
        }
        let id = action.id.clone();
        self.actions.insert(id.clone(), action);
        if !self.queue.contains(&id) {
            self.queue.push(id);
        }
    }

    /// Cancel a pending action. Returns whether it was pending.
    pub fn cancel(&mut self, id: &str) -> bool {
        match self.actions.get_mut(id) {
            Some(action) if action.status.is_pending() => {
                action.status = ActionStatus::Cancelled;
                self.queue.retain(|q| q != id);
                true
            }
            _ => false,
        }
    }

    /// Advance statuses for `turn`: open windows become `ready`, closed ones
    /// `expired`. Returns the ids that expired.
    pub fn refresh(&mut self, turn: u32) -> Vec<String> {
        let mut expired = Vec::new();
        for id in &self.queue {
            if let Some(action) = self.actions.get_mut(id) {
                if action.is_overdue(turn) {
                    action.status = ActionStatus::Expired;
                    expired.push(id.clone());
                } else if action.window_contains(turn) {
                    action.status = ActionStatus::Ready;
                }
            }
        }
        if !expired.is_empty() {
            self.queue.retain(|id| !expired.contains(id));
        }
        expired
    }

    /// Deliveries in the trailing `window` turns ending at `turn`.
    pub fn deliveries_in_window(&self, turn: u32, window: u32) -> usize {
        self.history
            .iter()
            .filter(|record| record.turn <= turn && turn - record.turn < window)
            .count()
    }

    fn delivered_on(&self, turn: u32) -> bool {
        self.history.iter().any(|record| record.turn == turn)
    }

    /// The action that should be delivered at `turn`, if any.
    pub fn pick_next(&self, turn: u32, limits: &RateLimits) -> Option<&ScheduledAction> {
        self.pick_next_where(turn, limits, |_| true)
    }

    /// Like `pick_next`, considering only actions accepted by `accept`.
    ///
    /// Rate limits still count every delivery, accepted or not.
    pub fn pick_next_where<F>(&self, turn: u32, limits: &RateLimits, accept: F) -> Option<&ScheduledAction>
    where
        F: Fn(&ScheduledAction) -> bool,
    {
        if self.deliveries_in_window(turn, limits.window_turns) >= limits.effective_cap() {
            return None;
        }
        let delivered_this_turn = self.delivered_on(turn);
        let auto_cooling = self
            .last_auto_turn
            .is_some_and(|last| turn.saturating_sub(last) < limits.auto_spacing_turns);

        self.pending()
            .filter(|action| action.status.is_pending() && action.window_contains(turn))
            .filter(|action| !delivered_this_turn || action.allow_multiple_per_turn)
            .filter(|action| action.delivery != Delivery::Auto || !auto_cooling)
            .filter(|action| accept(action))
            .min_by(|a, b| a.precedence(b))
    }

    /// Mark an action delivered at `turn`.
    ///
    /// Returns the consumed action, or `None` when it was not pending.
    pub fn consume(&mut self, id: &str, turn: u32) -> Option<ScheduledAction> {
        let action = self.actions.get_mut(id)?;
        if !action.status.is_pending() {
            return None;
        }
        action.status = ActionStatus::Consumed;
        if action.delivery == Delivery::Auto {
            self.last_auto_turn = Some(turn);
        }
        let consumed = action.clone();
        self.queue.retain(|q| q != id);
        push_bounded(
            &mut self.history,
            DeliveryRecord {
                turn,
                id: id.to_string(),
            },
            HISTORY_LIMIT,
        );
        Some(consumed)
    }

    /// Restore queue invariants: every pending action appears exactly once,
    /// nothing else appears at all.
    pub fn repair(&mut self) {
        let mut seen = BTreeSet::new();
        let actions = &self.actions;
        self.queue.retain(|id| {
            actions.get(id).is_some_and(|a| a.status.is_pending()) && seen.insert(id.clone())
        });
        for (id, action) in &mut self.actions {
            if action.id != *id {
                action.id = id.clone();
            }
            if action.status.is_pending() && !seen.contains(id) {
                seen.insert(id.clone());
                self.queue.push(id.clone());
            }
        }
        truncate_front(&mut self.history, HISTORY_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(id: &str, priority: i32, earliest: u32) -> ScheduledAction {
        ScheduledAction::new(id, "test", 0)
            .with_priority(priority)
            .with_window(earliest, 0)
            .with_delivery(Delivery::Confirm)
    }

    #[test]
    fn test_priority_wins() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("low", 100, 0));
        scheduler.schedule(action("high", 300, 0));
        let picked = scheduler.pick_next(10, &RateLimits::default()).unwrap();
        assert_eq!(picked.id, "high");
    }

    #[test]
    fn test_tie_breaks_earliest_then_created_then_id() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("b", 100, 5));
        scheduler.schedule(action("a", 100, 7));
        assert_eq!(scheduler.pick_next(10, &RateLimits::default()).unwrap().id, "b");

        let mut scheduler = SchedulerState::new();
        let mut late = action("a", 100, 5);
        late.created_turn = 3;
        scheduler.schedule(late);
        scheduler.schedule(action("b", 100, 5));
        assert_eq!(scheduler.pick_next(10, &RateLimits::default()).unwrap().id, "b");

        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("zeta", 100, 5));
        scheduler.schedule(action("alpha", 100, 5));
        assert_eq!(scheduler.pick_next(10, &RateLimits::default()).unwrap().id, "alpha");
    }

    #[test]
    fn test_window_respected() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("x", 1, 0).with_window(30, 60));
        assert!(scheduler.pick_next(29, &RateLimits::default()).is_none());
        assert!(scheduler.pick_next(30, &RateLimits::default()).is_some());
        assert!(scheduler.pick_next(61, &RateLimits::default()).is_none());
    }

    #[test]
    fn test_schedule_is_idempotent() {
        let mut scheduler = SchedulerState::new();
        assert!(scheduler.schedule(action("x", 1, 0)));
        assert!(!scheduler.schedule(action("x", 9, 0)));
        assert_eq!(scheduler.get("x").unwrap().priority, 1);
        scheduler.consume("x", 5);
        assert!(!scheduler.schedule(action("x", 1, 0)));
        assert_eq!(scheduler.queue.len(), 0);
    }

    #[test]
    fn test_consume_once() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("x", 1, 0));
        assert!(scheduler.consume("x", 5).is_some());
        assert!(scheduler.consume("x", 5).is_none());
        assert_eq!(scheduler.get("x").unwrap().status, ActionStatus::Consumed);
        assert_eq!(scheduler.history.len(), 1);
    }

    #[test]
    fn test_one_delivery_per_turn() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("a", 2, 0));
        scheduler.schedule(action("b", 1, 0));
        scheduler.consume("a", 10);
        assert!(scheduler.pick_next(10, &RateLimits::default()).is_none());
        assert_eq!(scheduler.pick_next(11, &RateLimits::default()).unwrap().id, "b");

        scheduler.replace(action("c", 0, 0).with_multiple_per_turn(true));
        assert_eq!(scheduler.pick_next(10, &RateLimits::default()).unwrap().id, "c");
    }

    #[test]
    fn test_auto_spacing() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("first", 1, 0).with_delivery(Delivery::Auto));
        scheduler.schedule(action("second", 1, 0).with_delivery(Delivery::Auto));
        scheduler.consume("first", 100);
        assert_eq!(scheduler.last_auto_turn, Some(100));
        assert!(scheduler.pick_next(119, &RateLimits::default()).is_none());
        assert!(scheduler.pick_next(120, &RateLimits::default()).is_some());
    }

    #[test]
    fn test_trailing_window_cap() {
        let mut scheduler = SchedulerState::new();
        for (i, turn) in [10u32, 20, 30, 40].iter().enumerate() {
            let id = format!("done{i}");
            scheduler.schedule(action(&id, 1, 0));
            scheduler.consume(&id, *turn);
        }
        scheduler.schedule(action("waiting", 1, 0));
        assert!(scheduler.pick_next(209, &RateLimits::default()).is_none());
        assert!(scheduler.pick_next(210, &RateLimits::default()).is_some());
    }

    #[test]
    fn test_cap_above_history_limit_saturates() {
        let limits = RateLimits {
            auto_spacing_turns: 0,
            window_turns: 1_000,
            max_per_window: 100,
        };
        assert_eq!(limits.effective_cap(), HISTORY_LIMIT);
        let mut scheduler = SchedulerState::new();
        for turn in 0..HISTORY_LIMIT as u32 {
            let id = format!("done{turn}");
            scheduler.schedule(action(&id, 1, 0));
            scheduler.consume(&id, turn);
        }
        assert_eq!(scheduler.history.len(), HISTORY_LIMIT);
        scheduler.schedule(action("waiting", 1, 0));
        assert!(scheduler.pick_next(40, &limits).is_none());
    }

    #[test]
    fn test_pick_next_where_filters_kind() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(ScheduledAction::new("marker", "tooling", 0).with_priority(999));
        scheduler.schedule(action("event", 1, 0));
        let limits = RateLimits::default();
        assert_eq!(scheduler.pick_next(5, &limits).unwrap().id, "marker");
        let picked = scheduler.pick_next_where(5, &limits, |a| a.kind == "test").unwrap();
        assert_eq!(picked.id, "event");
        assert!(scheduler.pick_next_where(5, &limits, |a| a.kind == "none").is_none());
    }

    #[test]
    fn test_refresh_marks_ready_and_expired() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("open", 1, 0).with_window(5, 50));
        scheduler.schedule(action("gone", 1, 0).with_window(0, 8));
        let expired = scheduler.refresh(10);
        assert_eq!(expired, vec!["gone".to_string()]);
        assert_eq!(scheduler.get("open").unwrap().status, ActionStatus::Ready);
        assert_eq!(scheduler.get("gone").unwrap().status, ActionStatus::Expired);
        assert_eq!(scheduler.queue, vec!["open".to_string()]);
        // An expired slot may be armed again.
        assert!(scheduler.schedule(action("gone", 1, 0)));
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("x", 1, 0));
        assert!(scheduler.cancel("x"));
        assert!(!scheduler.cancel("x"));
        assert!(scheduler.pick_next(1, &RateLimits::default()).is_none());
    }

    #[test]
    fn test_repair_rebuilds_queue() {
        let mut scheduler = SchedulerState::new();
        scheduler.schedule(action("a", 1, 0));
        scheduler.schedule(action("b", 1, 0));
        scheduler.consume("b", 3);
        scheduler.queue = vec![
            "a".to_string(),
            "a".to_string(),
            "ghost".to_string(),
            "b".to_string(),
        ];
        scheduler.repair();
        assert_eq!(scheduler.queue, vec!["a".to_string()]);

        scheduler.queue.clear();
        scheduler.repair();
        assert_eq!(scheduler.queue, vec!["a".to_string()]);
    }
}
