//! Mood and boredom - the director's read on how the session feels.

use serde::{Deserialize, Serialize};

/// Turns without anything interesting after which boredom saturates.
pub const BOREDOM_HORIZON_TURNS: u32 = 200;

const VALENCE_CALM: f64 = 0.15;
const VALENCE_BORED: f64 = -0.5;
const AROUSAL_CALM: f64 = 0.25;
const AROUSAL_BORED: f64 = 0.75;

/// Half-width of the band around zero valence that reads as neither side.
const NEUTRAL_BAND: f64 = 0.2;

/// Derived mood label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Calm,
    Curious,
    Bored,
    #[default]
    Neutral,
    Playful,
    Stern,
    Restless,
}

impl MoodLabel {
    /// Pure function of (valence, arousal).
    pub fn derive(valence: f64, arousal: f64) -> Self {
        if arousal < 0.2 {
            return MoodLabel::Calm;
        }
        let high = arousal >= 0.6;
        if valence > NEUTRAL_BAND {
            if high {
                MoodLabel::Playful
            } else {
                MoodLabel::Curious
            }
        } else if valence < -NEUTRAL_BAND {
            if high {
                MoodLabel::Stern
            } else {
                MoodLabel::Bored
            }
        } else if high {
            MoodLabel::Restless
        } else {
            MoodLabel::Neutral
        }
    }

    /// Sour moods in which the director looks for something to shake things up.
    pub fn is_restive(&self) -> bool {
        matches!(self, MoodLabel::Stern | MoodLabel::Restless | MoodLabel::Bored)
    }

    /// Open moods in which the director may offer light variety.
    pub fn is_receptive(&self) -> bool {
        matches!(self, MoodLabel::Curious | MoodLabel::Playful | MoodLabel::Neutral)
    }
}

impl std::fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MoodLabel::Calm => "calm",
            MoodLabel::Curious => "curious",
            MoodLabel::Bored => "bored",
            MoodLabel::Neutral => "neutral",
            MoodLabel::Playful => "playful",
            MoodLabel::Stern => "stern",
            MoodLabel::Restless => "restless",
        };
        f.write_str(s)
    }
}

/// Valence/arousal mood: a boredom-driven baseline plus an event-driven transient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Mood {
    pub primary: MoodLabel,
    /// -1.0 (grim) to 1.0 (bright).
    pub valence: f64,
    /// 0.0 (sleepy) to 1.0 (agitated).
    pub arousal: f64,
    pub baseline_valence: f64,
    pub baseline_arousal: f64,
    pub transient_valence: f64,
    pub transient_arousal: f64,
    pub last_updated_turn: Option<u32>,
}

impl Default for Mood {
    fn default() -> Self {
        let mut mood = Self {
            primary: MoodLabel::Neutral,
            valence: 0.0,
            arousal: 0.0,
            baseline_valence: 0.0,
            baseline_arousal: 0.0,
            transient_valence: 0.0,
            transient_arousal: 0.0,
            last_updated_turn: None,
        };
        mood.settle(0.0);
        mood
    }
}

impl Mood {
    /// Baseline (valence, arousal) for a boredom level.
    pub fn baseline_for(boredom_level: f64) -> (f64, f64) {
        let b = boredom_level.clamp(0.0, 1.0);
        (
            VALENCE_CALM + (VALENCE_BORED - VALENCE_CALM) * b,
            AROUSAL_CALM + (AROUSAL_BORED - AROUSAL_CALM) * b,
        )
    }

    /// Recompute baseline, final values and label from the current boredom.
    pub fn settle(&mut self, boredom_level: f64) {
        let (bv, ba) = Self::baseline_for(boredom_level);
        self.baseline_valence = bv;
        self.baseline_arousal = ba;
        self.valence = (bv + self.transient_valence).clamp(-1.0, 1.0);
        self.arousal = (ba + self.transient_arousal).clamp(0.0, 1.0);
        self.primary = MoodLabel::derive(self.valence, self.arousal);
    }

    /// Fade the transient component toward zero.
    pub fn decay_transient(&mut self, factor: f64) {
        self.transient_valence *= factor;
        self.transient_arousal *= factor;
    }

    /// Nudge the transient component.
    ///
    /// Bad news lands harder on a bored player and good news softer.
    pub fn apply_impulse(&mut self, valence: f64, arousal: f64, boredom_level: f64) {
        let b = boredom_level.clamp(0.0, 1.0);
        let scale = |delta: f64| {
            if delta < 0.0 {
                delta * (0.5 + b)
            } else {
                delta * (1.0 - 0.5 * b)
            }
        };
        self.transient_valence = (self.transient_valence + scale(valence)).clamp(-1.0, 1.0);
        self.transient_arousal = (self.transient_arousal + scale(arousal)).clamp(-1.0, 1.0);
    }

    /// Force every field back inside its range and re-derive the label.
    pub fn repair(&mut self) {
        let finite = |v: f64| if v.is_finite() { v } else { 0.0 };
        self.transient_valence = finite(self.transient_valence).clamp(-1.0, 1.0);
        self.transient_arousal = finite(self.transient_arousal).clamp(-1.0, 1.0);
        self.baseline_valence = finite(self.baseline_valence).clamp(-1.0, 1.0);
        self.baseline_arousal = finite(self.baseline_arousal).clamp(0.0, 1.0);
        self.valence = finite(self.valence).clamp(-1.0, 1.0);
        self.arousal = finite(self.arousal).clamp(0.0, 1.0);
        self.primary = MoodLabel::derive(self.valence, self.arousal);
    }
}

/// The last event that broke the monotony.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestingEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub turn: u32,
}

/// Normalized measure of how long it has been since anything happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Boredom {
    /// 0.0 (engaged) to 1.0 (bored stiff), smoothed.
    pub level: f64,
    pub turns_since_last_interesting_event: u32,
    pub last_interesting_event: Option<InterestingEvent>,
    pub last_interesting_turn: Option<u32>,
}

impl Boredom {
    /// Record an interesting event; the timer restarts.
    pub fn mark_interesting(&mut self, kind: &str, turn: u32) {
        self.turns_since_last_interesting_event = 0;
        self.last_interesting_turn = Some(turn);
        self.last_interesting_event = Some(InterestingEvent {
            kind: kind.to_string(),
            turn,
        });
    }

    /// Level the smoothing is pulling toward.
    pub fn target(&self) -> f64 {
        f64::from(self.turns_since_last_interesting_event.min(BOREDOM_HORIZON_TURNS))
            / f64::from(BOREDOM_HORIZON_TURNS)
    }

    /// One exponential-smoothing step toward the target.
    pub fn smooth(&mut self, rate: f64) {
        let target = self.target();
        self.level = (self.level + rate * (target - self.level)).clamp(0.0, 1.0);
    }

    /// Clamp a decoded boredom back into range.
    pub fn repair(&mut self) {
        if !self.level.is_finite() {
            self.level = 0.0;
        }
        self.level = self.level.clamp(0.0, 1.0);
        self.turns_since_last_interesting_event =
            self.turns_since_last_interesting_event.min(BOREDOM_HORIZON_TURNS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_bands() {
        assert_eq!(MoodLabel::derive(0.9, 0.1), MoodLabel::Calm);
        assert_eq!(MoodLabel::derive(0.5, 0.4), MoodLabel::Curious);
        assert_eq!(MoodLabel::derive(-0.5, 0.4), MoodLabel::Bored);
        assert_eq!(MoodLabel::derive(0.1, 0.4), MoodLabel::Neutral);
        assert_eq!(MoodLabel::derive(0.5, 0.7), MoodLabel::Playful);
        assert_eq!(MoodLabel::derive(-0.5, 0.7), MoodLabel::Stern);
        assert_eq!(MoodLabel::derive(-0.1, 0.7), MoodLabel::Restless);
    }

    #[test]
    fn test_baseline_endpoints() {
        let (v0, a0) = Mood::baseline_for(0.0);
        assert!((v0 - 0.15).abs() < 1e-9);
        assert!((a0 - 0.25).abs() < 1e-9);
        let (v1, a1) = Mood::baseline_for(1.0);
        assert!((v1 + 0.5).abs() < 1e-9);
        assert!((a1 - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_default_mood_is_neutral() {
        let mood = Mood::default();
        assert_eq!(mood.primary, MoodLabel::Neutral);
        assert!((mood.valence - 0.15).abs() < 1e-9);
    }

    #[test]
    fn test_impulse_scaling() {
        let mut mood = Mood::default();
        mood.apply_impulse(-0.1, 0.1, 1.0);
        assert!((mood.transient_valence + 0.15).abs() < 1e-9);
        assert!((mood.transient_arousal - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_transient_decay() {
        let mut mood = Mood::default();
        mood.transient_valence = 0.5;
        mood.decay_transient(0.9);
        assert!((mood.transient_valence - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_boredom_target_saturates() {
        let mut boredom = Boredom::default();
        boredom.turns_since_last_interesting_event = 500;
        assert_eq!(boredom.target(), 1.0);
        boredom.repair();
        assert_eq!(boredom.turns_since_last_interesting_event, 200);
    }

    #[test]
    fn test_mark_interesting_resets_timer() {
        let mut boredom = Boredom::default();
        boredom.turns_since_last_interesting_event = 80;
        boredom.mark_interesting("combat.kill", 12);
        assert_eq!(boredom.turns_since_last_interesting_event, 0);
        assert_eq!(boredom.last_interesting_turn, Some(12));
        assert_eq!(boredom.last_interesting_event.unwrap().kind, "combat.kill");
    }

    #[test]
    fn test_repair_clamps_and_relabels() {
        let mut mood = Mood::default();
        mood.valence = f64::NAN;
        mood.arousal = 4.0;
        mood.primary = MoodLabel::Calm;
        mood.repair();
        assert_eq!(mood.valence, 0.0);
        assert_eq!(mood.arousal, 1.0);
        assert_eq!(mood.primary, MoodLabel::Restless);
    }
}
