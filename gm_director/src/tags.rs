//! Event tags - `prefix:value` labels gameplay attaches to telemetry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A parsed telemetry tag. Parsing lower-cases everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    /// Creature kind (e.g. `kind:troll`).
    Kind(String),

    /// Creature race (e.g. `race:troll`).
    Race(String),

    /// Creature family tracked for kill counts (e.g. `family:wolf`).
    Family(String),

    /// A faction (e.g. `faction:bandit`).
    Faction(String),

    /// Where it happened (e.g. `context:town`).
    Context(String),

    /// Anything else, kept whole.
    Custom(String),
}

impl Tag {
    /// Parse a raw tag string.
    pub fn parse(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_ascii_lowercase();
        if lowered.is_empty() {
            return None;
        }
        let Some((prefix, value)) = lowered.split_once(':') else {
            return Some(Tag::Custom(lowered));
        };
        let value = value.trim().to_string();
        if value.is_empty() {
            return Some(Tag::Custom(lowered));
        }
        Some(match prefix.trim() {
            "kind" => Tag::Kind(value),
            "race" => Tag::Race(value),
            "family" => Tag::Family(value),
            "faction" => Tag::Faction(value),
            "context" => Tag::Context(value),
            _ => Tag::Custom(lowered),
        })
    }

    /// Convert the tag back to its string form.
    pub fn as_string(&self) -> String {
        match self {
            Tag::Kind(s) => format!("kind:{}", s),
            Tag::Race(s) => format!("race:{}", s),
            Tag::Family(s) => format!("family:{}", s),
            Tag::Faction(s) => format!("faction:{}", s),
            Tag::Context(s) => format!("context:{}", s),
            Tag::Custom(s) => s.clone(),
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Tag::Kind(_) => "kind",
            Tag::Race(_) => "race",
            Tag::Family(_) => "family",
            Tag::Faction(_) => "faction",
            Tag::Context(_) => "context",
            Tag::Custom(_) => "custom",
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

/// The de-duplicated, ordered tag set of one event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagSet(BTreeSet<Tag>);

impl TagSet {
    /// Parse raw tags, dropping malformed ones.
    pub fn from_raw<I, T>(raw: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        Self(raw.into_iter().filter_map(|t| Tag::parse(t.as_ref())).collect())
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.0.contains(tag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_faction(&self, name: &str) -> bool {
        self.0.contains(&Tag::Faction(name.to_string()))
    }

    pub fn has_context(&self, name: &str) -> bool {
        self.0.contains(&Tag::Context(name.to_string()))
    }

    /// Whether the subject is a troll by kind, race or family.
    pub fn is_troll(&self) -> bool {
        let troll = "troll".to_string();
        self.0.contains(&Tag::Kind(troll.clone()))
            || self.0.contains(&Tag::Race(troll.clone()))
            || self.0.contains(&Tag::Family(troll))
    }

    pub fn factions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|t| match t {
            Tag::Faction(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Families named by explicit `family:` tags.
    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|t| match t {
            Tag::Family(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Creature families named by family, kind or race tags, each once.
    pub fn creature_families(&self) -> BTreeSet<&str> {
        self.0
            .iter()
            .filter_map(|t| match t {
                Tag::Family(s) | Tag::Kind(s) | Tag::Race(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.0.iter()
    }
}
