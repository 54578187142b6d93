//! Emoji reactions attached to a message.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Quick-pick emoji offered next to each message.
pub const QUICK_REACTIONS: [&str; 12] = [
    "\u{1f600}",
    "\u{1f602}",
    "\u{1f60d}",
    "\u{1f914}",
    "\u{1f60e}",
    "\u{1f525}",
    "\u{1f44d}",
    "\u{2764}\u{fe0f}",
    "\u{26a1}",
    "\u{1f389}",
    "\u{1f4af}",
    "\u{1f31f}",
];

/// Errors from rebuilding [`Reactions`] out of a raw map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReactionsError {
    /// An emoji was listed with nobody reacting.
    #[error("emoji {0} has no reactors")]
    NoReactors(String),
}

/// Emoji -> set of reactor names.
///
/// An emoji key exists only while at least one reactor holds it, and a
/// reactor appears at most once per emoji. Deserializing rejects input that
/// breaks the first rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, BTreeSet<String>>")]
pub struct Reactions(BTreeMap<String, BTreeSet<String>>);

impl TryFrom<BTreeMap<String, BTreeSet<String>>> for Reactions {
    type Error = ReactionsError;

    fn try_from(map: BTreeMap<String, BTreeSet<String>>) -> Result<Self, Self::Error> {
        if let Some((emoji, _)) = map.iter().find(|(_, reactors)| reactors.is_empty()) {
            return Err(ReactionsError::NoReactors(emoji.clone()));
        }
        Ok(Self(map))
    }
}

impl Reactions {
    /// Adds `actor` to `emoji`, or removes them if already present.
    ///
    /// Returns `true` if the reaction was added, `false` if it was removed.
    pub fn toggle(&mut self, emoji: &str, actor: &str) -> bool {
        let reactors = self.0.entry(emoji.to_string()).or_default();
        if reactors.remove(actor) {
            if reactors.is_empty() {
                self.0.remove(emoji);
            }
            false
        } else {
            reactors.insert(actor.to_string());
            true
        }
    }

    /// Reactors for `emoji`, if anyone reacted with it.
    #[must_use]
    pub fn reactors(&self, emoji: &str) -> Option<&BTreeSet<String>> {
        self.0.get(emoji)
    }

    /// Whether `actor` reacted with `emoji`.
    #[must_use]
    pub fn contains(&self, emoji: &str, actor: &str) -> bool {
        self.0.get(emoji).is_some_and(|set| set.contains(actor))
    }

    /// Number of distinct emoji with at least one reactor.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no reactions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates `(emoji, reactors)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.0.iter().map(|(emoji, set)| (emoji.as_str(), set))
    }
}
