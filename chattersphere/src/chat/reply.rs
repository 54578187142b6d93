//! Simulated counterpart replies.
//!
//! For each message authored by the real participant the simulator rolls
//! once against [`ReplyPolicy::probability`]. On success it picks a delay in
//! `[min_delay, max_delay)`, a simulated sender, a canned phrase and an
//! avatar, all uniformly. Replies are never planned for simulated or system
//! messages, so a reply can not trigger another reply.
//!
//! The random source is injected so tests can seed it.

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;

use chattersphere_proto::message::{Message, MessageDraft};
use chattersphere_proto::presence::AVATARS;

/// Default chance that a user message gets a reply.
pub const DEFAULT_REPLY_PROBABILITY: f64 = 0.8;

/// Default lower bound of the reply delay (inclusive).
pub const DEFAULT_MIN_REPLY_DELAY: Duration = Duration::from_millis(800);

/// Default upper bound of the reply delay (exclusive).
pub const DEFAULT_MAX_REPLY_DELAY: Duration = Duration::from_millis(2_300);

/// Default simulated participants.
pub const DEFAULT_PARTICIPANTS: [&str; 3] = ["Alice", "Bob", "Charlie"];

/// Default canned replies.
pub const DEFAULT_PHRASES: [&str; 20] = [
    "That's electrifying! \u{26a1}",
    "Love the energy here! \u{1f31f}",
    "ChatterSphere vibes! \u{2728}",
    "This conversation is sparking! \u{1f525}",
    "Amazing connection! \u{1f4ab}",
    "The sphere is buzzing! \u{1f386}",
    "Brilliant thoughts! \u{1f4a1}",
    "Conversation goals! \u{1f3af}",
    "Great point! \u{1f44d}",
    "I totally agree! \u{2728}",
    "Interesting perspective! \u{1f914}",
    "Thanks for sharing! \u{1f64f}",
    "That made me smile! \u{1f60a}",
    "Absolutely right! \u{1f4af}",
    "Nice one! \u{1f680}",
    "Keep it going! \u{1f4ac}",
    "So cool! \u{1f60e}",
    "Mind blown! \u{1f92f}",
    "Love this chat! \u{2764}\u{fe0f}",
    "You're on fire! \u{1f525}",
];

/// Errors from validating a [`ReplyPolicy`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// Probability outside `[0, 1]` or not a number.
    #[error("reply probability must be within 0..=1 (got {0})")]
    Probability(f64),
    /// `min_delay` is not below `max_delay`.
    #[error("reply delay range is empty ({min_ms}ms..{max_ms}ms)")]
    EmptyDelayRange {
        /// Lower bound in milliseconds.
        min_ms: u128,
        /// Upper bound in milliseconds.
        max_ms: u128,
    },
    /// No simulated participants to reply as.
    #[error("reply policy needs at least one simulated participant")]
    NoParticipants,
    /// No phrases to reply with.
    #[error("reply policy needs at least one phrase")]
    NoPhrases,
    /// A simulated participant shares the real participant's name.
    #[error("simulated participant '{0}' collides with the local participant")]
    ParticipantCollision(String),
}

/// Tunables for the reply simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplyPolicy {
    /// Chance in `[0, 1]` that a user message gets a reply.
    pub probability: f64,
    /// Inclusive lower bound of the reply delay.
    pub min_delay: Duration,
    /// Exclusive upper bound of the reply delay.
    pub max_delay: Duration,
    /// Names replies are sent as.
    pub participants: Vec<String>,
    /// Reply texts.
    pub phrases: Vec<String>,
    /// Avatars attached to replies. May be empty.
    pub avatars: Vec<String>,
}

impl Default for ReplyPolicy {
    fn default() -> Self {
        Self {
            probability: DEFAULT_REPLY_PROBABILITY,
            min_delay: DEFAULT_MIN_REPLY_DELAY,
            max_delay: DEFAULT_MAX_REPLY_DELAY,
            participants: DEFAULT_PARTICIPANTS.map(str::to_string).to_vec(),
            phrases: DEFAULT_PHRASES.map(str::to_string).to_vec(),
            avatars: AVATARS.map(str::to_string).to_vec(),
        }
    }
}

impl ReplyPolicy {
    /// Checks the policy can actually produce replies.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] found.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(PolicyError::Probability(self.probability));
        }
        if self.min_delay >= self.max_delay {
            return Err(PolicyError::EmptyDelayRange {
                min_ms: self.min_delay.as_millis(),
                max_ms: self.max_delay.as_millis(),
            });
        }
        if self.participants.is_empty() {
            return Err(PolicyError::NoParticipants);
        }
        if self.phrases.is_empty() {
            return Err(PolicyError::NoPhrases);
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), and also rejects a simulated
    /// participant named `local_name`.
    ///
    /// # Errors
    ///
    /// Returns the first [`PolicyError`] found.
    pub fn validate_for(&self, local_name: &str) -> Result<(), PolicyError> {
        self.validate()?;
        if let Some(name) = self.participants.iter().find(|p| p.as_str() == local_name) {
            return Err(PolicyError::ParticipantCollision(name.clone()));
        }
        Ok(())
    }
}

/// A reply the simulator decided to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedReply {
    /// How long after the trigger the reply should appear.
    pub delay: Duration,
    /// The reply itself.
    pub draft: MessageDraft,
}

/// Decides whether and how simulated participants answer.
#[derive(Debug, Clone)]
pub struct ReplySimulator<R> {
    policy: ReplyPolicy,
    rng: R,
}

impl<R: Rng> ReplySimulator<R> {
    /// Creates a simulator drawing from `rng`.
    pub const fn new(policy: ReplyPolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    /// The active policy.
    pub const fn policy(&self) -> &ReplyPolicy {
        &self.policy
    }

    /// Plans a reply to `trigger`, or `None` if nobody answers.
    ///
    /// Only user-authored messages can trigger a reply.
    pub fn plan(&mut self, trigger: &Message) -> Option<PlannedReply> {
        if !trigger.is_user() {
            return None;
        }

        let roll: f64 = self.rng.random();
        if roll >= self.policy.probability {
            tracing::trace!(message_id = %trigger.id, roll, "no simulated reply");
            return None;
        }

        let min_ms = u64::try_from(self.policy.min_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(self.policy.max_delay.as_millis()).unwrap_or(u64::MAX);
        let delay_ms = if max_ms > min_ms {
            self.rng.random_range(min_ms..max_ms)
        } else {
            min_ms
        };

        let sender = self.policy.participants.choose(&mut self.rng)?.clone();
        let text = self.policy.phrases.choose(&mut self.rng)?.clone();
        let mut draft = MessageDraft::simulated(sender, text);
        if let Some(avatar) = self.policy.avatars.choose(&mut self.rng) {
            draft = draft.with_avatar(avatar.clone());
        }

        tracing::debug!(
            message_id = %trigger.id,
            sender = %draft.sender,
            delay_ms,
            "simulated reply planned"
        );
        Some(PlannedReply {
            delay: Duration::from_millis(delay_ms),
            draft,
        })
    }
}
