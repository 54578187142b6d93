//! Chat session engine for `ChatterSphere`.
//!
//! Contains the [`ChatSession`] which owns the message log, the typing
//! indicator and the reply simulator, and drives all of them through named
//! timers on a [`Scheduler`].
//!
//! # Message lifecycle
//!
//! 1. The local participant sends text; it is validated at the boundary
//! 2. The log appends it as `Sending` and emits [`ChatEvent::MessageAppended`]
//! 3. A `delivery:<id>` timer later moves it to `Delivered`
//! 4. The reply simulator may arm a `reply:<id>` timer that appends a
//!    simulated answer, already `Delivered`
//!
//! All state sits behind one mutex. Timer callbacks take that lock and run
//! to completion, so no two mutations interleave.

pub mod export;
pub mod reply;
pub mod search;
mod send;
pub mod store;
pub mod typing;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;

use chattersphere_proto::export::SessionId;
use chattersphere_proto::message::{
    MAX_MESSAGE_CHARS, Message, MessageDraft, MessageId, MessageStatus,
};
use chattersphere_proto::presence::{Participant, PresenceStatus};
use chattersphere_proto::reaction::Reactions;

use crate::clock::{Clock, SystemClock};
use crate::scheduler::{Scheduler, TimerKey};

use reply::{PolicyError, ReplyPolicy, ReplySimulator};
use store::MessageLog;
use typing::{TYPING_IDLE_WINDOW, TypingIndicator, TypingState};

pub use send::{AttachError, SendError};

/// Delay between sending a message and its delivery confirmation.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_millis(500);

/// Default largest attachment accepted, in bytes (10 MiB).
pub const DEFAULT_MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Tunables for a [`ChatSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Delay before a sent message is marked delivered.
    pub delivery_delay: Duration,
    /// Keystroke inactivity after which the typing indicator clears.
    pub typing_idle: Duration,
    /// Maximum characters in a user message. Values above
    /// [`MAX_MESSAGE_CHARS`] are treated as [`MAX_MESSAGE_CHARS`].
    pub max_message_chars: usize,
    /// Maximum attachment size in bytes.
    pub max_attachment_bytes: usize,
    /// Capacity of the event channel.
    pub event_buffer: usize,
    /// Whether notification events are emitted.
    pub sound_enabled: bool,
    /// Seed for the reply simulator; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Reply simulator policy.
    pub replies: ReplyPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delivery_delay: DEFAULT_DELIVERY_DELAY,
            typing_idle: TYPING_IDLE_WINDOW,
            max_message_chars: MAX_MESSAGE_CHARS,
            max_attachment_bytes: DEFAULT_MAX_ATTACHMENT_BYTES,
            event_buffer: 64,
            sound_enabled: true,
            seed: None,
            replies: ReplyPolicy::default(),
        }
    }
}

/// Errors from building a [`ChatSession`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The reply policy can not produce replies.
    #[error("invalid reply policy: {0}")]
    Policy(#[from] PolicyError),
}

/// Events emitted by the [`ChatSession`] for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// A message was appended to the log.
    MessageAppended(Message),
    /// A message's delivery status changed.
    StatusChanged {
        /// The message whose status changed.
        message_id: MessageId,
        /// The new status.
        status: MessageStatus,
    },
    /// A message's reactions changed.
    ReactionsChanged {
        /// The message reacted to.
        message_id: MessageId,
        /// Reactions after the change.
        reactions: Reactions,
    },
    /// The local typing indicator turned on or off.
    TypingChanged {
        /// Whether the participant is composing.
        is_active: bool,
    },
    /// Something worth a notification sound happened.
    Notification {
        /// The message that caused it.
        message_id: MessageId,
    },
    /// The log was replaced by a fresh welcome message.
    SessionReset {
        /// The new welcome message.
        welcome: Message,
    },
}

struct SessionState {
    log: MessageLog,
    typing: TypingIndicator,
    simulator: ReplySimulator<StdRng>,
    participant: Participant,
    user_message_count: u64,
    /// Bumped on every reset; reply callbacks armed in an older epoch are dropped.
    epoch: u64,
}

/// State shared between the session handle and its timer callbacks.
struct Shared {
    state: Mutex<SessionState>,
    events: mpsc::Sender<ChatEvent>,
    clock: Arc<dyn Clock>,
    sound_enabled: AtomicBool,
}

impl Shared {
    fn emit(&self, event: ChatEvent) {
        if let Err(e) = self.events.try_send(event) {
            tracing::trace!(error = %e, "chat event dropped");
        }
    }

    fn notify(&self, message_id: MessageId) {
        if self.sound_enabled.load(Ordering::Relaxed) {
            self.emit(ChatEvent::Notification { message_id });
        }
    }

    fn deliver(&self, id: MessageId) -> bool {
        let changed = self.state.lock().log.mark_delivered(id);
        if changed {
            tracing::debug!(message_id = %id, "message delivered");
            self.emit(ChatEvent::StatusChanged {
                message_id: id,
                status: MessageStatus::Delivered,
            });
            self.notify(id);
        }
        changed
    }

    fn append_reply(&self, epoch: u64, draft: MessageDraft) {
        let message = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                tracing::debug!("dropping simulated reply from before reset");
                return;
            }
            let now = self.clock.now();
            state.log.append(draft, now)
        };
        tracing::info!(message_id = %message.id, sender = %message.sender, "simulated reply appended");
        let id = message.id;
        self.emit(ChatEvent::MessageAppended(message));
        self.notify(id);
    }

    fn typing_idle(&self) {
        if self.state.lock().typing.stop() {
            self.emit(ChatEvent::TypingChanged { is_active: false });
        }
    }
}

/// A single-participant chat room with simulated counterparts.
///
/// Must be created and used inside a Tokio runtime: delivery, reply and
/// typing timers are spawned tasks. Dropping the session cancels them.
pub struct ChatSession {
    id: SessionId,
    shared: Arc<Shared>,
    scheduler: Scheduler,
    config: SessionConfig,
}

impl ChatSession {
    /// Creates a session on the system clock.
    ///
    /// The reply simulator is seeded from `config.seed` when set, otherwise
    /// from the operating system.
    ///
    /// Returns the session and a receiver for [`ChatEvent`]s that the
    /// presentation layer should consume.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Policy`] if the reply policy is invalid for
    /// this participant.
    pub fn new(
        participant: Participant,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<ChatEvent>), SessionError> {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self::with_sources(participant, config, Arc::new(SystemClock), rng)
    }

    /// Creates a session with an explicit clock and random source.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Policy`] if the reply policy is invalid for
    /// this participant.
    pub fn with_sources(
        participant: Participant,
        config: SessionConfig,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Result<(Self, mpsc::Receiver<ChatEvent>), SessionError> {
        config.replies.validate_for(participant.name())?;
        let (events, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let id = SessionId::new();
        tracing::info!(session = %id, participant = participant.name(), "chat session started");

        let state = SessionState {
            log: MessageLog::new(clock.now()),
            typing: TypingIndicator::new(),
            simulator: ReplySimulator::new(config.replies.clone(), rng),
            participant,
            user_message_count: 0,
            epoch: 0,
        };
        let shared = Arc::new(Shared {
            state: Mutex::new(state),
            events,
            clock,
            sound_enabled: AtomicBool::new(config.sound_enabled),
        });
        let session = Self {
            id,
            shared,
            scheduler: Scheduler::new(),
            config,
        };
        Ok((session, event_rx))
    }

    /// Identifier of this session.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The local participant.
    #[must_use]
    pub fn participant(&self) -> Participant {
        self.shared.state.lock().participant.clone()
    }

    /// Snapshot of the log in append order.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.shared.state.lock().log.messages().to_vec()
    }

    /// Looks up one message.
    #[must_use]
    pub fn message(&self, id: MessageId) -> Option<Message> {
        self.shared.state.lock().log.get(id).cloned()
    }

    /// Messages whose text or sender contains `query`, ignoring case.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<Message> {
        self.shared
            .state
            .lock()
            .log
            .filter(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Runs `f` against the log without copying it.
    ///
    /// The session is locked while `f` runs; do not call back into the
    /// session from inside it.
    pub fn with_log<T>(&self, f: impl FnOnce(&MessageLog) -> T) -> T {
        f(&self.shared.state.lock().log)
    }

    /// Marks a message delivered. Unknown or already delivered ids are a no-op.
    ///
    /// Normally invoked by the delivery timer.
    pub fn mark_delivered(&self, id: MessageId) -> bool {
        let changed = self.shared.deliver(id);
        if changed {
            self.scheduler.cancel(&TimerKey::Delivery(id));
        }
        changed
    }

    /// Toggles `actor`'s `emoji` reaction on message `id`.
    ///
    /// Returns `false` if the message does not exist.
    pub fn toggle_reaction(&self, id: MessageId, emoji: &str, actor: &str) -> bool {
        let reactions = self
            .shared
            .state
            .lock()
            .log
            .toggle_reaction(id, emoji, actor)
            .cloned();
        let Some(reactions) = reactions else {
            tracing::debug!(message_id = %id, "reaction target not found");
            return false;
        };
        tracing::debug!(message_id = %id, emoji, actor, "reaction toggled");
        self.shared.emit(ChatEvent::ReactionsChanged {
            message_id: id,
            reactions,
        });
        true
    }

    /// Toggles the local participant's `emoji` reaction on message `id`.
    pub fn react(&self, id: MessageId, emoji: &str) -> bool {
        let actor = self.shared.state.lock().participant.name().to_string();
        self.toggle_reaction(id, emoji, &actor)
    }

    /// Records a keystroke in the composer.
    ///
    /// Turns the typing indicator on and re-arms the idle timer, replacing
    /// any earlier one.
    pub fn keystroke(&self) {
        let became_active = {
            let mut state = self.shared.state.lock();
            let now = self.shared.clock.now();
            state.typing.keystroke(now)
        };
        if became_active {
            self.shared.emit(ChatEvent::TypingChanged { is_active: true });
        }
        let shared = Arc::clone(&self.shared);
        self.scheduler
            .schedule(TimerKey::TypingIdle, self.config.typing_idle, move || {
                shared.typing_idle();
            });
    }

    /// Whether the local participant is typing.
    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.shared.state.lock().typing.is_active()
    }

    /// Full typing indicator state.
    #[must_use]
    pub fn typing_state(&self) -> TypingState {
        self.shared.state.lock().typing.state()
    }

    /// Clears the log back to a single welcome message.
    ///
    /// Every pending timer is cancelled and the typing indicator is cleared.
    /// Returns the new welcome message.
    pub fn reset(&self) -> Message {
        let cancelled = self.scheduler.cancel_all();
        let (welcome, was_typing) = {
            let mut state = self.shared.state.lock();
            state.epoch += 1;
            state.user_message_count = 0;
            let now = self.shared.clock.now();
            (state.log.reset(now), state.typing.stop())
        };
        tracing::info!(session = %self.id, cancelled_timers = cancelled, "session reset");
        if was_typing {
            self.shared.emit(ChatEvent::TypingChanged { is_active: false });
        }
        self.shared.emit(ChatEvent::SessionReset {
            welcome: welcome.clone(),
        });
        welcome
    }

    /// Resets the session and continues as `participant`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Policy`] if a simulated participant shares the
    /// new name; the session is left untouched in that case.
    pub fn switch_participant(&self, participant: Participant) -> Result<Message, SessionError> {
        self.config.replies.validate_for(participant.name())?;
        let welcome = self.reset();
        tracing::info!(participant = participant.name(), "participant switched");
        self.shared.state.lock().participant = participant;
        Ok(welcome)
    }

    /// Updates the local participant's presence status.
    pub fn set_status(&self, status: PresenceStatus) {
        self.shared.state.lock().participant.set_status(status);
        tracing::debug!(%status, "presence status changed");
    }

    /// Names shown in the member list: the local participant first, then
    /// the simulated participants.
    #[must_use]
    pub fn roster(&self) -> Vec<String> {
        let local = self.shared.state.lock().participant.name().to_string();
        std::iter::once(local)
            .chain(self.config.replies.participants.iter().cloned())
            .collect()
    }

    /// Turns notification events on or off.
    pub fn set_sound_enabled(&self, enabled: bool) {
        self.shared.sound_enabled.store(enabled, Ordering::Relaxed);
    }

    /// User messages sent since the session started or was last reset.
    #[must_use]
    pub fn user_message_count(&self) -> u64 {
        self.shared.state.lock().user_message_count
    }

    /// Number of timers still pending.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Whether a timer is pending under `key`.
    #[must_use]
    pub fn is_timer_pending(&self, key: &TimerKey) -> bool {
        self.scheduler.is_pending(key)
    }
}
