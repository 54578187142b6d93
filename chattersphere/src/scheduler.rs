//! Named one-shot timers on top of `tokio::time`.
//!
//! Every timer lives under a [`TimerKey`]. Scheduling under a key that is
//! already armed replaces the earlier timer, so at most one timer per key is
//! ever pending. A callback fires at most once and never after its timer was
//! cancelled or replaced: each arming carries a generation number, and the
//! timer task re-checks it under the table lock before running the callback.
//!
//! Timers are spawned tasks, so [`Scheduler::schedule`] must be called from
//! within a Tokio runtime. Tests drive them with a paused clock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::AbortHandle;

use chattersphere_proto::message::MessageId;

/// Purpose of a pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKey {
    /// Delivery confirmation for a user message.
    Delivery(MessageId),
    /// Simulated reply triggered by a user message.
    Reply(MessageId),
    /// Typing indicator idle timeout.
    TypingIdle,
}

impl TimerKey {
    /// The message this timer is bound to, if any.
    #[must_use]
    pub const fn message_id(&self) -> Option<MessageId> {
        match self {
            Self::Delivery(id) | Self::Reply(id) => Some(*id),
            Self::TypingIdle => None,
        }
    }
}

impl std::fmt::Display for TimerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivery(id) => write!(f, "delivery:{id}"),
            Self::Reply(id) => write!(f, "reply:{id}"),
            Self::TypingIdle => write!(f, "typingIdle"),
        }
    }
}

struct ArmedTimer {
    generation: u64,
    handle: AbortHandle,
}

#[derive(Default)]
struct TimerTable {
    next_generation: u64,
    armed: HashMap<TimerKey, ArmedTimer>,
}

impl TimerTable {
    /// Disarms `key` if it still holds `generation`. Returns whether it did.
    fn claim(&mut self, key: &TimerKey, generation: u64) -> bool {
        match self.armed.get(key) {
            Some(timer) if timer.generation == generation => {
                self.armed.remove(key);
                true
            }
            _ => false,
        }
    }
}

/// Registry of named one-shot timers.
///
/// Dropping the scheduler cancels everything still pending.
#[derive(Default)]
pub struct Scheduler {
    table: Arc<Mutex<TimerTable>>,
}

impl Scheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot timer under `key`, replacing any timer already there.
    ///
    /// `callback` runs once, no earlier than `delay` from now, unless the
    /// timer is cancelled or replaced first.
    pub fn schedule<F>(&self, key: TimerKey, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let deadline = tokio::time::Instant::now() + delay;
        let mut table = self.table.lock();
        let generation = table.next_generation;
        table.next_generation += 1;

        let registry = Arc::clone(&self.table);
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let claimed = registry.lock().claim(&key, generation);
            if claimed {
                tracing::debug!(timer = %key, "timer fired");
                callback();
            }
        });

        let replaced = table.armed.insert(
            key,
            ArmedTimer {
                generation,
                handle: task.abort_handle(),
            },
        );
        drop(table);

        if let Some(previous) = replaced {
            previous.handle.abort();
            tracing::debug!(timer = %key, delay_ms = delay.as_millis(), "timer rescheduled");
        } else {
            tracing::debug!(timer = %key, delay_ms = delay.as_millis(), "timer armed");
        }
    }

    /// Cancels the timer under `key`. Returns `true` if one was pending.
    pub fn cancel(&self, key: &TimerKey) -> bool {
        let Some(timer) = self.table.lock().armed.remove(key) else {
            return false;
        };
        timer.handle.abort();
        tracing::debug!(timer = %key, "timer cancelled");
        true
    }

    /// Cancels every pending timer. Returns how many were pending.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<(TimerKey, ArmedTimer)> = self.table.lock().armed.drain().collect();
        for (_, timer) in &drained {
            timer.handle.abort();
        }
        if !drained.is_empty() {
            tracing::debug!(count = drained.len(), "all timers cancelled");
        }
        drained.len()
    }

    /// Whether a timer is pending under `key`.
    #[must_use]
    pub fn is_pending(&self, key: &TimerKey) -> bool {
        self.table.lock().armed.contains_key(key)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.table.lock().armed.len()
    }

    /// Keys of all pending timers, in no particular order.
    #[must_use]
    pub fn pending_keys(&self) -> Vec<TimerKey> {
        self.table.lock().armed.keys().copied().collect()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
