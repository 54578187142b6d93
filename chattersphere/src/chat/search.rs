//! Case-insensitive search over the message log.
//!
//! [`filter_messages`] is the pure projection. [`SearchView`] wraps it for a
//! live query box and recomputes only when the query or the log version
//! changes.

use chattersphere_proto::message::Message;

use super::store::MessageLog;

/// Messages whose text or sender contains `query`, ignoring case.
///
/// An empty query matches everything. Order is preserved.
#[must_use]
pub fn filter_messages<'a>(messages: &'a [Message], query: &str) -> Vec<&'a Message> {
    if query.is_empty() {
        return messages.iter().collect();
    }
    let needle = query.to_lowercase();
    messages
        .iter()
        .filter(|m| matches_folded(m, &needle))
        .collect()
}

fn matches_folded(message: &Message, needle: &str) -> bool {
    message.text.to_lowercase().contains(needle) || message.sender.to_lowercase().contains(needle)
}

#[derive(Debug, Clone)]
struct CachedResult {
    query: String,
    version: u64,
    positions: Vec<usize>,
}

/// Memoized search results keyed on `(query, log version)`.
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    query: String,
    cached: Option<CachedResult>,
}

impl SearchView {
    /// Creates a view with an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current query.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Replaces the query.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Messages of `log` matching the current query.
    pub fn results<'a>(&mut self, log: &'a MessageLog) -> Vec<&'a Message> {
        let fresh = self
            .cached
            .as_ref()
            .is_some_and(|c| c.version == log.version() && c.query == self.query);
        if !fresh {
            let needle = self.query.to_lowercase();
            let positions = log
                .messages()
                .iter()
                .enumerate()
                .filter(|(_, m)| needle.is_empty() || matches_folded(m, &needle))
                .map(|(index, _)| index)
                .collect();
            self.cached = Some(CachedResult {
                query: self.query.clone(),
                version: log.version(),
                positions,
            });
        }
        let messages = log.messages();
        self.cached
            .as_ref()
            .map(|c| c.positions.iter().filter_map(|&i| messages.get(i)).collect())
            .unwrap_or_default()
    }

    /// Whether the next [`results`](Self::results) call would hit the cache.
    #[must_use]
    pub fn is_fresh(&self, log: &MessageLog) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|c| c.version == log.version() && c.query == self.query)
    }
}
