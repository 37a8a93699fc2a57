//! In-memory report.

use std::sync::{Mutex, MutexGuard};

use epubcheck_types::{Message, MessageId, MessageLocation};
use tracing::debug;

use crate::{Counters, Feature, Report, owned_args};

/// Keeps every message in memory, in emission order.
///
/// Used directly by tests and embedders, and as the storage behind
/// [`crate::XmlReport`].
#[derive(Debug, Default)]
pub struct CollectingReport {
    messages: Mutex<Vec<Message>>,
    infos: Mutex<Vec<(Option<String>, Feature, String)>>,
    counters: Counters,
}

impl CollectingReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of all messages received so far.
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.messages).clone()
    }

    /// Number of messages with the given id.
    pub fn count(&self, id: MessageId) -> usize {
        lock(&self.messages).iter().filter(|m| m.id == id).count()
    }

    /// Messages with the given id, in emission order.
    pub fn messages_with_id(&self, id: MessageId) -> Vec<Message> {
        lock(&self.messages)
            .iter()
            .filter(|m| m.id == id)
            .cloned()
            .collect()
    }

    /// A copy of the publication facts received so far.
    pub fn infos(&self) -> Vec<(Option<String>, Feature, String)> {
        lock(&self.infos).clone()
    }

    pub fn hint_count(&self) -> usize {
        self.counters.hints()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.messages).is_empty()
    }
}

impl Report for CollectingReport {
    fn message(&self, id: MessageId, location: MessageLocation, args: &[&str]) {
        let message = Message::new(id, location, owned_args(args));
        debug!(code = %id, location = %message.location, "message recorded");
        // Count under the list lock so counters and list never disagree.
        let mut messages = lock(&self.messages);
        self.counters.record(message.severity);
        messages.push(message);
    }

    fn info(&self, path: Option<&str>, feature: Feature, value: &str) {
        lock(&self.infos).push((path.map(str::to_string), feature, value.to_string()));
    }

    fn fatal_error_count(&self) -> usize {
        self.counters.fatal()
    }

    fn error_count(&self) -> usize {
        self.counters.errors()
    }

    fn warning_count(&self) -> usize {
        self.counters.warnings()
    }
}

/// Locks a mutex, recovering the data if a panicking thread poisoned it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
