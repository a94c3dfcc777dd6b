//! Channel subscription table
//!
//! The table is owned by the event client and outlives individual
//! connections; reconnecting replays its channel set instead of asking
//! subscribers to register again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use super::message::EventMessage;

/// Callback invoked for every message on a subscribed channel
pub type EventHandler = Arc<dyn Fn(&EventMessage) + Send + Sync>;

struct SubscriptionEntry {
    id: u64,
    channel: String,
    handler: EventHandler,
}

/// Ordered set of channel subscriptions
#[derive(Default)]
pub(crate) struct SubscriptionTable {
    entries: Vec<SubscriptionEntry>,
    next_id: u64,
}

impl SubscriptionTable {
    pub(crate) fn insert(&mut self, channel: String, handler: EventHandler) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(SubscriptionEntry {
            id,
            channel,
            handler,
        });
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Handlers for `channel` in subscription order
    pub(crate) fn handlers_for(&self, channel: &str) -> Vec<EventHandler> {
        self.entries
            .iter()
            .filter(|entry| entry.channel == channel)
            .map(|entry| Arc::clone(&entry.handler))
            .collect()
    }

    pub(crate) fn has_channel(&self, channel: &str) -> bool {
        self.entries.iter().any(|entry| entry.channel == channel)
    }

    /// Distinct channels in order of first subscription
    pub(crate) fn channels(&self) -> Vec<String> {
        let mut channels: Vec<String> = Vec::new();
        for entry in &self.entries {
            if !channels.contains(&entry.channel) {
                channels.push(entry.channel.clone());
            }
        }
        channels
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Handle to a live subscription
///
/// Dropping the handle unsubscribes. `unsubscribe` may be called any number
/// of times.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    channel: String,
    table: Weak<Mutex<SubscriptionTable>>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: u64, channel: String, table: &Arc<Mutex<SubscriptionTable>>) -> Self {
        Self {
            id,
            channel,
            table: Arc::downgrade(table),
            active: AtomicBool::new(true),
        }
    }

    /// Channel this subscription listens on
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the handler is still registered
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Remove the handler from the client
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(table) = self.table.upgrade() {
            let mut table = match table.lock() {
                Ok(table) => table,
                Err(poisoned) => poisoned.into_inner(),
            };
            table.remove(self.id);
            tracing::debug!(channel = %self.channel, "Unsubscribed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .field("active", &self.is_active())
            .finish()
    }
}
