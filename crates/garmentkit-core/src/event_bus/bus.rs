//! Session-scoped event bus.
//!
//! Every published event gets a sequence number. Hosts either register a
//! synchronous handler, poll a `broadcast` receiver, or keep the sequence
//! number of the last event they saw and read the journal from there.

use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::events::{DesignerEvent, EventCategory};

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "sub-{}", &simple[..8])
    }
}

/// Which events a handler wants.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum EventFilter {
    #[default]
    All,
    Categories(Vec<EventCategory>),
    /// Events about one garment type. Events that name no garment
    /// (superseded rebuilds, exports) do not match.
    Garment(String),
}

impl EventFilter {
    /// Whether a handler registered with this filter receives `event`.
    pub fn matches(&self, event: &DesignerEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::Categories(categories) => categories.contains(&event.category()),
            EventFilter::Garment(garment) => event.garment() == Some(garment.as_str()),
        }
    }
}

type EventHandler = Arc<dyn Fn(&DesignerEvent) + Send + Sync>;

/// Sizing of the channel and journal.
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Capacity of the `broadcast` channel behind [`EventBus::receiver`].
    pub channel_capacity: usize,
    /// Number of journal entries kept for [`EventBus::journal_since`].
    /// Zero turns the journal off.
    pub journal_limit: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
            journal_limit: 0,
        }
    }
}

/// A published event and its sequence number.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub seq: u64,
    pub event: DesignerEvent,
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: EventHandler,
}

/// Fan-out of [`DesignerEvent`]s to handlers, receivers and the journal.
pub struct EventBus {
    sender: broadcast::Sender<DesignerEvent>,
    subscriptions: RwLock<Vec<Subscription>>,
    journal: Mutex<Journal>,
    config: EventBusConfig,
}

#[derive(Default)]
struct Journal {
    next_seq: u64,
    entries: VecDeque<JournalEntry>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Bus with a custom channel capacity and journal size.
    pub fn with_config(config: EventBusConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            subscriptions: RwLock::new(Vec::new()),
            journal: Mutex::new(Journal::default()),
            config,
        }
    }

    /// Deliver `event` to handlers, receivers and the journal.
    ///
    /// Returns the sequence number assigned to the event. Sequence numbers
    /// start at 1 and count every publish, journaled or not.
    pub fn publish(&self, event: DesignerEvent) -> u64 {
        let seq = {
            let mut journal = self.journal.lock();
            journal.next_seq += 1;
            let seq = journal.next_seq;
            if self.config.journal_limit > 0 {
                journal.entries.push_back(JournalEntry {
                    seq,
                    event: event.clone(),
                });
                while journal.entries.len() > self.config.journal_limit {
                    journal.entries.pop_front();
                }
            }
            seq
        };
        tracing::trace!("event {}: {}", seq, event.description());

        // Handlers run unlocked so they may subscribe or unsubscribe.
        let handlers: Vec<EventHandler> = self
            .subscriptions
            .read()
            .iter()
            .filter(|s| s.filter.matches(&event))
            .map(|s| s.handler.clone())
            .collect();
        for handler in handlers {
            handler(&event);
        }

        // No receivers is the normal headless case.
        let _ = self.sender.send(event);
        seq
    }

    /// Register a handler. It runs on the publishing thread, inside
    /// [`EventBus::publish`]. Handlers matching an event when it is published
    /// all see it, even if one of them unsubscribes another.
    pub fn subscribe<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&DesignerEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(Uuid::new_v4());
        self.subscriptions.write().push(Subscription {
            id,
            filter,
            handler: Arc::new(handler),
        });
        tracing::debug!("Subscription {} added", id);
        id
    }

    /// Drop a handler. Returns `false` for an id that is not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.write();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        let removed = subscriptions.len() != before;
        if removed {
            tracing::debug!("Subscription {} removed", id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Receiver for events published from now on.
    pub fn receiver(&self) -> broadcast::Receiver<DesignerEvent> {
        self.sender.subscribe()
    }

    /// Journaled events with a sequence number greater than `seq`.
    pub fn journal_since(&self, seq: u64) -> Vec<JournalEntry> {
        self.journal
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.seq > seq)
            .cloned()
            .collect()
    }

    /// Sequence number of the most recent event, 0 before the first one.
    pub fn last_seq(&self) -> u64 {
        self.journal.lock().next_seq
    }

    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("last_seq", &self.last_seq())
            .field("config", &self.config)
            .finish()
    }
}
