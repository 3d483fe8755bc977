mod types;

pub use types::*;

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::actions::ActionKey;
use crate::pipeline::{CancelFlag, MediaContent};

struct Entry {
    status: ActionStatus,
    content: Option<MediaContent>,
    token: u64,
    cancel: Option<CancelFlag>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            status: ActionStatus::Idle,
            content: None,
            token: 0,
            cancel: None,
        }
    }
}

/// Shared store of every action's state, plus the engine event bus.
///
/// All transitions for all keys happen under a single write lock, which is
/// what makes the at-most-one-active invariant hold even while pipeline
/// tasks resolve concurrently. Events are broadcast after the lock drops.
pub struct ActionStore {
    entries: RwLock<HashMap<ActionKey, Entry>>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl ActionStore {
    pub fn new() -> Arc<Self> {
        let (event_tx, _) = broadcast::channel(256);

        let entries = ActionKey::ALL
            .iter()
            .map(|key| (*key, Entry::default()))
            .collect();

        Arc::new(Self {
            entries: RwLock::new(entries),
            event_tx,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Get a clone of the event sender for use in other components.
    pub fn event_sender(&self) -> broadcast::Sender<EngineEvent> {
        self.event_tx.clone()
    }

    fn broadcast(&self, event: EngineEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::debug!("No subscribers for engine event");
        }
    }

    fn broadcast_all(&self, events: Vec<EngineEvent>) {
        for event in events {
            self.broadcast(event);
        }
    }

    /// Resolve a click on `key` into a state transition.
    ///
    /// Decided atomically under one lock: an active panel closes, a loading
    /// key swallows the click, or the key enters `Loading` with a fresh
    /// ticket while every other panel is deactivated.
    pub fn activate(&self, key: ActionKey) -> Activation {
        let mut events = Vec::new();
        let outcome = {
            let mut entries = self.entries.write();
            let status = entries
                .get(&key)
                .map(|e| e.status)
                .unwrap_or(ActionStatus::Idle);

            match status {
                ActionStatus::Active => {
                    tracing::debug!(%key, "Click on active action, closing panel");
                    if let Some(entry) = entries.get_mut(&key) {
                        if deactivate_entry(entry) {
                            events.push(EngineEvent::action_closed(key));
                        }
                    }
                    Activation::Closed
                }
                ActionStatus::Loading => {
                    tracing::debug!(%key, "Click ignored, action already loading");
                    Activation::InFlight
                }
                ActionStatus::Idle | ActionStatus::Failed => {
                    Activation::Started(begin_loading(&mut entries, key, &mut events))
                }
            }
        };
        self.broadcast_all(events);
        outcome
    }

    /// Mark `key` as loading and issue a run ticket, deactivating every
    /// other key first.
    pub fn set_loading(&self, key: ActionKey) -> RunTicket {
        let mut events = Vec::new();
        let ticket = {
            let mut entries = self.entries.write();
            begin_loading(&mut entries, key, &mut events)
        };
        self.broadcast_all(events);
        ticket
    }

    /// Return `key` to idle, cancelling any in-flight run.
    pub fn deactivate(&self, key: ActionKey) {
        let closed = {
            let mut entries = self.entries.write();
            entries.get_mut(&key).map(deactivate_entry).unwrap_or(false)
        };
        if closed {
            self.broadcast(EngineEvent::action_closed(key));
        }
    }

    /// Store a finished run's content, unless the ticket has gone stale.
    ///
    /// Returns whether the content landed. A stale ticket (the key was
    /// re-requested or deactivated since the run started) drops the result.
    pub fn set_result(&self, ticket: &RunTicket, content: MediaContent) -> bool {
        let stored = {
            let mut entries = self.entries.write();
            match entries.get_mut(&ticket.key) {
                Some(entry)
                    if entry.token == ticket.token
                        && entry.status == ActionStatus::Loading =>
                {
                    entry.status = ActionStatus::Active;
                    entry.content = Some(content.clone());
                    entry.cancel = None;
                    true
                }
                _ => false,
            }
        };

        if stored {
            tracing::info!(key = %ticket.key, run_id = %ticket.run_id, "Action content ready");
            self.broadcast(EngineEvent::action_ready(ticket.key, ticket.run_id, content));
        } else {
            tracing::debug!(key = %ticket.key, run_id = %ticket.run_id, "Dropping stale pipeline result");
            self.broadcast(EngineEvent::stale_result_dropped(ticket.key, ticket.run_id));
        }
        stored
    }

    /// Record a failed run, unless the ticket has gone stale.
    pub fn set_failed(&self, ticket: &RunTicket, reason: &str) -> bool {
        let stored = {
            let mut entries = self.entries.write();
            match entries.get_mut(&ticket.key) {
                Some(entry)
                    if entry.token == ticket.token
                        && entry.status == ActionStatus::Loading =>
                {
                    entry.status = ActionStatus::Failed;
                    entry.content = None;
                    entry.cancel = None;
                    true
                }
                _ => false,
            }
        };

        if stored {
            tracing::error!(key = %ticket.key, run_id = %ticket.run_id, reason, "Action run failed");
            self.broadcast(EngineEvent::action_failed(ticket.key, reason.to_string()));
        } else {
            tracing::debug!(key = %ticket.key, run_id = %ticket.run_id, "Dropping stale pipeline failure");
            self.broadcast(EngineEvent::stale_result_dropped(ticket.key, ticket.run_id));
        }
        stored
    }

    /// Snapshot one action.
    pub fn get(&self, key: ActionKey) -> ActionState {
        let entries = self.entries.read();
        match entries.get(&key) {
            Some(entry) => ActionState {
                key,
                status: entry.status,
                content: entry.content.clone(),
            },
            None => ActionState {
                key,
                status: ActionStatus::Idle,
                content: None,
            },
        }
    }

    /// The key whose panel is currently open, if any.
    pub fn active_key(&self) -> Option<ActionKey> {
        let entries = self.entries.read();
        entries
            .iter()
            .find(|(_, entry)| entry.status == ActionStatus::Active)
            .map(|(key, _)| *key)
    }

    /// Snapshot every action in registration order.
    pub fn snapshot(&self) -> Vec<ActionState> {
        let entries = self.entries.read();
        ActionKey::ALL
            .iter()
            .map(|key| match entries.get(key) {
                Some(entry) => ActionState {
                    key: *key,
                    status: entry.status,
                    content: entry.content.clone(),
                },
                None => ActionState {
                    key: *key,
                    status: ActionStatus::Idle,
                    content: None,
                },
            })
            .collect()
    }
}

/// Cancel and clear one entry. Returns whether a panel was open or opening.
fn deactivate_entry(entry: &mut Entry) -> bool {
    if let Some(flag) = entry.cancel.take() {
        flag.cancel();
    }
    let was_open = matches!(entry.status, ActionStatus::Active | ActionStatus::Loading);
    entry.status = ActionStatus::Idle;
    entry.content = None;
    was_open
}

fn begin_loading(
    entries: &mut HashMap<ActionKey, Entry>,
    key: ActionKey,
    events: &mut Vec<EngineEvent>,
) -> RunTicket {
    for (other, entry) in entries.iter_mut() {
        if *other != key && deactivate_entry(entry) {
            events.push(EngineEvent::action_closed(*other));
        }
    }

    let entry = entries.entry(key).or_default();
    if let Some(flag) = entry.cancel.take() {
        flag.cancel();
    }
    entry.token += 1;
    entry.status = ActionStatus::Loading;
    entry.content = None;

    let cancel = CancelFlag::new();
    entry.cancel = Some(cancel.clone());

    let ticket = RunTicket {
        key,
        run_id: Uuid::new_v4(),
        token: entry.token,
        cancel,
    };
    events.push(EngineEvent::action_loading(key, ticket.run_id));
    ticket
}
