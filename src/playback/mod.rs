//! Playback coordination for action media.
//!
//! Clients load audio or video themselves and report readiness and lifecycle
//! over the API; this module only arbitrates who may play. It enforces the
//! single-playing-media invariant: at most one key's media plays at a time,
//! and starting one stops whatever else was playing.

use std::collections::HashSet;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::actions::ActionKey;
use crate::state::EngineEvent;

#[derive(Default)]
struct Slots {
    /// The key whose media is currently playing.
    playing: Option<ActionKey>,
    /// Keys whose media the client has finished loading.
    ready: HashSet<ActionKey>,
    /// A play request waiting for its media to become ready. Newest wins.
    pending: Option<ActionKey>,
}

/// Arbitrates media playback across action panels.
pub struct PlaybackCoordinator {
    slots: Mutex<Slots>,
    event_tx: broadcast::Sender<EngineEvent>,
}

impl PlaybackCoordinator {
    pub fn new(event_tx: broadcast::Sender<EngineEvent>) -> Self {
        Self {
            slots: Mutex::new(Slots::default()),
            event_tx,
        }
    }

    /// The key whose media is playing right now, if any.
    pub fn currently_playing(&self) -> Option<ActionKey> {
        self.slots.lock().playing
    }

    /// Record that the client finished loading `key`'s media.
    ///
    /// If a play request was parked waiting for this key, playback starts
    /// immediately. Returns the playing key after the call.
    pub fn mark_ready(&self, key: ActionKey) -> Option<ActionKey> {
        let mut events = Vec::new();
        let playing = {
            let mut slots = self.slots.lock();
            slots.ready.insert(key);
            if slots.pending == Some(key) {
                slots.pending = None;
                start_slot(&mut slots, key, &mut events);
            }
            slots.playing
        };
        self.broadcast_all(events);
        playing
    }

    /// Ask to play `key`'s media.
    ///
    /// Starts immediately when the media is loaded, displacing whatever was
    /// playing. Otherwise the request is parked until `mark_ready`; a later
    /// request for another key replaces it.
    pub fn request_play(&self, key: ActionKey) -> Option<ActionKey> {
        let mut events = Vec::new();
        let playing = {
            let mut slots = self.slots.lock();
            if slots.ready.contains(&key) {
                slots.pending = None;
                start_slot(&mut slots, key, &mut events);
            } else {
                tracing::debug!(%key, "Media not loaded yet, parking play request");
                slots.pending = Some(key);
            }
            slots.playing
        };
        self.broadcast_all(events);
        playing
    }

    /// Ask to pause `key`'s media. Also withdraws a parked play request.
    pub fn request_pause(&self, key: ActionKey) -> Option<ActionKey> {
        let mut events = Vec::new();
        let playing = {
            let mut slots = self.slots.lock();
            if slots.pending == Some(key) {
                slots.pending = None;
            }
            stop_slot(&mut slots, key, &mut events);
            slots.playing
        };
        self.broadcast_all(events);
        playing
    }

    /// Play `key` if it is not playing, pause it if it is.
    pub fn toggle(&self, key: ActionKey) -> Option<ActionKey> {
        if self.currently_playing() == Some(key) {
            self.request_pause(key)
        } else {
            self.request_play(key)
        }
    }

    /// The client reports `key`'s media reached its natural end.
    pub fn on_natural_end(&self, key: ActionKey) -> Option<ActionKey> {
        let mut events = Vec::new();
        let playing = {
            let mut slots = self.slots.lock();
            stop_slot(&mut slots, key, &mut events);
            slots.playing
        };
        self.broadcast_all(events);
        playing
    }

    /// Forget everything about `key`: readiness, parked requests, and
    /// playback. Called when its panel closes.
    pub fn release(&self, key: ActionKey) {
        let mut events = Vec::new();
        {
            let mut slots = self.slots.lock();
            slots.ready.remove(&key);
            if slots.pending == Some(key) {
                slots.pending = None;
            }
            stop_slot(&mut slots, key, &mut events);
        }
        self.broadcast_all(events);
    }

    fn broadcast_all(&self, events: Vec<EngineEvent>) {
        for event in events {
            if self.event_tx.send(event).is_err() {
                tracing::debug!("No subscribers for engine event");
            }
        }
    }
}

fn start_slot(slots: &mut Slots, key: ActionKey, events: &mut Vec<EngineEvent>) {
    if slots.playing == Some(key) {
        return;
    }
    if let Some(prev) = slots.playing.replace(key) {
        events.push(EngineEvent::playback_stopped(prev));
    }
    events.push(EngineEvent::playback_started(key));
}

fn stop_slot(slots: &mut Slots, key: ActionKey, events: &mut Vec<EngineEvent>) {
    if slots.playing == Some(key) {
        slots.playing = None;
        events.push(EngineEvent::playback_stopped(key));
    }
}
