use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actions::ActionKey;
use crate::pipeline::{CancelFlag, MediaContent};

/// Lifecycle phase of a single action panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// No panel open, no run in flight.
    Idle,
    /// A pipeline run is in flight.
    Loading,
    /// Content is stored and the panel is open.
    Active,
    /// The last run failed; the key can be re-clicked.
    Failed,
}

/// Snapshot of one action as served to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionState {
    pub key: ActionKey,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MediaContent>,
}

/// Handle identifying one issued pipeline run.
///
/// The store hands out a fresh ticket whenever a key enters `Loading`. A run
/// can only land its outcome by presenting the ticket back; a ticket whose
/// token no longer matches the key's latest is stale and its outcome is
/// dropped.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub key: ActionKey,
    pub run_id: Uuid,
    pub token: u64,
    pub cancel: CancelFlag,
}

/// Outcome of a click on an action key.
#[derive(Debug)]
pub enum Activation {
    /// The key was idle or failed; a new run should start with this ticket.
    Started(RunTicket),
    /// The key was active; its panel has been closed.
    Closed,
    /// The key is already loading; the click was swallowed.
    InFlight,
}

/// Engine-wide event for SSE broadcasting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// A pipeline run has started for a key.
    ActionLoading {
        key: ActionKey,
        run_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// A run finished and its content is now active.
    ActionReady {
        key: ActionKey,
        run_id: Uuid,
        content: MediaContent,
        timestamp: DateTime<Utc>,
    },
    /// A panel closed, by click-to-close or by another key taking over.
    ActionClosed {
        key: ActionKey,
        timestamp: DateTime<Utc>,
    },
    /// A run failed and the key is now in the failed state.
    ActionFailed {
        key: ActionKey,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A superseded run's outcome arrived late and was discarded.
    StaleResultDropped {
        key: ActionKey,
        run_id: Uuid,
        timestamp: DateTime<Utc>,
    },
    /// Media playback started for a key.
    PlaybackStarted {
        key: ActionKey,
        timestamp: DateTime<Utc>,
    },
    /// Media playback stopped: pause, natural end, or panel close.
    PlaybackStopped {
        key: ActionKey,
        timestamp: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Create an ActionLoading event.
    pub fn action_loading(key: ActionKey, run_id: Uuid) -> Self {
        EngineEvent::ActionLoading {
            key,
            run_id,
            timestamp: Utc::now(),
        }
    }

    /// Create an ActionReady event.
    pub fn action_ready(key: ActionKey, run_id: Uuid, content: MediaContent) -> Self {
        EngineEvent::ActionReady {
            key,
            run_id,
            content,
            timestamp: Utc::now(),
        }
    }

    /// Create an ActionClosed event.
    pub fn action_closed(key: ActionKey) -> Self {
        EngineEvent::ActionClosed {
            key,
            timestamp: Utc::now(),
        }
    }

    /// Create an ActionFailed event.
    pub fn action_failed(key: ActionKey, reason: String) -> Self {
        EngineEvent::ActionFailed {
            key,
            reason,
            timestamp: Utc::now(),
        }
    }

    /// Create a StaleResultDropped event.
    pub fn stale_result_dropped(key: ActionKey, run_id: Uuid) -> Self {
        EngineEvent::StaleResultDropped {
            key,
            run_id,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlaybackStarted event.
    pub fn playback_started(key: ActionKey) -> Self {
        EngineEvent::PlaybackStarted {
            key,
            timestamp: Utc::now(),
        }
    }

    /// Create a PlaybackStopped event.
    pub fn playback_stopped(key: ActionKey) -> Self {
        EngineEvent::PlaybackStopped {
            key,
            timestamp: Utc::now(),
        }
    }
}
