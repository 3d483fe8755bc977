//! The action engine: wires the catalog, the pipeline executor, the state
//! store, and the playback coordinator into one orchestrator behind the API.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::actions::{self, ActionKey};
use crate::config::Config;
use crate::pipeline::{
    evergreen_text, CancelFlag, MediaContent, PipelineExecutor, PipelineSpec, PollConfig,
};
use crate::playback::PlaybackCoordinator;
use crate::providers::ProviderSet;
use crate::state::{ActionState, ActionStatus, ActionStore, Activation, EngineEvent, RunTicket};

/// What a click on an action key did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickOutcome {
    /// A new pipeline run started.
    Loading,
    /// The panel was open and has been closed.
    Closed,
    /// The key was already loading; nothing changed.
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown action key: {0}")]
    UnknownAction(String),
    #[error("Action '{0}' has no active content")]
    NotActive(ActionKey),
    #[error("Action '{0}' serves text content, nothing to play")]
    NotPlayable(ActionKey),
}

/// Orchestrates action runs and media playback.
///
/// One engine instance is shared across the HTTP layer and all spawned
/// pipeline tasks. Clicks resolve synchronously against the store; the
/// generation work itself runs in a detached task that reports back through
/// its run ticket, so superseded runs die quietly.
pub struct Engine {
    store: Arc<ActionStore>,
    playback: PlaybackCoordinator,
    executor: PipelineExecutor,
    catalog: HashMap<ActionKey, PipelineSpec>,
}

impl Engine {
    pub fn new(providers: ProviderSet, config: &Config) -> Arc<Self> {
        let store = ActionStore::new();
        let playback = PlaybackCoordinator::new(store.event_sender());
        let executor = PipelineExecutor::new(providers, PollConfig::from(&config.poller));

        Arc::new(Self {
            store,
            playback,
            executor,
            catalog: actions::catalog(config),
        })
    }

    /// Build an engine with live provider clients from configuration.
    pub fn from_config(config: &Config) -> Arc<Self> {
        Engine::new(ProviderSet::from_config(config), config)
    }

    /// Parse a client-supplied action name.
    pub fn resolve(&self, name: &str) -> Result<ActionKey, EngineError> {
        name.parse()
            .map_err(|_| EngineError::UnknownAction(name.to_string()))
    }

    /// Handle a click on `key`.
    ///
    /// Starting a run displaces every other panel, so their playback slots
    /// are released here as well. The pipeline itself runs detached.
    pub fn click(self: &Arc<Self>, key: ActionKey) -> ClickOutcome {
        match self.store.activate(key) {
            Activation::Started(ticket) => {
                for other in ActionKey::ALL {
                    if other != key {
                        self.playback.release(other);
                    }
                }
                let engine = Arc::clone(self);
                tokio::spawn(async move {
                    engine.run_pipeline(ticket).await;
                });
                ClickOutcome::Loading
            }
            Activation::Closed => {
                self.playback.release(key);
                ClickOutcome::Closed
            }
            Activation::InFlight => ClickOutcome::Ignored,
        }
    }

    async fn run_pipeline(&self, ticket: RunTicket) {
        let Some(spec) = self.catalog.get(&ticket.key) else {
            tracing::error!(key = %ticket.key, "No pipeline registered for action");
            self.store
                .set_failed(&ticket, "no pipeline registered for this action");
            return;
        };

        match self.executor.run(spec, &ticket.cancel).await {
            Ok(content) => {
                self.store.set_result(&ticket, content);
            }
            Err(_) => {
                tracing::debug!(key = %ticket.key, run_id = %ticket.run_id, "Pipeline run cancelled, discarding");
            }
        }
    }

    /// Run `key`'s pipeline to completion without touching the store.
    ///
    /// Used by the CLI for one-shot generation. Fallbacks still apply, so
    /// this always yields content.
    pub async fn run_once(&self, key: ActionKey) -> MediaContent {
        let Some(spec) = self.catalog.get(&key) else {
            return evergreen_text();
        };
        self.executor
            .run(spec, &CancelFlag::new())
            .await
            .unwrap_or_else(|_| evergreen_text())
    }

    /// Ask to play `key`'s media.
    pub fn play(&self, key: ActionKey) -> Result<Option<ActionKey>, EngineError> {
        self.ensure_playable(key)?;
        Ok(self.playback.request_play(key))
    }

    /// Ask to pause `key`'s media.
    pub fn pause(&self, key: ActionKey) -> Result<Option<ActionKey>, EngineError> {
        self.ensure_playable(key)?;
        Ok(self.playback.request_pause(key))
    }

    /// Flip `key` between playing and paused.
    pub fn toggle_play(&self, key: ActionKey) -> Result<Option<ActionKey>, EngineError> {
        self.ensure_playable(key)?;
        Ok(self.playback.toggle(key))
    }

    /// The client finished loading `key`'s media.
    pub fn media_ready(&self, key: ActionKey) -> Result<Option<ActionKey>, EngineError> {
        self.ensure_playable(key)?;
        Ok(self.playback.mark_ready(key))
    }

    /// The client reports `key`'s media played to its end. Deliberately
    /// unguarded: the report may arrive after the panel already closed.
    pub fn media_ended(&self, key: ActionKey) -> Option<ActionKey> {
        self.playback.on_natural_end(key)
    }

    fn ensure_playable(&self, key: ActionKey) -> Result<(), EngineError> {
        let state = self.store.get(key);
        if state.status != ActionStatus::Active {
            return Err(EngineError::NotActive(key));
        }
        match state.content {
            Some(content) if content.is_playable() => Ok(()),
            _ => Err(EngineError::NotPlayable(key)),
        }
    }

    pub fn snapshot(&self) -> Vec<ActionState> {
        self.store.snapshot()
    }

    pub fn snapshot_one(&self, key: ActionKey) -> ActionState {
        self.store.get(key)
    }

    pub fn active_key(&self) -> Option<ActionKey> {
        self.store.active_key()
    }

    pub fn playing(&self) -> Option<ActionKey> {
        self.playback.currently_playing()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.store.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{
        JobHandle, JobStatus, ProviderError, SpeechSynthesizer, TextGenerator, VideoGenerator,
    };
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::time::Duration;

    /// Provider stand-in that fails every call, as unconfigured clients do.
    struct Down;

    #[async_trait]
    impl TextGenerator for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
            Err(ProviderError::Unconfigured {
                provider: "down",
                missing: "api key",
            })
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn synthesize(&self, _text: &str) -> Result<Bytes, ProviderError> {
            Err(ProviderError::Unconfigured {
                provider: "down",
                missing: "api key",
            })
        }
    }

    #[async_trait]
    impl VideoGenerator for Down {
        fn name(&self) -> &'static str {
            "down"
        }

        async fn create_job(&self, _script: &str) -> Result<JobHandle, ProviderError> {
            Err(ProviderError::Unconfigured {
                provider: "down",
                missing: "api key",
            })
        }

        async fn job_status(&self, _job: &JobHandle) -> Result<JobStatus, ProviderError> {
            Err(ProviderError::Unconfigured {
                provider: "down",
                missing: "api key",
            })
        }
    }

    fn engine() -> Arc<Engine> {
        let providers = ProviderSet {
            text: Arc::new(Down),
            speech: Arc::new(Down),
            video: Arc::new(Down),
        };
        Engine::new(providers, &Config::default())
    }

    fn audio(title: &str) -> MediaContent {
        MediaContent::Audio {
            title: title.to_string(),
            body: Some("hello".to_string()),
            source: "data:audio/mpeg;base64,AAAA".to_string(),
        }
    }

    async fn wait_for_ready(rx: &mut broadcast::Receiver<EngineEvent>) -> MediaContent {
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                match rx.recv().await {
                    Ok(EngineEvent::ActionReady { content, .. }) => return content,
                    Ok(_) => continue,
                    Err(err) => panic!("event stream closed: {err}"),
                }
            }
        })
        .await
        .expect("timed out waiting for content")
    }

    #[test]
    fn resolve_rejects_unknown_names() {
        let engine = engine();
        assert_eq!(engine.resolve("idea"), Ok(ActionKey::Idea));
        assert_eq!(
            engine.resolve("dance"),
            Err(EngineError::UnknownAction("dance".to_string()))
        );
    }

    #[test]
    fn play_requires_an_active_panel() {
        let engine = engine();
        assert_eq!(
            engine.play(ActionKey::Support),
            Err(EngineError::NotActive(ActionKey::Support))
        );
    }

    #[test]
    fn play_rejects_text_content() {
        let engine = engine();
        let ticket = engine.store.set_loading(ActionKey::Idea);
        engine.store.set_result(
            &ticket,
            MediaContent::Text {
                title: "Idea".to_string(),
                body: "write something".to_string(),
            },
        );

        assert_eq!(
            engine.play(ActionKey::Idea),
            Err(EngineError::NotPlayable(ActionKey::Idea))
        );
    }

    #[test]
    fn ready_media_plays_and_pauses() {
        let engine = engine();
        let ticket = engine.store.set_loading(ActionKey::Support);
        engine.store.set_result(&ticket, audio("Motivational Message"));

        assert_eq!(engine.media_ready(ActionKey::Support), Ok(None));
        assert_eq!(engine.play(ActionKey::Support), Ok(Some(ActionKey::Support)));
        assert_eq!(engine.playing(), Some(ActionKey::Support));
        assert_eq!(engine.pause(ActionKey::Support), Ok(None));
        assert_eq!(engine.toggle_play(ActionKey::Support), Ok(Some(ActionKey::Support)));
    }

    #[test]
    fn media_ended_is_accepted_for_any_key() {
        let engine = engine();
        assert_eq!(engine.media_ended(ActionKey::Smile), None);
    }

    #[tokio::test]
    async fn click_serves_fallback_content_when_providers_are_down() {
        let engine = engine();
        let mut rx = engine.subscribe();

        assert_eq!(engine.click(ActionKey::Idea), ClickOutcome::Loading);
        assert_eq!(engine.click(ActionKey::Idea), ClickOutcome::Ignored);

        let content = wait_for_ready(&mut rx).await;
        let body = content.body().unwrap_or_default();
        assert!(body.starts_with("🛑"), "got: {body}");

        let state = engine.snapshot_one(ActionKey::Idea);
        assert_eq!(state.status, ActionStatus::Active);
        assert_eq!(engine.active_key(), Some(ActionKey::Idea));

        assert_eq!(engine.click(ActionKey::Idea), ClickOutcome::Closed);
        assert_eq!(engine.snapshot_one(ActionKey::Idea).status, ActionStatus::Idle);
    }

    #[tokio::test]
    async fn run_once_always_yields_content() {
        let engine = engine();
        let content = engine.run_once(ActionKey::Published).await;
        assert_eq!(content.title(), "Congratulations! 🎉");
        assert!(content.body().unwrap_or_default().starts_with("🛑"));
    }
}
