//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds an [`Engine`] on top of scripted
//! provider stubs, so tests can choreograph provider replies without any
//! network. The [`with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use cheerdeck::config::Config;
use cheerdeck::engine::Engine;
use cheerdeck::providers::{
    JobHandle, JobStatus, ProviderError, ProviderSet, SpeechSynthesizer, TextGenerator,
    VideoGenerator,
};
use cheerdeck::server::{create_router, AppContext};
use cheerdeck::state::EngineEvent;

/// The error every stub serves when its script runs out or says "fail".
pub fn outage() -> ProviderError {
    ProviderError::Status {
        provider: "stub",
        status: 503,
        body: "scripted outage".to_string(),
    }
}

/// Holds one provider reply hostage until the test releases it, so tests can
/// interleave user actions with an unresolved pipeline run.
#[derive(Clone, Default)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    pub fn open_one(&self) {
        self.notify.notify_one();
    }

    async fn pass(&self) {
        self.notify.notified().await;
    }
}

enum TextReply {
    Ok(String),
    Fail,
    Gated(Gate, String),
}

/// Scripted text generator: replies are served in push order, and running
/// out of script counts as an outage.
#[derive(Default)]
pub struct StubText {
    replies: Mutex<VecDeque<TextReply>>,
    calls: AtomicUsize,
}

impl StubText {
    pub fn push_ok(&self, text: &str) {
        self.replies
            .lock()
            .push_back(TextReply::Ok(text.to_string()));
    }

    pub fn push_fail(&self) {
        self.replies.lock().push_back(TextReply::Fail);
    }

    pub fn push_gated(&self, gate: &Gate, text: &str) {
        self.replies
            .lock()
            .push_back(TextReply::Gated(gate.clone(), text.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Poll until the stub has served `n` calls. A gated call counts as soon
    /// as it is picked up, before the gate opens.
    pub async fn wait_for_calls(&self, n: usize) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while self.calls() < n {
            if tokio::time::Instant::now() > deadline {
                panic!("expected {} provider calls, saw {}", n, self.calls());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

#[async_trait]
impl TextGenerator for StubText {
    fn name(&self) -> &'static str {
        "stub-text"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        let reply = self.replies.lock().pop_front();
        self.calls.fetch_add(1, Ordering::SeqCst);
        match reply {
            Some(TextReply::Ok(text)) => Ok(text),
            Some(TextReply::Gated(gate, text)) => {
                gate.pass().await;
                Ok(text)
            }
            Some(TextReply::Fail) | None => Err(outage()),
        }
    }
}

/// Scripted speech synthesizer.
#[derive(Default)]
pub struct StubSpeech {
    replies: Mutex<VecDeque<Result<Bytes, ()>>>,
}

impl StubSpeech {
    pub fn push_ok(&self, data: &[u8]) {
        self.replies.lock().push_back(Ok(Bytes::copy_from_slice(data)));
    }

    pub fn push_fail(&self) {
        self.replies.lock().push_back(Err(()));
    }
}

#[async_trait]
impl SpeechSynthesizer for StubSpeech {
    fn name(&self) -> &'static str {
        "stub-speech"
    }

    async fn synthesize(&self, _text: &str) -> Result<Bytes, ProviderError> {
        match self.replies.lock().pop_front() {
            Some(Ok(data)) => Ok(data),
            _ => Err(outage()),
        }
    }
}

/// Scripted video generator with separate job-creation and status scripts.
#[derive(Default)]
pub struct StubVideo {
    jobs: Mutex<VecDeque<Result<JobHandle, ()>>>,
    statuses: Mutex<VecDeque<Result<JobStatus, ()>>>,
}

impl StubVideo {
    pub fn push_job(&self, id: &str) {
        self.jobs.lock().push_back(Ok(JobHandle(id.to_string())));
    }

    pub fn push_job_fail(&self) {
        self.jobs.lock().push_back(Err(()));
    }

    pub fn push_status(&self, status: JobStatus) {
        self.statuses.lock().push_back(Ok(status));
    }

    pub fn push_status_fail(&self) {
        self.statuses.lock().push_back(Err(()));
    }
}

#[async_trait]
impl VideoGenerator for StubVideo {
    fn name(&self) -> &'static str {
        "stub-video"
    }

    async fn create_job(&self, _script: &str) -> Result<JobHandle, ProviderError> {
        match self.jobs.lock().pop_front() {
            Some(Ok(handle)) => Ok(handle),
            _ => Err(outage()),
        }
    }

    async fn job_status(&self, _job: &JobHandle) -> Result<JobStatus, ProviderError> {
        match self.statuses.lock().pop_front() {
            Some(Ok(status)) => Ok(status),
            _ => Err(outage()),
        }
    }
}

/// Default test configuration: a usable voice so support synthesizes, and a
/// fast poller so video tests stay quick.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.elevenlabs.voice_id = "test-voice".to_string();
    config.poller.interval_secs = 1;
    config.poller.max_attempts = 3;
    config
}

/// Test harness wrapping an [`Engine`] whose providers are scripted stubs.
pub struct TestHarness {
    pub engine: Arc<Engine>,
    pub config: Config,
    pub text: Arc<StubText>,
    pub speech: Arc<StubSpeech>,
    pub video: Arc<StubVideo>,
}

impl TestHarness {
    /// Create a new harness with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let text = Arc::new(StubText::default());
        let speech = Arc::new(StubSpeech::default());
        let video = Arc::new(StubVideo::default());

        let providers = ProviderSet {
            text: text.clone(),
            speech: speech.clone(),
            video: video.clone(),
        };

        let engine = Engine::new(providers, &config);

        Self {
            engine,
            config,
            text,
            speech,
            video,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let ctx = AppContext {
            engine: harness.engine.clone(),
            config: Arc::new(harness.config.clone()),
        };
        let app = create_router(ctx, None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Wait up to five seconds for an event matching `pred`, skipping others.
pub async fn expect_event<F>(rx: &mut broadcast::Receiver<EngineEvent>, mut pred: F) -> EngineEvent
where
    F: FnMut(&EngineEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) => continue,
                Err(err) => panic!("event stream closed: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for engine event")
}
