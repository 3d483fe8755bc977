//! Interprets [`PipelineSpec`] stage lists against the provider adapters.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::pipeline::poller::{poll_until, CancelFlag, PollConfig, PollError, Probe};
use crate::pipeline::{MediaContent, PipelineSpec, StageOp, TextEmit};
use crate::providers::{JobStatus, ProviderError, ProviderSet};

const EVERGREEN_TITLE: &str = "Motivational Support 💪";
const EVERGREEN_BODY: &str =
    "🛑 You are doing amazing work! Take a breath and remember why you started creating.";

/// Safety net served when a stage and its fallback both fail. The built-in
/// catalog never reaches it: every fallback there is a static text op.
pub(crate) fn evergreen_text() -> MediaContent {
    MediaContent::text(EVERGREEN_TITLE, EVERGREEN_BODY)
}

/// The run was abandoned because its ticket was cancelled.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("pipeline run cancelled")]
pub struct Cancelled;

/// Outcome of a single stage operation.
enum StageFlow {
    /// Terminal content, the run is finished
    Done(MediaContent),
    /// The operation stashed text for a later stage
    Carry,
}

#[derive(Debug, Error)]
enum StageError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Poll(PollError),

    #[error("stage needs carried text but none was produced")]
    NoCarriedText,

    #[error("run cancelled")]
    Cancelled,
}

/// Runs an action's stage list, absorbing provider failures into each
/// stage's fallback.
pub struct PipelineExecutor {
    providers: ProviderSet,
    poll: PollConfig,
}

impl PipelineExecutor {
    pub fn new(providers: ProviderSet, poll: PollConfig) -> Self {
        Self { providers, poll }
    }

    /// Interpret `spec` stage by stage and produce displayable content.
    ///
    /// The only error is [`Cancelled`]: the caller abandoned the run. Every
    /// provider failure degrades into fallback content instead.
    pub async fn run(
        &self,
        spec: &PipelineSpec,
        cancel: &CancelFlag,
    ) -> Result<MediaContent, Cancelled> {
        let mut carried: Option<String> = None;

        for stage in &spec.stages {
            if cancel.is_cancelled() {
                return Err(Cancelled);
            }

            match self.exec_op(&stage.primary, &mut carried, cancel).await {
                Ok(StageFlow::Done(content)) => return Ok(content),
                Ok(StageFlow::Carry) => continue,
                Err(StageError::Cancelled) => return Err(Cancelled),
                Err(err) => {
                    warn!(stage = stage.name, error = %err, "Stage failed, running fallback");
                    match self.exec_op(&stage.fallback, &mut carried, cancel).await {
                        Ok(StageFlow::Done(content)) => return Ok(content),
                        Ok(StageFlow::Carry) => continue,
                        Err(StageError::Cancelled) => return Err(Cancelled),
                        Err(err) => {
                            error!(
                                stage = stage.name,
                                error = %err,
                                "Stage fallback failed, serving evergreen content"
                            );
                            return Ok(evergreen_text());
                        }
                    }
                }
            }
        }

        // A stage list without a terminal stage; still serve something.
        error!("Pipeline ran out of stages without terminal content");
        Ok(evergreen_text())
    }

    async fn exec_op(
        &self,
        op: &StageOp,
        carried: &mut Option<String>,
        cancel: &CancelFlag,
    ) -> Result<StageFlow, StageError> {
        match op {
            StageOp::GenerateText { prompt, emit } => {
                let prompt = prompt();
                let reply = self.providers.text.generate(&prompt).await?;
                debug!(
                    provider = self.providers.text.name(),
                    chars = reply.len(),
                    "Generated text"
                );
                match emit {
                    TextEmit::Terminal { title } => {
                        Ok(StageFlow::Done(MediaContent::text(*title, reply)))
                    }
                    TextEmit::Carry => {
                        *carried = Some(reply);
                        Ok(StageFlow::Carry)
                    }
                }
            }

            StageOp::Synthesize { title } => {
                let text = carried.clone().ok_or(StageError::NoCarriedText)?;
                let audio = self.providers.speech.synthesize(&text).await?;
                debug!(
                    provider = self.providers.speech.name(),
                    bytes = audio.len(),
                    "Synthesized speech"
                );
                let source = format!("data:audio/mpeg;base64,{}", BASE64.encode(&audio));
                Ok(StageFlow::Done(MediaContent::Audio {
                    title: (*title).to_string(),
                    body: Some(text),
                    source,
                }))
            }

            StageOp::RenderVideo { script, title } => {
                let script = script();
                let handle = self.providers.video.create_job(&script).await?;
                info!(
                    provider = self.providers.video.name(),
                    job = %handle,
                    "Video job created, polling for completion"
                );

                let video = Arc::clone(&self.providers.video);
                let outcome = poll_until(self.poll, cancel, || {
                    let video = Arc::clone(&video);
                    let handle = handle.clone();
                    async move {
                        Ok::<_, ProviderError>(match video.job_status(&handle).await? {
                            JobStatus::Pending => Probe::Pending,
                            JobStatus::Completed {
                                result_uri: Some(uri),
                            } => Probe::Ready(uri),
                            JobStatus::Completed { result_uri: None } => Probe::Incomplete,
                            JobStatus::Failed { reason } => Probe::Failed { reason },
                        })
                    }
                })
                .await;

                match outcome {
                    Ok(uri) => Ok(StageFlow::Done(MediaContent::Video {
                        title: (*title).to_string(),
                        body: None,
                        source: uri,
                    })),
                    Err(PollError::Cancelled) => Err(StageError::Cancelled),
                    Err(err) => Err(StageError::Poll(err)),
                }
            }

            StageOp::StaticText { title, body } => {
                Ok(StageFlow::Done(MediaContent::text(*title, *body)))
            }

            StageOp::StaticTextPool { title, pool } => {
                let line = pool
                    .choose(&mut rand::thread_rng())
                    .copied()
                    .unwrap_or(EVERGREEN_BODY);
                Ok(StageFlow::Done(MediaContent::text(*title, line)))
            }

            StageOp::CarriedText { title } => {
                let text = carried.clone().ok_or(StageError::NoCarriedText)?;
                Ok(StageFlow::Done(MediaContent::text(*title, text)))
            }
        }
    }
}
