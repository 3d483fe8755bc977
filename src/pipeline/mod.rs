//! Content pipeline model and machinery.
//!
//! A pipeline is an ordered list of [`Stage`]s, each pairing a primary
//! operation with a fallback. [`PipelineExecutor`] interprets stage data
//! against the provider adapters; [`poll_until`] drives asynchronous video
//! jobs. The executor absorbs every provider failure into fallback content,
//! so a run always ends with something displayable unless its ticket was
//! cancelled.

mod executor;
mod poller;

pub use executor::{Cancelled, PipelineExecutor};
pub use poller::{poll_until, CancelFlag, PollConfig, PollError, Probe};

pub(crate) use executor::evergreen_text;

use serde::{Deserialize, Serialize};

/// Displayable outcome of a pipeline run: plain text, spoken audio, or a
/// hosted video clip.
///
/// Serialized with the wire tags the panel frontend renders (`type`,
/// `title`, `text`, `src`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaContent {
    Text {
        title: String,
        #[serde(rename = "text")]
        body: String,
    },
    Audio {
        title: String,
        /// Transcript of the spoken message, shown alongside the player
        #[serde(rename = "text", skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(rename = "src")]
        source: String,
    },
    Video {
        title: String,
        #[serde(rename = "text", skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(rename = "src")]
        source: String,
    },
}

impl MediaContent {
    pub fn text(title: impl Into<String>, body: impl Into<String>) -> Self {
        MediaContent::Text {
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            MediaContent::Text { title, .. }
            | MediaContent::Audio { title, .. }
            | MediaContent::Video { title, .. } => title,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            MediaContent::Text { body, .. } => Some(body),
            MediaContent::Audio { body, .. } | MediaContent::Video { body, .. } => body.as_deref(),
        }
    }

    /// Playback source, present for audio and video only.
    pub fn source(&self) -> Option<&str> {
        match self {
            MediaContent::Text { .. } => None,
            MediaContent::Audio { source, .. } | MediaContent::Video { source, .. } => {
                Some(source)
            }
        }
    }

    /// Whether the content drives a media element.
    pub fn is_playable(&self) -> bool {
        !matches!(self, MediaContent::Text { .. })
    }

    /// Wire tag, handy for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaContent::Text { .. } => "text",
            MediaContent::Audio { .. } => "audio",
            MediaContent::Video { .. } => "video",
        }
    }
}

/// Ordered stage list for one action. Pure data: the executor gives it
/// meaning.
#[derive(Debug, Clone)]
pub struct PipelineSpec {
    pub stages: Vec<Stage>,
}

impl PipelineSpec {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }
}

/// One pipeline step: a primary operation and the fallback that runs when
/// the primary fails.
#[derive(Debug, Clone)]
pub struct Stage {
    pub name: &'static str,
    pub primary: StageOp,
    pub fallback: StageOp,
}

/// A single interpretable operation.
///
/// Prompt builders are plain function pointers so a spec stays `Send + Sync`
/// data while still drawing a fresh randomized prompt per run.
#[derive(Debug, Clone)]
pub enum StageOp {
    /// Call the text adapter with a freshly built prompt
    GenerateText {
        prompt: fn() -> String,
        emit: TextEmit,
    },
    /// Synthesize the carried text into spoken audio
    Synthesize { title: &'static str },
    /// Create a video job from a freshly built script and poll it
    RenderVideo {
        script: fn() -> String,
        title: &'static str,
    },
    /// Hard-coded text; cannot fail
    StaticText {
        title: &'static str,
        body: &'static str,
    },
    /// One random line from a hard-coded pool; cannot fail
    StaticTextPool {
        title: &'static str,
        pool: &'static [&'static str],
    },
    /// Wrap text carried from an earlier stage as terminal content
    CarriedText { title: &'static str },
}

/// What to do with freshly generated text.
#[derive(Debug, Clone, Copy)]
pub enum TextEmit {
    /// Wrap it as terminal `Text` content
    Terminal { title: &'static str },
    /// Hand it to the next stage
    Carry,
}
