//! The action catalog: the fixed keys a user can trigger, the prompt pools
//! behind them, and the per-key pipeline specifications the executor
//! interprets. Adding an action means adding data here, not control flow.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::pipeline::{PipelineSpec, Stage, StageOp, TextEmit};

/// Identifier for a registered action. The set is fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKey {
    /// Fresh content idea for a blocked blogger
    Idea,
    /// Motivational message, spoken when a voice is configured
    Support,
    /// Congratulations after publishing
    Published,
    /// Short AI-rendered comic relief video
    Smile,
}

impl ActionKey {
    pub const ALL: [ActionKey; 4] = [
        ActionKey::Idea,
        ActionKey::Support,
        ActionKey::Published,
        ActionKey::Smile,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKey::Idea => "idea",
            ActionKey::Support => "support",
            ActionKey::Published => "published",
            ActionKey::Smile => "smile",
        }
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idea" => Ok(ActionKey::Idea),
            "support" => Ok(ActionKey::Support),
            "published" => Ok(ActionKey::Published),
            "smile" => Ok(ActionKey::Smile),
            _ => Err(format!("Unknown action key: {}", s)),
        }
    }
}

const IDEA_TITLE: &str = "Creative Challenge 💡";
const SUPPORT_TEXT_TITLE: &str = "Motivational Support 💪";
const SUPPORT_AUDIO_TITLE: &str = "Motivational Message";
const PUBLISHED_TITLE: &str = "Congratulations! 🎉";
const SMILE_TITLE: &str = "Funny Content";

const IDEA_PROMPT: &str = "You are a creative assistant for bloggers. Generate a single, fresh, inspiring, and original content idea or writing prompt for a blogger experiencing writer's block. The idea should be unique, actionable, and spark creativity. Respond with only the idea as a short string. Add a random twist or context to make it even more interesting.";

const IDEA_FALLBACKS: &[&str] = &[
    "🛑 Write about a skill you learned by accident and how it changed your perspective",
    "🛑 Document the story behind your most treasured possession and why it matters",
    "🛑 Create content explaining your creative process using only food analogies",
    "🛑 Share three things you believed as a child that turned out to be hilariously wrong",
    "🛑 Write about a conversation that completely changed your mind about something important",
];

const MOTIVATIONAL_OPENERS: &[&str] = &[
    "Hey, creative warrior!",
    "To the amazing creator,",
    "Feeling the weight of the editing grind?",
    "Take a deep breath, talented editor.",
    "It's okay to feel overwhelmed sometimes,",
    "Just a little reminder, superstar:",
    "Your dedication truly shines,",
    "Remember this, creative soul:",
];

const MOTIVATIONAL_THEMES: &[&str] = &[
    "every cut brings you closer to your vision.",
    "your passion is your superpower.",
    "even small breaks make a huge difference.",
    "the final product will be worth every effort.",
    "you're building something incredible, one step at a time.",
    "your unique perspective is what makes your work special.",
    "don't forget the joy of creation.",
    "your audience truly appreciates you.",
];

const MOTIVATIONAL_CLOSERS: &[&str] = &[
    "You've got this!",
    "Keep that creative fire burning!",
    "We believe in you.",
    "Take a break, you've earned it.",
    "Your art matters.",
    "Push through, you're almost there!",
    "Remember your 'why'.",
    "You're making magic!",
];

const SUPPORT_EVERGREEN: &str = "🛑 You are doing amazing work! Take a breath and remember why you started creating. Every edit brings you closer to your vision. Keep going!";

const PUBLISHED_INSTRUCTIONS: &[&str] = &[
    "Say something uplifting to a blogger who just published a new video.",
    "Send kind words to a content creator finishing a project.",
    "Cheer on a YouTuber who just shared something vulnerable.",
    "What would a kind coach say to a blogger hitting publish?",
    "Praise a blogger who feels nervous after publishing.",
];

const PUBLISHED_EVERGREEN: &str = "🛑 Amazing work! You've just shared your creativity with the world. Every piece of content you publish is a step forward in your creative journey. Keep creating and keep being awesome!";

const SMILE_SCRIPTS: &[&str] = &[
    "Tell me you're a content creator without telling me: my sleep schedule is render-dependent and my best ideas arrive in the shower, uninvited.",
    "Breaking news: local creator opens the editing software, then watches forty minutes of other people's videos for research. Experts confirm this is normal.",
    "My camera has one job. My microphone has one job. Somehow the only one doing overtime is my self-doubt. Let's laugh about that together.",
    "Day four hundred of asking viewers to like and subscribe. The button remains unbothered. The creator remains hopeful.",
];

const SMILE_FALLBACKS: &[&str] = &[
    "🛑 My render bar and I have a lot in common: we both freeze at 99%.",
    "🛑 A creator's three stages of grief: 'this is my best work', 'this is garbage', 'posting it anyway'.",
    "🛑 Why did the editor bring a ladder to the studio? To finally reach the high notes in the color grade.",
    "🛑 Autofocus: the only coworker who hunts for something all day and still gets paid.",
    "🛑 I told my timeline a joke. It cut away.",
];

fn pick(pool: &'static [&'static str]) -> &'static str {
    pool.choose(&mut rand::thread_rng()).copied().unwrap_or("")
}

/// Instruction prompt for the `idea` action.
pub fn idea_prompt() -> String {
    IDEA_PROMPT.to_string()
}

/// Prompt for the `support` action, assembled per run from the three
/// motivational phrase pools.
pub fn support_prompt() -> String {
    format!(
        "Generate a short, motivational message for a content creator experiencing editing burnout.\n\
         Start with \"{}\".\n\
         Include the idea that \"{}\".\n\
         End with \"{}\".\n\
         Keep the total message under 30 words. Focus on encouragement and the value of their work.",
        pick(MOTIVATIONAL_OPENERS),
        pick(MOTIVATIONAL_THEMES),
        pick(MOTIVATIONAL_CLOSERS),
    )
}

/// Prompt for the `published` action, built around one coaching instruction.
pub fn published_prompt() -> String {
    format!(
        "You are a kind motivational coach for content creators. A user has just published a new blog post or video.\n\
         Instruction: {}\n\
         Respond with a warm, short, kind, supportive, and encouraging motivational message. It should be tailored for someone who has just shared their work and needs affirmation. Return only the message as a plain text string.",
        pick(PUBLISHED_INSTRUCTIONS),
    )
}

/// Script for the `smile` action's rendered video.
pub fn smile_script() -> String {
    pick(SMILE_SCRIPTS).to_string()
}

/// Build every registered action's pipeline from configuration.
///
/// The support pipeline carries its generated message into a synthesis stage
/// only when a usable voice is configured; otherwise it stays text-only.
pub fn catalog(config: &Config) -> HashMap<ActionKey, PipelineSpec> {
    let mut specs = HashMap::new();

    specs.insert(
        ActionKey::Idea,
        PipelineSpec::new(vec![Stage {
            name: "idea-text",
            primary: StageOp::GenerateText {
                prompt: idea_prompt,
                emit: TextEmit::Terminal { title: IDEA_TITLE },
            },
            fallback: StageOp::StaticTextPool {
                title: IDEA_TITLE,
                pool: IDEA_FALLBACKS,
            },
        }]),
    );

    let support = if config.elevenlabs.usable_voice_id().is_some() {
        PipelineSpec::new(vec![
            Stage {
                name: "support-text",
                primary: StageOp::GenerateText {
                    prompt: support_prompt,
                    emit: TextEmit::Carry,
                },
                fallback: StageOp::StaticText {
                    title: SUPPORT_TEXT_TITLE,
                    body: SUPPORT_EVERGREEN,
                },
            },
            Stage {
                name: "support-voice",
                primary: StageOp::Synthesize {
                    title: SUPPORT_AUDIO_TITLE,
                },
                fallback: StageOp::CarriedText {
                    title: SUPPORT_TEXT_TITLE,
                },
            },
        ])
    } else {
        PipelineSpec::new(vec![Stage {
            name: "support-text",
            primary: StageOp::GenerateText {
                prompt: support_prompt,
                emit: TextEmit::Terminal {
                    title: SUPPORT_TEXT_TITLE,
                },
            },
            fallback: StageOp::StaticText {
                title: SUPPORT_TEXT_TITLE,
                body: SUPPORT_EVERGREEN,
            },
        }])
    };
    specs.insert(ActionKey::Support, support);

    specs.insert(
        ActionKey::Published,
        PipelineSpec::new(vec![Stage {
            name: "published-text",
            primary: StageOp::GenerateText {
                prompt: published_prompt,
                emit: TextEmit::Terminal {
                    title: PUBLISHED_TITLE,
                },
            },
            fallback: StageOp::StaticText {
                title: PUBLISHED_TITLE,
                body: PUBLISHED_EVERGREEN,
            },
        }]),
    );

    specs.insert(
        ActionKey::Smile,
        PipelineSpec::new(vec![Stage {
            name: "smile-video",
            primary: StageOp::RenderVideo {
                script: smile_script,
                title: SMILE_TITLE,
            },
            fallback: StageOp::StaticTextPool {
                title: SMILE_TITLE,
                pool: SMILE_FALLBACKS,
            },
        }]),
    );

    specs
}
