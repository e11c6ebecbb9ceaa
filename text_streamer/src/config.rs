use serde::{Deserialize, Serialize};

use crate::{
    boundary::{BoundaryPolicy, PunctuationBoundary, WhitespaceBoundary, DEFAULT_PUNCTUATION_MARKS},
    error::{StreamerError, StreamerResult},
};

/// What the stream sink receives on each update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMode {
    /// Only the text produced since the previous delivery
    #[default]
    #[serde(alias = "partial")]
    Incremental,
    /// Everything decoded so far
    #[serde(alias = "full")]
    Cumulative,
}

/// Serializable description of a [`BoundaryPolicy`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundaryKind {
    Punctuation {
        #[serde(default = "default_marks")]
        marks: Vec<char>,
    },
    Whitespace,
}

fn default_marks() -> Vec<char> {
    DEFAULT_PUNCTUATION_MARKS.to_vec()
}

impl Default for BoundaryKind {
    fn default() -> Self {
        BoundaryKind::Punctuation {
            marks: default_marks(),
        }
    }
}

impl BoundaryKind {
    pub fn validate(&self) -> StreamerResult<()> {
        match self {
            BoundaryKind::Punctuation { marks } if marks.is_empty() => Err(
                StreamerError::InvalidConfig("punctuation boundary needs at least one mark".into()),
            ),
            _ => Ok(()),
        }
    }

    pub fn build(&self) -> StreamerResult<Box<dyn BoundaryPolicy>> {
        self.validate()?;
        Ok(match self {
            BoundaryKind::Punctuation { marks } => {
                Box::new(PunctuationBoundary::new(marks.iter().copied()))
            }
            BoundaryKind::Whitespace => Box::new(WhitespaceBoundary),
        })
    }
}

/// Text streamer configuration, fixed for the lifetime of a streamer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStreamerConfig {
    /// Decode the prompt once to seed the streamer and never deliver it
    pub skip_prompt: bool,
    pub mode: StreamMode,
    pub boundary: BoundaryKind,
}

impl TextStreamerConfig {
    pub fn from_json(input: &str) -> StreamerResult<Self> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> StreamerResult<()> {
        self.boundary.validate()
    }

    pub fn with_skip_prompt(mut self, skip_prompt: bool) -> Self {
        self.skip_prompt = skip_prompt;
        self
    }

    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_boundary(mut self, boundary: BoundaryKind) -> Self {
        self.boundary = boundary;
        self
    }
}
