//! Presentation Pipeline - Single Entry Point
//!
//! CRITICAL: generate_presentation never returns an unvalidated candidate and
//! never dead-ends. Every generation, extraction or schema failure is turned
//! into the fallback deck plus an advisory.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fallback;
use crate::generation::{GenerationAdapter, GenerationError, TextGenerator};
use crate::model::Presentation;
use crate::validation::{ValidationError, Validator};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Topic must not be empty")]
    EmptyTopic,
}

/// Why the pipeline fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    GenerationFailure,
    ExtractionFailure,
    SchemaViolation,
}

/// Non-fatal notice that the result came from fallback synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    pub kind: AdvisoryKind,
    pub message: String,
}

impl From<&GenerationError> for Advisory {
    fn from(err: &GenerationError) -> Self {
        let kind = match err {
            GenerationError::Unavailable(_) | GenerationError::Request(_) | GenerationError::Api(_) => {
                AdvisoryKind::GenerationFailure
            }
            GenerationError::Extraction | GenerationError::Parse(_) => AdvisoryKind::ExtractionFailure,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl From<&ValidationError> for Advisory {
    fn from(err: &ValidationError) -> Self {
        Self {
            kind: AdvisoryKind::SchemaViolation,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub presentation: Presentation,
    /// Present only when the fallback path was taken.
    pub advisory: Option<Advisory>,
}

impl GenerationOutcome {
    pub fn used_fallback(&self) -> bool {
        self.advisory.is_some()
    }
}

/// The presentation pipeline - adapter, validator, fallback
pub struct PresentationPipeline {
    adapter: GenerationAdapter,
    validator: Validator,
}

impl PresentationPipeline {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self {
            adapter: GenerationAdapter::new(generator),
            validator: Validator::new(),
        }
    }

    /// Generate a presentation for `topic`.
    ///
    /// Only the empty string is an error. Any other topic, whitespace-only
    /// included, yields a presentation; trimming is left to the caller.
    pub async fn generate_presentation(&self, topic: &str) -> Result<GenerationOutcome, PipelineError> {
        if topic.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }

        let attempt = match self.adapter.generate(topic).await {
            Ok(candidate) => self.validator.validate(&candidate).map_err(|e| Advisory::from(&e)),
            Err(e) => Err(Advisory::from(&e)),
        };

        let outcome = match attempt {
            Ok(presentation) => GenerationOutcome {
                presentation,
                advisory: None,
            },
            Err(advisory) => {
                tracing::warn!(
                    generator = self.adapter.generator_name(),
                    kind = ?advisory.kind,
                    "Generation fell back to template deck: {}",
                    advisory.message
                );
                GenerationOutcome {
                    presentation: fallback::synthesize(topic),
                    advisory: Some(advisory),
                }
            }
        };

        tracing::info!(
            slides = outcome.presentation.slide_count(),
            fallback = outcome.used_fallback(),
            "Presentation ready"
        );
        Ok(outcome)
    }
}
