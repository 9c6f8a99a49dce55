//! The tutor tools the remote agent invokes
//!
//! Each is a pure request→response contract with one side effect on the
//! lesson board. Argument names match the wire contract the agent is primed
//! with, so they stay camelCase.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::board::{LessonBoard, Phrase};
use crate::mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};
use crate::providers::{providers_in, RegionFilter};
use crate::registry::ToolRegistry;

fn string_arg<'a>(input: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    input
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", name)))
}

/// Display a phrase in English, phonetic and native renderings
pub struct DisplayPhraseTool {
    board: Arc<LessonBoard>,
    language_name: String,
}

impl DisplayPhraseTool {
    pub fn new(board: Arc<LessonBoard>, language_name: impl Into<String>) -> Self {
        Self {
            board,
            language_name: language_name.into(),
        }
    }
}

#[async_trait]
impl Tool for DisplayPhraseTool {
    fn name(&self) -> &str {
        "display_phrase"
    }

    fn description(&self) -> &str {
        "Display a phrase in English, with a phonetic pronunciation guide, and translated into the learner's language. Always use this tool when introducing a new phrase."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property(
                    "englishText",
                    PropertySchema::string(
                        "The phrase in English. E.g., 'Where is the nearest bus stop?'",
                    ),
                    true,
                )
                .property(
                    "phoneticText",
                    PropertySchema::string(format!(
                        "Phonetic pronunciation guide for the English phrase, written in a way that is intuitive for a speaker of {}. E.g., 'wehr iz thuh neer-est bus stop'",
                        self.language_name
                    )),
                    true,
                )
                .property(
                    "nativeText",
                    PropertySchema::string(format!(
                        "The phrase translated into {}.",
                        self.language_name
                    )),
                    true,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let english_text = string_arg(&input, "englishText")?.to_string();
        let phonetic_text = string_arg(&input, "phoneticText")?.to_string();
        let native_text = string_arg(&input, "nativeText")?.to_string();

        self.board.set_phrase(Phrase {
            english_text: english_text.clone(),
            phonetic_text: phonetic_text.clone(),
            native_text: native_text.clone(),
        });

        Ok(ToolOutput::text(format!(
            "Displayed phrase: English: \"{}\", Phonetic: \"{}\", {}: \"{}\"",
            english_text, phonetic_text, self.language_name, native_text
        )))
    }
}

/// Rate the learner's pronunciation attempt, 1–3
pub struct RatePronunciationTool {
    board: Arc<LessonBoard>,
}

impl RatePronunciationTool {
    pub fn new(board: Arc<LessonBoard>) -> Self {
        Self { board }
    }
}

#[async_trait]
impl Tool for RatePronunciationTool {
    fn name(&self) -> &str {
        "rate_pronunciation"
    }

    fn description(&self) -> &str {
        "Rate the user's English pronunciation on a scale from 1 to 3 (1 = needs significant work, 2 = good with room for improvement, 3 = excellent)."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "rating",
                PropertySchema::integer(
                    "The pronunciation rating, an integer between 1 (poor) and 3 (excellent).",
                )
                .with_range(1, 3),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let rating = input
            .get("rating")
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ToolError::invalid_params("rating is required"))?;

        self.board.set_rating(rating as u8);

        // A perfect score tells the agent to move on to fresh material.
        if rating == 3 {
            return Ok(ToolOutput::text(format!(
                "Set pronunciation rating to {}. The user has pronounced the phrase well; therefore, you are instructed to move on to another phrase.",
                rating
            )));
        }
        Ok(ToolOutput::text(format!(
            "Set pronunciation rating to {}",
            rating
        )))
    }
}

/// Targeted pronunciation feedback with `<improve>` spans
pub struct ProvidePronunciationFeedbackTool {
    board: Arc<LessonBoard>,
}

impl ProvidePronunciationFeedbackTool {
    pub fn new(board: Arc<LessonBoard>) -> Self {
        Self { board }
    }
}

#[async_trait]
impl Tool for ProvidePronunciationFeedbackTool {
    fn name(&self) -> &str {
        "provide_pronunciation_feedback"
    }

    fn description(&self) -> &str {
        "Provide specific feedback on the user's English pronunciation, with <improve> tags around words or sounds that need work."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "feedback",
                PropertySchema::string(
                    "Feedback text with <improve> tags. E.g., 'Where is the <improve>nearest</improve> bus stop?'",
                ),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        // Tag pairs are assumed well-formed; unmatched tags render literally.
        let feedback = string_arg(&input, "feedback")?.to_string();
        self.board.set_feedback(feedback.clone());
        Ok(ToolOutput::text(format!(
            "Provided pronunciation feedback: {}",
            feedback
        )))
    }
}

/// Search the local provider catalog
pub struct CheckLocalProvidersTool {
    board: Arc<LessonBoard>,
}

impl CheckLocalProvidersTool {
    pub fn new(board: Arc<LessonBoard>) -> Self {
        Self { board }
    }
}

#[async_trait]
impl Tool for CheckLocalProvidersTool {
    fn name(&self) -> &str {
        "check_local_providers"
    }

    fn description(&self) -> &str {
        "Search for English language class providers in the local area. Returns providers in Norwich or Great Yarmouth. Use this when the user asks about finding English classes or local support."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object().property(
                "region",
                PropertySchema::string(
                    "The region to search. Use 'norwich' for Norwich providers, 'yarmouth' for Great Yarmouth, or 'all' for both.",
                )
                .with_enum(&["norwich", "yarmouth", "all"]),
                true,
            ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let region = string_arg(&input, "region")?;
        let filter = RegionFilter::parse(region)
            .ok_or_else(|| ToolError::invalid_params(format!("unknown region: {}", region)))?;

        let filtered = providers_in(filter);
        self.board.set_providers(filtered.clone());

        let summary = filtered
            .iter()
            .map(|p| p.summary_line())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolOutput::text(format!(
            "Found {} providers:\n{}",
            filtered.len(),
            summary
        )))
    }
}

/// Registry wired with every tutor tool against one board.
pub fn create_tutor_registry(
    board: Arc<LessonBoard>,
    language_name: impl Into<String>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(DisplayPhraseTool::new(board.clone(), language_name));
    registry.register(RatePronunciationTool::new(board.clone()));
    registry.register(ProvidePronunciationFeedbackTool::new(board.clone()));
    registry.register(CheckLocalProvidersTool::new(board));

    tracing::debug!(tools = registry.len(), "Created tutor tool registry");

    registry
}
