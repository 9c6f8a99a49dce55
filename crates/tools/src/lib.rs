//! Tools for the Roots voice tutor
//!
//! Implements the schema-validated tool interface the remote conversational
//! agent invokes, the registry that dispatches calls, and the lesson board
//! the tools project their side effects onto.

pub mod board;
pub mod instructions;
pub mod mcp;
pub mod providers;
pub mod registry;
pub mod tutor;

pub use board::{LessonBoard, Phrase};
pub use instructions::{help_instructions, practice_instructions};
pub use mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};
pub use providers::{Provider, Region, RegionFilter};
pub use registry::{ToolExecutor, ToolRegistry};
pub use tutor::{
    create_tutor_registry, CheckLocalProvidersTool, DisplayPhraseTool,
    ProvidePronunciationFeedbackTool, RatePronunciationTool,
};
