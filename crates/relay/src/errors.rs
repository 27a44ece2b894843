use serde::{Deserialize, Serialize};
use thiserror::Error;

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ToolResult<T> = Result<T, ToolError>;

/// Fatal conditions that abort an outbound event stream.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Malformed arguments for tool call {tool_call_id}: {source}")]
    MalformedArguments {
        tool_call_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Tool argument fragment arrived before any tool call was started")]
    OrphanArgumentFragment,

    #[error("Provider stream failed: {0}")]
    Provider(anyhow::Error),
}

pub type StreamResult<T> = Result<T, StreamError>;
