use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
/// Content passed to the LLM
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        mime_type: String,
        data: String,
    },
    /// A text file forwarded as a described text block, for providers without native
    /// document support
    #[serde(rename = "document-text")]
    DocumentText {
        format: String,
        name: String,
        media_type: String,
        data: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

impl ContentBlock {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn image<M: Into<String>, D: Into<String>>(mime_type: M, data: D) -> Self {
        ContentBlock::Image {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn tool_use<I: Into<String>, N: Into<String>>(id: I, name: N, input: Value) -> Self {
        ContentBlock::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    pub fn tool_result<I: Into<String>, C: Into<String>>(tool_use_id: I, content: C) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }

    /// Get the text content if this is a Text variant
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A message to the LLM
pub struct ProviderMessage {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl ProviderMessage {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        ProviderMessage { role, content }
    }
}
