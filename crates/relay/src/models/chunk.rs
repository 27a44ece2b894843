use serde::{Deserialize, Serialize};

/// Why the provider ended a segment of its turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Unknown,
}

/// A fragment of a streamed tool call. A fragment carrying an id opens a new call;
/// one without continues the arguments of the call opened last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub args: String,
}

impl ToolCallChunk {
    /// The id of this fragment, if it opens a new tool call
    pub fn opening_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
}

impl Usage {
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// One increment of a provider's streamed response. In steady state exactly one of
/// the payload fields is meaningfully populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderChunk {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<StopReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_call_chunks: Vec<ToolCallChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub text: String,
}

impl ProviderChunk {
    pub fn text<I: Into<String>, T: Into<String>>(id: I, text: T) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn tool_call_start<I, C, N>(id: I, tool_call_id: C, name: N) -> Self
    where
        I: Into<String>,
        C: Into<String>,
        N: Into<String>,
    {
        Self {
            id: id.into(),
            tool_call_chunks: vec![ToolCallChunk {
                id: Some(tool_call_id.into()),
                name: Some(name.into()),
                args: String::new(),
            }],
            ..Default::default()
        }
    }

    pub fn tool_call_args<I: Into<String>, A: Into<String>>(id: I, args: A) -> Self {
        Self {
            id: id.into(),
            tool_call_chunks: vec![ToolCallChunk {
                id: None,
                name: None,
                args: args.into(),
            }],
            ..Default::default()
        }
    }

    pub fn stop<I: Into<String>>(id: I, stop_reason: StopReason) -> Self {
        Self {
            id: id.into(),
            stop_reason: Some(stop_reason),
            ..Default::default()
        }
    }

    pub fn usage<I: Into<String>>(id: I, usage: Usage) -> Self {
        Self {
            id: id.into(),
            usage: Some(usage),
            ..Default::default()
        }
    }
}
