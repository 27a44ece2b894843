use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why the assistant message finished, as reported to the chat interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageData {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub finish_reason: FinishReason,
}

/// The outbound streaming vocabulary understood by the chat interface.
///
/// Every variant serializes to a single JSON object whose `type` field names the
/// variant, so the wire encoder never formats events by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum StreamingEvent {
    #[serde(rename_all = "camelCase")]
    Start { message_id: String },
    TextStart { id: String },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },
    #[serde(rename_all = "camelCase")]
    ToolInputStart {
        tool_call_id: String,
        tool_name: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputDelta {
        tool_call_id: String,
        input_text_delta: String,
    },
    #[serde(rename_all = "camelCase")]
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
    #[serde(rename_all = "camelCase")]
    ToolOutputAvailable { tool_call_id: String, output: Value },
    DataUsage { data: UsageData },
    Finish,
    #[serde(rename_all = "camelCase")]
    Error { error_text: String },
}

impl StreamingEvent {
    pub fn error<S: Into<String>>(error_text: S) -> Self {
        StreamingEvent::Error {
            error_text: error_text.into(),
        }
    }
}

/// One item of the outbound stream: either a typed event or the end-of-transmission
/// sentinel
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(StreamingEvent),
    Done,
}
