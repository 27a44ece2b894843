use anyhow::{anyhow, Result};
use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::time::Duration;

use super::base::{ChunkStream, Provider};
use super::configs::AnthropicProviderConfig;
use crate::convert::document_text;
use crate::models::chunk::{ProviderChunk, StopReason, Usage};
use crate::models::content::{ContentBlock, ProviderMessage};
use crate::models::role::Role;
use crate::models::tool::Tool;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    config: AnthropicProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    /// Split the conversation into the system prompt and the user/assistant turns
    fn messages_to_anthropic_spec(
        &self,
        messages: &[ProviderMessage],
    ) -> (Option<String>, Vec<Value>) {
        let mut system = Vec::new();
        if let Some(prompt) = &self.config.system_prompt {
            system.push(prompt.clone());
        }

        let mut spec = Vec::new();
        for message in messages {
            match message.role {
                Role::System => system.extend(
                    message
                        .content
                        .iter()
                        .filter_map(|block| block.as_text())
                        .map(String::from),
                ),
                Role::User | Role::Assistant => spec.extend(split_turns(message)),
            }
        }

        let system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };
        (system, spec)
    }

    fn build_payload(&self, messages: &[ProviderMessage], tools: &[Tool]) -> Result<Value> {
        let (system, messages) = self.messages_to_anthropic_spec(messages);

        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(self.config.model));
        payload.insert("max_tokens".to_string(), json!(self.config.max_tokens));
        payload.insert("messages".to_string(), json!(messages));
        payload.insert("stream".to_string(), json!(true));

        if let Some(system) = system {
            payload.insert("system".to_string(), json!(system));
        }
        if !tools.is_empty() {
            payload.insert("tools".to_string(), json!(tools_to_anthropic_spec(tools)?));
            payload.insert("tool_choice".to_string(), json!({"type": "auto"}));
        }
        if let Some(temperature) = self.config.temperature {
            payload.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(top_p) = self.config.top_p {
            payload.insert("top_p".to_string(), json!(top_p));
        }
        if let Some(top_k) = self.config.top_k {
            payload.insert("top_k".to_string(), json!(top_k));
        }

        Ok(Value::Object(payload))
    }

    async fn post(&self, payload: Value) -> Result<reqwest::Response> {
        let url = format!("{}/v1/messages", self.config.host.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("accept", "text/event-stream")
            .json(&payload)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            status if status == StatusCode::TOO_MANY_REQUESTS || status.as_u16() >= 500 => {
                Err(anyhow!("Server error: {}", status))
            }
            status => {
                let error_text = response.text().await?;
                Err(anyhow!("Request failed: {} - {}", status, error_text))
            }
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn stream(&self, messages: &[ProviderMessage], tools: &[Tool]) -> Result<ChunkStream> {
        let payload = self.build_payload(messages, tools)?;
        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            "starting anthropic stream"
        );

        let response = self.post(payload).await?;
        let events = response.bytes_stream().eventsource();
        let mut decoder = ChunkDecoder::default();

        Ok(Box::pin(try_stream! {
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| anyhow!("Invalid event stream: {}", e))?;
                if event.data.trim().is_empty() {
                    continue;
                }
                if let Some(chunk) = decoder.decode(&event.data)? {
                    yield chunk;
                }
            }
        }))
    }
}

/// Convert a content block to Anthropic's content specification
pub fn content_to_anthropic_spec(block: &ContentBlock) -> Value {
    match block {
        ContentBlock::Text { text } => json!({"type": "text", "text": text}),
        ContentBlock::Image { mime_type, data } => json!({
            "type": "image",
            "source": {
                "type": "base64",
                "media_type": mime_type,
                "data": data,
            }
        }),
        ContentBlock::DocumentText {
            format,
            name,
            media_type,
            data,
        } => json!({
            "type": "text",
            "text": document_text(format, name, media_type, data),
        }),
        ContentBlock::ToolUse { id, name, input } => {
            // the api only accepts an object here
            let input = if input.is_null() { json!({}) } else { input.clone() };
            json!({"type": "tool_use", "id": id, "name": name, "input": input})
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
        } => json!({"type": "tool_result", "tool_use_id": tool_use_id, "content": content}),
    }
}

/// Convert tool definitions to Anthropic's tool specification
pub fn tools_to_anthropic_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.input_schema,
        }));
    }

    Ok(result)
}

// Tool results belong to the user side of the exchange, so a message that carries a
// completed call is split into alternating turns
fn split_turns(message: &ProviderMessage) -> Vec<Value> {
    let own_role = match message.role {
        Role::Assistant => "assistant",
        _ => "user",
    };

    let mut turns: Vec<(&str, Vec<Value>)> = Vec::new();
    for block in &message.content {
        let role = match block {
            ContentBlock::ToolResult { .. } => "user",
            _ => own_role,
        };
        match turns.last_mut() {
            Some((current, content)) if *current == role => {
                content.push(content_to_anthropic_spec(block))
            }
            _ => turns.push((role, vec![content_to_anthropic_spec(block)])),
        }
    }

    turns
        .into_iter()
        .map(|(role, content)| json!({"role": role, "content": content}))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamEvent {
    MessageStart {
        message: MessageStart,
    },
    ContentBlockStart {
        content_block: ContentBlockStart,
    },
    ContentBlockDelta {
        delta: BlockDelta,
    },
    ContentBlockStop,
    MessageDelta {
        delta: MessageDelta,
        #[serde(default)]
        usage: Option<DeltaUsage>,
    },
    MessageStop,
    Ping,
    Error {
        error: ErrorBody,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct MessageStart {
    id: String,
    #[serde(default)]
    usage: DeltaUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlockStart {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    Thinking,
    RedactedThinking,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    ThinkingDelta,
    SignatureDelta,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct MessageDelta {
    #[serde(default)]
    stop_reason: Option<StopReason>,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaUsage {
    #[serde(default)]
    input_tokens: Option<u64>,
    #[serde(default)]
    output_tokens: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

/// Turns Anthropic stream events into provider chunks, one event at a time
#[derive(Debug, Default)]
struct ChunkDecoder {
    message_id: String,
    input_tokens: u64,
    output_tokens: u64,
}

impl ChunkDecoder {
    fn decode(&mut self, data: &str) -> Result<Option<ProviderChunk>> {
        let event: StreamEvent = serde_json::from_str(data)?;
        let id = self.message_id.clone();

        let chunk = match event {
            StreamEvent::MessageStart { message } => {
                self.message_id = message.id;
                self.input_tokens = message.usage.input_tokens.unwrap_or(0);
                self.output_tokens = message.usage.output_tokens.unwrap_or(0);
                None
            }
            StreamEvent::ContentBlockStart { content_block } => match content_block {
                ContentBlockStart::Text { text } if !text.is_empty() => {
                    Some(ProviderChunk::text(id, text))
                }
                ContentBlockStart::ToolUse {
                    id: tool_call_id,
                    name,
                } => Some(ProviderChunk::tool_call_start(id, tool_call_id, name)),
                // the event vocabulary has no reasoning run to carry these
                ContentBlockStart::Thinking | ContentBlockStart::RedactedThinking => {
                    tracing::warn!(message_id = %id, "dropping reasoning block");
                    None
                }
                ContentBlockStart::Other => {
                    tracing::debug!(data, "ignoring unsupported content block");
                    None
                }
                ContentBlockStart::Text { .. } => None,
            },
            StreamEvent::ContentBlockDelta { delta } => match delta {
                BlockDelta::TextDelta { text } => Some(ProviderChunk::text(id, text)),
                BlockDelta::InputJsonDelta { partial_json } => {
                    Some(ProviderChunk::tool_call_args(id, partial_json))
                }
                BlockDelta::ThinkingDelta | BlockDelta::SignatureDelta => None,
                BlockDelta::Other => {
                    tracing::debug!(data, "ignoring unsupported content delta");
                    None
                }
            },
            StreamEvent::MessageDelta { delta, usage } => {
                if let Some(usage) = usage {
                    self.input_tokens = usage.input_tokens.unwrap_or(self.input_tokens);
                    self.output_tokens = usage.output_tokens.unwrap_or(self.output_tokens);
                }
                delta
                    .stop_reason
                    .map(|stop_reason| ProviderChunk::stop(id, stop_reason))
            }
            StreamEvent::MessageStop => Some(ProviderChunk::usage(
                id,
                Usage::new(
                    self.input_tokens,
                    self.output_tokens,
                    self.input_tokens + self.output_tokens,
                ),
            )),
            StreamEvent::ContentBlockStop | StreamEvent::Ping => None,
            StreamEvent::Error { error } => {
                return Err(anyhow!("Provider error ({}): {}", error.kind, error.message));
            }
            StreamEvent::Unknown => {
                tracing::warn!(data, "ignoring unknown anthropic stream event");
                None
            }
        };

        Ok(chunk)
    }
}
