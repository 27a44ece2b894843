use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::role::Role;

/// Prefix of the part tag that carries a tool invocation, e.g. `tool-get_current_weather`
pub const TOOL_PART_PREFIX: &str = "tool-";

/// A message as sent by the chat interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    #[serde(default)]
    pub id: String,
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl ClientMessage {
    pub fn new<S: Into<String>>(id: S, role: Role) -> Self {
        ClientMessage {
            id: id.into(),
            role,
            parts: Vec::new(),
        }
    }

    pub fn with_part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_part(Part::text(text))
    }
}

/// One typed unit of a client message.
///
/// The wire tag for tool parts embeds the tool name, which serde cannot express as a
/// plain enum tag, so (de)serialization goes through [`RawPart`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPart", into = "RawPart")]
pub enum Part {
    Text {
        text: String,
    },
    File {
        media_type: String,
        filename: String,
        url: String,
    },
    Tool {
        tool_name: String,
        tool_call_id: String,
        input: Value,
        output: Option<Value>,
    },
    /// A part kind the relay does not forward (reasoning, step markers, ...)
    Other {
        kind: String,
    },
}

impl Part {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Part::Text { text: text.into() }
    }

    pub fn file<M, F, U>(media_type: M, filename: F, url: U) -> Self
    where
        M: Into<String>,
        F: Into<String>,
        U: Into<String>,
    {
        Part::File {
            media_type: media_type.into(),
            filename: filename.into(),
            url: url.into(),
        }
    }

    pub fn tool<N, I>(tool_name: N, tool_call_id: I, input: Value, output: Option<Value>) -> Self
    where
        N: Into<String>,
        I: Into<String>,
    {
        Part::Tool {
            tool_name: tool_name.into(),
            tool_call_id: tool_call_id.into(),
            input,
            output,
        }
    }

    /// The `type` tag this part carries on the wire
    pub fn kind(&self) -> String {
        match self {
            Part::Text { .. } => "text".to_string(),
            Part::File { .. } => "file".to_string(),
            Part::Tool { tool_name, .. } => format!("{}{}", TOOL_PART_PREFIX, tool_name),
            Part::Other { kind } => kind.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<Value>,
}

impl From<RawPart> for Part {
    fn from(raw: RawPart) -> Self {
        match raw.kind.as_str() {
            "text" => Part::Text {
                text: raw.text.unwrap_or_default(),
            },
            "file" => Part::File {
                media_type: raw.media_type.unwrap_or_default(),
                filename: raw.filename.unwrap_or_default(),
                url: raw.url.unwrap_or_default(),
            },
            kind if kind.starts_with(TOOL_PART_PREFIX) => Part::Tool {
                tool_name: kind[TOOL_PART_PREFIX.len()..].to_string(),
                tool_call_id: raw.tool_call_id.unwrap_or_default(),
                input: raw.input.unwrap_or(Value::Null),
                output: raw.output,
            },
            _ => Part::Other { kind: raw.kind },
        }
    }
}

impl From<Part> for RawPart {
    fn from(part: Part) -> Self {
        let kind = part.kind();
        match part {
            Part::Text { text } => RawPart {
                kind,
                text: Some(text),
                ..Default::default()
            },
            Part::File {
                media_type,
                filename,
                url,
            } => RawPart {
                kind,
                media_type: Some(media_type),
                filename: Some(filename),
                url: Some(url),
                ..Default::default()
            },
            Part::Tool {
                tool_call_id,
                input,
                output,
                ..
            } => RawPart {
                kind,
                tool_call_id: Some(tool_call_id),
                input: Some(input),
                output,
                ..Default::default()
            },
            Part::Other { .. } => RawPart {
                kind,
                ..Default::default()
            },
        }
    }
}
