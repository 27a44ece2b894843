use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::content::{ContentBlock, ProviderMessage};
use crate::models::part::{ClientMessage, Part};

lazy_static! {
    static ref DATA_URL: Regex = Regex::new(r"^data:([^;]+);base64,(.+)").unwrap();
}

/// Convert chat interface messages into the provider conversation.
///
/// Parts that cannot be forwarded (unmatched file urls, unsupported media types,
/// unknown part kinds) are dropped without error, and a message left with no content
/// is omitted entirely rather than sent empty.
pub fn convert_messages(messages: &[ClientMessage]) -> Vec<ProviderMessage> {
    let mut converted = Vec::new();

    for message in messages {
        let mut content = Vec::new();

        for part in &message.parts {
            convert_part(part, &mut content);
        }

        if content.is_empty() {
            tracing::debug!(message_id = %message.id, "dropping message with no content");
            continue;
        }
        converted.push(ProviderMessage::new(message.role, content));
    }

    converted
}

fn convert_part(part: &Part, content: &mut Vec<ContentBlock>) {
    match part {
        Part::Text { text } => content.push(ContentBlock::text(text.clone())),
        Part::File {
            media_type,
            filename,
            url,
        } => {
            if let Some(block) = convert_file(media_type, filename, url) {
                content.push(block);
            } else {
                tracing::warn!(%media_type, %filename, "dropping file part without inline data");
            }
        }
        Part::Tool {
            tool_name,
            tool_call_id,
            input,
            output,
        } => {
            content.push(ContentBlock::tool_use(
                tool_call_id.clone(),
                tool_name.clone(),
                input.clone(),
            ));

            // A completed round trip also carries the result back to the model
            if let Some(output) = output.as_ref().filter(|output| is_truthy(output)) {
                content.push(ContentBlock::tool_result(
                    tool_call_id.clone(),
                    output.to_string(),
                ));
            }
        }
        Part::Other { kind } => {
            tracing::debug!(%kind, "skipping part kind with no provider representation");
        }
    }
}

fn convert_file(media_type: &str, filename: &str, url: &str) -> Option<ContentBlock> {
    if media_type.starts_with("image") {
        let (mime_type, data) = parse_data_url(url)?;
        Some(ContentBlock::image(mime_type, data))
    } else if media_type.starts_with("text") {
        let (mime_type, data) = parse_data_url(url)?;
        let format = mime_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or(mime_type);

        Some(ContentBlock::DocumentText {
            format: format.to_string(),
            name: filename.to_string(),
            media_type: mime_type.to_string(),
            data: data.to_string(),
        })
    } else {
        None
    }
}

/// Split a `data:<mime>;base64,<payload>` url into its mime type and payload
pub fn parse_data_url(url: &str) -> Option<(&str, &str)> {
    let captures = DATA_URL.captures(url)?;
    let mime_type = captures.get(1)?.as_str();
    let data = captures.get(2)?.as_str();
    Some((mime_type, data))
}

/// Render a document block as the JSON text a provider without document support reads
pub fn document_text(format: &str, name: &str, media_type: &str, data: &str) -> String {
    json!({
        "format": format,
        "name": name,
        "source": {
            "type": "base64",
            "media_type": media_type,
            "data": data,
        }
    })
    .to_string()
}

// Tool outputs count as present only when they hold something
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    fn user(parts: Vec<Part>) -> ClientMessage {
        ClientMessage {
            id: "msg_1".to_string(),
            role: Role::User,
            parts,
        }
    }

    #[test]
    fn test_text_passes_through() {
        let messages = vec![user(vec![Part::text("What is the weather in Tokyo?")])];
        let converted = convert_messages(&messages);

        assert_eq!(
            converted,
            vec![ProviderMessage::new(
                Role::User,
                vec![ContentBlock::text("What is the weather in Tokyo?")]
            )]
        );
    }

    #[test]
    fn test_inline_image_becomes_image_block() {
        let messages = vec![user(vec![Part::file(
            "image/png",
            "cat.png",
            "data:image/png;base64,iVBORw0KGgo=",
        )])];
        let converted = convert_messages(&messages);

        assert_eq!(
            converted[0].content,
            vec![ContentBlock::image("image/png", "iVBORw0KGgo=")]
        );
    }

    #[test]
    fn test_text_file_becomes_document_block() {
        let messages = vec![user(vec![Part::file(
            "text/plain",
            "notes.txt",
            "data:text/plain;base64,dGVzdCBjb250ZW50IGZpbGVzLgo=",
        )])];
        let converted = convert_messages(&messages);

        assert_eq!(
            converted[0].content,
            vec![ContentBlock::DocumentText {
                format: "plain".to_string(),
                name: "notes.txt".to_string(),
                media_type: "text/plain".to_string(),
                data: "dGVzdCBjb250ZW50IGZpbGVzLgo=".to_string(),
            }]
        );
    }

    #[test]
    fn test_message_with_only_unmatched_file_is_omitted() {
        let messages = vec![user(vec![Part::file(
            "image/png",
            "remote.png",
            "https://example.com/remote.png",
        )])];

        assert!(convert_messages(&messages).is_empty());
    }

    #[test]
    fn test_unsupported_media_and_unknown_parts_are_dropped() {
        let messages = vec![user(vec![
            Part::file("application/pdf", "a.pdf", "data:application/pdf;base64,JVBERi0="),
            Part::Other {
                kind: "step-start".to_string(),
            },
            Part::text("kept"),
        ])];
        let converted = convert_messages(&messages);

        assert_eq!(converted[0].content, vec![ContentBlock::text("kept")]);
    }

    #[test]
    fn test_pending_tool_part_yields_only_tool_use() {
        let input = json!({"location": "Tokyo", "unit": "celsius"});
        let messages = vec![ClientMessage {
            id: "msg_2".to_string(),
            role: Role::Assistant,
            parts: vec![Part::tool("get_current_weather", "t1", input.clone(), None)],
        }];
        let converted = convert_messages(&messages);

        assert_eq!(
            converted[0].content,
            vec![ContentBlock::tool_use("t1", "get_current_weather", input)]
        );
    }

    #[test]
    fn test_completed_tool_part_yields_use_then_result() {
        let input = json!({"location": "Tokyo", "unit": "celsius"});
        let output = json!({"temperature": 21, "unit": "celsius", "location": "Tokyo"});
        let messages = vec![ClientMessage {
            id: "msg_2".to_string(),
            role: Role::Assistant,
            parts: vec![
                Part::text("Let me check."),
                Part::tool("get_current_weather", "t1", input.clone(), Some(output.clone())),
            ],
        }];
        let converted = convert_messages(&messages);

        assert_eq!(converted.len(), 1);
        assert_eq!(
            converted[0].content,
            vec![
                ContentBlock::text("Let me check."),
                ContentBlock::tool_use("t1", "get_current_weather", input),
                ContentBlock::tool_result("t1", output.to_string()),
            ]
        );
    }

    #[test]
    fn test_falsy_tool_output_is_not_a_result() {
        for output in [json!(null), json!(""), json!({}), json!([]), json!(0), json!(false)] {
            let messages = vec![user(vec![Part::tool("noop", "t1", json!({}), Some(output))])];
            let converted = convert_messages(&messages);
            assert_eq!(converted[0].content.len(), 1);
        }
    }

    #[test]
    fn test_message_order_is_preserved() {
        let messages = vec![
            user(vec![Part::text("first")]),
            user(vec![Part::file("image/png", "x.png", "not-a-data-url")]),
            ClientMessage {
                id: "msg_3".to_string(),
                role: Role::Assistant,
                parts: vec![Part::text("second")],
            },
        ];
        let converted = convert_messages(&messages);

        let texts: Vec<_> = converted
            .iter()
            .map(|message| message.content[0].as_text().unwrap())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(converted[1].role, Role::Assistant);
    }

    #[test]
    fn test_document_text_keeps_non_ascii() {
        let text = document_text("plain", "résumé.txt", "text/plain", "AAAA");
        assert!(text.contains("résumé.txt"));
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["source"]["media_type"], "text/plain");
    }

    #[test]
    fn test_parse_data_url() {
        assert_eq!(
            parse_data_url("data:image/jpeg;base64,/9j/4AAQ"),
            Some(("image/jpeg", "/9j/4AAQ"))
        );
        assert_eq!(parse_data_url("data:image/jpeg,/9j/4AAQ"), None);
        assert_eq!(parse_data_url("https://example.com/a.jpg"), None);
    }
}
