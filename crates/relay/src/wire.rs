use bytes::Bytes;

use crate::models::event::Frame;

/// Record for the end-of-transmission sentinel
pub const DONE_RECORD: &str = "data: [DONE]\n\n";

/// Encode a frame as one server-sent-events record: `data: <json>\n\n`
pub fn encode(frame: &Frame) -> serde_json::Result<Bytes> {
    match frame {
        Frame::Event(event) => {
            let json = serde_json::to_string(event)?;
            Ok(Bytes::from(format!("data: {}\n\n", json)))
        }
        Frame::Done => Ok(Bytes::from_static(DONE_RECORD.as_bytes())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::StreamingEvent;

    #[test]
    fn test_event_record() {
        let frame = Frame::Event(StreamingEvent::TextDelta {
            id: "msg_1".to_string(),
            delta: "line one\nline two".to_string(),
        });

        let record = encode(&frame).unwrap();
        assert_eq!(
            record,
            Bytes::from("data: {\"type\":\"text-delta\",\"id\":\"msg_1\",\"delta\":\"line one\\nline two\"}\n\n")
        );
    }

    #[test]
    fn test_record_is_single_line() {
        let frame = Frame::Event(StreamingEvent::ToolOutputAvailable {
            tool_call_id: "t1".to_string(),
            output: serde_json::json!({"nested": {"text": "a\nb"}}),
        });

        let record = encode(&frame).unwrap();
        let text = std::str::from_utf8(&record).unwrap();
        assert!(text.starts_with("data: {"));
        assert!(text.ends_with("}\n\n"));
        assert_eq!(text.matches('\n').count(), 2);
    }

    #[test]
    fn test_done_record() {
        assert_eq!(encode(&Frame::Done).unwrap(), Bytes::from("data: [DONE]\n\n"));
    }

    #[test]
    fn test_finish_record() {
        let record = encode(&Frame::Event(StreamingEvent::Finish)).unwrap();
        assert_eq!(record, Bytes::from("data: {\"type\":\"finish\"}\n\n"));
    }
}
