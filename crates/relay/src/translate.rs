//! Outbound translation of a provider chunk stream into chat interface events.
//!
//! The provider never marks where a text run or a tool call begins and ends; it only
//! streams fragments. [`StreamState`] keeps the bookkeeping needed to bracket those
//! fragments (one open text run at most, one draft per tool call) and [`translate`]
//! drives it, pausing to run tools when the provider asks for them.
use std::sync::Arc;

use anyhow::Result;
use async_stream::try_stream;
use futures::stream::{BoxStream, Stream, StreamExt};
use serde_json::{json, Value};

use crate::errors::{StreamError, StreamResult};
use crate::models::chunk::{ProviderChunk, StopReason, ToolCallChunk, Usage};
use crate::models::event::{FinishReason, Frame, StreamingEvent, UsageData};
use crate::models::tool::ToolCall;
use crate::systems::Toolbox;

/// A tool call being assembled from streamed argument fragments
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallDraft {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCallDraft {
    /// Parse the accumulated arguments. An empty buffer is a call without arguments.
    pub fn parse_input(&self) -> StreamResult<Value> {
        if self.arguments.trim().is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&self.arguments).map_err(|source| StreamError::MalformedArguments {
            tool_call_id: self.id.clone(),
            source,
        })
    }
}

/// A finalized draft waiting for dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCall {
    pub tool_call_id: String,
    pub name: String,
    pub input: Value,
}

/// What the driver has to do after a chunk has been applied
#[derive(Debug, PartialEq)]
pub enum Outcome {
    Continue,
    /// Run these calls in order, emitting one output event per call
    Dispatch(Vec<PendingCall>),
    /// The usage summary and `finish` went out; no further chunks are read
    Finished,
}

/// Translation state for a single response stream
#[derive(Debug, Default)]
pub struct StreamState {
    message_id: String,
    message_started: bool,
    text_open: bool,
    drafts: Vec<ToolCallDraft>,
    active_draft: Option<usize>,
    // drafts before this index have already been announced and dispatched
    dispatched: usize,
}

impl StreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one provider chunk, pushing the events it produces onto `events`.
    ///
    /// Events pushed before an error are still valid and should be forwarded ahead of
    /// the error.
    pub fn on_chunk(
        &mut self,
        chunk: &ProviderChunk,
        events: &mut Vec<StreamingEvent>,
    ) -> StreamResult<Outcome> {
        if !self.message_started {
            self.message_started = true;
            self.message_id = chunk.id.clone();
            events.push(StreamingEvent::Start {
                message_id: self.message_id.clone(),
            });
        }

        match chunk.stop_reason {
            Some(StopReason::EndTurn) => return Ok(Outcome::Continue),
            Some(StopReason::ToolUse) => {
                events.extend(self.close_text());
                let calls = self.announce_pending(events)?;
                return Ok(Outcome::Dispatch(calls));
            }
            _ => {}
        }

        if !chunk.tool_call_chunks.is_empty() {
            events.extend(self.close_text());
            for fragment in &chunk.tool_call_chunks {
                self.push_fragment(fragment, events)?;
            }
            return Ok(Outcome::Continue);
        }

        if let Some(usage) = chunk.usage {
            events.extend(self.close_text());
            events.push(self.usage_event(usage));
            events.push(StreamingEvent::Finish);
            return Ok(Outcome::Finished);
        }

        if !self.text_open {
            self.text_open = true;
            events.push(StreamingEvent::TextStart {
                id: self.message_id.clone(),
            });
        }
        if !chunk.text.is_empty() {
            events.push(StreamingEvent::TextDelta {
                id: self.message_id.clone(),
                delta: chunk.text.clone(),
            });
        }
        Ok(Outcome::Continue)
    }

    /// Close the open text run, if any
    pub fn close_text(&mut self) -> Option<StreamingEvent> {
        if !self.text_open {
            return None;
        }
        self.text_open = false;
        Some(StreamingEvent::TextEnd {
            id: self.message_id.clone(),
        })
    }

    fn push_fragment(
        &mut self,
        fragment: &ToolCallChunk,
        events: &mut Vec<StreamingEvent>,
    ) -> StreamResult<()> {
        if let Some(id) = fragment.opening_id() {
            let draft = ToolCallDraft {
                id: id.to_string(),
                name: fragment.name.clone().unwrap_or_default(),
                arguments: String::new(),
            };
            tracing::debug!(tool_call_id = %draft.id, tool = %draft.name, "tool call started");
            events.push(StreamingEvent::ToolInputStart {
                tool_call_id: draft.id.clone(),
                tool_name: draft.name.clone(),
            });
            self.drafts.push(draft);
            self.active_draft = Some(self.drafts.len() - 1);
        }

        if fragment.args.is_empty() {
            return Ok(());
        }

        let index = self
            .active_draft
            .ok_or(StreamError::OrphanArgumentFragment)?;
        let draft = &mut self.drafts[index];
        draft.arguments.push_str(&fragment.args);
        events.push(StreamingEvent::ToolInputDelta {
            tool_call_id: draft.id.clone(),
            input_text_delta: fragment.args.clone(),
        });
        Ok(())
    }

    // Every call is announced before any of them runs
    fn announce_pending(
        &mut self,
        events: &mut Vec<StreamingEvent>,
    ) -> StreamResult<Vec<PendingCall>> {
        let mut calls = Vec::new();
        for draft in &self.drafts[self.dispatched..] {
            let input = draft.parse_input()?;
            events.push(StreamingEvent::ToolInputAvailable {
                tool_call_id: draft.id.clone(),
                tool_name: draft.name.clone(),
                input: input.clone(),
            });
            calls.push(PendingCall {
                tool_call_id: draft.id.clone(),
                name: draft.name.clone(),
                input,
            });
        }
        self.dispatched = self.drafts.len();
        Ok(calls)
    }

    fn usage_event(&self, usage: Usage) -> StreamingEvent {
        let finish_reason = if self.drafts.is_empty() {
            FinishReason::Stop
        } else {
            FinishReason::ToolCalls
        };
        StreamingEvent::DataUsage {
            data: UsageData {
                prompt_tokens: usage.input_tokens,
                completion_tokens: usage.output_tokens,
                total_tokens: usage.total_tokens,
                finish_reason,
            },
        }
    }
}

/// Translate a provider chunk stream into chat interface frames.
///
/// Tool calls are dispatched inline, one after another, so nothing else is emitted
/// while a tool runs. The stream ends with [`Frame::Done`] unless it fails; a failure
/// is yielded as the last item, after closing any open text run when the provider
/// itself broke. Dropping the returned stream drops `chunks` with it.
pub fn translate<S>(chunks: S, toolbox: Arc<Toolbox>) -> BoxStream<'static, StreamResult<Frame>>
where
    S: Stream<Item = Result<ProviderChunk>> + Send + 'static,
{
    Box::pin(try_stream! {
        let mut state = StreamState::new();
        let mut events = Vec::new();
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::error!(error = %err, "provider stream failed");
                    if let Some(end) = state.close_text() {
                        yield Frame::Event(end);
                    }
                    Err(StreamError::Provider(err))?
                }
            };

            let outcome = state.on_chunk(&chunk, &mut events);
            for event in events.drain(..) {
                yield Frame::Event(event);
            }

            match outcome? {
                Outcome::Continue => {}
                Outcome::Dispatch(calls) => {
                    for call in calls {
                        let output = toolbox
                            .dispatch(ToolCall::new(call.name, call.input))
                            .await?;
                        yield Frame::Event(StreamingEvent::ToolOutputAvailable {
                            tool_call_id: call.tool_call_id,
                            output,
                        });
                    }
                }
                Outcome::Finished => break,
            }
        }

        if let Some(end) = state.close_text() {
            yield Frame::Event(end);
        }
        yield Frame::Done;
    })
}

/// Plain text rendering of a provider stream: raw text, no framing, ending quietly at
/// the first end of turn.
pub fn translate_text<S>(chunks: S) -> BoxStream<'static, Result<String>>
where
    S: Stream<Item = Result<ProviderChunk>> + Send + 'static,
{
    Box::pin(try_stream! {
        futures::pin_mut!(chunks);

        while let Some(chunk) = chunks.next().await {
            let chunk = chunk?;
            if chunk.stop_reason == Some(StopReason::EndTurn) {
                break;
            }
            if !chunk.text.is_empty() {
                yield chunk.text;
            }
        }
    })
}
