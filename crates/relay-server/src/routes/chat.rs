use crate::state::AppState;
use async_stream::stream;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use futures::{
    stream::{BoxStream, StreamExt, TryStreamExt},
    Stream,
};
use relay::{
    convert::convert_messages,
    errors::StreamResult,
    models::{
        content::{ContentBlock, ProviderMessage},
        event::{Frame, StreamingEvent},
        part::ClientMessage,
        role::Role,
    },
    translate::{translate, translate_text},
    wire,
};
use serde::Deserialize;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

// Types matching the incoming JSON structure
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    id: Option<String>,
    messages: Vec<ClientMessage>,
    #[serde(default)]
    trigger: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Protocol {
    #[default]
    Data,
    Text,
}

#[derive(Debug, Deserialize)]
struct ChatQuery {
    #[serde(default)]
    protocol: Protocol,
}

// Custom SSE response type that implements the Vercel AI SDK protocol
pub struct SseResponse {
    records: BoxStream<'static, Result<Bytes, Infallible>>,
}

impl SseResponse {
    fn new(records: BoxStream<'static, Result<Bytes, Infallible>>) -> Self {
        Self { records }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.records.as_mut().poll_next(cx)
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let body = Body::from_stream(self);

        (
            [
                (header::CONTENT_TYPE, "text/event-stream"),
                (header::CACHE_CONTROL, "no-cache"),
                (header::CONNECTION, "keep-alive"),
                (header::HeaderName::from_static("x-vercel-ai-data-stream"), "v1"),
            ],
            body,
        )
            .into_response()
    }
}

// Encode translated frames as records; a failure becomes one error record and ends the body
fn data_records(
    mut frames: BoxStream<'static, StreamResult<Frame>>,
) -> BoxStream<'static, Result<Bytes, Infallible>> {
    Box::pin(stream! {
        while let Some(frame) = frames.next().await {
            let (frame, last) = match frame {
                Ok(frame) => (frame, false),
                Err(err) => {
                    tracing::error!(error = %err, "chat stream failed");
                    (Frame::Event(StreamingEvent::error(err.to_string())), true)
                }
            };

            match wire::encode(&frame) {
                Ok(record) => yield Ok(record),
                Err(err) => {
                    tracing::error!(error = %err, "failed to encode stream record");
                    break;
                }
            }

            if last {
                break;
            }
        }
    })
}

async fn handler(
    State(state): State<AppState>,
    Query(query): Query<ChatQuery>,
    Json(request): Json<ChatRequest>,
) -> Result<Response, StatusCode> {
    tracing::info!(
        chat_id = request.id.as_deref().unwrap_or("-"),
        trigger = request.trigger.as_deref().unwrap_or("-"),
        messages = request.messages.len(),
        protocol = ?query.protocol,
        "chat request"
    );

    let mut messages = Vec::new();
    if let Some(prompt) = state.toolbox.system_prompt() {
        messages.push(ProviderMessage::new(Role::System, vec![ContentBlock::text(prompt)]));
    }
    messages.extend(convert_messages(&request.messages));
    let tools = state.toolbox.tools();

    let chunks = state
        .provider
        .stream(&messages, &tools)
        .await
        .map_err(|e| {
            tracing::error!("Failed to start provider stream: {}", e);
            StatusCode::BAD_GATEWAY
        })?;

    let response = match query.protocol {
        Protocol::Data => {
            let frames = translate(chunks, state.toolbox.clone());
            SseResponse::new(data_records(frames)).into_response()
        }
        Protocol::Text => {
            let text = translate_text(chunks)
                .inspect_err(|e| tracing::error!("Text stream failed: {}", e))
                .map_ok(Bytes::from);
            (
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                Body::from_stream(text),
            )
                .into_response()
        }
    };

    Ok(response)
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}
