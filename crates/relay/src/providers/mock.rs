use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::stream;
use std::sync::{Arc, Mutex};

use crate::models::chunk::{ProviderChunk, StopReason, Usage};
use crate::models::content::ProviderMessage;
use crate::models::tool::Tool;
use crate::providers::base::{ChunkStream, Provider};

/// A mock provider that replays a scripted chunk sequence for every request
#[derive(Default)]
pub struct MockProvider {
    chunks: Vec<ProviderChunk>,
    failure: Option<String>,
    refusal: Option<String>,
    requests: Arc<Mutex<Vec<Vec<ProviderMessage>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of chunks
    pub fn new(chunks: Vec<ProviderChunk>) -> Self {
        Self {
            chunks,
            ..Default::default()
        }
    }

    /// A plain text answer followed by an end of turn and usage totals
    pub fn with_text<S: Into<String>>(text: S) -> Self {
        let id = format!("msg_{}", uuid::Uuid::new_v4().simple());
        Self::new(vec![
            ProviderChunk::text(id.clone(), text),
            ProviderChunk::stop(id.clone(), StopReason::EndTurn),
            ProviderChunk::usage(id, Usage::new(0, 0, 0)),
        ])
    }

    /// Break the stream with `message` after the scripted chunks
    pub fn failing_after<S: Into<String>>(mut self, message: S) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Reject every request before streaming starts
    pub fn refusing<S: Into<String>>(message: S) -> Self {
        Self {
            refusal: Some(message.into()),
            ..Default::default()
        }
    }

    /// Conversations this provider has been asked to continue, oldest first
    pub fn requests(&self) -> Vec<Vec<ProviderMessage>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn stream(&self, messages: &[ProviderMessage], _tools: &[Tool]) -> Result<ChunkStream> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }

        if let Some(refusal) = &self.refusal {
            return Err(anyhow!("{}", refusal));
        }

        let mut items: Vec<Result<ProviderChunk>> = self.chunks.iter().cloned().map(Ok).collect();
        if let Some(failure) = &self.failure {
            items.push(Err(anyhow!("{}", failure)));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}
