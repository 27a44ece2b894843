use anyhow::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::models::chunk::ProviderChunk;
use crate::models::content::ProviderMessage;
use crate::models::tool::Tool;

/// The incremental response of a provider. The upstream connection lives as long as
/// the stream does.
pub type ChunkStream = BoxStream<'static, Result<ProviderChunk>>;

/// Base trait for streaming model providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Start streaming the next assistant message for the conversation.
    ///
    /// Errors returned here happen before any chunk is produced (connection refused,
    /// rejected request); errors inside the stream are mid-response failures.
    async fn stream(&self, messages: &[ProviderMessage], tools: &[Tool]) -> Result<ChunkStream>;
}
