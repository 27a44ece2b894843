//! These models represent the objects passed through the relay
//!
//! There are several different related formats we need to interact with:
//! - ui message parts, sent from the chat interface to the relay
//! - ui stream events, sent from the relay back to the chat interface
//! - provider content blocks, sent from the relay to the LLM
//! - provider stream chunks, sent from the LLM to the relay
//! - tool calls, sent from the relay to the systems providing capabilities
//!
//! Each boundary gets its own types. Conversions between them live in `convert`
//! (inbound) and `translate` (outbound), never in the models themselves.
pub mod chunk;
pub mod content;
pub mod event;
pub mod part;
pub mod role;
pub mod tool;
