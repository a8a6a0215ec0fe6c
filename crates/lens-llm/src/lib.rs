//! Generative-text provider layer for tickerlens
//!
//! This crate provides provider-agnostic abstractions for requesting text from
//! a large language model:
//!
//! - Message types for the conversation
//! - Completion request/response types
//! - The [`LLMProvider`] trait
//! - Concrete providers (behind feature flags)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(any(feature = "gemini", feature = "openai"))]
pub mod providers;
