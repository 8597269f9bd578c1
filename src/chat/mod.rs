pub mod client;
pub mod messages;
mod mock;

pub use client::{system_prompt, ChatBackend, ChatClient, FALLBACK_REPLY};
pub use messages::{AudiobookContext, ChatMessage, Role};
pub use mock::MockChatBackend;
