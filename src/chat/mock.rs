//! Mock chat backend for session and HTTP tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use super::client::ChatBackend;

/// Returns a canned reply and records every system prompt it was given.
pub struct MockChatBackend {
    reply: String,
    should_fail: bool,
    prompts: Mutex<Vec<String>>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self {
            reply: "mock reply".to_string(),
            should_fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    /// Configure the mock to fail every request.
    pub fn failing(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// System prompts of every completion request, in order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("mock lock poisoned").clone()
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, system_prompt: &str, _user_message: &str) -> Result<String> {
        self.prompts
            .lock()
            .expect("mock lock poisoned")
            .push(system_prompt.to_string());

        if self.should_fail {
            Err(anyhow!("mock chat failure"))
        } else {
            Ok(self.reply.clone())
        }
    }
}
