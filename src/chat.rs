//! Open-ended chat fallback with a per-session conversation buffer

use crate::llm::{LlmClient, Message};

const CHAT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

/// Conversation history owned by the caller and threaded through every
/// chat turn. Nothing here is process-global.
pub struct ChatSession {
    history: Vec<Message>,
    temperature: f32,
}

impl ChatSession {
    pub fn new(temperature: f32) -> Self {
        Self {
            history: vec![Message::system(CHAT_SYSTEM_PROMPT)],
            temperature,
        }
    }

    #[cfg(test)]
    pub fn turns(&self) -> usize {
        self.history.len()
    }

    #[cfg(test)]
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub async fn handle(&mut self, llm: &LlmClient, model: &str, prompt: &str) -> String {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return "Please provide something to chat about.".to_string();
        }

        self.history.push(Message::user(prompt));
        match llm.complete(self.history.clone(), model, self.temperature).await {
            Ok(reply) => {
                let reply = reply.trim().to_string();
                self.history.push(Message::assistant(reply.clone()));
                reply
            }
            Err(e) => {
                log::warn!("chat completion failed: {}", e);
                // Drop the unanswered user turn.
                self.history.pop();
                "Sorry, I couldn't reach the language model right now.".to_string()
            }
        }
    }
}
