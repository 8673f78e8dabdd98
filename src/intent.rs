//! Intent classification — free text to a typed action
//!
//! The language model is only trusted to emit one of a fixed set of
//! canonical prefixes; its reply is immediately parsed into an `Intent`
//! variant so the dispatcher matches on tags, never on substrings.

use crate::llm::{LlmClient, Message};

const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant that translates user prompts into specific actions. Your name is 'SANE'
You must ONLY answer with one of these formats:
- install <app>
- open <app>
- send email
- remember <info>
- recall <info>
- play music
If none fit, reply exactly as: chat <original prompt>
NEVER add anything else.";

/// The canonical actions the dispatcher knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Install { app: String },
    Open { target: String },
    SendEmail,
    Remember { fact: String },
    Recall { query: Option<String> },
    PlayMusic,
    Chat { text: String },
}

/// Strip a leading keyword if it is followed by a word boundary.
/// "open youtube" matches "open"; "openly whatever" does not.
fn strip_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    if input.len() < keyword.len() || !input.is_char_boundary(keyword.len()) {
        return None;
    }
    let (head, rest) = input.split_at(keyword.len());
    if head.eq_ignore_ascii_case(keyword)
        && (rest.is_empty() || rest.starts_with(char::is_whitespace))
    {
        Some(rest.trim_start())
    } else {
        None
    }
}

impl Intent {
    /// Parse a canonical action string. Keyword match at the front,
    /// case-insensitive, fixed priority; anything unmatched falls through
    /// to Chat with the input untouched.
    pub fn parse(canonical: &str) -> Self {
        let trimmed = canonical.trim();

        if let Some(rest) = strip_keyword(trimmed, "install") {
            return Self::Install {
                app: rest.to_lowercase(),
            };
        }
        if let Some(rest) = strip_keyword(trimmed, "open") {
            return Self::Open {
                target: rest.to_lowercase(),
            };
        }
        if strip_keyword(trimmed, "send email").is_some() {
            return Self::SendEmail;
        }
        if let Some(rest) = strip_keyword(trimmed, "remember") {
            // Keep the fact's original casing; only the keyword is matched
            // case-insensitively.
            return Self::Remember {
                fact: rest.to_string(),
            };
        }
        if let Some(rest) = strip_keyword(trimmed, "recall") {
            return Self::Recall {
                query: if rest.is_empty() {
                    None
                } else {
                    Some(rest.to_string())
                },
            };
        }
        if strip_keyword(trimmed, "play music").is_some() {
            return Self::PlayMusic;
        }
        Self::Chat {
            text: trimmed.to_string(),
        }
    }
}

/// Ask the model for a canonical action, then parse it. A reply outside
/// the recognized vocabulary, or a failed call, degrades to chat with the
/// user's original words.
pub async fn classify(llm: &LlmClient, model: &str, prompt: &str) -> Intent {
    let messages = vec![
        Message::system(CLASSIFIER_SYSTEM_PROMPT),
        Message::user(prompt),
    ];
    match llm.complete(messages, model, 0.1).await {
        Ok(reply) => {
            let action = reply.trim().to_lowercase();
            log::debug!("classifier decided: {}", action);
            match Intent::parse(&action) {
                // The parser's chat fallthrough would carry the model's
                // raw reply; chat should carry what the user actually said.
                Intent::Chat { .. } => Intent::Chat {
                    text: prompt.trim().to_string(),
                },
                intent => intent,
            }
        }
        Err(e) => {
            log::warn!("intent classification failed, falling back to chat: {}", e);
            Intent::Chat {
                text: prompt.trim().to_string(),
            }
        }
    }
}
