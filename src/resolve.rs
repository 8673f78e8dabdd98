//! Ambiguous package name resolution via the language model

use crate::llm::{LlmClient, Message};

/// Proposes a concrete package identifier when the package manager
/// reports an ambiguous name. Implemented by the LLM client in
/// production and by scripted fakes in tests.
#[allow(async_fn_in_trait)]
pub trait Resolver {
    async fn resolve(&self, app: &str, pm_name: &str, error_text: &str) -> Option<String>;
}

pub struct LlmResolver<'a> {
    llm: &'a LlmClient,
    model: &'a str,
}

impl<'a> LlmResolver<'a> {
    pub fn new(llm: &'a LlmClient, model: &'a str) -> Self {
        Self { llm, model }
    }
}

impl Resolver for LlmResolver<'_> {
    async fn resolve(&self, app: &str, pm_name: &str, error_text: &str) -> Option<String> {
        let system = "You resolve ambiguous package names for command-line package managers. \
                      Reply with exactly one bare package identifier and nothing else. \
                      If you cannot pick one, reply exactly: none";
        let user = format!(
            "The package manager '{}' could not install '{}' because the name was ambiguous.\n\
             Error output:\n{}\n\
             Which single package identifier should be installed instead?",
            pm_name, app, error_text
        );
        let messages = vec![Message::system(system), Message::user(user)];

        match self.llm.complete(messages, self.model, 0.1).await {
            Ok(reply) => sanitize_candidate(&reply),
            Err(e) => {
                log::warn!("package name resolution failed: {}", e);
                None
            }
        }
    }
}

/// Accept the model's reply only if it looks like a single package
/// identifier. This is the injection-prevention boundary: the value is
/// later passed as a literal process argument.
pub fn sanitize_candidate(reply: &str) -> Option<String> {
    let candidate = reply.trim();
    if candidate.is_empty() || candidate.eq_ignore_ascii_case("none") {
        return None;
    }
    if candidate.chars().any(char::is_whitespace) {
        return None;
    }
    if !candidate
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
    {
        return None;
    }
    Some(candidate.to_string())
}
