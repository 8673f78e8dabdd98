//! Dispatch — one typed intent in, one handler out, one response back

use crate::chat::ChatSession;
use crate::command::{Confirmer, ProcessRunner};
use crate::config::Config;
use crate::email;
use crate::install::Installer;
use crate::intent::Intent;
use crate::knowledge;
use crate::llm::LlmClient;
use crate::memory::{FactLog, PathCache};
use crate::package_manager::PackageManager;
use crate::resolve::LlmResolver;
use crate::web;

/// Caller-owned state threaded through every handled turn: the config,
/// the LLM handle, the I/O channels and the chat buffer. The persisted
/// stores are re-read from disk at the start of each call that touches
/// them and written back whole after mutation.
pub struct Session<R, C> {
    pub config: Config,
    pub llm: LlmClient,
    pub runner: R,
    pub confirmer: C,
    pub chat: ChatSession,
}

impl<R, C> Session<R, C>
where
    R: ProcessRunner,
    C: Confirmer,
{
    pub fn new(config: Config, llm: LlmClient, runner: R, confirmer: C) -> Self {
        let chat = ChatSession::new(config.temperature);
        Self {
            config,
            llm,
            runner,
            confirmer,
            chat,
        }
    }

    /// Exactly one handler runs per call. Malformed or adversarial
    /// input can only ever reach the chat fallback.
    pub async fn route(&mut self, intent: Intent) -> String {
        match intent {
            Intent::Install { app } => {
                let pm = PackageManager::detect();
                let mut cache = PathCache::load(&self.config.cache_file());
                let resolver = LlmResolver::new(&self.llm, &self.config.classifier_model);
                let mut installer = Installer::new(
                    &self.config.whitelist,
                    pm,
                    &mut cache,
                    &self.runner,
                    &self.confirmer,
                    &resolver,
                );
                installer.install(&app).await
            }
            Intent::Open { target } => web::open(&self.runner, &target),
            Intent::SendEmail => email::send_email(&self.runner),
            Intent::Remember { fact } => {
                let mut facts = FactLog::load(&self.config.fact_file());
                knowledge::remember(&mut facts, &fact)
            }
            Intent::Recall { query } => {
                let facts = FactLog::load(&self.config.fact_file());
                knowledge::recall(&facts, query.as_deref())
            }
            Intent::PlayMusic => "Sorry, I can't play music yet.".to_string(),
            Intent::Chat { text } => {
                self.chat
                    .handle(&self.llm, &self.config.model, &text)
                    .await
            }
        }
    }
}
