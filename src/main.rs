mod chat;
mod command;
mod config;
mod email;
mod install;
mod intent;
mod knowledge;
mod llm;
mod memory;
mod package_manager;
mod resolve;
mod router;
mod web;

use anyhow::Result;
use command::{StdinConfirmer, SystemRunner};
use std::io::{BufRead, Write};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let config = config::Config::load_or_default()?;

    // API key priority: config file > environment variable
    let api_key = config
        .api_key
        .clone()
        .or_else(|| std::env::var("GROQ_API_KEY").ok())
        .unwrap_or_else(|| {
            eprintln!("error: no API key configured");
            eprintln!("set api_key in ~/.config/sane/config.toml");
            eprintln!("or export GROQ_API_KEY='your-api-key'");
            std::process::exit(1);
        });

    let classifier_model = config.classifier_model.clone();
    let llm = llm::LlmClient::new(api_key);
    let mut session = router::Session::new(config, llm, SystemRunner, StdinConfirmer);

    println!("Assistant: Hello! I am SANE. How can I help you today?");

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }
        if matches!(prompt.to_lowercase().as_str(), "exit" | "quit" | "bye") {
            println!("Assistant: Goodbye!");
            break;
        }

        let decided = intent::classify(&session.llm, &classifier_model, prompt).await;
        log::debug!("routing intent: {:?}", decided);
        let response = session.route(decided).await;
        println!("Assistant: {}", response);
    }

    Ok(())
}
