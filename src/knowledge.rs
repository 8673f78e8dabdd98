//! Remember / recall over the persisted fact log

use crate::memory::FactLog;

pub fn remember(facts: &mut FactLog, fact: &str) -> String {
    let fact = fact.trim();
    if fact.is_empty() {
        return "What should I remember?".to_string();
    }
    facts.append(fact);
    format!("I will remember that: '{}'", fact)
}

pub fn recall(facts: &FactLog, query: Option<&str>) -> String {
    match query {
        None => {
            if facts.is_empty() {
                "I don't have any memories yet.".to_string()
            } else {
                let lines: Vec<String> = facts
                    .records()
                    .iter()
                    .map(|r| format!("- {}", r.data))
                    .collect();
                format!("Here are all my memories:\n{}", lines.join("\n"))
            }
        }
        Some(query) => {
            let matches = facts.search(query);
            if matches.is_empty() {
                format!("I couldn't find any memories related to '{}'.", query)
            } else {
                let lines: Vec<String> =
                    matches.iter().map(|m| format!("- {}", m)).collect();
                format!("Here's what I found:\n{}", lines.join("\n"))
            }
        }
    }
}
