//! Open a website in the user's default browser

use crate::command::{CommandResult, ProcessRunner};

/// Turn an "open" target into a URL. Full URLs pass through; bare names
/// become https://www.<name>.com.
pub fn target_to_url(target: &str) -> String {
    let site = target.trim().to_lowercase();
    if site.starts_with("http") || site.starts_with("www") {
        site
    } else {
        format!("https://www.{}.com", site)
    }
}

/// The platform's URL opener, invoked as a discrete argv like every
/// other external command.
fn opener_argv(url: &str) -> Vec<&str> {
    if cfg!(target_os = "windows") {
        vec!["cmd", "/C", "start", "", url]
    } else if cfg!(target_os = "macos") {
        vec!["open", url]
    } else {
        vec!["xdg-open", url]
    }
}

pub fn open(runner: &impl ProcessRunner, target: &str) -> String {
    if target.trim().is_empty() {
        return "What should I open?".to_string();
    }
    let url = target_to_url(target);
    let result = open_url(runner, &url);
    if result.success {
        format!("Opened {}", url)
    } else {
        log::warn!("failed to open {}: {}", url, result.stderr);
        format!("Sorry, I couldn't open {}.", url)
    }
}

pub fn open_url(runner: &impl ProcessRunner, url: &str) -> CommandResult {
    runner.run(&opener_argv(url))
}
