//! Hand off email composition to the default mail client

use crate::command::ProcessRunner;
use crate::web;

/// Open the user's mail client with a blank draft. The assistant does
/// not send mail itself; composing and sending stay with the user.
pub fn send_email(runner: &impl ProcessRunner) -> String {
    let result = web::open_url(runner, "mailto:");
    if result.success {
        "I've opened your mail client so you can write the email.".to_string()
    } else {
        log::warn!("failed to open mail client: {}", result.stderr);
        "Sorry, I couldn't open your mail client.".to_string()
    }
}
