//! External process execution — uniform results, argv discipline

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

/// Outcome of one external command invocation.
///
/// Every decision point downstream branches on this value; process
/// failures are captured here, never raised.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    /// stdout and stderr joined, for marker scans.
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// A result for a command that could not even be spawned.
    pub fn spawn_failure(err: &str) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: err.to_string(),
            exit_code: -1,
        }
    }
}

/// Process execution channel. Arguments are always a discrete list,
/// never a shell string.
pub trait ProcessRunner {
    fn run(&self, argv: &[&str]) -> CommandResult;
}

/// Runs commands on the host via std::process.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, argv: &[&str]) -> CommandResult {
        let Some((program, args)) = argv.split_first() else {
            return CommandResult::spawn_failure("empty command");
        };
        match Command::new(program).args(args).output() {
            Ok(output) => CommandResult {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code().unwrap_or(-1),
            },
            Err(e) => {
                log::warn!("failed to spawn {:?}: {}", argv, e);
                CommandResult::spawn_failure(&e.to_string())
            }
        }
    }
}

/// Look up an executable on PATH. On Windows the bare name is also
/// tried with a fixed exe/cmd/bat extension list.
pub fn which(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
        if cfg!(windows) {
            for ext in ["exe", "cmd", "bat"] {
                let with_ext = dir.join(format!("{}.{}", name, ext));
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }
    }
    None
}

/// Interactive yes/no confirmation channel.
pub trait Confirmer {
    fn ask_yes_no(&self, prompt: &str) -> bool;
}

/// Reads the answer from stdin. Only "y" / "yes" (any case, trimmed)
/// count as affirmative; anything else is a decline.
pub struct StdinConfirmer;

impl Confirmer for StdinConfirmer {
    fn ask_yes_no(&self, prompt: &str) -> bool {
        print!("{} [y/N]: ", prompt);
        let _ = std::io::stdout().flush();
        let mut answer = String::new();
        if std::io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}
