//! The install pipeline: whitelist → probe → installed-check → confirm
//! → install → ambiguity retry → report
//!
//! Control flow is entirely branch-based on `CommandResult` values;
//! nothing in here raises. At most two install commands ever run per
//! call and at most two confirmations are asked. There is no rollback:
//! failures are reported, not corrected.

use crate::command::{CommandResult, Confirmer, ProcessRunner};
use crate::memory::PathCache;
use crate::package_manager::PackageManager;
use crate::resolve::Resolver;
use std::path::{Path, PathBuf};

/// Substrings in a package manager's failure output that indicate the
/// requested name matched more than one package.
const AMBIGUITY_MARKERS: [&str; 2] = ["multiple packages found", "refine the input"];

/// Known installer exit codes with a human-readable reason. Purely
/// presentational.
const KNOWN_EXIT_CODES: [(i32, &str); 3] = [
    // winget 0x8A150014
    (-1978335212, "No package found matching the given name."),
    // winget 0x8A150050
    (-1978335152, "Network failure while contacting the package source (DNS or connectivity)."),
    // winget 0x8A150049
    (-1978335159, "The configured package source could not be reached."),
];

/// Applications the assistant may ever install. Anything else is
/// rejected before a single process is spawned.
pub const DEFAULT_WHITELIST: [&str; 10] = [
    "chrome", "firefox", "vlc", "git", "python", "nodejs", "vscode", "zoom", "slack", "spotify",
];

/// Bounded retry: at most `max_attempts` install invocations, a retry
/// only when the predicate accepts the failed result.
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub should_retry: fn(&CommandResult) -> bool,
}

impl RetryPolicy {
    /// The one policy the installer uses today: a single ambiguity-driven
    /// retry on top of the initial attempt.
    pub fn ambiguity() -> Self {
        Self {
            max_attempts: 2,
            should_retry: has_ambiguity_marker,
        }
    }
}

pub fn has_ambiguity_marker(result: &CommandResult) -> bool {
    let combined = result.combined_output().to_lowercase();
    AMBIGUITY_MARKERS.iter().any(|m| combined.contains(m))
}

pub struct Installer<'a, R, C, V> {
    whitelist: &'a [String],
    pm: Option<PackageManager>,
    cache: &'a mut PathCache,
    runner: &'a R,
    confirmer: &'a C,
    resolver: &'a V,
    /// PATH lookup, injectable so tests can simulate hosts.
    path_lookup: fn(&str) -> Option<PathBuf>,
}

impl<'a, R, C, V> Installer<'a, R, C, V>
where
    R: ProcessRunner,
    C: Confirmer,
    V: Resolver,
{
    pub fn new(
        whitelist: &'a [String],
        pm: Option<PackageManager>,
        cache: &'a mut PathCache,
        runner: &'a R,
        confirmer: &'a C,
        resolver: &'a V,
    ) -> Self {
        Self {
            whitelist,
            pm,
            cache,
            runner,
            confirmer,
            resolver,
            path_lookup: crate::command::which,
        }
    }

    #[cfg(test)]
    fn with_path_lookup(mut self, lookup: fn(&str) -> Option<PathBuf>) -> Self {
        self.path_lookup = lookup;
        self
    }

    /// Install one whitelisted application, end to end. Always returns a
    /// user-facing message; never errors.
    pub async fn install(&mut self, app_name: &str) -> String {
        let app = app_name.trim().to_lowercase();

        if !self.whitelist.iter().any(|w| w == &app) {
            return format!("'{}' is not whitelisted for installation.", app);
        }

        let Some(pm) = self.pm else {
            return "No supported package manager found on this system.".to_string();
        };

        if self.is_installed(&app, pm) {
            return format!("'{}' is already installed.", app);
        }

        if !self
            .confirmer
            .ask_yes_no(&format!("Install '{}' using {}?", app, pm.name()))
        {
            return format!("Installation of '{}' cancelled by user.", app);
        }

        let policy = RetryPolicy::ambiguity();
        let mut pkg = app.clone();
        let mut resolved: Option<String> = None;

        for attempt in 1..=policy.max_attempts {
            let argv = pm.install_argv(&pkg);
            log::info!("install attempt {} for '{}': {:?}", attempt, app, argv);
            let result = self.runner.run(&argv);

            if result.success {
                self.cache_discovered_path(&app);
                return match &resolved {
                    Some(id) => format!("Successfully installed '{}' (as package '{}').", app, id),
                    None => format!("Successfully installed '{}'.", app),
                };
            }

            if attempt >= policy.max_attempts || !(policy.should_retry)(&result) {
                return format_error(&app, &result, resolved.as_deref());
            }

            // Ambiguous name: ask the model for a concrete identifier and
            // let the user approve exactly one retry with it.
            let candidate = match self
                .resolver
                .resolve(&app, pm.name(), &result.combined_output())
                .await
            {
                Some(candidate) => candidate,
                None => return format_error(&app, &result, None),
            };
            if !self.confirmer.ask_yes_no(&format!(
                "The name '{}' was ambiguous. Retry with package '{}'?",
                app, candidate
            )) {
                // The candidate was offered, never run.
                let mut message = format_error(&app, &result, None);
                message.push_str(&format!("\nRetry with package '{}' was declined.", candidate));
                return message;
            }
            resolved = Some(candidate.clone());
            pkg = candidate;
        }

        unreachable!("install loop exited without a terminal message")
    }

    /// Whether the app is already present. Short-circuits on the first
    /// positive check: path cache, PATH lookup, package manager query.
    fn is_installed(&mut self, app: &str, pm: PackageManager) -> bool {
        let stale = match self.cache.get(app) {
            Some(cached) if Path::new(cached).exists() => return true,
            Some(_) => true,
            None => false,
        };
        if stale {
            // Evict and persist before the next check runs.
            log::info!("cached path for '{}' vanished, evicting", app);
            self.cache.remove(app);
        }

        if let Some(found) = (self.path_lookup)(app) {
            self.cache.insert(app, &found.to_string_lossy());
            return true;
        }

        let result = self.runner.run(&pm.check_argv(app));
        match pm.check_success_marker() {
            Some(marker) => result.success && result.stdout.contains(marker),
            None => {
                result.success
                    && result
                        .stdout
                        .to_lowercase()
                        .contains(&app.to_lowercase())
            }
        }
    }

    /// After a successful install, remember where the binary landed (if
    /// it is discoverable at all).
    fn cache_discovered_path(&mut self, app: &str) {
        if let Some(found) = (self.path_lookup)(app) {
            self.cache.insert(app, &found.to_string_lossy());
        }
    }
}

/// Deterministic failure report: known-exit-code reason, raw stderr,
/// raw stdout, exit code.
pub fn format_error(app: &str, result: &CommandResult, resolved_id: Option<&str>) -> String {
    let mut message = format!("Failed to install '{}'.", app);
    if let Some((_, reason)) = KNOWN_EXIT_CODES
        .iter()
        .find(|(code, _)| *code == result.exit_code)
    {
        message.push_str(&format!("\nReason: {}", reason));
    }
    if let Some(id) = resolved_id {
        message.push_str(&format!("\nResolved package tried: '{}'.", id));
    }
    if !result.stderr.trim().is_empty() {
        message.push_str(&format!("\nError: {}", result.stderr.trim()));
    }
    if !result.stdout.trim().is_empty() {
        message.push_str(&format!("\nOutput: {}", result.stdout.trim()));
    }
    message.push_str(&format!("\nExit code: {}", result.exit_code));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    fn whitelist() -> Vec<String> {
        DEFAULT_WHITELIST.iter().map(|s| s.to_string()).collect()
    }

    fn ok(stdout: &str) -> CommandResult {
        CommandResult {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_code: 0,
        }
    }

    fn fail(stderr: &str, exit_code: i32) -> CommandResult {
        CommandResult {
            success: false,
            stdout: String::new(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    /// Replays a scripted sequence of results and records every argv.
    struct ScriptedRunner {
        results: RefCell<VecDeque<CommandResult>>,
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        fn new(results: Vec<CommandResult>) -> Self {
            Self {
                results: RefCell::new(results.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn call(&self, idx: usize) -> Vec<String> {
            self.calls.borrow()[idx].clone()
        }
    }

    impl ProcessRunner for ScriptedRunner {
        fn run(&self, argv: &[&str]) -> CommandResult {
            self.calls
                .borrow_mut()
                .push(argv.iter().map(|s| s.to_string()).collect());
            self.results
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| fail("unexpected invocation", 1))
        }
    }

    struct ScriptedConfirmer {
        answers: RefCell<VecDeque<bool>>,
        asked: RefCell<usize>,
    }

    impl ScriptedConfirmer {
        fn new(answers: Vec<bool>) -> Self {
            Self {
                answers: RefCell::new(answers.into()),
                asked: RefCell::new(0),
            }
        }

        fn times_asked(&self) -> usize {
            *self.asked.borrow()
        }
    }

    impl Confirmer for ScriptedConfirmer {
        fn ask_yes_no(&self, _prompt: &str) -> bool {
            *self.asked.borrow_mut() += 1;
            self.answers.borrow_mut().pop_front().unwrap_or(false)
        }
    }

    struct FixedResolver {
        candidate: Option<String>,
        calls: RefCell<usize>,
    }

    impl FixedResolver {
        fn new(candidate: Option<&str>) -> Self {
            Self {
                candidate: candidate.map(|s| s.to_string()),
                calls: RefCell::new(0),
            }
        }

        fn times_called(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Resolver for FixedResolver {
        async fn resolve(&self, _app: &str, _pm: &str, _error: &str) -> Option<String> {
            *self.calls.borrow_mut() += 1;
            self.candidate.clone()
        }
    }

    fn no_path(_: &str) -> Option<PathBuf> {
        None
    }

    #[tokio::test]
    async fn non_whitelisted_app_is_rejected_with_zero_spawns() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("install notepad").await;
        // Normalization lowercases and trims but does not strip keywords;
        // the router hands over the bare app name.
        assert_eq!(response, "'install notepad' is not whitelisted for installation.");
        assert_eq!(runner.call_count(), 0);

        let response = installer.install("notepad").await;
        assert_eq!(response, "'notepad' is not whitelisted for installation.");
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_package_manager_is_terminal_with_zero_spawns() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer =
            Installer::new(&wl, None, &mut cache, &runner, &confirmer, &resolver)
                .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert_eq!(response, "No supported package manager found on this system.");
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn valid_cached_path_short_circuits_without_any_process() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![]);
        let confirmer = ScriptedConfirmer::new(vec![]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();

        // A cached path that really exists on disk.
        let binary = dir.path().join("chrome");
        std::fs::write(&binary, "").unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));
        cache.insert("chrome", &binary.to_string_lossy());

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert_eq!(response, "'chrome' is already installed.");
        assert_eq!(runner.call_count(), 0);
        assert_eq!(confirmer.times_asked(), 0);
    }

    #[tokio::test]
    async fn stale_cached_path_is_evicted_and_persisted() {
        let wl = whitelist();
        // Check query comes back empty, install declined afterwards.
        let runner = ScriptedRunner::new(vec![ok("")]);
        let confirmer = ScriptedConfirmer::new(vec![false]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let cache_file = dir.path().join("cache.json");

        let mut cache = PathCache::load(&cache_file);
        cache.insert("chrome", &dir.path().join("gone").to_string_lossy());

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let _ = installer.install("chrome").await;

        let reloaded = PathCache::load(&cache_file);
        assert!(reloaded.get("chrome").is_none());
    }

    #[tokio::test]
    async fn declined_confirmation_runs_zero_install_commands() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![fail("", 1)]);
        let confirmer = ScriptedConfirmer::new(vec![false]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert_eq!(response, "Installation of 'chrome' cancelled by user.");
        // Only the installed-check query ran, never an install.
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.call(0)[..2], ["winget".to_string(), "list".to_string()]);
    }

    #[tokio::test]
    async fn windows_install_succeeds_after_exactly_two_invocations() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("", 1),                            // installed-check: not found
            ok("Successfully installed chrome"),    // install
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert_eq!(response, "Successfully installed 'chrome'.");
        assert_eq!(runner.call_count(), 2);
        assert_eq!(
            runner.call(1),
            vec![
                "winget",
                "install",
                "--accept-package-agreements",
                "--accept-source-agreements",
                "chrome"
            ]
        );
        // First attempt succeeded: the resolver was never consulted.
        assert_eq!(resolver.times_called(), 0);
    }

    #[tokio::test]
    async fn apt_install_uses_sudo_and_dpkg_status_check() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("package git is not installed", 1), // dpkg -s
            ok("Setting up git"),                    // apt-get install
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Apt),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("git").await;
        assert_eq!(response, "Successfully installed 'git'.");
        assert_eq!(runner.call(0), vec!["dpkg", "-s", "git"]);
        assert_eq!(runner.call(1), vec!["sudo", "apt-get", "install", "-y", "git"]);
    }

    #[tokio::test]
    async fn ambiguity_triggers_exactly_one_resolved_retry() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("", 1),                                       // installed-check
            fail("Multiple packages found matching input criteria. Please refine the input.", 1),
            ok("Successfully installed Google.Chrome"),        // retry
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true, true]);
        let resolver = FixedResolver::new(Some("Google.Chrome"));
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert_eq!(
            response,
            "Successfully installed 'chrome' (as package 'Google.Chrome')."
        );
        // check + first install + one retry, never more.
        assert_eq!(runner.call_count(), 3);
        assert_eq!(resolver.times_called(), 1);
        assert_eq!(confirmer.times_asked(), 2);
        assert_eq!(runner.call(2)[4], "Google.Chrome");
    }

    #[tokio::test]
    async fn unresolvable_ambiguity_reports_a_detailed_failure() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("", 1),
            fail("Multiple packages found matching input criteria.", 1),
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(None);
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert!(response.starts_with("Failed to install 'chrome'."));
        assert_eq!(runner.call_count(), 2);
        assert_eq!(resolver.times_called(), 1);
    }

    #[tokio::test]
    async fn declined_retry_reports_failure_without_a_second_install() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("", 1),
            fail("multiple packages found", 1),
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true, false]);
        let resolver = FixedResolver::new(Some("Google.Chrome"));
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert!(response.starts_with("Failed to install 'chrome'."));
        // The candidate was only offered; the report must not say it ran.
        assert!(response.contains("Retry with package 'Google.Chrome' was declined."));
        assert!(!response.contains("Resolved package tried"));
        assert_eq!(runner.call_count(), 2);
        assert_eq!(confirmer.times_asked(), 2);
    }

    #[tokio::test]
    async fn plain_failure_never_consults_the_resolver() {
        let wl = whitelist();
        let runner = ScriptedRunner::new(vec![
            fail("", 1),
            fail("Installation failed", 1),
        ]);
        let confirmer = ScriptedConfirmer::new(vec![true]);
        let resolver = FixedResolver::new(Some("should-not-be-used"));
        let dir = tempfile::tempdir().unwrap();
        let mut cache = PathCache::load(&dir.path().join("cache.json"));

        let mut installer = Installer::new(
            &wl,
            Some(PackageManager::Winget),
            &mut cache,
            &runner,
            &confirmer,
            &resolver,
        )
        .with_path_lookup(no_path);

        let response = installer.install("chrome").await;
        assert!(response.contains("Failed to install 'chrome'."));
        assert!(response.contains("Error: Installation failed"));
        assert_eq!(resolver.times_called(), 0);
        assert_eq!(runner.call_count(), 2);
    }

    #[test]
    fn format_error_includes_known_reason_streams_and_exit_code() {
        let result = fail("no route to host", -1978335152);
        let message = format_error("chrome", &result, None);
        assert!(message.contains("Failed to install 'chrome'."));
        assert!(message.contains("Network failure"));
        assert!(message.contains("Error: no route to host"));
        assert!(message.contains("Exit code: -1978335152"));
    }

    #[test]
    fn ambiguity_markers_match_case_insensitively() {
        assert!(has_ambiguity_marker(&fail("Multiple Packages Found", 1)));
        assert!(has_ambiguity_marker(&fail("please refine the input", 1)));
        assert!(!has_ambiguity_marker(&fail("connection reset", 1)));
    }
}
