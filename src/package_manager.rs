//! Package manager detection and per-family command templates

use crate::command::which;

/// The package manager families the installer knows how to drive.
/// Chosen once per handling call by `detect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Winget,
    Brew,
    Apt,
    Dnf,
    Yum,
}

impl PackageManager {
    /// Probe the host for an available package manager.
    ///
    /// On Linux the probe order apt-get, dnf, yum is a deliberate
    /// tie-break (Debian family wins over Red Hat family) and must not
    /// be reordered. Unknown OS or no binary found yields None.
    pub fn detect() -> Option<Self> {
        Self::detect_on(std::env::consts::OS, |bin| which(bin).is_some())
    }

    /// Detection against an explicit OS name and binary probe, so tests
    /// can simulate hosts.
    pub fn detect_on(os: &str, probe: impl Fn(&str) -> bool) -> Option<Self> {
        match os {
            "windows" => Some(Self::Winget),
            "macos" => Some(Self::Brew),
            "linux" => {
                for (bin, pm) in [("apt-get", Self::Apt), ("dnf", Self::Dnf), ("yum", Self::Yum)] {
                    if probe(bin) {
                        return Some(pm);
                    }
                }
                None
            }
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Winget => "winget",
            Self::Brew => "brew",
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
        }
    }

    /// Install command template with the package appended as a literal
    /// argument. Never joined into a shell string.
    pub fn install_argv<'a>(&self, pkg: &'a str) -> Vec<&'a str> {
        match self {
            Self::Winget => vec![
                "winget",
                "install",
                "--accept-package-agreements",
                "--accept-source-agreements",
                pkg,
            ],
            Self::Brew => vec!["brew", "install", pkg],
            Self::Apt => vec!["sudo", "apt-get", "install", "-y", pkg],
            Self::Dnf => vec!["sudo", "dnf", "install", "-y", pkg],
            Self::Yum => vec!["sudo", "yum", "install", "-y", pkg],
        }
    }

    /// Existence query for one package.
    pub fn check_argv<'a>(&self, pkg: &'a str) -> Vec<&'a str> {
        match self {
            Self::Winget => vec!["winget", "list"],
            Self::Brew => vec!["brew", "list"],
            Self::Apt => vec!["dpkg", "-s", pkg],
            Self::Dnf => vec!["dnf", "list", "installed", pkg],
            Self::Yum => vec!["yum", "list", "installed", pkg],
        }
    }

    /// Marker the check output must contain for an exact "installed"
    /// verdict. None means: substring-match the app name in the output.
    pub fn check_success_marker(&self) -> Option<&'static str> {
        match self {
            Self::Apt => Some("Status: install ok installed"),
            _ => None,
        }
    }
}
