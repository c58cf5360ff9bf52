use std::fmt;
use std::process::Command;
use tracing::debug;

pub const UV_UPGRADE_COMMAND: &str = "uv pip install --upgrade";
pub const PIP_UPGRADE_COMMAND: &str = "pip install --upgrade";

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

pub fn command_exists(name: &str) -> bool {
    let finder = if cfg!(windows) { "where" } else { "which" };
    Command::new(finder)
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Upgrade command used when none is configured: `uv` when it is on `PATH`,
/// plain `pip` otherwise.
pub fn default_upgrade_command() -> String {
    if command_exists("uv") {
        debug!("uv found on PATH");
        UV_UPGRADE_COMMAND.to_owned()
    } else {
        PIP_UPGRADE_COMMAND.to_owned()
    }
}

/// Check that the program an upgrade command starts with can be found.
pub fn check_upgrade_prereqs(command: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();
    let Some(program) = command.split_whitespace().next() else {
        return missing;
    };
    if !command_exists(program) {
        missing.push(MissingPrereq {
            name: program.to_owned(),
            purpose: "upgrading packages",
            install_hint: "python -m ensurepip | https://docs.astral.sh/uv/ | or pass --cmd",
        });
    }
    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\npru needs a package manager on PATH to upgrade requirements.");
    msg
}
