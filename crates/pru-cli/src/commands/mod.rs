pub mod completions;
pub mod man_pages;
pub mod print_installed;
pub mod replace_versions;
pub mod upgrade;
pub mod upgrade_requirements;

use indicatif::{ProgressBar, ProgressStyle};
use pru_schema::ManifestSource;
use std::io::Write;
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_UPGRADE_ERROR: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

/// Run `f` under a spinner unless JSON output was requested.
pub fn with_spinner<T, E>(
    json: bool,
    msg: &str,
    done: &str,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let pb = if json { None } else { Some(spinner(msg)) };
    let result = f();
    if let Some(ref pb) = pb {
        match &result {
            Ok(_) => spin_ok(pb, done),
            Err(_) => spin_fail(pb, "failed"),
        }
    }
    result
}

pub fn colorize_version(version: Option<&str>) -> String {
    use console::Style;
    match version {
        Some(v) => Style::new().green().apply_to(v).to_string(),
        None => Style::new().yellow().apply_to("not installed").to_string(),
    }
}

pub fn display_source(source: &ManifestSource) -> String {
    source
        .path()
        .map_or_else(|| "(no requirements file)".to_owned(), |p| p.display().to_string())
}

/// Where streamed package-manager output goes: stdout normally, stderr when
/// stdout is reserved for a JSON document.
pub fn output_sink(json: bool) -> Box<dyn Write> {
    if json {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    }
}
