//! CLI subprocess integration tests.
//!
//! These tests invoke the `pru` binary as a subprocess against a fake
//! `site-packages` directory and verify exit codes, stdout content, JSON
//! output, and the rewritten requirements file.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn pru_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pru"));
    // Keep a developer's own config file out of the tests.
    cmd.env_remove("PRU_CONFIG");
    cmd.env_remove("PRU_LOG");
    cmd.env("HOME", "/nonexistent-pru-test-home");
    cmd.env("NO_COLOR", "1");
    cmd
}

struct Project {
    dir: tempfile::TempDir,
    site_packages: tempfile::TempDir,
}

impl Project {
    fn new(requirements: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("requirements.txt"), requirements).unwrap();
        Self {
            dir,
            site_packages: tempfile::tempdir().unwrap(),
        }
    }

    fn install(&self, name: &str, version: &str) {
        let dist = self
            .site_packages
            .path()
            .join(format!("{name}-{version}.dist-info"));
        fs::create_dir_all(&dist).unwrap();
        fs::write(
            dist.join("METADATA"),
            format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n"),
        )
        .unwrap();
    }

    fn requirements(&self) -> PathBuf {
        self.dir.path().join("requirements.txt")
    }

    fn read(&self) -> String {
        fs::read_to_string(self.requirements()).unwrap()
    }

    fn run(&self, args: &[&str]) -> Output {
        pru_bin()
            .current_dir(self.dir.path())
            .arg("--site-packages")
            .arg(self.site_packages.path())
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[cfg(unix)]
fn fake_installer(dir: &Path, version: &str, exit_code: i32) -> String {
    let script = dir.join("fake-pip.sh");
    fs::write(
        &script,
        format!(
            r#"sp="$1"
shift
for pkg in "$@"; do
  rm -rf "$sp/$pkg"-*.dist-info
  mkdir -p "$sp/$pkg-{version}.dist-info"
  printf 'Name: %s\nVersion: {version}\n' "$pkg" > "$sp/$pkg-{version}.dist-info/METADATA"
  echo "Successfully installed $pkg-{version}"
done
exit {exit_code}
"#
        ),
    )
    .unwrap();
    script.display().to_string()
}

#[test]
fn cli_version_exits_zero() {
    let output = pru_bin().arg("--version").output().unwrap();
    assert!(output.status.success(), "pru --version must exit 0");
    assert!(
        stdout(&output).contains("pru"),
        "version output must contain 'pru': {}",
        stdout(&output)
    );
}

#[test]
fn cli_help_lists_commands() {
    let output = pru_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("print-installed"));
    assert!(out.contains("replace-versions"));
    assert!(out.contains("upgrade-requirements"));
}

#[test]
fn cli_unknown_command_fails() {
    let output = pru_bin().arg("frobnicate").output().unwrap();
    assert!(!output.status.success(), "unknown command must exit non-zero");
    assert!(stderr(&output).contains("frobnicate"));
}

#[test]
fn cli_replace_versions_pins_installed() {
    let project = Project::new("requests\n");
    project.install("requests", "2.31.0");

    let output = project.run(&["replace-versions"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "requests==2.31.0\n");
    assert!(stdout(&output).contains("Replaced versions in requirements.txt"));
}

#[test]
fn cli_replace_versions_keeps_comments_and_blank_lines() {
    let project = Project::new("# comment\n\nnumpy>=1.0\nunknown-pkg\n");
    project.install("numpy", "1.26.0");

    let output = project.run(&["replace_versions"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "# comment\n\nnumpy==1.26.0\nunknown-pkg\n");
    assert!(stdout(&output).contains("unknown-pkg: not installed"));
}

#[test]
fn cli_replace_versions_normalizes_names() {
    let project = Project::new("Some-Package\n");
    project.install("some_package", "0.9.1");

    let output = project.run(&["replace-versions"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "Some-Package==0.9.1\n");
}

#[test]
fn cli_output_flag_leaves_input_untouched() {
    let project = Project::new("requests\n");
    project.install("requests", "2.31.0");
    let pinned = project.dir.path().join("pinned.txt");

    let output = project.run(&["replace-versions", "-o", &pinned.to_string_lossy()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "requests\n");
    assert_eq!(fs::read_to_string(&pinned).unwrap(), "requests==2.31.0\n");
}

#[test]
fn cli_explicit_requirement_path() {
    let project = Project::new("");
    let dev = project.dir.path().join("dev.txt");
    fs::write(&dev, "pytest>=7\n").unwrap();
    project.install("pytest", "8.0.0");

    let output = project.run(&["-r", &dev.to_string_lossy(), "replace-versions"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(fs::read_to_string(&dev).unwrap(), "pytest==8.0.0\n");
}

#[test]
fn cli_missing_manifest_exits_with_manifest_error() {
    let project = Project::new("");
    let output = project.run(&["-r", "absent.txt", "replace-versions"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("manifest not found"));
}

#[test]
fn cli_check_fails_when_unpinned_and_passes_after_pinning() {
    let project = Project::new("requests>=2\n");
    project.install("requests", "2.31.0");

    let output = project.run(&["replace-versions", "--check"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("is not pinned"));
    assert_eq!(project.read(), "requests>=2\n");

    assert!(project.run(&["replace-versions"]).status.success());

    let output = project.run(&["replace-versions", "--check"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn cli_print_installed_json() {
    let project = Project::new("requests\nmissing\n");
    project.install("requests", "2.31.0");
    project.install("pip", "24.0");

    let output = project.run(&["--json", "print-installed"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["requirements"][0]["name"], "requests");
    assert_eq!(json["requirements"][0]["installed"], "2.31.0");
    assert!(json["requirements"][1]["installed"].is_null());
    assert_eq!(json["installed"].as_array().unwrap().len(), 2);
}

#[test]
fn cli_print_installed_without_manifest() {
    let project = Project::new("");
    project.install("pip", "24.0");

    let output = project.run(&["-r", ".", "print-installed"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("pip"));
    assert!(out.contains("24.0"));
    assert!(!out.contains("REQUIREMENT"));
}

#[test]
fn cli_replace_versions_json_report() {
    let project = Project::new("requests\nabsent\n");
    project.install("requests", "2.31.0");

    let output = project.run(&["replace-versions", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "pinned");
    assert_eq!(json["changed"], true);
    assert_eq!(json["report"]["pinned"][0]["version"], "2.31.0");
    assert_eq!(json["report"]["unresolved"][0], "absent");
}

#[cfg(unix)]
#[test]
fn cli_default_command_upgrades_then_pins() {
    let project = Project::new("requests\n");
    project.install("requests", "2.30.0");
    let script = fake_installer(project.dir.path(), "2.31.0", 0);
    let cmd = format!("sh {script} {}", project.site_packages.path().display());

    let output = project.run(&["--cmd", &cmd]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Successfully installed requests-2.31.0"));
    assert!(out.contains("Upgraded packages in requirements.txt"));
    assert_eq!(project.read(), "requests==2.31.0\n");
}

#[cfg(unix)]
#[test]
fn cli_failed_upgrade_exits_with_upgrade_error() {
    let project = Project::new("requests\n");
    project.install("requests", "2.30.0");
    let script = fake_installer(project.dir.path(), "2.31.0", 1);
    let cmd = format!("sh {script} {}", project.site_packages.path().display());

    let output = project.run(&["upgrade-requirements", "--cmd", &cmd]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("upgrade failed"));
    assert_eq!(project.read(), "requests\n");
}

#[cfg(unix)]
#[test]
fn cli_allow_upgrade_failure_still_pins() {
    let project = Project::new("requests\n");
    let script = fake_installer(project.dir.path(), "2.31.0", 1);
    let cmd = format!("sh {script} {}", project.site_packages.path().display());

    let output = project.run(&["upgrade-requirements", "--cmd", &cmd, "--allow-upgrade-failure"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "requests==2.31.0\n");
}

#[cfg(unix)]
#[test]
fn cli_upgrade_json_keeps_stdout_parseable() {
    let project = Project::new("six\n");
    let script = fake_installer(project.dir.path(), "1.16.0", 0);
    let cmd = format!("sh {script} {}", project.site_packages.path().display());

    let output = project.run(&["--json", "upgrade", "--cmd", &cmd]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["status"], "upgraded");
    assert_eq!(json["upgrade"]["status_code"], 0);
    assert!(stderr(&output).contains("Successfully installed six-1.16.0"));
    assert_eq!(project.read(), "six\n");
}

/// Run with a `PATH` that holds no package manager and prerequisite checks on.
fn run_without_installers(project: &Project, args: &[&str]) -> Output {
    let empty_bin = tempfile::tempdir().unwrap();
    pru_bin()
        .current_dir(project.dir.path())
        .env("PATH", empty_bin.path())
        .env_remove("PRU_SKIP_PREREQS")
        .arg("--site-packages")
        .arg(project.site_packages.path())
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn cli_upgrade_without_manifest_needs_no_installer() {
    let project = Project::new("");
    let output = run_without_installers(&project, &["-r", ".", "upgrade"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(!stderr(&output).contains("missing prerequisites"));
    assert!(stdout(&output).contains("nothing to upgrade"));
}

#[test]
fn cli_upgrade_of_comment_only_manifest_needs_no_installer() {
    let project = Project::new("# nothing pinned yet\n\n");
    let output = run_without_installers(&project, &["upgrade-requirements"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(project.read(), "# nothing pinned yet\n\n");
}

#[test]
fn cli_upgrade_reports_missing_installer() {
    let project = Project::new("requests\n");
    let output = run_without_installers(&project, &["upgrade"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("missing prerequisites"));
    assert_eq!(project.read(), "requests\n");
}

#[test]
fn cli_verbose_logs_upgrade_command() {
    let project = Project::new("");
    let output = project.run(&["-v", "-r", ".", "upgrade", "--cmd", "echo"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let err = stderr(&output);
    assert!(err.contains("upgrade command: echo"), "stderr: {err}");
    assert!(err.contains("skipping prerequisite check"), "stderr: {err}");
}

#[test]
fn cli_completions_bash() {
    let output = pru_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("pru"));
}

#[test]
fn cli_invalid_config_fails() {
    let project = Project::new("requests\n");
    let config = project.dir.path().join("config.toml");
    fs::write(&config, "not_a_key = 1\n").unwrap();

    let output = project.run(&["--config", &config.to_string_lossy(), "replace-versions"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("config error"));
}
