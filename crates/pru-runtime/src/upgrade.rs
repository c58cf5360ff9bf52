use crate::RuntimeError;
use serde::Serialize;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Result of running the package manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpgradeOutcome {
    pub command: String,
    /// Exit status; `None` if the process was killed by a signal.
    pub status_code: Option<i32>,
    /// Number of output lines relayed.
    pub lines: usize,
}

impl UpgradeOutcome {
    pub fn success(&self) -> bool {
        self.status_code == Some(0)
    }

    pub fn into_result(self) -> Result<Self, RuntimeError> {
        if self.success() {
            Ok(self)
        } else {
            Err(RuntimeError::UpgradeFailed {
                command: self.command,
                code: self.status_code,
            })
        }
    }
}

/// `<command> <pkg> <pkg> ...`
pub fn upgrade_command_line(command: &str, packages: &[&str]) -> String {
    let command = command.trim();
    if packages.is_empty() {
        command.to_owned()
    } else {
        format!("{command} {}", packages.join(" "))
    }
}

fn shell_command(command_line: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command_line]);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command_line]);
        cmd
    }
}

/// Copy `reader` to `sink` line by line until end of stream.
fn relay_lines(reader: impl Read, sink: &mut dyn Write) -> std::io::Result<usize> {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut lines = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(lines);
        }
        let line = String::from_utf8_lossy(&buf);
        writeln!(sink, "{}", line.trim_end())?;
        sink.flush()?;
        lines += 1;
    }
}

/// Run `command_line` through the shell and relay its merged stdout/stderr to
/// `sink` one line at a time, as it is produced.
///
/// Reading stops at end of stream; the child is then reaped and its exit
/// status recorded. A non-zero status is reported in the outcome, not as an
/// error. There is no timeout.
pub fn run_streaming(
    command_line: &str,
    sink: &mut dyn Write,
) -> Result<UpgradeOutcome, RuntimeError> {
    if command_line.trim().is_empty() {
        return Err(RuntimeError::EmptyCommand);
    }
    info!("running: {command_line}");

    let (reader, writer) = std::io::pipe()?;
    let mut child = {
        let mut cmd = shell_command(command_line);
        cmd.stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);
        cmd.spawn().map_err(|source| RuntimeError::Spawn {
            command: command_line.to_owned(),
            source,
        })?
        // `cmd` drops here and closes our copies of the write end, so the
        // read loop sees EOF once the child exits.
    };

    // The read end is dropped before waiting, so a child still writing after
    // a sink failure gets EPIPE instead of blocking.
    let relayed = relay_lines(reader, sink);
    let status = child.wait()?;
    debug!("upgrade command finished with {status}");
    let lines = relayed?;
    Ok(UpgradeOutcome {
        command: command_line.to_owned(),
        status_code: status.code(),
        lines,
    })
}
