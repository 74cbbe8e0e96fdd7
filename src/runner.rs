use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use log::debug;

use crate::error::{classify_script_failure, Error};
use crate::escape::script_literal;
use crate::script::APP_NAME;

pub const DEFAULT_INTERPRETER: &str = "osascript";

/// Executes generated automation programs. The trait is the seam the
/// bridge is tested through; production code uses [`Osascript`].
pub trait ScriptRunner: Send + Sync {
    /// Runs a program synchronously and returns its trimmed output.
    fn run(&self, program: &str) -> Result<String, Error>;

    /// Fires an inter-app URL request through the scripting layer.
    fn open_url(&self, url: &str) -> Result<(), Error> {
        self.run(&format!("open location \"{}\"", script_literal(url)))?;
        Ok(())
    }
}

/// Runs programs through the system script interpreter. Each call
/// writes the program to a uniquely named temporary file, invokes the
/// interpreter against it, and removes the file on every exit path.
pub struct Osascript {
    command: String,
    temp_dir: PathBuf,
}

impl Osascript {
    pub fn new() -> Self {
        Osascript {
            command: DEFAULT_INTERPRETER.to_string(),
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Substitute interpreter and scratch directory, for tests.
    pub fn with_command(command: impl Into<String>, temp_dir: impl Into<PathBuf>) -> Self {
        Osascript {
            command: command.into(),
            temp_dir: temp_dir.into(),
        }
    }
}

impl Default for Osascript {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptRunner for Osascript {
    fn run(&self, program: &str) -> Result<String, Error> {
        // NamedTempFile removes the artifact on drop, covering early
        // returns and failure paths alike.
        let mut file = tempfile::Builder::new()
            .prefix("things3-")
            .suffix(".applescript")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| Error::Script(format!("failed to create temp script: {e}")))?;
        file.write_all(program.as_bytes())
            .map_err(|e| Error::Script(format!("failed to write temp script: {e}")))?;
        file.flush()
            .map_err(|e| Error::Script(format!("failed to write temp script: {e}")))?;

        debug!("running {} ({} bytes)", self.command, program.len());
        let output = Command::new(&self.command)
            .arg(file.path())
            .output()
            .map_err(|e| Error::Script(format!("failed to launch {}: {e}", self.command)))?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);
        let text = String::from_utf8_lossy(&combined).trim().to_string();

        if output.status.success() {
            Ok(text)
        } else {
            debug!("{} exited with {}", self.command, output.status);
            let message = if text.is_empty() {
                format!("{} exited with {}", self.command, output.status)
            } else {
                text
            };
            Err(classify_script_failure(message))
        }
    }
}

/// Asks System Events whether the host app's process is alive. True
/// only for the literal `true` token; any launch or execution failure
/// reads as "not running" rather than an error.
pub fn is_app_running() -> bool {
    is_app_running_with(DEFAULT_INTERPRETER)
}

pub(crate) fn is_app_running_with(command: &str) -> bool {
    let probe = format!(
        "tell application \"System Events\" to (name of processes) contains \"{APP_NAME}\""
    );
    match Command::new(command).args(["-e", &probe]).output() {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).trim() == "true"
        }
        _ => false,
    }
}
