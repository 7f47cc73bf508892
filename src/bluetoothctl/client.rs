//! Provides a client for the `bluetoothctl` command-line tool.
//!
//! This module defines the `BluetoothCtl` struct and its methods for listing
//! known devices with their status flags and for running device actions. All
//! invocations are synchronous and blocking; a hung tool blocks the program.

use crate::error::{AppError, Result};
use crate::models::{parse_listing_line, Action, Device};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// The control tool used when no override is given on the command line.
pub const DEFAULT_PROGRAM: &str = "bluetoothctl";

/// A synchronous client for the `bluetoothctl`-compatible control tool.
pub struct BluetoothCtl {
    program: String,
}

impl BluetoothCtl {
    /// Creates a new client invoking the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Lists known devices with their current status flags.
    ///
    /// Runs `<program> devices` and then `<program> info <id>` per device,
    /// preserving the listing order. Any non-zero exit aborts the whole
    /// listing; no partial result survives. Malformed listing lines are
    /// skipped with a warning.
    pub fn devices(&self) -> Result<Vec<Device>> {
        info!("Listing known devices via {}", self.program);

        let listing = self.capture(&["devices"])?;
        let mut devices = Vec::new();

        for line in listing.lines() {
            let Some((id, name)) = parse_listing_line(line) else {
                warn!("Skipping malformed device listing line: {:?}", line);
                continue;
            };
            let status = self.capture(&["info", id])?;
            devices.push(Device::from_status(name, id, &status));
        }

        debug!("Found {} known devices", devices.len());
        Ok(devices)
    }

    /// Runs the given action against a device.
    ///
    /// The tool's output is inherited so the user sees pairing prompts and
    /// progress directly. Success means exit code 0.
    pub fn run_action(&self, action: Action, device: &Device) -> Result<()> {
        info!("Running `{} {}` for {}", action.verb(), device.id, device.name);

        let status = Command::new(&self.program)
            .args([action.verb(), device.id.as_str()])
            .status()?;

        if !status.success() {
            return Err(AppError::Process {
                program: format!("{} {} {}", self.program, action.verb(), device.id),
                code: status.code().unwrap_or(-1),
                stdout: String::new(),
                stderr: String::new(),
            });
        }

        Ok(())
    }

    /// Runs the tool with the given arguments and captured output.
    ///
    /// Returns stdout on exit code 0; any other exit becomes
    /// `AppError::Process` carrying the captured streams.
    fn capture(&self, args: &[&str]) -> Result<String> {
        debug!("Executing: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if !output.status.success() {
            return Err(AppError::Process {
                program: format!("{} {}", self.program, args.join(" ")),
                code: output.status.code().unwrap_or(-1),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(stdout)
    }
}
