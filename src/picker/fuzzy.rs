//! Provides a wrapper around an external fuzzy-picker process.
//!
//! The picker (`fzf` by default) receives the candidate lines on stdin and
//! prints the chosen line on stdout. Exit code 130 is the picker's
//! cancellation convention (Escape / Ctrl-C inside the picker) and is a
//! successful outcome here, not an error.

use crate::error::{AppError, Result};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// The picker used when no override is given on the command line.
pub const DEFAULT_PROGRAM: &str = "fzf";

// fzf and friends exit with 128 + SIGINT when the user dismisses the menu.
const CANCEL_EXIT_CODE: i32 = 130;

/// Outcome of one picker round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The user picked this line (picker stdout, trimmed).
    Chosen(String),
    /// The user dismissed the menu without picking anything.
    Cancelled,
}

/// A synchronous wrapper around an `fzf`-compatible fuzzy picker.
pub struct Picker {
    program: String,
}

impl Picker {
    /// Creates a new picker invoking the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Presents the candidate lines and returns the user's selection.
    ///
    /// The candidates are joined with newlines and fed as the picker's entire
    /// stdin; the call blocks until the picker exits. Exit 0 yields the
    /// trimmed stdout as the chosen line, 130 yields `Selection::Cancelled`,
    /// anything else is `AppError::Process` with the captured streams.
    ///
    /// Both stdout and stderr are captured, so the picker must render its
    /// interface on the controlling terminal (as fzf does); one that draws
    /// on stderr would show a blank screen.
    pub fn pick(&self, candidates: &[String]) -> Result<Selection> {
        debug!(
            "Presenting {} candidates via {}",
            candidates.len(),
            self.program
        );

        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // The picker reads until EOF, so stdin must be dropped after writing.
        // A picker may also exit before consuming all input; the resulting
        // broken pipe is not an error.
        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(candidates.join("\n").as_bytes()) {
                if err.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(err.into());
                }
            }
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        match output.status.code() {
            Some(0) => {
                let chosen = stdout.trim().to_string();
                info!("Picker selection: {:?}", chosen);
                Ok(Selection::Chosen(chosen))
            },
            Some(CANCEL_EXIT_CODE) => {
                info!("Picker cancelled by user");
                Ok(Selection::Cancelled)
            },
            code => Err(AppError::Process {
                program: self.program.clone(),
                code: code.unwrap_or(-1),
                stdout,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        }
    }
}
