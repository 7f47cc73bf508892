use crate::bluetoothctl::{self, BluetoothCtl};
use crate::error::{AppError, Result};
use crate::models::{Action, Device};
use crate::picker::{self, Picker, Selection};
use clap::Parser;
use tracing::{error, info, warn};

/// Interactive fuzzy menu for managing paired Bluetooth devices
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the bluetoothctl-compatible control tool
    #[arg(long, default_value = bluetoothctl::DEFAULT_PROGRAM)]
    pub bluetoothctl: String,

    /// Path to the fzf-compatible fuzzy picker
    #[arg(long, default_value = picker::DEFAULT_PROGRAM)]
    pub picker: String,
}

/// Outcome of one full pass of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// An action was executed; the program is done.
    Done,
    /// The user dismissed the device menu; the program should exit.
    Quit,
    /// The user dismissed the action menu; re-list and prompt again.
    Restart,
}

/// CLI application
pub struct App {
    bluetoothctl: BluetoothCtl,
    picker: Picker,
}

impl App {
    /// Create a new CLI application from the parsed arguments.
    pub fn new(cli: &Cli) -> Self {
        Self {
            bluetoothctl: BluetoothCtl::new(cli.bluetoothctl.clone()),
            picker: Picker::new(cli.picker.clone()),
        }
    }

    /// Runs one pass: list devices, pick one, pick an action, execute it.
    ///
    /// Cancellation at either menu is not an error; it is reported through
    /// the returned `Outcome`. Subprocess failures propagate to the caller,
    /// which owns the retry loop.
    pub fn run_once(&self) -> Result<Outcome> {
        let devices = self.bluetoothctl.devices()?;

        let Some(device) = self.select_device(&devices)? else {
            info!("Device menu dismissed, exiting");
            return Ok(Outcome::Quit);
        };

        let Some(action) = self.select_action(device)? else {
            info!("Action menu dismissed, re-listing");
            return Ok(Outcome::Restart);
        };

        self.bluetoothctl.run_action(action, device)?;
        Ok(Outcome::Done)
    }

    /// Presents the device menu and resolves the choice back to a device.
    fn select_device<'a>(&self, devices: &'a [Device]) -> Result<Option<&'a Device>> {
        let lines: Vec<String> = devices.iter().map(|d| d.to_string()).collect();
        match self.picker.pick(&lines)? {
            Selection::Cancelled => Ok(None),
            Selection::Chosen(line) => {
                let device = resolve_device(devices, &line);
                if device.is_none() {
                    warn!("Picker output {:?} matches no listed device", line);
                }
                Ok(device)
            },
        }
    }

    /// Presents the action menu for the given device.
    fn select_action(&self, device: &Device) -> Result<Option<Action>> {
        let actions = device.available_actions();
        let lines: Vec<String> = actions.iter().map(|a| a.to_string()).collect();
        match self.picker.pick(&lines)? {
            Selection::Cancelled => Ok(None),
            Selection::Chosen(line) => Ok(actions.into_iter().find(|a| a.label() == line)),
        }
    }
}

/// Maps the picker's echoed line back to a device by exact string equality.
///
/// If two devices format identically the first match wins.
fn resolve_device<'a>(devices: &'a [Device], line: &str) -> Option<&'a Device> {
    devices.iter().find(|d| d.to_string() == line)
}

/// Drives the workflow until it finishes or the user quits.
///
/// A subprocess failure is handed to the acknowledgement hook; once the hook
/// returns the whole workflow restarts from the device listing. Any other
/// error, including a failing hook, is fatal and propagates.
pub fn run_loop(app: &App, mut ack: impl FnMut(&AppError) -> Result<()>) -> Result<()> {
    loop {
        match app.run_once() {
            Ok(Outcome::Done) => {
                info!("Action completed");
                return Ok(());
            },
            Ok(Outcome::Quit) => {
                info!("Cancelled at device menu");
                return Ok(());
            },
            Ok(Outcome::Restart) => continue,
            Err(err @ AppError::Process { .. }) => {
                error!("External command failed: {}", err);
                ack(&err)?;
            },
            // Anything else (spawn failure, prompt failure) is fatal.
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    // Writes a fake tool script into a per-test temp dir and returns its path.
    fn fake_tool(dir: &Path, label: &str, script: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(label);
        fs::write(&path, script).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn test_dir(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("btmenu-cli-test-{}-{}", label, std::process::id()))
    }

    // Fake bluetoothctl: one connected+paired keyboard, actions appended to a log.
    fn fake_bluetoothctl(dir: &Path, log: &Path) -> PathBuf {
        fake_tool(
            dir,
            "bluetoothctl",
            &format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 devices)\n\
                   echo \"Device AA:BB:CC:DD:EE:FF Keyboard\"\n\
                   ;;\n\
                 info)\n\
                   printf '\\tConnected: yes\\n\\tPaired: yes\\n'\n\
                   ;;\n\
                 *)\n\
                   echo \"$@\" >> {}\n\
                   ;;\n\
                 esac\n",
                log.display()
            ),
        )
    }

    fn make_app(bluetoothctl: &Path, picker: &Path) -> App {
        App::new(&Cli {
            bluetoothctl: bluetoothctl.to_str().unwrap().to_string(),
            picker: picker.to_str().unwrap().to_string(),
        })
    }

    fn device(name: &str, id: &str) -> Device {
        Device {
            name: name.to_string(),
            id: id.to_string(),
            connected: false,
            paired: false,
            trusted: false,
        }
    }

    #[test]
    fn test_resolve_device_exact_match() {
        let devices = vec![device("Keyboard", "AA:BB:CC:DD:EE:FF"), device("Mouse", "11:22:33:44:55:66")];
        let resolved = resolve_device(&devices, "Mouse [11:22:33:44:55:66] (Disconnected)");
        assert_eq!(resolved, Some(&devices[1]));
    }

    #[test]
    fn test_resolve_device_first_match_on_duplicates() {
        // Two devices that format identically resolve to the first one.
        let devices = vec![device("Keyboard", "AA:BB:CC:DD:EE:FF"), device("Keyboard", "AA:BB:CC:DD:EE:FF")];
        let resolved = resolve_device(&devices, "Keyboard [AA:BB:CC:DD:EE:FF] (Disconnected)");
        assert!(std::ptr::eq(resolved.unwrap(), &devices[0]));
    }

    #[test]
    fn test_resolve_device_no_match() {
        let devices = vec![device("Keyboard", "AA:BB:CC:DD:EE:FF")];
        assert_eq!(resolve_device(&devices, "something else"), None);
    }

    #[test]
    fn test_run_once_executes_selected_action() {
        let dir = test_dir("execute");
        let log = dir.join("action-log");
        let _ = fs::remove_file(&log);
        let bluetoothctl = fake_bluetoothctl(&dir, &log);
        // Always picks the first candidate. The keyboard is connected and
        // paired, so the first offered action is Disconnect.
        let picker = fake_tool(&dir, "picker", "#!/bin/sh\nhead -n 1\n");

        let app = make_app(&bluetoothctl, &picker);
        let outcome = app.run_once().unwrap();

        assert_eq!(outcome, Outcome::Done);
        let logged = fs::read_to_string(&log).unwrap();
        assert_eq!(logged.trim(), "disconnect AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_run_once_cancel_at_device_menu_quits() {
        let dir = test_dir("quit");
        let log = dir.join("action-log");
        let _ = fs::remove_file(&log);
        let bluetoothctl = fake_bluetoothctl(&dir, &log);
        let picker = fake_tool(&dir, "picker", "#!/bin/sh\ncat > /dev/null\nexit 130\n");

        let app = make_app(&bluetoothctl, &picker);
        let outcome = app.run_once().unwrap();

        assert_eq!(outcome, Outcome::Quit);
        // The dispatcher was never reached.
        assert!(!log.exists());
    }

    #[test]
    fn test_run_once_cancel_at_action_menu_restarts() {
        let dir = test_dir("restart");
        let log = dir.join("action-log");
        let marker = dir.join("first-call-done");
        let _ = fs::remove_file(&log);
        let _ = fs::remove_file(&marker);
        let bluetoothctl = fake_bluetoothctl(&dir, &log);
        // First invocation (device menu) picks the first line; the second
        // invocation (action menu) cancels.
        let picker = fake_tool(
            &dir,
            "picker",
            &format!(
                "#!/bin/sh\n\
                 if [ -e {marker} ]; then\n\
                   cat > /dev/null\n\
                   exit 130\n\
                 fi\n\
                 touch {marker}\n\
                 head -n 1\n",
                marker = marker.display()
            ),
        );

        let app = make_app(&bluetoothctl, &picker);
        let outcome = app.run_once().unwrap();

        assert_eq!(outcome, Outcome::Restart);
        assert!(!log.exists());
    }

    #[test]
    fn test_run_loop_retries_listing_after_acknowledged_failure() {
        let dir = test_dir("retry");
        let calls = dir.join("devices-calls");
        let failed_once = dir.join("failed-once");
        let _ = fs::remove_file(&calls);
        let _ = fs::remove_file(&failed_once);
        // The first listing fails; every later one succeeds. The picker then
        // cancels, ending the run at the device menu.
        let bluetoothctl = fake_tool(
            &dir,
            "bluetoothctl",
            &format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 devices)\n\
                   echo listed >> {calls}\n\
                   if [ ! -e {failed_once} ]; then\n\
                     touch {failed_once}\n\
                     echo \"No default controller available\" >&2\n\
                     exit 2\n\
                   fi\n\
                   echo \"Device AA:BB:CC:DD:EE:FF Keyboard\"\n\
                   ;;\n\
                 info)\n\
                   printf '\\tConnected: yes\\n'\n\
                   ;;\n\
                 esac\n",
                calls = calls.display(),
                failed_once = failed_once.display()
            ),
        );
        let picker = fake_tool(&dir, "picker", "#!/bin/sh\ncat > /dev/null\nexit 130\n");

        let app = make_app(&bluetoothctl, &picker);
        let acked = Cell::new(0);
        let result = run_loop(&app, |err| {
            assert!(matches!(err, AppError::Process { code: 2, .. }));
            acked.set(acked.get() + 1);
            Ok(())
        });

        assert!(result.is_ok());
        // One acknowledgement, then a second listing pass.
        assert_eq!(acked.get(), 1);
        let listings = fs::read_to_string(&calls).unwrap();
        assert_eq!(listings.lines().count(), 2);
    }

    #[test]
    fn test_run_loop_failing_acknowledgement_is_fatal() {
        let dir = test_dir("ack-fail");
        let bluetoothctl = fake_tool(&dir, "bluetoothctl", "#!/bin/sh\nexit 2\n");
        let picker = fake_tool(&dir, "picker", "#!/bin/sh\ncat > /dev/null\nexit 130\n");

        let app = make_app(&bluetoothctl, &picker);
        let result = run_loop(&app, |_| {
            Err(AppError::Io(std::sync::Arc::new(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed",
            ))))
        });

        assert!(matches!(result, Err(AppError::Io(_))));
    }

    #[test]
    fn test_run_once_unmatched_picker_output_quits() {
        let dir = test_dir("unmatched");
        let log = dir.join("action-log");
        let _ = fs::remove_file(&log);
        let bluetoothctl = fake_bluetoothctl(&dir, &log);
        // The picker returns a line that matches no listed device.
        let picker = fake_tool(&dir, "picker", "#!/bin/sh\ncat > /dev/null\necho divergent\n");

        let app = make_app(&bluetoothctl, &picker);
        let outcome = app.run_once().unwrap();

        // No selection is treated like a dismissal, not an error.
        assert_eq!(outcome, Outcome::Quit);
        assert!(!log.exists());
    }
}
