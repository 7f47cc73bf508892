//! Defines the `Device` value object and the `Action` enumeration.
//!
//! Devices are snapshots: they are rebuilt from `bluetoothctl` output on every
//! listing pass and never persisted. The formatted display string doubles as
//! the menu line shown to the picker, so it must round-trip back to the same
//! device by exact string equality.

use std::fmt;

// Exact marker lines emitted by `bluetoothctl info`.
const CONNECTED_MARKER: &str = "Connected: yes";
const PAIRED_MARKER: &str = "Paired: yes";
const TRUSTED_MARKER: &str = "Trusted: yes";

/// A known Bluetooth device with its status flags as of the last listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Human-readable device name. May contain spaces.
    pub name: String,
    /// Device address (e.g. `AA:BB:CC:DD:EE:FF`), the stable identifier.
    pub id: String,
    pub connected: bool,
    pub paired: bool,
    pub trusted: bool,
}

impl Device {
    /// Builds a device from its listing identity and the text of
    /// `bluetoothctl info <id>`.
    ///
    /// Each flag is independent: presence of its exact marker line anywhere
    /// in the status text sets it, absence clears it.
    pub fn from_status(name: &str, id: &str, status: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            connected: status.contains(CONNECTED_MARKER),
            paired: status.contains(PAIRED_MARKER),
            trusted: status.contains(TRUSTED_MARKER),
        }
    }

    /// Computes the three actions offered for this device, in fixed order.
    ///
    /// Each slot is one of a mutually exclusive pair conditioned on the
    /// current flag: connected toggles Disconnect/Connect, paired toggles
    /// Remove/Pair, trusted toggles Untrust/Trust.
    pub fn available_actions(&self) -> [Action; 3] {
        [
            if self.connected {
                Action::Disconnect
            } else {
                Action::Connect
            },
            if self.paired {
                Action::Remove
            } else {
                Action::Pair
            },
            if self.trusted {
                Action::Untrust
            } else {
                Action::Trust
            },
        ]
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({})",
            self.name,
            self.id,
            if self.connected {
                "Connected"
            } else {
                "Disconnected"
            }
        )
    }
}

/// Splits one line of `bluetoothctl devices` output into `(id, name)`.
///
/// Lines have the shape `Device <id> <name...>`; the name may itself contain
/// spaces, so the line is split into at most three fields. Returns `None` if
/// fewer than three fields are present.
pub fn parse_listing_line(line: &str) -> Option<(&str, &str)> {
    let mut fields = line.splitn(3, ' ');
    let _label = fields.next()?;
    let id = fields.next()?;
    let name = fields.next()?;
    Some((id, name))
}

/// An operation that can be performed on a device via the control tool.
///
/// The offered set is always drawn from [`Device::available_actions`], so an
/// unrecognized action is unrepresentable by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Connect,
    Disconnect,
    Pair,
    Remove,
    Trust,
    Untrust,
}

impl Action {
    /// The menu label shown to the user.
    pub fn label(&self) -> &'static str {
        match self {
            Action::Connect => "Connect",
            Action::Disconnect => "Disconnect",
            Action::Pair => "Pair",
            Action::Remove => "Remove",
            Action::Trust => "Trust",
            Action::Untrust => "Untrust",
        }
    }

    /// The `bluetoothctl` subcommand implementing this action.
    pub fn verb(&self) -> &'static str {
        match self {
            Action::Connect => "connect",
            Action::Disconnect => "disconnect",
            Action::Pair => "pair",
            Action::Remove => "remove",
            Action::Trust => "trust",
            Action::Untrust => "untrust",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
