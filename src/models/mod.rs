//! Defines the data structures and models used throughout the application.
//!
//! This includes the `Device` value object built from `bluetoothctl` output
//! and the `Action` enumeration describing what can be done to a device.

mod device;

pub use device::*;
