//! Provides a client for driving the external Bluetooth control tool.
//!
//! Includes:
//! - `client`: Wrapper around `bluetoothctl` for listing devices and
//!   dispatching actions.

mod client;

pub use client::*;
