//! Handles presenting menus through an external fuzzy-picker process.
//!
//! Includes:
//! - `fuzzy`: Wrapper around an `fzf`-compatible picker subprocess and the
//!   `Selection` outcome type distinguishing a choice from a cancellation.

mod fuzzy;

pub use fuzzy::*;
