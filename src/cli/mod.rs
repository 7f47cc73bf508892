//! Handles Command Line Interface (CLI) related functionalities.
//!
//! Includes defining the argument surface, wiring the external tools
//! together, and running one pass of the list → pick → execute workflow.

mod commands;

pub use commands::*;
