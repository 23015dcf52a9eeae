//! Board and scenario scripts for the host simulator.
//!
//! A script describes the simulated board, the handlers and sources set
//! up before interrupts are enabled, and a timeline of events to replay
//! against the dispatch core.

/// Script data model and the nom grammar for one script line.
pub mod script;

/// Reading scripts from disk.
///
/// Wraps the parser with file handling and attaches the file name to
/// every error.
pub mod loader;

pub use loader::load_script;
pub use script::{BoardConfig, Controller, Directive, Event, Script, parse_script};
