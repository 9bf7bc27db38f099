//! Observability subsystem.
//!
//! Every component logs through `tracing` macros with structured fields;
//! `logging.rs` installs the subscriber for the binary.

pub mod logging;
