//! Background Tasks Module
//!
//! # Tasks
//! - Expiry sweep: optionally removes stale analysis results on a timer

mod cleanup;

pub use cleanup::spawn_expiry_sweep;
