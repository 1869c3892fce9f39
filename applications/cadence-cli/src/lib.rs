//! Cadence CLI Library
//!
//! Headless playlist player: loads a configuration, builds a controller over
//! the simulated engine and runs command scripts against it.
//!
//! This library exposes the core components for testing purposes.

pub mod config;
pub mod error;
pub mod script;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{AppConfig, SimulationSettings};
pub use error::{CliError, Result};
pub use script::{parse_script, Command};
pub use session::Session;
