#![forbid(unsafe_code)]

pub mod error;
pub mod runs;

pub use drill_core::Clock;

pub use error::RunError;
pub use runs::{RunDriver, RunLauncher};
