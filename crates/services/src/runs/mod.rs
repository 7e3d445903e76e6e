mod driver;
mod launcher;

// Public API of the run subsystem.
pub use crate::error::RunError;
pub use driver::RunDriver;
pub use launcher::RunLauncher;
