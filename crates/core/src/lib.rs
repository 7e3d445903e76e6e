//! Domain core for timed mental-arithmetic drills: questions, grading,
//! reveal pacing and the run state machine.

#![forbid(unsafe_code)]

pub mod completion;
pub mod error;
pub mod model;
pub mod run;
pub mod scheduler;
pub mod scoring;
pub mod supplier;
pub mod time;

pub use error::Error;
pub use time::Clock;
