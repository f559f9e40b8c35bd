//! Tracing-subscriber initialization shared by every binary in this
//! workspace.

mod logging;

pub use logging::init;
