//! Print the current time, with every instrumented call logged to an append-only file.

pub mod clock;
pub mod environment;
pub mod instrument;
pub mod layering;
pub mod settings;
pub mod sink;
