//! Logging around arbitrary calls.
//!
//! Each invocation produces one `INFO` record when it starts and exactly one terminal record:
//! `INFO` when the callee returns `Ok`, `ERROR` when it returns `Err` or panics. Failures are
//! never swallowed. An `Err` is handed back as-is and a panic is resumed with its original
//! payload once it has been logged.

use std::any::Any;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};

use chrono::Utc;

/// How call times appear in log messages, e.g. `2024-03-09 13:05:07.123400 UTC`
pub const CALLED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f UTC";

/// Run `f` once, logging its start and outcome under `name`
pub fn call<T, E, F>(name: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: Display,
{
    let called_at = Utc::now().format(CALLED_AT_FORMAT);
    log::info!("Running '{name}' function. Logged at {called_at}");

    let outcome = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(outcome) => outcome,
        Err(payload) => {
            log::error!(
                "Error in function '{name}' at {called_at}: {}",
                panic_message(payload.as_ref())
            );
            panic::resume_unwind(payload);
        }
    };

    match &outcome {
        Ok(_) => log::info!("Function '{name}' executed successfully. Logged at {called_at}"),
        Err(e) => log::error!("Error in function '{name}' at {called_at}: {e:#}"),
    }
    outcome
}

/// Wrap `f` so that every invocation goes through [`call`].
///
/// Zero arguments are passed as `()`, several as a tuple.
pub fn wrap<A, T, E, F>(name: impl Into<String>, f: F) -> impl Fn(A) -> Result<T, E>
where
    F: Fn(A) -> Result<T, E>,
    E: Display,
{
    let name = name.into();
    move |args| call(&name, || f(args))
}

/// Run `f` to completion without letting an `Err` or a panic escape. Either one is logged as
/// a single `Run failed` error record.
pub fn settle<E, F>(f: F)
where
    F: FnOnce() -> Result<(), E>,
    E: Display,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("Run failed: {e:#}"),
        Err(payload) => log::error!("Run failed: {}", panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "panicked"
    }
}
