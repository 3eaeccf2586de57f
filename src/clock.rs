use std::io::Write;

use anyhow::Context;
use chrono::Local;

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Current local time, e.g. `2024-03-09 14:05:07.123456`
pub fn now_string() -> String {
    Local::now().format(DISPLAY_FORMAT).to_string()
}

pub fn print_now<W: Write>(mut out: W) -> anyhow::Result<()> {
    writeln!(out, "The current time is: {}", now_string())
        .and_then(|()| out.flush())
        .context("Failed to print the current time")
}
