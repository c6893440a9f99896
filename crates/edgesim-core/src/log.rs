//! Logging helpers.
//!
//! Records produced by the macros below look like `[12.000 DEBUG network] message`,
//! i.e. simulation time, level and component name, and use the component name as the log target.

use atty::Stream;
use colored::{Color, ColoredString, Colorize};
use log::error;
use serde_json::json;
use serde_type_name::type_name;

use crate::event::Event;

/// Applies the color to the string if stderr (log) goes to console.
pub fn get_colored(s: &str, color: Color) -> ColoredString {
    if atty::is(Stream::Stderr) {
        s.color(color)
    } else {
        s.normal()
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_record {
    ($level:expr, $label:expr, $color:expr, $ctx:expr, $msg:expr) => (
        log::log!(
            target: $ctx.name(),
            $level,
            "[{:.3} {} {}] {}",
            $ctx.time(), $crate::log::get_colored($label, $color), $ctx.name(), $msg
        )
    );
    ($level:expr, $label:expr, $color:expr, $ctx:expr, $format:expr, $($arg:tt)+) => (
        log::log!(
            target: $ctx.name(),
            $level,
            concat!("[{:.3} {} {}] ", $format),
            $ctx.time(), $crate::log::get_colored($label, $color), $ctx.name(), $($arg)+
        )
    );
}

/// Logs a message at the debug level on behalf of a component.
///
/// The first argument is anything with `name()` and `time()` methods, usually a
/// [`SimulationContext`](crate::SimulationContext). The rest is a message or a format string with arguments.
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
/// use env_logger::Builder;
/// use edgesim_core::{log_debug, Simulation, SimulationContext};
///
/// struct Uploader {
///     ctx: SimulationContext,
/// }
///
/// impl Uploader {
///     fn upload(&self, size: f64) {
///         log_debug!(self.ctx, "uploading {} kbit", size);
///     }
/// }
///
/// Builder::from_default_env()
///     .format(|buf, record| writeln!(buf, "{}", record.args()))
///     .init();
///
/// let mut sim = Simulation::new(123);
/// let uploader = Uploader { ctx: sim.create_context("uploader") };
/// uploader.upload(100.);
/// log_debug!(uploader.ctx, "done");
/// ```
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $($rest:tt)+) => (
        $crate::__log_record!(log::Level::Debug, "DEBUG", $crate::colored::Color::Blue, $ctx, $($rest)+)
    );
}

/// Logs a message at the trace level on behalf of a component.
///
/// See [`log_debug!`](crate::log_debug!).
#[macro_export]
macro_rules! log_trace {
    ($ctx:expr, $($rest:tt)+) => (
        $crate::__log_record!(log::Level::Trace, "TRACE", $crate::colored::Color::Cyan, $ctx, $($rest)+)
    );
}

/// Logs a message at the warn level on behalf of a component.
///
/// See [`log_debug!`](crate::log_debug!).
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $($rest:tt)+) => (
        $crate::__log_record!(log::Level::Warn, " WARN", $crate::colored::Color::Yellow, $ctx, $($rest)+)
    );
}

fn log_event_problem(event: Event, problem: &str) {
    error!(
        target: "simulation",
        "[{:.3} {} simulation] {}: {}",
        event.time,
        get_colored("ERROR", Color::Red),
        problem,
        json!({"type": type_name(&event.data).unwrap_or("?"), "data": event.data, "src": event.src, "dst": event.dst})
    );
}

/// Logs an event whose payload type was not matched by any arm of [`cast!`](crate::cast!).
pub fn log_unhandled_event(event: Event) {
    log_event_problem(event, "Unhandled event");
}

pub(crate) fn log_undelivered_event(event: Event) {
    log_event_problem(event, "Undelivered event");
}

pub(crate) fn log_incorrect_event(event: Event, msg: &str) {
    log_event_problem(event, &format!("Incorrect event ({})", msg));
}
