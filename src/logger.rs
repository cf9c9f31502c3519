//! Query observers.
//!
//! A `QueryLogger` is told about every statement the query layer runs: once on
//! success with the elapsed time, once on failure with the error. It never
//! influences control flow.

use crate::value::Value;
use std::error::Error;
use std::time::Duration;

/// Observer for executed statements
pub trait QueryLogger: Send + Sync {
    fn log_query(&self, sql: &str, args: &[Value], duration_nanos: u64);

    fn log_error(&self, sql: &str, args: &[Value], err: &(dyn Error + 'static));
}

/// Logger writing through the `log` facade under the `vibeorm` target
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLogger {
    verbose: bool,
}

impl DefaultLogger {
    /// When `verbose` is set, bound arguments are included in each line
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn format_args(args: &[Value]) -> String {
        let parts: Vec<String> = args.iter().map(|v| v.to_string()).collect();
        format!("[{}]", parts.join(", "))
    }
}

impl QueryLogger for DefaultLogger {
    fn log_query(&self, sql: &str, args: &[Value], duration_nanos: u64) {
        let sql = clean_sql(sql);
        let took = format_duration(duration_nanos);
        if self.verbose && !args.is_empty() {
            log::info!(target: "vibeorm", "{} | {} | args: {}", took, sql, Self::format_args(args));
        } else {
            log::info!(target: "vibeorm", "{} | {}", took, sql);
        }
    }

    fn log_error(&self, sql: &str, args: &[Value], err: &(dyn Error + 'static)) {
        let sql = clean_sql(sql);
        if self.verbose && !args.is_empty() {
            log::error!(target: "vibeorm", "{} | args: {} | error: {}", sql, Self::format_args(args), err);
        } else {
            log::error!(target: "vibeorm", "{} | error: {}", sql, err);
        }
    }
}

/// Logger that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl QueryLogger for NoOpLogger {
    fn log_query(&self, _sql: &str, _args: &[Value], _duration_nanos: u64) {}

    fn log_error(&self, _sql: &str, _args: &[Value], _err: &(dyn Error + 'static)) {}
}

/// Collapse all whitespace runs to single spaces
pub fn clean_sql(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Human-readable duration: `ns`, `µs`, `ms` or `s`
pub fn format_duration(nanos: u64) -> String {
    let d = Duration::from_nanos(nanos);
    if d < Duration::from_micros(1) {
        format!("{}ns", nanos)
    } else if d < Duration::from_millis(1) {
        format!("{:.2}µs", nanos as f64 / 1_000.0)
    } else if d < Duration::from_secs(1) {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
