//! Prometheus metrics for the dispatcher and audio subsystem.
//!
//! - `opbot_commands_total{command}` - Commands executed by id
//! - `opbot_command_duration_seconds{command}` - Handler latency
//! - `opbot_command_errors_total{command,error}` - Handler failures
//! - `opbot_dispatch_aborted_total{reason}` - Events dropped before execution
//! - `opbot_rate_limited_total` - Invocations refused by a bucket
//! - `opbot_audio_sessions` - Live guild audio sessions
//! - `opbot_tracks_started_total` - Tracks handed to the playback backend
//! - `opbot_search_selections_total{outcome}` - Search selection results
//!
//! Recording is a no-op until [`init`] has run, so library users and tests
//! that never expose metrics pay nothing.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Dispatcher
// ========================================================================

/// Commands executed, by command id.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Handler latency by command id.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Handler errors and panics by command id and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Events dropped before a handler ran.
pub static DISPATCH_ABORTED: OnceLock<IntCounterVec> = OnceLock::new();

pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Audio
// ========================================================================

pub static AUDIO_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

pub static TRACKS_STARTED: OnceLock<IntCounter> = OnceLock::new();

pub static SEARCH_SELECTIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Call once at startup before exposing `/metrics`. Later calls are ignored.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                let m = $init.expect(concat!(stringify!($metric), " creation failed"));
                if let Err(e) = r.register(Box::new(m.clone())) {
                    tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                }
                let _ = $metric.set(m);
            }
        };
    }

    register!(COMMAND_COUNTER, IntCounterVec::new(Opts::new("opbot_commands_total", "Commands executed by id"), &["command"]));
    register!(COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("opbot_command_duration_seconds", "Command handler latency by id")
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(COMMAND_ERRORS, IntCounterVec::new(Opts::new("opbot_command_errors_total", "Command handler failures"), &["command", "error"]));
    register!(DISPATCH_ABORTED, IntCounterVec::new(Opts::new("opbot_dispatch_aborted_total", "Events dropped before execution"), &["reason"]));
    register!(RATE_LIMITED, IntCounter::new("opbot_rate_limited_total", "Invocations refused by a rate limit bucket"));
    register!(AUDIO_SESSIONS, IntGauge::new("opbot_audio_sessions", "Live guild audio sessions"));
    register!(TRACKS_STARTED, IntCounter::new("opbot_tracks_started_total", "Tracks started"));
    register!(SEARCH_SELECTIONS, IntCounterVec::new(Opts::new("opbot_search_selections_total", "Search selection results"), &["outcome"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

fn get_counter(metric: &OnceLock<IntCounter>) -> Option<&IntCounter> {
    metric.get()
}

fn get_counter_vec(metric: &OnceLock<IntCounterVec>) -> Option<&IntCounterVec> {
    metric.get()
}

fn get_histogram_vec(metric: &OnceLock<HistogramVec>) -> Option<&HistogramVec> {
    metric.get()
}

/// Record a command execution with latency.
#[inline]
pub fn record_command(command: &str, duration_secs: f64) {
    if let Some(c) = get_counter_vec(&COMMAND_COUNTER) {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = get_histogram_vec(&COMMAND_LATENCY) {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn record_command_error(command: &str, error: &str) {
    if let Some(c) = get_counter_vec(&COMMAND_ERRORS) {
        c.with_label_values(&[command, error]).inc();
    }
}

#[inline]
pub fn record_abort(reason: &str) {
    if let Some(c) = get_counter_vec(&DISPATCH_ABORTED) {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_rate_limited() {
    if let Some(c) = get_counter(&RATE_LIMITED) {
        c.inc();
    }
}

#[inline]
pub fn inc_audio_sessions() {
    if let Some(g) = AUDIO_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn dec_audio_sessions() {
    if let Some(g) = AUDIO_SESSIONS.get() {
        g.dec();
    }
}

#[inline]
pub fn record_track_started() {
    if let Some(c) = get_counter(&TRACKS_STARTED) {
        c.inc();
    }
}

/// `outcome` is `selected` or `timed_out`.
#[inline]
pub fn record_selection(outcome: &str) {
    if let Some(c) = get_counter_vec(&SEARCH_SELECTIONS) {
        c.with_label_values(&[outcome]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("ping", 0.001);
        record_abort("rate_limited");

        let output = gather_metrics();
        assert!(output.contains("opbot_commands_total"));
        assert!(output.contains("opbot_dispatch_aborted_total"));
    }
}
