//! Tracing-subscriber setup: JSON in production, human-readable otherwise.
//! Driven by `APP_ENV`/`RUST_LOG` rather than CLI flags, since this service
//! has no interactive CLI surface of its own.

/// Initializes the global tracing subscriber. Panics if called twice.
pub fn init() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        // Only logged once a span closes: one line per span, with timing and
        // all recorded fields, instead of separate enter/exit noise.
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false);

    if is_production() {
        builder.json().flatten_event(true).with_current_span(true).with_span_list(false).init();
    } else {
        builder.compact().with_ansi(atty_stderr()).init();
    }
}

fn is_production() -> bool {
    std::env::var("APP_ENV").map(|v| v.eq_ignore_ascii_case("production")).unwrap_or(false)
}

fn atty_stderr() -> bool {
    use std::io::IsTerminal;
    std::io::stderr().is_terminal()
}
