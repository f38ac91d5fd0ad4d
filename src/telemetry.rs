//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! LOG_LEVEL controls the filter — a plain level ("debug") or full
//! directives like "info,history=debug,mathmind_backend=debug".
//! LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//! Targets and file/line are included to disambiguate sources; the
//! tower-http TraceLayer adds per-request spans on top of this.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
        EnvFilter::new(
            "info,mathmind_backend=debug,history=debug,problem=debug,analysis=debug,tower_http=info,axum=info",
        )
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().init(),
        _ => builder.init(),
    }
}
