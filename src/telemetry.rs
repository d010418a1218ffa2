use crate::config::LoggingFlags;
use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// JSON trace log location; `MODFORGE_TRACE_LOG` overrides the temp-dir default.
pub fn tracing_log_path() -> PathBuf {
    env::var("MODFORGE_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("modforge_trace.jsonl"))
}

/// Install the global subscriber once. Output only ever goes to the log file,
/// never stdout, which carries protocol frames in the helper.
pub fn init_tracing(flags: &impl LoggingFlags) {
    if !flags.logging_enabled() {
        return;
    }

    let _ = TRACING_INIT.get_or_init(|| {
        let path = tracing_log_path();
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => file,
            Err(_) => return,
        };
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
