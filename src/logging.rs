//! Structured logging with `tracing`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber. Later calls are no-ops.
pub fn init(filter: &str, json: bool) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
}


#[cfg(test)]
mod tests {
    use super::capture::capture_logs;
    use tracing::Level;

    #[test]
    fn captures_message_and_fields() {
        let (logs, _guard) = capture_logs();
        tracing::error!(task_id = 4_i64, error = %"boom", "failed to delete task");

        assert!(logs.has_event(Level::ERROR, "failed to delete task"));
        assert_eq!(logs.field("failed to delete", "task_id").as_deref(), Some("4"));
        assert_eq!(logs.field("failed to delete", "error").as_deref(), Some("boom"));
        assert_eq!(logs.events().len(), 1);
    }
}
