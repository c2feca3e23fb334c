//! Tracing subscriber setup, custom formatters, log level reload after config load.

use tracing_subscriber::{reload, EnvFilter};

pub type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

// Custom time formatter for logs: "YYYY-MM-DD HH:MM:SS" (local time)
pub struct LocalTimeFormatter;

impl tracing_subscriber::fmt::time::FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
    }
}

// Custom event formatter for logs: "YYYY-MM-DD HH:MM:SS [LEVEL] message"
pub struct CustomEventFormat {
    ansi: bool,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for CustomEventFormat
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        use tracing_subscriber::fmt::time::FormatTime;

        LocalTimeFormatter.format_time(&mut writer)?;
        write!(writer, " ")?;

        let level = event.metadata().level();
        if self.ansi {
            let level_color = match *level {
                tracing::Level::TRACE => "\x1b[2m",  // Dim/gray
                tracing::Level::DEBUG => "\x1b[34m", // Blue
                tracing::Level::INFO => "\x1b[32m",  // Green
                tracing::Level::WARN => "\x1b[33m",  // Yellow
                tracing::Level::ERROR => "\x1b[31m", // Red
            };
            write!(writer, "{}[{}]\x1b[0m ", level_color, level)?;
        } else {
            write!(writer, "[{}] ", level)?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Map a user-facing level name to a tracing filter.
/// CRITICAL maps to ERROR (tracing has no separate critical level).
pub fn resolve_log_filter(level: &str) -> Option<&'static str> {
    match level.trim().to_lowercase().as_str() {
        "critical" => Some("error"),
        "trace" => Some("trace"),
        "debug" => Some("debug"),
        "info" => Some("info"),
        "warn" | "warning" => Some("warn"),
        "error" => Some("error"),
        _ => None,
    }
}

/// Pick the log level. Priority: 1. --log-level flag, 2. LOG_LEVEL env, 3. config file, 4. info
pub fn select_log_level(flag: Option<&str>, env: Option<&str>, config: Option<&str>) -> String {
    flag.or(env)
        .or(config)
        .unwrap_or("info")
        .to_lowercase()
}

/// Initialize the tracing subscriber on stderr. Returns a handle so the
/// filter can be swapped once the config file has been read.
pub fn init_tracing(filter: &str) -> ReloadHandle {
    use tracing_subscriber::prelude::*;

    let (filter_layer, reload_handle) = reload::Layer::new(EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .fmt_fields(tracing_subscriber::fmt::format::DefaultFields::new())
                .event_format(CustomEventFormat {
                    ansi: atty::is(atty::Stream::Stderr),
                }),
        )
        .init();

    reload_handle
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_filters() {
        assert_eq!(resolve_log_filter("CRITICAL"), Some("error"));
        assert_eq!(resolve_log_filter("Debug"), Some("debug"));
        assert_eq!(resolve_log_filter(" info "), Some("info"));
        assert_eq!(resolve_log_filter("verbose"), None);
    }

    #[test]
    fn flag_beats_env_beats_config() {
        assert_eq!(select_log_level(Some("TRACE"), Some("warn"), Some("ERROR")), "trace");
        assert_eq!(select_log_level(None, Some("WARN"), Some("ERROR")), "warn");
        assert_eq!(select_log_level(None, None, Some("ERROR")), "error");
        assert_eq!(select_log_level(None, None, None), "info");
    }
}
