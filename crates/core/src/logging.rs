//! Tracing initialization.
//!
//! [`init_tracing`] installs the global subscriber in one of two modes:
//! - **JSON** (`json = true`): one object per event with microsecond UTC
//!   timestamps, for log shipping.
//! - **Pretty** (`json = false`): human-readable output for local runs.
//!
//! Both respect `RUST_LOG` (e.g. `RUST_LOG=sentinel_risk=debug`), defaulting
//! to `info`.

use std::fmt;

use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber.
///
/// Returns an error instead of panicking if a global subscriber is already
/// installed, so tests and embedding binaries can call it freely.
pub fn init_tracing(json: bool) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_timer(UtcMicros)
            .with_target(true)
            .with_current_span(false);
        registry.with(json_layer).try_init()?;
    } else {
        let pretty_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_timer(UtcMicros)
            .with_target(true);
        registry.with(pretty_layer).try_init()?;
    }
    Ok(())
}

/// RFC 3339 UTC timer with microsecond precision.
#[derive(Debug, Clone, Copy)]
struct UtcMicros;

impl UtcMicros {
    fn render(now: chrono::DateTime<chrono::Utc>) -> String {
        now.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
    }
}

impl FormatTime for UtcMicros {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", Self::render(chrono::Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timer_renders_microseconds() {
        let t = chrono::Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .unwrap()
            + chrono::Duration::microseconds(42);
        assert_eq!(UtcMicros::render(t), "2024-03-09T14:05:07.000042Z");
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        let _ = init_tracing(false);
        assert!(init_tracing(true).is_err());
    }
}
