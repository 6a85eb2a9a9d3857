use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(directives)
}

/// Installs the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init() {
    INIT.call_once(|| {
        let directives = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
        if let Err(err) = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&directives))
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init()
        {
            eprintln!("tracing subscriber already installed: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
        tracing::info!("logging initialized twice without panicking");
    }

    #[test]
    fn env_filter_defaults_to_info_when_unset_or_invalid() {
        assert_eq!(env_filter("").to_string(), "info");
        assert_eq!(env_filter("cutout=not-a-level").to_string(), "info");
    }

    #[test]
    fn env_filter_keeps_requested_global_level() {
        for level in ["trace", "debug", "warn"] {
            let filter = env_filter(level);
            assert_eq!(filter.to_string(), level);
        }
        assert_eq!(
            env_filter("debug").max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(env_filter("warn").max_level_hint(), Some(LevelFilter::WARN));
    }
}
