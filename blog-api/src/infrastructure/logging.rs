use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_logging(default_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| level_filter(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

/// Filter for the configured level, sqlx statement logging capped at `warn`.
fn level_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(format!("{level},sqlx::query=warn"))
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx::query=warn"))
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::level_filter;

    #[test]
    fn configured_level_is_used() {
        assert_eq!(level_filter("debug").max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn unparsable_level_falls_back_to_info() {
        assert_eq!(
            level_filter("blog_api=loud").max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
