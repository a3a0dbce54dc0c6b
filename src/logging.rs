use tracing_subscriber::EnvFilter;

/// Install the stdout subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init(default_directive: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("could not install logger: {}", e))
}
