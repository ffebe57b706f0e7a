use std::time::Duration;

use clap::Args;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Base URL of the grant API
    #[arg(long, global = true, env = "GRANT_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,
    /// SQLite database holding the active profile id
    #[arg(long, global = true, env = "GRANT_STATE_DB", default_value = "sqlite://grant-client.db")]
    pub state_db: String,
    /// HTTP request timeout in seconds
    #[arg(long, global = true, env = "GRANT_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
    /// Log filter, e.g. `info` or `grant_match_client=debug`
    #[arg(long, global = true, default_value = "warn")]
    pub log: String,
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Logs go to stderr so they never mix with page output.
    pub fn init_tracing(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }
}
