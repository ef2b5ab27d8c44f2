use std::time::Duration;

/// Settings for the draw orchestrator.
#[derive(Debug, Clone)]
pub struct DrawConfig {
    /// Upper bound on a single notification send.
    pub notify_timeout: Duration,
    /// Maximum number of sends in flight for one event.
    pub notify_concurrency: usize,
    /// Public URL of the app, used to resolve relative gift image paths.
    pub public_base_url: String,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            notify_timeout: Duration::from_secs(30),
            notify_concurrency: 8,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

impl DrawConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                 |
    /// |-----------------------|-------------------------|
    /// | `NOTIFY_TIMEOUT_SECS` | `30`                    |
    /// | `NOTIFY_CONCURRENCY`  | `8`                     |
    /// | `APP_BASE_URL`        | `http://localhost:3000` |
    pub fn from_env() -> Self {
        let notify_timeout_secs: u64 = std::env::var("NOTIFY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("NOTIFY_TIMEOUT_SECS must be a valid u64");

        let notify_concurrency: usize = std::env::var("NOTIFY_CONCURRENCY")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("NOTIFY_CONCURRENCY must be a valid usize");

        let public_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".into());

        Self {
            notify_timeout: Duration::from_secs(notify_timeout_secs),
            // Zero would stall the fan-out.
            notify_concurrency: notify_concurrency.max(1),
            public_base_url,
        }
    }
}
