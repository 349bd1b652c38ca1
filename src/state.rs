/// Runtime configuration, environment-driven. Everything here is per-process
/// and in-memory only; there is no persisted client state.
#[derive(Clone, Debug)]
pub struct Config {
    pub backend_url: String,
    pub instance_url: String,
    pub api_base_override: String,
    pub username: String,
    pub password: String,
    pub company_id: String,
    /// GET /health timeout.
    pub health_timeout_secs: u64,
    /// POST /run timeout. The backend chains through to a live HR system, so
    /// this is deliberately long.
    pub run_timeout_secs: u64,
    /// GET /metrics/latest timeout.
    pub latest_timeout_secs: u64,
    /// `timeout` field forwarded in the /run body for the upstream call.
    pub upstream_timeout_secs: u64,
    pub verify_ssl: bool,
    /// Display cap for sample row lists.
    pub sample_cap: usize,
    /// Poll interval for watch mode.
    pub refresh_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            backend_url: std::env::var("BACKEND_URL").unwrap_or_default(),
            instance_url: std::env::var("INSTANCE_URL").unwrap_or_default(),
            api_base_override: std::env::var("API_BASE_OVERRIDE").unwrap_or_default(),
            username: std::env::var("SF_USERNAME").unwrap_or_default(),
            password: std::env::var("SF_PASSWORD").unwrap_or_default(),
            company_id: std::env::var("COMPANY_ID").unwrap_or_default(),
            health_timeout_secs: std::env::var("HEALTH_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(15),
            run_timeout_secs: std::env::var("RUN_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(180),
            latest_timeout_secs: std::env::var("LATEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            upstream_timeout_secs: std::env::var("UPSTREAM_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(60),
            verify_ssl: std::env::var("VERIFY_SSL").map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no")).unwrap_or(true),
            sample_cap: std::env::var("SAMPLE_CAP").ok().and_then(|v| v.parse().ok()).unwrap_or(50),
            refresh_secs: std::env::var("REFRESH_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(300),
        }
    }
}
