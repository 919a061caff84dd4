use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    /// Postgres URL for the document store; unset falls back to the in-memory store
    pub database_url: Option<String>,
    /// Base URL prepended to public upload paths
    pub public_base_url: String,
    /// Root directory of the local object storage, served at `/uploads`
    pub upload_dir: String,
    /// Bearer key for admin routes
    pub admin_api_key: Option<String>,
    pub steadfast_base_url: String,
    pub steadfast_api_key: String,
    pub steadfast_secret_key: String,
    /// Bearer token Steadfast sends with webhook calls
    pub steadfast_webhook_token: Option<String>,
    /// Seconds per replenished request for checkout/review routes (0 disables)
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            public_base_url: env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            admin_api_key: env::var("ADMIN_API_KEY").ok().filter(|s| !s.is_empty()),
            steadfast_base_url: env::var("STEADFAST_BASE_URL")
                .unwrap_or_else(|_| "https://portal.packzy.com/api/v1".to_string()),
            steadfast_api_key: env::var("STEADFAST_API_KEY").unwrap_or_default(),
            steadfast_secret_key: env::var("STEADFAST_SECRET_KEY").unwrap_or_default(),
            steadfast_webhook_token: env::var("STEADFAST_WEBHOOK_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            rate_limit_per_second: env::var("RATE_LIMIT_PER_SECOND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        }
    }

    /// Check if Steadfast credentials are configured
    pub fn courier_configured(&self) -> bool {
        !self.steadfast_api_key.is_empty() && !self.steadfast_secret_key.is_empty()
    }
}

#[cfg(test)]
impl Config {
    /// Configuration used by in-process tests
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: None,
            public_base_url: "http://shop.test".to_string(),
            upload_dir: "./uploads".to_string(),
            admin_api_key: Some("test-admin-key".to_string()),
            steadfast_base_url: "http://courier.test".to_string(),
            steadfast_api_key: "api-key".to_string(),
            steadfast_secret_key: "secret-key".to_string(),
            steadfast_webhook_token: None,
            rate_limit_per_second: 0,
            rate_limit_burst: 0,
        }
    }
}
