use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongo_uri: String,
    pub mongo_db: String,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from the environment. `MONGO_URI` carries the
    /// store credentials and has no fallback; everything else defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        let mongo_uri = std::env::var("MONGO_URI").context("MONGO_URI must be set")?;
        let mongo_db = std::env::var("MONGO_DB").unwrap_or_else(|_| "talentpool".into());
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".into());
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port = std::env::var("APP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3001);

        Ok(Self {
            mongo_uri,
            mongo_db,
            cors_origin,
            host,
            port,
        })
    }
}
