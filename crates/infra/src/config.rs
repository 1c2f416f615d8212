use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_env: String,
    pub port: u16,
    pub log_level: String,
    pub data_backend: String,
    pub surreal_endpoint: String,
    pub surreal_ns: String,
    pub surreal_db: String,
    pub surreal_user: String,
    pub surreal_pass: String,
    pub jwt_secret: String,
    pub auth_dev_bypass_enabled: bool,
    pub s3_endpoint: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,
    pub booking_base_url: String,
    pub booking_username: String,
    pub booking_password: String,
    pub booking_timeout_ms: u64,
    /// Destination writes targeting an unknown id create the document
    /// instead of failing.
    pub destination_write_upsert: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .set_default("app_env", "development")?
            .set_default("port", 3000)?
            .set_default("log_level", "info")?
            .set_default("data_backend", "memory")?
            .set_default("surreal_endpoint", "ws://127.0.0.1:8000")?
            .set_default("surreal_ns", "wayfarer")?
            .set_default("surreal_db", "itineraries")?
            .set_default("surreal_user", "root")?
            .set_default("surreal_pass", "root")?
            .set_default("jwt_secret", "dev-secret")?
            .set_default("auth_dev_bypass_enabled", false)?
            .set_default("s3_endpoint", "http://127.0.0.1:9000")?
            .set_default("s3_bucket", "wayfarer-banners-dev")?
            .set_default("s3_region", "us-east-1")?
            .set_default("s3_access_key", "minioadmin")?
            .set_default("s3_secret_key", "minioadmin")?
            .set_default(
                "booking_base_url",
                "http://api.tbotechnology.in/TBOHolidays_HotelAPI",
            )?
            .set_default("booking_username", "username")?
            .set_default("booking_password", "password")?
            .set_default("booking_timeout_ms", 5_000)?
            .set_default("destination_write_upsert", true)?
            .add_source(config::Environment::default().separator("__"))
            .build()?;
        cfg.try_deserialize()
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}
