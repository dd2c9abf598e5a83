use config::ConfigError;
use std::path::Path;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    /// Postgres connection string, usually taken from `PG_CONN`
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Access token signing and refresh token hashing settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64, // seconds (e.g., 900 for 15 minutes)
    pub bcrypt_cost: u32,
}

const DEFAULT_PORT: i64 = 8080;
const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 15 * 60;
const DEFAULT_BCRYPT_COST: i64 = 10;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Dotenv file read from the working directory at startup
pub const ENV_FILE: &str = ".env";

/// Copy `KEY=value` lines from `path` into the process environment.
/// Variables that are already set keep their values.
pub fn load_env_file(path: impl AsRef<Path>) -> Result<(), dotenvy::Error> {
    dotenvy::from_path(path)
}

/// Load settings from defaults, an optional `configuration` file, `APP__*`
/// variables and finally `PG_CONN`, `PORT` and `JWT_SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .set_default("application.host", "0.0.0.0")?
        .set_default("application.port", DEFAULT_PORT)?
        .set_default("database.max_connections", 5_i64)?
        .set_default("database.acquire_timeout_seconds", 5_i64)?
        .set_default("jwt.access_token_expiry", DEFAULT_ACCESS_TOKEN_EXPIRY)?
        .set_default("jwt.bcrypt_cost", DEFAULT_BCRYPT_COST)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"));

    for (var, key) in [
        ("PG_CONN", "database.url"),
        ("PORT", "application.port"),
        ("JWT_SECRET", "jwt.secret"),
    ] {
        if let Ok(value) = std::env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    let settings = builder.build()?.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".to_string()));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.jwt.bcrypt_cost) {
            return Err(ConfigError::Message(format!(
                "jwt.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(ConfigError::Message(
                "jwt.access_token_expiry must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
