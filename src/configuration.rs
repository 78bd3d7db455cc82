use chrono::Duration;
use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub webhook: WebhookSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    /// Deployment platform; destructive admin endpoints only run on "dev".
    pub platform: String,
}

impl ApplicationSettings {
    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Run against the in-process store instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// Longest token lifetime accepted from configuration (ten years)
pub const MAX_TOKEN_TTL_SECONDS: i64 = 10 * 365 * 24 * 3600;

/// Session token settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (3600 = 1 hour)
    pub refresh_token_expiry: i64,  // seconds (5184000 = 60 days)
    pub issuer: String,
}

impl JwtSettings {
    pub fn access_ttl(&self) -> Result<Duration, ConfigError> {
        bounded_ttl("access_token_expiry", self.access_token_expiry)
    }

    pub fn refresh_ttl(&self) -> Result<Duration, ConfigError> {
        bounded_ttl("refresh_token_expiry", self.refresh_token_expiry)
    }

    /// Rejects settings that could never produce a usable token
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        self.access_ttl()?;
        self.refresh_ttl()?;
        Ok(())
    }
}

fn bounded_ttl(name: &str, seconds: i64) -> Result<Duration, ConfigError> {
    if seconds <= 0 || seconds > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::Message(format!(
            "jwt.{} must be between 1 and {} seconds, got {}",
            name, MAX_TOKEN_TTL_SECONDS, seconds
        )));
    }
    Ok(Duration::seconds(seconds))
}

/// Inbound webhook settings
#[derive(serde::Deserialize, Clone)]
pub struct WebhookSettings {
    pub api_key: String,
}

/// Loads `configuration.yaml` (optional) and overlays `APP_`-prefixed
/// environment variables, e.g. `APP_JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    let settings = settings.try_deserialize::<Settings>()?;
    settings.jwt.validate()?;
    Ok(settings)
}
