use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    pub admin: AdminSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub name: String,
    pub max_pool_size: Option<u32>,
    pub min_pool_size: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub issuer: String,
}

/// Accounts registering with one of these emails are promoted to super-admin.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSettings {
    pub super_admin_emails: Vec<String>,
}

impl AdminSettings {
    pub fn is_super_admin_email(&self, email: &str) -> bool {
        self.super_admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("TASKFLOW")
                    .list_separator(",")
                    .with_list_parse_key("app.cors_origins")
                    .with_list_parse_key("admin.super_admin_emails")
                    .try_parsing(true),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("database.url", "mongodb://localhost:27019")?
            .set_default("database.name", "taskflow")?
            .set_default("jwt.secret", "change-me-in-production")?
            .set_default("jwt.access_token_ttl_secs", 3600)?
            .set_default("jwt.refresh_token_ttl_secs", 604800)?
            .set_default("jwt.issuer", "taskflow")?
            .set_default("admin.super_admin_emails", Vec::<String>::new())?
            .build()?;

        config.try_deserialize()
    }
}
