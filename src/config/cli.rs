use super::{Overrides, Settings, StoreKind, TomlConfig};
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "tech-hunt")]
#[command(about = "REST backend for voting on tech products")]
pub struct ServeArgs {
    #[arg(long, short, help = "Optional TOML settings file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    #[arg(long, env = "STORE", value_enum)]
    pub store: Option<StoreKind>,

    #[arg(long, env = "DB_URI", hide_env_values = true)]
    pub db_uri: Option<String>,

    #[arg(long, env = "DB_USER")]
    pub db_user: Option<String>,

    #[arg(long, env = "DB_PASS", hide_env_values = true)]
    pub db_pass: Option<String>,

    #[arg(long, env = "DB_HOST")]
    pub db_host: Option<String>,

    #[arg(long, env = "DB_NAME")]
    pub db_name: Option<String>,

    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    #[arg(long, env = "TOKEN_TTL_HOURS")]
    pub token_ttl_hours: Option<i64>,

    #[arg(long, env = "TOKEN_ISSUER_KEY", hide_env_values = true)]
    pub token_issuer_key: Option<String>,

    #[arg(long, env = "PAYMENT_SECRET_KEY", hide_env_values = true)]
    pub payment_secret_key: Option<String>,

    #[arg(long, env = "PAYMENT_API_BASE")]
    pub payment_api_base: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ServeArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            port: self.port,
            store: self.store,
            database_uri: self.db_uri.clone(),
            database_user: self.db_user.clone(),
            database_pass: self.db_pass.clone(),
            database_host: self.db_host.clone(),
            database_name: self.db_name.clone(),
            token_secret: self.token_secret.clone(),
            token_ttl_hours: self.token_ttl_hours,
            token_issuer_key: self.token_issuer_key.clone(),
            payment_secret_key: self.payment_secret_key.clone(),
            payment_api_base: self.payment_api_base.clone(),
            log_json: self.log_json.then_some(true),
        }
    }

    pub fn settings(&self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => Some(TomlConfig::from_file(path)?),
            None => None,
        };
        Settings::resolve(file, self.overrides())
    }
}
