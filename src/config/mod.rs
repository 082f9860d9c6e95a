#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_range, validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

pub use toml_config::TomlConfig;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_DATABASE: &str = "techProduct";
pub const DEFAULT_PAYMENT_API: &str = "https://api.stripe.com";
pub const DEFAULT_CURRENCY: &str = "usd";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    Memory,
}

/// Values supplied on the command line or through the environment.
/// `None` means "not given", letting the settings file or the default apply.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<u16>,
    pub store: Option<StoreKind>,
    pub database_uri: Option<String>,
    pub database_user: Option<String>,
    pub database_pass: Option<String>,
    pub database_host: Option<String>,
    pub database_name: Option<String>,
    pub token_secret: Option<String>,
    pub token_ttl_hours: Option<i64>,
    pub token_issuer_key: Option<String>,
    pub payment_secret_key: Option<String>,
    pub payment_api_base: Option<String>,
    pub log_json: Option<bool>,
}

/// Fully resolved server settings.
#[derive(Clone)]
pub struct Settings {
    pub port: u16,
    pub store: StoreKind,
    pub database_uri: Option<String>,
    pub database_name: String,
    pub token_secret: String,
    pub token_ttl_hours: i64,
    /// Shared key a sign-in front end presents to `POST /jwt`. Unset disables issuance.
    pub token_issuer_key: Option<String>,
    pub payment_secret_key: Option<String>,
    pub payment_api_base: String,
    pub currency: String,
    pub log_json: bool,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("port", &self.port)
            .field("store", &self.store)
            .field("database_uri", &self.database_uri.as_ref().map(|_| "<redacted>"))
            .field("database_name", &self.database_name)
            .field("token_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field(
                "token_issuer_key",
                &self.token_issuer_key.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "payment_secret_key",
                &self.payment_secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("payment_api_base", &self.payment_api_base)
            .field("currency", &self.currency)
            .field("log_json", &self.log_json)
            .finish()
    }
}

/// Builds the Atlas SRV connection string from separate credentials.
/// User name and password are percent-encoded into the userinfo part.
pub fn compose_atlas_uri(user: &str, pass: &str, host: &str) -> Result<String> {
    let invalid = |reason: &str| AppError::InvalidConfigValueError {
        field: "database.host".to_string(),
        value: host.to_string(),
        reason: reason.to_string(),
    };

    let mut uri = Url::parse(&format!(
        "mongodb+srv://{}/?retryWrites=true&w=majority",
        host
    ))
    .map_err(|e| invalid(&e.to_string()))?;
    if uri.host_str().is_none() {
        return Err(invalid("missing host"));
    }

    uri.set_username(user)
        .map_err(|_| invalid("cannot carry credentials"))?;
    uri.set_password(Some(pass))
        .map_err(|_| invalid("cannot carry credentials"))?;
    Ok(uri.to_string())
}

impl Settings {
    pub fn resolve(file: Option<TomlConfig>, overrides: Overrides) -> Result<Self> {
        let file = file.unwrap_or_default();

        let composed_uri = match (
            &overrides.database_user,
            &overrides.database_pass,
            &overrides.database_host,
        ) {
            (Some(user), Some(pass), Some(host)) => Some(compose_atlas_uri(user, pass, host)?),
            _ => None,
        };

        let settings = Self {
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            store: overrides.store.or(file.database.store).unwrap_or_default(),
            database_uri: overrides
                .database_uri
                .or(composed_uri)
                .or(file.database.uri),
            database_name: overrides
                .database_name
                .or(file.database.name)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            token_secret: overrides
                .token_secret
                .or(file.auth.token_secret)
                .unwrap_or_default(),
            token_ttl_hours: overrides
                .token_ttl_hours
                .or(file.auth.token_ttl_hours)
                .unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
            token_issuer_key: overrides
                .token_issuer_key
                .or(file.auth.issuer_key)
                .filter(|key| !key.trim().is_empty()),
            payment_secret_key: overrides
                .payment_secret_key
                .or(file.payment.secret_key)
                .filter(|key| !key.trim().is_empty()),
            payment_api_base: overrides
                .payment_api_base
                .or(file.payment.api_base)
                .unwrap_or_else(|| DEFAULT_PAYMENT_API.to_string()),
            currency: file
                .payment
                .currency
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            log_json: overrides.log_json.or(file.server.log_json).unwrap_or(false),
        };

        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_range("server.port", self.port, 1, u16::MAX)?;
        validate_non_empty_string("auth.token_secret", &self.token_secret)?;
        validate_range("auth.token_ttl_hours", self.token_ttl_hours, 1, 24 * 365)?;
        validate_url("payment.api_base", &self.payment_api_base, &["http", "https"])?;
        validate_non_empty_string("payment.currency", &self.currency)?;

        if self.store == StoreKind::Mongo {
            let uri = validate_required_field("database.uri", &self.database_uri)?;
            validate_url("database.uri", uri, &["mongodb", "mongodb+srv"])?;
            validate_non_empty_string("database.name", &self.database_name)?;
        }

        Ok(())
    }
}
