use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use planivo_application::{DEFAULT_MAX_IMPORT_TIMEOUT, RateLimitRule};
use planivo_core::AppError;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Clone)]
pub struct SmtpRuntimeConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_address: String,
}

impl std::fmt::Debug for SmtpRuntimeConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("SmtpRuntimeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_address", &self.from_address)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum EmailProviderConfig {
    Disabled,
    Console,
    Smtp(SmtpRuntimeConfig),
}

#[derive(Clone)]
pub enum AccountProviderConfig {
    Postgres,
    Http { base_url: String, service_key: String },
}

impl std::fmt::Debug for AccountProviderConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres => formatter.write_str("Postgres"),
            Self::Http { base_url, .. } => formatter
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("service_key", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitStoreConfig {
    Postgres,
    Redis,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cors_allowed_origin: String,
    pub redis_url: Option<String>,
    pub rate_limit_store: RateLimitStoreConfig,
    pub import_rate_limit: RateLimitRule,
    pub import_max_timeout: Duration,
    pub account_provider: AccountProviderConfig,
    pub email_provider: EmailProviderConfig,
    pub app_login_url: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");
        Self::from_lookup(migrate_only, |name| env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup, e.g. the process environment.
    pub fn from_lookup(
        migrate_only: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let vars = EnvLookup(lookup);

        let database_url = vars.required_non_empty("DATABASE_URL")?;
        let api_host = vars.or_default("API_HOST", "127.0.0.1");
        let api_port = vars.parsed("API_PORT", 3001_u16)?;
        let cors_allowed_origin = vars.or_default("CORS_ALLOWED_ORIGIN", "http://localhost:3000");
        let redis_url = vars.optional("REDIS_URL");

        let rate_limit_store = match vars.or_default("RATE_LIMIT_BACKEND", "postgres").as_str() {
            "postgres" => RateLimitStoreConfig::Postgres,
            "redis" => RateLimitStoreConfig::Redis,
            other => {
                return Err(AppError::Validation(format!(
                    "RATE_LIMIT_BACKEND must be either 'postgres' or 'redis', got '{other}'"
                )));
            }
        };
        if rate_limit_store == RateLimitStoreConfig::Redis && redis_url.is_none() {
            return Err(AppError::Validation(
                "REDIS_URL is required when RATE_LIMIT_BACKEND=redis".to_owned(),
            ));
        }

        let default_rule = RateLimitRule::bulk_user_import();
        let max_calls = vars.parsed("IMPORT_RATE_LIMIT_MAX_CALLS", default_rule.max_attempts)?;
        let window_seconds = vars.parsed(
            "IMPORT_RATE_LIMIT_WINDOW_SECONDS",
            default_rule.window_seconds,
        )?;
        if max_calls < 1 || window_seconds < 1 {
            return Err(AppError::Validation(
                "IMPORT_RATE_LIMIT_MAX_CALLS and IMPORT_RATE_LIMIT_WINDOW_SECONDS must be positive"
                    .to_owned(),
            ));
        }
        let import_rate_limit = RateLimitRule::new(default_rule.category, max_calls, window_seconds);

        let import_max_timeout = Duration::from_secs(vars.parsed(
            "IMPORT_MAX_TIMEOUT_SECONDS",
            DEFAULT_MAX_IMPORT_TIMEOUT.as_secs(),
        )?);
        if import_max_timeout.is_zero() {
            return Err(AppError::Validation(
                "IMPORT_MAX_TIMEOUT_SECONDS must be positive".to_owned(),
            ));
        }

        let account_provider = match vars.or_default("ACCOUNT_PROVIDER", "postgres").as_str() {
            "postgres" => AccountProviderConfig::Postgres,
            "http" => {
                let base_url = vars.required_non_empty("AUTH_ADMIN_URL")?;
                validate_url("AUTH_ADMIN_URL", &base_url)?;
                AccountProviderConfig::Http {
                    base_url,
                    service_key: vars.required_non_empty("AUTH_SERVICE_KEY")?,
                }
            }
            other => {
                return Err(AppError::Validation(format!(
                    "ACCOUNT_PROVIDER must be either 'postgres' or 'http', got '{other}'"
                )));
            }
        };

        let email_provider = match vars.or_default("EMAIL_PROVIDER", "console").as_str() {
            "none" => EmailProviderConfig::Disabled,
            "console" => EmailProviderConfig::Console,
            "smtp" => {
                let port = vars
                    .required_non_empty("SMTP_PORT")?
                    .parse::<u16>()
                    .map_err(|error| AppError::Validation(format!("invalid SMTP_PORT: {error}")))?;
                EmailProviderConfig::Smtp(SmtpRuntimeConfig {
                    host: vars.required_non_empty("SMTP_HOST")?,
                    port,
                    username: vars.optional("SMTP_USERNAME"),
                    password: vars.optional("SMTP_PASSWORD"),
                    from_address: vars.required_non_empty("SMTP_FROM_ADDRESS")?,
                })
            }
            other => {
                return Err(AppError::Validation(format!(
                    "EMAIL_PROVIDER must be one of 'none', 'console' or 'smtp', got '{other}'"
                )));
            }
        };

        let app_login_url = vars.optional("APP_LOGIN_URL");
        if let Some(app_login_url) = &app_login_url {
            validate_url("APP_LOGIN_URL", app_login_url)?;
        }

        Ok(Self {
            migrate_only,
            database_url,
            api_host,
            api_port,
            cors_allowed_origin,
            redis_url,
            rate_limit_store,
            import_rate_limit,
            import_max_timeout,
            account_provider,
            email_provider,
            app_login_url,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }

    pub fn redis_required(&self) -> bool {
        self.rate_limit_store == RateLimitStoreConfig::Redis
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

struct EnvLookup<F>(F);

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_owned())
    }

    fn required_non_empty(&self, name: &str) -> Result<String, AppError> {
        let value = (self.0)(name).ok_or_else(|| AppError::Validation(format!("{name} is required")))?;
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} must not be empty")));
        }

        Ok(value)
    }

    fn parsed<T>(&self, name: &str, default: T) -> Result<T, AppError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}"))),
            None => Ok(default),
        }
    }
}

fn validate_url(name: &str, value: &str) -> Result<(), AppError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
}
