use super::{ConfigError, LogFormat, LogLevel};
use crate::app::retry::RetryPolicy;
use crate::domain::Secret;
use crate::sender::{Authentication, HttpMethod, OutputConfig, SerializerKind};
use clap::{ArgAction, Parser};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug, Clone, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Endpoint URL, e.g. http://localhost:9880/api/events (`${tag}` and `${time}` are substituted)
    #[arg(long, env = "ENDPOINT_URL", default_value = "")]
    pub endpoint_url: String,

    /// Skip TLS peer verification
    #[arg(long, env = "SSL_NO_VERIFY")]
    pub ssl_no_verify: bool,

    /// HTTP method: get, put, post or delete (anything else means post)
    #[arg(long, env = "HTTP_METHOD", default_value = "post")]
    pub http_method: String,

    /// Body serializer: form or json (anything else means form)
    #[arg(long, env = "SERIALIZER", default_value = "form")]
    pub serializer: String,

    /// Drop sends within this many milliseconds of the last attempt (0 = off)
    #[arg(long, env = "RATE_LIMIT_MSEC", default_value = "0")]
    pub rate_limit_msec: u64,

    /// Propagate transport errors to the caller
    #[arg(long, env = "RAISE_ON_ERROR", default_value = "true", action = ArgAction::Set)]
    pub raise_on_error: bool,

    /// Status codes that ask the caller to re-deliver
    #[arg(
        long,
        env = "RECOVERABLE_STATUS_CODES",
        value_delimiter = ',',
        default_value = "503"
    )]
    pub recoverable_status_codes: Vec<u16>,

    /// Extra request headers as a JSON object
    #[arg(long, env = "CUSTOM_HEADERS", default_value = "{}")]
    pub custom_headers: String,

    /// Authentication mode: none or basic
    #[arg(long, env = "AUTHENTICATION")]
    pub authentication: Option<String>,

    /// Basic auth username
    #[arg(long, env = "HTTP_USERNAME", default_value = "")]
    pub username: String,

    /// Basic auth password
    #[arg(long, env = "HTTP_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: Secret,

    /// Send each batch as one NDJSON request
    #[arg(long, env = "BULK_REQUEST")]
    pub bulk_request: bool,

    /// Request timeout in seconds
    #[arg(long, env = "TIMEOUT_SECS", default_value = "30")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "CONNECT_TIMEOUT_SECS", default_value = "10")]
    pub connect_timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, env = "USER_AGENT", default_value = concat!("rask-http-output/", env!("CARGO_PKG_VERSION")))]
    pub user_agent: String,

    /// Tag attached to records read from stdin
    #[arg(long, env = "TAG", default_value = "http")]
    pub tag: String,

    /// Records per deliver call
    #[arg(long, env = "BATCH_SIZE", default_value = "100")]
    pub batch_size: usize,

    /// Re-deliveries of a batch after a recoverable response
    #[arg(long, env = "MAX_RETRIES", default_value = "5")]
    pub max_retries: u32,

    /// Initial retry backoff in milliseconds, doubled per attempt
    #[arg(long, env = "RETRY_BASE_MS", default_value = "500")]
    pub retry_base_ms: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Configuration file path (optional, TOML)
    #[serde(skip)]
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            ssl_no_verify: false,
            http_method: "post".to_string(),
            serializer: "form".to_string(),
            rate_limit_msec: 0,
            raise_on_error: true,
            recoverable_status_codes: vec![503],
            custom_headers: "{}".to_string(),
            authentication: None,
            username: String::new(),
            password: Secret::default(),
            bulk_request: false,
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("rask-http-output/{}", env!("CARGO_PKG_VERSION")),
            tag: "http".to_string(),
            batch_size: 100,
            max_retries: 5,
            retry_base_ms: 500,
            log_level: LogLevel::Info,
            log_format: LogFormat::Compact,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses CLI arguments (with env fallbacks). When `--config-file` is
    /// given, the file replaces the whole surface.
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)?;

        if let Some(path) = &config.config_file {
            return Self::from_file(path);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(path.as_ref().to_path_buf());
        config.validate()?;
        Ok(config)
    }

    /// Host-side backoff for recoverable responses.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries.saturating_add(1),
            base_delay: Duration::from_millis(self.retry_base_ms),
            ..RetryPolicy::default()
        }
    }

    /// Resolves the raw option strings into the typed output settings.
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            endpoint_url: self.endpoint_url.clone(),
            ssl_no_verify: self.ssl_no_verify,
            http_method: HttpMethod::from_name(&self.http_method),
            serializer: SerializerKind::from_name(&self.serializer),
            rate_limit_msec: self.rate_limit_msec,
            raise_on_error: self.raise_on_error,
            recoverable_status_codes: self.recoverable_status_codes.iter().copied().collect::<BTreeSet<u16>>(),
            custom_headers: self.custom_headers.clone(),
            authentication: Authentication::from_name(self.authentication.as_deref()),
            username: self.username.clone(),
            password: self.password.clone(),
            bulk_request: self.bulk_request,
            timeout_secs: self.timeout_secs,
            connect_timeout_secs: self.connect_timeout_secs,
            user_agent: self.user_agent.clone(),
        }
    }
}
