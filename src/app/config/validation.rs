use super::{Config, ConfigError};
use url::Url;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint_url.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Endpoint URL is required (--endpoint-url or ENDPOINT_URL)".to_string(),
            ));
        }

        // Placeholders are substituted per request
        let probe = self.endpoint_url.replace("${tag}", "").replace("${time}", "");
        let url = Url::parse(&probe).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid endpoint URL '{}': {}", self.endpoint_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "Endpoint URL '{}' must use http or https",
                self.endpoint_url
            )));
        }

        if let Some(code) = self
            .recoverable_status_codes
            .iter()
            .find(|code| !(100..=599).contains(*code))
        {
            return Err(ConfigError::InvalidConfig(format!(
                "Recoverable status code {code} is not a valid HTTP status"
            )));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Batch size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
