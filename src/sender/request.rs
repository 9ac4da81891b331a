//! Request construction: URL, verb, body, custom headers and basic auth,
//! packed into an immutable [`RequestDescriptor`].

use super::config::OutputConfig;
use super::serialization::{self, SerializerKind};
use crate::domain::{EventTime, OutputError, Payload, Secret};
use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use tracing::debug;
use url::Url;

const TAG_PLACEHOLDER: &str = "${tag}";
const TIME_PLACEHOLDER: &str = "${time}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    Get,
    Put,
    #[default]
    Post,
    Delete,
}

impl HttpMethod {
    /// Resolves a configured method name. Unknown names fall back to POST.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "get" => Self::Get,
            "put" => Self::Put,
            "delete" => Self::Delete,
            _ => Self::Post,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authentication {
    #[default]
    None,
    Basic,
}

impl Authentication {
    /// Only `basic` enables authentication; anything else means none.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(|n| n.trim().to_ascii_lowercase()) {
            Some(n) if n == "basic" => Self::Basic,
            _ => Self::None,
        }
    }
}

impl<'de> Deserialize<'de> for Authentication {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_name(name.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicAuth {
    pub username: String,
    pub password: Secret,
}

/// Everything needed to issue one HTTP request. Consumed by the dispatcher.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: Url,
    pub body: Bytes,
    pub content_type: &'static str,
    /// Content type followed by the custom headers, which win on conflict.
    pub headers: HeaderMap,
    pub basic_auth: Option<BasicAuth>,
}

impl RequestDescriptor {
    pub fn path(&self) -> &str {
        self.url.path()
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    endpoint_template: String,
    method: HttpMethod,
    serializer: SerializerKind,
    custom_headers: HeaderMap,
    basic_auth: Option<BasicAuth>,
}

impl RequestBuilder {
    /// Parses the custom header blob and validates the endpoint up front.
    pub fn new(config: &OutputConfig) -> Result<Self, OutputError> {
        let custom_headers = parse_custom_headers(&config.custom_headers)?;

        let basic_auth = match config.authentication {
            Authentication::Basic => Some(BasicAuth {
                username: config.username.clone(),
                password: config.password.clone(),
            }),
            Authentication::None => None,
        };

        let builder = Self {
            endpoint_template: config.endpoint_url.clone(),
            method: config.http_method,
            serializer: config.effective_serializer(),
            custom_headers,
            basic_auth,
        };

        builder.resolve_url("", None)?;
        Ok(builder)
    }

    pub fn serializer(&self) -> SerializerKind {
        self.serializer
    }

    pub fn build(
        &self,
        tag: &str,
        time: EventTime,
        payload: Payload,
    ) -> Result<RequestDescriptor, OutputError> {
        let url = self.resolve_url(tag, time)?;
        let body = serialization::encode(self.serializer, time, payload)?;

        let mut headers = HeaderMap::with_capacity(self.custom_headers.len() + 1);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type));
        for (name, value) in &self.custom_headers {
            headers.insert(name.clone(), value.clone());
        }

        debug!(
            "Built {} {} ({} bytes, {})",
            self.method,
            url,
            body.bytes.len(),
            body.content_type
        );

        Ok(RequestDescriptor {
            method: self.method,
            url,
            body: body.bytes,
            content_type: body.content_type,
            headers,
            basic_auth: self.basic_auth.clone(),
        })
    }

    /// Substitutes `${tag}` and `${time}` and parses the result.
    pub fn resolve_url(&self, tag: &str, time: EventTime) -> Result<Url, OutputError> {
        let mut raw = self.endpoint_template.clone();
        if raw.contains(TAG_PLACEHOLDER) {
            let encoded: String = url::form_urlencoded::byte_serialize(tag.as_bytes()).collect();
            raw = raw.replace(TAG_PLACEHOLDER, &encoded);
        }
        if raw.contains(TIME_PLACEHOLDER) {
            let time = time.map(|t| t.to_string()).unwrap_or_default();
            raw = raw.replace(TIME_PLACEHOLDER, &time);
        }

        let url = Url::parse(&raw).map_err(|e| {
            OutputError::config(format!("Invalid endpoint URL '{}': {}", self.endpoint_template, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(OutputError::config(format!(
                "Unsupported endpoint scheme '{other}' in '{}'",
                self.endpoint_template
            ))),
        }
    }
}

/// Parses a JSON object of header name to value. String values are used
/// verbatim, other JSON values by their JSON text.
pub fn parse_custom_headers(blob: &str) -> Result<HeaderMap, OutputError> {
    let parsed: Value = serde_json::from_str(blob)
        .map_err(|e| OutputError::config(format!("Malformed custom_headers JSON: {e}")))?;

    let Value::Object(entries) = parsed else {
        return Err(OutputError::config(
            "custom_headers must be a JSON object".to_string(),
        ));
    };

    let mut headers = HeaderMap::with_capacity(entries.len());
    for (name, value) in entries {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };

        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| OutputError::config(format!("Invalid header name '{name}': {e}")))?;
        let header_value = HeaderValue::from_str(&text)
            .map_err(|e| OutputError::config(format!("Invalid value for header '{name}': {e}")))?;

        headers.insert(header_name, header_value);
    }

    Ok(headers)
}
