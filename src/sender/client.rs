use super::config::OutputConfig;
use super::request::RequestDescriptor;
use crate::domain::OutputError;
use reqwest::{Client, ClientBuilder, Response, redirect};

/// Thin wrapper over a pooled reqwest client carrying the TLS policy and
/// transport timeouts of one output.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    verify_tls: bool,
}

impl HttpClient {
    pub fn new(config: &OutputConfig) -> Result<Self, OutputError> {
        let verify_tls = !config.ssl_no_verify;

        let client = ClientBuilder::new()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .danger_accept_invalid_certs(!verify_tls)
            // 3xx responses go to the classifier like any other status
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| OutputError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, verify_tls })
    }

    pub fn verifies_tls(&self) -> bool {
        self.verify_tls
    }

    /// Issues the request. Non-2xx statuses are returned as responses, only
    /// transport failures come back as errors.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<Response, reqwest::Error> {
        let RequestDescriptor {
            method,
            url,
            body,
            headers,
            basic_auth,
            ..
        } = descriptor;

        let mut request = self
            .client
            .request(method.to_reqwest(), url)
            .headers(headers)
            .body(body);

        if let Some(auth) = basic_auth {
            request = request.basic_auth(auth.username, Some(auth.password.expose()));
        }

        request.send().await
    }
}

/// Short label for the failure class of a transport error.
pub fn error_kind(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect"
    } else if error.is_body() {
        "body"
    } else if error.is_decode() {
        "decode"
    } else if error.is_request() {
        "request"
    } else {
        "transport"
    }
}
