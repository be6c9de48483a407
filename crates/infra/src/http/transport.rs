//! reqwest-backed [`Transport`] for the collection service

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use sensorlink_core::{Transport, TransportOutcome};
use sensorlink_domain::{ApiConfig, Result};
use tracing::debug;

use super::client::HttpClient;
use crate::config::validate_base_url;
use crate::errors::describe_http_failure;

/// POSTs JSON bodies to `{base_url}{endpoint}`.
///
/// Any failure to obtain a complete response (connect, DNS, TLS, timeout, or
/// a body cut off mid-read) is reported as
/// [`TransportOutcome::ConnectivityFailure`]. Non-2xx statuses are ordinary
/// responses.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: HttpClient,
    base_url: String,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns `Config` if `base_url` is not an http(s) URL.
    pub fn new(client: HttpClient, base_url: &str) -> Result<Self> {
        validate_base_url(base_url)?;
        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    /// Build a transport with its own client from the `api` config section.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the URL is invalid or the client cannot be built.
    pub fn from_config(api: &ApiConfig) -> Result<Self> {
        let mut builder = HttpClient::builder().timeout(api.timeout());
        if let Some(agent) = &api.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        Self::new(builder.build()?, &api.base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, endpoint: &str, body: &str, token: &str) -> TransportOutcome {
        let mut request = self
            .client
            .request(Method::POST, self.url_for(endpoint))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_owned());

        if !token.is_empty() {
            request = request.bearer_auth(token);
        }

        let response = match self.client.send(request).await {
            Ok(response) => response,
            Err(err) => return TransportOutcome::connectivity_failure(describe_http_failure(&err)),
        };

        let status = response.status().as_u16();

        // A status line without a complete body is still a lost response.
        match response.text().await {
            Ok(body) => {
                debug!(endpoint, status, body_len = body.len(), "collection service responded");
                TransportOutcome::response(status, body)
            }
            Err(err) => TransportOutcome::connectivity_failure(describe_http_failure(&err)),
        }
    }
}
