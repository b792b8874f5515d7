//! Credential resolution
//!
//! Credentials come either from static configuration or from a credential
//! server answering `GET <base>/session` with `{apiKey, sessionId, token}`.
//! Any failure here is fatal to startup.

use reqwest::Client;
use tracing::{error, info};

use crate::error::CallError;
use crate::model::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Static(Credentials),
    Remote { base_url: String },
}

impl CredentialSource {
    /// Prefer complete static credentials, fall back to the credential server.
    pub fn select(
        static_credentials: Option<Credentials>,
        base_url: Option<&str>,
    ) -> Result<Self, CallError> {
        if let Some(creds) = static_credentials.filter(Credentials::is_complete) {
            return Ok(CredentialSource::Static(creds));
        }

        match base_url.filter(|u| !u.is_empty()) {
            Some(url) => Ok(CredentialSource::Remote {
                base_url: url.to_string(),
            }),
            None => Err(CallError::Config(
                "no API key, session id and token configured and no credential server URL"
                    .to_string(),
            )),
        }
    }

    pub async fn resolve(&self) -> Result<Credentials, CallError> {
        match self {
            CredentialSource::Static(creds) => {
                info!("Using statically configured credentials");
                Ok(creds.clone())
            }
            CredentialSource::Remote { base_url } => {
                let result = CredentialClient::new(base_url).fetch().await;
                if let Err(e) = &result {
                    error!("[General] {}", e);
                    info!(
                        "Failed to get session id and token. Make sure the credential server URL is configured."
                    );
                }
                result
            }
        }
    }
}

/// Client for the credential server.
#[derive(Debug, Clone)]
pub struct CredentialClient {
    base_url: String,
    http: Client,
}

impl CredentialClient {
    pub fn new(base_url: &str) -> Self {
        CredentialClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn session_url(&self) -> String {
        format!("{}/session", self.base_url)
    }

    /// Fetch credentials. Non-2xx responses, bodies that are not the expected
    /// JSON, and empty fields are all errors.
    pub async fn fetch(&self) -> Result<Credentials, CallError> {
        let url = self.session_url();
        info!("Fetching credentials from {}", url);

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CallError::CredentialFetch(format!(
                "GET {url} returned {status}"
            )));
        }

        let credentials: Credentials = response
            .json()
            .await
            .map_err(|e| CallError::CredentialFetch(format!("malformed response: {e}")))?;

        if !credentials.is_complete() {
            return Err(CallError::CredentialFetch(
                "response is missing apiKey, sessionId or token".to_string(),
            ));
        }

        Ok(credentials)
    }
}
