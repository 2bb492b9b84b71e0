//! HTTP client for the platform API

use crate::api::PlatformApi;
use crate::config::PlatformConfig;
use crate::error::{PlatformError, Result};
use crate::types::{
    AccessKey, Certificate, InstanceType, KmsConfig, Provider, Universe, UniverseDetails,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON-over-HTTP implementation of [`PlatformApi`]
#[derive(Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    /// Create a client from a loaded config
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.customer_url(),
        })
    }

    /// Create a client using the config at the default location
    pub fn from_default_config() -> Result<Self> {
        Self::new(&PlatformConfig::load_default()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.url(path);
        tracing::debug!("{} {}", method, url);
        let response = self.client.request(method, &url).json(body).send().await?;
        decode(response).await
    }
}

/// Turn a response into a value, or into an API error carrying the server's message
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(api_error(status.as_u16(), &body));
    }
    // Submission endpoints may answer with an empty body
    let body: &str = if body.trim().is_empty() { "null" } else { &body };
    Ok(serde_json::from_str(body)?)
}

/// Build an API error from a failed response body.
///
/// The platform reports failures as `{"error": "..."}`; anything else is
/// reported by status code.
fn api_error(status: u16, body: &str) -> PlatformError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("error") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) if !other.is_null() => Some(other.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("Request failed with status code {}", status));
    PlatformError::Api { status, message }
}

#[async_trait]
impl PlatformApi for PlatformClient {
    async fn db_versions(&self) -> Result<Vec<String>> {
        self.get("releases").await
    }

    async fn instance_types(&self, provider_uuid: &str) -> Result<Vec<InstanceType>> {
        self.get(&format!("providers/{}/instance_types", provider_uuid))
            .await
    }

    async fn access_keys(&self, provider_uuid: &str) -> Result<Vec<AccessKey>> {
        self.get(&format!("providers/{}/access_keys", provider_uuid))
            .await
    }

    async fn providers(&self) -> Result<Vec<Provider>> {
        self.get("providers").await
    }

    async fn certificates(&self) -> Result<Vec<Certificate>> {
        self.get("certificates").await
    }

    async fn kms_configs(&self) -> Result<Vec<KmsConfig>> {
        self.get("kms_configs").await
    }

    async fn universe(&self, universe_uuid: &str) -> Result<Universe> {
        self.get(&format!("universes/{}", universe_uuid)).await
    }

    async fn universe_configure(&self, payload: &UniverseDetails) -> Result<UniverseDetails> {
        self.send_json(reqwest::Method::POST, "universe_configure", payload)
            .await
    }

    async fn universe_create(&self, payload: &UniverseDetails) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(reqwest::Method::POST, "universes", payload)
            .await?;
        Ok(())
    }

    async fn universe_edit(&self, payload: &UniverseDetails, universe_uuid: &str) -> Result<()> {
        let _: serde_json::Value = self
            .send_json(
                reqwest::Method::PUT,
                &format!("universes/{}", universe_uuid),
                payload,
            )
            .await?;
        Ok(())
    }
}
