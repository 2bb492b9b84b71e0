//! The platform API surface used by the universe wizard

use crate::error::Result;
use crate::types::{
    AccessKey, Certificate, InstanceType, KmsConfig, Provider, Universe, UniverseDetails,
};
use async_trait::async_trait;

/// Calls the wizard makes against the platform.
///
/// `universe_configure` is a planning call with no side effects and may be
/// called any number of times. `universe_create` and `universe_edit` change
/// real infrastructure.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    /// Available database software versions, unsorted
    async fn db_versions(&self) -> Result<Vec<String>>;

    async fn instance_types(&self, provider_uuid: &str) -> Result<Vec<InstanceType>>;

    /// Access keys of a provider (there is one per provider)
    async fn access_keys(&self, provider_uuid: &str) -> Result<Vec<AccessKey>>;

    async fn providers(&self) -> Result<Vec<Provider>>;

    async fn certificates(&self) -> Result<Vec<Certificate>>;

    async fn kms_configs(&self) -> Result<Vec<KmsConfig>>;

    /// Full definition of an existing universe
    async fn universe(&self, universe_uuid: &str) -> Result<Universe>;

    /// Validate a payload and return the resolved topology
    async fn universe_configure(&self, payload: &UniverseDetails) -> Result<UniverseDetails>;

    async fn universe_create(&self, payload: &UniverseDetails) -> Result<()>;

    async fn universe_edit(&self, payload: &UniverseDetails, universe_uuid: &str) -> Result<()>;
}
