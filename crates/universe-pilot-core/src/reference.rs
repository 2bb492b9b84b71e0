//! Reference data used to display names instead of ids

use crate::backfill::InFlight;
use platform_rs::{Certificate, KmsConfig, PlatformApi, Provider, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Providers, certificates and KMS configs known to the platform
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub providers: Vec<Provider>,
    pub certificates: Vec<Certificate>,
    pub kms_configs: Vec<KmsConfig>,
}

impl ReferenceData {
    pub fn provider_name(&self, uuid: &str) -> Option<&str> {
        self.providers
            .iter()
            .find(|p| p.uuid == uuid)
            .map(|p| p.name.as_str())
    }

    pub fn certificate_label(&self, uuid: &str) -> Option<&str> {
        self.certificates
            .iter()
            .find(|c| c.uuid == uuid)
            .map(|c| c.label.as_str())
    }

    pub fn kms_config_name(&self, uuid: &str) -> Option<&str> {
        self.kms_configs
            .iter()
            .find(|k| k.metadata.config_uuid == uuid)
            .map(|k| k.metadata.name.as_str())
    }
}

pub struct ReferenceLoader {
    api: Arc<dyn PlatformApi>,
    in_flight: Arc<AtomicUsize>,
}

impl ReferenceLoader {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self {
            api,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetch all reference lists at once; a failed list comes back empty
    pub async fn load(&self, cancel: &CancellationToken) -> ReferenceData {
        let (providers, certificates, kms_configs) = {
            let _guard = InFlight::start(&self.in_flight);
            tokio::join!(
                self.api.providers(),
                self.api.certificates(),
                self.api.kms_configs(),
            )
        };

        if cancel.is_cancelled() {
            tracing::debug!("Dropping reference data for closed review");
            return ReferenceData::default();
        }

        ReferenceData {
            providers: or_empty("providers", providers),
            certificates: or_empty("certificates", certificates),
            kms_configs: or_empty("KMS configs", kms_configs),
        }
    }
}

fn or_empty<T>(what: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to load {}: {}", what, e);
        Vec::new()
    })
}
