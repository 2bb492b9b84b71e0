//! Backfill of required fields the user left unset
//!
//! The review step can be reached with some required fields still empty.
//! Each of them is resolved from the platform (latest software version,
//! preset instance type, the provider's access key) and written back into the
//! session. The three lookups run concurrently and are independent of each
//! other.

use crate::form::{WizardFormData, is_set};
use crate::instance::{device_info_from_instance, pick_instance};
use crate::session::{ClusterOperation, WizardAction, WizardSession};
use crate::version::latest_version;
use platform_rs::PlatformApi;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Required field the resolver can fill in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillField {
    SoftwareVersion,
    InstanceType,
    AccessKey,
}

impl BackfillField {
    pub fn label(&self) -> &'static str {
        match self {
            BackfillField::SoftwareVersion => "DB version",
            BackfillField::InstanceType => "Instance type",
            BackfillField::AccessKey => "Access key",
        }
    }
}

/// Result of resolving one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    /// Field already had a value
    AlreadySet,
    /// Resolved and dispatched
    Populated(String),
    /// Preconditions for the lookup are not met
    NotAttempted(String),
    /// Lookup failed or returned nothing usable
    Unavailable(String),
    /// The step was torn down before the value could be stored
    Cancelled,
}

impl FieldOutcome {
    fn is_resolved(&self) -> bool {
        matches!(self, FieldOutcome::AlreadySet | FieldOutcome::Populated(_))
    }

    fn reason(&self) -> Option<&str> {
        match self {
            FieldOutcome::NotAttempted(reason) | FieldOutcome::Unavailable(reason) => {
                Some(reason)
            }
            FieldOutcome::Cancelled => Some("cancelled"),
            _ => None,
        }
    }
}

/// Outcome of one resolver pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillReport {
    pub software_version: FieldOutcome,
    pub instance_type: FieldOutcome,
    pub access_key: FieldOutcome,
}

impl BackfillReport {
    /// Fields that are still missing, with the reason
    pub fn unresolved(&self) -> Vec<(BackfillField, String)> {
        [
            (BackfillField::SoftwareVersion, &self.software_version),
            (BackfillField::InstanceType, &self.instance_type),
            (BackfillField::AccessKey, &self.access_key),
        ]
        .into_iter()
        .filter(|(_, outcome)| !outcome.is_resolved())
        .map(|(field, outcome)| (field, outcome.reason().unwrap_or_default().to_string()))
        .collect()
    }
}

/// Whether every required field has a value, however it got there
pub fn is_populated(form: &WizardFormData) -> bool {
    is_set(&form.db_config.yb_software_version)
        && is_set(&form.instance_config.instance_type)
        && is_set(&form.hidden_config.access_key_code)
}

/// Counts a lookup as in flight for as long as it lives
pub(crate) struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub(crate) fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct BackfillResolver {
    api: Arc<dyn PlatformApi>,
    in_flight: Arc<AtomicUsize>,
}

impl BackfillResolver {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        Self {
            api,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// True while any lookup is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Resolve every missing required field
    pub async fn resolve(
        &self,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> BackfillReport {
        let form = session.snapshot();
        let (software_version, instance_type, access_key) = tokio::join!(
            self.resolve_software_version(&form, session, cancel),
            self.resolve_instance_type(&form, session, cancel),
            self.resolve_access_key(&form, session, cancel),
        );
        BackfillReport {
            software_version,
            instance_type,
            access_key,
        }
    }

    async fn resolve_software_version(
        &self,
        form: &WizardFormData,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> FieldOutcome {
        if is_set(&form.db_config.yb_software_version) {
            return FieldOutcome::AlreadySet;
        }

        let versions = {
            let _guard = InFlight::start(&self.in_flight);
            self.api.db_versions().await
        };
        let versions = match versions {
            Ok(versions) => versions,
            Err(e) => {
                tracing::error!("Failed to load DB versions: {}", e);
                return FieldOutcome::Unavailable(format!("failed to load DB versions: {}", e));
            }
        };

        let Some(latest) = latest_version(&versions) else {
            tracing::error!("Failed to load DB versions: platform returned none");
            return FieldOutcome::Unavailable("no DB versions available".to_string());
        };

        if cancel.is_cancelled() {
            tracing::debug!("Dropping DB version {} for closed review", latest);
            return FieldOutcome::Cancelled;
        }
        session.dispatch(WizardAction::SetSoftwareVersion(latest.clone()));
        FieldOutcome::Populated(latest.clone())
    }

    async fn resolve_instance_type(
        &self,
        form: &WizardFormData,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> FieldOutcome {
        if is_set(&form.instance_config.instance_type) {
            return FieldOutcome::AlreadySet;
        }
        let Some(provider) = form.cloud_config.provider.as_ref().filter(|p| !p.uuid.is_empty())
        else {
            return FieldOutcome::NotAttempted("no provider selected".to_string());
        };

        let instances = {
            let _guard = InFlight::start(&self.in_flight);
            self.api.instance_types(&provider.uuid).await
        };
        let instances = match instances {
            Ok(instances) => instances,
            Err(e) => {
                tracing::error!(
                    "Failed to load instance types for the provider {}: {}",
                    provider.uuid,
                    e
                );
                return FieldOutcome::Unavailable(format!("failed to load instance types: {}", e));
            }
        };

        let Some(instance) = pick_instance(&instances, provider.code) else {
            tracing::error!(
                "Failed to load instance types for the provider {}",
                provider.uuid
            );
            return FieldOutcome::Unavailable(format!(
                "no suitable instance type for provider {}",
                provider.uuid
            ));
        };

        if cancel.is_cancelled() {
            tracing::debug!(
                "Dropping instance type {} for closed review",
                instance.instance_type_code
            );
            return FieldOutcome::Cancelled;
        }
        session.dispatch(WizardAction::SetInstance {
            instance_type: instance.instance_type_code.clone(),
            device_info: device_info_from_instance(instance),
        });
        FieldOutcome::Populated(instance.instance_type_code.clone())
    }

    async fn resolve_access_key(
        &self,
        form: &WizardFormData,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> FieldOutcome {
        if is_set(&form.hidden_config.access_key_code) {
            return FieldOutcome::AlreadySet;
        }
        // Edits keep the key of the universe being edited
        if session.operation() != ClusterOperation::NewPrimary {
            return FieldOutcome::NotAttempted(
                "access key is only resolved for new universes".to_string(),
            );
        }
        let Some(provider_uuid) = form.provider_uuid() else {
            return FieldOutcome::NotAttempted("no provider selected".to_string());
        };

        let keys = {
            let _guard = InFlight::start(&self.in_flight);
            self.api.access_keys(provider_uuid).await
        };
        let keys = match keys {
            Ok(keys) => keys,
            Err(e) => {
                tracing::error!(
                    "Failed to load access key for the provider {}: {}",
                    provider_uuid,
                    e
                );
                return FieldOutcome::Unavailable(format!("failed to load access keys: {}", e));
            }
        };

        // There is a single access key per provider
        let Some(key) = keys.first() else {
            tracing::error!("Failed to load access key for the provider {}", provider_uuid);
            return FieldOutcome::Unavailable(format!(
                "provider {} has no access key",
                provider_uuid
            ));
        };

        if cancel.is_cancelled() {
            tracing::debug!("Dropping access key for closed review");
            return FieldOutcome::Cancelled;
        }
        session.dispatch(WizardAction::SetAccessKeyCode(key.id_key.key_code.clone()));
        FieldOutcome::Populated(key.id_key.key_code.clone())
    }
}
