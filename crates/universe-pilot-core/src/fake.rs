//! In-memory platform used by the unit tests

use async_trait::async_trait;
use platform_rs::{
    AccessKey, AccessKeyId, Certificate, InstanceType, KmsConfig, KmsConfigMetadata,
    NodeDetails, PlatformApi, PlatformError, Provider, Result, Universe, UniverseDetails,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

type ConfigureFn = Box<dyn Fn(&UniverseDetails) -> UniverseDetails + Send + Sync>;

pub(crate) struct FakePlatform {
    pub versions: Vec<String>,
    pub instances: Vec<InstanceType>,
    pub access_keys: Vec<AccessKey>,
    pub providers: Vec<Provider>,
    pub certificates: Vec<Certificate>,
    pub kms_configs: Vec<KmsConfig>,
    pub universe: Option<Universe>,
    /// Nodes returned by every configure call
    pub nodes: Vec<NodeDetails>,
    /// Replaces the default configure behaviour
    pub configure_fn: Option<ConfigureFn>,
    /// 1-based configure call that fails
    pub fail_configure_on: Option<usize>,
    pub fail_lookups: bool,
    pub submit_error: Option<String>,
    /// Create and edit wait for this before answering
    pub submit_gate: Option<Arc<Notify>>,
    /// Signalled when a create or edit starts
    pub submit_started: Arc<Notify>,
    /// Lookups wait for this before answering
    pub lookup_gate: Option<Arc<Notify>>,
    /// Signalled when a lookup starts
    pub lookup_started: Arc<Notify>,
    /// Configure waits for this before answering
    pub configure_gate: Option<Arc<Notify>>,
    /// Signalled when a configure call starts
    pub configure_started: Arc<Notify>,
    pub calls: Mutex<HashMap<&'static str, usize>>,
    pub configure_requests: Mutex<Vec<UniverseDetails>>,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            versions: Vec::new(),
            instances: Vec::new(),
            access_keys: Vec::new(),
            providers: Vec::new(),
            certificates: Vec::new(),
            kms_configs: Vec::new(),
            universe: None,
            nodes: Vec::new(),
            configure_fn: None,
            fail_configure_on: None,
            fail_lookups: false,
            submit_error: None,
            submit_gate: None,
            submit_started: Arc::new(Notify::new()),
            lookup_gate: None,
            lookup_started: Arc::new(Notify::new()),
            configure_gate: None,
            configure_started: Arc::new(Notify::new()),
            calls: Mutex::new(HashMap::new()),
            configure_requests: Mutex::new(Vec::new()),
        }
    }
}

pub(crate) fn make_access_key(code: &str) -> AccessKey {
    AccessKey {
        id_key: AccessKeyId {
            key_code: code.to_string(),
            provider_uuid: Some("p-1".to_string()),
        },
    }
}

pub(crate) fn make_kms(uuid: &str, name: &str) -> KmsConfig {
    KmsConfig {
        metadata: KmsConfigMetadata {
            config_uuid: uuid.to_string(),
            name: name.to_string(),
            provider: Some("AWS".to_string()),
        },
    }
}

/// Configure response as the real server tends to return it: lossy fields dropped
pub(crate) fn mangle(request: &UniverseDetails) -> UniverseDetails {
    let mut response = request.clone();
    response.cluster_operation = None;
    response.current_cluster_type = None;
    response.encryption_at_rest_config = None;
    for cluster in &mut response.clusters {
        cluster.user_intent.instance_tags.clear();
        cluster.user_intent.master_g_flags.clear();
        cluster.user_intent.tserver_g_flags.clear();
    }
    response
}

impl FakePlatform {
    fn record(&self, name: &'static str) -> usize {
        let mut calls = self.calls.lock().unwrap();
        let count = calls.entry(name).or_insert(0);
        *count += 1;
        *count
    }

    /// Number of times a call was made
    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    /// Total number of calls of any kind
    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    /// Payloads sent to configure, in order
    pub fn configure_requests(&self) -> Vec<UniverseDetails> {
        self.configure_requests.lock().unwrap().clone()
    }

    async fn lookup<T: Clone + Sync>(&self, items: &[T]) -> Result<Vec<T>> {
        self.lookup_started.notify_one();
        if let Some(gate) = &self.lookup_gate {
            gate.notified().await;
        }
        if self.fail_lookups {
            return Err(PlatformError::Api {
                status: 500,
                message: "lookup failed".to_string(),
            });
        }
        Ok(items.to_vec())
    }

    async fn submit(&self) -> Result<()> {
        self.submit_started.notify_one();
        if let Some(gate) = &self.submit_gate {
            gate.notified().await;
        }
        match &self.submit_error {
            Some(message) => Err(PlatformError::Api {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PlatformApi for FakePlatform {
    async fn db_versions(&self) -> Result<Vec<String>> {
        self.record("db_versions");
        self.lookup(&self.versions).await
    }

    async fn instance_types(&self, _provider_uuid: &str) -> Result<Vec<InstanceType>> {
        self.record("instance_types");
        self.lookup(&self.instances).await
    }

    async fn access_keys(&self, _provider_uuid: &str) -> Result<Vec<AccessKey>> {
        self.record("access_keys");
        self.lookup(&self.access_keys).await
    }

    async fn providers(&self) -> Result<Vec<Provider>> {
        self.record("providers");
        self.lookup(&self.providers).await
    }

    async fn certificates(&self) -> Result<Vec<Certificate>> {
        self.record("certificates");
        self.lookup(&self.certificates).await
    }

    async fn kms_configs(&self) -> Result<Vec<KmsConfig>> {
        self.record("kms_configs");
        self.lookup(&self.kms_configs).await
    }

    async fn universe(&self, universe_uuid: &str) -> Result<Universe> {
        self.record("universe");
        self.universe.clone().ok_or_else(|| PlatformError::Api {
            status: 404,
            message: format!("Universe {} not found", universe_uuid),
        })
    }

    async fn universe_configure(&self, payload: &UniverseDetails) -> Result<UniverseDetails> {
        let call = self.record("universe_configure");
        self.configure_requests.lock().unwrap().push(payload.clone());
        self.configure_started.notify_one();

        if let Some(gate) = &self.configure_gate {
            gate.notified().await;
        }

        if self.fail_configure_on == Some(call) {
            return Err(PlatformError::Api {
                status: 400,
                message: format!("configure call {} rejected", call),
            });
        }

        let mut response = match &self.configure_fn {
            Some(f) => f(payload),
            None => mangle(payload),
        };
        response.node_details_set = self.nodes.clone();
        Ok(response)
    }

    async fn universe_create(&self, _payload: &UniverseDetails) -> Result<()> {
        self.record("universe_create");
        self.submit().await
    }

    async fn universe_edit(&self, _payload: &UniverseDetails, _universe_uuid: &str) -> Result<()> {
        self.record("universe_edit");
        self.submit().await
    }
}
