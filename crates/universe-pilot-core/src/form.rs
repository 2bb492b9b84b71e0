//! Wizard form model
//!
//! `WizardFormData` is everything the wizard steps collect. It is only ever
//! changed through [`crate::session::WizardSession::dispatch`].

use crate::error::{Result, WizardError};
use platform_rs::{
    CommunicationPorts, DeviceInfo, FlagList, KeyOp, PlacementAz, Provider, Universe,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Editable representation of tags and server flags
pub type FlagMap = BTreeMap<String, String>;

/// Replication factors offered by the cloud step
pub const REPLICATION_FACTOR_OPTIONS: &[u32] = &[1, 3, 5, 7];

/// One zone selected in the cloud step
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacementEntry {
    /// Zone UUID
    pub uuid: String,
    pub name: String,
    pub replication_factor: u32,
    pub subnet: String,
    #[serde(rename = "numNodesInAZ")]
    pub num_nodes_in_az: u32,
    /// Derived from the preferred leaders selection when a payload is built
    pub is_affinitized: bool,
    pub parent_region_id: String,
    pub parent_region_code: String,
    pub parent_region_name: String,
}

impl PlacementEntry {
    /// Zone record without its parent region fields
    pub fn to_zone(&self) -> PlacementAz {
        PlacementAz {
            uuid: self.uuid.clone(),
            name: self.name.clone(),
            replication_factor: self.replication_factor,
            subnet: self.subnet.clone(),
            num_nodes_in_az: self.num_nodes_in_az,
            is_affinitized: self.is_affinitized,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CloudConfig {
    pub universe_name: String,
    pub provider: Option<Provider>,
    pub region_list: Vec<String>,
    pub total_nodes: u32,
    pub replication_factor: u32,
    pub auto_placement: bool,
    pub placements: Vec<PlacementEntry>,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            universe_name: String::new(),
            provider: None,
            region_list: Vec::new(),
            total_nodes: 3,
            replication_factor: 3,
            auto_placement: true,
            placements: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InstanceConfig {
    pub instance_type: Option<String>,
    pub device_info: Option<DeviceInfo>,
    pub instance_tags: FlagMap,
    #[serde(rename = "assignPublicIP")]
    pub assign_public_ip: bool,
    pub aws_arn_string: Option<String>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            instance_type: None,
            device_info: None,
            instance_tags: FlagMap::new(),
            assign_public_ip: true,
            aws_arn_string: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DbConfig {
    pub yb_software_version: Option<String>,
    pub preferred_leaders: Vec<PlacementEntry>,
    pub communication_ports: CommunicationPorts,
    #[serde(rename = "masterGFlags")]
    pub master_g_flags: FlagMap,
    #[serde(rename = "tserverGFlags")]
    pub tserver_g_flags: FlagMap,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SecurityConfig {
    pub enable_authentication: bool,
    pub enable_node_to_node_encrypt: bool,
    pub enable_client_to_node_encrypt: bool,
    #[serde(rename = "rootCA")]
    pub root_ca: Option<String>,
    pub enable_encryption_at_rest: bool,
    /// KMS config UUID
    pub kms_config: Option<String>,
}

/// Required fields that have no dedicated step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HiddenConfig {
    pub access_key_code: Option<String>,
    #[serde(rename = "enableYSQL")]
    pub enable_ysql: bool,
    #[serde(rename = "userAZSelected")]
    pub user_az_selected: bool,
    pub use_time_sync: bool,
    pub install_node_exporter: bool,
}

impl Default for HiddenConfig {
    fn default() -> Self {
        Self {
            access_key_code: None,
            enable_ysql: true,
            user_az_selected: false,
            use_time_sync: true,
            install_node_exporter: true,
        }
    }
}

/// All wizard input
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WizardFormData {
    pub cloud_config: CloudConfig,
    pub instance_config: InstanceConfig,
    pub db_config: DbConfig,
    pub security_config: SecurityConfig,
    pub hidden_config: HiddenConfig,
}

/// A string field counts as set only when it is non-empty
pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Convert a wire flag list into an editable map
pub fn flags_to_map(flags: &FlagList) -> FlagMap {
    flags
        .iter()
        .map(|f| (f.name.clone(), f.value.clone()))
        .collect()
}

impl WizardFormData {
    /// Selected provider UUID, if any
    pub fn provider_uuid(&self) -> Option<&str> {
        self.cloud_config
            .provider
            .as_ref()
            .map(|p| p.uuid.as_str())
            .filter(|uuid| !uuid.is_empty())
    }

    /// Seed a form from an existing universe's primary cluster
    pub fn from_universe(universe: &Universe) -> Result<Self> {
        let details = &universe.universe_details;
        let cluster = details.primary_cluster().ok_or(WizardError::MissingCluster)?;
        let intent = &cluster.user_intent;

        let placements: Vec<PlacementEntry> = cluster
            .placement_info
            .iter()
            .flat_map(|info| info.cloud_list.first())
            .flat_map(|cloud| cloud.region_list.iter())
            .flat_map(|region| {
                region.az_list.iter().map(move |zone| PlacementEntry {
                    uuid: zone.uuid.clone(),
                    name: zone.name.clone(),
                    replication_factor: zone.replication_factor,
                    subnet: zone.subnet.clone(),
                    num_nodes_in_az: zone.num_nodes_in_az,
                    is_affinitized: zone.is_affinitized,
                    parent_region_id: region.uuid.clone(),
                    parent_region_code: region.code.clone(),
                    parent_region_name: region.name.clone(),
                })
            })
            .collect();

        let preferred_leaders = placements
            .iter()
            .filter(|p| p.is_affinitized)
            .cloned()
            .collect();

        let encryption = details.encryption_at_rest_config.clone().unwrap_or_default();

        Ok(Self {
            cloud_config: CloudConfig {
                universe_name: intent.universe_name.clone(),
                provider: non_empty(&intent.provider).map(|uuid| Provider {
                    uuid,
                    code: intent.provider_type,
                    name: String::new(),
                }),
                region_list: intent.region_list.clone(),
                total_nodes: intent.num_nodes,
                replication_factor: intent.replication_factor,
                auto_placement: !details.user_az_selected,
                placements,
            },
            instance_config: InstanceConfig {
                instance_type: non_empty(&intent.instance_type),
                device_info: intent.device_info.clone(),
                instance_tags: flags_to_map(&intent.instance_tags),
                assign_public_ip: intent.assign_public_ip,
                aws_arn_string: non_empty(&intent.aws_arn_string),
            },
            db_config: DbConfig {
                yb_software_version: intent.yb_software_version.clone(),
                preferred_leaders,
                communication_ports: details.communication_ports.clone().unwrap_or_default(),
                master_g_flags: flags_to_map(&intent.master_g_flags),
                tserver_g_flags: flags_to_map(&intent.tserver_g_flags),
            },
            security_config: SecurityConfig {
                enable_authentication: false,
                enable_node_to_node_encrypt: intent.enable_node_to_node_encrypt,
                enable_client_to_node_encrypt: intent.enable_client_to_node_encrypt,
                root_ca: details.root_ca.clone(),
                enable_encryption_at_rest: encryption.key_op == KeyOp::Enable,
                kms_config: encryption.config_uuid,
            },
            hidden_config: HiddenConfig {
                access_key_code: intent.access_key_code.clone(),
                enable_ysql: intent.enable_ysql,
                user_az_selected: details.user_az_selected,
                use_time_sync: intent.use_time_sync,
                install_node_exporter: details
                    .extra_dependencies
                    .as_ref()
                    .map(|d| d.install_node_exporter)
                    .unwrap_or(true),
            },
        })
    }

    /// Cross-field checks the cloud step enforces
    pub fn validate(&self) -> Result<()> {
        let cloud = &self.cloud_config;
        if !REPLICATION_FACTOR_OPTIONS.contains(&cloud.replication_factor) {
            return Err(WizardError::InvalidForm(format!(
                "replication factor must be one of {:?}, got {}",
                REPLICATION_FACTOR_OPTIONS, cloud.replication_factor
            )));
        }
        if cloud.total_nodes < cloud.replication_factor {
            return Err(WizardError::InvalidForm(format!(
                "total nodes ({}) must be at least the replication factor ({})",
                cloud.total_nodes, cloud.replication_factor
            )));
        }
        Ok(())
    }
}
