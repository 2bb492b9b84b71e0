//! Wire types for the platform API
//!
//! Field names follow the platform's JSON shape. Types the server owns keep
//! any field they don't model in an `extra` map so a payload fetched from the
//! server can be sent back without losing data.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields of a server payload this crate does not model
pub type ExtraFields = Map<String, Value>;

/// Cloud provider family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudType {
    Aws,
    Gcp,
    Azu,
    Docker,
    Onprem,
    Kubernetes,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CloudType {
    /// Public clouds where a public IP can be assigned to nodes
    pub fn supports_public_ip(&self) -> bool {
        matches!(self, CloudType::Aws | CloudType::Gcp | CloudType::Azu)
    }
}

impl std::fmt::Display for CloudType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudType::Aws => write!(f, "aws"),
            CloudType::Gcp => write!(f, "gcp"),
            CloudType::Azu => write!(f, "azu"),
            CloudType::Docker => write!(f, "docker"),
            CloudType::Onprem => write!(f, "onprem"),
            CloudType::Kubernetes => write!(f, "kubernetes"),
            CloudType::Unknown => write!(f, "unknown"),
        }
    }
}

/// Cloud provider configured on the platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Provider {
    pub uuid: String,
    pub code: CloudType,
    #[serde(default)]
    pub name: String,
}

/// Volume attached to an instance type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeDetails {
    #[serde(rename = "volumeSizeGB")]
    pub volume_size_gb: u32,
    #[serde(default)]
    pub volume_type: Option<String>,
    #[serde(default)]
    pub mount_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceTypeDetails {
    #[serde(default)]
    pub volume_details_list: Vec<VolumeDetails>,
}

/// Instance type offered by a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceType {
    pub instance_type_code: String,
    pub provider_code: CloudType,
    #[serde(default)]
    pub num_cores: Option<f64>,
    #[serde(default, rename = "memSizeGB")]
    pub mem_size_gb: Option<f64>,
    #[serde(default)]
    pub instance_type_details: InstanceTypeDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKeyId {
    pub key_code: String,
    #[serde(default, rename = "providerUUID")]
    pub provider_uuid: Option<String>,
}

/// Provisioning access key of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessKey {
    pub id_key: AccessKeyId,
}

/// TLS root certificate known to the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    pub uuid: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmsConfigMetadata {
    #[serde(rename = "configUUID")]
    pub config_uuid: String,
    pub name: String,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Key management service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmsConfig {
    pub metadata: KmsConfigMetadata,
}

/// Storage class of a node volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageType {
    IO1,
    GP2,
    GP3,
    Scratch,
    Persistent,
    #[serde(rename = "StandardSSD_LRS")]
    StandardSsdLrs,
    #[serde(rename = "Premium_LRS")]
    PremiumLrs,
    #[serde(rename = "UltraSSD_LRS")]
    UltraSsdLrs,
}

impl StorageType {
    /// Provisioned IOPS the platform expects for this storage type
    pub fn default_iops(&self) -> Option<u32> {
        match self {
            StorageType::IO1 => Some(1000),
            StorageType::GP3 | StorageType::UltraSsdLrs => Some(3000),
            _ => None,
        }
    }

    /// Provisioned throughput (MiB/sec) the platform expects for this storage type
    pub fn default_throughput(&self) -> Option<u32> {
        match self {
            StorageType::GP3 | StorageType::UltraSsdLrs => Some(125),
            _ => None,
        }
    }
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StorageType::IO1 => "IO1",
            StorageType::GP2 => "GP2",
            StorageType::GP3 => "GP3",
            StorageType::Scratch => "Scratch",
            StorageType::Persistent => "Persistent",
            StorageType::StandardSsdLrs => "StandardSSD_LRS",
            StorageType::PremiumLrs => "Premium_LRS",
            StorageType::UltraSsdLrs => "UltraSSD_LRS",
        };
        write!(f, "{}", label)
    }
}

/// Volume profile of every node in a cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub num_volumes: u32,
    pub volume_size: u32,
    pub storage_class: String,
    #[serde(default)]
    pub storage_type: Option<StorageType>,
    #[serde(default)]
    pub mount_points: Option<String>,
    #[serde(default)]
    pub disk_iops: Option<u32>,
    #[serde(default)]
    pub throughput: Option<u32>,
}

/// One named configuration override
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlagPair {
    pub name: String,
    pub value: String,
}

/// Wire representation of tags and server flags
pub type FlagList = Vec<FlagPair>;

/// Tags and flags as the server may send them back
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagShape {
    List(FlagList),
    Map(Map<String, Value>),
}

/// Accepts a list of pairs, a name to value map or null
fn lenient_flags<'de, D>(deserializer: D) -> Result<FlagList, D::Error>
where
    D: Deserializer<'de>,
{
    let flags = match Option::<FlagShape>::deserialize(deserializer)? {
        None => FlagList::new(),
        Some(FlagShape::List(list)) => list,
        Some(FlagShape::Map(map)) => map
            .into_iter()
            .map(|(name, value)| FlagPair {
                name,
                value: match value {
                    Value::String(value) => value,
                    Value::Null => String::new(),
                    other => other.to_string(),
                },
            })
            .collect(),
    };
    Ok(flags)
}

/// Null decodes to the type's default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Ports the database processes listen on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationPorts {
    pub master_http_port: u16,
    pub master_rpc_port: u16,
    pub tserver_http_port: u16,
    pub tserver_rpc_port: u16,
    pub redis_server_http_port: u16,
    pub redis_server_rpc_port: u16,
    pub yql_server_http_port: u16,
    pub yql_server_rpc_port: u16,
    pub ysql_server_http_port: u16,
    pub ysql_server_rpc_port: u16,
    pub node_exporter_port: u16,
}

impl Default for CommunicationPorts {
    fn default() -> Self {
        Self {
            master_http_port: 7000,
            master_rpc_port: 7100,
            tserver_http_port: 9000,
            tserver_rpc_port: 9100,
            redis_server_http_port: 11000,
            redis_server_rpc_port: 6379,
            yql_server_http_port: 12000,
            yql_server_rpc_port: 9042,
            ysql_server_http_port: 13000,
            ysql_server_rpc_port: 5433,
            node_exporter_port: 9300,
        }
    }
}

/// Key operation requested for encryption at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum KeyOp {
    Enable,
    Disable,
    #[default]
    Undefined,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EncryptionAtRestConfig {
    pub key_op: KeyOp,
    #[serde(
        default,
        rename = "configUUID",
        skip_serializing_if = "Option::is_none"
    )]
    pub config_uuid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraDependencies {
    pub install_node_exporter: bool,
}

/// Operation a configure/submit payload describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterOperationTag {
    Create,
    Edit,
    Delete,
}

/// Role of a cluster inside a universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusterType {
    #[default]
    Primary,
    Async,
}

/// Zone inside a placement region
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementAz {
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub replication_factor: u32,
    #[serde(default)]
    pub subnet: String,
    #[serde(rename = "numNodesInAZ")]
    pub num_nodes_in_az: u32,
    #[serde(default)]
    pub is_affinitized: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRegion {
    pub uuid: String,
    pub code: String,
    pub name: String,
    pub az_list: Vec<PlacementAz>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementCloud {
    pub uuid: String,
    pub code: CloudType,
    pub region_list: Vec<PlacementRegion>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInfo {
    pub cloud_list: Vec<PlacementCloud>,
}

/// What the user asked for in one cluster
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIntent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub universe_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub provider: String,
    #[serde(default)]
    pub provider_type: CloudType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub region_list: Vec<String>,
    #[serde(default)]
    pub num_nodes: u32,
    #[serde(default)]
    pub replication_factor: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub instance_type: String,
    #[serde(default)]
    pub device_info: Option<DeviceInfo>,
    #[serde(default, deserialize_with = "lenient_flags")]
    pub instance_tags: FlagList,
    #[serde(default, rename = "assignPublicIP")]
    pub assign_public_ip: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aws_arn_string: String,
    #[serde(default)]
    pub yb_software_version: Option<String>,
    #[serde(default, rename = "masterGFlags", deserialize_with = "lenient_flags")]
    pub master_g_flags: FlagList,
    #[serde(default, rename = "tserverGFlags", deserialize_with = "lenient_flags")]
    pub tserver_g_flags: FlagList,
    #[serde(default)]
    pub enable_node_to_node_encrypt: bool,
    #[serde(default)]
    pub enable_client_to_node_encrypt: bool,
    #[serde(default)]
    pub access_key_code: Option<String>,
    #[serde(default, rename = "enableYSQL")]
    pub enable_ysql: bool,
    #[serde(default)]
    pub use_time_sync: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One cluster of a universe
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub cluster_type: ClusterType,
    pub user_intent: UserIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_info: Option<PlacementInfo>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Lifecycle state of a node in a configure result
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NodeState {
    ToBeAdded,
    ToBeRemoved,
    Provisioned,
    Running,
    Stopped,
    Decommissioned,
    Removed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One node of a proposed or existing topology
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDetails {
    #[serde(default)]
    pub node_name: Option<String>,
    #[serde(default)]
    pub state: NodeState,
    #[serde(default, rename = "placementUuid")]
    pub placement_uuid: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// Universe definition exchanged with the configure, create and edit calls
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniverseDetails {
    #[serde(
        default,
        rename = "universeUUID",
        skip_serializing_if = "Option::is_none"
    )]
    pub universe_uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_operation: Option<ClusterOperationTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_cluster_type: Option<ClusterType>,
    #[serde(default, rename = "rootCA")]
    pub root_ca: Option<String>,
    #[serde(default, rename = "userAZSelected")]
    pub user_az_selected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communication_ports: Option<CommunicationPorts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_at_rest_config: Option<EncryptionAtRestConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_dependencies: Option<ExtraDependencies>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub node_details_set: Vec<NodeDetails>,
    #[serde(default)]
    pub update_in_progress: bool,
    #[serde(default)]
    pub backup_in_progress: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl UniverseDetails {
    /// The primary cluster, if the payload has one
    pub fn primary_cluster(&self) -> Option<&Cluster> {
        self.clusters
            .iter()
            .find(|c| c.cluster_type == ClusterType::Primary)
    }
}

/// A universe as returned by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Universe {
    #[serde(rename = "universeUUID")]
    pub universe_uuid: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    pub universe_details: UniverseDetails,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_universe_details_keeps_unknown_fields() {
        let raw = json!({
            "universeUUID": "u-1",
            "clusterOperation": "EDIT",
            "nodePrefix": "yb-dev-demo",
            "clusters": [{
                "clusterType": "PRIMARY",
                "userIntent": {
                    "universeName": "demo",
                    "numNodes": 3,
                    "masterGFlags": [{"name": "max_log_size", "value": "256"}],
                    "preferredRegion": "r-1"
                },
                "index": 0
            }],
            "nodeDetailsSet": [{
                "nodeName": "yb-dev-demo-n1",
                "state": "Live",
                "cloudInfo": {"az": "a"}
            }]
        });

        let details: UniverseDetails = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(details.cluster_operation, Some(ClusterOperationTag::Edit));
        assert_eq!(details.extra.get("nodePrefix"), Some(&json!("yb-dev-demo")));
        assert_eq!(details.clusters[0].user_intent.num_nodes, 3);
        assert_eq!(
            details.clusters[0].user_intent.extra.get("preferredRegion"),
            Some(&json!("r-1"))
        );
        assert_eq!(details.node_details_set[0].state, NodeState::Unknown);

        let back = serde_json::to_value(&details).unwrap();
        assert_eq!(back["nodePrefix"], json!("yb-dev-demo"));
        assert_eq!(back["clusters"][0]["index"], json!(0));
        assert_eq!(back["nodeDetailsSet"][0]["cloudInfo"]["az"], json!("a"));
    }

    #[test]
    fn test_user_intent_accepts_flag_maps() {
        let raw = json!({
            "clusters": [{
                "clusterType": "PRIMARY",
                "userIntent": {
                    "universeName": "demo",
                    "masterGFlags": {"max_log_size": "256", "v": 1},
                    "tserverGFlags": [{"name": "ysql_enable", "value": "true"}],
                    "instanceTags": {"owner": "dba"}
                }
            }]
        });

        let details: UniverseDetails = serde_json::from_value(raw).unwrap();
        let intent = &details.clusters[0].user_intent;
        assert_eq!(
            intent.master_g_flags,
            vec![
                FlagPair {
                    name: "max_log_size".to_string(),
                    value: "256".to_string()
                },
                FlagPair {
                    name: "v".to_string(),
                    value: "1".to_string()
                },
            ]
        );
        assert_eq!(intent.tserver_g_flags[0].name, "ysql_enable");
        assert_eq!(intent.instance_tags[0].value, "dba");

        // always sent back as a list
        let back = serde_json::to_value(intent).unwrap();
        assert_eq!(back["instanceTags"], json!([{"name": "owner", "value": "dba"}]));
    }

    #[test]
    fn test_user_intent_accepts_nulls() {
        let raw = json!({
            "universeUUID": "u-1",
            "name": null,
            "universeDetails": {
                "clusters": [{
                    "clusterType": "PRIMARY",
                    "userIntent": {
                        "universeName": null,
                        "provider": null,
                        "regionList": null,
                        "instanceType": null,
                        "awsArnString": null,
                        "instanceTags": null,
                        "masterGFlags": null,
                        "tserverGFlags": null,
                        "ybSoftwareVersion": null,
                        "numNodes": 3
                    }
                }]
            }
        });

        let universe: Universe = serde_json::from_value(raw).unwrap();
        assert_eq!(universe.name, "");
        let intent = &universe.universe_details.clusters[0].user_intent;
        assert_eq!(intent.num_nodes, 3);
        assert_eq!(intent.aws_arn_string, "");
        assert!(intent.region_list.is_empty());
        assert!(intent.instance_tags.is_empty());
        assert!(intent.master_g_flags.is_empty());
        assert_eq!(intent.yb_software_version, None);
    }

    #[test]
    fn test_encryption_config_wire_shape() {
        let config = EncryptionAtRestConfig {
            key_op: KeyOp::Enable,
            config_uuid: Some("kms-1".to_string()),
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value, json!({"key_op": "ENABLE", "configUUID": "kms-1"}));

        let undefined = serde_json::to_value(EncryptionAtRestConfig::default()).unwrap();
        assert_eq!(undefined, json!({"key_op": "UNDEFINED"}));
    }

    #[test]
    fn test_instance_type_parses_volume_details() {
        let raw = json!({
            "instanceTypeCode": "c5.large",
            "providerCode": "aws",
            "numCores": 2.0,
            "memSizeGB": 4.0,
            "instanceTypeDetails": {
                "volumeDetailsList": [
                    {"volumeSizeGB": 250, "volumeType": "EBS"},
                    {"volumeSizeGB": 250, "volumeType": "EBS"}
                ]
            }
        });
        let instance: InstanceType = serde_json::from_value(raw).unwrap();
        assert_eq!(instance.provider_code, CloudType::Aws);
        assert_eq!(instance.instance_type_details.volume_details_list.len(), 2);
        assert_eq!(
            instance.instance_type_details.volume_details_list[0].volume_size_gb,
            250
        );
    }

    #[test]
    fn test_unknown_cloud_type() {
        let cloud: CloudType = serde_json::from_value(json!("cloud-1")).unwrap();
        assert_eq!(cloud, CloudType::Unknown);
        assert!(CloudType::Gcp.supports_public_ip());
        assert!(!CloudType::Onprem.supports_public_ip());
    }

    #[test]
    fn test_storage_type_defaults() {
        assert_eq!(StorageType::GP3.default_iops(), Some(3000));
        assert_eq!(StorageType::GP3.default_throughput(), Some(125));
        assert_eq!(StorageType::IO1.default_iops(), Some(1000));
        assert_eq!(StorageType::IO1.default_throughput(), None);
        assert_eq!(StorageType::Persistent.default_iops(), None);
        assert_eq!(StorageType::PremiumLrs.to_string(), "Premium_LRS");
    }
}
