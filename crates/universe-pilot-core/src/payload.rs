//! Payload builder: wizard form -> configure request
//!
//! Creation payloads are built from scratch. Edit payloads start from the
//! universe's current definition and only overwrite what the wizard lets the
//! user edit, so every server-owned field survives the round trip.

use crate::error::{Result, WizardError};
use crate::form::{FlagMap, WizardFormData};
use platform_rs::{
    Cluster, ClusterOperationTag, ClusterType, EncryptionAtRestConfig, ExtraDependencies,
    FlagList, FlagPair, KeyOp, PlacementCloud, PlacementInfo, PlacementRegion, UniverseDetails,
    UserIntent,
};
use std::collections::{HashMap, HashSet};

/// Only the primary cluster is handled; async clusters are not supported
const PRIMARY_CLUSTER_INDEX: usize = 0;

/// Convert an editable flag map into its wire list
pub fn tags_to_array(tags: &FlagMap) -> FlagList {
    tags.iter()
        .map(|(name, value)| FlagPair {
            name: name.clone(),
            value: value.clone(),
        })
        .collect()
}

/// Group the selected zones into a region tree.
///
/// Each zone's `is_affinitized` flag is set from the preferred leaders
/// selection. Regions appear in the order their first zone appears, and zones
/// keep their relative order inside a region.
pub fn get_placements(form: &WizardFormData) -> Vec<PlacementRegion> {
    let leaders: HashSet<&str> = form
        .db_config
        .preferred_leaders
        .iter()
        .map(|leader| leader.uuid.as_str())
        .collect();

    let mut regions: Vec<PlacementRegion> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for entry in &form.cloud_config.placements {
        let mut zone = entry.to_zone();
        zone.is_affinitized = leaders.contains(entry.uuid.as_str());

        match index.get(entry.parent_region_id.as_str()) {
            Some(&i) => regions[i].az_list.push(zone),
            None => {
                index.insert(entry.parent_region_id.as_str(), regions.len());
                regions.push(PlacementRegion {
                    uuid: entry.parent_region_id.clone(),
                    code: entry.parent_region_code.clone(),
                    name: entry.parent_region_name.clone(),
                    az_list: vec![zone],
                });
            }
        }
    }

    regions
}

/// Placement info holding the user's own zone distribution
pub fn placement_info(form: &WizardFormData) -> Result<PlacementInfo> {
    let provider = form
        .cloud_config
        .provider
        .as_ref()
        .ok_or(WizardError::MissingProvider)?;
    Ok(PlacementInfo {
        cloud_list: vec![PlacementCloud {
            uuid: provider.uuid.clone(),
            code: provider.code,
            region_list: get_placements(form),
        }],
    })
}

/// Configure request for a new universe, without explicit placement
pub fn build_create_payload(form: &WizardFormData) -> Result<UniverseDetails> {
    let provider = form
        .cloud_config
        .provider
        .as_ref()
        .ok_or(WizardError::MissingProvider)?;
    let cloud = &form.cloud_config;
    let instance = &form.instance_config;
    let db = &form.db_config;
    let security = &form.security_config;
    let hidden = &form.hidden_config;

    let mut encryption = EncryptionAtRestConfig {
        key_op: if security.enable_encryption_at_rest {
            KeyOp::Enable
        } else {
            KeyOp::Undefined
        },
        config_uuid: None,
    };
    if security.enable_encryption_at_rest {
        encryption.config_uuid = security.kms_config.clone().filter(|kms| !kms.is_empty());
    }

    let user_intent = UserIntent {
        universe_name: cloud.universe_name.clone(),
        provider: provider.uuid.clone(),
        provider_type: provider.code,
        region_list: cloud.region_list.clone(),
        num_nodes: cloud.total_nodes,
        replication_factor: cloud.replication_factor,
        instance_type: instance.instance_type.clone().unwrap_or_default(),
        device_info: instance.device_info.clone(),
        instance_tags: tags_to_array(&instance.instance_tags),
        assign_public_ip: instance.assign_public_ip,
        aws_arn_string: instance.aws_arn_string.clone().unwrap_or_default(),
        yb_software_version: db.yb_software_version.clone(),
        master_g_flags: tags_to_array(&db.master_g_flags),
        tserver_g_flags: tags_to_array(&db.tserver_g_flags),
        enable_node_to_node_encrypt: security.enable_node_to_node_encrypt,
        enable_client_to_node_encrypt: security.enable_client_to_node_encrypt,
        access_key_code: hidden.access_key_code.clone(),
        enable_ysql: hidden.enable_ysql,
        use_time_sync: hidden.use_time_sync,
        extra: Default::default(),
    };

    Ok(UniverseDetails {
        cluster_operation: Some(ClusterOperationTag::Create),
        current_cluster_type: Some(ClusterType::Primary),
        root_ca: security.root_ca.clone(),
        user_az_selected: false,
        communication_ports: Some(db.communication_ports.clone()),
        encryption_at_rest_config: Some(encryption),
        extra_dependencies: Some(ExtraDependencies {
            install_node_exporter: hidden.install_node_exporter,
        }),
        clusters: vec![Cluster {
            cluster_type: ClusterType::Primary,
            user_intent,
            ..Default::default()
        }],
        ..Default::default()
    })
}

/// Configure request for an edit: the current definition with the editable
/// fields taken from the form
pub fn build_edit_payload(
    original: &UniverseDetails,
    form: &WizardFormData,
) -> Result<UniverseDetails> {
    let mut payload = original.clone();
    payload.cluster_operation = Some(ClusterOperationTag::Edit);
    payload.current_cluster_type = Some(ClusterType::Primary);
    payload.user_az_selected = form.hidden_config.user_az_selected;

    let cluster = payload
        .clusters
        .get_mut(PRIMARY_CLUSTER_INDEX)
        .ok_or(WizardError::MissingCluster)?;

    let intent = &mut cluster.user_intent;
    intent.region_list = form.cloud_config.region_list.clone();
    intent.num_nodes = form.cloud_config.total_nodes;
    intent.instance_type = form
        .instance_config
        .instance_type
        .clone()
        .unwrap_or_default();
    intent.instance_tags = tags_to_array(&form.instance_config.instance_tags);
    intent.device_info = form.instance_config.device_info.clone();

    let cloud = cluster
        .placement_info
        .as_mut()
        .and_then(|info| info.cloud_list.first_mut())
        .ok_or(WizardError::MissingPlacementCloud)?;
    cloud.region_list = get_placements(form);

    Ok(payload)
}

/// Restore fields the configure call is known to drop or rewrite
pub fn patch_configure_response(
    response: &mut UniverseDetails,
    original: &UniverseDetails,
) -> Result<()> {
    response.cluster_operation = original.cluster_operation;
    response.current_cluster_type = original.current_cluster_type;
    response.encryption_at_rest_config = original.encryption_at_rest_config.clone();

    let source = &original
        .clusters
        .get(PRIMARY_CLUSTER_INDEX)
        .ok_or(WizardError::MissingCluster)?
        .user_intent;
    let target = &mut response
        .clusters
        .get_mut(PRIMARY_CLUSTER_INDEX)
        .ok_or(WizardError::MissingCluster)?
        .user_intent;

    target.instance_tags = source.instance_tags.clone();
    target.master_g_flags = source.master_g_flags.clone();
    target.tserver_g_flags = source.tserver_g_flags.clone();
    Ok(())
}

/// Replace the primary cluster's placement with the user's zone distribution
pub(crate) fn apply_user_placement(
    payload: &mut UniverseDetails,
    form: &WizardFormData,
) -> Result<()> {
    let info = placement_info(form)?;
    let cluster = payload
        .clusters
        .get_mut(PRIMARY_CLUSTER_INDEX)
        .ok_or(WizardError::MissingCluster)?;
    cluster.placement_info = Some(info);
    Ok(())
}
