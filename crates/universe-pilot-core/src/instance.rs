//! Instance type presets and volume profile derivation

use platform_rs::{CloudType, DeviceInfo, InstanceType, StorageType};

/// Instance type preselected for a cloud, when the cloud has one
pub fn default_instance_type(cloud: CloudType) -> Option<&'static str> {
    match cloud {
        CloudType::Aws => Some("c5.large"),
        CloudType::Gcp => Some("n1-standard-1"),
        CloudType::Kubernetes => Some("small"),
        _ => None,
    }
}

/// Storage type preselected for a cloud's volumes
pub fn default_storage_type(cloud: CloudType) -> Option<StorageType> {
    match cloud {
        CloudType::Aws => Some(StorageType::GP3),
        CloudType::Gcp => Some(StorageType::Persistent),
        CloudType::Azu => Some(StorageType::PremiumLrs),
        _ => None,
    }
}

/// Pick the instance type to backfill for a cloud.
///
/// Clouds with a preset only accept that preset; other clouds take the
/// first instance type offered.
pub fn pick_instance(instances: &[InstanceType], cloud: CloudType) -> Option<&InstanceType> {
    match default_instance_type(cloud) {
        Some(code) => instances.iter().find(|i| i.instance_type_code == code),
        None => instances.first(),
    }
}

/// Volume profile for nodes of the given instance type.
///
/// Returns `None` when the instance type lists no volumes.
pub fn device_info_from_instance(instance: &InstanceType) -> Option<DeviceInfo> {
    let volumes = &instance.instance_type_details.volume_details_list;
    let first = volumes.first()?;
    let storage_type = default_storage_type(instance.provider_code);

    let mount_points = if instance.provider_code == CloudType::Onprem {
        let paths: Vec<&str> = volumes
            .iter()
            .filter_map(|v| v.mount_path.as_deref())
            .collect();
        (!paths.is_empty()).then(|| paths.join(","))
    } else {
        None
    };

    Some(DeviceInfo {
        num_volumes: volumes.len() as u32,
        volume_size: first.volume_size_gb,
        storage_class: "standard".to_string(),
        storage_type,
        mount_points,
        disk_iops: storage_type.and_then(|s| s.default_iops()),
        throughput: storage_type.and_then(|s| s.default_throughput()),
    })
}
