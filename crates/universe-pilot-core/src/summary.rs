//! Review summary: the rows shown on the review screen
//!
//! In edit mode a few rows are flagged as changed when they differ from the
//! universe being edited.

use crate::form::{FlagMap, PlacementEntry, WizardFormData};
use crate::reference::ReferenceData;
use crate::session::ClusterOperation;
use platform_rs::{CloudType, CommunicationPorts, DeviceInfo};

pub const NOT_SET: &str = "(not set)";

/// A value as the review screen renders it
#[derive(Debug, Clone, Copy)]
pub enum RenderValue<'a> {
    Bool(bool),
    Number(u64),
    Text(Option<&'a str>),
    Map(&'a FlagMap),
}

/// Booleans as Yes/No, empty values as `(not set)`, maps one `key: value` per line
pub fn render_value(value: RenderValue<'_>) -> String {
    match value {
        RenderValue::Bool(true) => "Yes".to_string(),
        RenderValue::Bool(false) => "No".to_string(),
        RenderValue::Number(n) => n.to_string(),
        RenderValue::Text(Some(text)) if !text.is_empty() => text.to_string(),
        RenderValue::Text(_) => NOT_SET.to_string(),
        RenderValue::Map(map) if map.is_empty() => NOT_SET.to_string(),
        RenderValue::Map(map) => map
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewRow {
    pub title: &'static str,
    /// Rendered value, one display line per `\n`
    pub value: String,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    pub title: &'static str,
    pub rows: Vec<ReviewRow>,
}

fn pluralize_nodes(count: u32) -> String {
    if count == 1 {
        "1 node".to_string()
    } else {
        format!("{} nodes", count)
    }
}

fn render_placements(placements: &[PlacementEntry]) -> String {
    if placements.is_empty() {
        return NOT_SET.to_string();
    }
    placements
        .iter()
        .map(|p| {
            format!(
                "{}: {} - {}",
                p.parent_region_name,
                p.name,
                pluralize_nodes(p.num_nodes_in_az)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_leaders(leaders: &[PlacementEntry]) -> String {
    if leaders.is_empty() {
        return NOT_SET.to_string();
    }
    leaders
        .iter()
        .map(|p| format!("{}: {}", p.parent_region_name, p.name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_volumes(device: &DeviceInfo) -> String {
    let mut parts = vec![format!("{} x {}", device.num_volumes, device.volume_size)];
    if let Some(storage_type) = device.storage_type {
        parts.push(storage_type.to_string());
    }
    if let Some(iops) = device.disk_iops {
        parts.push(format!("{} IOPS", iops));
    }
    if let Some(throughput) = device.throughput {
        parts.push(format!("{} MiB/sec", throughput));
    }
    parts.join(" ")
}

fn render_ports(ports: &CommunicationPorts) -> String {
    [
        ("Master HTTP Port", ports.master_http_port),
        ("Master RPC Port", ports.master_rpc_port),
        ("TServer HTTP Port", ports.tserver_http_port),
        ("TServer RPC Port", ports.tserver_rpc_port),
        ("Redis HTTP Port", ports.redis_server_http_port),
        ("Redis RPC Port", ports.redis_server_rpc_port),
        ("YCQL HTTP Port", ports.yql_server_http_port),
        ("YCQL RPC Port", ports.yql_server_rpc_port),
        ("YSQL HTTP Port", ports.ysql_server_http_port),
        ("YSQL RPC Port", ports.ysql_server_rpc_port),
        ("Node Exporter Port", ports.node_exporter_port),
    ]
    .iter()
    .map(|(label, port)| format!("{}: {}", label, port))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Collects rows, flagging changes only when editing
struct RowBuilder {
    editing: bool,
    rows: Vec<ReviewRow>,
}

impl RowBuilder {
    fn new(operation: ClusterOperation) -> Self {
        Self {
            editing: operation == ClusterOperation::EditPrimary,
            rows: Vec::new(),
        }
    }

    fn row(&mut self, title: &'static str, value: String) -> &mut Self {
        self.rows.push(ReviewRow {
            title,
            value,
            changed: false,
        });
        self
    }

    fn tracked<T: PartialEq>(
        &mut self,
        title: &'static str,
        value: String,
        current: &T,
        original: &T,
    ) -> &mut Self {
        self.rows.push(ReviewRow {
            title,
            value,
            changed: self.editing && current != original,
        });
        self
    }

    fn section(&mut self, title: &'static str) -> ReviewSection {
        ReviewSection {
            title,
            rows: std::mem::take(&mut self.rows),
        }
    }
}

/// Build the review screen for the current form
pub fn build_review_sections(
    form: &WizardFormData,
    original: &WizardFormData,
    operation: ClusterOperation,
    reference: &ReferenceData,
) -> Vec<ReviewSection> {
    let mut b = RowBuilder::new(operation);
    let cloud = &form.cloud_config;
    let instance = &form.instance_config;
    let db = &form.db_config;
    let security = &form.security_config;
    let cloud_type = cloud.provider.as_ref().map(|p| p.code);

    b.row(
        "Universe Name",
        render_value(RenderValue::Text(Some(&cloud.universe_name))),
    )
    .row(
        "Provider",
        render_value(RenderValue::Text(
            form.provider_uuid()
                .and_then(|uuid| reference.provider_name(uuid)),
        )),
    )
    .tracked(
        "Regions and Placements",
        render_placements(&cloud.placements),
        &cloud.placements,
        &original.cloud_config.placements,
    )
    .row(
        "Replication Factor",
        render_value(RenderValue::Number(cloud.replication_factor.into())),
    )
    .tracked(
        "Total Nodes",
        render_value(RenderValue::Number(cloud.total_nodes.into())),
        &cloud.total_nodes,
        &original.cloud_config.total_nodes,
    );
    let cloud_section = b.section("Cloud Config");

    b.tracked(
        "Instance Type",
        render_value(RenderValue::Text(instance.instance_type.as_deref())),
        &instance.instance_type,
        &original.instance_config.instance_type,
    );
    if let Some(device) = &instance.device_info {
        b.tracked(
            "Volume Info",
            render_volumes(device),
            &instance.device_info,
            &original.instance_config.device_info,
        );
    }
    if cloud_type == Some(CloudType::Aws) {
        b.tracked(
            "Instance Tags",
            render_value(RenderValue::Map(&instance.instance_tags)),
            &instance.instance_tags,
            &original.instance_config.instance_tags,
        );
    }
    if cloud_type.is_some_and(|c| c.supports_public_ip()) {
        b.row(
            "Assign Public IP",
            render_value(RenderValue::Bool(instance.assign_public_ip)),
        );
    }
    if cloud_type == Some(CloudType::Aws) {
        b.row(
            "Instance Profile ARN",
            render_value(RenderValue::Text(instance.aws_arn_string.as_deref())),
        );
    }
    let instance_section = b.section("Instance Config");

    b.row(
        "DB Version",
        render_value(RenderValue::Text(db.yb_software_version.as_deref())),
    )
    .tracked(
        "Preferred Leaders",
        render_leaders(&db.preferred_leaders),
        &db.preferred_leaders,
        &original.db_config.preferred_leaders,
    )
    .row("Communication Ports", render_ports(&db.communication_ports))
    .row(
        "YB-Master Config Flags",
        render_value(RenderValue::Map(&db.master_g_flags)),
    )
    .row(
        "YB-TServer Config Flags",
        render_value(RenderValue::Map(&db.tserver_g_flags)),
    );
    let db_section = b.section("DB Config");

    b.row(
        "Enable Authentication",
        render_value(RenderValue::Bool(security.enable_authentication)),
    )
    .row(
        "Enable Node-to-Node TLS",
        render_value(RenderValue::Bool(security.enable_node_to_node_encrypt)),
    )
    .row(
        "Enable Client-to-Node TLS",
        render_value(RenderValue::Bool(security.enable_client_to_node_encrypt)),
    )
    .row(
        "Root Certificate",
        render_value(RenderValue::Text(
            security
                .root_ca
                .as_deref()
                .and_then(|uuid| reference.certificate_label(uuid)),
        )),
    )
    .row(
        "Enable Encryption at-rest",
        render_value(RenderValue::Bool(security.enable_encryption_at_rest)),
    )
    .row(
        "KMS Config",
        render_value(RenderValue::Text(
            security
                .kms_config
                .as_deref()
                .and_then(|uuid| reference.kms_config_name(uuid)),
        )),
    );
    let security_section = b.section("Security Config");

    vec![cloud_section, instance_section, db_section, security_section]
}
