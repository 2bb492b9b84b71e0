//! Wizard session - the state container for one wizard run
//!
//! Holds the in-progress form, the snapshot it started from and, when editing,
//! the universe being edited. The form is only changed by dispatching a
//! [`WizardAction`]; dispatches are applied one at a time, so concurrent
//! writers get last-write-wins per field.

use crate::error::Result;
use crate::form::{
    CloudConfig, DbConfig, HiddenConfig, InstanceConfig, SecurityConfig, WizardFormData,
};
use platform_rs::{DeviceInfo, PlatformApi, Universe};
use tokio::sync::watch;

/// What the wizard is doing to the universe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterOperation {
    NewPrimary,
    EditPrimary,
}

impl std::fmt::Display for ClusterOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterOperation::NewPrimary => write!(f, "create"),
            ClusterOperation::EditPrimary => write!(f, "edit"),
        }
    }
}

/// Replacement values for whole form sections
#[derive(Debug, Clone, Default)]
pub struct FormDataPatch {
    pub cloud_config: Option<CloudConfig>,
    pub instance_config: Option<InstanceConfig>,
    pub db_config: Option<DbConfig>,
    pub security_config: Option<SecurityConfig>,
    pub hidden_config: Option<HiddenConfig>,
}

/// Messages that change the form
#[derive(Debug, Clone)]
pub enum WizardAction {
    /// Replace the given form sections
    UpdateFormData(FormDataPatch),
    /// Replace the whole form
    ReplaceFormData(Box<WizardFormData>),
    SetSoftwareVersion(String),
    /// Instance type and the volume profile derived from it
    SetInstance {
        instance_type: String,
        device_info: Option<DeviceInfo>,
    },
    SetAccessKeyCode(String),
}

impl WizardAction {
    fn apply(self, form: &mut WizardFormData) {
        match self {
            WizardAction::UpdateFormData(patch) => {
                if let Some(cloud) = patch.cloud_config {
                    form.cloud_config = cloud;
                }
                if let Some(instance) = patch.instance_config {
                    form.instance_config = instance;
                }
                if let Some(db) = patch.db_config {
                    form.db_config = db;
                }
                if let Some(security) = patch.security_config {
                    form.security_config = security;
                }
                if let Some(hidden) = patch.hidden_config {
                    form.hidden_config = hidden;
                }
            }
            WizardAction::ReplaceFormData(data) => *form = *data,
            WizardAction::SetSoftwareVersion(version) => {
                form.db_config.yb_software_version = Some(version);
            }
            WizardAction::SetInstance {
                instance_type,
                device_info,
            } => {
                form.instance_config.instance_type = Some(instance_type);
                form.instance_config.device_info = device_info;
            }
            WizardAction::SetAccessKeyCode(code) => {
                form.hidden_config.access_key_code = Some(code);
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            WizardAction::UpdateFormData(_) => "update_form_data",
            WizardAction::ReplaceFormData(_) => "replace_form_data",
            WizardAction::SetSoftwareVersion(_) => "set_software_version",
            WizardAction::SetInstance { .. } => "set_instance",
            WizardAction::SetAccessKeyCode(_) => "set_access_key_code",
        }
    }
}

/// One wizard run
pub struct WizardSession {
    operation: ClusterOperation,
    original: WizardFormData,
    universe: Option<Universe>,
    form: watch::Sender<WizardFormData>,
}

impl WizardSession {
    /// Session for creating a new universe
    pub fn create(form: WizardFormData) -> Self {
        let (tx, _) = watch::channel(form.clone());
        Self {
            operation: ClusterOperation::NewPrimary,
            original: form,
            universe: None,
            form: tx,
        }
    }

    /// Session for editing an existing universe, seeded from its definition
    pub fn edit(universe: Universe) -> Result<Self> {
        let form = WizardFormData::from_universe(&universe)?;
        let (tx, _) = watch::channel(form.clone());
        Ok(Self {
            operation: ClusterOperation::EditPrimary,
            original: form,
            universe: Some(universe),
            form: tx,
        })
    }

    /// Fetch a universe and open an edit session for it. An `edited` form
    /// replaces the seeded one, leaving the original snapshot untouched.
    pub async fn open_edit(
        api: &dyn PlatformApi,
        universe_uuid: &str,
        edited: Option<WizardFormData>,
    ) -> Result<Self> {
        tracing::info!("Editing universe {}", universe_uuid);
        let universe = api.universe(universe_uuid).await?;
        let session = Self::edit(universe)?;
        if let Some(form) = edited {
            session.dispatch(WizardAction::ReplaceFormData(Box::new(form)));
        }
        Ok(session)
    }

    pub fn operation(&self) -> ClusterOperation {
        self.operation
    }

    /// Form as it was when the wizard opened
    pub fn original(&self) -> &WizardFormData {
        &self.original
    }

    /// Universe being edited
    pub fn universe(&self) -> Option<&Universe> {
        self.universe.as_ref()
    }

    /// Copy of the current form
    pub fn snapshot(&self) -> WizardFormData {
        self.form.borrow().clone()
    }

    /// Watch the form for changes
    pub fn subscribe(&self) -> watch::Receiver<WizardFormData> {
        self.form.subscribe()
    }

    /// Apply an action to the form
    pub fn dispatch(&self, action: WizardAction) {
        tracing::debug!("Wizard dispatch: {}", action.name());
        self.form.send_modify(|form| action.apply(form));
    }

    /// Whether the form differs from the snapshot it started from
    pub fn has_changes(&self) -> bool {
        *self.form.borrow() != self.original
    }
}
