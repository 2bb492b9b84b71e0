//! Submission of the configured universe

use crate::error::WizardError;
use crate::session::ClusterOperation;
use crate::status::ReviewSnapshot;
use platform_rs::PlatformApi;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    Submitted,
    /// The review does not allow launching right now; nothing was sent
    NotAllowed,
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchState {
    pub launching: bool,
    /// Dismissable error from the last attempt
    pub error: Option<String>,
}

pub struct Launcher {
    api: Arc<dyn PlatformApi>,
    state: watch::Sender<LaunchState>,
}

impl Launcher {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        let (state, _) = watch::channel(LaunchState::default());
        Self { api, state }
    }

    pub fn state(&self) -> LaunchState {
        self.state.borrow().clone()
    }

    pub fn is_launching(&self) -> bool {
        self.state.borrow().launching
    }

    /// Submit the configured payload as a create or an edit.
    ///
    /// Failures are kept as the launch error and leave the configure outcome
    /// alone, so the user can retry.
    pub async fn launch(
        &self,
        operation: ClusterOperation,
        snapshot: &ReviewSnapshot,
    ) -> LaunchOutcome {
        if !snapshot.is_launch_allowed() {
            return LaunchOutcome::NotAllowed;
        }
        let Some(payload) = snapshot.payload() else {
            return LaunchOutcome::NotAllowed;
        };

        // Only one submission at a time
        let claimed = self.state.send_if_modified(|state| {
            if state.launching {
                return false;
            }
            state.launching = true;
            true
        });
        if !claimed {
            return LaunchOutcome::NotAllowed;
        }
        tracing::info!("Launching universe {}", operation);

        let result = match operation {
            ClusterOperation::NewPrimary => self
                .api
                .universe_create(payload)
                .await
                .map_err(WizardError::from),
            ClusterOperation::EditPrimary => match payload.universe_uuid.as_deref() {
                Some(uuid) => self
                    .api
                    .universe_edit(payload, uuid)
                    .await
                    .map_err(WizardError::from),
                None => Err(WizardError::MissingUniverse),
            },
        };

        match result {
            Ok(()) => {
                self.state.send_modify(|state| state.launching = false);
                LaunchOutcome::Submitted
            }
            Err(e) => {
                let message = e.user_message();
                tracing::error!("Failed to {} universe: {}", operation, message);
                self.state.send_modify(|state| {
                    state.launching = false;
                    state.error = Some(message.clone());
                });
                LaunchOutcome::Failed(message)
            }
        }
    }

    /// Clear the launch error banner
    pub fn dismiss_error(&self) {
        self.state.send_modify(|state| state.error = None);
    }
}
