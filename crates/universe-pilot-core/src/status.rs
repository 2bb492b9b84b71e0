//! Review status projection
//!
//! A [`ReviewSnapshot`] freezes everything the review screen gates on. The
//! derived values are plain functions of the snapshot.

use crate::backfill::BackfillReport;
use crate::configure::{ConfigureState, ConfigureStatus};
use crate::session::ClusterOperation;
use platform_rs::UniverseDetails;

/// What the review screen can show right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPhase {
    /// Required fields could not be filled in; nothing will happen on its own
    Blocked,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationLevel::Info => write!(f, "info"),
            NotificationLevel::Warning => write!(f, "warning"),
            NotificationLevel::Error => write!(f, "error"),
        }
    }
}

/// Banner shown above the review
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

pub const UPDATE_IN_PROGRESS_MESSAGE: &str = "Universe is upgrading at the moment";
pub const BACKUP_IN_PROGRESS_MESSAGE: &str = "Backup is in progress at the moment";
pub const FULL_MOVE_MESSAGE: &str = "This operation will perform a \"full move\" - the universe \
     and all its data will be migrated to a completely new set of nodes";
pub const NO_CHANGES_MESSAGE: &str = "There are no changes to the universe";

/// Point-in-time view of the review step
#[derive(Debug, Clone)]
pub struct ReviewSnapshot {
    pub operation: ClusterOperation,
    pub configure: ConfigureState,
    pub backfill_loading: bool,
    pub reference_loading: bool,
    /// Set once the backfill pass has finished
    pub backfill: Option<BackfillReport>,
    pub launching: bool,
    pub launch_error: Option<String>,
}

impl ReviewSnapshot {
    pub fn is_loading(&self) -> bool {
        self.configure.status == ConfigureStatus::Loading
            || self.backfill_loading
            || self.reference_loading
    }

    /// Final payload from the configure flow
    pub fn payload(&self) -> Option<&UniverseDetails> {
        self.configure.data.as_ref()
    }

    pub fn is_launch_allowed(&self) -> bool {
        !self.launching
            && self.configure.status == ConfigureStatus::Success
            && self
                .payload()
                .is_some_and(|data| !data.update_in_progress && !data.backup_in_progress)
    }

    pub fn is_full_move(&self) -> bool {
        self.configure.is_full_move.unwrap_or(false)
    }

    pub fn has_no_changes(&self) -> bool {
        self.configure.status == ConfigureStatus::NoChanges
    }

    /// Why the review cannot make progress, if it cannot.
    ///
    /// New universes only configure once every required field is set; when
    /// backfill gave up on one of them the step would otherwise wait forever.
    pub fn blocked_reason(&self) -> Option<String> {
        if self.operation != ClusterOperation::NewPrimary
            || self.configure.status != ConfigureStatus::Loading
        {
            return None;
        }
        let unresolved = self.backfill.as_ref()?.unresolved();
        if unresolved.is_empty() {
            return None;
        }
        let fields: Vec<String> = unresolved
            .iter()
            .map(|(field, reason)| format!("{} ({})", field.label(), reason))
            .collect();
        Some(format!(
            "Cannot proceed, missing required fields: {}",
            fields.join(", ")
        ))
    }

    pub fn phase(&self) -> ReviewPhase {
        if self.blocked_reason().is_some() {
            ReviewPhase::Blocked
        } else if self.is_loading() {
            ReviewPhase::Loading
        } else {
            ReviewPhase::Ready
        }
    }

    /// Banners in display order
    pub fn notifications(&self) -> Vec<Notification> {
        let mut notifications = Vec::new();

        if let Some(reason) = self.blocked_reason() {
            notifications.push(Notification::new(NotificationLevel::Error, reason));
        }
        if let Some(error) = &self.configure.error {
            notifications.push(Notification::new(NotificationLevel::Error, error.clone()));
        }
        if let Some(error) = &self.launch_error {
            notifications.push(Notification::new(NotificationLevel::Error, error.clone()));
        }
        if let Some(data) = self.payload() {
            if data.update_in_progress {
                notifications.push(Notification::new(
                    NotificationLevel::Warning,
                    UPDATE_IN_PROGRESS_MESSAGE,
                ));
            }
            if data.backup_in_progress {
                notifications.push(Notification::new(
                    NotificationLevel::Warning,
                    BACKUP_IN_PROGRESS_MESSAGE,
                ));
            }
        }
        if self.is_full_move() {
            notifications.push(Notification::new(NotificationLevel::Warning, FULL_MOVE_MESSAGE));
        }
        if self.has_no_changes() {
            notifications.push(Notification::new(NotificationLevel::Info, NO_CHANGES_MESSAGE));
        }

        notifications
    }
}
