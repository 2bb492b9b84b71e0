//! universe-pilot-core: Review and configure logic for the universe wizard
//!
//! Backfills required fields, turns the wizard form into configure payloads,
//! reconciles the platform's answer with the user's placement choices and
//! projects the result into the status the review screen gates on.

pub mod backfill;
pub mod configure;
pub mod error;
pub mod form;
pub mod instance;
pub mod launch;
pub mod payload;
pub mod reference;
pub mod review;
pub mod session;
pub mod status;
pub mod summary;
pub mod version;

#[cfg(test)]
mod fake;

pub use backfill::{BackfillReport, BackfillResolver, FieldOutcome, is_populated};
pub use configure::{ConfigureEngine, ConfigureState, ConfigureStatus, check_for_full_move};
pub use error::{Result, WizardError};
pub use form::WizardFormData;
pub use launch::{LaunchOutcome, Launcher};
pub use review::ReviewStep;
pub use session::{ClusterOperation, WizardAction, WizardSession};
pub use status::{Notification, NotificationLevel, ReviewPhase, ReviewSnapshot};
pub use summary::{ReviewRow, ReviewSection};
