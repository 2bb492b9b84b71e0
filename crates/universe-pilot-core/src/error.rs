//! Error types for the wizard core

use platform_rs::PlatformError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    /// A platform call failed
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("No provider selected")]
    MissingProvider,

    /// A configure payload or response has no cluster to work on
    #[error("Payload has no primary cluster")]
    MissingCluster,

    #[error("Primary cluster has no placement cloud")]
    MissingPlacementCloud,

    /// Edit flow started without the universe being edited
    #[error("Universe to edit is not loaded")]
    MissingUniverse,

    #[error("Invalid form: {0}")]
    InvalidForm(String),
}

impl WizardError {
    /// Message shown to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            WizardError::Platform(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
