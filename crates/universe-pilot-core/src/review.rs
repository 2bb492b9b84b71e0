//! Review step: ties backfill, reference data, configure and launch together
//!
//! The step owns one cancellation token for its lifetime. Closing or dropping
//! the step cancels it, and every pending completion checks it before it
//! stores anything.

use crate::backfill::{BackfillReport, BackfillResolver, is_populated};
use crate::configure::{ConfigureEngine, ConfigureState};
use crate::launch::{LaunchOutcome, Launcher};
use crate::reference::{ReferenceData, ReferenceLoader};
use crate::session::{ClusterOperation, WizardSession};
use crate::status::ReviewSnapshot;
use crate::summary::{ReviewSection, build_review_sections};
use platform_rs::PlatformApi;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct ReviewStep {
    session: Arc<WizardSession>,
    backfill: BackfillResolver,
    reference_loader: ReferenceLoader,
    engine: ConfigureEngine,
    launcher: Launcher,
    report: watch::Sender<Option<BackfillReport>>,
    reference: watch::Sender<ReferenceData>,
    cancel: CancellationToken,
}

impl ReviewStep {
    pub fn open(session: Arc<WizardSession>, api: Arc<dyn PlatformApi>) -> Self {
        tracing::info!("Opening review for {} flow", session.operation());
        let (report, _) = watch::channel(None);
        let (reference, _) = watch::channel(ReferenceData::default());
        Self {
            session,
            backfill: BackfillResolver::new(api.clone()),
            reference_loader: ReferenceLoader::new(api.clone()),
            engine: ConfigureEngine::new(api.clone()),
            launcher: Launcher::new(api),
            report,
            reference,
            cancel: CancellationToken::new(),
        }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Fill in missing fields and load reference data, then configure if the
    /// form is ready
    pub async fn prepare(&self) {
        let (report, reference) = tokio::join!(
            self.backfill.resolve(&self.session, &self.cancel),
            self.reference_loader.load(&self.cancel),
        );
        if self.cancel.is_cancelled() {
            return;
        }

        for (field, reason) in report.unresolved() {
            tracing::warn!("{} is still missing: {}", field.label(), reason);
        }
        self.report.send_replace(Some(report));
        self.reference.send_replace(reference);

        self.refresh_trigger().await;
    }

    /// Re-check whether configure should run, e.g. after the form changed.
    ///
    /// New universes configure once every required field is set; edits
    /// configure as soon as the step is open. Returns whether a run happened.
    pub async fn refresh_trigger(&self) -> bool {
        let enabled = match self.session.operation() {
            ClusterOperation::NewPrimary => is_populated(&self.session.snapshot()),
            ClusterOperation::EditPrimary => true,
        };
        self.engine
            .trigger(enabled, &self.session, &self.cancel)
            .await
    }

    pub fn configure_state(&self) -> watch::Receiver<ConfigureState> {
        self.engine.subscribe()
    }

    pub fn snapshot(&self) -> ReviewSnapshot {
        let launch = self.launcher.state();
        ReviewSnapshot {
            operation: self.session.operation(),
            configure: self.engine.state(),
            backfill_loading: self.backfill.is_loading(),
            reference_loading: self.reference_loader.is_loading(),
            backfill: self.report.borrow().clone(),
            launching: launch.launching,
            launch_error: launch.error,
        }
    }

    /// Review rows for the current form
    pub fn sections(&self) -> Vec<ReviewSection> {
        build_review_sections(
            &self.session.snapshot(),
            self.session.original(),
            self.session.operation(),
            &self.reference.borrow(),
        )
    }

    pub async fn launch(&self) -> LaunchOutcome {
        if self.cancel.is_cancelled() {
            return LaunchOutcome::NotAllowed;
        }
        self.launcher
            .launch(self.session.operation(), &self.snapshot())
            .await
    }

    pub fn dismiss_launch_error(&self) {
        self.launcher.dismiss_error();
    }

    /// Leave the step; late completions are dropped from now on
    pub fn close(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("Closing review");
            self.cancel.cancel();
        }
    }
}

impl Drop for ReviewStep {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
