//! Configure reconciliation engine
//!
//! Turns the wizard form into a validated universe definition by calling the
//! platform's configure endpoint. Creation takes two round trips: the server
//! only computes nodes from counts and regions, so the user's own zone
//! distribution is injected into the first answer and validated by a second
//! call. Edits take one round trip, or none when nothing changed.
//!
//! The engine reads form snapshots and never writes the form.

use crate::error::{Result, WizardError};
use crate::payload::{
    apply_user_placement, build_create_payload, build_edit_payload, patch_configure_response,
};
use crate::session::{ClusterOperation, WizardSession};
use platform_rs::{NodeDetails, NodeState, PlatformApi, UniverseDetails};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Where the configure flow stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigureStatus {
    #[default]
    Loading,
    Success,
    Failure,
    NoChanges,
}

impl std::fmt::Display for ConfigureStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigureStatus::Loading => write!(f, "Loading"),
            ConfigureStatus::Success => write!(f, "Success"),
            ConfigureStatus::Failure => write!(f, "Failure"),
            ConfigureStatus::NoChanges => write!(f, "NoChanges"),
        }
    }
}

/// Observable outcome of the last configure run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigureState {
    pub status: ConfigureStatus,
    /// Final payload, ready to submit
    pub data: Option<UniverseDetails>,
    pub error: Option<String>,
    /// Only computed for edits
    pub is_full_move: Option<bool>,
}

impl ConfigureState {
    fn success(data: UniverseDetails, is_full_move: Option<bool>) -> Self {
        Self {
            status: ConfigureStatus::Success,
            data: Some(data),
            error: None,
            is_full_move,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            status: ConfigureStatus::Failure,
            error: Some(message),
            ..Default::default()
        }
    }

    fn no_changes() -> Self {
        Self {
            status: ConfigureStatus::NoChanges,
            ..Default::default()
        }
    }
}

/// Whether an edit replaces every existing primary node.
///
/// Nodes without a name, async cluster nodes (named `*readonly*`) and nodes
/// about to be removed are ignored; if nothing is left the edit moves the
/// whole universe.
pub fn check_for_full_move(nodes: &[NodeDetails]) -> bool {
    !nodes.iter().any(|node| {
        node.node_name
            .as_deref()
            .is_some_and(|name| !name.is_empty() && !name.contains("readonly"))
            && node.state != NodeState::ToBeRemoved
    })
}

pub struct ConfigureEngine {
    api: Arc<dyn PlatformApi>,
    state: watch::Sender<ConfigureState>,
    enabled: AtomicBool,
}

impl ConfigureEngine {
    pub fn new(api: Arc<dyn PlatformApi>) -> Self {
        let (state, _) = watch::channel(ConfigureState::default());
        Self {
            api,
            state,
            enabled: AtomicBool::new(false),
        }
    }

    /// Current state
    pub fn state(&self) -> ConfigureState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConfigureState> {
        self.state.subscribe()
    }

    /// Record the enabling condition; true only when it flips on
    pub fn set_enabled(&self, enabled: bool) -> bool {
        let was_enabled = self.enabled.swap(enabled, Ordering::SeqCst);
        enabled && !was_enabled
    }

    /// Run the flow if the enabling condition just turned on.
    ///
    /// Returns whether a run happened.
    pub async fn trigger(
        &self,
        enabled: bool,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> bool {
        if !self.set_enabled(enabled) {
            return false;
        }
        self.run(session, cancel).await;
        true
    }

    /// Run the flow for the session's current form.
    ///
    /// The outcome is dropped if `cancel` fires before it is ready.
    pub async fn run(&self, session: &WizardSession, cancel: &CancellationToken) {
        if cancel.is_cancelled() {
            return;
        }
        self.transition(ConfigureState::default());

        let outcome = match session.operation() {
            ClusterOperation::NewPrimary => self.configure_create(session, cancel).await,
            ClusterOperation::EditPrimary => self.configure_edit(session).await,
        };

        if cancel.is_cancelled() {
            tracing::debug!("Dropping configure result, review step is gone");
            return;
        }

        let next = match outcome {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("Configure failed: {}", e);
                ConfigureState::failure(e.user_message())
            }
        };
        self.transition(next);
    }

    async fn configure_create(
        &self,
        session: &WizardSession,
        cancel: &CancellationToken,
    ) -> Result<ConfigureState> {
        let form = session.snapshot();
        let request = build_create_payload(&form)?;

        // The first answer has nodes but ignores the user's zone distribution
        let mut interim = self.api.universe_configure(&request).await?;
        patch_configure_response(&mut interim, &request)?;

        if cancel.is_cancelled() {
            return Ok(ConfigureState::default());
        }

        apply_user_placement(&mut interim, &form)?;

        let mut payload = self.api.universe_configure(&interim).await?;
        patch_configure_response(&mut payload, &request)?;

        Ok(ConfigureState::success(payload, None))
    }

    async fn configure_edit(&self, session: &WizardSession) -> Result<ConfigureState> {
        let form = session.snapshot();
        if form == *session.original() {
            return Ok(ConfigureState::no_changes());
        }

        let universe = session.universe().ok_or(WizardError::MissingUniverse)?;
        let request = build_edit_payload(&universe.universe_details, &form)?;

        let mut payload = self.api.universe_configure(&request).await?;
        patch_configure_response(&mut payload, &request)?;

        let is_full_move = check_for_full_move(&payload.node_details_set);
        if is_full_move {
            tracing::info!("Edit of {} replaces every primary node", universe.name);
        }
        Ok(ConfigureState::success(payload, Some(is_full_move)))
    }

    fn transition(&self, next: ConfigureState) {
        self.state.send_modify(|state| {
            tracing::info!("Configure state: {} -> {}", state.status, next.status);
            *state = next;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakePlatform;
    use crate::form::tests::{make_form, make_universe};
    use crate::payload::placement_info;
    use crate::session::{FormDataPatch, WizardAction};
    use platform_rs::{ClusterOperationTag, ClusterType, KeyOp};
    use tokio::sync::Notify;

    fn make_node(name: Option<&str>, state: NodeState) -> NodeDetails {
        NodeDetails {
            node_name: name.map(str::to_string),
            state,
            ..Default::default()
        }
    }

    fn make_create_session() -> WizardSession {
        let mut form = make_form();
        form.instance_config
            .instance_tags
            .insert("owner".to_string(), "dba".to_string());
        form.db_config
            .master_g_flags
            .insert("max_log_size".to_string(), "256".to_string());
        form.security_config.enable_encryption_at_rest = true;
        form.security_config.kms_config = Some("kms-1".to_string());
        WizardSession::create(form)
    }

    fn make_edited_session() -> WizardSession {
        let session = WizardSession::edit(make_universe()).unwrap();
        let mut cloud = session.snapshot().cloud_config;
        cloud.total_nodes = 6;
        session.dispatch(WizardAction::UpdateFormData(FormDataPatch {
            cloud_config: Some(cloud),
            ..Default::default()
        }));
        session
    }

    // ==========================================================================
    // Full move
    // ==========================================================================

    #[test]
    fn test_full_move_when_no_primary_node_survives() {
        let nodes = vec![
            make_node(Some("n1"), NodeState::ToBeRemoved),
            make_node(Some("n2-readonly"), NodeState::Running),
            make_node(Some(""), NodeState::Running),
            make_node(None, NodeState::ToBeAdded),
        ];
        assert!(check_for_full_move(&nodes));

        let mut with_survivor = nodes.clone();
        with_survivor.push(make_node(Some("n3"), NodeState::Running));
        assert!(!check_for_full_move(&with_survivor));
    }

    #[test]
    fn test_full_move_filters_each_rule() {
        assert!(!check_for_full_move(&[make_node(Some("n1"), NodeState::Running)]));
        assert!(check_for_full_move(&[make_node(Some("n1"), NodeState::ToBeRemoved)]));
        assert!(check_for_full_move(&[make_node(
            Some("yb-demo-readonly0-n1"),
            NodeState::Running
        )]));
        assert!(check_for_full_move(&[make_node(Some(""), NodeState::Running)]));
        assert!(check_for_full_move(&[]));
    }

    // ==========================================================================
    // Create
    // ==========================================================================

    #[tokio::test]
    async fn test_create_makes_two_calls_and_patches_from_request() {
        let fake = Arc::new(FakePlatform::default());
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_create_session();
        let form = session.snapshot();

        engine.run(&session, &CancellationToken::new()).await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Success);
        assert_eq!(state.error, None);
        assert_eq!(state.is_full_move, None);

        let requests = fake.configure_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].clusters[0].placement_info.is_none());

        // the interim answer was patched before being sent back
        let second = &requests[1];
        assert_eq!(second.cluster_operation, Some(ClusterOperationTag::Create));
        assert_eq!(second.clusters[0].user_intent.instance_tags.len(), 1);
        assert_eq!(
            second.clusters[0].placement_info,
            Some(placement_info(&form).unwrap())
        );

        let data = state.data.unwrap();
        assert_eq!(data.cluster_operation, Some(ClusterOperationTag::Create));
        assert_eq!(data.current_cluster_type, Some(ClusterType::Primary));
        let encryption = data.encryption_at_rest_config.unwrap();
        assert_eq!(encryption.key_op, KeyOp::Enable);
        assert_eq!(encryption.config_uuid.as_deref(), Some("kms-1"));
        let intent = &data.clusters[0].user_intent;
        assert_eq!(intent.instance_tags[0].name, "owner");
        assert_eq!(intent.master_g_flags[0].name, "max_log_size");
    }

    #[tokio::test]
    async fn test_create_final_patch_uses_first_request() {
        // the second answer comes back with values that exist in neither request
        let fake = Arc::new(FakePlatform {
            configure_fn: Some(Box::new(|request: &UniverseDetails| {
                let mut response = request.clone();
                response.cluster_operation = Some(ClusterOperationTag::Delete);
                response.clusters[0].user_intent.tserver_g_flags.clear();
                response
            })),
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());
        let mut form = make_form();
        form.db_config
            .tserver_g_flags
            .insert("ysql_num_shards_per_tserver".to_string(), "2".to_string());
        let session = WizardSession::create(form);

        engine.run(&session, &CancellationToken::new()).await;

        let data = engine.state().data.unwrap();
        assert_eq!(data.cluster_operation, Some(ClusterOperationTag::Create));
        assert_eq!(data.clusters[0].user_intent.tserver_g_flags.len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_on_first_call() {
        let fake = Arc::new(FakePlatform {
            fail_configure_on: Some(1),
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());

        engine
            .run(&make_create_session(), &CancellationToken::new())
            .await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Failure);
        assert_eq!(state.error.as_deref(), Some("configure call 1 rejected"));
        assert_eq!(state.data, None);
        assert_eq!(fake.count("universe_configure"), 1);
    }

    #[tokio::test]
    async fn test_create_failure_on_second_call() {
        let fake = Arc::new(FakePlatform {
            fail_configure_on: Some(2),
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());

        engine
            .run(&make_create_session(), &CancellationToken::new())
            .await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Failure);
        assert_eq!(state.error.as_deref(), Some("configure call 2 rejected"));
        assert_eq!(fake.count("universe_configure"), 2);
    }

    #[tokio::test]
    async fn test_create_without_provider_fails_without_calls() {
        let fake = Arc::new(FakePlatform::default());
        let engine = ConfigureEngine::new(fake.clone());
        let mut form = make_form();
        form.cloud_config.provider = None;

        engine
            .run(&WizardSession::create(form), &CancellationToken::new())
            .await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Failure);
        assert_eq!(state.error.as_deref(), Some("No provider selected"));
        assert_eq!(fake.total_calls(), 0);
    }

    // ==========================================================================
    // Edit
    // ==========================================================================

    #[tokio::test]
    async fn test_edit_without_changes_makes_no_call() {
        let fake = Arc::new(FakePlatform::default());
        let engine = ConfigureEngine::new(fake.clone());
        let session = WizardSession::edit(make_universe()).unwrap();

        engine.run(&session, &CancellationToken::new()).await;

        assert_eq!(engine.state().status, ConfigureStatus::NoChanges);
        assert_eq!(fake.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_edit_makes_one_call_and_detects_full_move() {
        let fake = Arc::new(FakePlatform {
            nodes: vec![
                make_node(Some("yb-demo-n1"), NodeState::ToBeRemoved),
                make_node(None, NodeState::ToBeAdded),
            ],
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_edited_session();

        engine.run(&session, &CancellationToken::new()).await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Success);
        assert_eq!(state.is_full_move, Some(true));
        assert_eq!(fake.count("universe_configure"), 1);

        let request = &fake.configure_requests()[0];
        assert_eq!(request.cluster_operation, Some(ClusterOperationTag::Edit));
        assert_eq!(request.clusters[0].user_intent.num_nodes, 6);

        let data = state.data.unwrap();
        assert_eq!(data.cluster_operation, Some(ClusterOperationTag::Edit));
        assert_eq!(
            data.encryption_at_rest_config,
            make_universe().universe_details.encryption_at_rest_config
        );
        assert_eq!(data.clusters[0].user_intent.instance_tags[0].name, "team");
    }

    #[tokio::test]
    async fn test_edit_keeping_nodes_is_not_full_move() {
        let fake = Arc::new(FakePlatform {
            nodes: vec![
                make_node(Some("yb-demo-n1"), NodeState::Running),
                make_node(None, NodeState::ToBeAdded),
            ],
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());

        engine
            .run(&make_edited_session(), &CancellationToken::new())
            .await;

        assert_eq!(engine.state().is_full_move, Some(false));
    }

    #[tokio::test]
    async fn test_edit_failure_keeps_message() {
        let fake = Arc::new(FakePlatform {
            fail_configure_on: Some(1),
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());

        engine
            .run(&make_edited_session(), &CancellationToken::new())
            .await;

        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Failure);
        assert_eq!(state.error.as_deref(), Some("configure call 1 rejected"));
        assert_eq!(state.is_full_move, None);
    }

    // ==========================================================================
    // Staleness and triggering
    // ==========================================================================

    #[tokio::test]
    async fn test_result_after_cancel_is_dropped() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakePlatform {
            configure_gate: Some(gate.clone()),
            ..Default::default()
        });
        let started = fake.configure_started.clone();
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_edited_session();
        let cancel = CancellationToken::new();
        let mut rx = engine.subscribe();

        tokio::join!(engine.run(&session, &cancel), async {
            started.notified().await;
            rx.borrow_and_update();
            cancel.cancel();
            gate.notify_one();
        });

        assert!(!rx.has_changed().unwrap());
        assert_eq!(engine.state().status, ConfigureStatus::Loading);
        assert_eq!(fake.count("universe_configure"), 1);
    }

    #[tokio::test]
    async fn test_cancel_between_create_calls_skips_second_call() {
        let gate = Arc::new(Notify::new());
        let fake = Arc::new(FakePlatform {
            configure_gate: Some(gate.clone()),
            ..Default::default()
        });
        let started = fake.configure_started.clone();
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_create_session();
        let cancel = CancellationToken::new();

        tokio::join!(engine.run(&session, &cancel), async {
            started.notified().await;
            cancel.cancel();
            gate.notify_one();
        });

        assert_eq!(fake.count("universe_configure"), 1);
        assert_eq!(engine.state().status, ConfigureStatus::Loading);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_does_nothing() {
        let fake = Arc::new(FakePlatform::default());
        let engine = ConfigureEngine::new(fake.clone());
        let rx = engine.subscribe();
        let cancel = CancellationToken::new();
        cancel.cancel();

        engine.run(&make_create_session(), &cancel).await;

        assert!(!rx.has_changed().unwrap());
        assert_eq!(fake.total_calls(), 0);
    }

    #[test]
    fn test_set_enabled_reports_rising_edge_only() {
        let engine = ConfigureEngine::new(Arc::new(FakePlatform::default()));
        assert!(!engine.set_enabled(false));
        assert!(engine.set_enabled(true));
        assert!(!engine.set_enabled(true));
        assert!(!engine.set_enabled(false));
        assert!(engine.set_enabled(true));
    }

    #[tokio::test]
    async fn test_trigger_runs_once_per_rising_edge() {
        let fake = Arc::new(FakePlatform::default());
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_create_session();
        let cancel = CancellationToken::new();

        assert!(engine.trigger(true, &session, &cancel).await);
        assert!(!engine.trigger(true, &session, &cancel).await);
        assert_eq!(fake.count("universe_configure"), 2);

        assert!(!engine.trigger(false, &session, &cancel).await);
        assert!(engine.trigger(true, &session, &cancel).await);
        assert_eq!(fake.count("universe_configure"), 4);
    }

    #[tokio::test]
    async fn test_rerun_resets_previous_failure() {
        let fake = Arc::new(FakePlatform {
            fail_configure_on: Some(1),
            ..Default::default()
        });
        let engine = ConfigureEngine::new(fake.clone());
        let session = make_create_session();
        let cancel = CancellationToken::new();

        engine.run(&session, &cancel).await;
        assert_eq!(engine.state().status, ConfigureStatus::Failure);

        // calls 2 and 3 succeed
        engine.run(&session, &cancel).await;
        let state = engine.state();
        assert_eq!(state.status, ConfigureStatus::Success);
        assert_eq!(state.error, None);
    }
}
