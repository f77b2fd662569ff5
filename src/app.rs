//! Top-level entry point that wires the API client, the refresh flag, the
//! roster store, and the two writer flows into a single [`RosterApp`].
//!
//! The app is opened via [`RosterAppBuilder`], which builds the HTTP client
//! (or takes any other [`RosterApi`]) and mounts the roster store.

use std::sync::Arc;
use std::time::Duration;

use crate::assignment::AssignmentFlow;
use crate::client::{HttpRosterClient, RosterApi};
use crate::config::{ClientConfig, StoreConfig};
use crate::creation::CreationFlow;
use crate::error::{ApiError, StoreError};
use crate::model::Influencer;
use crate::refresh::RefreshFlag;
use crate::store::RosterHandle;

/// A mounted roster: one store plus the shared refresh flag its writers
/// raise.
///
/// `Clone` is cheap; clones share the same store.
#[derive(Clone)]
pub struct RosterApp {
    client: Arc<dyn RosterApi>,
    refresh: RefreshFlag,
    roster: RosterHandle,
}

impl std::fmt::Debug for RosterApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RosterApp")
            .field("roster", &self.roster)
            .field("refresh", &self.refresh.is_raised())
            .finish_non_exhaustive()
    }
}

impl RosterApp {
    /// Start configuring an app.
    pub fn builder() -> RosterAppBuilder {
        RosterAppBuilder::new()
    }

    /// Mount a roster store over `client`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn mount(client: Arc<dyn RosterApi>, config: &StoreConfig) -> Self {
        let refresh = RefreshFlag::new();
        let roster = RosterHandle::mount(Arc::clone(&client), refresh.clone(), config);
        Self {
            client,
            refresh,
            roster,
        }
    }

    /// The roster store.
    pub fn roster(&self) -> &RosterHandle {
        &self.roster
    }

    /// The API the app talks to.
    pub fn client(&self) -> &Arc<dyn RosterApi> {
        &self.client
    }

    /// The flag shared by this app's store and writer flows.
    pub fn refresh_flag(&self) -> &RefreshFlag {
        &self.refresh
    }

    /// A fresh create form whose successful submits reload this roster.
    pub fn creation_flow(&self) -> CreationFlow {
        CreationFlow::new(Arc::clone(&self.client), self.refresh.clone())
    }

    /// A manager picker for `influencer` whose successful submits reload
    /// this roster.
    pub fn assignment_flow(&self, influencer: &Influencer) -> AssignmentFlow {
        AssignmentFlow::new(Arc::clone(&self.client), self.refresh.clone(), influencer)
    }

    /// Tear down the roster store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TaskFailed`] if the store task panicked.
    pub async fn shutdown(&self) -> Result<(), StoreError> {
        self.roster.shutdown().await
    }
}

/// Builder for [`RosterApp`].
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), roster_sync::ApiError> {
/// use std::time::Duration;
///
/// let app = roster_sync::RosterApp::builder()
///     .base_url("http://localhost:3001")
///     .filter_debounce(Duration::from_millis(250))
///     .open()?;
/// app.roster().set_filter("ann");
/// # Ok(())
/// # }
/// ```
pub struct RosterAppBuilder {
    client_config: ClientConfig,
    store_config: StoreConfig,
    client: Option<Arc<dyn RosterApi>>,
}

impl RosterAppBuilder {
    /// Create a builder with default client and store configuration.
    pub fn new() -> Self {
        Self {
            client_config: ClientConfig::default(),
            store_config: StoreConfig::default(),
            client: None,
        }
    }

    /// Replace the whole HTTP client configuration.
    ///
    /// Ignored when [`client`](RosterAppBuilder::client) is set.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    /// Set the roster service base URL.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute `http` or `https` URL, e.g.
    ///   `"http://localhost:3001"`.
    ///
    /// # Returns
    ///
    /// `self` for method chaining.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.client_config.base_url = url.into();
        self
    }

    /// Set the per-request timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.client_config.request_timeout = timeout;
        self
    }

    /// Replace the whole store configuration.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Set how long the filter must stay unchanged before the service is
    /// queried. Defaults to 300 ms.
    pub fn filter_debounce(mut self, delay: Duration) -> Self {
        self.store_config.filter_debounce = delay;
        self
    }

    /// Set the filter used by the mount load.
    pub fn initial_filter(mut self, filter: impl Into<String>) -> Self {
        self.store_config.initial_filter = filter.into();
        self
    }

    /// Use `client` instead of building an [`HttpRosterClient`].
    pub fn client(mut self, client: Arc<dyn RosterApi>) -> Self {
        self.client = Some(client);
        self
    }

    /// Build the client (unless one was supplied) and mount the roster.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL is invalid or the HTTP
    /// client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn open(self) -> Result<RosterApp, ApiError> {
        let client = match self.client {
            Some(client) => client,
            None => Arc::new(HttpRosterClient::new(&self.client_config)?),
        };
        Ok(RosterApp::mount(client, &self.store_config))
    }
}

impl Default for RosterAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InfluencerId, ManagerId};
    use crate::test_fixtures::{FakeApi, influencer, manager};

    fn fake() -> Arc<FakeApi> {
        Arc::new(
            FakeApi::new()
                .with_influencers(vec![influencer(1, "Ann", "Lee")])
                .with_managers(vec![manager(5, "Mia")]),
        )
    }

    #[test]
    fn open_rejects_invalid_base_url() {
        let err = RosterApp::builder()
            .base_url("not a url")
            .open()
            .expect_err("invalid url");
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn builder_passes_store_config() {
        let api = fake();
        let app = RosterApp::builder()
            .client(api.clone())
            .initial_filter("lee")
            .open()
            .expect("open");
        app.roster()
            .wait_until(|s| s.loads_completed == 1)
            .await
            .expect("mount load");
        assert_eq!(api.list_filters(), vec!["lee".to_string()]);
        app.shutdown().await.expect("shutdown");
    }

    #[tokio::test(start_paused = true)]
    async fn created_influencer_appears_after_refresh() {
        let api = fake();
        let app = RosterApp::mount(api.clone(), &StoreConfig::default());
        let roster = app.roster();
        roster
            .wait_until(|s| s.loads_completed == 1)
            .await
            .expect("mount load");

        let mut form = app.creation_flow();
        form.set_first_name("Bob");
        form.set_last_name("Stone");
        form.submit().await.expect("create");

        let snapshot = roster
            .wait_until(|s| s.loads_completed == 2)
            .await
            .expect("reload");
        assert!(snapshot.influencers.iter().any(|i| i.full_name() == "Bob Stone"));
        assert!(!app.refresh_flag().is_raised());
    }

    #[tokio::test(start_paused = true)]
    async fn assignment_shows_up_in_reloaded_roster() {
        let api = fake();
        let app = RosterApp::mount(api.clone(), &StoreConfig::default());
        let snapshot = app
            .roster()
            .wait_until(|s| s.loads_completed == 1)
            .await
            .expect("mount load");

        let mut picker = app.assignment_flow(&snapshot.influencers[0]);
        picker.select_manager(Some(ManagerId(5)));
        picker.assign().await.expect("assign");

        let snapshot = app
            .roster()
            .wait_until(|s| s.loads_completed == 2)
            .await
            .expect("reload");
        let ann = snapshot
            .influencers
            .iter()
            .find(|i| i.id == InfluencerId(1))
            .expect("ann listed");
        assert_eq!(ann.manager.as_ref().map(|m| m.name.as_str()), Some("Mia"));
        assert!(picker.sync(ann));
        assert!(!picker.can_submit());
    }
}
