//! Shared helpers for unit tests: an in-memory [`RosterApi`] with scripted
//! failures and delays.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::Semaphore;

use crate::client::RosterApi;
use crate::creation::InfluencerDraft;
use crate::error::ApiError;
use crate::filter::filtered_view;
use crate::model::{Influencer, InfluencerId, Manager, ManagerId};

/// An influencer with no accounts and no manager.
pub(crate) fn influencer(id: u64, first: &str, last: &str) -> Influencer {
    Influencer {
        id: InfluencerId(id),
        first_name: first.into(),
        last_name: last.into(),
        social_media_accounts: vec![],
        manager: None,
    }
}

pub(crate) fn manager(id: u64, name: &str) -> Manager {
    Manager {
        id: ManagerId(id),
        name: name.into(),
    }
}

/// `Some(message)` becomes a server rejection carrying it; `None` a bare 500.
type ScriptedFailure = Option<String>;

fn scripted_error(failure: ScriptedFailure) -> ApiError {
    match failure {
        Some(message) => ApiError::Server {
            status: StatusCode::BAD_REQUEST,
            message,
        },
        None => ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[derive(Default)]
struct FakeState {
    influencers: Vec<Influencer>,
    managers: Vec<Manager>,
    next_id: u64,
    list_filters: Vec<String>,
    manager_calls: usize,
    create_calls: usize,
    assign_calls: Vec<(InfluencerId, Option<ManagerId>)>,
    list_delays: VecDeque<Duration>,
    list_failures: VecDeque<ScriptedFailure>,
    manager_failures: VecDeque<ScriptedFailure>,
    create_failures: VecDeque<ScriptedFailure>,
    assign_failures: VecDeque<ScriptedFailure>,
}

/// In-memory roster service.
///
/// `list_influencers` filters server-side with the same rule the client
/// uses, and snapshots its result when the call starts, before any scripted
/// delay.
#[derive(Default)]
pub(crate) struct FakeApi {
    state: Mutex<FakeState>,
    assign_gate: Option<Arc<Semaphore>>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_influencers(self, influencers: Vec<Influencer>) -> Self {
        {
            let mut state = self.lock();
            state.next_id = influencers.iter().map(|i| i.id.0).max().unwrap_or(0);
            state.influencers = influencers;
        }
        self
    }

    pub(crate) fn with_managers(self, managers: Vec<Manager>) -> Self {
        self.lock().managers = managers;
        self
    }

    /// Hold every `assign_manager` call until a permit is added to `gate`.
    pub(crate) fn with_assign_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.assign_gate = Some(gate);
        self
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake state poisoned")
    }

    pub(crate) fn push_influencer(&self, influencer: Influencer) {
        let mut state = self.lock();
        state.next_id = state.next_id.max(influencer.id.0);
        state.influencers.push(influencer);
    }

    pub(crate) fn delay_next_list(&self, delay: Duration) {
        self.lock().list_delays.push_back(delay);
    }

    pub(crate) fn fail_next_list(&self, message: Option<&str>) {
        self.lock().list_failures.push_back(message.map(String::from));
    }

    pub(crate) fn fail_next_managers(&self, message: Option<&str>) {
        self.lock()
            .manager_failures
            .push_back(message.map(String::from));
    }

    pub(crate) fn fail_next_create(&self, message: Option<&str>) {
        self.lock()
            .create_failures
            .push_back(message.map(String::from));
    }

    pub(crate) fn fail_next_assign(&self, message: Option<&str>) {
        self.lock()
            .assign_failures
            .push_back(message.map(String::from));
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.lock().list_filters.len()
    }

    pub(crate) fn list_filters(&self) -> Vec<String> {
        self.lock().list_filters.clone()
    }

    pub(crate) fn manager_calls(&self) -> usize {
        self.lock().manager_calls
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.lock().create_calls
    }

    pub(crate) fn assign_calls(&self) -> Vec<(InfluencerId, Option<ManagerId>)> {
        self.lock().assign_calls.clone()
    }
}

fn not_found(what: &str) -> ApiError {
    ApiError::Server {
        status: StatusCode::NOT_FOUND,
        message: format!("{what} not found"),
    }
}

#[async_trait::async_trait]
impl RosterApi for FakeApi {
    async fn list_influencers(&self, filter: &str) -> Result<Vec<Influencer>, ApiError> {
        let (delay, outcome) = {
            let mut state = self.lock();
            state.list_filters.push(filter.to_string());
            let delay = state.list_delays.pop_front();
            let outcome = match state.list_failures.pop_front() {
                Some(failure) => Err(scripted_error(failure)),
                None => Ok(filtered_view(&state.influencers, filter)),
            };
            (delay, outcome)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        outcome
    }

    async fn list_managers(&self) -> Result<Vec<Manager>, ApiError> {
        let mut state = self.lock();
        state.manager_calls += 1;
        match state.manager_failures.pop_front() {
            Some(failure) => Err(scripted_error(failure)),
            None => Ok(state.managers.clone()),
        }
    }

    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<Influencer, ApiError> {
        let mut state = self.lock();
        state.create_calls += 1;
        if let Some(failure) = state.create_failures.pop_front() {
            return Err(scripted_error(failure));
        }
        state.next_id += 1;
        let created = Influencer {
            id: InfluencerId(state.next_id),
            first_name: draft.first_name.clone(),
            last_name: draft.last_name.clone(),
            social_media_accounts: draft.accounts.clone(),
            manager: None,
        };
        state.influencers.push(created.clone());
        Ok(created)
    }

    async fn assign_manager(
        &self,
        influencer: InfluencerId,
        manager: Option<ManagerId>,
    ) -> Result<Influencer, ApiError> {
        if let Some(gate) = &self.assign_gate {
            let _permit = gate.acquire().await.expect("gate closed");
        }

        let mut state = self.lock();
        state.assign_calls.push((influencer, manager));
        if let Some(failure) = state.assign_failures.pop_front() {
            return Err(scripted_error(failure));
        }
        let manager = match manager {
            Some(id) => Some(
                state
                    .managers
                    .iter()
                    .find(|m| m.id == id)
                    .cloned()
                    .ok_or_else(|| not_found("manager"))?,
            ),
            None => None,
        };
        let target = state
            .influencers
            .iter_mut()
            .find(|i| i.id == influencer)
            .ok_or_else(|| not_found("influencer"))?;
        target.manager = manager;
        Ok(target.clone())
    }
}
