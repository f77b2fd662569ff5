//! Assigning an influencer to a manager, or removing the assignment.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

use crate::client::RosterApi;
use crate::error::AssignError;
use crate::model::{Influencer, InfluencerId, ManagerId};
use crate::refresh::RefreshFlag;

/// Where an [`AssignmentFlow`] is in its lifecycle.
///
/// `Idle -> Selecting -> Submitting -> (Refreshed | Failed)`. Selecting
/// again from `Refreshed` or `Failed` starts over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignState {
    /// Nothing selected since the flow was created or synced.
    Idle,
    /// The operator picked a manager that has not been submitted yet.
    Selecting,
    /// The PATCH is in flight. The only busy state.
    Submitting,
    /// The service confirmed the assignment and the refresh flag is raised.
    Refreshed,
    /// The last submit failed; carries the message to show.
    Failed(String),
}

/// The manager picker for one influencer.
pub struct AssignmentFlow {
    client: Arc<dyn RosterApi>,
    refresh: RefreshFlag,
    influencer: InfluencerId,
    assigned: Option<ManagerId>,
    selected: Option<ManagerId>,
    state: watch::Sender<AssignState>,
}

impl fmt::Debug for AssignmentFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssignmentFlow")
            .field("influencer", &self.influencer)
            .field("assigned", &self.assigned)
            .field("selected", &self.selected)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl AssignmentFlow {
    /// Create a flow for `influencer`, with its current manager selected.
    pub fn new(client: Arc<dyn RosterApi>, refresh: RefreshFlag, influencer: &Influencer) -> Self {
        let assigned = influencer.manager_id();
        let (state, _) = watch::channel(AssignState::Idle);
        Self {
            client,
            refresh,
            influencer: influencer.id,
            assigned,
            selected: assigned,
            state,
        }
    }

    /// The influencer this flow edits.
    pub fn influencer(&self) -> InfluencerId {
        self.influencer
    }

    /// The manager the service last reported as assigned.
    pub fn assigned(&self) -> Option<ManagerId> {
        self.assigned
    }

    /// The operator's current pick. `None` means "no manager".
    pub fn selected(&self) -> Option<ManagerId> {
        self.selected
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AssignState {
        self.state.borrow().clone()
    }

    /// A receiver that wakes on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AssignState> {
        self.state.subscribe()
    }

    /// The message from the last failed submit, if the flow is `Failed`.
    pub fn error(&self) -> Option<String> {
        match &*self.state.borrow() {
            AssignState::Failed(message) => Some(message.clone()),
            _ => None,
        }
    }

    /// `true` while a submit is in flight.
    pub fn is_busy(&self) -> bool {
        *self.state.borrow() == AssignState::Submitting
    }

    /// Whether the submit control is enabled: not busy, and the selection
    /// differs from the assigned manager.
    pub fn can_submit(&self) -> bool {
        !self.is_busy() && self.selected != self.assigned
    }

    /// Change the selection. Local only.
    pub fn select_manager(&mut self, manager: Option<ManagerId>) {
        self.selected = manager;
        self.state.send_replace(AssignState::Selecting);
    }

    /// Submit the selection.
    ///
    /// On success the manager returned by the service becomes the assigned
    /// one and the refresh flag is raised. On failure the selection is kept
    /// and the flow moves to [`AssignState::Failed`].
    ///
    /// # Errors
    ///
    /// * [`AssignError::NoChange`] -- the selection already matches the
    ///   assigned manager; nothing was sent.
    /// * [`AssignError::Api`] -- the service rejected the assignment or could
    ///   not be reached.
    pub async fn assign(&mut self) -> Result<Influencer, AssignError> {
        if !self.can_submit() {
            return Err(AssignError::NoChange);
        }

        self.state.send_replace(AssignState::Submitting);
        let result = self
            .client
            .assign_manager(self.influencer, self.selected)
            .await;

        match result {
            Ok(updated) => {
                tracing::info!(
                    influencer_id = %self.influencer,
                    manager_id = ?updated.manager_id(),
                    "manager assignment saved"
                );
                self.assigned = updated.manager_id();
                self.selected = self.assigned;
                self.state.send_replace(AssignState::Refreshed);
                self.refresh.raise();
                Ok(updated)
            }
            Err(e) => {
                let err = AssignError::Api(e);
                tracing::warn!(influencer_id = %self.influencer, error = %err, "manager assignment failed");
                self.state
                    .send_replace(AssignState::Failed(err.user_message()));
                Err(err)
            }
        }
    }

    /// Select "no manager" and submit.
    ///
    /// # Errors
    ///
    /// Same as [`assign`](AssignmentFlow::assign); `NoChange` if nobody is
    /// assigned.
    pub async fn unassign(&mut self) -> Result<Influencer, AssignError> {
        self.select_manager(None);
        self.assign().await
    }

    /// Adopt the assigned manager from a reloaded copy of the influencer.
    ///
    /// Ignored (returns `false`) when `influencer` has a different id. An
    /// unsubmitted selection survives the sync; otherwise the selection
    /// follows the new assignment.
    pub fn sync(&mut self, influencer: &Influencer) -> bool {
        if influencer.id != self.influencer {
            return false;
        }
        self.assigned = influencer.manager_id();
        let state = self.state();
        if !matches!(state, AssignState::Selecting | AssignState::Failed(_)) {
            self.selected = self.assigned;
        }
        true
    }
}
