//! Composing and submitting a new influencer.
//!
//! [`InfluencerDraft`] is the unsaved record; [`CreationFlow`] owns one
//! draft, validates it locally, submits it, and raises the shared
//! [`RefreshFlag`] once the service confirms the create.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::client::RosterApi;
use crate::error::{SubmitError, ValidationError};
use crate::model::{Influencer, Platform, SocialMediaAccount};
use crate::refresh::RefreshFlag;

/// Maximum length of a first or last name, in characters.
pub const MAX_NAME_LEN: usize = 50;

/// Identifies one of the draft's name fields in validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// The first name.
    First,
    /// The last name.
    Last,
}

impl fmt::Display for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::First => f.write_str("first name"),
            Self::Last => f.write_str("last name"),
        }
    }
}

/// Replacement value for one field of a draft account row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountField {
    /// Set the row's platform.
    Platform(Platform),
    /// Set the row's username.
    Username(String),
}

/// An influencer being composed, not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfluencerDraft {
    /// First name as typed.
    pub first_name: String,
    /// Last name as typed.
    pub last_name: String,
    /// Account rows in the order they were added.
    pub accounts: Vec<SocialMediaAccount>,
}

impl InfluencerDraft {
    /// `true` when every field is at its empty default.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_empty() && self.last_name.is_empty() && self.accounts.is_empty()
    }

    /// Check the draft against the roster's rules.
    ///
    /// Names are checked first (non-empty, at most [`MAX_NAME_LEN`]
    /// characters), then accounts are checked for a repeated
    /// `(platform, username)` pair. Usernames are compared exactly, with no
    /// trimming or case folding.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_name(NameField::First, &self.first_name)?;
        validate_name(NameField::Last, &self.last_name)?;

        let mut seen = HashSet::with_capacity(self.accounts.len());
        for account in &self.accounts {
            if !seen.insert((account.platform, account.username.as_str())) {
                return Err(ValidationError::DuplicateAccount {
                    platform: account.platform,
                    username: account.username.clone(),
                });
            }
        }
        Ok(())
    }

    fn account_mut(&mut self, index: usize) -> Result<&mut SocialMediaAccount, ValidationError> {
        let len = self.accounts.len();
        self.accounts
            .get_mut(index)
            .ok_or(ValidationError::NoSuchAccount { index, len })
    }
}

fn validate_name(field: NameField, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyName(field));
    }
    let len = value.chars().count();
    if len > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { field, len });
    }
    Ok(())
}

/// The create-influencer form.
///
/// Edits touch only the local draft. [`submit`](CreationFlow::submit) is
/// the single operation that reaches the network, and only after the draft
/// validates.
pub struct CreationFlow {
    client: Arc<dyn RosterApi>,
    refresh: RefreshFlag,
    draft: InfluencerDraft,
    error: Option<String>,
}

impl fmt::Debug for CreationFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationFlow")
            .field("draft", &self.draft)
            .field("error", &self.error)
            .finish()
    }
}

impl CreationFlow {
    /// Create a flow with an empty draft.
    ///
    /// # Arguments
    ///
    /// * `client` - API used for the create call.
    /// * `refresh` - Flag raised after a successful create so the roster
    ///   store reloads.
    pub fn new(client: Arc<dyn RosterApi>, refresh: RefreshFlag) -> Self {
        Self {
            client,
            refresh,
            draft: InfluencerDraft::default(),
            error: None,
        }
    }

    /// The current draft.
    pub fn draft(&self) -> &InfluencerDraft {
        &self.draft
    }

    /// The message surfaced by the last failed submit, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replace the draft's first name.
    pub fn set_first_name(&mut self, value: impl Into<String>) {
        self.draft.first_name = value.into();
    }

    /// Replace the draft's last name.
    pub fn set_last_name(&mut self, value: impl Into<String>) {
        self.draft.last_name = value.into();
    }

    /// Append an account row with platform `instagram` and an empty username.
    pub fn add_account_draft(&mut self) {
        self.draft.accounts.push(SocialMediaAccount::default());
    }

    /// Remove the account row at `index`, returning it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoSuchAccount`] if `index` is out of range;
    /// the draft is left unchanged.
    pub fn remove_account_draft(
        &mut self,
        index: usize,
    ) -> Result<SocialMediaAccount, ValidationError> {
        let len = self.draft.accounts.len();
        if index >= len {
            return Err(ValidationError::NoSuchAccount { index, len });
        }
        Ok(self.draft.accounts.remove(index))
    }

    /// Replace one field of the account row at `index`, keeping row order.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoSuchAccount`] if `index` is out of range.
    pub fn update_account_draft(
        &mut self,
        index: usize,
        field: AccountField,
    ) -> Result<(), ValidationError> {
        let account = self.draft.account_mut(index)?;
        match field {
            AccountField::Platform(platform) => account.platform = platform,
            AccountField::Username(username) => account.username = username,
        }
        Ok(())
    }

    /// Validate the draft and, if it passes, create the influencer.
    ///
    /// On success the draft is reset to empty defaults and the refresh flag
    /// is raised. On any failure the draft is kept as-is so the operator can
    /// retry, and [`error`](CreationFlow::error) holds the message to show:
    /// the validation message, the service's own message, or
    /// `"failed to create influencer"`.
    ///
    /// # Returns
    ///
    /// The influencer as created by the service.
    ///
    /// # Errors
    ///
    /// * [`SubmitError::Validation`] -- the draft broke a rule; nothing was
    ///   sent.
    /// * [`SubmitError::Api`] -- the service rejected the create or could
    ///   not be reached.
    pub async fn submit(&mut self) -> Result<Influencer, SubmitError> {
        self.error = None;

        let result = self.try_submit().await;
        match &result {
            Ok(created) => {
                tracing::info!(influencer_id = %created.id, "influencer created");
                self.draft = InfluencerDraft::default();
                self.refresh.raise();
            }
            Err(e) => {
                tracing::warn!(error = %e, "influencer create failed");
                self.error = Some(e.user_message());
            }
        }
        result
    }

    async fn try_submit(&self) -> Result<Influencer, SubmitError> {
        self.draft.validate()?;
        Ok(self.client.create_influencer(&self.draft).await?)
    }
}
