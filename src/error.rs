//! Crate-level error types for API calls, draft validation, and the flows
//! built on top of them.

use reqwest::StatusCode;

use crate::creation::{MAX_NAME_LEN, NameField};
use crate::model::Platform;

/// Message shown when a list load fails without a server-provided reason.
pub const LOAD_FAILED: &str = "error fetching data, please try again later";
/// Message shown when a create fails without a server-provided reason.
pub const CREATE_FAILED: &str = "failed to create influencer";
/// Message shown when an assignment fails without a server-provided reason.
pub const ASSIGN_FAILED: &str = "failed to assign manager";

/// Error returned by a [`RosterApi`](crate::RosterApi) call.
///
/// [`Transport`](ApiError::Transport) and [`Status`](ApiError::Status) are
/// network-class failures. [`Server`](ApiError::Server) carries the
/// service's own explanation, which is shown to the operator verbatim.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response without a parseable `{error}` body.
    #[error("unexpected response status {0}")]
    Status(StatusCode),

    /// Non-2xx response whose body named the reason.
    #[error("{message}")]
    Server {
        /// HTTP status of the response.
        status: StatusCode,
        /// The `error` field of the response body.
        message: String,
    },

    /// A 2xx body that does not match the expected schema.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The client could not be configured (bad base URL, TLS setup).
    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// The server-provided message, if the service explained the failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server { message, .. } => Some(message),
            _ => None,
        }
    }

    /// Operator-facing text: the server's message when present, otherwise
    /// `fallback`.
    pub(crate) fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// A draft rejected before it reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required name field is blank.
    #[error("name required: {0} must not be empty")]
    EmptyName(NameField),

    /// A name field exceeds [`MAX_NAME_LEN`] characters.
    #[error(
        "name too long: {field} has {len} characters, at most {max} allowed",
        max = MAX_NAME_LEN
    )]
    NameTooLong {
        /// Which name was too long.
        field: NameField,
        /// Its length in characters.
        len: usize,
    },

    /// Two draft rows share the same platform and username.
    #[error("duplicate account: {platform} {username}")]
    DuplicateAccount {
        /// Platform of the repeated pair.
        platform: Platform,
        /// Username of the repeated pair.
        username: String,
    },

    /// A draft row was addressed by a position that does not exist.
    #[error("no account at position {index} (draft has {len})")]
    NoSuchAccount {
        /// Requested position.
        index: usize,
        /// Number of rows in the draft.
        len: usize,
    },
}

/// Error returned by [`CreationFlow::submit`](crate::CreationFlow::submit).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    /// The draft failed local validation; no request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The service rejected the create or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl SubmitError {
    /// Operator-facing text for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Api(e) => e.user_message(CREATE_FAILED),
        }
    }
}

/// Error returned by [`AssignmentFlow::assign`](crate::AssignmentFlow::assign).
#[derive(Debug, thiserror::Error)]
pub enum AssignError {
    /// The selection equals the currently assigned manager.
    #[error("selected manager is already assigned")]
    NoChange,

    /// The service rejected the assignment or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl AssignError {
    /// Operator-facing text for this failure.
    pub fn user_message(&self) -> String {
        match self {
            Self::NoChange => self.to_string(),
            Self::Api(e) => e.user_message(ASSIGN_FAILED),
        }
    }
}

/// Error returned when tearing down a mounted roster store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store task panicked or was aborted.
    #[error("roster store task failed: {0}")]
    TaskFailed(String),

    /// The store was torn down while a caller was waiting on it.
    #[error("roster store is no longer running")]
    Stopped,
}
