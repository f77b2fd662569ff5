//! Thin, typed wrapper around the roster service's REST API.
//!
//! [`RosterApi`] is the seam the store and flows talk through;
//! [`HttpRosterClient`] is its `reqwest` implementation. Responses are
//! parsed into the wire schemas and converted to domain types before they
//! leave this module, so callers never see raw JSON.

use std::fmt;

use reqwest::{Method, Response, Url};
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::creation::InfluencerDraft;
use crate::error::ApiError;
use crate::model::{Influencer, InfluencerId, Manager, ManagerId};
use crate::wire::{
    self, AssignManagerRequest, CreateInfluencerRequest, ErrorBody, RawInfluencer, RawManager,
};

/// The four operations the roster service exposes.
///
/// Implemented by [`HttpRosterClient`] for production use. The store and
/// flows hold an `Arc<dyn RosterApi>`, so any implementation (an in-memory
/// fake, a caching layer) can stand in.
#[async_trait::async_trait]
pub trait RosterApi: Send + Sync {
    /// `GET /influencers?filter={filter}`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or a body
    /// that fails the wire schema.
    async fn list_influencers(&self, filter: &str) -> Result<Vec<Influencer>, ApiError>;

    /// `GET /managers`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure, non-2xx status, or a body
    /// that fails the wire schema.
    async fn list_managers(&self) -> Result<Vec<Manager>, ApiError>;

    /// `POST /influencers` with the draft's names and accounts.
    ///
    /// The draft is sent as-is; validation is the caller's job (see
    /// [`InfluencerDraft::validate`]).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Server`] when the service rejects the influencer
    /// (e.g. a uniqueness rule), or any other [`ApiError`] variant.
    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<Influencer, ApiError>;

    /// `PATCH /influencers/{id}/manager` with `{managerId}`; `None` unassigns.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Server`] when the service rejects the assignment
    /// (unknown influencer or manager), or any other [`ApiError`] variant.
    async fn assign_manager(
        &self,
        influencer: InfluencerId,
        manager: Option<ManagerId>,
    ) -> Result<Influencer, ApiError>;

    /// Remove the influencer's manager. Same as `assign_manager(id, None)`.
    async fn unassign_manager(&self, influencer: InfluencerId) -> Result<Influencer, ApiError> {
        self.assign_manager(influencer, None).await
    }
}

/// `reqwest`-backed [`RosterApi`].
///
/// `Clone` is cheap: `reqwest::Client` shares its connection pool.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> Result<(), roster_sync::ApiError> {
/// use roster_sync::{ClientConfig, HttpRosterClient, RosterApi};
///
/// let client = HttpRosterClient::new(&ClientConfig::default())?;
/// let everyone = client.list_influencers("").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct HttpRosterClient {
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for HttpRosterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRosterClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpRosterClient {
    /// Build a client for the service at `config.base_url`.
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the base URL does not parse or is not
    /// an `http`/`https` URL, or if the underlying HTTP client cannot be
    /// built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("base url {:?}: {e}", config.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base url {:?}: unsupported scheme {}",
                config.base_url,
                url.scheme()
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ApiError::Config(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        tracing::debug!(%method, path, "roster api request");
        self.http.request(method, format!("{}{path}", self.base_url))
    }
}

#[async_trait::async_trait]
impl RosterApi for HttpRosterClient {
    async fn list_influencers(&self, filter: &str) -> Result<Vec<Influencer>, ApiError> {
        let response = self
            .request(Method::GET, "/influencers")
            .query(&[("filter", filter)])
            .send()
            .await?;
        let raw: Vec<RawInfluencer> = decode(response).await?;
        wire::influencers_from_raw(raw)
    }

    async fn list_managers(&self) -> Result<Vec<Manager>, ApiError> {
        let response = self.request(Method::GET, "/managers").send().await?;
        let raw: Vec<RawManager> = decode(response).await?;
        Ok(raw.into_iter().map(Manager::from).collect())
    }

    async fn create_influencer(&self, draft: &InfluencerDraft) -> Result<Influencer, ApiError> {
        let body = CreateInfluencerRequest {
            first_name: &draft.first_name,
            last_name: &draft.last_name,
            social_media_accounts: &draft.accounts,
        };
        let response = self
            .request(Method::POST, "/influencers")
            .json(&body)
            .send()
            .await?;
        let raw: RawInfluencer = decode(response).await?;
        Influencer::try_from(raw)
    }

    async fn assign_manager(
        &self,
        influencer: InfluencerId,
        manager: Option<ManagerId>,
    ) -> Result<Influencer, ApiError> {
        let body = AssignManagerRequest {
            manager_id: manager,
        };
        let response = self
            .request(Method::PATCH, &format!("/influencers/{influencer}/manager"))
            .json(&body)
            .send()
            .await?;
        let raw: RawInfluencer = decode(response).await?;
        Influencer::try_from(raw)
    }
}

/// Read a response body and decode it as `T`, mapping non-2xx statuses to
/// [`ApiError::Server`] (when the body names a reason) or
/// [`ApiError::Status`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Classify a non-2xx response body.
///
/// Extracted from [`decode`] so the classification can be unit-tested
/// without a live server.
fn error_from_body(status: reqwest::StatusCode, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: Some(message),
        }) if !message.is_empty() => ApiError::Server { status, message },
        _ => ApiError::Status(status),
    }
}
