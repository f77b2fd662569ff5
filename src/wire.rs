//! JSON schemas exchanged with the roster service.
//!
//! Responses are deserialized into the `Raw*` structs first and converted
//! into domain types with [`TryFrom`], so shape and enum checks happen at
//! the boundary. Request bodies borrow from the caller's data.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::model::{
    Influencer, InfluencerId, Manager, ManagerId, Platform, SocialMediaAccount,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawInfluencer {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub social_media_accounts: Vec<RawAccount>,
    #[serde(default)]
    pub manager: Option<RawManager>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawAccount {
    pub platform: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawManager {
    pub id: u64,
    pub name: String,
}

/// Body of a non-2xx response. The service is expected to send
/// `{"error": "..."}` but nothing guarantees it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateInfluencerRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub social_media_accounts: &'a [SocialMediaAccount],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignManagerRequest {
    pub manager_id: Option<ManagerId>,
}

impl TryFrom<RawAccount> for SocialMediaAccount {
    type Error = ApiError;

    fn try_from(raw: RawAccount) -> Result<Self, Self::Error> {
        let platform: Platform = raw
            .platform
            .parse::<Platform>()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        Ok(Self {
            platform,
            username: raw.username,
        })
    }
}

impl From<RawManager> for Manager {
    fn from(raw: RawManager) -> Self {
        Self {
            id: ManagerId(raw.id),
            name: raw.name,
        }
    }
}

impl TryFrom<RawInfluencer> for Influencer {
    type Error = ApiError;

    fn try_from(raw: RawInfluencer) -> Result<Self, Self::Error> {
        let social_media_accounts = raw
            .social_media_accounts
            .into_iter()
            .map(SocialMediaAccount::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            id: InfluencerId(raw.id),
            first_name: raw.first_name,
            last_name: raw.last_name,
            social_media_accounts,
            manager: raw.manager.map(Manager::from),
        })
    }
}

/// Convert a list of raw influencers, failing on the first invalid entry.
pub(crate) fn influencers_from_raw(raw: Vec<RawInfluencer>) -> Result<Vec<Influencer>, ApiError> {
    raw.into_iter().map(Influencer::try_from).collect()
}
