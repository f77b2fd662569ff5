//! Typed client and view-state synchronization for an influencer/manager
//! roster service.

mod app;
pub use app::{RosterApp, RosterAppBuilder};
mod assignment;
pub use assignment::{AssignState, AssignmentFlow};
mod client;
pub use client::{HttpRosterClient, RosterApi};
mod config;
mod creation;
mod debounce;
mod error;
mod filter;
mod model;
mod refresh;
mod store;
#[cfg(test)]
mod test_fixtures;
mod wire;

pub use config::{ClientConfig, DEFAULT_BASE_URL, StoreConfig};
pub use creation::{AccountField, CreationFlow, InfluencerDraft, MAX_NAME_LEN, NameField};
pub use error::{
    ASSIGN_FAILED, ApiError, AssignError, CREATE_FAILED, LOAD_FAILED, StoreError, SubmitError,
    ValidationError,
};
pub use filter::{filtered_view, matches_filter};
pub use model::{
    Influencer, InfluencerId, Manager, ManagerId, ParsePlatformError, Platform,
    SocialMediaAccount,
};
pub use refresh::RefreshFlag;
pub use store::{RosterHandle, RosterSnapshot};
