//! Domain types for the roster: influencers, their social-media accounts,
//! and the managers they can be assigned to.
//!
//! These are the types the rest of the crate works with. They are built
//! from the wire schemas in [`wire`](crate::wire) once a response has been
//! validated, never deserialized directly from network bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Server-assigned influencer identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfluencerId(pub u64);

impl fmt::Display for InfluencerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-assigned manager identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagerId(pub u64);

impl fmt::Display for ManagerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Social-media platform an account lives on.
///
/// Serialized as its lowercase name (`"instagram"`, `"tiktok"`), which is
/// also what [`Display`](fmt::Display) prints and [`FromStr`] accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Instagram. The default for a freshly added draft row.
    #[default]
    Instagram,
    /// TikTok.
    Tiktok,
}

impl Platform {
    /// Lowercase wire name of the platform.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Tiktok => "tiktok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known [`Platform`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown platform: {0}")]
pub struct ParsePlatformError(pub String);

impl FromStr for Platform {
    type Err = ParsePlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instagram" => Ok(Self::Instagram),
            "tiktok" => Ok(Self::Tiktok),
            other => Err(ParsePlatformError(other.to_string())),
        }
    }
}

/// One social-media handle belonging to an influencer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocialMediaAccount {
    /// Platform hosting the account.
    pub platform: Platform,
    /// Handle on that platform. Free text.
    pub username: String,
}

impl SocialMediaAccount {
    /// Build an account from a platform and a username.
    pub fn new(platform: Platform, username: impl Into<String>) -> Self {
        Self {
            platform,
            username: username.into(),
        }
    }
}

impl FromStr for SocialMediaAccount {
    type Err = ParsePlatformError;

    /// Parse the `platform:username` shorthand used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (platform, username) = s
            .split_once(':')
            .ok_or_else(|| ParsePlatformError(s.to_string()))?;
        Ok(Self::new(platform.parse()?, username))
    }
}

/// A manager an influencer can be assigned to. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manager {
    /// Server-assigned identifier.
    pub id: ManagerId,
    /// Display name.
    pub name: String,
}

/// A persisted influencer as returned by the roster service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Influencer {
    /// Server-assigned identifier.
    pub id: InfluencerId,
    /// First name, at most [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) characters.
    pub first_name: String,
    /// Last name, at most [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) characters.
    pub last_name: String,
    /// Accounts in the order the server returned them.
    pub social_media_accounts: Vec<SocialMediaAccount>,
    /// The assigned manager, if any.
    pub manager: Option<Manager>,
}

impl Influencer {
    /// The `"first last"` string that filters match against.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Identifier of the assigned manager, if any.
    pub fn manager_id(&self) -> Option<ManagerId> {
        self.manager.as_ref().map(|m| m.id)
    }
}

impl fmt::Display for Influencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)?;
        for account in &self.social_media_accounts {
            write!(f, "\n  {}: {}", account.platform, account.username)?;
        }
        if let Some(manager) = &self.manager {
            write!(f, "\n  Manager: {}", manager.name)?;
        }
        Ok(())
    }
}
