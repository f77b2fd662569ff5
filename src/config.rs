//! Configuration for the HTTP client and the roster store.
//!
//! Both structs have sensible defaults accessible via `Default`, and are
//! normally assembled through [`RosterAppBuilder`](crate::RosterAppBuilder).

use std::time::Duration;

/// Default roster service address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// Settings for [`HttpRosterClient`](crate::HttpRosterClient).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use roster_sync::ClientConfig;
///
/// let config = ClientConfig {
///     base_url: "http://roster.internal:8080".into(),
///     ..ClientConfig::default()
/// };
/// assert_eq!(config.request_timeout, Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the roster service. Paths such as `/influencers` are
    /// appended to it; a trailing slash is ignored.
    ///
    /// Default: `http://localhost:3001`.
    pub base_url: String,

    /// Upper bound on a single request, connect through body read.
    ///
    /// Default: 10 seconds.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Settings for a mounted roster store.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use roster_sync::StoreConfig;
///
/// let config = StoreConfig {
///     filter_debounce: Duration::from_millis(50),
///     ..StoreConfig::default()
/// };
/// assert!(config.initial_filter.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Quiet period after the last filter change before the filtered list
    /// is re-fetched from the service.
    ///
    /// The local filtered view updates immediately; only the network load
    /// waits for this window.
    ///
    /// Default: 300 milliseconds.
    pub filter_debounce: Duration,

    /// Filter used for the load issued at mount.
    ///
    /// Default: empty (all influencers).
    pub initial_filter: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            filter_debounce: Duration::from_millis(300),
            initial_filter: String::new(),
        }
    }
}
