//! Client-side name filtering and its memoized view.

use std::sync::Arc;

use crate::model::Influencer;

/// Whether `influencer`'s `"first last"` contains `filter`, ignoring case.
///
/// An empty filter matches everyone.
pub fn matches_filter(influencer: &Influencer, filter: &str) -> bool {
    filter.is_empty()
        || influencer
            .full_name()
            .to_lowercase()
            .contains(&filter.to_lowercase())
}

/// The influencers from `collection` matching `filter`, keeping collection
/// order.
pub fn filtered_view(collection: &[Influencer], filter: &str) -> Vec<Influencer> {
    collection
        .iter()
        .filter(|influencer| matches_filter(influencer, filter))
        .cloned()
        .collect()
}

/// Caches the filtered view of one collection under one filter.
///
/// The result is recomputed only when the source collection (compared by
/// allocation) or the filter text changes. An empty filter returns the
/// source itself.
#[derive(Debug, Clone)]
pub(crate) struct FilterMemo {
    source: Arc<[Influencer]>,
    filter: String,
    result: Arc<[Influencer]>,
}

impl Default for FilterMemo {
    fn default() -> Self {
        let empty: Arc<[Influencer]> = Arc::from(Vec::new());
        Self {
            source: empty.clone(),
            filter: String::new(),
            result: empty,
        }
    }
}

impl FilterMemo {
    /// The filtered view of `source` under `filter`.
    pub(crate) fn view(&mut self, source: &Arc<[Influencer]>, filter: &str) -> Arc<[Influencer]> {
        if Arc::ptr_eq(&self.source, source) && self.filter == filter {
            return self.result.clone();
        }
        self.result = if filter.is_empty() {
            source.clone()
        } else {
            Arc::from(filtered_view(source, filter))
        };
        self.source = source.clone();
        self.filter = filter.to_string();
        self.result.clone()
    }
}
