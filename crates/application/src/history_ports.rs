use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockroom_core::AppResult;
use stockroom_domain::{HistoryEntry, ItemId};

/// Optional predicates narrowing an item history read.
///
/// Absent fields add no predicate. Actor and action are trimmed, and a value
/// that is empty after trimming counts as absent. Time bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryFilter {
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    actor: Option<String>,
    action: Option<String>,
}

impl HistoryFilter {
    /// Creates a normalized filter.
    #[must_use]
    pub fn new(
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        actor: Option<String>,
        action: Option<String>,
    ) -> Self {
        Self {
            from,
            to,
            actor: normalize(actor),
            action: normalize(action),
        }
    }

    /// Returns the inclusive lower time bound.
    #[must_use]
    pub fn from(&self) -> Option<DateTime<Utc>> {
        self.from
    }

    /// Returns the inclusive upper time bound.
    #[must_use]
    pub fn to(&self) -> Option<DateTime<Utc>> {
        self.to
    }

    /// Returns the exact actor to match.
    #[must_use]
    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Returns the exact action to match.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    /// Returns whether an entry satisfies every present predicate.
    ///
    /// Storage adapters that cannot push predicates down use this directly.
    #[must_use]
    pub fn matches(&self, entry: &HistoryEntry) -> bool {
        self.from.is_none_or(|from| entry.changed_at() >= from)
            && self.to.is_none_or(|to| entry.changed_at() <= to)
            && self
                .actor
                .as_deref()
                .is_none_or(|actor| entry.actor() == Some(actor))
            && self
                .action
                .as_deref()
                .is_none_or(|action| entry.action().as_str() == action)
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Repository port for the append-only item ledger.
///
/// The port is read-only: ledger rows are written by storage as a side
/// effect of committed item mutations and never change afterwards.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Lists an item's ledger entries matching the filter, newest first
    /// (`changed_at` descending, then `id` descending).
    async fn list_by_item(
        &self,
        item_id: ItemId,
        filter: &HistoryFilter,
    ) -> AppResult<Vec<HistoryEntry>>;
}
