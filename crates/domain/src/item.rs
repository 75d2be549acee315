//! Stock item entity and its validated mutation payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stockroom_core::{AppError, AppResult, NonEmptyString};

/// Storage-assigned identifier of a stock item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(i64);

impl ItemId {
    /// Wraps a raw storage identifier.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw storage identifier.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated field values for creating or replacing a stock item.
///
/// SKU and name are trimmed and required, quantity must not be negative, and a
/// blank location collapses to `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDraft {
    sku: NonEmptyString,
    name: NonEmptyString,
    qty: i32,
    location: Option<String>,
}

impl ItemDraft {
    /// Validates raw item fields.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        qty: i32,
        location: Option<String>,
    ) -> AppResult<Self> {
        let sku = NonEmptyString::new(sku)
            .map_err(|_| AppError::Validation("sku and name are required".to_owned()))?;
        let name = NonEmptyString::new(name)
            .map_err(|_| AppError::Validation("sku and name are required".to_owned()))?;

        if qty < 0 {
            return Err(AppError::Validation("qty must be >= 0".to_owned()));
        }

        let location = location
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        Ok(Self {
            sku,
            name,
            qty,
            location,
        })
    }

    /// Returns the stock keeping unit.
    #[must_use]
    pub fn sku(&self) -> &NonEmptyString {
        &self.sku
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the quantity on hand.
    #[must_use]
    pub fn qty(&self) -> i32 {
        self.qty
    }

    /// Returns the optional storage location.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

/// Persisted stock item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: ItemId,
    sku: String,
    name: String,
    qty: i32,
    location: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Item {
    /// Rebuilds an item from stored values.
    #[must_use]
    pub fn new(
        id: ItemId,
        draft: ItemDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            sku: draft.sku.into(),
            name: draft.name.into(),
            qty: draft.qty,
            location: draft.location,
            created_at,
            updated_at,
        }
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Returns the stock keeping unit.
    #[must_use]
    pub fn sku(&self) -> &str {
        self.sku.as_str()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the quantity on hand.
    #[must_use]
    pub fn qty(&self) -> i32 {
        self.qty
    }

    /// Returns the optional storage location.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last modification timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Renders the item as the flat JSON object stored in history snapshots.
    #[must_use]
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id.as_i64(),
            "sku": self.sku,
            "name": self.name,
            "qty": self.qty,
            "location": self.location,
            "created_at": self.created_at,
            "updated_at": self.updated_at,
        })
    }
}
