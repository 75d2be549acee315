use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stockroom_core::{AppResult, UserIdentity};
use stockroom_domain::{FieldChange, HistoryEntry, Item, ItemDraft};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for starting a session.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub username: String,
    pub role: String,
}

/// API representation of the authenticated user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub role: String,
}

impl From<UserIdentity> for UserIdentityResponse {
    fn from(value: UserIdentity) -> Self {
        Self {
            subject: value.subject().to_owned(),
            role: value.role().as_str().to_owned(),
        }
    }
}

/// Incoming payload for item creation and replacement.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/item-request.ts"
)]
pub struct ItemRequest {
    pub sku: String,
    pub name: String,
    pub qty: i32,
    #[serde(default)]
    pub location: Option<String>,
}

impl ItemRequest {
    pub fn into_draft(self) -> AppResult<ItemDraft> {
        ItemDraft::new(self.sku, self.name, self.qty, self.location)
    }
}

/// API representation of a stock item.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/item-response.ts"
)]
pub struct ItemResponse {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub qty: i32,
    pub location: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Item> for ItemResponse {
    fn from(value: Item) -> Self {
        Self {
            id: value.id().as_i64(),
            sku: value.sku().to_owned(),
            name: value.name().to_owned(),
            qty: value.qty(),
            location: value.location().map(str::to_owned),
            created_at: format_timestamp(value.created_at()),
            updated_at: format_timestamp(value.updated_at()),
        }
    }
}

/// Before and after values of one changed field.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/field-change-response.ts"
)]
pub struct FieldChangeResponse {
    #[ts(type = "unknown")]
    pub from: Value,
    #[ts(type = "unknown")]
    pub to: Value,
}

impl From<&FieldChange> for FieldChangeResponse {
    fn from(value: &FieldChange) -> Self {
        Self {
            from: value.from.clone(),
            to: value.to.clone(),
        }
    }
}

/// API representation of one ledger entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/history-entry-response.ts"
)]
pub struct HistoryEntryResponse {
    pub id: i64,
    pub item_id: i64,
    pub action: String,
    pub actor: Option<String>,
    pub actor_role: Option<String>,
    pub changed_at: String,
    #[ts(type = "Record<string, unknown> | null")]
    pub old_data: Option<Value>,
    #[ts(type = "Record<string, unknown> | null")]
    pub new_data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub changes: Option<BTreeMap<String, FieldChangeResponse>>,
}

impl From<HistoryEntry> for HistoryEntryResponse {
    fn from(value: HistoryEntry) -> Self {
        Self {
            id: value.id(),
            item_id: value.item_id().as_i64(),
            action: value.action().as_str().to_owned(),
            actor: value.actor().map(str::to_owned),
            actor_role: value.actor_role().map(str::to_owned),
            changed_at: format_timestamp(value.changed_at()),
            old_data: value.old_data().cloned(),
            new_data: value.new_data().cloned(),
            changes: value.changes().map(|changes| {
                changes
                    .iter()
                    .map(|(field, change)| (field.clone(), FieldChangeResponse::from(change)))
                    .collect()
            }),
        }
    }
}

/// RFC3339 in UTC with microsecond precision, matching what storage keeps.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}
