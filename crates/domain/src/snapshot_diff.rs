//! Field-level change sets between two JSON object snapshots.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Housekeeping fields that change on every write and are never reported.
const HOUSEKEEPING_FIELDS: [&str; 2] = ["created_at", "updated_at"];

/// Before/after values of one changed field. A side is `null` when the key is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// Value before the change.
    pub from: Value,
    /// Value after the change.
    pub to: Value,
}

/// Changed fields keyed by field name, in key order.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// Field names excluded from a diff.
///
/// Always contains `created_at` and `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredFields(BTreeSet<String>);

impl IgnoredFields {
    /// Adds one more ignored field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into());
        self
    }

    /// Returns whether the field is excluded from diffs.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains(field)
    }
}

impl Default for IgnoredFields {
    fn default() -> Self {
        Self(
            HOUSEKEEPING_FIELDS
                .iter()
                .map(|field| (*field).to_owned())
                .collect(),
        )
    }
}

/// Computes the field-level change set between two snapshots.
///
/// Returns `None` when either side is missing or not a JSON object, and when no
/// non-ignored field differs. A `Some` result is never empty, so callers can
/// tell "no changes" and "not computed" apart only through the action that
/// produced the snapshots.
#[must_use]
pub fn diff_snapshots(
    old_snapshot: Option<&Value>,
    new_snapshot: Option<&Value>,
    ignored: &IgnoredFields,
) -> Option<ChangeSet> {
    let old_fields = old_snapshot.and_then(Value::as_object)?;
    let new_fields = new_snapshot.and_then(Value::as_object)?;

    let changes = diff_objects(old_fields, new_fields, ignored);
    if changes.is_empty() {
        return None;
    }

    Some(changes)
}

fn diff_objects(
    old_fields: &Map<String, Value>,
    new_fields: &Map<String, Value>,
    ignored: &IgnoredFields,
) -> ChangeSet {
    let keys = old_fields
        .keys()
        .chain(new_fields.keys())
        .filter(|key| !ignored.contains(key))
        .collect::<BTreeSet<_>>();

    keys.into_iter()
        .filter_map(|key| {
            let change = match (old_fields.get(key), new_fields.get(key)) {
                (None, Some(new_value)) => FieldChange {
                    from: Value::Null,
                    to: new_value.clone(),
                },
                (Some(old_value), None) => FieldChange {
                    from: old_value.clone(),
                    to: Value::Null,
                },
                (Some(old_value), Some(new_value)) => {
                    if canonical_eq(old_value, new_value) {
                        return None;
                    }
                    FieldChange {
                        from: old_value.clone(),
                        to: new_value.clone(),
                    }
                }
                (None, None) => return None,
            };

            Some((key.clone(), change))
        })
        .collect()
}

/// Two values are equal when they are structurally identical.
///
/// Object key order never matters, while the JSON type does: `5`, `5.0` and
/// `"5"` are three distinct values.
fn canonical_eq(left: &Value, right: &Value) -> bool {
    left == right
}
