use std::borrow::Cow;

use serde_json::Value;
use stockroom_domain::HistoryEntry;

use crate::dto::format_timestamp;

const HEADER: &str = "id,item_id,action,actor,actor_role,changed_at,old_data,new_data";

/// Renders ledger entries as RFC 4180 CSV with a header row.
pub(super) fn render_history_csv(entries: &[HistoryEntry]) -> String {
    let mut output = String::with_capacity(HEADER.len() + 2 + entries.len() * 128);
    output.push_str(HEADER);
    output.push_str("\r\n");

    for entry in entries {
        let fields = [
            entry.id().to_string(),
            entry.item_id().to_string(),
            entry.action().as_str().to_owned(),
            entry.actor().unwrap_or_default().to_owned(),
            entry.actor_role().unwrap_or_default().to_owned(),
            format_timestamp(entry.changed_at()),
            snapshot_text(entry.old_data()),
            snapshot_text(entry.new_data()),
        ];

        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                output.push(',');
            }
            output.push_str(&escape_field(field));
        }
        output.push_str("\r\n");
    }

    output
}

fn snapshot_text(snapshot: Option<&Value>) -> String {
    snapshot.map(Value::to_string).unwrap_or_default()
}

/// Quotes a field when it contains a delimiter, quote or line break.
pub(super) fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
