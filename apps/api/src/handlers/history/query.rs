use chrono::{DateTime, Utc};
use serde::Deserialize;
use stockroom_application::HistoryFilter;
use stockroom_core::{AppError, AppResult};

/// Query string accepted by the history endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub user: Option<String>,
    pub action: Option<String>,
    #[serde(rename = "includeChanges")]
    pub include_changes: Option<String>,
}

impl HistoryQuery {
    /// `includeChanges=1` (or `true`) requests computed diffs.
    pub fn include_changes(&self) -> bool {
        self.include_changes
            .as_deref()
            .map(str::trim)
            .is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"))
    }

    pub fn into_filter(self) -> AppResult<HistoryFilter> {
        let from = parse_bound("from", self.from.as_deref())?;
        let to = parse_bound("to", self.to.as_deref())?;

        Ok(HistoryFilter::new(from, to, self.user, self.action))
    }
}

fn parse_bound(name: &str, raw: Option<&str>) -> AppResult<Option<DateTime<Utc>>> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    DateTime::parse_from_rfc3339(value)
        .map(|parsed| Some(parsed.with_timezone(&Utc)))
        .map_err(|error| {
            AppError::Validation(format!(
                "{name} must be an RFC3339 timestamp, got '{value}': {error}"
            ))
        })
}
