//! Point-in-time rendering of every target's health.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::health::HealthStore;
use crate::monitoring::types::{Target, TargetStatus};

/// History entries shown per target.
const RECENT_GLYPHS: usize = 6;
const PANEL_WIDTH: usize = 56;
const UP_GLYPH: &str = "🟢";
const DOWN_GLYPH: &str = "🔴";
const NEVER: &str = "—";

/// One target's line in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRow {
    pub id: String,
    pub name: String,
    pub url: String,
    pub status: TargetStatus,
    /// Recent outcomes, oldest first, as up/down glyphs.
    pub recent: String,
    pub since_up: String,
    pub since_down: String,
}

/// Rendered view of all targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub rows: Vec<SnapshotRow>,
    /// At least one target is up.
    pub healthy: bool,
    pub maintenance: bool,
    #[serde(rename = "refresh_every_ms", serialize_with = "serialize_millis")]
    pub refresh_every: Duration,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

/// Build a snapshot of `targets` from `health` as seen at `now`.
pub fn render(
    targets: &[Target],
    health: &HealthStore,
    now: DateTime<Utc>,
    refresh_every: Duration,
    maintenance: bool,
) -> Snapshot {
    let rows: Vec<SnapshotRow> = targets
        .iter()
        .map(|target| {
            let record = health.get(&target.id);
            let since = |at: Option<DateTime<Utc>>| match at {
                Some(at) => format_elapsed((now - at).to_std().unwrap_or_default()),
                None => NEVER.to_string(),
            };

            SnapshotRow {
                id: target.id.clone(),
                name: target.name.clone(),
                url: target.url.clone(),
                status: record.map(|r| r.last_status).unwrap_or_default(),
                recent: record
                    .map(|r| {
                        r.recent(RECENT_GLYPHS)
                            .map(|e| if e.ok { UP_GLYPH } else { DOWN_GLYPH })
                            .collect::<Vec<_>>()
                            .join(" ")
                    })
                    .unwrap_or_default(),
                since_up: since(record.and_then(|r| r.last_up)),
                since_down: since(record.and_then(|r| r.last_down)),
            }
        })
        .collect();

    Snapshot {
        healthy: rows.iter().any(|row| row.status == TargetStatus::Up),
        rows,
        maintenance,
        refresh_every,
        generated_at: now,
    }
}

/// Format as `Dd Hh Mm Ss`, dropping zero leading units. Seconds always show.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let units = [(total / 86_400, 'd'), (total % 86_400 / 3600, 'h'), (total % 3600 / 60, 'm')];

    let mut parts: Vec<String> = units
        .iter()
        .skip_while(|(value, _)| *value == 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();
    parts.push(format!("{}s", total % 60));
    parts.join(" ")
}

impl Snapshot {
    pub const TITLE: &'static str = "Pulse — System Status";

    /// Boxed text panel, one block per target.
    pub fn panel(&self) -> String {
        let rule = "─".repeat(PANEL_WIDTH);
        let mut lines = vec![format!("┌{rule}┐"), boxed(Self::TITLE), format!("│{}│", " ".repeat(PANEL_WIDTH))];

        if self.maintenance {
            lines.push(boxed("Maintenance mode: alerts paused"));
        }
        for row in &self.rows {
            let label = format!("{}:", truncate(&row.name, 19));
            lines.push(boxed(&format!("{label:<20}{} {}", row.status.to_string().to_uppercase(), row.recent)));
            lines.push(boxed(&format!("{:<20}Up: {} | Down: {}", "", row.since_up, row.since_down)));
        }
        lines.push(format!("└{rule}┘"));
        lines.join("\n")
    }

    /// Short listing, one line per target.
    pub fn quick_status(&self) -> String {
        if self.rows.is_empty() {
            return "No sites are being monitored.".to_string();
        }
        self.rows
            .iter()
            .map(|row| format!("**{}** — {} • {}", row.name, row.status.to_string().to_uppercase(), row.url))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pad `content` into a `│ ... │` panel line.
fn boxed(content: &str) -> String {
    let inner = PANEL_WIDTH - 2;
    let content = truncate(content, inner);
    let pad = inner.saturating_sub(content.chars().count());
    format!("│ {content}{} │", " ".repeat(pad))
}
