use serde::{Deserialize, Serialize};

/// Default number of consecutive failures before a target alerts.
pub const DEFAULT_ALERT_AFTER: u32 = 2;

/// Kind of probe performed against a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[default]
    Http,
}

/// A monitored endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    /// URL-safe slug, unique within the registry
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(rename = "type", default)]
    pub kind: TargetKind,
    /// Consecutive failures needed before an alert fires (at least 1)
    #[serde(default = "default_alert_after")]
    pub alert_after: u32,
}

fn default_alert_after() -> u32 {
    DEFAULT_ALERT_AFTER
}

impl Target {
    pub fn http(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            kind: TargetKind::Http,
            alert_after: DEFAULT_ALERT_AFTER,
        }
    }

    /// Threshold with the `>= 1` floor applied.
    pub fn alert_threshold(&self) -> u32 {
        self.alert_after.max(1)
    }
}

/// Status of a target as of its latest applied outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TargetStatus {
    Up,
    Down,
    #[default]
    Unknown,
}

impl std::fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetStatus::Up => write!(f, "up"),
            TargetStatus::Down => write!(f, "down"),
            TargetStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Result of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub latency_ms: Option<u64>,
}

impl Outcome {
    pub fn up(status_code: u16, latency_ms: u64) -> Self {
        Self { ok: true, status_code: Some(status_code), latency_ms: Some(latency_ms) }
    }

    /// A response was received but its status code is outside [200, 400).
    pub fn rejected(status_code: u16, latency_ms: u64) -> Self {
        Self { ok: false, status_code: Some(status_code), latency_ms: Some(latency_ms) }
    }

    /// No response at all (network error or timeout).
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// One-line human summary, e.g. `Result: 🟢 Online • Code: 200 • Ping: 12ms`.
    pub fn describe(&self) -> String {
        let state = if self.ok { "🟢 Online" } else { "🔴 Offline" };
        let code = self.status_code.map_or("—".to_string(), |c| c.to_string());
        let ping = self.latency_ms.map_or("—".to_string(), |p| p.to_string());
        format!("Result: {state} • Code: {code} • Ping: {ping}ms")
    }
}

/// Outcome collected for one target during a cycle
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub target: Target,
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_description() {
        assert_eq!(Outcome::up(200, 12).describe(), "Result: 🟢 Online • Code: 200 • Ping: 12ms");
        assert_eq!(Outcome::unreachable().describe(), "Result: 🔴 Offline • Code: — • Ping: —ms");
    }

    #[test]
    fn target_document_shape() {
        let target = Target::http("convoy", "Convoy Panel", "https://example.com");
        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["type"], "http");
        assert_eq!(json["alertAfter"], 2);

        let parsed: Target = serde_json::from_str(
            r#"{"id":"mc","name":"MC Panel","url":"https://example.org"}"#,
        )
        .unwrap();
        assert_eq!(parsed.kind, TargetKind::Http);
        assert_eq!(parsed.alert_after, DEFAULT_ALERT_AFTER);
    }

    #[test]
    fn alert_threshold_is_at_least_one() {
        let mut target = Target::http("a", "A", "http://a");
        target.alert_after = 0;
        assert_eq!(target.alert_threshold(), 1);
    }

    #[test]
    fn unreachable_outcome_has_no_code_or_latency() {
        let outcome = Outcome::unreachable();
        assert!(!outcome.ok);
        assert_eq!(outcome.status_code, None);
        assert_eq!(outcome.latency_ms, None);
    }
}
