use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::AlertEngine;
use crate::health::HealthStore;
use crate::monitoring::types::Target;
use crate::registry::{AdminRegistry, TargetRegistry};

pub const SITES_DOCUMENT: &str = "sites";
pub const STATE_DOCUMENT: &str = "state";
pub const ADMINS_DOCUMENT: &str = "admins";

/// `{sites: [Target...], messageId, createdAt}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitesDocument {
    pub sites: TargetRegistry,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(with = "chrono::serde::ts_milliseconds", default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl SitesDocument {
    pub fn new(sites: Vec<Target>) -> Self {
        Self { sites: TargetRegistry::new(sites), message_id: None, created_at: Utc::now() }
    }

    /// The two example targets a fresh installation starts with.
    pub fn seed() -> Self {
        Self::new(vec![
            Target::http("example", "Example Site", "https://example.com"),
            Target::http("example-docs", "Example Docs", "https://example.org"),
        ])
    }
}

/// `{sites: {targetId: HealthRecord}, alerts: {targetId: AlertRecord}}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default)]
    pub sites: HealthStore,
    #[serde(default)]
    pub alerts: AlertEngine,
}

impl StateDocument {
    /// Give every target a health record. Orphaned records are kept.
    /// Returns true if any record was created.
    pub fn cover(&mut self, targets: &[Target]) -> bool {
        let mut created = false;
        for target in targets {
            created |= self.sites.ensure(&target.id);
        }
        created
    }
}

/// `{mainAdmin, admins: [...]}`
pub type AdminsDocument = AdminRegistry;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sites_document_shape() {
        let document = SitesDocument::seed();
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["sites"].as_array().unwrap().len(), 2);
        assert!(json["messageId"].is_null());
        assert!(json["createdAt"].is_i64());
    }

    #[test]
    fn test_cover_creates_missing_records_only() {
        let sites = SitesDocument::seed();
        let mut state = StateDocument::default();
        state.sites.ensure("removed-long-ago");

        assert!(state.cover(sites.sites.list()));
        assert!(!state.cover(sites.sites.list()));
        assert_eq!(state.sites.len(), 3);
    }

    #[test]
    fn test_state_document_parses_partial_input() {
        let state: StateDocument = serde_json::from_str(r#"{"sites":{"a":{}}}"#).unwrap();
        assert!(state.sites.get("a").is_some());
        assert!(state.alerts.is_empty());
    }
}
