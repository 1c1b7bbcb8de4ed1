use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::monitoring::types::{DEFAULT_ALERT_AFTER, Target, TargetKind};

/// Maximum length of a derived target id.
const ID_MAX_LEN: usize = 24;

/// Lowercase `name` and collapse every run of non `[a-z0-9]` characters into
/// one hyphen, truncated to 24 characters.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_gap = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
            in_gap = false;
        } else if !in_gap {
            slug.push('-');
            in_gap = true;
        }
    }

    slug.truncate(ID_MAX_LEN);
    slug
}

/// The ordered set of monitored targets
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetRegistry {
    targets: Vec<Target>,
}

impl TargetRegistry {
    pub fn new(targets: Vec<Target>) -> Self {
        Self { targets }
    }

    /// Register `url` under `name` (or the url itself), deriving a unique id.
    pub fn add(&mut self, url: &str, name: Option<&str>) -> Target {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(url);
        let id = unique_id(&slugify(name), |candidate| self.get(candidate).is_some());

        let target = Target {
            id,
            name: name.to_string(),
            url: url.to_string(),
            kind: TargetKind::Http,
            alert_after: DEFAULT_ALERT_AFTER,
        };
        self.targets.push(target.clone());
        target
    }

    pub fn remove(&mut self, id: &str) -> Option<Target> {
        let index = self.targets.iter().position(|t| t.id == id)?;
        Some(self.targets.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }

    /// Targets in insertion order.
    pub fn list(&self) -> &[Target] {
        &self.targets
    }

    /// Give every target without an id one derived from its name, and
    /// suffix ids that repeat an earlier target's. Returns true if anything
    /// changed.
    pub fn normalize_ids(&mut self) -> bool {
        let mut changed = false;
        let mut seen: HashSet<String> = HashSet::new();

        for index in 0..self.targets.len() {
            let current = &self.targets[index];
            if !current.id.is_empty() && !seen.contains(&current.id) {
                seen.insert(current.id.clone());
                continue;
            }

            let base = if current.id.is_empty() { slugify(&current.name) } else { current.id.clone() };
            let later = &self.targets[index + 1..];
            let id = unique_id(&base, |candidate| {
                seen.contains(candidate) || later.iter().any(|t| t.id == candidate)
            });

            seen.insert(id.clone());
            self.targets[index].id = id;
            changed = true;
        }
        changed
    }
}

/// `base`, or `base-1`, `base-2`, ... whichever is first not `taken`.
fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    let mut id = base.to_string();
    let mut suffix = 1;
    while taken(&id) {
        id = format!("{base}-{suffix}");
        suffix += 1;
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Example Site"), "example-site");
        assert_eq!(slugify("http://x"), "http-x");
        assert_eq!(slugify("  MC -- Panel!!"), "-mc-panel-");
        assert_eq!(slugify("a very long name that keeps going"), "a-very-long-name-that-ke");
        assert_eq!(slugify("Café"), "caf-");
    }

    #[test]
    fn test_add_suffixes_colliding_ids() {
        let mut registry = TargetRegistry::default();

        let first = registry.add("http://x", Some("Example Site"));
        let second = registry.add("http://y", Some("Example Site"));
        let third = registry.add("http://z", Some("Example Site"));

        assert_eq!(first.id, "example-site");
        assert_eq!(second.id, "example-site-1");
        assert_eq!(third.id, "example-site-2");
        assert_eq!(second.url, "http://y");
    }

    #[test]
    fn test_add_defaults() {
        let mut registry = TargetRegistry::default();
        let target = registry.add("https://status.example.com", None);

        assert_eq!(target.name, "https://status.example.com");
        assert_eq!(target.id, "https-status-example-com");
        assert_eq!(target.kind, TargetKind::Http);
        assert_eq!(target.alert_after, 2);
    }

    #[test]
    fn test_remove_and_list_order() {
        let mut registry = TargetRegistry::default();
        registry.add("http://a", Some("A"));
        registry.add("http://b", Some("B"));
        registry.add("http://c", Some("C"));

        assert_eq!(registry.remove("b").map(|t| t.name), Some("B".to_string()));
        assert!(registry.remove("b").is_none());

        let ids: Vec<_> = registry.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_normalize_ids() {
        let target = Target::http("", "Convoy Panel", "https://example.com");
        let mut registry = TargetRegistry::new(vec![target]);

        assert!(registry.normalize_ids());
        assert_eq!(registry.list()[0].id, "convoy-panel");
        assert!(!registry.normalize_ids());
    }

    #[test]
    fn test_normalize_ids_repairs_collisions() {
        let mut registry = TargetRegistry::new(vec![
            Target::http("panel", "Panel", "https://a.example.com"),
            Target::http("", "Panel", "https://b.example.com"),
            Target::http("panel", "Panel Copy", "https://c.example.com"),
            Target::http("panel-1", "Other", "https://d.example.com"),
        ]);

        assert!(registry.normalize_ids());

        let ids: Vec<_> = registry.list().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["panel", "panel-2", "panel-3", "panel-1"]);
        assert!(!registry.normalize_ids());
    }
}
