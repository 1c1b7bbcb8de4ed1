use serde::{Deserialize, Serialize};

/// Privileged identities. `main_admin` is always a member and cannot be removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistry {
    main_admin: String,
    #[serde(default)]
    admins: Vec<String>,
}

impl AdminRegistry {
    pub fn new(main_admin: impl Into<String>) -> Self {
        let main_admin = main_admin.into();
        Self { admins: vec![main_admin.clone()], main_admin }
    }

    pub fn main_admin(&self) -> &str {
        &self.main_admin
    }

    pub fn admins(&self) -> &[String] {
        &self.admins
    }

    pub fn is_admin(&self, identity: &str) -> bool {
        self.admins.iter().any(|a| a == identity)
    }

    /// Returns false if `identity` is already an admin.
    pub fn add(&mut self, identity: &str) -> bool {
        if self.is_admin(identity) {
            return false;
        }
        self.admins.push(identity.to_string());
        true
    }

    /// Returns false for the main admin and for unknown identities.
    pub fn remove(&mut self, identity: &str) -> bool {
        if identity == self.main_admin {
            return false;
        }
        match self.admins.iter().position(|a| a == identity) {
            Some(index) => {
                self.admins.remove(index);
                true
            }
            None => false,
        }
    }

    /// Re-establish the main admin membership after loading from disk.
    /// Returns true if the registry was changed.
    pub fn repair(&mut self) -> bool {
        if self.is_admin(&self.main_admin) {
            return false;
        }
        self.admins.insert(0, self.main_admin.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_admin_is_protected() {
        let mut registry = AdminRegistry::new("1000");

        assert!(!registry.remove("1000"));
        assert!(registry.is_admin("1000"));
        assert_eq!(registry.admins(), ["1000"]);
    }

    #[test]
    fn test_add_and_remove() {
        let mut registry = AdminRegistry::new("1000");

        assert!(registry.add("2000"));
        assert!(!registry.add("2000"));
        assert!(registry.is_admin("2000"));

        assert!(registry.remove("2000"));
        assert!(!registry.remove("2000"));
        assert!(!registry.is_admin("2000"));
    }

    #[test]
    fn test_repair_restores_main_admin() {
        let mut registry: AdminRegistry =
            serde_json::from_str(r#"{"mainAdmin":"1000","admins":["2000"]}"#).unwrap();

        assert!(!registry.is_admin("1000"));
        assert!(registry.repair());
        assert_eq!(registry.admins(), ["1000", "2000"]);
        assert!(!registry.repair());
    }
}
