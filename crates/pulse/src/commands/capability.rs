/// What a caller must hold to run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Anyone,
    Admin,
}

/// Command name to required capability, checked once before dispatch.
const CAPABILITIES: &[(&str, Capability)] = &[
    ("status", Capability::Anyone),
    ("add", Capability::Admin),
    ("remove", Capability::Admin),
    ("list", Capability::Anyone),
    ("test", Capability::Anyone),
    ("refresh", Capability::Admin),
    ("reload", Capability::Admin),
    ("interval", Capability::Admin),
    ("maintenance", Capability::Admin),
    ("addadmin", Capability::Admin),
    ("rmadmin", Capability::Admin),
    ("admins", Capability::Admin),
    ("logs", Capability::Admin),
    ("export", Capability::Admin),
    ("backup", Capability::Admin),
    ("uptime", Capability::Anyone),
];

/// Names every command is known by.
pub fn command_names() -> impl Iterator<Item = &'static str> {
    CAPABILITIES.iter().map(|(name, _)| *name)
}

/// Unknown names require admin.
pub fn required(command: &str) -> Capability {
    CAPABILITIES
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, capability)| *capability)
        .unwrap_or(Capability::Admin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_gated_subset() {
        let gated: Vec<_> = command_names().filter(|name| required(name) == Capability::Admin).collect();
        assert_eq!(
            gated,
            [
                "add", "remove", "refresh", "reload", "interval", "maintenance", "addadmin", "rmadmin",
                "admins", "logs", "export", "backup"
            ]
        );
        assert_eq!(required("whatever"), Capability::Admin);
    }
}
