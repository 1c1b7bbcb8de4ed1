//! The `status` command surface.
//!
//! Commands arrive either as prefixed free text (`!status add <url> [name]`)
//! or in structured form (a subcommand name plus named options). Both parse
//! into the same [`Command`].

pub mod capability;
mod handler;

pub use capability::{Capability, required};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CommandError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Quick status of every target.
    Status,
    Add { url: String, name: Option<String> },
    Remove { id: String },
    List,
    Test { url: String },
    Refresh,
    Reload,
    Interval { ms: u64 },
    Maintenance { on: bool },
    AddAdmin { id: String },
    RemoveAdmin { id: String },
    Admins,
    Logs,
    Export,
    Backup,
    Uptime,
}

impl Command {
    /// Key into the capability table.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Status => "status",
            Command::Add { .. } => "add",
            Command::Remove { .. } => "remove",
            Command::List => "list",
            Command::Test { .. } => "test",
            Command::Refresh => "refresh",
            Command::Reload => "reload",
            Command::Interval { .. } => "interval",
            Command::Maintenance { .. } => "maintenance",
            Command::AddAdmin { .. } => "addadmin",
            Command::RemoveAdmin { .. } => "rmadmin",
            Command::Admins => "admins",
            Command::Logs => "logs",
            Command::Export => "export",
            Command::Backup => "backup",
            Command::Uptime => "uptime",
        }
    }

    pub fn capability(&self) -> Capability {
        required(self.name())
    }

    /// Parse prefixed free text. `Ok(None)` when the text is not addressed to
    /// us (no prefix, or a word we do not know).
    ///
    /// Accepts `!status <sub> ...` as well as the short `!<sub> ...`.
    pub fn parse_text(prefix: &str, text: &str) -> Result<Option<Self>, CommandError> {
        let Some(body) = text.trim_start().strip_prefix(prefix) else {
            return Ok(None);
        };
        let words: Vec<&str> = body.split_whitespace().collect();
        let Some((first, rest)) = words.split_first() else {
            return Ok(None);
        };

        let first = first.to_lowercase();
        if first == "status" {
            return match rest.split_first() {
                None => Ok(Some(Command::Status)),
                Some((sub, args)) => Self::build(&sub.to_lowercase(), &Args::Positional(args)).map(Some),
            };
        }
        if capability::command_names().any(|name| name == first) {
            return Self::build(&first, &Args::Positional(rest)).map(Some);
        }
        Ok(None)
    }

    /// Parse the structured form: a subcommand name and its options.
    pub fn from_structured(subcommand: &str, options: &Map<String, Value>) -> Result<Self, CommandError> {
        match subcommand.trim().to_lowercase().as_str() {
            "" | "status" => Ok(Command::Status),
            sub => Self::build(sub, &Args::Named(options)),
        }
    }

    fn build(sub: &str, args: &Args<'_>) -> Result<Self, CommandError> {
        let command = match sub {
            "add" => Command::Add {
                url: args.required("url", 0, "status add <url> [name]")?,
                name: args.rest("name", 1),
            },
            "remove" => Command::Remove { id: args.required("id", 0, "status remove <id>")? },
            "list" => Command::List,
            "test" => Command::Test { url: args.required("url", 0, "status test <url>")? },
            "refresh" => Command::Refresh,
            "reload" => Command::Reload,
            "interval" => {
                let raw = args.required("ms", 0, "status interval <ms>")?;
                let ms = parse_ms(&raw)
                    .ok_or_else(|| CommandError::InvalidArgument(format!("Invalid interval: {raw}")))?;
                Command::Interval { ms }
            }
            "maintenance" => {
                let mode = args.required("mode", 0, "status maintenance <on|off>")?;
                match mode.to_lowercase().as_str() {
                    "on" => Command::Maintenance { on: true },
                    "off" => Command::Maintenance { on: false },
                    _ => return Err(CommandError::Usage("status maintenance <on|off>")),
                }
            }
            "addadmin" => Command::AddAdmin { id: args.required("id", 0, "status addadmin <id>")? },
            "rmadmin" => Command::RemoveAdmin { id: args.required("id", 0, "status rmadmin <id>")? },
            "admins" => Command::Admins,
            "logs" => Command::Logs,
            "export" => Command::Export,
            "backup" => Command::Backup,
            "uptime" => Command::Uptime,
            other => return Err(CommandError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Interval values may come as `2500`, `2500.0` or a JSON number.
fn parse_ms(raw: &str) -> Option<u64> {
    if let Ok(ms) = raw.parse::<u64>() {
        return Some(ms);
    }
    raw.parse::<f64>().ok().filter(|ms| ms.is_finite() && *ms >= 0.0).map(|ms| ms as u64)
}

enum Args<'a> {
    Positional(&'a [&'a str]),
    Named(&'a Map<String, Value>),
}

impl Args<'_> {
    fn get(&self, name: &str, position: usize) -> Option<String> {
        let value = match self {
            Args::Positional(words) => words.get(position).map(|w| w.to_string()),
            Args::Named(options) => options.get(name).and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(if *b { "on".to_string() } else { "off".to_string() }),
                _ => None,
            }),
        };
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    fn required(&self, name: &str, position: usize, usage: &'static str) -> Result<String, CommandError> {
        self.get(name, position).ok_or(CommandError::Usage(usage))
    }

    /// Like `get`, but positional input joins every remaining word.
    fn rest(&self, name: &str, position: usize) -> Option<String> {
        match self {
            Args::Positional(words) => Some(words.get(position..)?.join(" ")).filter(|v| !v.is_empty()),
            Args::Named(_) => self.get(name, position),
        }
    }
}

/// File returned alongside a reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub name: String,
    pub content: String,
}

/// Answer to the caller of a command
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self { content: content.into(), attachment: None }
    }

    pub fn with_attachment(content: impl Into<String>, name: impl Into<String>, body: String) -> Self {
        Self { content: content.into(), attachment: Some(Attachment { name: name.into(), content: body }) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(input: &str) -> Result<Option<Command>, CommandError> {
        Command::parse_text("!", input)
    }

    #[test]
    fn test_parse_text_forms() {
        assert_eq!(text("!status").unwrap(), Some(Command::Status));
        assert_eq!(
            text("!status add https://example.com Example Site").unwrap(),
            Some(Command::Add { url: "https://example.com".into(), name: Some("Example Site".into()) })
        );
        assert_eq!(
            text("!add https://example.com").unwrap(),
            Some(Command::Add { url: "https://example.com".into(), name: None })
        );
        assert_eq!(text("!STATUS Remove mc").unwrap(), Some(Command::Remove { id: "mc".into() }));
        assert_eq!(text("!status interval 2500").unwrap(), Some(Command::Interval { ms: 2500 }));
        assert_eq!(text("!status maintenance on").unwrap(), Some(Command::Maintenance { on: true }));
        assert_eq!(text("!rmadmin 42").unwrap(), Some(Command::RemoveAdmin { id: "42".into() }));
    }

    #[test]
    fn test_parse_text_ignores_foreign_messages() {
        assert_eq!(text("hello there").unwrap(), None);
        assert_eq!(text("!").unwrap(), None);
        assert_eq!(text("!play some music").unwrap(), None);
    }

    #[test]
    fn test_parse_text_errors() {
        assert!(matches!(text("!status add"), Err(CommandError::Usage(_))));
        assert!(matches!(text("!status interval soon"), Err(CommandError::InvalidArgument(_))));
        assert!(matches!(text("!status maintenance maybe"), Err(CommandError::Usage(_))));
        assert!(matches!(text("!status frobnicate"), Err(CommandError::UnknownCommand(_))));
    }

    #[test]
    fn test_structured_form_matches_text_form() {
        let options = json!({ "url": "https://example.com", "name": "Example Site" });
        let structured = Command::from_structured("add", options.as_object().unwrap()).unwrap();
        assert_eq!(Some(structured), text("!status add https://example.com Example Site").unwrap());

        let options = json!({ "ms": 1500.0 });
        assert_eq!(
            Command::from_structured("interval", options.as_object().unwrap()).unwrap(),
            Command::Interval { ms: 1500 }
        );
        assert_eq!(Command::from_structured("", &Map::new()).unwrap(), Command::Status);
        assert!(matches!(
            Command::from_structured("remove", &Map::new()),
            Err(CommandError::Usage("status remove <id>"))
        ));
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(Command::List.capability(), Capability::Anyone);
        assert_eq!(Command::Uptime.capability(), Capability::Anyone);
        assert_eq!(Command::Backup.capability(), Capability::Admin);
        assert_eq!(Command::RemoveAdmin { id: "1".into() }.capability(), Capability::Admin);
    }

    #[test]
    fn test_reply_serialization() {
        let plain = serde_json::to_value(Reply::text("hi")).unwrap();
        assert_eq!(plain, json!({ "content": "hi" }));

        let file = serde_json::to_value(Reply::with_attachment("Backup", "backup.json", "{}".into())).unwrap();
        assert_eq!(file["attachment"]["name"], "backup.json");
    }
}
