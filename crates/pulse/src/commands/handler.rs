use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use super::{Capability, Command, Reply};
use crate::engine::{Engine, MIN_CHECK_INTERVAL};
use crate::error::CommandError;
use crate::monitoring::Target;
use crate::presenter::format_elapsed;
use crate::validation::validate_http_endpoint;

/// Characters of log returned by `status logs`.
const LOG_TAIL_CHARS: usize = 8000;

impl Engine {
    /// Parse and run a prefixed free-text command. `None` when the text is
    /// not a command for us.
    pub async fn handle_text(self: &Arc<Self>, caller: &str, text: &str) -> Option<Reply> {
        match Command::parse_text(&self.settings.command_prefix, text) {
            Ok(Some(command)) => Some(self.handle(caller, command).await),
            Ok(None) => None,
            Err(e) => Some(Reply::text(e.to_string())),
        }
    }

    /// Run `command` on behalf of `caller`. Failures become text replies.
    pub async fn handle(self: &Arc<Self>, caller: &str, command: Command) -> Reply {
        let name = command.name();
        match self.execute(caller, command).await {
            Ok(reply) => reply,
            Err(CommandError::Persistence(e)) => {
                error!(command = name, error = %e, "Command failed");
                Reply::text(format!("Error: {e}"))
            }
            Err(e) => {
                info!(command = name, caller, error = %e, "Command rejected");
                Reply::text(e.to_string())
            }
        }
    }

    async fn execute(self: &Arc<Self>, caller: &str, command: Command) -> Result<Reply, CommandError> {
        if command.capability() == Capability::Admin && !self.is_admin(caller).await {
            return Err(CommandError::Unauthorized);
        }

        match command {
            Command::Status => Ok(Reply::text(self.snapshot().await.quick_status())),
            Command::Add { url, name } => self.add_target(&url, name.as_deref()).await,
            Command::Remove { id } => self.remove_target(&id).await,
            Command::List => Ok(self.list_targets().await),
            Command::Test { url } => self.test_url(&url).await,
            Command::Refresh => {
                let report = self.run_cycle().await;
                info!(caller, probed = report.probed, "Manual refresh");
                Ok(Reply::text("Refreshed."))
            }
            Command::Reload => {
                self.reload().await?;
                Ok(Reply::text("Reloaded config."))
            }
            Command::Interval { ms } => {
                let period = Duration::from_millis(ms);
                if period < MIN_CHECK_INTERVAL {
                    return Err(CommandError::InvalidArgument("Interval too small".to_string()));
                }
                self.set_check_interval(period);
                Ok(Reply::text(format!("Set interval to {ms}ms")))
            }
            Command::Maintenance { on } => {
                self.set_maintenance(on);
                let mode = if on { "on" } else { "off" };
                info!(caller, mode, "Maintenance mode changed");
                Ok(Reply::text(format!("Maintenance set to {mode}")))
            }
            Command::AddAdmin { id } => {
                let added = self.admins.lock().await.add(&id);
                if !added {
                    return Ok(Reply::text("Already admin or failed."));
                }
                self.persist_admins().await;
                Ok(Reply::text(format!("✅ Added admin {id}")))
            }
            Command::RemoveAdmin { id } => {
                let removed = self.admins.lock().await.remove(&id);
                if !removed {
                    return Ok(Reply::text("Failed (cannot remove main or not found)."));
                }
                self.persist_admins().await;
                Ok(Reply::text(format!("🗑️ Removed admin {id}")))
            }
            Command::Admins => {
                let admins = self.admins.lock().await.admins().join(", ");
                Ok(Reply::text(format!("Admins: {admins}")))
            }
            Command::Logs => self.recent_logs().await,
            Command::Export => {
                let json = self.export_json().await.map_err(serialization_error)?;
                Ok(Reply::with_attachment("Config export (attached)", "sites-export.json", json))
            }
            Command::Backup => {
                let json = self.backup_json().await.map_err(serialization_error)?;
                Ok(Reply::with_attachment("Backup (attached)", "backup.json", json))
            }
            Command::Uptime => {
                Ok(Reply::text(format!("Bot uptime: {}", format_elapsed(self.started_at.elapsed()))))
            }
        }
    }

    async fn add_target(self: &Arc<Self>, url: &str, name: Option<&str>) -> Result<Reply, CommandError> {
        validate_http_endpoint(url).into_result()?;

        let target = self.sites.lock().await.sites.add(url, name);
        self.state.lock().await.sites.ensure(&target.id);
        self.persist_sites().await;
        self.persist_state().await;
        info!(site = %target.id, url, "Target added");

        // Probe the new target soon instead of waiting a full period.
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(engine.settings.add_refresh_delay).await;
            engine.run_cycle().await;
        });

        Ok(Reply::text(format!("✅ Added {} (id: {})", target.name, target.id)))
    }

    async fn remove_target(&self, id: &str) -> Result<Reply, CommandError> {
        let removed = self.sites.lock().await.sites.remove(id);
        let Some(target) = removed else {
            return Err(CommandError::NotFound(id.to_string()));
        };

        {
            let mut state = self.state.lock().await;
            state.sites.remove(id);
            state.alerts.remove(id);
        }
        self.scheduler.forget(id);
        self.persist_sites().await;
        self.persist_state().await;
        info!(site = %id, "Target removed");

        Ok(Reply::text(format!("🗑️ Removed {}", target.name)))
    }

    async fn list_targets(&self) -> Reply {
        let targets = self.targets().await;
        if targets.is_empty() {
            return Reply::text("No sites are being monitored.");
        }
        let lines: Vec<String> =
            targets.iter().map(|t| format!("`{}` • **{}** — {}", t.id, t.name, t.url)).collect();
        Reply::text(format!("📋 Monitored sites:\n{}", lines.join("\n")))
    }

    async fn test_url(&self, url: &str) -> Result<Reply, CommandError> {
        validate_http_endpoint(url).into_result()?;

        let target = Target::http("adhoc", url, url);
        let outcome = self
            .checker
            .check(&target)
            .await
            .map_err(|e| CommandError::InvalidArgument(format!("Probe failed: {e}")))?;

        Ok(Reply::text(outcome.describe()))
    }

    async fn recent_logs(&self) -> Result<Reply, CommandError> {
        let Some(path) = &self.settings.log_file else {
            return Ok(Reply::text("No logs"));
        };

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Reply::text("No logs")),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read log file");
                return Err(CommandError::InvalidArgument(format!("Cannot read logs: {e}")));
            }
        };

        Ok(Reply::text(format!("Recent logs (truncated):\n```\n{}\n```", tail(&content, LOG_TAIL_CHARS))))
    }
}

fn serialization_error(e: serde_json::Error) -> CommandError {
    CommandError::InvalidArgument(format!("Serialization failed: {e}"))
}

/// Last `max_chars` characters of `text`.
fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let start = text.char_indices().nth(count - max_chars).map_or(0, |(i, _)| i);
    &text[start..]
}
