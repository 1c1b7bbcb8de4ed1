//! Outbound messaging boundary.

pub mod discord;

pub use discord::DiscordNotifier;

use async_trait::async_trait;

use crate::alerts::AlertNotice;
use crate::error::NotifierError;
use crate::presenter::Snapshot;

/// Opaque id of a posted message, kept to edit it later.
pub type MessageHandle = String;

/// Delivers summaries and alerts to the chat destination
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Post a new summary message.
    async fn send_summary(&self, snapshot: &Snapshot) -> Result<MessageHandle, NotifierError>;

    /// Replace the content of a previously posted summary.
    async fn edit_summary(&self, handle: &str, snapshot: &Snapshot) -> Result<(), NotifierError>;

    /// Post a down alert.
    async fn post_alert(&self, alert: &AlertNotice) -> Result<(), NotifierError>;
}
