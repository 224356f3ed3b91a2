//! Outbound mail capability.
//!
//! Delivery itself is somebody else's problem; the signup flow only needs to
//! know whether handing the message off succeeded.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the message could not be handed off.
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}

/// Writes messages to the log instead of talking to an MTA.
pub struct LogMailer {
    from: String,
    enabled: bool,
}

impl LogMailer {
    #[must_use]
    pub fn new(config: &MailConfig) -> Self {
        Self {
            from: config.from_address.clone(),
            enabled: config.enabled,
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        if !self.enabled {
            debug!(to = %message.to, subject = %message.subject, "Mail disabled, dropping message");
            return Ok(());
        }

        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "Outgoing mail"
        );
        Ok(())
    }
}
