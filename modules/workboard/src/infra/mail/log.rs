use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{MailTransport, OutboundEmail};

/// Writes messages to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogMailTransport;

#[async_trait]
impl MailTransport for LogMailTransport {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
        info!(
            target: "workboard::mail",
            to = %email.to,
            subject = %email.subject,
            body_len = email.html_body.len(),
            "Mail delivery disabled, message not sent"
        );
        Ok(())
    }
}
