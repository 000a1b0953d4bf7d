use async_trait::async_trait;

/// A transactional email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Output port: hand a message to the delivery side channel.
///
/// Must not block and must not fail the caller; delivery problems are the
/// implementation's to report.
pub trait Notifier: Send + Sync {
    fn notify(&self, email: OutboundEmail);
}

/// Delivery port used by the outbox worker.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()>;
}
