use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::domain::ports::{MailTransport, Notifier, OutboundEmail};

/// Enqueue side of the mail outbox.
///
/// `notify` never waits: when the queue is full or the worker is gone the
/// message is dropped and the loss is logged on the `workboard::mail` target.
#[derive(Clone)]
pub struct MailOutbox {
    tx: mpsc::Sender<OutboundEmail>,
}

impl MailOutbox {
    /// Spawn the delivery worker. Once `cancel` fires the worker stops taking
    /// new messages, delivers whatever is already queued and exits.
    pub fn start(
        transport: Arc<dyn MailTransport>,
        capacity: usize,
        send_timeout: Duration,
        cancel: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(transport, rx, send_timeout, cancel));
        (Self { tx }, handle)
    }
}

impl Notifier for MailOutbox {
    fn notify(&self, email: OutboundEmail) {
        match self.tx.try_send(email) {
            Ok(()) => debug!(target: "workboard::mail", "Email queued"),
            Err(mpsc::error::TrySendError::Full(email)) => error!(
                target: "workboard::mail",
                to = %email.to,
                subject = %email.subject,
                "Mail queue is full, email dropped"
            ),
            Err(mpsc::error::TrySendError::Closed(email)) => error!(
                target: "workboard::mail",
                to = %email.to,
                subject = %email.subject,
                "Mail worker has stopped, email dropped"
            ),
        }
    }
}

async fn run_worker(
    transport: Arc<dyn MailTransport>,
    mut rx: mpsc::Receiver<OutboundEmail>,
    send_timeout: Duration,
    cancel: CancellationToken,
) {
    info!(target: "workboard::mail", "Mail worker started");
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = rx.recv() => match next {
                Some(email) => deliver(transport.as_ref(), &email, send_timeout).await,
                None => {
                    info!(target: "workboard::mail", "Mail queue closed, worker exiting");
                    return;
                }
            },
        }
    }

    rx.close();
    let mut drained = 0usize;
    while let Some(email) = rx.recv().await {
        deliver(transport.as_ref(), &email, send_timeout).await;
        drained += 1;
    }
    info!(target: "workboard::mail", drained, "Mail worker stopped");
}

async fn deliver(transport: &dyn MailTransport, email: &OutboundEmail, send_timeout: Duration) {
    match tokio::time::timeout(send_timeout, transport.send(email)).await {
        Ok(Ok(())) => info!(
            target: "workboard::mail",
            to = %email.to,
            subject = %email.subject,
            "Email delivered"
        ),
        Ok(Err(e)) => error!(
            target: "workboard::mail",
            to = %email.to,
            subject = %email.subject,
            error = %format!("{e:#}"),
            "Email delivery failed"
        ),
        Err(_) => error!(
            target: "workboard::mail",
            to = %email.to,
            subject = %email.subject,
            timeout_ms = send_timeout.as_millis() as u64,
            "Email delivery timed out"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Recording {
        sent: Mutex<Vec<String>>,
        fail: bool,
        delay: Option<Duration>,
    }

    #[async_trait]
    impl MailTransport for Recording {
        async fn send(&self, email: &OutboundEmail) -> anyhow::Result<()> {
            if let Some(d) = self.delay {
                tokio::time::sleep(d).await;
            }
            if self.fail {
                anyhow::bail!("relay refused");
            }
            self.sent.lock().push(email.to.clone());
            Ok(())
        }
    }

    fn email(to: &str) -> OutboundEmail {
        OutboundEmail {
            to: to.into(),
            subject: "s".into(),
            html_body: "<p>b</p>".into(),
        }
    }

    #[tokio::test]
    async fn delivers_and_drains_on_cancel() {
        let transport = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let (outbox, handle) =
            MailOutbox::start(transport.clone(), 8, Duration::from_secs(1), cancel.clone());

        outbox.notify(email("a@x.com"));
        outbox.notify(email("b@x.com"));
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(*transport.sent.lock(), vec!["a@x.com", "b@x.com"]);
    }

    #[tokio::test]
    async fn failures_and_timeouts_do_not_stop_the_worker() {
        let failing = Arc::new(Recording {
            fail: true,
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let (outbox, handle) =
            MailOutbox::start(failing.clone(), 8, Duration::from_secs(1), cancel.clone());
        outbox.notify(email("a@x.com"));
        outbox.notify(email("b@x.com"));
        cancel.cancel();
        handle.await.unwrap();
        assert!(failing.sent.lock().is_empty());

        let slow = Arc::new(Recording {
            delay: Some(Duration::from_millis(200)),
            ..Default::default()
        });
        let cancel = CancellationToken::new();
        let (outbox, handle) =
            MailOutbox::start(slow.clone(), 8, Duration::from_millis(20), cancel.clone());
        outbox.notify(email("c@x.com"));
        cancel.cancel();
        handle.await.unwrap();
        assert!(slow.sent.lock().is_empty());
    }

    #[tokio::test]
    async fn notify_after_shutdown_is_dropped_without_panicking() {
        let transport = Arc::new(Recording::default());
        let cancel = CancellationToken::new();
        let (outbox, handle) =
            MailOutbox::start(transport.clone(), 1, Duration::from_secs(1), cancel.clone());
        cancel.cancel();
        handle.await.unwrap();

        outbox.notify(email("late@x.com"));
        assert!(transport.sent.lock().is_empty());
    }
}
