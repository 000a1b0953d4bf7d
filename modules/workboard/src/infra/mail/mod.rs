//! Outbound email: a bounded in-process outbox drained by one worker task,
//! delivering through SMTP or, when delivery is disabled, the log.

mod log;
mod outbox;
mod smtp;

pub use log::LogMailTransport;
pub use outbox::MailOutbox;
pub use smtp::SmtpMailTransport;
