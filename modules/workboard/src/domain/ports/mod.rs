pub mod mail;
pub mod password;

pub use mail::{MailTransport, Notifier, OutboundEmail};
pub use password::PasswordHasher;
