use serde::{Deserialize, Serialize};

/// Configuration for the workboard module (`modules.workboard`).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct WorkboardConfig {
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC key. Must be set before the server accepts logins.
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_expiration_days")]
    pub expiration_days: i64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            audience: default_audience(),
            expiration_days: default_expiration_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailConfig {
    /// When false, outgoing messages are written to the log instead.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: String::new(),
            port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: default_from(),
            timeout_secs: default_timeout_secs(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl WorkboardConfig {
    /// Problems that prevent serving requests.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.jwt.secret.trim().is_empty() {
            problems.push("modules.workboard.jwt.secret is not set".to_string());
        }
        if self.jwt.expiration_days <= 0 {
            problems.push("modules.workboard.jwt.expiration_days must be positive".to_string());
        }
        if self.mail.enabled && self.mail.host.trim().is_empty() {
            problems.push("modules.workboard.mail.host is required when mail is enabled".to_string());
        }
        if self.mail.queue_capacity == 0 {
            problems.push("modules.workboard.mail.queue_capacity must be positive".to_string());
        }
        problems
    }
}

fn default_issuer() -> String {
    "taskhub".to_string()
}

fn default_audience() -> String {
    "taskhub-clients".to_string()
}

fn default_expiration_days() -> i64 {
    7
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from() -> String {
    "noreply@taskhub.local".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_queue_capacity() -> usize {
    256
}
