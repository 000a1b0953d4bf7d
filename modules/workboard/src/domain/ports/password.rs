use async_trait::async_trait;

/// Password hashing port. Implementations must be safe to call from the
/// async executor.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> anyhow::Result<String>;
    /// `Ok(false)` for a mismatch; `Err` only for an unreadable hash.
    async fn verify(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}
