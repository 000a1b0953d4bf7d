use serde::{Deserialize, Serialize};

const DEFAULT_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// HTTP host settings (`modules.api_ingress`). Bind address and handler
/// timeout come from the global `server` section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    #[serde(default)]
    pub cors_enabled: bool,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            cors_enabled: false,
            body_limit_bytes: DEFAULT_BODY_LIMIT,
        }
    }
}

fn default_body_limit() -> usize {
    DEFAULT_BODY_LIMIT
}
