use serde::{Deserialize, Serialize};

/// HTTP host configuration, read from `modules.api_ingress`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    /// Generate and propagate `x-request-id`.
    #[serde(default = "default_true")]
    pub request_id_header: bool,
    #[serde(default)]
    pub cors_enabled: bool,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            request_id_header: true,
            cors_enabled: false,
        }
    }
}

fn default_true() -> bool {
    true
}
