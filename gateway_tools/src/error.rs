use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Could not initialize gateway client: {0}")]
    Initialization(String),
    #[error("No signing secret is configured for merchant {0}")]
    Configuration(i64),
    #[error("Could not reach the gateway: {0}")]
    Network(String),
    #[error("Gateway request failed. HTTP {status}. {snippet}")]
    Transport { status: u16, snippet: String },
    #[error("Gateway rejected the request. Code {code}. {message}")]
    Business { code: i64, message: String },
    #[error("Could not deserialize gateway response: {0}")]
    Json(String),
}

impl GatewayError {
    /// True when a business error means "the queried order does not exist upstream".
    ///
    /// Best-effort heuristic: the upstream service has no versioned error-code contract, so this
    /// matches the observed code (404) and known message phrasings, including the upstream's
    /// Chinese wording. A wording change upstream degrades detection to a generic failure, never
    /// to a false positive being cached.
    pub fn is_order_not_found(&self) -> bool {
        match self {
            Self::Business { code: 404, .. } => true,
            Self::Business { message, .. } => {
                let m = message.to_lowercase();
                m.contains("not found") || m.contains("not exist") || m.contains("不存在")
            },
            _ => false,
        }
    }
}
