use gateway_tools::{GatewayApi, GatewayError, OrderRecord};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    #[error("Free-text extraction failed: {0}")]
    Failed(String),
    #[error("Free-text extraction service is unavailable: {0}")]
    Unavailable(String),
}

/// The order-lookup backend the orchestrator dispatches against. Implemented by
/// [`GatewayApi`] in production and by in-memory fakes in tests.
#[allow(async_fn_in_trait)]
pub trait OrderLookup {
    /// Look up one order by its merchant order number. `Ok(None)` means the gateway answered
    /// successfully but returned no recognizable order data.
    async fn query_order(&self, merchant_id: i64, order_no: &str) -> Result<Option<OrderRecord>, GatewayError>;
}

impl OrderLookup for GatewayApi {
    async fn query_order(&self, merchant_id: i64, order_no: &str) -> Result<Option<OrderRecord>, GatewayError> {
        GatewayApi::query_order(self, merchant_id, order_no).await
    }
}

/// The AI-based free-text extraction collaborator. Its output is merged into, never substituted
/// for, the pattern-matched candidates; its failures are logged and ignored.
#[allow(async_fn_in_trait)]
pub trait FreeTextExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<String>, ExtractError>;
}

/// No-op extractor used when no AI collaborator is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtractor;

impl FreeTextExtractor for NoExtractor {
    async fn extract(&self, _text: &str) -> Result<Vec<String>, ExtractError> {
        Ok(Vec::new())
    }
}
