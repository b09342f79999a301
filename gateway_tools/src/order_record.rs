use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single order as reported by the gateway.
///
/// Every logical field is optional because upstream deployments disagree on which fields they
/// return; a record is only ever built by the decoder, and only when at least one meaningful
/// field was present. Once built it is immutable. Keys the decoder does not recognize are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub merchant_order_no: Option<String>,
    pub platform_order_no: Option<String>,
    pub amount: Option<String>,
    pub real_amount: Option<String>,
    pub status: Option<i64>,
    pub status_text: Option<String>,
    pub notify_status: Option<i64>,
    pub notify_text: Option<String>,
    pub channel: Option<String>,
    pub created_at: Option<String>,
    pub paid_at: Option<String>,
    pub completed_at: Option<String>,
    pub expired_at: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, Value>,
}

impl OrderRecord {
    /// True when no meaningful field was decoded. Such a value is noise and must be discarded
    /// rather than surfaced as an all-empty order.
    pub fn is_empty(&self) -> bool {
        self.merchant_order_no.is_none() &&
            self.platform_order_no.is_none() &&
            self.amount.is_none() &&
            self.real_amount.is_none() &&
            self.status.is_none() &&
            self.status_text.is_none() &&
            self.notify_status.is_none() &&
            self.channel.is_none() &&
            self.paid_at.is_none()
    }

    /// One-line summary of the fields a chat user cares about. Fields that were absent upstream
    /// are simply omitted.
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(6);
        if let Some(no) = &self.merchant_order_no {
            parts.push(format!("order {no}"));
        }
        if let Some(no) = &self.platform_order_no {
            parts.push(format!("platform {no}"));
        }
        if let Some(amount) = &self.amount {
            parts.push(format!("amount {amount}"));
        }
        if let Some(real) = &self.real_amount {
            parts.push(format!("settled {real}"));
        }
        match (&self.status_text, self.status) {
            (Some(text), _) => parts.push(format!("status {text}")),
            (None, Some(code)) => parts.push(format!("status #{code}")),
            (None, None) => {},
        }
        if let Some(paid) = &self.paid_at {
            parts.push(format!("paid at {paid}"));
        }
        parts.join(", ")
    }
}
