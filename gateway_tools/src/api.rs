use std::{collections::BTreeMap, sync::Arc};

use log::*;
use mpg_common::{truncate_snippet, unix_timestamp};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::GatewayConfig,
    decode::{decode_order, decode_order_list},
    signing::sign,
    GatewayError,
    OrderRecord,
};

/// Maximum number of body bytes carried in a [`GatewayError::Transport`] snippet.
const MAX_SNIPPET_BYTES: usize = 256;

/// The `{code, message, data}` wrapper around every gateway response. `code == 0` is success;
/// anything else is a business error whose `message` is surfaced verbatim in logs.
#[derive(Debug, Deserialize)]
pub struct GatewayEnvelope {
    pub code: i64,
    #[serde(default, alias = "msg")]
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// Client for the merchant payment gateway's signed, form-encoded HTTP API.
///
/// The underlying `reqwest::Client` is shared (connection pooling) and the HTTP timeout from
/// [`GatewayConfig`] applies to every call. The client performs no retries; retry policy, if
/// any, belongs to the caller.
#[derive(Debug, Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Send one signed POST to `<base_url>/<action>` and unwrap the response envelope.
    ///
    /// Credential resolution happens first: if no usable signing secret exists for
    /// `merchant_id`, the call fails with [`GatewayError::Configuration`] before any network
    /// I/O. On success the raw `data` value is returned for endpoint-specific decoding.
    pub async fn post(
        &self,
        action: &str,
        merchant_id: i64,
        business_params: &[(&str, String)],
    ) -> Result<Value, GatewayError> {
        let creds = self.config.credentials_for(merchant_id).ok_or(GatewayError::Configuration(merchant_id))?;
        let mut form =
            business_params.iter().map(|(k, v)| (k.to_string(), v.clone())).collect::<BTreeMap<String, String>>();
        form.insert("merchant_id".to_string(), merchant_id.to_string());
        form.insert("timestamp".to_string(), unix_timestamp().to_string());
        if let Some(access_key) = creds.access_key {
            form.insert("access_key".to_string(), access_key);
        }
        let signature = sign(&form, creds.secret.reveal());
        form.insert("sign".to_string(), signature);

        let url = self.url(action);
        trace!("Sending gateway request to {url} for merchant #{merchant_id}");
        let response = self.client.post(&url).form(&form).send().await.map_err(|e| {
            warn!("Gateway request to {url} failed before a response arrived: {e}");
            GatewayError::Network(e.to_string())
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet = truncate_snippet(&body, MAX_SNIPPET_BYTES);
            return Err(GatewayError::Transport { status: status.as_u16(), snippet });
        }
        let envelope = response.json::<GatewayEnvelope>().await.map_err(|e| GatewayError::Json(e.to_string()))?;
        trace!("Gateway response from {action}: code {}", envelope.code);
        if envelope.code != 0 {
            return Err(GatewayError::Business { code: envelope.code, message: envelope.message });
        }
        Ok(envelope.data)
    }

    /// Look up a single order by its merchant order number. `Ok(None)` means the gateway
    /// answered successfully but the payload held no recognizable order data.
    pub async fn query_order(&self, merchant_id: i64, order_no: &str) -> Result<Option<OrderRecord>, GatewayError> {
        debug!("Querying order {order_no} for merchant #{merchant_id}");
        let data = self.post("order/query", merchant_id, &[("merchant_order_no", order_no.to_string())]).await?;
        Ok(decode_order(&data))
    }

    /// Query a list-shaped endpoint, e.g. recent orders for a merchant.
    pub async fn query_orders(
        &self,
        merchant_id: i64,
        params: &[(&str, String)],
    ) -> Result<Vec<OrderRecord>, GatewayError> {
        let data = self.post("order/list", merchant_id, params).await?;
        let records = decode_order_list(&data);
        debug!("Gateway returned {} decodable orders for merchant #{merchant_id}", records.len());
        Ok(records)
    }

    fn url(&self, action: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), action.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use super::*;

    fn unreachable_config() -> GatewayConfig {
        GatewayConfig {
            base_url: "http://127.0.0.1:1/api".to_string(),
            timeout: Duration::from_secs(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_secret_fails_before_any_network_call() {
        let _ = env_logger::builder().is_test(true).try_init();
        // No master key, no merchant map, no default secret: the call must fail during
        // credential resolution, not with a network error against the dead endpoint.
        let api = GatewayApi::new(unreachable_config()).unwrap();
        let err = api.post("order/query", 42, &[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::Configuration(42)), "got {err:?}");
    }

    #[test]
    fn envelope_tolerates_msg_alias_and_missing_data() {
        let e: GatewayEnvelope = serde_json::from_str(r#"{"code": 0, "msg": "ok"}"#).unwrap();
        assert_eq!(e.code, 0);
        assert_eq!(e.message, "ok");
        assert!(e.data.is_null());

        let e: GatewayEnvelope = serde_json::from_str(r#"{"code": 404, "message": "order not found"}"#).unwrap();
        assert_eq!(e.code, 404);
        assert_eq!(e.message, "order not found");
    }

    #[test]
    fn url_joining_handles_slashes() {
        let mut config = unreachable_config();
        config.base_url = "https://gw.example.com/api/".to_string();
        config.default_secret = Some("k".into());
        let api = GatewayApi::new(config).unwrap();
        assert_eq!(api.url("/order/query"), "https://gw.example.com/api/order/query");
        assert_eq!(api.url("order/query"), "https://gw.example.com/api/order/query");
    }
}
