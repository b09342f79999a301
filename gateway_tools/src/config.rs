use std::{collections::HashMap, env, time::Duration};

use log::*;
use mpg_common::Secret;

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Gateway connection and signing configuration, read from `MPG_GATEWAY_*` environment variables.
///
/// Two credential strategies exist and exactly one is active at a time:
/// - **Master mode**: `access_key` + `master_secret` are both set. Every request is signed with
///   the master secret and carries the access key as an extra parameter. This takes precedence
///   over the per-merchant map even when both are configured.
/// - **Per-merchant mode**: `merchant_secrets` maps merchant ids to their own signing secrets,
///   with `default_secret` as an optional fallback for unknown merchants.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub base_url: String,
    pub access_key: Option<String>,
    pub master_secret: Option<Secret<String>>,
    pub merchant_secrets: HashMap<i64, Secret<String>>,
    pub default_secret: Option<Secret<String>>,
    pub timeout: Duration,
}

/// The resolved signing material for a single request.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub secret: Secret<String>,
    /// Present only in master mode; sent as the `access_key` parameter.
    pub access_key: Option<String>,
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let base_url = env::var("MPG_GATEWAY_BASE_URL").unwrap_or_else(|_| {
            warn!("MPG_GATEWAY_BASE_URL not set, using (probably useless) default");
            "https://gateway.example.com/api".to_string()
        });
        let access_key = env::var("MPG_GATEWAY_ACCESS_KEY").ok().filter(|s| !s.trim().is_empty());
        let master_secret = env::var("MPG_GATEWAY_MASTER_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Secret::from);
        let merchant_secrets = env::var("MPG_GATEWAY_MERCHANT_SECRETS")
            .map(|s| parse_merchant_secrets(&s))
            .unwrap_or_default();
        let default_secret = env::var("MPG_GATEWAY_DEFAULT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(Secret::from);
        let timeout = env::var("MPG_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid MPG_GATEWAY_TIMEOUT_SECS ({s}): {e}. Using default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if access_key.is_some() != master_secret.is_some() {
            warn!(
                "Only one of MPG_GATEWAY_ACCESS_KEY / MPG_GATEWAY_MASTER_SECRET is set. Master mode requires both, so \
                 per-merchant secrets will be used instead."
            );
        }
        Self { base_url, access_key, master_secret, merchant_secrets, default_secret, timeout }
    }

    /// Resolve the signing material for `merchant_id`, or `None` when no usable secret is
    /// configured. Resolution order: master key pair, then the per-merchant map, then the
    /// default fallback secret.
    pub fn credentials_for(&self, merchant_id: i64) -> Option<SigningCredentials> {
        if let (Some(key), Some(secret)) = (&self.access_key, &self.master_secret) {
            if !secret.is_unset() {
                return Some(SigningCredentials { secret: secret.clone(), access_key: Some(key.clone()) });
            }
        }
        self.merchant_secrets
            .get(&merchant_id)
            .or(self.default_secret.as_ref())
            .filter(|s| !s.is_unset())
            .map(|s| SigningCredentials { secret: s.clone(), access_key: None })
    }
}

fn parse_merchant_secrets(raw: &str) -> HashMap<i64, Secret<String>> {
    raw.split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| {
            let (id, secret) = entry.split_once(':')?;
            match id.trim().parse::<i64>() {
                Ok(id) if !secret.trim().is_empty() => Some((id, Secret::from(secret.trim()))),
                Ok(id) => {
                    warn!("Ignoring empty secret for merchant {id} in MPG_GATEWAY_MERCHANT_SECRETS");
                    None
                },
                Err(e) => {
                    warn!("Ignoring invalid merchant id ({id}) in MPG_GATEWAY_MERCHANT_SECRETS: {e}");
                    None
                },
            }
        })
        .collect()
}
