use std::{env, sync::Arc, time::Duration};

use futures::{stream, StreamExt};
use log::*;
use tokio::time::timeout;

use crate::{
    cache::{CacheEntry, LookupCache, DEFAULT_MAX_ENTRIES},
    extract::{candidate_fragments, extract_candidates, merge_candidates, IncomingMessage, LookupCandidate},
    report::{CandidateResult, LookupFailure, LookupOutcome},
    traits::{FreeTextExtractor, NoExtractor, OrderLookup},
};

const DEFAULT_MAX_CANDIDATES: usize = 3;
const DEFAULT_SUCCESS_QUOTA: usize = 3;
const DEFAULT_CONCURRENCY: usize = 2;
const DEFAULT_CALL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct AutoLookupConfig {
    /// At most this many distinct candidates are looked up per message.
    pub max_candidates_per_message: usize,
    /// Stop once this many candidates have resolved (found or confirmed absent).
    pub success_quota: usize,
    /// Maximum lookups in flight for one message. `<= 1` means strictly serial.
    pub concurrency: usize,
    /// Deadline for a single gateway call. A timed-out candidate fails without being cached.
    pub call_timeout: Duration,
    /// Deadline for the free-text extraction collaborator, independent of lookup timeouts.
    pub extract_timeout: Duration,
    /// Capacity bound for the result cache (0 = unbounded).
    pub cache_max_entries: usize,
}

impl Default for AutoLookupConfig {
    fn default() -> Self {
        Self {
            max_candidates_per_message: DEFAULT_MAX_CANDIDATES,
            success_quota: DEFAULT_SUCCESS_QUOTA,
            concurrency: DEFAULT_CONCURRENCY,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            extract_timeout: Duration::from_secs(DEFAULT_EXTRACT_TIMEOUT_SECS),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl AutoLookupConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        Self {
            max_candidates_per_message: env_usize("MPG_LOOKUP_MAX_CANDIDATES", defaults.max_candidates_per_message),
            success_quota: env_usize("MPG_LOOKUP_SUCCESS_QUOTA", defaults.success_quota),
            concurrency: env_usize("MPG_LOOKUP_CONCURRENCY", defaults.concurrency),
            call_timeout: Duration::from_secs(env_u64(
                "MPG_LOOKUP_CALL_TIMEOUT_SECS",
                DEFAULT_CALL_TIMEOUT_SECS,
            )),
            extract_timeout: Duration::from_secs(env_u64(
                "MPG_LOOKUP_EXTRACT_TIMEOUT_SECS",
                DEFAULT_EXTRACT_TIMEOUT_SECS,
            )),
            cache_max_entries: env_usize("MPG_LOOKUP_CACHE_MAX_ENTRIES", defaults.cache_max_entries),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(s) => s.parse::<u64>().unwrap_or_else(|e| {
            warn!("Invalid value for {name} ({s}): {e}. Using the default, {default}.");
            default
        }),
        Err(_) => default,
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env_u64(name, default as u64) as usize
}

/// The per-message auto-lookup orchestrator.
///
/// Owns the result cache and dispatches candidate lookups against the gateway seam `G`, with an
/// optional AI free-text extractor `X`. For each message: extract candidates, dedupe and cap,
/// resolve each candidate (cache first, gateway on miss) under the concurrency bound and
/// per-call deadline, and stop early once the success quota is reached. Results always come back
/// in candidate-extraction order, never completion order.
pub struct AutoLookup<G, X = NoExtractor> {
    gateway: G,
    cache: Arc<LookupCache>,
    extractor: Option<X>,
    config: AutoLookupConfig,
}

impl<G> AutoLookup<G, NoExtractor> {
    pub fn new(gateway: G, config: AutoLookupConfig) -> Self {
        let cache = Arc::new(LookupCache::new(config.cache_max_entries));
        Self { gateway, cache, extractor: None, config }
    }
}

impl<G, X> AutoLookup<G, X> {
    /// Wire in the AI free-text extraction collaborator.
    pub fn with_extractor<Y: FreeTextExtractor>(self, extractor: Y) -> AutoLookup<G, Y> {
        AutoLookup { gateway: self.gateway, cache: self.cache, extractor: Some(extractor), config: self.config }
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    pub fn config(&self) -> &AutoLookupConfig {
        &self.config
    }
}

impl<G, X> AutoLookup<G, X>
where
    G: OrderLookup,
    X: FreeTextExtractor,
{
    /// Run the full auto-lookup pipeline for one incoming message.
    ///
    /// Returns one entry per attempted candidate, in extraction order. An empty vec means
    /// nothing should be said in the chat: lookups disabled, or no valid candidate found.
    /// Failures are isolated per candidate; one bad lookup never aborts its siblings.
    pub async fn process_message(&self, msg: &IncomingMessage) -> Vec<CandidateResult> {
        if !msg.auto_lookup_enabled {
            return Vec::new();
        }
        let candidates = self.gather_candidates(msg).await;
        if candidates.is_empty() {
            trace!("No order-number candidates in message from chat {}", msg.chat_id);
            return Vec::new();
        }
        let capped = candidates
            .into_iter()
            .take(self.config.max_candidates_per_message.max(1))
            .collect::<Vec<LookupCandidate>>();
        debug!("Resolving {} candidate(s) for merchant #{} in chat {}", capped.len(), msg.merchant_id, msg.chat_id);

        // `buffered` gives bounded fan-out with positional ordering: up to `limit` lookups run
        // concurrently, results arrive in candidate order, and dropping the stream cancels
        // everything still in flight. Futures past the buffer are never polled, so work that
        // has not started when the quota is reached never runs at all.
        let limit = if capped.len() <= 1 { 1 } else { self.config.concurrency.max(1) };
        let quota = self.config.success_quota.max(1);
        let lookups = capped.into_iter().map(|candidate| {
            let merchant_id = msg.merchant_id;
            async move {
                let outcome = self.resolve(merchant_id, &candidate.normalized).await;
                CandidateResult { candidate, outcome }
            }
        });
        let mut in_order = stream::iter(lookups).buffered(limit);
        let mut results = Vec::new();
        let mut resolved = 0usize;
        while let Some(result) = in_order.next().await {
            if result.outcome.is_resolved() {
                resolved += 1;
            }
            results.push(result);
            if resolved >= quota {
                debug!("Success quota of {quota} reached, abandoning outstanding lookups");
                break;
            }
        }
        results
    }

    /// Resolve one candidate: cache hit (record or absent-sentinel) short-circuits the network
    /// call; otherwise one gateway call under the per-call deadline. Only definitive answers
    /// are cached: a found record or a confirmed "order does not exist". Timeouts and other
    /// failures leave the cache untouched so a later message can retry.
    async fn resolve(&self, merchant_id: i64, order_no: &str) -> LookupOutcome {
        if let Some(entry) = self.cache.get(merchant_id, order_no) {
            trace!("Cache hit for merchant #{merchant_id} order {order_no}");
            return match entry {
                CacheEntry::Found(record) => LookupOutcome::Found(record),
                CacheEntry::ConfirmedAbsent => LookupOutcome::NotFound,
            };
        }
        match timeout(self.config.call_timeout, self.gateway.query_order(merchant_id, order_no)).await {
            Err(_) => {
                warn!(
                    "Lookup of order {order_no} for merchant #{merchant_id} timed out after {:?}",
                    self.config.call_timeout
                );
                LookupOutcome::Failed(LookupFailure::Timeout)
            },
            Ok(Ok(Some(record))) => {
                self.cache.insert(merchant_id, order_no, CacheEntry::Found(record.clone()));
                LookupOutcome::Found(record)
            },
            Ok(Ok(None)) => {
                // Well-formed response with no recognizable order data: the order is absent.
                self.cache.insert(merchant_id, order_no, CacheEntry::ConfirmedAbsent);
                LookupOutcome::NotFound
            },
            Ok(Err(e)) if e.is_order_not_found() => {
                self.cache.insert(merchant_id, order_no, CacheEntry::ConfirmedAbsent);
                LookupOutcome::NotFound
            },
            Ok(Err(e)) => {
                warn!("Lookup of order {order_no} for merchant #{merchant_id} failed: {e}");
                LookupOutcome::Failed(LookupFailure::Gateway(e.to_string()))
            },
        }
    }

    async fn gather_candidates(&self, msg: &IncomingMessage) -> Vec<LookupCandidate> {
        let fragments = candidate_fragments(msg);
        let mut candidates = extract_candidates(fragments.iter().map(String::as_str));
        if let Some(extractor) = &self.extractor {
            let joined = fragments.join("\n");
            if !joined.trim().is_empty() {
                match timeout(self.config.extract_timeout, extractor.extract(&joined)).await {
                    Ok(Ok(extra)) => candidates = merge_candidates(candidates, extra),
                    Ok(Err(e)) => warn!("Free-text extractor failed, continuing with pattern matches only: {e}"),
                    Err(_) => {
                        warn!("Free-text extractor timed out after {:?}, continuing without it", self.config.extract_timeout)
                    },
                }
            }
        }
        candidates
    }
}
