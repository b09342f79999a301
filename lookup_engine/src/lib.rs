//! The auto-lookup engine for the MPG chat integration.
//!
//! Given an incoming chat message (text, caption, attachment filenames) and the merchant bound to
//! the chat, the engine extracts normalized order-number candidates, resolves them against the
//! payment gateway under a concurrency bound, a per-call deadline and a success quota, and
//! assembles per-candidate results in extraction order. Resolved outcomes (found orders and
//! confirmed-absent order numbers alike) are cached so repeated mentions of the same order number
//! never trigger redundant upstream calls.
//!
//! The gateway and the optional AI free-text extractor sit behind the async traits in
//! [`mod@traits`], so the whole engine runs against in-memory fakes in tests.

mod cache;
mod extract;
mod orchestrator;
mod report;
mod traits;

pub use cache::{CacheEntry, LookupCache};
pub use extract::{
    candidate_fragments,
    extract_candidates,
    merge_candidates,
    normalize_filename,
    sanitize,
    IncomingMessage,
    LookupCandidate,
};
pub use orchestrator::{AutoLookup, AutoLookupConfig};
pub use report::{assemble, CandidateResult, LookupFailure, LookupOutcome};
pub use traits::{ExtractError, FreeTextExtractor, NoExtractor, OrderLookup};
