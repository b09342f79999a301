use std::sync::OnceLock;

use log::trace;
use regex::Regex;

/// Bounds on the normalized form of an order-number candidate.
const MIN_CANDIDATE_LEN: usize = 8;
const MAX_CANDIDATE_LEN: usize = 64;
const MIN_DIGITS: usize = 4;

/// The slice of an incoming chat message that the engine needs. Supplied by the chat-transport
/// collaborator; the engine never talks to the chat framework directly.
#[derive(Debug, Clone, Default)]
pub struct IncomingMessage {
    pub chat_id: i64,
    /// The merchant bound to the chat's group.
    pub merchant_id: i64,
    pub text: String,
    pub caption: String,
    pub filenames: Vec<String>,
    /// Group-level feature flag; when false the engine does nothing for this message.
    pub auto_lookup_enabled: bool,
}

/// A string suspected of being a merchant order number, before upstream confirmation.
/// `normalized` is uppercase alphanumeric, 8–64 chars, with at least 4 digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupCandidate {
    pub raw: String,
    pub normalized: String,
}

fn raw_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[A-Za-z0-9]{6,}").unwrap())
}

/// Gather the raw text fragments of a message: body, caption, and attachment filenames with
/// separators replaced by spaces and the extension stripped.
pub fn candidate_fragments(msg: &IncomingMessage) -> Vec<String> {
    let mut fragments = Vec::with_capacity(2 + msg.filenames.len());
    fragments.push(msg.text.clone());
    fragments.push(msg.caption.clone());
    fragments.extend(msg.filenames.iter().map(|f| normalize_filename(f)));
    fragments
}

/// Strip the extension from a filename and replace common separators with spaces, so that order
/// numbers embedded in names like `receipt_ABC123456.pdf` become matchable.
pub fn normalize_filename(name: &str) -> String {
    let stem = name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name);
    stem.chars().map(|c| if matches!(c, '_' | '-' | '.' | '+') { ' ' } else { c }).collect()
}

/// Keep digits and letters only, upper-casing the letters. Everything else is dropped.
pub fn sanitize(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).map(|c| c.to_ascii_uppercase()).collect()
}

fn is_valid(normalized: &str) -> bool {
    (MIN_CANDIDATE_LEN..=MAX_CANDIDATE_LEN).contains(&normalized.len()) &&
        normalized.chars().filter(char::is_ascii_digit).count() >= MIN_DIGITS
}

/// Scan text fragments for order-number candidates. The raw pattern is deliberately permissive;
/// sanitization and the validity filter do the real gatekeeping. The result is deduplicated on
/// the normalized form and sorted lexicographically, so truncation to a maximum count is
/// reproducible.
pub fn extract_candidates<'a>(fragments: impl IntoIterator<Item = &'a str>) -> Vec<LookupCandidate> {
    let mut candidates = Vec::new();
    for fragment in fragments {
        for m in raw_pattern().find_iter(fragment) {
            push_if_valid(&mut candidates, m.as_str());
        }
    }
    sort_dedup(candidates)
}

/// Merge raw strings from the free-text extraction collaborator into an existing candidate list.
/// Extractor output goes through the same sanitize/validate funnel as pattern matches.
pub fn merge_candidates(mut base: Vec<LookupCandidate>, extra: impl IntoIterator<Item = String>) -> Vec<LookupCandidate> {
    for raw in extra {
        push_if_valid(&mut base, &raw);
    }
    sort_dedup(base)
}

fn push_if_valid(list: &mut Vec<LookupCandidate>, raw: &str) {
    let normalized = sanitize(raw);
    if is_valid(&normalized) {
        list.push(LookupCandidate { raw: raw.to_string(), normalized });
    } else {
        trace!("Discarding candidate {raw:?}: normalized form {normalized:?} fails the validity filter");
    }
}

fn sort_dedup(mut candidates: Vec<LookupCandidate>) -> Vec<LookupCandidate> {
    candidates.sort_by(|a, b| a.normalized.cmp(&b.normalized));
    candidates.dedup_by(|a, b| a.normalized == b.normalized);
    candidates
}
