use gateway_tools::OrderRecord;
use thiserror::Error;

use crate::extract::LookupCandidate;

#[derive(Debug, Clone, Error)]
pub enum LookupFailure {
    #[error("the lookup timed out")]
    Timeout,
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// The outcome of resolving one candidate. `Found` and `NotFound` are both *resolved* outcomes
/// (they count toward the success quota); `Failed` is not and is never cached.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    Found(OrderRecord),
    NotFound,
    Failed(LookupFailure),
}

impl LookupOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Found(_) | Self::NotFound)
    }
}

/// One candidate paired with what its lookup produced, in candidate-extraction order.
#[derive(Debug, Clone)]
pub struct CandidateResult {
    pub candidate: LookupCandidate,
    pub outcome: LookupOutcome,
}

impl CandidateResult {
    /// The user-facing line for this candidate. Failed lookups render the same explicit
    /// "not found" line as confirmed-absent orders; silent omission would read as a dropped
    /// message.
    pub fn as_line(&self) -> String {
        match &self.outcome {
            LookupOutcome::Found(record) => {
                let summary = record.summary();
                if summary.is_empty() {
                    format!("{}: found", self.candidate.normalized)
                } else {
                    format!("{}: {summary}", self.candidate.normalized)
                }
            },
            LookupOutcome::NotFound | LookupOutcome::Failed(_) => {
                format!("{}: not found", self.candidate.normalized)
            },
        }
    }

    /// The order number to offer behind a "copy order number" affordance, for found orders only.
    pub fn copy_payload(&self) -> Option<&str> {
        match &self.outcome {
            LookupOutcome::Found(record) => {
                Some(record.merchant_order_no.as_deref().unwrap_or(self.candidate.normalized.as_str()))
            },
            _ => None,
        }
    }
}

/// Join per-candidate lines into the message handed back to the chat layer. Returns `None` when
/// nothing should be emitted: an empty batch, or a batch in which no candidate resolved at all.
pub fn assemble(results: &[CandidateResult]) -> Option<String> {
    if !results.iter().any(|r| r.outcome.is_resolved()) {
        return None;
    }
    Some(results.iter().map(CandidateResult::as_line).collect::<Vec<String>>().join("\n"))
}

#[cfg(test)]
mod test {
    use super::*;

    fn candidate(no: &str) -> LookupCandidate {
        LookupCandidate { raw: no.to_lowercase(), normalized: no.to_string() }
    }

    fn found(no: &str) -> CandidateResult {
        let record = OrderRecord {
            merchant_order_no: Some(no.to_string()),
            amount: Some("100".to_string()),
            ..Default::default()
        };
        CandidateResult { candidate: candidate(no), outcome: LookupOutcome::Found(record) }
    }

    #[test]
    fn lines_render_found_and_not_found() {
        let r = found("ABC123456");
        assert_eq!(r.as_line(), "ABC123456: order ABC123456, amount 100");
        let r = CandidateResult { candidate: candidate("XY0001234"), outcome: LookupOutcome::NotFound };
        assert_eq!(r.as_line(), "XY0001234: not found");
        let r = CandidateResult {
            candidate: candidate("XY0001234"),
            outcome: LookupOutcome::Failed(LookupFailure::Timeout),
        };
        assert_eq!(r.as_line(), "XY0001234: not found");
    }

    #[test]
    fn copy_payload_only_for_found_orders() {
        assert_eq!(found("ABC123456").copy_payload(), Some("ABC123456"));
        let r = CandidateResult { candidate: candidate("XY0001234"), outcome: LookupOutcome::NotFound };
        assert_eq!(r.copy_payload(), None);
    }

    #[test]
    fn fully_failed_batch_emits_nothing() {
        assert_eq!(assemble(&[]), None);
        let all_failed = vec![CandidateResult {
            candidate: candidate("XY0001234"),
            outcome: LookupOutcome::Failed(LookupFailure::Gateway("boom".to_string())),
        }];
        assert_eq!(assemble(&all_failed), None);
        // one resolved candidate is enough to emit, failures included as explicit lines
        let mixed = vec![
            found("ABC123456"),
            CandidateResult {
                candidate: candidate("XY0001234"),
                outcome: LookupOutcome::Failed(LookupFailure::Timeout),
            },
        ];
        let text = assemble(&mixed).unwrap();
        assert_eq!(text, "ABC123456: order ABC123456, amount 100\nXY0001234: not found");
    }
}
