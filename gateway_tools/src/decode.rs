//! Tolerant decoding of gateway response payloads.
//!
//! The upstream service has no fixed response schema: field names, nesting depth and the
//! container shape of repeated records all vary across deployments and versions. Decoding is
//! therefore a field-picker over `serde_json::Value`: each logical field has an ordered list of
//! accepted key spellings, and record discovery falls back to a recursive scan of nested
//! containers when no recognized wrapper key is present. Call sites only ever see the typed
//! [`OrderRecord`]; "nothing decodable here" is an absence, never an error.

use serde_json::{Map, Value};

use crate::OrderRecord;

const MERCHANT_ORDER_NO_KEYS: &[&str] =
    &["merchant_order_no", "mch_order_no", "out_trade_no", "out_order_no", "order_no", "order_id", "orderid"];
const PLATFORM_ORDER_NO_KEYS: &[&str] =
    &["platform_order_no", "sys_order_no", "plat_order_no", "trade_no", "transaction_id"];
const AMOUNT_KEYS: &[&str] = &["amount", "money", "total_amount", "order_amount", "pay_amount", "price"];
const REAL_AMOUNT_KEYS: &[&str] = &["real_amount", "real_money", "actual_amount", "settle_amount", "pay_money"];
const STATUS_KEYS: &[&str] = &["status", "state", "order_status", "pay_status", "trade_status"];
const STATUS_TEXT_KEYS: &[&str] = &["status_text", "status_desc", "status_name", "state_text", "status_str"];
const NOTIFY_STATUS_KEYS: &[&str] = &["notify_status", "notify_state", "callback_status"];
const NOTIFY_TEXT_KEYS: &[&str] = &["notify_text", "notify_desc", "notify_result", "callback_text"];
const CHANNEL_KEYS: &[&str] = &["channel", "channel_id", "channel_code", "pay_channel", "pay_type"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "create_time", "created_time", "add_time"];
const PAID_AT_KEYS: &[&str] = &["paid_at", "pay_time", "paid_time", "success_time"];
const COMPLETED_AT_KEYS: &[&str] = &["completed_at", "complete_time", "finish_time", "finished_at"];
const EXPIRED_AT_KEYS: &[&str] = &["expired_at", "expire_time", "expired_time", "timeout_at"];

/// Container keys that commonly wrap the actual payload, in the order they are tried.
const WRAPPER_KEYS: &[&str] =
    &["data", "items", "list", "rows", "result", "results", "orders", "records", "order", "info", "detail"];

/// Decode a single order out of an arbitrary payload value.
///
/// Tries the value itself as a record first, then descends into nested objects and arrays,
/// returning the first sub-structure that yields a valid record. `None` means the structure is
/// well-formed but holds no recognizable order data.
pub fn decode_order(value: &Value) -> Option<OrderRecord> {
    match value {
        Value::Object(map) => {
            record_from_map(map).or_else(|| map.values().find_map(decode_order))
        },
        Value::Array(items) => items.iter().find_map(decode_order),
        _ => None,
    }
}

/// Decode a list-shaped payload into zero or more records.
///
/// Handles bare arrays, recognized wrapper keys (recursively), a top-level map that is itself a
/// single record, and, as a last resort, a scan of every nested container.
pub fn decode_order_list(value: &Value) -> Vec<OrderRecord> {
    match value {
        Value::Array(items) => items.iter().filter_map(decode_order).collect(),
        Value::Object(map) => {
            for &key in WRAPPER_KEYS {
                if let Some(inner) = get_ci(map, key) {
                    let records = decode_order_list(inner);
                    if !records.is_empty() {
                        return records;
                    }
                }
            }
            if let Some(record) = record_from_map(map) {
                return vec![record];
            }
            map.values().flat_map(decode_order_list).collect()
        },
        _ => Vec::new(),
    }
}

/// Build a record from one object level. Returns `None` unless at least one meaningful field is
/// present; structural keys (pagination counters, wrappers) never qualify on their own.
fn record_from_map(map: &Map<String, Value>) -> Option<OrderRecord> {
    let record = OrderRecord {
        merchant_order_no: pick_text(map, MERCHANT_ORDER_NO_KEYS),
        platform_order_no: pick_text(map, PLATFORM_ORDER_NO_KEYS),
        amount: pick_text(map, AMOUNT_KEYS),
        real_amount: pick_text(map, REAL_AMOUNT_KEYS),
        status: pick_int(map, STATUS_KEYS),
        status_text: pick_text(map, STATUS_TEXT_KEYS),
        notify_status: pick_int(map, NOTIFY_STATUS_KEYS),
        notify_text: pick_text(map, NOTIFY_TEXT_KEYS),
        channel: pick_text(map, CHANNEL_KEYS),
        created_at: pick_text(map, CREATED_AT_KEYS),
        paid_at: pick_text(map, PAID_AT_KEYS),
        completed_at: pick_text(map, COMPLETED_AT_KEYS),
        expired_at: pick_text(map, EXPIRED_AT_KEYS),
        extra: Default::default(),
    };
    if record.is_empty() {
        return None;
    }
    let extra = map
        .iter()
        .filter(|(k, _)| !is_recognized_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Some(OrderRecord { extra, ..record })
}

const ALL_FIELD_KEYS: &[&[&str]] = &[
    MERCHANT_ORDER_NO_KEYS,
    PLATFORM_ORDER_NO_KEYS,
    AMOUNT_KEYS,
    REAL_AMOUNT_KEYS,
    STATUS_KEYS,
    STATUS_TEXT_KEYS,
    NOTIFY_STATUS_KEYS,
    NOTIFY_TEXT_KEYS,
    CHANNEL_KEYS,
    CREATED_AT_KEYS,
    PAID_AT_KEYS,
    COMPLETED_AT_KEYS,
    EXPIRED_AT_KEYS,
];

fn is_recognized_key(key: &str) -> bool {
    ALL_FIELD_KEYS.iter().any(|keys| keys.iter().any(|k| k.eq_ignore_ascii_case(key)))
}

fn get_ci<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

/// First non-empty value among the synonym keys, coerced to a canonical string. Strings are
/// trimmed (empty → absent), numbers and booleans are rendered verbatim; containers and null
/// never match.
fn pick_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|&key| get_ci(map, key).and_then(as_text))
}

fn pick_int(map: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|&key| get_ci(map, key).and_then(as_int))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        },
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn synonymous_keys_decode_to_the_same_value() {
        for amount_key in ["amount", "money", "total_amount"] {
            let payload = json!({ amount_key: "99.50", "order_no": "ABC123456" });
            let record = decode_order(&payload).unwrap();
            assert_eq!(record.amount.as_deref(), Some("99.50"), "via key {amount_key}");
            assert_eq!(record.merchant_order_no.as_deref(), Some("ABC123456"));
        }
    }

    #[test]
    fn numeric_and_string_representations_coerce() {
        let record = decode_order(&json!({"money": 100, "status": "2"})).unwrap();
        assert_eq!(record.amount.as_deref(), Some("100"));
        assert_eq!(record.status, Some(2));
    }

    #[test]
    fn extra_nesting_is_traversed() {
        let payload = json!({
            "result": { "order": { "out_trade_no": "XY0001234", "pay_status": 1 } }
        });
        let record = decode_order(&payload).unwrap();
        assert_eq!(record.merchant_order_no.as_deref(), Some("XY0001234"));
        assert_eq!(record.status, Some(1));
    }

    #[test]
    fn zero_recognized_fields_is_absence_not_a_zero_record() {
        assert_eq!(decode_order(&json!({"page": 1, "total": 0, "size": 20})), None);
        assert_eq!(decode_order(&json!(null)), None);
        assert_eq!(decode_order(&json!("ABC123456")), None);
        assert!(decode_order_list(&json!({"page": 1, "total": 0})).is_empty());
    }

    #[test]
    fn empty_string_fields_do_not_qualify_a_record() {
        assert_eq!(decode_order(&json!({"order_no": "", "amount": "  "})), None);
    }

    #[test]
    fn list_shapes() {
        let one = json!({"order_no": "A1230001", "amount": "5"});
        let two = json!({"order_no": "B1230002", "amount": "6"});

        // bare array
        let records = decode_order_list(&json!([one, two]));
        assert_eq!(records.len(), 2);
        // recognized wrapper, with pagination noise alongside
        let records = decode_order_list(&json!({"page": 1, "total": 2, "list": [one, two]}));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].merchant_order_no.as_deref(), Some("A1230001"));
        // nested wrappers
        let records = decode_order_list(&json!({"data": {"rows": [one]}}));
        assert_eq!(records.len(), 1);
        // a top-level map that is itself a record
        let records = decode_order_list(&one);
        assert_eq!(records.len(), 1);
        // unrecognized wrapper, found by the full scan
        let records = decode_order_list(&json!({"payload": [one, two]}));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn unrecognized_fields_are_kept_in_extra() {
        let record = decode_order(&json!({
            "order_no": "ABC123456",
            "agent_id": 7,
            "remark": "vip"
        }))
        .unwrap();
        assert_eq!(record.extra.len(), 2);
        assert_eq!(record.extra["agent_id"], json!(7));
        assert_eq!(record.extra["remark"], json!("vip"));
    }

    #[test]
    fn timestamps_alone_are_noise() {
        // created_at without any identifying or monetary field does not make an order
        assert_eq!(decode_order(&json!({"create_time": "2024-05-01 10:00:00"})), None);
    }
}
