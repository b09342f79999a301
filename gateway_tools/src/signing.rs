use std::collections::BTreeMap;

use md5::{Digest, Md5};

/// Compute the gateway request signature over a flat parameter set.
///
/// The canonical form is: drop the `sign` parameter itself (any casing) and every parameter whose
/// value is empty or whitespace-only; take the remaining keys in byte-wise ascending order (the
/// `BTreeMap` iteration order); join them as `k1=v1&k2=v2&...`; append `&key=<secret>`; MD5 the
/// UTF-8 bytes and render as upper-case hex.
///
/// The function is pure and deterministic. An empty parameter set degenerates to signing
/// `&key=<secret>`, which is still well-defined.
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let canonical = params
        .iter()
        .filter(|(k, v)| !k.eq_ignore_ascii_case("sign") && !v.trim().is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<String>>()
        .join("&");
    let payload = format!("{canonical}&key={secret}");
    let digest = Md5::digest(payload.as_bytes());
    hex::encode_upper(digest)
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn known_answer_vector() {
        let p = params(&[
            ("merchant_id", "1001"),
            ("amount", "100"),
            ("timestamp", "1700000000"),
            ("sign", ""),
            ("empty", "   "),
        ]);
        // MD5("amount=100&merchant_id=1001&timestamp=1700000000&key=secret")
        assert_eq!(sign(&p, "secret"), "A7336862EB54F9EC16FCC93AA2B1004D");
    }

    #[test]
    fn sign_key_is_excluded_in_any_casing() {
        let base = params(&[("a", "1"), ("b", "2")]);
        let expected = sign(&base, "s3cr3t");
        // MD5("a=1&b=2&key=s3cr3t")
        assert_eq!(expected, "31E8E3A385BD1935AC35AFF70725E871");
        for key in ["sign", "SIGN", "Sign"] {
            let mut p = base.clone();
            p.insert(key.to_string(), "ABCDEF".to_string());
            assert_eq!(sign(&p, "s3cr3t"), expected);
        }
    }

    #[test]
    fn empty_values_do_not_affect_the_signature() {
        let base = params(&[("merchant_id", "1001"), ("order_no", "XY0001234")]);
        let mut padded = base.clone();
        padded.insert("note".to_string(), String::new());
        padded.insert("memo".to_string(), " \t ".to_string());
        assert_eq!(sign(&base, "k"), sign(&padded, "k"));
    }

    #[test]
    fn empty_parameter_set_is_well_defined() {
        // MD5("&key=secret")
        assert_eq!(sign(&BTreeMap::new(), "secret"), "703E7A32F6B3257C1BA566815B929B7D");
    }
}
