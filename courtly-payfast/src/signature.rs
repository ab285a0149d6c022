use md5::{Digest, Md5};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::fields::FieldSet;

/// Reserved key: never part of the signing input, appended/compared
/// separately.
pub const SIGNATURE_KEY: &str = "signature";

/// Query-component percent encoding: spaces become `%20` (never `+`), and the
/// unreserved marks stay literal. The gateway computes its own digest over
/// the same bytes, so this set is part of the wire contract.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode(value: &str) -> String {
    utf8_percent_encode(value, QUERY_COMPONENT).to_string()
}

/// The string that gets hashed: `key=value` pairs joined with `&`, insertion
/// order, signature key skipped, empty values skipped, plus the synthetic
/// trailing passphrase when one is configured.
fn canonical_base(fields: &FieldSet, passphrase: Option<&str>) -> String {
    let mut out = String::new();
    for (key, value) in fields.iter() {
        if key == SIGNATURE_KEY {
            continue;
        }
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(&encode(trimmed));
    }
    if let Some(p) = passphrase {
        let trimmed = p.trim();
        if !trimmed.is_empty() {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str("passphrase=");
            out.push_str(&encode(trimmed));
        }
    }
    out
}

/// MD5 digest (lowercase hex) over the canonical field string. MD5 is fixed
/// by the gateway's protocol, not a choice this crate gets to make.
pub fn sign(fields: &FieldSet, passphrase: Option<&str>) -> String {
    let base = canonical_base(fields, passphrase);
    let digest = Md5::digest(base.as_bytes());
    hex::encode(digest)
}

/// Recomputes the digest over the fields (minus the inbound `signature`
/// entry) and compares case-insensitively against it.
pub fn verify(fields: &FieldSet, passphrase: Option<&str>) -> bool {
    let Some(claimed) = fields.get(SIGNATURE_KEY) else {
        return false;
    };
    let expected = sign(fields, passphrase);
    expected.eq_ignore_ascii_case(claimed.trim())
}

/// The literal request body sent to the gateway: the canonical field string
/// with the computed signature appended as the final field. The passphrase
/// participates in the digest but is never emitted as a real field. The
/// field portion must be byte-identical to what `sign` hashed, which is why
/// both go through `canonical_base`.
pub fn canonical_query_string(fields: &FieldSet, passphrase: Option<&str>) -> String {
    let base = canonical_base(fields, None);
    let sig = sign(fields, passphrase);
    if base.is_empty() {
        format!("{SIGNATURE_KEY}={sig}")
    } else {
        format!("{base}&{SIGNATURE_KEY}={sig}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FieldSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_set_hashes_empty_string() {
        // Pinned vector: md5("") is the one digest we can assert by eye.
        let sig = sign(&FieldSet::new(), None);
        assert_eq!(sig, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn digest_is_lowercase_hex() {
        let f = fields(&[("merchant_id", "10000100")]);
        let sig = sign(&f, Some("secret"));
        assert_eq!(sig.len(), 32);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn insertion_order_is_preserved_not_sorted() {
        // Regression guard against alphabetical sorting: inserted b-then-a
        // must canonicalize starting with b=2.
        let f = fields(&[("b", "2"), ("a", "1")]);
        let qs = canonical_query_string(&f, None);
        assert!(qs.starts_with("b=2&a=1&signature="), "got {qs}");

        let sorted = fields(&[("a", "1"), ("b", "2")]);
        assert_ne!(sign(&f, None), sign(&sorted, None));
    }

    #[test]
    fn whitespace_only_field_is_excluded() {
        let f = fields(&[("email_address", "x@y.com"), ("cell_number", "   ")]);
        let qs = canonical_query_string(&f, None);
        assert!(!qs.contains("cell_number"));
        assert!(qs.starts_with("email_address=x%40y.com&signature="));
    }

    #[test]
    fn values_are_trimmed_before_encoding() {
        let padded = fields(&[("item_name", "  Court booking  ")]);
        let clean = fields(&[("item_name", "Court booking")]);
        assert_eq!(sign(&padded, None), sign(&clean, None));
    }

    #[test]
    fn space_encodes_as_percent_20() {
        let f = fields(&[("item_name", "Court 3 at 09:00")]);
        let qs = canonical_query_string(&f, None);
        assert!(qs.starts_with("item_name=Court%203%20at%2009%3A00&signature="), "got {qs}");
        assert!(!qs.contains('+'));
    }

    #[test]
    fn signature_field_never_signs_itself() {
        let mut f = fields(&[("m_payment_id", "42")]);
        let sig = sign(&f, None);
        f.push(SIGNATURE_KEY, sig.clone());
        // Adding the signature entry must not change the digest.
        assert_eq!(sign(&f, None), sig);
    }

    #[test]
    fn passphrase_is_a_synthetic_trailing_field() {
        let f = fields(&[("amount", "150.00")]);
        let with = sign(&f, Some("pf-passphrase"));
        let without = sign(&f, None);
        assert_ne!(with, without);

        // An all-whitespace passphrase counts as absent.
        assert_eq!(sign(&f, Some("   ")), without);

        // Same digest as spelling the passphrase out as a trailing field.
        let spelled = fields(&[("amount", "150.00"), ("passphrase", "pf-passphrase")]);
        assert_eq!(with, sign(&spelled, None));
    }

    #[test]
    fn round_trip_verifies() {
        let mut f = fields(&[
            ("m_payment_id", "booking-77"),
            ("pf_payment_id", "1089250"),
            ("payment_status", "COMPLETE"),
            ("amount_gross", "200.00"),
        ]);
        let sig = sign(&f, Some("secret"));
        f.push(SIGNATURE_KEY, sig);
        assert!(verify(&f, Some("secret")));
        assert!(!verify(&f, Some("other-secret")));
        assert!(!verify(&f, None));
    }

    #[test]
    fn verify_is_case_insensitive_on_the_inbound_digest() {
        let mut f = fields(&[("amount_gross", "80.00")]);
        let sig = sign(&f, None).to_uppercase();
        f.push(SIGNATURE_KEY, sig);
        assert!(verify(&f, None));
    }

    #[test]
    fn tampering_breaks_verification() {
        let mut f = fields(&[("payment_status", "COMPLETE"), ("amount_gross", "200.00")]);
        let sig = sign(&f, Some("secret"));
        let flipped: String = sig
            .char_indices()
            .map(|(i, c)| if i == 0 { if c == '0' { '1' } else { '0' } } else { c })
            .collect();
        f.push(SIGNATURE_KEY, flipped);
        assert!(!verify(&f, Some("secret")));
    }

    #[test]
    fn missing_signature_entry_fails_verification() {
        let f = fields(&[("payment_status", "COMPLETE")]);
        assert!(!verify(&f, None));
    }

    #[test]
    fn body_and_digest_agree() {
        // Without a passphrase the outbound body minus its signature field is
        // exactly the bytes the signature was computed over.
        let f = fields(&[
            ("merchant_id", "10000100"),
            ("merchant_key", "46f0cd694581a"),
            ("amount", "150.00"),
            ("item_name", "Court booking"),
        ]);
        let qs = canonical_query_string(&f, None);
        let (base, sig) = qs.rsplit_once("&signature=").unwrap();
        assert_eq!(hex::encode(Md5::digest(base.as_bytes())), sig);
        assert_eq!(sig, sign(&f, None));
    }

    #[test]
    fn passphrase_is_hashed_but_never_emitted() {
        let f = fields(&[("merchant_id", "10000100"), ("amount", "150.00")]);
        let qs = canonical_query_string(&f, Some("secret"));
        assert!(!qs.contains("passphrase"));
        assert!(qs.ends_with(&format!("&signature={}", sign(&f, Some("secret")))));
    }

    #[test]
    fn signature_field_appears_last_and_once() {
        let f = fields(&[("merchant_id", "10000100"), ("item_name", "Court booking")]);
        let qs = canonical_query_string(&f, None);
        assert_eq!(qs.matches("signature=").count(), 1);
        assert!(qs.rsplit('&').next().unwrap().starts_with("signature="));
    }
}
