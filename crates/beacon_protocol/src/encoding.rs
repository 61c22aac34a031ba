//! Query-string encoding for repeated beacons.
//!
//! Each forwarded field becomes `key=value` with both sides percent-encoded
//! as URI components. Pairs are joined with `&` in payload order.

use crate::config::{FieldAllowList, ForwardTarget};
use crate::payload::{BeaconPayload, BeaconValue};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::borrow::Cow;

/// Bytes left as-is in a URI component: alphanumerics and `-_.~`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Serializes structured values into a single URL-safe string.
pub trait UrlSerializer: Send + Sync {
    fn serialize_for_url(&self, value: &serde_json::Value) -> String;
}

/// Serializes structured values as compact JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonUrlSerializer;

impl UrlSerializer for JsonUrlSerializer {
    fn serialize_for_url(&self, value: &serde_json::Value) -> String {
        // Value serialization only fails on non-string map keys, which Value cannot hold
        serde_json::to_string(value).unwrap_or_default()
    }
}

/// Percent-encode a string as a URI component.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, URI_COMPONENT).to_string()
}

/// String form of a beacon value before encoding.
pub fn stringify<'a>(value: &'a BeaconValue, serializer: &dyn UrlSerializer) -> Cow<'a, str> {
    match value {
        BeaconValue::Null => Cow::Borrowed(""),
        BeaconValue::Bool(true) => Cow::Borrowed("true"),
        BeaconValue::Bool(false) => Cow::Borrowed("false"),
        BeaconValue::Number(n) => Cow::Owned(number_to_string(n)),
        BeaconValue::Text(s) => Cow::Borrowed(s.as_str()),
        BeaconValue::Structured(v) => Cow::Owned(serializer.serialize_for_url(v)),
    }
}

/// Integral numbers print without a fractional part, as the host does.
fn number_to_string(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) => js_float_to_string(f),
        None => n.to_string(),
    }
}

/// Host `String(n)` form of a float: shortest round-trip digits, plain
/// notation for decimal exponents in `-7 < e < 21`, `d.ddde±x` otherwise.
/// Negative zero prints as `0`.
fn js_float_to_string(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    if !f.is_finite() {
        return if f.is_nan() {
            "NaN".to_string()
        } else if f > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        };
    }
    if f < 0.0 {
        return format!("-{}", js_float_to_string(-f));
    }

    // `{:e}` yields the shortest digits, e.g. `1.2345e2`
    let sci = format!("{:e}", f);
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        return f.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return f.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    // Value is 0.<digits> * 10^n
    let n = exponent + 1;

    if k <= n && n <= 21 {
        let mut out = digits;
        out.extend(std::iter::repeat('0').take((n - k) as usize));
        out
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        format!("{}.{}", int_part, frac_part)
    } else if -6 < n && n <= 0 {
        format!("0.{}{}", "0".repeat((-n) as usize), digits)
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        let (first, rest) = digits.split_at(1);
        if rest.is_empty() {
            format!("{}e{}{}", first, sign, exponent.abs())
        } else {
            format!("{}.{}e{}{}", first, rest, sign, exponent.abs())
        }
    }
}

/// Encode one `key=value` pair.
pub fn encode_pair(key: &str, value: &BeaconValue, serializer: &dyn UrlSerializer) -> String {
    let value = stringify(value, serializer);
    let mut pair = percent_encode(key);
    pair.push('=');
    pair.push_str(&percent_encode(&value));
    pair
}

/// Build the query string for a payload.
///
/// With an allow-list only listed fields are kept. An empty selection
/// yields an empty string.
pub fn build_query_string(
    payload: &BeaconPayload,
    allow_list: Option<&FieldAllowList>,
    serializer: &dyn UrlSerializer,
) -> String {
    payload
        .iter()
        .filter(|(key, _)| allow_list.map_or(true, |list| list.contains(key)))
        .map(|(key, value)| encode_pair(key, value, serializer))
        .collect::<Vec<_>>()
        .join("&")
}

/// Full outbound URL: `<target>?<query>`. The `?` is present even when the
/// query is empty.
pub fn full_url(target: &ForwardTarget, query: &str) -> String {
    let mut url = String::with_capacity(target.as_str().len() + 1 + query.len());
    url.push_str(target.as_str());
    url.push('?');
    url.push_str(query);
    url
}
