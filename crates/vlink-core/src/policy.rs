//! CloudFront custom-policy document.
//!
//! The policy is built as typed data and serialized with serde, so resource
//! paths and addresses are always escaped correctly. Field order is fixed by
//! the struct layout: `Resource`, then `IpAddress` (when restricted), then
//! `DateLessThan`. Identical inputs therefore always produce identical bytes,
//! which keeps the signature input reproducible.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Exactly one statement; the fixed-size array serializes as a one-element
/// JSON list and refuses to deserialize from any other length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(rename = "Statement")]
    statement: [Statement; 1],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Statement {
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Condition")]
    condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Condition {
    #[serde(
        rename = "IpAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    ip_address: Option<SourceIp>,
    #[serde(rename = "DateLessThan")]
    date_less_than: EpochTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SourceIp {
    #[serde(rename = "AWS:SourceIp")]
    source_ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EpochTime {
    #[serde(rename = "AWS:EpochTime")]
    epoch_time: i64,
}

impl Policy {
    /// Single-statement policy for `resource`, invalid at or after `expires_at` (Unix seconds).
    pub fn new(resource: impl Into<String>, expires_at: i64) -> Self {
        Self {
            statement: [Statement {
                resource: resource.into(),
                condition: Condition {
                    ip_address: None,
                    date_less_than: EpochTime {
                        epoch_time: expires_at,
                    },
                },
            }],
        }
    }

    /// Restricts the caller to a single IPv4 host (`<addr>/32`).
    pub fn with_single_host(mut self, addr: &str) -> Self {
        self.statement[0].condition.ip_address = Some(SourceIp {
            source_ip: format!("{}/32", addr),
        });
        self
    }

    pub fn resource(&self) -> &str {
        &self.statement[0].resource
    }

    /// The `AWS:SourceIp` value, including the `/32` mask.
    pub fn source_ip(&self) -> Option<&str> {
        self.statement[0]
            .condition
            .ip_address
            .as_ref()
            .map(|ip| ip.source_ip.as_str())
    }

    pub fn expires_at(&self) -> i64 {
        self.statement[0].condition.date_less_than.epoch_time
    }

    /// Compact JSON, the exact bytes CloudFront verifies the signature against.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// JSON encoded with the CloudFront-safe base64 alphabet (the `Policy` query value).
    pub fn to_cloudfront_base64(&self) -> serde_json::Result<String> {
        Ok(cloudfront_base64(self.to_json()?.as_bytes()))
    }
}

/// Standard base64 with `+`, `=`, `/` swapped for `-`, `_`, `~` as CloudFront expects.
pub(crate) fn cloudfront_base64(bytes: &[u8]) -> String {
    STANDARD
        .encode(bytes)
        .chars()
        .map(|c| match c {
            '+' => '-',
            '=' => '_',
            '/' => '~',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOURCE: &str = "http://dz9ncp1xthllc.cloudfront.net/records.backup.zip";

    #[test]
    fn policy_without_ip_omits_condition() {
        let policy = Policy::new(RESOURCE, 1767290400);
        assert_eq!(
            policy.to_json().unwrap(),
            r#"{"Statement":[{"Resource":"http://dz9ncp1xthllc.cloudfront.net/records.backup.zip","Condition":{"DateLessThan":{"AWS:EpochTime":1767290400}}}]}"#
        );
        assert!(policy.source_ip().is_none());
        assert!(!policy.to_json().unwrap().contains("IpAddress"));
    }

    #[test]
    fn policy_with_ip_orders_fields() {
        let policy = Policy::new(RESOURCE, 1767290420).with_single_host("86.136.140.199");
        assert_eq!(
            policy.to_json().unwrap(),
            r#"{"Statement":[{"Resource":"http://dz9ncp1xthllc.cloudfront.net/records.backup.zip","Condition":{"IpAddress":{"AWS:SourceIp":"86.136.140.199/32"},"DateLessThan":{"AWS:EpochTime":1767290420}}}]}"#
        );
        assert_eq!(policy.source_ip(), Some("86.136.140.199/32"));
        assert_eq!(policy.resource(), RESOURCE);
        assert_eq!(policy.expires_at(), 1767290420);
    }

    #[test]
    fn resource_with_quotes_is_escaped() {
        let policy = Policy::new(r#"https://cdn.example.com/a"b\c.txt"#, 10);
        let json = policy.to_json().unwrap();
        assert!(json.contains(r#""Resource":"https://cdn.example.com/a\"b\\c.txt""#));
        let parsed: Policy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);
    }

    #[test]
    fn statement_count_other_than_one_is_rejected() {
        assert!(serde_json::from_str::<Policy>(r#"{"Statement":[]}"#).is_err());

        let one = Policy::new(RESOURCE, 10).to_json().unwrap();
        let statement = &one[r#"{"Statement":["#.len()..one.len() - 2];
        let two = format!(r#"{{"Statement":[{statement},{statement}]}}"#);
        assert!(serde_json::from_str::<Policy>(&two).is_err());

        let parsed: Policy = serde_json::from_str(&one).unwrap();
        assert_eq!(parsed.resource(), RESOURCE);
        assert_eq!(parsed.expires_at(), 10);
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = Policy::new(RESOURCE, 100).with_single_host("10.0.0.1");
        let b = Policy::new(RESOURCE, 100).with_single_host("10.0.0.1");
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        assert_eq!(
            a.to_cloudfront_base64().unwrap(),
            b.to_cloudfront_base64().unwrap()
        );
    }

    #[test]
    fn cloudfront_base64_swaps_unsafe_chars() {
        // 0xfb 0xff encodes to "+/8=" in standard base64.
        assert_eq!(cloudfront_base64(&[0xfb, 0xff]), "-~8_");
        assert_eq!(cloudfront_base64(b"abc"), "YWJj");
    }

    #[test]
    fn policy_base64_has_no_unsafe_chars() {
        let encoded = Policy::new("https://example.com/test?x=1", 1767290400)
            .with_single_host("192.0.2.1")
            .to_cloudfront_base64()
            .unwrap();
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('='));
        assert!(!encoded.contains('/'));
    }
}
