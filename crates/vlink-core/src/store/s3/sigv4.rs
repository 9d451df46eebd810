//! AWS Signature Version 4 header signing for the S3 existence probe.

use anyhow::{anyhow, Result};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use url::Url;

use super::credentials::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub(crate) const SERVICE: &str = "s3";

/// Hash of an empty request body (HEAD carries no payload).
pub(crate) const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[derive(Debug, Clone, Copy)]
pub(crate) struct SigningParams<'a> {
    pub region: &'a str,
    pub service: &'a str,
    pub credentials: &'a Credentials,
    pub now: OffsetDateTime,
}

/// Returns the headers to send with the request: `extra` plus the `x-amz-*`
/// headers and `Authorization`. `Host` is signed but not returned; the HTTP
/// client derives it from the URL.
pub(crate) fn signed_headers(
    method: &str,
    url: &Url,
    extra: &[(String, String)],
    payload_hash: &str,
    params: SigningParams<'_>,
) -> Result<Vec<(String, String)>> {
    let mut headers: Vec<(String, String)> = extra
        .iter()
        .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();
    headers.push(("x-amz-date".to_string(), amz_datetime(params.now)));
    headers.push(("x-amz-content-sha256".to_string(), payload_hash.to_string()));
    if let Some(token) = &params.credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }

    let mut signing = headers.clone();
    signing.push(("host".to_string(), host_header_value(url)?));
    signing.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = signing
        .iter()
        .map(|(k, v)| format!("{k}:{v}\n"))
        .collect();
    let signed_names = signing
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{method}\n{uri}\n{query}\n{canonical_headers}\n{signed_names}\n{payload_hash}",
        uri = url.path(),
        query = canonical_query_string(url),
    );

    let scope = credential_scope(params.region, params.service, params.now);
    let string_to_sign = format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        amz_datetime(params.now),
        sha256_hex(canonical_request.as_bytes())
    );
    let signature = signature(params, &string_to_sign)?;

    headers.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_names}, Signature={signature}",
            params.credentials.access_key_id
        ),
    ));
    Ok(headers)
}

fn signature(params: SigningParams<'_>, string_to_sign: &str) -> Result<String> {
    let k_date = hmac_sha256(
        format!("AWS4{}", params.credentials.secret_access_key).as_bytes(),
        date_stamp(params.now).as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, params.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, params.service.as_bytes())?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    Ok(hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| anyhow!("invalid HMAC key"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn canonical_query_string(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (percent_encode(&k), percent_encode(&v)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn host_header_value(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| anyhow!("endpoint must include a host: {}", url))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn date_stamp(now: OffsetDateTime) -> String {
    format!("{:04}{:02}{:02}", now.year(), now.month() as u8, now.day())
}

fn amz_datetime(now: OffsetDateTime) -> String {
    format!(
        "{}T{:02}{:02}{:02}Z",
        date_stamp(now),
        now.hour(),
        now.minute(),
        now.second()
    )
}

fn credential_scope(region: &str, service: &str, now: OffsetDateTime) -> String {
    format!("{}/{region}/{service}/aws4_request", date_stamp(now))
}

/// RFC 3986 encoding as SigV4 requires: only unreserved characters pass through.
pub(crate) fn percent_encode(input: &str) -> String {
    encode_impl(input, false)
}

/// Like [`percent_encode`] but keeps `/` so object keys stay hierarchical.
pub(crate) fn percent_encode_path(input: &str) -> String {
    encode_impl(input, true)
}

fn encode_impl(input: &str, preserve_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        let unreserved =
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~');
        if unreserved || (preserve_slash && b == b'/') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}
