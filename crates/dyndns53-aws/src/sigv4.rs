// # AWS Signature Version 4
//
// Signs REST requests for Route 53 and S3.
//
// ## Algorithm
//
// ```text
// canonical request = METHOD \n URI \n QUERY \n HEADERS \n SIGNED-HEADERS \n sha256(payload)
// string to sign    = AWS4-HMAC-SHA256 \n timestamp \n scope \n sha256(canonical request)
// signing key       = HMAC chain over date, region, service, "aws4_request"
// signature         = hex(HMAC(signing key, string to sign))
// ```
//
// ## Security
//
// - The secret key and session token never appear in logs or Debug output

use chrono::{DateTime, Utc};
use dyndns53_core::config::AwsConfig;
use dyndns53_core::{Error, Result};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Signing algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Request signer for one service in one region
#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    /// ⚠️ NEVER log this value
    secret_access_key: String,
    session_token: Option<String>,
    region: String,
    service: &'static str,
    /// Send and sign `x-amz-content-sha256` (required by S3)
    content_sha256_header: bool,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<REDACTED>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<REDACTED>"),
            )
            .field("region", &self.region)
            .field("service", &self.service)
            .finish()
    }
}

impl Signer {
    /// Create a signer for `service` in `region` using `aws` credentials
    pub fn new(aws: &AwsConfig, region: impl Into<String>, service: &'static str) -> Self {
        Self {
            access_key_id: aws.access_key_id.clone(),
            secret_access_key: aws.secret_access_key.clone(),
            session_token: aws.session_token.clone(),
            region: region.into(),
            service,
            content_sha256_header: false,
        }
    }

    /// Also send the payload hash as `x-amz-content-sha256`
    pub fn with_content_sha256(mut self) -> Self {
        self.content_sha256_header = true;
        self
    }

    /// Sign a request
    ///
    /// `headers` are additional headers the caller will send and wants
    /// signed. Returns the headers the caller must add to the request:
    /// `x-amz-date`, the optional `x-amz-content-sha256` and
    /// `x-amz-security-token`, and `authorization`. The `host` header is
    /// signed but left to the HTTP client.
    pub fn sign(
        &self,
        method: &str,
        url: &Url,
        headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let mut added: Vec<(&'static str, String)> = vec![("x-amz-date", amz_date.clone())];
        if self.content_sha256_header {
            added.push(("x-amz-content-sha256", payload_hash.clone()));
        }
        if let Some(token) = &self.session_token {
            added.push(("x-amz-security-token", token.clone()));
        }

        let mut signed: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value.trim().to_string()))
            .collect();
        signed.push(("host".to_string(), host_header(url)?));
        signed.extend(added.iter().map(|(name, value)| (name.to_string(), value.clone())));

        let (canonical, signed_headers) =
            canonical_request(method, url, &mut signed, &payload_hash);
        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical.as_bytes()))
        );

        let key = signing_key(&self.secret_access_key, &date, &self.region, self.service)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        added.push((
            "authorization",
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.access_key_id, scope, signed_headers, signature
            ),
        ));
        Ok(added)
    }
}

/// Build the canonical request and the signed-headers list
///
/// Sorts `headers` in place; names must already be lowercase.
fn canonical_request(
    method: &str,
    url: &Url,
    headers: &mut [(String, String)],
    payload_hash: &str,
) -> (String, String) {
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        canonical_uri(url),
        canonical_query(url),
        canonical_headers,
        signed_headers,
        payload_hash
    );
    (canonical, signed_headers)
}

/// Path as sent; callers encode segments with [`uri_encode`]
fn canonical_uri(url: &Url) -> &str {
    match url.path() {
        "" => "/",
        path => path,
    }
}

/// Sorted, re-encoded query parameters
fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn host_header(url: &Url) -> Result<String> {
    let host = url
        .host_str()
        .ok_or_else(|| Error::invalid_input(format!("URL has no host: {}", url)))?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Percent-encode everything except unreserved characters
pub fn uri_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::config(format!("Invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the signing key for `date` (`YYYYMMDD`), `region` and `service`
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn aws(session_token: Option<&str>) -> AwsConfig {
        AwsConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: EXAMPLE_SECRET.to_string(),
            session_token: session_token.map(str::to_string),
            region: "us-east-1".to_string(),
        }
    }

    fn header<'a>(headers: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_signing_key_matches_published_vector() {
        let key = signing_key(EXAMPLE_SECRET, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_sign_matches_published_get_example() {
        let signer = Signer::new(&aws(None), "us-east-1", "iam");
        let url = Url::parse("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
            .unwrap();
        let now = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let headers = signer
            .sign(
                "GET",
                &url,
                &[("Content-Type", "application/x-www-form-urlencoded; charset=utf-8")],
                b"",
                now,
            )
            .unwrap();

        assert_eq!(header(&headers, "x-amz-date"), Some("20150830T123600Z"));
        assert_eq!(
            header(&headers, "authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
                 SignedHeaders=content-type;host;x-amz-date, \
                 Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
            )
        );
    }

    #[test]
    fn test_canonical_request_layout() {
        let url = Url::parse(
            "https://route53.amazonaws.com/2013-04-01/hostedzonesbyname?maxitems=1&dnsname=example.com",
        )
        .unwrap();
        let mut headers = vec![
            ("x-amz-date".to_string(), "20240101T000000Z".to_string()),
            ("host".to_string(), "route53.amazonaws.com".to_string()),
        ];

        let (canonical, signed) = canonical_request("GET", &url, &mut headers, "e3b0");

        assert_eq!(signed, "host;x-amz-date");
        assert_eq!(
            canonical,
            "GET\n/2013-04-01/hostedzonesbyname\ndnsname=example.com&maxitems=1\n\
             host:route53.amazonaws.com\nx-amz-date:20240101T000000Z\n\n\
             host;x-amz-date\ne3b0"
        );
    }

    #[test]
    fn test_optional_headers() {
        let url = Url::parse("https://bucket.s3.us-east-1.amazonaws.com/hosts.csv").unwrap();
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let plain = Signer::new(&aws(None), "us-east-1", "s3")
            .sign("GET", &url, &[], b"", now)
            .unwrap();
        assert!(header(&plain, "x-amz-content-sha256").is_none());
        assert!(header(&plain, "x-amz-security-token").is_none());

        let full = Signer::new(&aws(Some("token")), "us-east-1", "s3")
            .with_content_sha256()
            .sign("GET", &url, &[], b"", now)
            .unwrap();
        assert_eq!(
            header(&full, "x-amz-content-sha256"),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert_eq!(header(&full, "x-amz-security-token"), Some("token"));
        assert!(
            header(&full, "authorization")
                .unwrap()
                .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date;x-amz-security-token,")
        );
    }

    #[test]
    fn test_host_header_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:9000/bucket/key").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:9000");
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(uri_encode("a b/c+d"), "a%20b%2Fc%2Bd");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let signer = Signer::new(&aws(Some("session-secret")), "us-east-1", "s3");
        let debug = format!("{:?}", signer);

        assert!(!debug.contains(EXAMPLE_SECRET));
        assert!(!debug.contains("session-secret"));
        assert!(debug.contains("AKIDEXAMPLE"));
    }
}
