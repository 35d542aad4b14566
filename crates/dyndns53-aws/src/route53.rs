// # Route 53 Zone Client
//
// ZoneClient over the Route 53 REST API (version 2013-04-01).
//
// ## API Reference
//
// - Zone lookup:   GET  `/2013-04-01/hostedzonesbyname?dnsname=...&maxitems=1`
// - Record lookup: GET  `/2013-04-01/hostedzone/:id/rrset?name=...&type=...&maxitems=1`
// - Change batch:  POST `/2013-04-01/hostedzone/:id/rrset/`
//
// ## Change Semantics
//
// - create: one `UPSERT`, applied whatever the provider currently holds
// - update: `DELETE` of the previous value plus `CREATE` of the new one in a
//   single batch; Route 53 rejects the whole batch with `InvalidChangeBatch`
//   unless the previous value still matches
//
// One HTTP request per trait call. No retries, no caching.

use async_trait::async_trait;
use chrono::Utc;
use dyndns53_core::traits::{AddressRecord, HostedZone, RecordType, ZoneClient};
use dyndns53_core::{Error, Result};
use reqwest::{Method, StatusCode, Url};
use std::net::IpAddr;
use std::time::Duration;

use crate::sigv4::Signer;
use crate::xml;

/// Route 53 API endpoint (global service)
pub const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";

/// Route 53 requests are always signed for this region
const SIGNING_REGION: &str = "us-east-1";

const API_VERSION: &str = "2013-04-01";

const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

const PROVIDER: &str = "route53";

/// Default HTTP timeout for API requests (30 seconds)
pub(crate) const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Route 53 zone client
///
/// The Debug implementation does NOT expose credentials.
#[derive(Debug)]
pub struct Route53ZoneClient {
    /// Base URL of the API
    endpoint: String,

    /// Request signer for service `route53`
    signer: Signer,

    /// HTTP client for API requests
    client: reqwest::Client,
}

impl Route53ZoneClient {
    /// Create a client for the public Route 53 endpoint
    pub fn new(aws: &dyndns53_core::AwsConfig) -> Result<Self> {
        Self::with_endpoint(aws, ROUTE53_ENDPOINT)
    }

    /// Create a client for a custom endpoint
    pub fn with_endpoint(
        aws: &dyndns53_core::AwsConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        aws.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            signer: Signer::new(aws, SIGNING_REGION, PROVIDER),
            client,
        })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let base = format!("{}/{}/{}", self.endpoint, API_VERSION, path);
        let parsed = if query.is_empty() {
            Url::parse(&base)
        } else {
            Url::parse_with_params(&base, query)
        };
        parsed.map_err(|e| Error::config(format!("Invalid Route 53 URL {}: {}", base, e)))
    }

    /// Send a signed request and return the response body
    async fn send(&self, method: Method, url: Url, body: Option<String>) -> Result<String> {
        let payload = body.as_deref().unwrap_or_default();
        let mut headers: Vec<(&str, &str)> = Vec::new();
        if body.is_some() {
            headers.push(("content-type", "text/xml"));
        }

        let signed = self
            .signer
            .sign(method.as_str(), &url, &headers, payload.as_bytes(), Utc::now())?;

        let mut request = self.client.request(method, url);
        for (name, value) in &headers {
            request = request.header(*name, *value);
        }
        for (name, value) in signed {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("Route 53 request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read Route 53 response: {}", e)))?;

        if !status.is_success() {
            return Err(classify_error(status, &text));
        }
        Ok(text)
    }

    /// Submit a change batch
    async fn change(&self, zone: &HostedZone, changes: &[(&str, &AddressRecord)]) -> Result<()> {
        let url = self.url(&format!("hostedzone/{}/rrset/", zone.id), &[])?;
        let body = change_batch(changes);

        let response = self.send(Method::POST, url, Some(body)).await?;

        tracing::debug!(
            "Route 53 accepted change {} (status {})",
            xml::text(&response, "Id").unwrap_or_default(),
            xml::text(&response, "Status").unwrap_or_default()
        );
        Ok(())
    }
}

#[async_trait]
impl ZoneClient for Route53ZoneClient {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>> {
        let url = self.url("hostedzonesbyname", &[("dnsname", domain), ("maxitems", "1")])?;
        let body = self.send(Method::GET, url, None).await?;
        Ok(parse_hosted_zone(&body, domain))
    }

    async fn get_record(
        &self,
        zone: &HostedZone,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<AddressRecord>> {
        let url = self.url(
            &format!("hostedzone/{}/rrset", zone.id),
            &[
                ("name", hostname),
                ("type", record_type.as_str()),
                ("maxitems", "1"),
            ],
        )?;
        let body = self.send(Method::GET, url, None).await?;
        parse_record_set(&body, hostname, record_type)
    }

    async fn create_record(&self, zone: &HostedZone, record: &AddressRecord) -> Result<()> {
        self.change(zone, &[("UPSERT", record)]).await
    }

    async fn update_record(
        &self,
        zone: &HostedZone,
        previous: &AddressRecord,
        record: &AddressRecord,
    ) -> Result<()> {
        self.change(zone, &[("DELETE", previous), ("CREATE", record)])
            .await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Compare DNS names ignoring case and a trailing dot
fn same_name(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}

/// Pick the zone named exactly `domain` from a ListHostedZonesByName response
///
/// The API lists zones starting at `domain` in name order, so the first
/// entry is only a match when its name equals `domain`.
fn parse_hosted_zone(body: &str, domain: &str) -> Option<HostedZone> {
    xml::elements(body, "HostedZone").into_iter().find_map(|zone| {
        let name = xml::text(zone, "Name")?;
        if !same_name(&name, domain) {
            return None;
        }
        let id = xml::text(zone, "Id")?;
        Some(HostedZone {
            id: id.trim_start_matches("/hostedzone/").to_string(),
            name: name.trim_end_matches('.').to_string(),
        })
    })
}

/// Extract the record for `hostname` from a ListResourceRecordSets response
///
/// The API lists record sets starting at the requested name and type, so a
/// returned set only counts when both match.
fn parse_record_set(
    body: &str,
    hostname: &str,
    record_type: RecordType,
) -> Result<Option<AddressRecord>> {
    let Some(set) = xml::element(body, "ResourceRecordSet") else {
        return Ok(None);
    };

    let name = xml::text(set, "Name").unwrap_or_default();
    let kind = xml::text(set, "Type").unwrap_or_default();
    if !same_name(&name, hostname) || kind != record_type.as_str() {
        return Ok(None);
    }

    let values = xml::elements(set, "Value");
    let first = values.first().ok_or_else(|| {
        Error::provider(
            PROVIDER,
            format!("{} record {} has no values (alias records are not supported)", kind, hostname),
        )
    })?;
    if values.len() > 1 {
        tracing::warn!(
            "{} record {} has {} values; using the first",
            kind,
            hostname,
            values.len()
        );
    }

    let value: IpAddr = xml::unescape(first).trim().parse().map_err(|e| {
        Error::provider(PROVIDER, format!("Invalid IP in {} record {}: {}", kind, hostname, e))
    })?;
    let ttl = xml::text(set, "TTL")
        .and_then(|ttl| ttl.trim().parse().ok())
        .unwrap_or(dyndns53_core::traits::DEFAULT_TTL);

    Ok(Some(AddressRecord {
        name: name.trim_end_matches('.').to_string(),
        record_type,
        ttl,
        value,
    }))
}

/// Render a ChangeResourceRecordSets request body
fn change_batch(changes: &[(&str, &AddressRecord)]) -> String {
    let mut body = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
         <ChangeResourceRecordSetsRequest xmlns=\"{}\"><ChangeBatch><Changes>",
        XMLNS
    );
    for (action, record) in changes {
        body.push_str(&format!(
            "<Change><Action>{}</Action><ResourceRecordSet>\
             <Name>{}.</Name><Type>{}</Type><TTL>{}</TTL>\
             <ResourceRecords><ResourceRecord><Value>{}</Value></ResourceRecord></ResourceRecords>\
             </ResourceRecordSet></Change>",
            action,
            xml::escape(record.name.trim_end_matches('.')),
            record.record_type,
            record.ttl,
            record.value
        ));
    }
    body.push_str("</Changes></ChangeBatch></ChangeResourceRecordSetsRequest>");
    body
}

/// Map an error response to the core error taxonomy
///
/// Rejections of a conditional change are conflicts; the reconciler
/// recovers from those. Everything else is fatal to the request.
fn classify_error(status: StatusCode, body: &str) -> Error {
    // InvalidChangeBatch uses its own root element instead of <Error>
    let code = if body.contains("<InvalidChangeBatch") {
        "InvalidChangeBatch".to_string()
    } else {
        xml::text(body, "Code").unwrap_or_default()
    };
    let message = xml::elements(body, "Message")
        .into_iter()
        .map(xml::unescape)
        .collect::<Vec<_>>()
        .join("; ");
    let detail = format!("{} (HTTP {}): {}", code, status.as_u16(), message);

    match code.as_str() {
        "InvalidChangeBatch" | "PriorRequestNotComplete" => Error::conflict(PROVIDER, detail),
        "NoSuchHostedZone" => Error::zone_not_found(message),
        _ => match status.as_u16() {
            409 => Error::conflict(PROVIDER, detail),
            401 | 403 => Error::provider(
                PROVIDER,
                format!(
                    "Authentication failed: invalid credentials or insufficient permissions. {}",
                    detail
                ),
            ),
            400 if code == "Throttling" => {
                Error::provider(PROVIDER, format!("Rate limit exceeded. {}", detail))
            }
            500..=599 => Error::provider(PROVIDER, format!("Server error (transient): {}", detail)),
            _ => Error::provider(PROVIDER, detail),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ip: &str) -> AddressRecord {
        AddressRecord::new(name, ip.parse().unwrap())
    }

    #[test]
    fn test_parse_hosted_zone_requires_exact_name() {
        let body = r#"<ListHostedZonesByNameResponse xmlns="https://route53.amazonaws.com/doc/2013-04-01/">
            <HostedZones><HostedZone><Id>/hostedzone/Z0123</Id><Name>Example.com.</Name>
            <CallerReference>ref</CallerReference></HostedZone></HostedZones>
            <DNSName>example.com</DNSName><IsTruncated>false</IsTruncated><MaxItems>1</MaxItems>
            </ListHostedZonesByNameResponse>"#;

        assert_eq!(
            parse_hosted_zone(body, "example.com"),
            Some(HostedZone {
                id: "Z0123".to_string(),
                name: "Example.com".to_string(),
            })
        );
        // The API returns the next zone in order when there is no exact match
        assert_eq!(parse_hosted_zone(body, "b.example.com"), None);
        assert_eq!(parse_hosted_zone("<HostedZones></HostedZones>", "example.com"), None);
    }

    #[test]
    fn test_parse_record_set() {
        let body = r#"<ListResourceRecordSetsResponse><ResourceRecordSets><ResourceRecordSet>
            <Name>host.example.com.</Name><Type>A</Type><TTL>60</TTL>
            <ResourceRecords><ResourceRecord><Value>192.0.2.1</Value></ResourceRecord>
            <ResourceRecord><Value>192.0.2.2</Value></ResourceRecord></ResourceRecords>
            </ResourceRecordSet></ResourceRecordSets></ListResourceRecordSetsResponse>"#;

        let found = parse_record_set(body, "host.example.com", RecordType::A)
            .unwrap()
            .unwrap();
        assert_eq!(found.value, "192.0.2.1".parse::<IpAddr>().unwrap());
        assert_eq!(found.ttl, 60);
        assert_eq!(found.name, "host.example.com");

        // Next set in order belongs to another name or type
        assert!(
            parse_record_set(body, "a.example.com", RecordType::A)
                .unwrap()
                .is_none()
        );
        assert!(
            parse_record_set(body, "host.example.com", RecordType::Aaaa)
                .unwrap()
                .is_none()
        );
        assert!(
            parse_record_set("<ResourceRecordSets/>", "host.example.com", RecordType::A)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_parse_record_set_rejects_alias_and_garbage() {
        let alias = "<ResourceRecordSet><Name>host.example.com.</Name><Type>A</Type>\
                     <AliasTarget><DNSName>lb.example.net.</DNSName></AliasTarget>\
                     </ResourceRecordSet>";
        assert!(parse_record_set(alias, "host.example.com", RecordType::A).is_err());

        let garbage = "<ResourceRecordSet><Name>host.example.com.</Name><Type>A</Type>\
                       <ResourceRecords><ResourceRecord><Value>not-an-ip</Value></ResourceRecord>\
                       </ResourceRecords></ResourceRecordSet>";
        assert!(parse_record_set(garbage, "host.example.com", RecordType::A).is_err());
    }

    #[test]
    fn test_change_batch_update() {
        let body = change_batch(&[
            ("DELETE", &record("host.example.com", "192.0.2.1")),
            ("CREATE", &record("host.example.com", "192.0.2.2")),
        ]);

        assert!(body.starts_with("<?xml"));
        assert_eq!(xml::elements(&body, "Change").len(), 2);
        assert_eq!(xml::elements(&body, "Action"), vec!["DELETE", "CREATE"]);
        assert_eq!(xml::elements(&body, "Value"), vec!["192.0.2.1", "192.0.2.2"]);
        assert_eq!(xml::element(&body, "Name"), Some("host.example.com."));
        assert_eq!(xml::element(&body, "TTL"), Some("300"));
    }

    #[test]
    fn test_change_batch_aaaa() {
        let body = change_batch(&[("UPSERT", &record("host.example.com", "2001:db8::1"))]);
        assert_eq!(xml::element(&body, "Type"), Some("AAAA"));
        assert_eq!(xml::element(&body, "Value"), Some("2001:db8::1"));
    }

    #[test]
    fn test_classify_conflicts() {
        let invalid = r#"<?xml version="1.0"?>
<InvalidChangeBatch xmlns="https://route53.amazonaws.com/doc/2013-04-01/"><Messages><Message>Tried to delete resource record set [name=&apos;host.example.com.&apos;, type=&apos;A&apos;] but the values provided do not match the current values</Message></Messages></InvalidChangeBatch>"#;
        let err = classify_error(StatusCode::BAD_REQUEST, invalid);
        assert!(err.is_conflict());
        assert!(err.to_string().contains("name='host.example.com.'"));

        let prior = "<ErrorResponse><Error><Type>Sender</Type><Code>PriorRequestNotComplete</Code>\
                     <Message>busy</Message></Error></ErrorResponse>";
        assert!(classify_error(StatusCode::BAD_REQUEST, prior).is_conflict());

        assert!(classify_error(StatusCode::CONFLICT, "").is_conflict());
    }

    #[test]
    fn test_classify_other_errors() {
        let missing = "<ErrorResponse><Error><Type>Sender</Type><Code>NoSuchHostedZone</Code>\
                       <Message>No hosted zone found with ID: Z0123</Message></Error></ErrorResponse>";
        assert!(matches!(
            classify_error(StatusCode::NOT_FOUND, missing),
            Error::ZoneNotFound(_)
        ));

        let denied = "<ErrorResponse><Error><Code>AccessDenied</Code>\
                      <Message>no</Message></Error></ErrorResponse>";
        let err = classify_error(StatusCode::FORBIDDEN, denied);
        assert!(matches!(err, Error::Provider { .. }));
        assert!(err.to_string().contains("Authentication failed"));

        let throttled = "<ErrorResponse><Error><Code>Throttling</Code>\
                         <Message>Rate exceeded</Message></Error></ErrorResponse>";
        assert!(!classify_error(StatusCode::BAD_REQUEST, throttled).is_conflict());
        assert!(matches!(
            classify_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            Error::Provider { .. }
        ));
    }

    #[test]
    fn test_same_name() {
        assert!(same_name("Example.COM.", "example.com"));
        assert!(!same_name("example.com.", "www.example.com"));
    }
}
