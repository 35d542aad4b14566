// # S3 Blob Store
//
// BlobStore over a single S3 object, addressed virtual-hosted style:
// `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
//
// Bucket and key are checked when the object is first accessed, not at
// construction, so a process that never touches storage does not need
// them configured.

use async_trait::async_trait;
use chrono::Utc;
use dyndns53_core::config::{AwsConfig, ENV_BUCKET, ENV_DATABASE};
use dyndns53_core::traits::BlobStore;
use dyndns53_core::{Error, Result};
use reqwest::{Method, StatusCode, Url};

use crate::route53::DEFAULT_HTTP_TIMEOUT;
use crate::sigv4::{Signer, uri_encode};
use crate::xml;

/// Content type of the uploaded credential database
const CONTENT_TYPE: &str = "text/csv";

/// S3-backed blob store
#[derive(Debug)]
pub struct S3BlobStore {
    bucket: Option<String>,
    key: Option<String>,
    region: String,
    /// Path-style endpoint override (`{endpoint}/{bucket}/{key}`)
    endpoint: Option<String>,
    signer: Signer,
    client: reqwest::Client,
}

impl S3BlobStore {
    /// Create a store for `bucket`/`key` in the configured region
    pub fn new(aws: &AwsConfig, bucket: Option<String>, key: Option<String>) -> Result<Self> {
        aws.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            bucket,
            key,
            region: aws.region.clone(),
            endpoint: None,
            signer: Signer::new(aws, aws.region.clone(), "s3").with_content_sha256(),
            client,
        })
    }

    /// Use a path-style endpoint instead of the regional S3 host
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into().trim_end_matches('/').to_string());
        self
    }

    fn bucket(&self) -> Result<&str> {
        self.bucket
            .as_deref()
            .ok_or_else(|| Error::config(format!("{} is required for S3 storage", ENV_BUCKET)))
    }

    fn key(&self) -> Result<&str> {
        self.key
            .as_deref()
            .ok_or_else(|| Error::config(format!("{} is required for S3 storage", ENV_DATABASE)))
    }

    /// URL of the object
    pub fn object_url(&self) -> Result<Url> {
        let bucket = self.bucket()?;
        let key = self
            .key()?
            .split('/')
            .map(uri_encode)
            .collect::<Vec<_>>()
            .join("/");

        let url = match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint, bucket, key),
            None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key),
        };
        Url::parse(&url).map_err(|e| Error::config(format!("Invalid S3 URL {}: {}", url, e)))
    }

    async fn send(&self, method: Method, body: Option<&[u8]>) -> Result<(StatusCode, Vec<u8>)> {
        let url = self.object_url()?;
        let payload = body.unwrap_or_default();
        let mut headers: Vec<(&str, &str)> = Vec::new();
        if body.is_some() {
            headers.push(("content-type", CONTENT_TYPE));
        }

        let signed = self
            .signer
            .sign(method.as_str(), &url, &headers, payload, Utc::now())?;

        let mut request = self.client.request(method, url);
        for (name, value) in &headers {
            request = request.header(*name, *value);
        }
        for (name, value) in signed {
            request = request.header(name, value);
        }
        if let Some(body) = body {
            request = request.body(body.to_vec());
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("S3 request failed: {}", e)))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::http(format!("Failed to read S3 response: {}", e)))?;
        Ok((status, bytes.to_vec()))
    }

    fn failure(&self, operation: &str, status: StatusCode, body: &[u8]) -> Error {
        let text = String::from_utf8_lossy(body);
        let code = xml::text(&text, "Code").unwrap_or_else(|| status.to_string());
        let message = xml::text(&text, "Message").unwrap_or_default();

        match status.as_u16() {
            404 => Error::storage(format!("{} does not exist ({})", self.location(), code)),
            401 | 403 => Error::storage(format!(
                "{} of {} denied: {} {}",
                operation,
                self.location(),
                code,
                message
            )),
            _ => Error::storage(format!(
                "{} of {} failed (HTTP {}): {} {}",
                operation,
                self.location(),
                status.as_u16(),
                code,
                message
            )),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let (status, body) = self.send(Method::GET, None).await?;
        if !status.is_success() {
            return Err(self.failure("Download", status, &body));
        }
        Ok(body)
    }

    async fn store(&self, data: &[u8]) -> Result<()> {
        let (status, body) = self.send(Method::PUT, Some(data)).await?;
        if !status.is_success() {
            return Err(self.failure("Upload", status, &body));
        }
        Ok(())
    }

    fn location(&self) -> String {
        format!(
            "s3://{}/{}",
            self.bucket.as_deref().unwrap_or("<unset>"),
            self.key.as_deref().unwrap_or("<unset>")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aws() -> AwsConfig {
        AwsConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
            region: "eu-west-1".to_string(),
        }
    }

    #[test]
    fn test_virtual_hosted_url() {
        let store = S3BlobStore::new(
            &aws(),
            Some("my-bucket".to_string()),
            Some("dyndns/hosts db.csv".to_string()),
        )
        .unwrap();

        assert_eq!(
            store.object_url().unwrap().as_str(),
            "https://my-bucket.s3.eu-west-1.amazonaws.com/dyndns/hosts%20db.csv"
        );
        assert_eq!(store.location(), "s3://my-bucket/dyndns/hosts db.csv");
    }

    #[test]
    fn test_path_style_endpoint() {
        let store = S3BlobStore::new(&aws(), Some("b".to_string()), Some("k".to_string()))
            .unwrap()
            .with_endpoint("http://127.0.0.1:9000/");

        assert_eq!(store.object_url().unwrap().as_str(), "http://127.0.0.1:9000/b/k");
    }

    #[tokio::test]
    async fn test_missing_bucket_fails_at_first_use() {
        let store = S3BlobStore::new(&aws(), None, Some("hosts.csv".to_string())).unwrap();
        assert_eq!(store.location(), "s3://<unset>/hosts.csv");

        let err = store.fetch().await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains(ENV_BUCKET));

        let store = S3BlobStore::new(&aws(), Some("b".to_string()), None).unwrap();
        let err = store.store(b"data").await.unwrap_err();
        assert!(err.to_string().contains(ENV_DATABASE));
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut config = aws();
        config.secret_access_key.clear();
        assert!(S3BlobStore::new(&config, None, None).is_err());
    }
}
